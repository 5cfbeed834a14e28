//! Result Struct Decoder - fixed-offset decoding of the scan result region.
//!
//! The foreign routine populates an 11661-byte region with a fixed, non
//! self-describing layout. All offsets live in the constant table below;
//! the decode routine trusts them completely, because no runtime check can
//! detect a divergence between the two sides of the contract.
//!
//! # Region Layout
//!
//! | Field        | Type       | Offset | Count | Stride |
//! |--------------|------------|--------|-------|--------|
//! | wavelength   | f64 (LE)   | 216    | 864   | 8      |
//! | intensity    | i32 (LE)   | 7128   | 864   | 4      |
//! | valid_length | i32 (LE)   | 10584  | 1     | 4      |
//!
//! Only the total region size is checked; a layout change on the foreign
//! side silently produces garbage values, not an error.

use serde::Serialize;

use crate::error::{Result, ScanError};

/// Total size of the scan result structure, fixed by the foreign routine.
pub const SCAN_RESULTS_SIZE: usize = 11661;

/// Number of spectral points the routine always emits.
pub const SPECTRUM_POINTS: usize = 864;

/// Location of one field inside the result region.
#[derive(Clone, Copy, Debug)]
pub struct FieldLayout {
    /// Byte offset of the first element.
    pub offset: usize,
    /// Number of elements.
    pub count: usize,
    /// Bytes between consecutive elements.
    pub stride: usize,
}

/// Wavelength array: 864 little-endian f64 values.
pub const WAVELENGTH: FieldLayout = FieldLayout {
    offset: 216,
    count: SPECTRUM_POINTS,
    stride: 8,
};

/// Intensity array: 864 little-endian i32 values.
pub const INTENSITY: FieldLayout = FieldLayout {
    offset: 7128,
    count: SPECTRUM_POINTS,
    stride: 4,
};

/// Valid-length scalar: one little-endian i32.
pub const VALID_LENGTH: FieldLayout = FieldLayout {
    offset: 10584,
    count: 1,
    stride: 4,
};

// The layout table must fit inside the region; checked at compile time so a
// constant edit cannot silently read past the buffer.
const _: () = assert!(WAVELENGTH.offset + WAVELENGTH.count * WAVELENGTH.stride <= SCAN_RESULTS_SIZE);
const _: () = assert!(INTENSITY.offset + INTENSITY.count * INTENSITY.stride <= SCAN_RESULTS_SIZE);
const _: () = assert!(VALID_LENGTH.offset + VALID_LENGTH.stride <= SCAN_RESULTS_SIZE);

/// Fully decoded scan result.
///
/// Both arrays are always materialized at their full 864-element length,
/// independent of `valid_length`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanResult {
    pub wavelength: Vec<f64>,
    pub intensity: Vec<i32>,
    /// How many leading elements the routine reports as meaningful. Decoded
    /// and carried through, but it does not bound downstream truncation
    /// (observed behavior of the original system, kept as-is).
    pub valid_length: i32,
}

#[inline]
fn read_f64(region: &[u8], at: usize) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&region[at..at + 8]);
    f64::from_le_bytes(raw)
}

#[inline]
fn read_i32(region: &[u8], at: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&region[at..at + 4]);
    i32::from_le_bytes(raw)
}

fn read_f64_array(region: &[u8], field: &FieldLayout) -> Vec<f64> {
    (0..field.count)
        .map(|i| read_f64(region, field.offset + i * field.stride))
        .collect()
}

fn read_i32_array(region: &[u8], field: &FieldLayout) -> Vec<i32> {
    (0..field.count)
        .map(|i| read_i32(region, field.offset + i * field.stride))
        .collect()
}

/// Decode a scan result region into a [`ScanResult`].
///
/// The only possible error is a region of the wrong total size; everything
/// past that check is unconditional fixed-offset extraction.
pub fn decode_scan_results(region: &[u8]) -> Result<ScanResult> {
    if region.len() != SCAN_RESULTS_SIZE {
        return Err(ScanError::RegionSize {
            expected: SCAN_RESULTS_SIZE,
            got: region.len(),
        });
    }

    Ok(ScanResult {
        wavelength: read_f64_array(region, &WAVELENGTH),
        intensity: read_i32_array(region, &INTENSITY),
        valid_length: read_i32(region, VALID_LENGTH.offset),
    })
}
