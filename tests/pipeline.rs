//! End-to-end pipeline tests driven through a mock foreign routine.
//!
//! The real routine is an opaque native library; these tests substitute
//! implementations that write known bytes into the result region and verify
//! the decode -> reflectance -> report chain against expected values.

use nanoscan::decode::{INTENSITY, VALID_LENGTH, WAVELENGTH};
use nanoscan::{
    render_csv, Region, ScanEngine, ScanError, ScanRoutine, REFLECTANCE_WINDOW,
    SCAN_RESULTS_SIZE, SPECTRUM_POINTS, WHITE_REF,
};

/// Writes a single wavelength/intensity pair at index 0.
struct SingleValueRoutine;

impl ScanRoutine for SingleValueRoutine {
    fn scan_interpret(&self, input: &Region, output: &mut Region) {
        // The arena copied the caller's bytes in verbatim.
        assert_eq!(input.bytes(), &[0x01, 0x02, 0x03]);

        let bytes = output.bytes_mut();
        bytes[WAVELENGTH.offset..WAVELENGTH.offset + 8].copy_from_slice(&500.0f64.to_le_bytes());
        bytes[INTENSITY.offset..INTENSITY.offset + 4].copy_from_slice(&21137i32.to_le_bytes());
    }
}

/// Fills both arrays completely and reports a valid length.
struct FullSpectrumRoutine;

impl ScanRoutine for FullSpectrumRoutine {
    fn scan_interpret(&self, _input: &Region, output: &mut Region) {
        let bytes = output.bytes_mut();
        for i in 0..SPECTRUM_POINTS {
            let w = WAVELENGTH.offset + i * WAVELENGTH.stride;
            bytes[w..w + 8].copy_from_slice(&(900.0 + i as f64 * 0.5).to_le_bytes());
            let p = INTENSITY.offset + i * INTENSITY.stride;
            bytes[p..p + 4].copy_from_slice(&(i as i32 * 3).to_le_bytes());
        }
        bytes[VALID_LENGTH.offset..VALID_LENGTH.offset + 4]
            .copy_from_slice(&528i32.to_le_bytes());
    }
}

/// Writes nothing at all.
struct SilentRoutine;

impl ScanRoutine for SilentRoutine {
    fn scan_interpret(&self, _input: &Region, _output: &mut Region) {}
}

#[test]
fn end_to_end_single_value_scenario() {
    let engine = ScanEngine::new(Box::new(SingleValueRoutine));
    let outcome = engine.interpret(&[0x01, 0x02, 0x03]).unwrap();

    assert_eq!(outcome.raw.wavelength[0], 500.0);
    assert_eq!(outcome.raw.intensity[0], 21137);
    assert_eq!(outcome.raw.valid_length, 0);

    // WHITE_REF[0] is 21137, so index 0 calibrates to exactly 1.0 and every
    // other entry is 0 divided by its reference value.
    assert_eq!(outcome.report.reflectance.len(), REFLECTANCE_WINDOW);
    assert_eq!(outcome.report.reflectance[0], 1.0);
    for (k, &r) in outcome.report.reflectance.iter().enumerate().skip(1) {
        assert_eq!(r, 0.0 / WHITE_REF[k] as f64);
        assert_eq!(r, 0.0);
    }

    assert_eq!(engine.arena().live(), 0);
}

#[test]
fn end_to_end_full_spectrum() {
    let engine = ScanEngine::new(Box::new(FullSpectrumRoutine));
    let outcome = engine.interpret(&[0xFF]).unwrap();

    // Raw arrays keep their full length; the report is truncated.
    assert_eq!(outcome.raw.wavelength.len(), SPECTRUM_POINTS);
    assert_eq!(outcome.raw.intensity.len(), SPECTRUM_POINTS);
    assert_eq!(outcome.raw.valid_length, 528);
    assert_eq!(outcome.report.wavelength.len(), REFLECTANCE_WINDOW);
    assert_eq!(outcome.report.intensity.len(), REFLECTANCE_WINDOW);

    // The window is fixed at 228 regardless of the reported valid length.
    assert_eq!(outcome.report.reflectance.len(), REFLECTANCE_WINDOW);
    for k in 0..REFLECTANCE_WINDOW {
        assert_eq!(outcome.report.wavelength[k], 900.0 + k as f64 * 0.5);
        assert_eq!(
            outcome.report.reflectance[k],
            (k as i32 * 3) as f64 / WHITE_REF[k] as f64
        );
    }
}

#[test]
fn zero_filled_result_region_decodes_deterministically() {
    let engine = ScanEngine::new(Box::new(SilentRoutine));

    // Two consecutive requests; the second must not observe anything from
    // the first (regions are fresh and zeroed every time).
    for _ in 0..2 {
        let outcome = engine.interpret(&[0x10, 0x20]).unwrap();
        assert!(outcome.raw.wavelength.iter().all(|&w| w == 0.0));
        assert!(outcome.raw.intensity.iter().all(|&i| i == 0));
        assert_eq!(outcome.raw.valid_length, 0);
    }
    assert_eq!(engine.arena().live(), 0);
}

#[test]
fn csv_artifact_from_pipeline_output() {
    let engine = ScanEngine::new(Box::new(SingleValueRoutine));
    let outcome = engine.interpret(&[0x01, 0x02, 0x03]).unwrap();

    let csv = render_csv(&outcome.report.records()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("wavelength,intensity,reflectance"));
    assert_eq!(lines.next(), Some("500,21137,1"));
    assert_eq!(lines.next(), Some("0,0,0"));
    assert_eq!(csv.lines().count(), 1 + REFLECTANCE_WINDOW);
}

#[test]
fn empty_input_is_rejected_without_leaking() {
    let engine = ScanEngine::new(Box::new(SilentRoutine));
    assert!(matches!(engine.interpret(&[]), Err(ScanError::EmptyInput)));
    assert_eq!(engine.arena().live(), 0);

    // The engine stays usable after the rejected request.
    assert!(engine.interpret(&[1]).is_ok());
}

#[test]
fn requests_serialize_across_threads() {
    use std::sync::Arc;

    let engine = Arc::new(ScanEngine::new(Box::new(FullSpectrumRoutine)));
    let mut handles = Vec::new();

    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(std::thread::spawn(move || {
            for _ in 0..16 {
                let outcome = engine.interpret(&[0x42; 32]).unwrap();
                assert_eq!(outcome.report.reflectance.len(), REFLECTANCE_WINDOW);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.arena().live(), 0);
}

#[test]
fn shutdown_rejects_in_flight_followers() {
    let engine = ScanEngine::new(Box::new(SilentRoutine));
    engine.interpret(&[1]).unwrap();
    engine.shutdown();
    assert!(matches!(
        engine.interpret(&[1]),
        Err(ScanError::RoutineUnavailable)
    ));
    assert_eq!(engine.arena().live(), 0);
}

mod randomized {
    //! Deterministic randomized check of the fixed-offset extraction: an
    //! independently computed reference decode over random region contents
    //! must agree with the library decoder.

    use super::*;
    use nanoscan::decode_scan_results;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn reference_decode(region: &[u8]) -> (Vec<f64>, Vec<i32>, i32) {
        let wavelength = (0..WAVELENGTH.count)
            .map(|i| {
                let at = WAVELENGTH.offset + i * WAVELENGTH.stride;
                f64::from_le_bytes(region[at..at + 8].try_into().unwrap())
            })
            .collect();
        let intensity = (0..INTENSITY.count)
            .map(|i| {
                let at = INTENSITY.offset + i * INTENSITY.stride;
                i32::from_le_bytes(region[at..at + 4].try_into().unwrap())
            })
            .collect();
        let at = VALID_LENGTH.offset;
        let valid_length = i32::from_le_bytes(region[at..at + 4].try_into().unwrap());
        (wavelength, intensity, valid_length)
    }

    #[test]
    fn random_regions_decode_like_the_reference() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..50 {
            let mut region = vec![0u8; SCAN_RESULTS_SIZE];
            rng.fill_bytes(&mut region);

            let decoded = decode_scan_results(&region).unwrap();
            let (wavelength, intensity, valid_length) = reference_decode(&region);

            assert_eq!(decoded.intensity, intensity);
            assert_eq!(decoded.valid_length, valid_length);
            // NaN payloads break PartialEq on f64; compare bit patterns.
            assert_eq!(decoded.wavelength.len(), wavelength.len());
            for (a, b) in decoded.wavelength.iter().zip(&wavelength) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }
}
