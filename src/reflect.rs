//! Reflectance Pipeline - truncation, calibration, and record assembly.
//!
//! Raw intensity becomes reflectance by element-wise division against a
//! fixed white-reference calibration table. The pipeline always works on a
//! fixed 228-element window of the decoded arrays; the `valid_length` the
//! routine reports is deliberately not consulted (see `ScanResult`).

use serde::Serialize;

use crate::decode::ScanResult;

/// Size of the analytical window the pipeline reports on.
pub const REFLECTANCE_WINDOW: usize = 228;

/// White-reference calibration divisors, one per spectral point in the
/// analytical window. Captured once from a reference scan of the white
/// calibration tile; immutable for the life of the process.
pub const WHITE_REF: [i32; REFLECTANCE_WINDOW] = [
    21137, 23461, 25891, 28367, 31858, 35725, 40924, 46440, 52308, 57973,
    62886, 66825, 70721, 75174, 78999, 82422, 85964, 89275, 93353, 96599,
    100713, 105161, 108933, 112371, 115267, 118112, 121028, 123365, 125760, 127694,
    129925, 130425, 131035, 131298, 131473, 131586, 131395, 130842, 130745, 129883,
    129153, 128387, 128404, 128387, 127712, 127662, 127881, 127874, 128414, 128736,
    129329, 129924, 130318, 131157, 131971, 132612, 133924, 134924, 135965, 136691,
    138004, 139057, 139758, 140825, 142173, 143342, 144459, 145544, 146776, 148593,
    150046, 151204, 152681, 154605, 156582, 158549, 160960, 162883, 164648, 167251,
    169406, 171161, 174277, 176836, 178872, 180927, 183479, 185942, 187803, 190320,
    192239, 195410, 198113, 200893, 203218, 206430, 208654, 211285, 213297, 215662,
    218728, 220557, 222792, 224330, 225902, 227567, 228498, 229999, 231517, 233056,
    234025, 234663, 235577, 236015, 236411, 237219, 237254, 237840, 237650, 237870,
    236982, 236333, 235831, 235782, 236059, 235538, 235514, 234285, 233723, 233204,
    232497, 231422, 230439, 229279, 229006, 227866, 227149, 226210, 226195, 225709,
    225065, 224861, 224181, 223494, 223504, 223279, 222945, 222369, 221616, 221556,
    220294, 219572, 218417, 217293, 216454, 214937, 214207, 212318, 211100, 209948,
    208136, 205671, 204214, 203015, 201270, 199742, 197541, 195868, 194064, 191210,
    189148, 186718, 184775, 181802, 179459, 176454, 173810, 171895, 168041, 165151,
    162034, 159171, 156523, 153588, 150959, 147928, 145076, 141260, 138624, 135162,
    132316, 129342, 126361, 123576, 120642, 116857, 113308, 110327, 106641, 103998,
    100801, 97836, 95005, 92292, 88127, 85985, 83064, 80679, 77675, 75136,
    72384, 69419, 66714, 62123, 58652, 54169, 49142, 43911, 38363, 33135,
    28273, 23826, 18769, 16145, 13679, 11572, 9997, 8607,
];

/// One row of the calibrated result set.
///
/// `reflectance` is absent for every row when the calibration step was
/// skipped due to a length mismatch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ReflectanceRecord {
    pub wavelength: f64,
    pub intensity: i32,
    pub reflectance: Option<f64>,
}

/// Calibrated report over the analytical window; the response payload shape.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanReport {
    pub wavelength: Vec<f64>,
    pub intensity: Vec<i32>,
    /// Empty when the length-mismatch branch was taken.
    pub reflectance: Vec<f64>,
}

impl ScanReport {
    /// Zip the parallel arrays into per-row records.
    ///
    /// In the mismatch branch `reflectance` is shorter than the other two
    /// and the corresponding rows carry `None` instead of a value.
    pub fn records(&self) -> Vec<ReflectanceRecord> {
        self.wavelength
            .iter()
            .zip(&self.intensity)
            .enumerate()
            .map(|(i, (&wavelength, &intensity))| ReflectanceRecord {
                wavelength,
                intensity,
                reflectance: self.reflectance.get(i).copied(),
            })
            .collect()
    }
}

/// Truncate to the first `REFLECTANCE_WINDOW` elements. Shorter inputs pass
/// through at their own length rather than failing.
fn truncate<T: Copy>(values: &[T]) -> Vec<T> {
    values[..values.len().min(REFLECTANCE_WINDOW)].to_vec()
}

/// Divide intensity by the reference table, element-wise.
///
/// Integer operands are promoted to f64; a zero divisor yields ±inf/NaN per
/// IEEE-754 and is not special-cased. Returns an empty sequence (and emits
/// an error event) when the window is not completely filled.
fn calibrate(intensity: &[i32]) -> Vec<f64> {
    if intensity.len() == REFLECTANCE_WINDOW && WHITE_REF.len() >= REFLECTANCE_WINDOW {
        intensity
            .iter()
            .zip(WHITE_REF.iter())
            .map(|(&i, &r)| i as f64 / r as f64)
            .collect()
    } else {
        tracing::error!(
            intensity_len = intensity.len(),
            window = REFLECTANCE_WINDOW,
            "intensity array length mismatch, reflectance degraded to empty"
        );
        Vec::new()
    }
}

/// Derive the calibrated report from a decoded scan result.
pub fn derive(result: &ScanResult) -> ScanReport {
    let wavelength = truncate(&result.wavelength);
    let intensity = truncate(&result.intensity);
    let reflectance = calibrate(&intensity);

    ScanReport {
        wavelength,
        intensity,
        reflectance,
    }
}
