//! # Nanoscan
//!
//! Fixed-layout scan result decoder and reflectance pipeline for DLP
//! NIRscan Nano spectrometers.
//!
//! ## Design Principles
//!
//! - **Single-Slot Lane**: the foreign routine is not reentrant, so all
//!   interprets are serialized through one mutex-guarded lane
//! - **Scoped Regions**: foreign memory is owned by RAII guards and freed
//!   on every exit path, error paths included
//! - **Declarative Layout**: all fixed byte offsets live in one constant
//!   table, checked against the region size at compile time
//! - **Degrade, Don't Fail**: a reflectance length mismatch logs an error
//!   event and yields an empty reflectance sequence, not a failed request
//!
//! ## Data Flow
//!
//! ```text
//! raw bytes --> [Buffer Arena] --> foreign routine --> [Decoder]
//!                                                          |
//!                                    [Report Sink] <-- [Reflectance]
//! ```

pub mod arena;
pub mod decode;
pub mod engine;
pub mod error;
pub mod reflect;
pub mod report;

// Re-exports for convenience
pub use arena::{BufferArena, Region};
pub use decode::{decode_scan_results, ScanResult, SCAN_RESULTS_SIZE, SPECTRUM_POINTS};
pub use engine::{ScanEngine, ScanOutcome, ScanRoutine};
pub use error::{Result, ScanError};
pub use reflect::{ReflectanceRecord, ScanReport, REFLECTANCE_WINDOW, WHITE_REF};
pub use report::{render_csv, report_file_name, DirStore, ReportStore};

#[cfg(feature = "dlpspec")]
pub use engine::DlpSpecRoutine;
