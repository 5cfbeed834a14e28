//! Engine - foreign routine lifecycle and the single-slot execution lane.
//!
//! The foreign routine gives no reentrancy guarantee, so all interprets are
//! serialized through one mutex-guarded lane instead of relying on the host
//! happening to be single-threaded. The engine has a two-phase lifecycle:
//! ready from construction, shut down once [`ScanEngine::shutdown`] runs;
//! requests after shutdown fail fast.

use std::sync::{Mutex, PoisonError};

use crate::arena::{BufferArena, Region};
use crate::decode::{decode_scan_results, ScanResult};
use crate::error::{Result, ScanError};
use crate::reflect::{self, ScanReport};

/// The opaque external numerical routine.
///
/// Contract: given the input region and the zero-filled result region, the
/// implementation populates the result region according to the fixed layout
/// in [`crate::decode`]. Regions carry their own lengths, so implementations
/// take pointers out of them rather than being handed raw addresses.
pub trait ScanRoutine: Send {
    fn scan_interpret(&self, input: &Region, output: &mut Region);
}

/// FFI binding to the native `dlpspec` library.
#[cfg(feature = "dlpspec")]
mod native {
    use super::{Region, ScanRoutine};

    #[link(name = "dlpspec")]
    extern "C" {
        fn dlpspec_scan_interpret(input: *const u8, input_len: usize, output: *mut u8);
    }

    /// The statically linked spectrometer interpretation routine.
    pub struct DlpSpecRoutine;

    impl ScanRoutine for DlpSpecRoutine {
        fn scan_interpret(&self, input: &Region, output: &mut Region) {
            // The input region is fully initialized and the output region is
            // exactly SCAN_RESULTS_SIZE bytes, per the arena contract.
            unsafe { dlpspec_scan_interpret(input.as_ptr(), input.len(), output.as_mut_ptr()) }
        }
    }
}

#[cfg(feature = "dlpspec")]
pub use native::DlpSpecRoutine;

/// Everything one interpret produces.
#[derive(Clone, Debug)]
pub struct ScanOutcome {
    /// Full decoded arrays, untruncated.
    pub raw: ScanResult,
    /// Calibrated report over the analytical window.
    pub report: ScanReport,
}

struct Lane {
    /// `None` once the engine is shut down.
    routine: Option<Box<dyn ScanRoutine>>,
}

/// Serializes scan interpretation against the shared foreign routine.
pub struct ScanEngine {
    lane: Mutex<Lane>,
    arena: BufferArena,
}

impl ScanEngine {
    /// Construct a ready engine around a loaded routine.
    pub fn new(routine: Box<dyn ScanRoutine>) -> Self {
        tracing::info!("scan engine ready");
        Self {
            lane: Mutex::new(Lane {
                routine: Some(routine),
            }),
            arena: BufferArena::new(),
        }
    }

    /// Run one scan interpretation to completion.
    ///
    /// Holds the execution lane for the whole request: allocate and fill the
    /// input region, allocate the zeroed result region, call the routine,
    /// decode, then derive the report. Both regions are released before this
    /// returns on every path, error paths included.
    pub fn interpret(&self, bytes: &[u8]) -> Result<ScanOutcome> {
        // A panic while holding the lane leaves no half-applied state
        // (regions release during unwind), so a poisoned lock is recovered.
        let lane = self.lane.lock().unwrap_or_else(PoisonError::into_inner);
        let routine = lane.routine.as_ref().ok_or(ScanError::RoutineUnavailable)?;

        let input = self.arena.alloc_input(bytes)?;
        let mut result = self.arena.alloc_result();
        routine.scan_interpret(&input, &mut result);

        let raw = decode_scan_results(result.bytes())?;
        // Foreign memory is released immediately after decoding; nothing
        // below touches the regions.
        drop(result);
        drop(input);

        let report = reflect::derive(&raw);
        Ok(ScanOutcome { raw, report })
    }

    /// Shut the engine down; subsequent interprets fail with
    /// [`ScanError::RoutineUnavailable`].
    pub fn shutdown(&self) {
        let mut lane = self.lane.lock().unwrap_or_else(PoisonError::into_inner);
        if lane.routine.take().is_some() {
            tracing::info!("scan engine shut down");
        }
    }

    /// Whether the engine still accepts requests.
    pub fn is_ready(&self) -> bool {
        self.lane
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .routine
            .is_some()
    }

    /// The arena backing this engine (used by tests to assert no region
    /// leaks across requests).
    pub fn arena(&self) -> &BufferArena {
        &self.arena
    }
}
