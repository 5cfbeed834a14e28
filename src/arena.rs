//! Buffer Arena - request-scoped raw memory regions for the foreign routine.
//!
//! The foreign scan routine reads its input and writes its result through
//! raw pointers, outside any managed allocation. The arena hands out
//! [`Region`] guards that own exactly one such block; dropping the guard
//! releases the block, so every exit path of a request (including error
//! paths) frees its foreign memory exactly once.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::decode::SCAN_RESULTS_SIZE;
use crate::error::{Result, ScanError};

/// A single owned block of foreign-visible memory.
///
/// The block is freed when the guard drops. Double-free and use-after-free
/// are unrepresentable: there is no way to release a region other than
/// dropping it, and the borrow checker rules out access afterwards.
pub struct Region {
    ptr: NonNull<u8>,
    layout: Layout,
    live: Arc<AtomicUsize>,
}

impl Region {
    fn new(len: usize, zeroed: bool, live: Arc<AtomicUsize>) -> Self {
        debug_assert!(len > 0, "zero-size regions are rejected upstream");
        // Byte blocks, no alignment demands beyond a single byte.
        let layout = Layout::array::<u8>(len).expect("region size overflows Layout");
        let raw = if zeroed {
            unsafe { alloc::alloc_zeroed(layout) }
        } else {
            unsafe { alloc::alloc(layout) }
        };
        let ptr = match NonNull::new(raw) {
            Some(p) => p,
            None => alloc::handle_alloc_error(layout),
        };
        live.fetch_add(1, Ordering::Relaxed);
        Self { ptr, layout, live }
    }

    /// Length of the region in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// A region is never empty; kept for API completeness.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Raw pointer handed to the foreign routine as an input address.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Raw pointer handed to the foreign routine as an output address.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// View the region as a byte slice (for decoding).
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        // The region is exclusively owned and initialized for its whole
        // length, either zero-filled or copied into at allocation time.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }

    /// Mutable byte view (used by in-process routine implementations).
    #[inline]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len()) }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("ptr", &self.ptr)
            .field("len", &self.len())
            .finish()
    }
}

/// Allocator facade for the foreign memory regions of one engine.
///
/// The arena itself holds no allocation state beyond a live-region counter;
/// regions own their blocks. The counter exists so tests (and `Debug` output)
/// can assert that no request leaks foreign memory on any exit path.
pub struct BufferArena {
    live: Arc<AtomicUsize>,
}

impl BufferArena {
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Allocate a region of exactly `bytes.len()` bytes and copy `bytes`
    /// into it byte-for-byte.
    ///
    /// The destination is a fresh (non-zeroed) allocation; every byte is
    /// written explicitly, so nothing is assumed about its prior contents.
    pub fn alloc_input(&self, bytes: &[u8]) -> Result<Region> {
        if bytes.is_empty() {
            return Err(ScanError::EmptyInput);
        }
        let mut region = Region::new(bytes.len(), false, Arc::clone(&self.live));
        region.bytes_mut().copy_from_slice(bytes);
        Ok(region)
    }

    /// Allocate the fixed-size result region, zero-filled.
    ///
    /// Zero-initialization guarantees that fields the foreign routine never
    /// writes decode deterministically to zero rather than stale memory.
    pub fn alloc_result(&self) -> Region {
        Region::new(SCAN_RESULTS_SIZE, true, Arc::clone(&self.live))
    }

    /// Number of regions currently alive.
    #[inline]
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

impl Default for BufferArena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BufferArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferArena")
            .field("live", &self.live())
            .finish()
    }
}
