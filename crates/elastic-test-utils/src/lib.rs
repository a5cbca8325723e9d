//! Test utilities and mock collaborators for elastic development.
//!
//! Provides instrumented implementations of the collaborator traits
//! ([`RawAllocator`], [`CollectorHooks`]) plus descriptor fixtures in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use elastic_core::{
    AllocKind, AllocRequest, ArrayError, Buffer, CollectorHooks, ElementDescriptor, Init,
    RawAllocator, REF_WORD_BYTES,
};

/// Byte pattern written into `Init::Unspecified` allocations by
/// [`CountingAllocator`] so tests can spot bytes that were never written.
pub const POISON: u8 = 0xDB;

/// Call counters kept by [`CountingAllocator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub allocate: u64,
    pub raw_allocations: u64,
    pub traced_allocations: u64,
    pub bulk_move: u64,
    pub bulk_move_bytes: u64,
    pub zero_fill: u64,
    pub zero_fill_bytes: u64,
    pub release: u64,
}

/// Exact-size allocator that counts every call.
///
/// Rounds with a fixed granularity (`round_to`, 1 = no rounding), poisons
/// unspecified allocations, and can be told to fail after a number of
/// successful allocations.
pub struct CountingAllocator {
    round_to: usize,
    fail_after: Option<u64>,
    counts: CallCounts,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self {
            round_to: 1,
            fail_after: None,
            counts: CallCounts::default(),
        }
    }

    /// Round every request up to a multiple of `granularity`.
    pub fn rounding_to(granularity: usize) -> Self {
        assert!(granularity > 0, "granularity must be non-zero");
        Self {
            round_to: granularity,
            ..Self::new()
        }
    }

    /// Fail every allocation after the first `n` succeed.
    pub fn failing_after(mut self, n: u64) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn counts(&self) -> CallCounts {
        self.counts
    }
}

impl Default for CountingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl RawAllocator for CountingAllocator {
    fn allocate(&mut self, request: AllocRequest) -> Result<Buffer, ArrayError> {
        if self.fail_after.is_some_and(|n| self.counts.allocate >= n) {
            return Err(ArrayError::AllocationFailure {
                requested: request.bytes,
                align: request.align,
            });
        }
        self.counts.allocate += 1;
        match request.kind {
            AllocKind::Raw => self.counts.raw_allocations += 1,
            AllocKind::Traced => self.counts.traced_allocations += 1,
        }
        let extent = self.round_up_size(request.bytes);
        let fill = match request.init {
            Init::Zeroed => 0,
            Init::Unspecified => POISON,
        };
        Ok(Buffer::from_vec(
            vec![fill; extent],
            request.align,
            request.kind,
        ))
    }

    fn round_up_size(&self, bytes: usize) -> usize {
        bytes.div_ceil(self.round_to) * self.round_to
    }

    fn bulk_move(&mut self, dst: &mut [u8], src: &[u8]) {
        self.counts.bulk_move += 1;
        self.counts.bulk_move_bytes += src.len() as u64;
        dst.copy_from_slice(src);
    }

    fn zero_fill(&mut self, dst: &mut [u8]) {
        self.counts.zero_fill += 1;
        self.counts.zero_fill_bytes += dst.len() as u64;
        dst.fill(0);
    }

    fn release(&mut self, buffer: Buffer) {
        self.counts.release += 1;
        drop(buffer);
    }
}

/// A collector that records every reference word moved through it.
///
/// The recorded ("shaded") words are what a real barrier would grey for
/// the marker. Element moves are counted separately.
#[derive(Debug, Default)]
pub struct RecordingCollector {
    active: bool,
    element_moves: usize,
    shaded: Vec<u64>,
}

impl RecordingCollector {
    pub fn new(active: bool) -> Self {
        Self {
            active,
            ..Self::default()
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn element_moves(&self) -> usize {
        self.element_moves
    }

    /// Reference words seen, in move order.
    pub fn shaded(&self) -> &[u64] {
        &self.shaded
    }
}

impl CollectorHooks for RecordingCollector {
    fn write_barrier_active(&self) -> bool {
        self.active
    }

    fn typed_move(&mut self, desc: &ElementDescriptor, dst: &mut [u8], src: &[u8]) {
        assert_eq!(src.len(), desc.size(), "typed_move source is not one element");
        assert_eq!(dst.len(), desc.size(), "typed_move target is not one element");
        self.element_moves += 1;
        for &slot in desc.ref_slots() {
            let start = slot as usize;
            let mut word = [0u8; REF_WORD_BYTES];
            word.copy_from_slice(&src[start..start + REF_WORD_BYTES]);
            self.shaded.push(u64::from_le_bytes(word));
        }
        dst.copy_from_slice(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_allocator_poisons_unspecified() {
        let mut alloc = CountingAllocator::new();
        let buf = alloc
            .allocate(AllocRequest::unspecified(4, 1, AllocKind::Raw))
            .unwrap();
        assert_eq!(buf.as_slice(), &[POISON; 4]);
        assert_eq!(alloc.counts().raw_allocations, 1);
    }

    #[test]
    fn counting_allocator_rounds() {
        let alloc = CountingAllocator::rounding_to(16);
        assert_eq!(alloc.round_up_size(0), 0);
        assert_eq!(alloc.round_up_size(1), 16);
        assert_eq!(alloc.round_up_size(33), 48);
    }

    #[test]
    fn counting_allocator_fails_on_schedule() {
        let mut alloc = CountingAllocator::new().failing_after(1);
        assert!(alloc
            .allocate(AllocRequest::zeroed(8, 8, AllocKind::Raw))
            .is_ok());
        assert!(alloc
            .allocate(AllocRequest::zeroed(8, 8, AllocKind::Raw))
            .is_err());
    }

    #[test]
    fn recording_collector_shades_reference_words() {
        let desc = fixtures::pair_desc();
        let mut collector = RecordingCollector::new(true);
        let src = fixtures::pair_bytes(5, 0xBEEF);
        let mut dst = [0u8; 16];
        collector.typed_move(&desc, &mut dst, &src);
        assert_eq!(dst, src);
        assert_eq!(collector.shaded(), &[0xBEEF]);
        assert_eq!(collector.element_moves(), 1);
    }
}
