//! Ready-made [`CollectorHooks`] implementations.
//!
//! [`NoCollector`] suits non-tracing environments. [`WriteBarrier`] models
//! a collector whose barrier is switched on while marking is in progress.

use elastic_core::{CollectorHooks, ElementDescriptor};

/// Hooks for an environment with no tracing collector.
///
/// The barrier is never active, so growth always bulk-moves.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCollector;

impl CollectorHooks for NoCollector {
    fn write_barrier_active(&self) -> bool {
        false
    }

    fn typed_move(&mut self, _desc: &ElementDescriptor, dst: &mut [u8], src: &[u8]) {
        dst.copy_from_slice(src);
    }
}

/// A switchable write barrier that counts the element moves it observes.
#[derive(Clone, Debug, Default)]
pub struct WriteBarrier {
    enabled: bool,
    typed_moves: u64,
    references_moved: u64,
}

impl WriteBarrier {
    /// A barrier in the given state.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Turn the barrier on, e.g. when marking starts.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Turn the barrier off.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Number of elements moved through [`CollectorHooks::typed_move`].
    pub fn typed_moves(&self) -> u64 {
        self.typed_moves
    }

    /// Number of reference words those moves carried.
    pub fn references_moved(&self) -> u64 {
        self.references_moved
    }
}

impl CollectorHooks for WriteBarrier {
    fn write_barrier_active(&self) -> bool {
        self.enabled
    }

    fn typed_move(&mut self, desc: &ElementDescriptor, dst: &mut [u8], src: &[u8]) {
        self.typed_moves += 1;
        self.references_moved += desc.ref_slots().len() as u64;
        dst.copy_from_slice(src);
    }
}
