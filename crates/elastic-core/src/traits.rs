//! Collaborator traits the engine calls into.
//!
//! The engine owns none of the memory-management policy: size-class
//! rounding and recycling belong to a [`RawAllocator`], reference tracking
//! belongs to a [`CollectorHooks`] implementation. Both are passed in
//! explicitly, so the engine reads no global state.

use crate::buffer::{AllocRequest, Buffer};
use crate::descriptor::ElementDescriptor;
use crate::error::ArrayError;

/// Source of raw storage.
pub trait RawAllocator {
    /// Allocate at least `request.bytes` bytes.
    ///
    /// The returned buffer's extent may exceed the request. With
    /// [`Init::Zeroed`](crate::Init::Zeroed) every byte is zero; with
    /// [`Init::Unspecified`](crate::Init::Unspecified) contents are arbitrary.
    /// Fails with [`ArrayError::AllocationFailure`].
    fn allocate(&mut self, request: AllocRequest) -> Result<Buffer, ArrayError>;

    /// Round a byte count up to the allocator's size class.
    ///
    /// Must return a value `>= bytes`.
    fn round_up_size(&self, bytes: usize) -> usize;

    /// Copy `src` into `dst`. The slices have equal length and never alias.
    fn bulk_move(&mut self, dst: &mut [u8], src: &[u8]) {
        dst.copy_from_slice(src);
    }

    /// Zero every byte of `dst`.
    fn zero_fill(&mut self, dst: &mut [u8]) {
        dst.fill(0);
    }

    /// Take back a buffer that is no longer referenced.
    ///
    /// The default drops it.
    fn release(&mut self, buffer: Buffer) {
        drop(buffer);
    }
}

/// Hooks into a tracing garbage collector.
pub trait CollectorHooks {
    /// Whether every store of a reference must currently be reported.
    fn write_barrier_active(&self) -> bool;

    /// Move one element from `src` to `dst`, reporting its references.
    ///
    /// Both slices are exactly `desc.size()` bytes long.
    fn typed_move(&mut self, desc: &ElementDescriptor, dst: &mut [u8], src: &[u8]);
}

impl<C: CollectorHooks + ?Sized> CollectorHooks for &mut C {
    fn write_barrier_active(&self) -> bool {
        (**self).write_barrier_active()
    }

    fn typed_move(&mut self, desc: &ElementDescriptor, dst: &mut [u8], src: &[u8]) {
        (**self).typed_move(desc, dst, src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::AllocKind;

    struct VecAllocator;

    impl RawAllocator for VecAllocator {
        fn allocate(&mut self, request: AllocRequest) -> Result<Buffer, ArrayError> {
            Ok(Buffer::zeroed(request.bytes, request.align, request.kind))
        }

        fn round_up_size(&self, bytes: usize) -> usize {
            bytes
        }
    }

    #[test]
    fn default_bulk_move_and_zero_fill() {
        let mut alloc = VecAllocator;
        let mut buf = alloc
            .allocate(AllocRequest::zeroed(4, 1, AllocKind::Raw))
            .unwrap();
        alloc.bulk_move(buf.as_mut_slice(), &[9, 8, 7, 6]);
        assert_eq!(buf.as_slice(), &[9, 8, 7, 6]);
        alloc.zero_fill(buf.range_mut(1, 2));
        assert_eq!(buf.as_slice(), &[9, 0, 0, 6]);
        alloc.release(buf);
    }
}
