//! Copying between existing arrays.
//!
//! Copies never allocate, never fail and never panic. The element count is
//! the shorter of the two lengths and width-zero elements carry no data.
//! The bytes actually moved are limited to what both views' buffers hold,
//! so a handle reinterpreted at a wider element moves only the bytes that
//! exist. Views of the same buffer are moved with `copy_within`, so overlap
//! behaves like `memmove`.

use std::rc::Rc;

use crate::handle::{ArrayHandle, BufferRef};

/// Copy `min(dst.len(), src.len())` elements of `width` bytes from `src`
/// into `dst` and return that count.
///
/// At most the bytes available from each view's offset to the end of its
/// buffer are moved. Zero-width views move nothing.
pub fn copy(dst: &ArrayHandle, src: &ArrayHandle, width: usize) -> usize {
    let count = dst.len().min(src.len());
    if count == 0 {
        return 0;
    }
    if width == 0 {
        return count;
    }
    let bytes = count.saturating_mul(width);

    let moved = match (dst.buffer(), src.buffer()) {
        (BufferRef::Heap(d), BufferRef::Heap(s)) if Rc::ptr_eq(d, s) => {
            let mut buf = d.borrow_mut();
            let extent = buf.len();
            let moved = bytes
                .min(extent.saturating_sub(dst.offset()))
                .min(extent.saturating_sub(src.offset()));
            let data = buf.as_mut_slice();
            if moved == 1 {
                data[dst.offset()] = data[src.offset()];
            } else if moved > 0 {
                data.copy_within(src.offset()..src.offset() + moved, dst.offset());
            }
            moved
        }
        (BufferRef::Heap(d), BufferRef::Heap(s)) => {
            let from = s.borrow();
            let mut to = d.borrow_mut();
            let moved = bytes
                .min(to.len().saturating_sub(dst.offset()))
                .min(from.len().saturating_sub(src.offset()));
            if moved > 0 {
                move_bytes(
                    to.range_mut(dst.offset(), moved),
                    from.range(src.offset(), moved),
                );
            }
            moved
        }
        _ => 0,
    };

    tracing::trace!(count, bytes, moved, "copied elements");
    count
}

/// Copy `min(dst.len(), src.len())` bytes from an immutable byte source
/// (a `&[u8]`, `&str`, ...) into `dst` and return that count.
///
/// At most the bytes from `dst`'s offset to the end of its buffer are
/// written. A zero-width `dst` receives nothing.
pub fn copy_from_bytes(dst: &ArrayHandle, src: impl AsRef<[u8]>) -> usize {
    let src = src.as_ref();
    let count = dst.len().min(src.len());
    if count == 0 {
        return 0;
    }

    let moved = match dst.buffer() {
        BufferRef::Heap(d) => {
            let mut to = d.borrow_mut();
            let moved = count.min(to.len().saturating_sub(dst.offset()));
            if moved > 0 {
                move_bytes(to.range_mut(dst.offset(), moved), &src[..moved]);
            }
            moved
        }
        BufferRef::ZeroWidth => 0,
    };

    tracing::trace!(count, moved, "copied bytes");
    count
}

fn move_bytes(dst: &mut [u8], src: &[u8]) {
    if dst.len() == 1 {
        dst[0] = src[0];
    } else {
        dst.copy_from_slice(src);
    }
}
