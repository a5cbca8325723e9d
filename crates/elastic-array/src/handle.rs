//! Array handles and buffer dispositions.
//!
//! An [`ArrayHandle`] is a view `{buffer, offset, len, cap}` over shared
//! storage, the equivalent of a slice header. Cloning a handle creates a
//! second view of the same buffer. Handles never record an element
//! descriptor; operations that need element geometry take one.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use elastic_core::{ArrayError, Buffer, ElementDescriptor, Operation, Quantity};

/// Heap storage shared between the views of one array.
pub type SharedBuffer = Rc<RefCell<Buffer>>;

/// What a handle points at.
#[derive(Clone, Debug)]
pub enum BufferRef {
    /// The zero-width sentinel. Used whenever `cap * size == 0`; never
    /// allocated and shared by every such handle.
    ZeroWidth,
    /// A heap buffer.
    Heap(SharedBuffer),
}

impl BufferRef {
    /// Whether this is the zero-width sentinel.
    pub fn is_zero_width(&self) -> bool {
        matches!(self, Self::ZeroWidth)
    }

    /// Whether both refer to the same storage.
    pub fn same_buffer(&self, other: &BufferRef) -> bool {
        match (self, other) {
            (Self::ZeroWidth, Self::ZeroWidth) => true,
            (Self::Heap(a), Self::Heap(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Extent of the underlying storage in bytes.
    pub fn extent(&self) -> usize {
        match self {
            Self::ZeroWidth => 0,
            Self::Heap(buf) => buf.borrow().len(),
        }
    }

    /// Number of live views of a heap buffer (0 for the sentinel).
    pub fn view_count(&self) -> usize {
        match self {
            Self::ZeroWidth => 0,
            Self::Heap(buf) => Rc::strong_count(buf),
        }
    }
}

/// What became of the storage behind a retired handle.
#[derive(Debug)]
pub enum Disposition {
    /// The retired handle was the last view; the buffer is dead and owned
    /// by the caller, who may return it to an allocator.
    Released(Buffer),
    /// Other views still keep the buffer alive.
    Shared {
        /// Views remaining after retirement.
        views: usize,
    },
    /// The handle pointed at the zero-width sentinel.
    ZeroWidth,
}

impl Disposition {
    /// Whether the buffer died with the retired handle.
    pub fn is_released(&self) -> bool {
        matches!(self, Self::Released(_))
    }
}

/// A view over an array: `len` live elements within `cap` slots starting
/// `offset` bytes into the buffer.
///
/// Invariant: `len <= cap`, and `offset + cap * size` fits in the buffer's
/// extent for the descriptor the handle was created with.
#[derive(Clone, Debug)]
#[must_use]
pub struct ArrayHandle {
    pub(crate) buffer: BufferRef,
    /// Byte offset of element 0 within the buffer.
    pub(crate) offset: usize,
    pub(crate) len: usize,
    pub(crate) cap: usize,
}

impl ArrayHandle {
    pub(crate) fn new(buffer: BufferRef, offset: usize, len: usize, cap: usize) -> Self {
        debug_assert!(len <= cap, "len {len} exceeds cap {cap}");
        Self {
            buffer,
            offset,
            len,
            cap,
        }
    }

    pub(crate) fn heap(buffer: Buffer, len: usize, cap: usize) -> Self {
        Self::new(BufferRef::Heap(Rc::new(RefCell::new(buffer))), 0, len, cap)
    }

    /// A handle over the zero-width sentinel.
    ///
    /// # Panics
    ///
    /// Panics if `len > cap`.
    pub fn zero_width(len: usize, cap: usize) -> Self {
        assert!(len <= cap, "len {len} exceeds cap {cap}");
        Self::new(BufferRef::ZeroWidth, 0, len, cap)
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no live elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of element slots.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Byte offset of element 0 within the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The underlying storage reference.
    pub fn buffer(&self) -> &BufferRef {
        &self.buffer
    }

    /// Whether this handle uses the zero-width sentinel.
    pub fn is_zero_width(&self) -> bool {
        self.buffer.is_zero_width()
    }

    /// Whether two handles are views of the same storage.
    pub fn shares_buffer(&self, other: &ArrayHandle) -> bool {
        self.buffer.same_buffer(&other.buffer)
    }

    /// A sub-view over elements `low..high`, keeping the tail capacity.
    ///
    /// Fails with `OutOfRange` unless `low <= high <= cap`.
    pub fn reslice(
        &self,
        desc: &ElementDescriptor,
        low: usize,
        high: usize,
    ) -> Result<ArrayHandle, ArrayError> {
        if high > self.cap {
            return Err(ArrayError::out_of_range(
                Operation::Reslice,
                Quantity::Index,
                high,
            ));
        }
        if low > high {
            return Err(ArrayError::out_of_range(
                Operation::Reslice,
                Quantity::Index,
                low,
            ));
        }
        let offset = if self.buffer.is_zero_width() {
            0
        } else {
            self.offset + low * desc.size()
        };
        Ok(Self::new(
            self.buffer.clone(),
            offset,
            high - low,
            self.cap - low,
        ))
    }

    /// Copy the live elements out as bytes.
    pub fn to_bytes(&self, desc: &ElementDescriptor) -> Vec<u8> {
        let n = self.len * desc.size();
        match &self.buffer {
            BufferRef::ZeroWidth => Vec::new(),
            BufferRef::Heap(buf) => buf.borrow().range(self.offset, n).to_vec(),
        }
    }

    /// Copy element `index` out as bytes.
    ///
    /// Fails with `OutOfRange` if `index >= len`.
    pub fn read_element(
        &self,
        desc: &ElementDescriptor,
        index: usize,
    ) -> Result<Vec<u8>, ArrayError> {
        self.check_index(index)?;
        match &self.buffer {
            BufferRef::ZeroWidth => Ok(Vec::new()),
            BufferRef::Heap(buf) => {
                let start = self.offset + index * desc.size();
                Ok(buf.borrow().range(start, desc.size()).to_vec())
            }
        }
    }

    /// Overwrite element `index` with `bytes`.
    ///
    /// Fails with `OutOfRange` if `index >= len`, or `InvalidArgument` if
    /// `bytes` is not exactly one element wide.
    pub fn write_element(
        &self,
        desc: &ElementDescriptor,
        index: usize,
        bytes: &[u8],
    ) -> Result<(), ArrayError> {
        self.check_index(index)?;
        if bytes.len() != desc.size() {
            return Err(ArrayError::invalid_argument(
                Operation::Access,
                format!("element is {} bytes, got {}", desc.size(), bytes.len()),
            ));
        }
        if let BufferRef::Heap(buf) = &self.buffer {
            let start = self.offset + index * desc.size();
            buf.borrow_mut()
                .range_mut(start, desc.size())
                .copy_from_slice(bytes);
        }
        Ok(())
    }

    /// Give up this view and report what became of its storage.
    pub fn retire(self) -> Disposition {
        match self.buffer {
            BufferRef::ZeroWidth => Disposition::ZeroWidth,
            BufferRef::Heap(buf) => match Rc::try_unwrap(buf) {
                Ok(cell) => Disposition::Released(cell.into_inner()),
                Err(buf) => Disposition::Shared {
                    views: Rc::strong_count(&buf) - 1,
                },
            },
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ArrayError> {
        if index >= self.len {
            return Err(ArrayError::out_of_range(
                Operation::Access,
                Quantity::Index,
                index,
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ArrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = match &self.buffer {
            BufferRef::ZeroWidth => "zero-width",
            BufferRef::Heap(_) => "heap",
        };
        write!(
            f,
            "ArrayHandle(off={}, len={}, cap={}, {storage})",
            self.offset, self.len, self.cap
        )
    }
}
