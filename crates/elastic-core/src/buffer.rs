//! Owned byte buffers and allocation requests.
//!
//! A [`Buffer`] is the unit of storage handed out by a
//! [`RawAllocator`](crate::RawAllocator). All access goes through
//! offset/length ranges checked against the buffer's extent; there is no
//! pointer arithmetic anywhere in the engine.
//!
//! A buffer may be charged to a [`ByteMeter`]; its extent then counts as
//! live on that meter until the buffer is dropped or uncharged.

use std::cell::Cell;
use std::rc::Rc;

/// Whether the collector must scan a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocKind {
    /// Plain bytes; never scanned.
    Raw,
    /// Holds reference-containing elements; tracked by the collector.
    Traced,
}

/// Initial contents requested from the allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Init {
    /// Every byte must be zero.
    Zeroed,
    /// Contents are unspecified and may hold stale bytes from a previous
    /// owner. The caller overwrites or zero-fills every byte it exposes.
    Unspecified,
}

/// A single allocation request passed to
/// [`RawAllocator::allocate`](crate::RawAllocator::allocate).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocRequest {
    /// Minimum number of bytes.
    pub bytes: usize,
    /// Required alignment (power of two).
    pub align: usize,
    /// Scanning class of the buffer.
    pub kind: AllocKind,
    /// Required initial contents.
    pub init: Init,
}

impl AllocRequest {
    /// A zeroed request.
    pub fn zeroed(bytes: usize, align: usize, kind: AllocKind) -> Self {
        Self {
            bytes,
            align,
            kind,
            init: Init::Zeroed,
        }
    }

    /// A request whose contents the caller will fully overwrite.
    pub fn unspecified(bytes: usize, align: usize, kind: AllocKind) -> Self {
        Self {
            bytes,
            align,
            kind,
            init: Init::Unspecified,
        }
    }
}

/// Shared count of live bytes across every buffer charged to it.
///
/// Clones observe the same count.
#[derive(Clone, Debug, Default)]
pub struct ByteMeter(Rc<Cell<usize>>);

impl ByteMeter {
    /// A meter reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently charged.
    pub fn live_bytes(&self) -> usize {
        self.0.get()
    }

    fn charge(&self, bytes: usize) {
        self.0.set(self.0.get().saturating_add(bytes));
    }

    fn credit(&self, bytes: usize) {
        self.0.set(self.0.get().saturating_sub(bytes));
    }
}

/// One buffer's charge against a meter; credited back on drop.
#[derive(Debug)]
struct Charge {
    meter: ByteMeter,
    bytes: usize,
}

impl Clone for Charge {
    fn clone(&self) -> Self {
        self.meter.charge(self.bytes);
        Self {
            meter: self.meter.clone(),
            bytes: self.bytes,
        }
    }
}

impl Drop for Charge {
    fn drop(&mut self) {
        self.meter.credit(self.bytes);
    }
}

/// Contiguous owned storage with a recorded alignment and kind.
///
/// The extent (`len()`) may exceed the bytes originally requested when the
/// allocator rounds up to a size class. Equality compares contents,
/// alignment and kind; the meter charge is not part of it.
#[derive(Clone, Debug)]
pub struct Buffer {
    bytes: Vec<u8>,
    align: usize,
    kind: AllocKind,
    charge: Option<Charge>,
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes && self.align == other.align && self.kind == other.kind
    }
}

impl Eq for Buffer {}

impl Buffer {
    /// Wrap existing storage.
    pub fn from_vec(bytes: Vec<u8>, align: usize, kind: AllocKind) -> Self {
        Self {
            bytes,
            align,
            kind,
            charge: None,
        }
    }

    /// A zero-filled buffer of `len` bytes.
    pub fn zeroed(len: usize, align: usize, kind: AllocKind) -> Self {
        Self::from_vec(vec![0; len], align, kind)
    }

    /// Extent in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer has no extent.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Recorded alignment in bytes.
    pub fn align(&self) -> usize {
        self.align
    }

    /// Scanning class.
    pub fn kind(&self) -> AllocKind {
        self.kind
    }

    /// Re-tag the buffer, e.g. when a recycled block changes owner.
    pub fn set_kind(&mut self, kind: AllocKind) {
        self.kind = kind;
    }

    /// Raise the recorded alignment.
    pub fn set_align(&mut self, align: usize) {
        self.align = align;
    }

    /// The whole extent.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// The whole extent, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Whether `offset..offset + len` lies inside the extent.
    pub fn contains_range(&self, offset: usize, len: usize) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.bytes.len())
    }

    /// A shared view of `len` bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` exceeds the extent.
    pub fn range(&self, offset: usize, len: usize) -> &[u8] {
        &self.bytes[offset..offset + len]
    }

    /// A mutable view of `len` bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` exceeds the extent.
    pub fn range_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.bytes[offset..offset + len]
    }

    /// Count the extent as live on `meter` until this buffer is dropped.
    ///
    /// Replaces (and credits back) any previous charge.
    pub fn charge_to(&mut self, meter: &ByteMeter) {
        meter.charge(self.bytes.len());
        self.charge = Some(Charge {
            meter: meter.clone(),
            bytes: self.bytes.len(),
        });
    }

    /// Credit back the current charge, if any.
    pub fn uncharge(&mut self) {
        self.charge = None;
    }

    /// Whether the buffer is charged to a meter.
    pub fn is_charged(&self) -> bool {
        self.charge.is_some()
    }

    /// Consume the buffer and return its storage, crediting any charge.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}
