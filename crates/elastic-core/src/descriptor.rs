//! Element descriptors: size, alignment, and reference layout.
//!
//! An [`ElementDescriptor`] is the only type information the engine sees.
//! Handles never carry one; it is passed to every operation so the same
//! buffer layout can be reinterpreted at a different element width.

use smallvec::SmallVec;

use crate::error::{ArrayError, Operation};

/// Width in bytes of a single reference word inside an element.
pub const REF_WORD_BYTES: usize = 8;

/// Immutable metadata for one element type.
///
/// `ref_slots` lists the byte offsets of reference words the collector
/// must track. An element "contains references" iff the list is non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementDescriptor {
    size: usize,
    align: usize,
    ref_slots: SmallVec<[u32; 4]>,
}

impl ElementDescriptor {
    /// A reference-free descriptor.
    ///
    /// Fails with `InvalidArgument` if `align` is not a power of two.
    pub fn new(size: usize, align: usize) -> Result<Self, ArrayError> {
        Self::with_references(size, align, &[])
    }

    /// A descriptor whose elements hold reference words at `ref_slots`.
    ///
    /// Each slot must be a multiple of [`REF_WORD_BYTES`] and the word must
    /// lie entirely inside the element. Slots are stored sorted and
    /// deduplicated.
    pub fn with_references(
        size: usize,
        align: usize,
        ref_slots: &[u32],
    ) -> Result<Self, ArrayError> {
        if !align.is_power_of_two() {
            return Err(ArrayError::invalid_argument(
                Operation::Describe,
                format!("alignment {align} is not a power of two"),
            ));
        }
        let mut slots: SmallVec<[u32; 4]> = ref_slots.iter().copied().collect();
        slots.sort_unstable();
        slots.dedup();
        for &slot in &slots {
            let start = slot as usize;
            if start % REF_WORD_BYTES != 0 {
                return Err(ArrayError::invalid_argument(
                    Operation::Describe,
                    format!("reference slot {slot} is not word aligned"),
                ));
            }
            if start + REF_WORD_BYTES > size {
                return Err(ArrayError::invalid_argument(
                    Operation::Describe,
                    format!("reference slot {slot} extends past element size {size}"),
                ));
            }
        }
        Ok(Self {
            size,
            align,
            ref_slots: slots,
        })
    }

    /// A reference-free descriptor matching a Rust type's layout.
    pub fn of<T>() -> Self {
        Self {
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
            ref_slots: SmallVec::new(),
        }
    }

    /// Element size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Element alignment in bytes (always a power of two).
    pub fn align(&self) -> usize {
        self.align
    }

    /// Whether the collector must track values of this element type.
    pub fn contains_references(&self) -> bool {
        !self.ref_slots.is_empty()
    }

    /// Byte offsets of reference words within one element.
    pub fn ref_slots(&self) -> &[u32] {
        &self.ref_slots
    }

    /// Whether elements occupy no storage.
    pub fn is_zero_sized(&self) -> bool {
        self.size == 0
    }

    /// Largest element count whose byte size stays within `max_bytes`.
    ///
    /// Zero-sized elements are unbounded.
    pub fn max_elements(&self, max_bytes: usize) -> usize {
        if self.size == 0 {
            usize::MAX
        } else {
            max_bytes / self.size
        }
    }
}
