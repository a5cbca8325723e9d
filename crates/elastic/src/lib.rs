//! Elastic: growable contiguous buffers with amortized growth.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the elastic sub-crates. For most users, adding `elastic` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use elastic::prelude::*;
//!
//! let desc = ElementDescriptor::of::<u32>();
//! let mut engine = ArrayEngine::new();
//!
//! // Three live elements, room for four.
//! let small = engine.construct(&desc, 3, 4).unwrap();
//! small.write_element(&desc, 2, &7u32.to_le_bytes()).unwrap();
//!
//! // Grow to hold at least six; length and contents carry over.
//! let grown = engine.grow(&desc, &small, 6, &mut NoCollector).unwrap();
//! assert_eq!(grown.len(), 3);
//! assert!(grown.capacity() >= 6);
//! assert_eq!(grown.read_element(&desc, 2).unwrap(), 7u32.to_le_bytes());
//!
//! // Copies move the shorter of the two lengths.
//! let dst = engine.construct(&desc, 2, 2).unwrap();
//! assert_eq!(copy(&dst, &grown, desc.size()), 2);
//!
//! // Retiring the last view of a buffer hands it back for reuse.
//! let disposition = small.retire();
//! assert!(disposition.is_released());
//! engine.reclaim(disposition);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `elastic-core` | Descriptors, buffers, errors, collaborator traits |
//! | [`array`] | `elastic-array` | Engine, handles, growth policy, size-class allocator |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`elastic-core`).
///
/// Contains [`types::ElementDescriptor`], [`types::Buffer`], the
/// [`types::ArrayError`] type, and the [`types::RawAllocator`] and
/// [`types::CollectorHooks`] traits.
pub use elastic_core as types;

/// The array engine (`elastic-array`).
///
/// [`array::ArrayEngine`] constructs and grows arrays,
/// [`array::copy`] moves elements between them.
pub use elastic_array as array;

/// Common imports for typical elastic usage.
///
/// ```rust
/// use elastic::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use elastic_core::{ArrayError, CollectorHooks, ElementDescriptor, RawAllocator};

    // Engine and handles
    pub use elastic_array::{
        copy, copy_from_bytes, ArrayEngine, ArrayHandle, Disposition, EngineConfig, NoCollector,
        SizeClassAllocator, WriteBarrier,
    };
}
