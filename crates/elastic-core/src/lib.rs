//! Core types and traits for the elastic buffer engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the engine and its collaborators:
//! element descriptors, the owned [`Buffer`] abstraction, the
//! [`ArrayError`] type, and the [`RawAllocator`] / [`CollectorHooks`]
//! traits the engine calls into.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod descriptor;
pub mod error;
pub mod traits;

pub use buffer::{AllocKind, AllocRequest, Buffer, ByteMeter, Init};
pub use descriptor::{ElementDescriptor, REF_WORD_BYTES};
pub use error::{ArrayError, Operation, Quantity};
pub use traits::{CollectorHooks, RawAllocator};
