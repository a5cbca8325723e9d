//! Growable contiguous-buffer engine.
//!
//! Constructs arrays of a requested length and capacity, grows them under
//! an amortized policy, and copies data between them. Storage comes from a
//! [`RawAllocator`](elastic_core::RawAllocator); reference-containing
//! elements are moved through [`CollectorHooks`](elastic_core::CollectorHooks)
//! whenever the caller's collector reports an active write barrier.
//!
//! # Architecture
//!
//! ```text
//! ArrayEngine<A: RawAllocator>
//! ├── EngineConfig (addressable bound, small-array threshold)
//! ├── GrowthPolicy (×2 below the threshold, ×1.25 above)
//! └── A (SizeClassAllocator by default: size classes + recycling cache)
//!
//! ArrayHandle { BufferRef, offset, len, cap }
//! └── BufferRef::ZeroWidth | BufferRef::Heap(Rc<RefCell<Buffer>>)
//! ```
//!
//! Growth never mutates its source handle. Retiring a handle is explicit:
//! [`ArrayHandle::retire`] reports whether the buffer died with it.
//!
//! # Threading
//!
//! Handles are `Rc`-based and therefore neither `Send` nor `Sync`; an
//! engine instance and its arrays live on one thread.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod collector;
pub mod config;
pub mod copy;
pub mod engine;
pub mod handle;
pub mod policy;
pub mod size_class;

// Public re-exports for the primary API surface.
pub use collector::{NoCollector, WriteBarrier};
pub use config::EngineConfig;
pub use copy::{copy, copy_from_bytes};
pub use engine::{ArrayEngine, CopyStrategy, EngineStats};
pub use handle::{ArrayHandle, BufferRef, Disposition};
pub use policy::GrowthPolicy;
pub use size_class::{AllocatorStats, SizeClassAllocator, SizeClassConfig};
