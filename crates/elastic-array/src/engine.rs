//! Array construction and growth.
//!
//! [`ArrayEngine`] composes an [`EngineConfig`], a [`GrowthPolicy`] and a
//! [`RawAllocator`]. Every operation validates all of its inputs before it
//! allocates, so a failed call leaves no observable allocation behind.

use std::cell::Ref;

use elastic_core::{
    AllocKind, AllocRequest, ArrayError, Buffer, CollectorHooks, ElementDescriptor, Operation,
    Quantity, RawAllocator,
};

use crate::config::EngineConfig;
use crate::handle::{ArrayHandle, BufferRef, Disposition};
use crate::policy::GrowthPolicy;
use crate::size_class::SizeClassAllocator;

/// How growth moved the old elements into the new buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyStrategy {
    /// Reference-free elements: one bulk move, then the tail is zeroed.
    Bulk,
    /// Reference-containing elements with the barrier active: one typed
    /// move per element.
    TypedMoves,
    /// Reference-containing elements with the barrier inactive: one bulk
    /// move into a traced buffer.
    BulkTraced,
}

impl CopyStrategy {
    fn as_str(self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::TypedMoves => "typed_moves",
            Self::BulkTraced => "bulk_traced",
        }
    }
}

/// Counters exposed by [`ArrayEngine::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Successful constructions.
    pub constructed: u64,
    /// Successful growths, including zero-width ones.
    pub grown: u64,
    /// Growths of zero-sized element arrays (no allocation).
    pub zero_width_grows: u64,
    /// Growths that moved elements one at a time through the collector.
    pub typed_move_grows: u64,
    /// Bytes obtained from the allocator.
    pub bytes_allocated: u64,
}

/// Constructs and grows arrays.
pub struct ArrayEngine<A: RawAllocator = SizeClassAllocator> {
    allocator: A,
    config: EngineConfig,
    policy: GrowthPolicy,
    stats: EngineStats,
}

impl ArrayEngine<SizeClassAllocator> {
    /// An engine with default configuration and the default allocator.
    pub fn new() -> Self {
        let config = EngineConfig::default();
        Self {
            allocator: SizeClassAllocator::default(),
            policy: GrowthPolicy::from_config(&config),
            config,
            stats: EngineStats::default(),
        }
    }
}

impl Default for ArrayEngine<SizeClassAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: RawAllocator> ArrayEngine<A> {
    /// An engine over `allocator`, validating `config`.
    pub fn with_allocator(config: EngineConfig, allocator: A) -> Result<Self, ArrayError> {
        config.validate()?;
        Ok(Self {
            allocator,
            policy: GrowthPolicy::from_config(&config),
            config,
            stats: EngineStats::default(),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The growth policy derived from the configuration.
    pub fn policy(&self) -> &GrowthPolicy {
        &self.policy
    }

    /// The allocator.
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// The allocator, mutably.
    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.allocator
    }

    /// Current counters.
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Consume the engine and return its allocator.
    pub fn into_allocator(self) -> A {
        self.allocator
    }

    /// Create an array of `len` elements with room for `cap`.
    ///
    /// Fails with `OutOfRange` if either count is negative, not
    /// representable, or implies more than `max_bytes`, or if `cap < len`.
    /// Storage is zeroed; nothing is allocated when `cap * size == 0`.
    pub fn construct(
        &mut self,
        desc: &ElementDescriptor,
        len: i64,
        cap: i64,
    ) -> Result<ArrayHandle, ArrayError> {
        let len = self.element_count(desc, len, Quantity::Length)?;
        let cap = self.element_count(desc, cap, Quantity::Capacity)?;
        if cap < len {
            return Err(ArrayError::out_of_range(
                Operation::Construct,
                Quantity::Capacity,
                cap,
            ));
        }

        // Bounded by `max_elements` above.
        let bytes = cap * desc.size();
        let handle = if bytes == 0 {
            ArrayHandle::zero_width(len, cap)
        } else {
            let kind = if desc.contains_references() {
                AllocKind::Traced
            } else {
                AllocKind::Raw
            };
            let buffer = self.allocate(AllocRequest::zeroed(bytes, desc.align(), kind))?;
            ArrayHandle::heap(buffer, len, cap)
        };

        tracing::trace!(len, cap, bytes, "constructed array");
        self.stats.constructed += 1;
        Ok(handle)
    }

    /// Grow `old` so it can hold at least `min_cap` elements.
    ///
    /// Returns a new handle with the same length over fresh storage; `old`
    /// is left untouched. Reference-containing elements are moved one at a
    /// time through `collector` while its write barrier is active.
    ///
    /// Fails with `OutOfRange` if `min_cap < old.capacity()` or if the chosen
    /// capacity's byte size exceeds `max_bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `old` was not built for `desc`'s element size, i.e. its
    /// live bytes fall outside its buffer.
    pub fn grow<C: CollectorHooks + ?Sized>(
        &mut self,
        desc: &ElementDescriptor,
        old: &ArrayHandle,
        min_cap: usize,
        collector: &mut C,
    ) -> Result<ArrayHandle, ArrayError> {
        let max_elements = desc.max_elements(self.config.max_bytes);
        if min_cap < old.capacity() || min_cap > max_elements {
            return Err(ArrayError::out_of_range(
                Operation::Grow,
                Quantity::Capacity,
                min_cap,
            ));
        }

        let size = desc.size();
        if size == 0 {
            tracing::trace!(len = old.len(), min_cap, "zero-width growth");
            self.stats.grown += 1;
            self.stats.zero_width_grows += 1;
            return Ok(ArrayHandle::zero_width(old.len(), min_cap));
        }

        let suggested = self
            .policy
            .next_capacity(old.capacity(), old.len(), min_cap)?;
        if suggested > max_elements {
            return Err(ArrayError::out_of_range(
                Operation::Grow,
                Quantity::Capacity,
                suggested,
            ));
        }

        let requested = suggested * size;
        let mut cap_bytes = self.allocator.round_up_size(requested);
        if cap_bytes < requested {
            tracing::warn!(requested, rounded = cap_bytes, "allocator rounded size down");
            cap_bytes = requested;
        }
        if cap_bytes > self.config.max_bytes {
            return Err(ArrayError::out_of_range(
                Operation::Grow,
                Quantity::Capacity,
                cap_bytes / size,
            ));
        }
        if cap_bytes == 0 {
            // Only reachable as grow(0 -> 0).
            self.stats.grown += 1;
            return Ok(ArrayHandle::zero_width(old.len(), 0));
        }
        let new_cap = cap_bytes / size;
        // The sentinel holds no bytes; its elements read back as zero.
        let len_bytes = if old.is_zero_width() {
            0
        } else {
            old.len() * size
        };

        let source = SourceBytes::borrow(old);
        let src = source.range(old.offset(), len_bytes);

        let (buffer, strategy) = if !desc.contains_references() {
            let mut buffer = self.allocate(AllocRequest::unspecified(
                cap_bytes,
                desc.align(),
                AllocKind::Raw,
            ))?;
            let (head, tail) = buffer.as_mut_slice()[..cap_bytes].split_at_mut(len_bytes);
            self.allocator.bulk_move(head, src);
            // Stale bytes in the tail must never read back as elements.
            self.allocator.zero_fill(tail);
            (buffer, CopyStrategy::Bulk)
        } else {
            let mut buffer = self.allocate(AllocRequest::zeroed(
                cap_bytes,
                desc.align(),
                AllocKind::Traced,
            ))?;
            let dst = &mut buffer.as_mut_slice()[..len_bytes];
            if collector.write_barrier_active() {
                for (d, s) in dst.chunks_exact_mut(size).zip(src.chunks_exact(size)) {
                    collector.typed_move(desc, d, s);
                }
                (buffer, CopyStrategy::TypedMoves)
            } else {
                self.allocator.bulk_move(dst, src);
                (buffer, CopyStrategy::BulkTraced)
            }
        };
        drop(source);

        tracing::debug!(
            old_cap = old.capacity(),
            min_cap,
            new_cap,
            strategy = strategy.as_str(),
            "grew array"
        );
        self.stats.grown += 1;
        if strategy == CopyStrategy::TypedMoves {
            self.stats.typed_move_grows += 1;
        }
        Ok(ArrayHandle::heap(buffer, old.len(), new_cap))
    }

    /// Grow `old` to make room for at least `n` more elements beyond its
    /// current capacity.
    ///
    /// Fails with `InvalidArgument` if `n < 1`, otherwise behaves like
    /// [`grow`](Self::grow) with `min_cap = old.capacity() + n`.
    pub fn grow_by_at_least<C: CollectorHooks + ?Sized>(
        &mut self,
        desc: &ElementDescriptor,
        old: &ArrayHandle,
        n: i64,
        collector: &mut C,
    ) -> Result<ArrayHandle, ArrayError> {
        if n < 1 {
            return Err(ArrayError::invalid_argument(
                Operation::Grow,
                format!("growth increment must be at least 1, got {n}"),
            ));
        }
        let overflow = || ArrayError::OutOfRange {
            operation: Operation::Grow,
            quantity: Quantity::Capacity,
            value: old.capacity() as i128 + n as i128,
        };
        let n = usize::try_from(n).map_err(|_| overflow())?;
        let min_cap = old.capacity().checked_add(n).ok_or_else(overflow)?;
        self.grow(desc, old, min_cap, collector)
    }

    /// Grow the array in `slot`, replace it with the grown handle and retire
    /// the old view.
    ///
    /// On error `slot` is unchanged.
    pub fn grow_in_place<C: CollectorHooks + ?Sized>(
        &mut self,
        desc: &ElementDescriptor,
        slot: &mut ArrayHandle,
        min_cap: usize,
        collector: &mut C,
    ) -> Result<Disposition, ArrayError> {
        let grown = self.grow(desc, slot, min_cap, collector)?;
        let old = std::mem::replace(slot, grown);
        Ok(old.retire())
    }

    /// Return a released buffer to the allocator.
    ///
    /// Shared and zero-width dispositions are ignored.
    pub fn reclaim(&mut self, disposition: Disposition) {
        if let Disposition::Released(buffer) = disposition {
            self.allocator.release(buffer);
        }
    }

    fn element_count(
        &self,
        desc: &ElementDescriptor,
        value: i64,
        quantity: Quantity,
    ) -> Result<usize, ArrayError> {
        let out_of_range = || ArrayError::OutOfRange {
            operation: Operation::Construct,
            quantity,
            value: value as i128,
        };
        let count = usize::try_from(value).map_err(|_| out_of_range())?;
        if count > desc.max_elements(self.config.max_bytes) {
            return Err(out_of_range());
        }
        Ok(count)
    }

    fn allocate(&mut self, request: AllocRequest) -> Result<Buffer, ArrayError> {
        let buffer = self.allocator.allocate(request)?;
        if buffer.len() < request.bytes {
            tracing::warn!(
                requested = request.bytes,
                extent = buffer.len(),
                "allocator returned a short buffer"
            );
            return Err(ArrayError::AllocationFailure {
                requested: request.bytes,
                align: request.align,
            });
        }
        self.stats.bytes_allocated += buffer.len() as u64;
        Ok(buffer)
    }
}

/// Borrowed live bytes of a growth source.
enum SourceBytes<'a> {
    Empty,
    Heap(Ref<'a, Buffer>),
}

impl<'a> SourceBytes<'a> {
    fn borrow(handle: &'a ArrayHandle) -> Self {
        match handle.buffer() {
            BufferRef::ZeroWidth => Self::Empty,
            BufferRef::Heap(buf) => Self::Heap(buf.borrow()),
        }
    }

    fn range(&self, offset: usize, len: usize) -> &[u8] {
        match self {
            Self::Empty => {
                let empty: &[u8] = &[];
                &empty[..len]
            }
            Self::Heap(buf) => buf.range(offset, len),
        }
    }
}
