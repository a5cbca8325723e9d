//! Default [`RawAllocator`]: size-class rounding with a recycling cache.
//!
//! Small requests (up to [`MAX_SMALL_SIZE`] bytes) are rounded up to one of
//! [`SIZE_CLASSES`]; larger requests are rounded up to a whole number of
//! pages. Released small buffers are kept per class and handed out again,
//! with their stale contents intact unless the request asks for zeroed
//! memory.
//!
//! Every buffer handed out is charged to the allocator's [`ByteMeter`], so
//! live bytes fall as soon as a buffer is dropped, whether or not it comes
//! back through [`RawAllocator::release`].

use elastic_core::{AllocRequest, ArrayError, Buffer, ByteMeter, Init, RawAllocator};

/// Block sizes, in bytes, of the small-object classes.
pub const SIZE_CLASSES: [usize; 66] = [
    8, 16, 32, 48, 64, 80, 96, 112, 128, 144, 160, 176, 192, 208, 224, 240, 256, 288, 320, 352,
    384, 416, 448, 480, 512, 576, 640, 704, 768, 896, 1024, 1152, 1280, 1408, 1536, 1792, 2048,
    2304, 2688, 3072, 3200, 3456, 4096, 4864, 5376, 6144, 6528, 6784, 6912, 8192, 9472, 9728,
    10240, 10880, 12288, 13568, 14336, 16384, 18432, 19072, 20480, 21760, 24576, 27264, 28672,
    32768,
];

/// Largest request served from a size class.
pub const MAX_SMALL_SIZE: usize = 32768;

/// Index into [`SIZE_CLASSES`] of the smallest class holding `bytes`.
///
/// Returns `None` for zero or for requests above [`MAX_SMALL_SIZE`].
pub fn size_class_index(bytes: usize) -> Option<usize> {
    if bytes == 0 || bytes > MAX_SMALL_SIZE {
        return None;
    }
    Some(SIZE_CLASSES.partition_point(|&class| class < bytes))
}

/// Configuration for a [`SizeClassAllocator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SizeClassConfig {
    /// Granularity for requests above [`MAX_SMALL_SIZE`]. Default: 8192.
    pub page_size: usize,
    /// Released buffers kept per size class. Default: 16.
    pub max_cached_per_class: usize,
    /// Upper bound on live bytes; `None` means unbounded.
    pub heap_limit: Option<usize>,
}

impl SizeClassConfig {
    /// Default page size.
    pub const DEFAULT_PAGE_SIZE: usize = 8192;

    /// Default per-class cache depth.
    pub const DEFAULT_MAX_CACHED_PER_CLASS: usize = 16;

    /// Set a live-byte limit.
    pub fn with_heap_limit(mut self, limit: usize) -> Self {
        self.heap_limit = Some(limit);
        self
    }
}

impl Default for SizeClassConfig {
    fn default() -> Self {
        Self {
            page_size: Self::DEFAULT_PAGE_SIZE,
            max_cached_per_class: Self::DEFAULT_MAX_CACHED_PER_CLASS,
            heap_limit: None,
        }
    }
}

/// Counters exposed by [`SizeClassAllocator::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Successful allocations, fresh or recycled.
    pub allocations: u64,
    /// Allocations served from the recycling cache.
    pub recycled: u64,
    /// Bytes handed out whose buffers are still alive.
    pub live_bytes: usize,
    /// Buffers currently parked in the cache.
    pub cached_buffers: usize,
}

/// Size-class allocator backed by `Vec<u8>`.
pub struct SizeClassAllocator {
    config: SizeClassConfig,
    /// One free list per entry of [`SIZE_CLASSES`]. Cached buffers are
    /// uncharged.
    caches: Vec<Vec<Buffer>>,
    live: ByteMeter,
    stats: AllocatorStats,
}

impl SizeClassAllocator {
    /// Create an allocator, validating `config`.
    pub fn new(config: SizeClassConfig) -> Result<Self, ArrayError> {
        if config.page_size == 0 {
            return Err(ArrayError::InvalidConfig {
                reason: "page_size must be non-zero".to_string(),
            });
        }
        Ok(Self {
            config,
            caches: vec![Vec::new(); SIZE_CLASSES.len()],
            live: ByteMeter::new(),
            stats: AllocatorStats::default(),
        })
    }

    /// Current counters.
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            live_bytes: self.live.live_bytes(),
            ..self.stats
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &SizeClassConfig {
        &self.config
    }

    fn take_cached(&mut self, class: usize, align: usize) -> Option<Buffer> {
        let cache = &mut self.caches[class];
        let pos = cache.iter().rposition(|buf| buf.align() >= align)?;
        self.stats.cached_buffers -= 1;
        Some(cache.swap_remove(pos))
    }

    fn fresh(extent: usize, request: &AllocRequest) -> Result<Buffer, ArrayError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(extent)
            .map_err(|_| ArrayError::AllocationFailure {
                requested: request.bytes,
                align: request.align,
            })?;
        bytes.resize(extent, 0);
        Ok(Buffer::from_vec(bytes, request.align, request.kind))
    }
}

impl Default for SizeClassAllocator {
    fn default() -> Self {
        Self {
            config: SizeClassConfig::default(),
            caches: vec![Vec::new(); SIZE_CLASSES.len()],
            live: ByteMeter::new(),
            stats: AllocatorStats::default(),
        }
    }
}

impl RawAllocator for SizeClassAllocator {
    fn allocate(&mut self, request: AllocRequest) -> Result<Buffer, ArrayError> {
        let failure = ArrayError::AllocationFailure {
            requested: request.bytes,
            align: request.align,
        };
        if !request.align.is_power_of_two() {
            return Err(failure);
        }
        let extent = self.round_up_size(request.bytes);
        if let Some(limit) = self.config.heap_limit {
            match self.live.live_bytes().checked_add(extent) {
                Some(total) if total <= limit => {}
                _ => return Err(failure),
            }
        }

        let cached = size_class_index(request.bytes)
            .and_then(|class| self.take_cached(class, request.align));
        let mut buffer = match cached {
            Some(mut buf) => {
                tracing::trace!(bytes = extent, "recycled cached buffer");
                buf.set_kind(request.kind);
                buf.set_align(request.align.max(buf.align()));
                if request.init == Init::Zeroed {
                    buf.as_mut_slice().fill(0);
                }
                self.stats.recycled += 1;
                buf
            }
            None => Self::fresh(extent, &request)?,
        };

        buffer.charge_to(&self.live);
        self.stats.allocations += 1;
        Ok(buffer)
    }

    fn round_up_size(&self, bytes: usize) -> usize {
        if bytes == 0 {
            return 0;
        }
        match size_class_index(bytes) {
            Some(class) => SIZE_CLASSES[class],
            None => {
                let page = self.config.page_size;
                match bytes.checked_add(page - 1) {
                    Some(padded) => padded / page * page,
                    None => bytes,
                }
            }
        }
    }

    fn release(&mut self, mut buffer: Buffer) {
        let Some(class) = size_class_index(buffer.len()) else {
            return;
        };
        if SIZE_CLASSES[class] != buffer.len() {
            return;
        }
        let cache = &mut self.caches[class];
        if cache.len() < self.config.max_cached_per_class {
            buffer.uncharge();
            cache.push(buffer);
            self.stats.cached_buffers += 1;
        }
    }
}
