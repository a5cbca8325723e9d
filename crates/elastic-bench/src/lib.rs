//! Benchmark workloads for the elastic buffer engine.
//!
//! - [`append_workload`]: push `n` elements one at a time, growing by one
//!   element whenever the array is full
//! - [`reference_element`]: a 16-byte element with one reference word

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use elastic_array::{ArrayEngine, ArrayHandle};
use elastic_core::{ArrayError, CollectorHooks, ElementDescriptor, RawAllocator};

/// 16-byte element whose second word is a reference.
pub fn reference_element() -> Result<ElementDescriptor, ArrayError> {
    ElementDescriptor::with_references(16, 8, &[8])
}

/// Append `n` zero elements to an empty array the way a `push` loop does:
/// extend `len` while there is room, grow by one otherwise.
///
/// Returns the final handle and the number of growths it took.
pub fn append_workload<A, C>(
    engine: &mut ArrayEngine<A>,
    desc: &ElementDescriptor,
    n: usize,
    collector: &mut C,
) -> Result<(ArrayHandle, usize), ArrayError>
where
    A: RawAllocator,
    C: CollectorHooks + ?Sized,
{
    let mut array = engine.construct(desc, 0, 0)?;
    let mut grows = 0;
    for _ in 0..n {
        if array.len() == array.capacity() {
            let min_cap = array.capacity() + 1;
            let disposition = engine.grow_in_place(desc, &mut array, min_cap, collector)?;
            engine.reclaim(disposition);
            grows += 1;
        }
        array = array.reslice(desc, 0, array.len() + 1)?;
    }
    Ok((array, grows))
}
