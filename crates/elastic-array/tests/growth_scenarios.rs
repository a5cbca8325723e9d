//! Integration test: construction, growth and copy driven through
//! instrumented collaborators.
//!
//! Uses `CountingAllocator` to observe exactly which allocator primitives a
//! growth path reaches for, and `RecordingCollector` to check that
//! reference-containing elements pass through the write barrier one at a
//! time while it is active.

use elastic_array::{copy, copy_from_bytes, ArrayEngine, ArrayHandle, EngineConfig, NoCollector};
use elastic_core::{AllocKind, ArrayError, Operation, Quantity};
use elastic_test_utils::fixtures::{pair_bytes, pair_desc, unit_desc, word_bytes, word_desc};
use elastic_test_utils::{CountingAllocator, RecordingCollector, POISON};

fn counting_engine() -> ArrayEngine<CountingAllocator> {
    ArrayEngine::with_allocator(EngineConfig::default(), CountingAllocator::new()).unwrap()
}

fn filled_words(
    engine: &mut ArrayEngine<CountingAllocator>,
    len: usize,
    cap: usize,
) -> ArrayHandle {
    let desc = word_desc();
    let h = engine.construct(&desc, len as i64, cap as i64).unwrap();
    for i in 0..len {
        h.write_element(&desc, i, &word_bytes(i as u64 + 1)).unwrap();
    }
    h
}

fn filled_pairs(engine: &mut ArrayEngine<CountingAllocator>, refs: &[u64]) -> ArrayHandle {
    let desc = pair_desc();
    let h = engine
        .construct(&desc, refs.len() as i64, refs.len() as i64)
        .unwrap();
    for (i, &r) in refs.iter().enumerate() {
        h.write_element(&desc, i, &pair_bytes(i as u64, r)).unwrap();
    }
    h
}

// ── construct ────────────────────────────────────────────────────────

#[test]
fn construct_rejects_capacity_below_length() {
    let mut engine = counting_engine();
    let err = engine.construct(&word_desc(), 5, 3).unwrap_err();
    assert_eq!(
        err,
        ArrayError::OutOfRange {
            operation: Operation::Construct,
            quantity: Quantity::Capacity,
            value: 3,
        }
    );
    assert_eq!(err.to_string(), "construct: cap out of range (3)");
    assert_eq!(engine.allocator().counts().allocate, 0);
}

#[test]
fn construct_requests_zeroed_storage_of_matching_kind() {
    let mut engine = counting_engine();
    let _words = engine.construct(&word_desc(), 1, 4).unwrap();
    let _pairs = engine.construct(&pair_desc(), 1, 4).unwrap();
    let counts = engine.allocator().counts();
    assert_eq!(counts.raw_allocations, 1);
    assert_eq!(counts.traced_allocations, 1);
}

#[test]
fn zero_sized_elements_never_allocate() {
    let mut engine = counting_engine();
    let desc = unit_desc();
    let h = engine.construct(&desc, 3, 3).unwrap();
    let grown = engine
        .grow_by_at_least(&desc, &h, 1_000_000, &mut NoCollector)
        .unwrap();
    assert!(grown.is_zero_width());
    assert!(grown.shares_buffer(&h));
    assert_eq!(grown.len(), 3);
    assert_eq!(engine.allocator().counts().allocate, 0);
}

// ── grow: reference-free ─────────────────────────────────────────────

#[test]
fn grow_keeps_length_and_reaches_minimum() {
    let desc = word_desc();
    let mut engine = counting_engine();
    let old = filled_words(&mut engine, 3, 4);
    let grown = engine.grow(&desc, &old, 6, &mut NoCollector).unwrap();
    assert_eq!(grown.len(), 3);
    assert!(grown.capacity() >= 6);
    assert_eq!(grown.to_bytes(&desc), old.to_bytes(&desc));
}

#[test]
fn grow_zeroes_the_unspecified_tail() {
    let desc = word_desc();
    let mut engine = counting_engine();
    let old = filled_words(&mut engine, 2, 4);
    let grown = engine.grow(&desc, &old, 5, &mut NoCollector).unwrap();
    assert_eq!(grown.capacity(), 8);

    let counts = engine.allocator().counts();
    assert_eq!(counts.bulk_move, 1);
    assert_eq!(counts.bulk_move_bytes, 16);
    assert_eq!(counts.zero_fill, 1);
    assert_eq!(counts.zero_fill_bytes, 48);

    let full = grown.reslice(&desc, 0, 8).unwrap();
    let bytes = full.to_bytes(&desc);
    assert!(!bytes.contains(&POISON));
    assert_eq!(&bytes[..8], &word_bytes(1));
    assert_eq!(&bytes[8..16], &word_bytes(2));
    assert!(bytes[16..].iter().all(|&b| b == 0));
}

#[test]
fn grow_capacity_follows_allocator_rounding() {
    let desc = word_desc();
    let mut engine =
        ArrayEngine::with_allocator(EngineConfig::default(), CountingAllocator::rounding_to(48))
            .unwrap();
    let old = engine.construct(&desc, 1, 1).unwrap();
    // Policy asks for 2 words (16 bytes); the allocator hands out 48.
    let grown = engine.grow(&desc, &old, 2, &mut NoCollector).unwrap();
    assert_eq!(grown.capacity(), 6);
}

#[test]
fn grow_failure_leaves_source_intact() {
    let desc = word_desc();
    let allocator = CountingAllocator::new().failing_after(1);
    let mut engine = ArrayEngine::with_allocator(EngineConfig::default(), allocator).unwrap();
    let old = engine.construct(&desc, 2, 2).unwrap();
    old.write_element(&desc, 1, &word_bytes(9)).unwrap();
    let err = engine.grow(&desc, &old, 3, &mut NoCollector).unwrap_err();
    assert!(matches!(err, ArrayError::AllocationFailure { .. }));
    assert_eq!(old.capacity(), 2);
    assert_eq!(old.read_element(&desc, 1).unwrap(), word_bytes(9));
}

#[test]
fn grow_by_zero_is_invalid_argument() {
    let desc = word_desc();
    let mut engine = counting_engine();
    let old = filled_words(&mut engine, 2, 2);
    let err = engine
        .grow_by_at_least(&desc, &old, 0, &mut NoCollector)
        .unwrap_err();
    assert!(matches!(
        err,
        ArrayError::InvalidArgument {
            operation: Operation::Grow,
            ..
        }
    ));
    assert_eq!(engine.allocator().counts().allocate, 1);
}

// ── grow: reference-containing ───────────────────────────────────────

#[test]
fn active_barrier_sees_every_reference() {
    let desc = pair_desc();
    let mut engine = counting_engine();
    let old = filled_pairs(&mut engine, &[0xA0, 0xB0, 0xC0]);
    let mut collector = RecordingCollector::new(true);

    let grown = engine.grow(&desc, &old, 4, &mut collector).unwrap();
    assert_eq!(collector.element_moves(), 3);
    assert_eq!(collector.shaded(), &[0xA0, 0xB0, 0xC0]);
    assert_eq!(grown.to_bytes(&desc), old.to_bytes(&desc));

    let counts = engine.allocator().counts();
    assert_eq!(counts.traced_allocations, 2);
    assert_eq!(counts.bulk_move, 0);
    assert_eq!(counts.zero_fill, 0);
}

#[test]
fn inactive_barrier_moves_in_bulk() {
    let desc = pair_desc();
    let mut engine = counting_engine();
    let old = filled_pairs(&mut engine, &[0xA0, 0xB0]);
    let mut collector = RecordingCollector::new(false);

    let grown = engine.grow(&desc, &old, 3, &mut collector).unwrap();
    assert_eq!(collector.element_moves(), 0);
    assert!(collector.shaded().is_empty());
    assert_eq!(engine.allocator().counts().bulk_move, 1);
    assert_eq!(grown.to_bytes(&desc), old.to_bytes(&desc));

    // Tail of a traced buffer comes from a zeroed allocation.
    let full = grown.reslice(&desc, 0, grown.capacity()).unwrap();
    for i in 2..grown.capacity() {
        assert_eq!(full.read_element(&desc, i).unwrap(), [0u8; 16]);
    }
}

#[test]
fn barrier_state_does_not_change_contents() {
    let desc = pair_desc();
    let mut engine = counting_engine();
    let old = filled_pairs(&mut engine, &[1, 2, 3, 4, 5]);
    let mut collector = RecordingCollector::new(true);
    let with_barrier = engine.grow(&desc, &old, 9, &mut collector).unwrap();
    collector.set_active(false);
    let without_barrier = engine.grow(&desc, &old, 9, &mut collector).unwrap();
    assert_eq!(with_barrier.capacity(), without_barrier.capacity());
    assert_eq!(
        with_barrier.reslice(&desc, 0, 9).unwrap().to_bytes(&desc),
        without_barrier.reslice(&desc, 0, 9).unwrap().to_bytes(&desc)
    );
}

// ── retire / reclaim ─────────────────────────────────────────────────

#[test]
fn grow_in_place_hands_dead_buffer_back() {
    let desc = word_desc();
    let mut engine = counting_engine();
    let mut slot = filled_words(&mut engine, 4, 4);
    let disposition = engine
        .grow_in_place(&desc, &mut slot, 5, &mut NoCollector)
        .unwrap();
    assert!(disposition.is_released());
    engine.reclaim(disposition);
    assert_eq!(engine.allocator().counts().release, 1);
    assert_eq!(slot.read_element(&desc, 3).unwrap(), word_bytes(4));
}

// ── copy ─────────────────────────────────────────────────────────────

#[test]
fn copy_moves_shorter_length() {
    let desc = elastic_core::ElementDescriptor::of::<u32>();
    let mut engine = counting_engine();
    let dst = engine.construct(&desc, 2, 2).unwrap();
    let src = engine.construct(&desc, 5, 5).unwrap();
    for i in 0..5 {
        src.write_element(&desc, i, &(i as u32 * 3).to_le_bytes())
            .unwrap();
    }
    assert_eq!(copy(&dst, &src, 4), 2);
    assert_eq!(dst.read_element(&desc, 1).unwrap(), 3u32.to_le_bytes());
}

#[test]
fn copy_string_into_byte_array() {
    let desc = elastic_core::ElementDescriptor::of::<u8>();
    let mut engine = counting_engine();
    let dst = engine.construct(&desc, 5, 5).unwrap();
    assert_eq!(copy_from_bytes(&dst, "hi"), 2);
    assert_eq!(dst.to_bytes(&desc), b"hi\0\0\0");
    assert_eq!(engine.allocator().counts().bulk_move, 0);
}

#[test]
fn constructed_storage_is_traced_for_references() {
    let mut engine = counting_engine();
    let h = engine.construct(&pair_desc(), 1, 1).unwrap();
    match h.buffer() {
        elastic_array::BufferRef::Heap(buf) => assert_eq!(buf.borrow().kind(), AllocKind::Traced),
        elastic_array::BufferRef::ZeroWidth => panic!("expected heap storage"),
    }
}

#[test]
fn copy_at_wider_width_moves_only_existing_bytes() {
    let desc = elastic_core::ElementDescriptor::of::<u8>();
    let mut engine = counting_engine();
    let dst = engine.construct(&desc, 8, 8).unwrap();
    let src = engine.construct(&desc, 8, 8).unwrap();
    assert_eq!(copy_from_bytes(&src, "elastics"), 8);
    assert_eq!(copy(&dst, &src, 4), 8);
    assert_eq!(dst.to_bytes(&desc), b"elastics");
}
