//! Reusable element descriptors and element encoders.
//!
//! - [`word_desc`]: a reference-free 8-byte word.
//! - [`pair_desc`]: a 16-byte `{ value: u64, reference: u64 }` pair whose
//!   second word is a reference.
//! - [`unit_desc`]: a zero-sized element.

use elastic_core::ElementDescriptor;

/// Reference-free 8-byte element.
pub fn word_desc() -> ElementDescriptor {
    ElementDescriptor::of::<u64>()
}

/// 16-byte element with a reference word at offset 8.
pub fn pair_desc() -> ElementDescriptor {
    ElementDescriptor::with_references(16, 8, &[8]).expect("valid pair descriptor")
}

/// Zero-sized element.
pub fn unit_desc() -> ElementDescriptor {
    ElementDescriptor::of::<()>()
}

/// Encode a [`word_desc`] element.
pub fn word_bytes(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

/// Encode a [`pair_desc`] element.
pub fn pair_bytes(value: u64, reference: u64) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&value.to_le_bytes());
    out[8..].copy_from_slice(&reference.to_le_bytes());
    out
}
