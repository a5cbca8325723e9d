//! Error types for the elastic buffer engine.
//!
//! Every failure is terminal for the calling operation: nothing is retried
//! and a failed construction or growth leaves no observable allocation.

use std::error::Error;
use std::fmt;

/// The engine operation that reported an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Fresh construction of an array.
    Construct,
    /// Growth of an existing array (including growth by increment).
    Grow,
    /// Taking a sub-view of an array.
    Reslice,
    /// Element-level read or write.
    Access,
    /// Building an element descriptor.
    Describe,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construct => write!(f, "construct"),
            Self::Grow => write!(f, "grow"),
            Self::Reslice => write!(f, "reslice"),
            Self::Access => write!(f, "access"),
            Self::Describe => write!(f, "describe"),
        }
    }
}

/// Which quantity was outside its representable or permitted range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantity {
    /// An element count used as a length.
    Length,
    /// An element count used as a capacity.
    Capacity,
    /// An element index or slice bound.
    Index,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length => write!(f, "len"),
            Self::Capacity => write!(f, "cap"),
            Self::Index => write!(f, "index"),
        }
    }
}

/// Errors that can occur during buffer engine operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// A length, capacity, or index is negative, not representable,
    /// violates `capacity >= length`, or implies a byte size beyond the
    /// addressable bound.
    OutOfRange {
        /// The operation that rejected the value.
        operation: Operation,
        /// What the value was used as.
        quantity: Quantity,
        /// The offending value. Wide enough to hold any `i64` or `usize`.
        value: i128,
    },
    /// An argument is malformed in a way unrelated to range, e.g. a growth
    /// increment below one or a misaligned reference slot.
    InvalidArgument {
        /// The operation that rejected the argument.
        operation: Operation,
        /// Human-readable description.
        reason: String,
    },
    /// The allocator could not provide the requested memory.
    AllocationFailure {
        /// Number of bytes requested.
        requested: usize,
        /// Requested alignment in bytes.
        align: usize,
    },
    /// Engine or allocator configuration failed validation.
    InvalidConfig {
        /// Human-readable description.
        reason: String,
    },
}

impl ArrayError {
    /// Shorthand for an [`ArrayError::OutOfRange`] with an unsigned value.
    pub fn out_of_range(operation: Operation, quantity: Quantity, value: usize) -> Self {
        Self::OutOfRange {
            operation,
            quantity,
            value: value as i128,
        }
    }

    /// Shorthand for an [`ArrayError::InvalidArgument`].
    pub fn invalid_argument(operation: Operation, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                operation,
                quantity,
                value,
            } => {
                write!(f, "{operation}: {quantity} out of range ({value})")
            }
            Self::InvalidArgument { operation, reason } => {
                write!(f, "{operation}: invalid argument: {reason}")
            }
            Self::AllocationFailure { requested, align } => {
                write!(
                    f,
                    "allocation failed: {requested} bytes at alignment {align}"
                )
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
        }
    }
}

impl Error for ArrayError {}
