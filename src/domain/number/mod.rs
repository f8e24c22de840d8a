//! Keyed sequence counters stored as ordinary business objects.

pub mod sequence_number;

pub use sequence_number::BOSequenceNumber;
