//! # Identity
//!
//! Every pooled object and every module is stamped with a 64-bit [`Id`].
//! The same value is both a stable key and a staleness stamp: when a pooled
//! object is recycled it receives a fresh id, which is how
//! [`Handle`](crate::memory::Handle) notices the swap.

mod clock;
mod generator;

pub use clock::FrameClock;
pub use generator::{
    IdGenerator, IdStruct, InstanceIdStruct, DEFAULT_PROCESS, EPOCH_2022_MILLIS, MASK_14BIT,
    MASK_20BIT, MASK_30BIT,
};

/// Identifier of a pooled object, module or record set. `0` means unassigned.
pub type Id = i64;

/// Objects that carry an identifier.
pub trait Identified {
    /// The current identifier. Changes when the object is recycled.
    fn id(&self) -> Id;
}
