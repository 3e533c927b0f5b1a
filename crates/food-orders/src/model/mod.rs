//! Pure data structures for the order pipeline.

pub mod order;

pub use order::*;
