//! Data module: per-process field storage
#![warn(missing_docs)]

pub mod block;

pub use block::{Block, Block2D};
