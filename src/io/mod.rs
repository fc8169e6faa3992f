//! Field input and answer output.
//!
//! The input file is plain text: whitespace-separated values in the order
//! `z`, `y`, `x`, with the time steps of one cell adjacent (conventionally
//! one line per cell). The output file holds the reduced [`Answer`](crate::algs::extrema::Answer)
//! in three lines, see [`output`].

pub mod input;
pub mod output;

pub use input::{FieldReader, read_field_values};
pub use output::{format_answer, write_answer};
