//! Top-level module for process and grid topology.
//!
//! This module provides:
//! - [`Point`], the bounds-checked coordinate/shape type
//! - [`Face`] and [`Neighbors`], the six-face neighbor table
//! - [`Topology`], the rank ↔ grid-coordinate mapping and sub-domain decomposition

pub mod decomposition;
pub mod face;
pub mod point;

pub use decomposition::{Topology, coord_of, rank_of, subdomain_extent};
pub use face::{Face, Neighbors};
pub use point::Point;
