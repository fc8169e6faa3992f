#![cfg_attr(docsrs, feature(doc_cfg))]
//! # halo-extrema
//!
//! halo-extrema counts local minima and maxima of a dense, time-varying 3-D
//! scalar field that is split across a fixed grid of cooperating processes.
//! Each process owns one equal-sized sub-domain, trades one-cell boundary
//! planes with its six face neighbors, and scans its interior while those
//! planes are in flight. Per-step counts and global extrema are reduced to
//! the root; the whole field is never assembled on one process.
//!
//! ## Features
//! - [`Topology`](topology::Topology): rank ↔ process-grid mapping, sub-domain extents, neighbor table
//! - [`Block`](data::Block): bounds-checked 4-D storage, time samples adjacent
//! - [`HaloExchange`](algs::halo::HaloExchange): non-blocking plane exchange with strided plane descriptors
//! - [`ExtremaScan`](algs::extrema::ExtremaScan): interior/shell scan that overlaps communication
//! - Pluggable communication backends: in-process [`LocalComm`](algs::communicator::LocalComm)
//!   and, with the `mpi-support` feature, `MpiComm`
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! halo-extrema = "0.3"
//! # features = ["mpi-support"]
//! ```
//!
//! ## Determinism
//!
//! Reductions fold partial answers in rank order and synthetic fields are
//! drawn from an explicitly seeded `SmallRng`, so repeated runs agree bit for bit.

pub mod algs;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod extrema_error;
pub mod io;
pub mod synthetic;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use extrema_error::ExtremaError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CommTag, Communicator, ExchangeTags, LocalComm, NoComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::extrema::{Answer, ExtremaScan, PhaseTimes, scan_block};
    pub use crate::algs::halo::HaloExchange;
    pub use crate::algs::pipeline::{ROOT, compute_extrema, run_rank};
    pub use crate::config::Config;
    pub use crate::data::block::{Block, Block2D};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::extrema_error::ExtremaError;
    pub use crate::topology::{Face, Neighbors, Point, Topology};
}
