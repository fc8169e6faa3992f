//! Re-export public algorithms.

pub mod communicator;
pub mod distribute;
pub mod extrema;
pub mod halo;
pub mod pipeline;
pub mod reduction;
pub mod wire;

pub use communicator::{CommTag, Communicator, ExchangeTags, LocalComm, NoComm, Wait};
pub use distribute::{gather_to_root, scatter_field, scatter_from_root};
pub use extrema::{Answer, EPS, ExtremaScan, PhaseTimes, scan_block};
pub use halo::{HaloExchange, PlaneDescriptor, PlaneDescriptors};
pub use pipeline::{ROOT, compute_extrema, run_rank};
pub use reduction::{ReduceOp, reduce_answer, reduce_to_root};
