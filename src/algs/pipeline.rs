//! Per-rank driver: distribute, exchange, scan, reduce.

use std::time::Instant;

use crate::algs::communicator::{Communicator, ExchangeTags};
use crate::algs::distribute::{abort_distribution, scatter_from_root};
use crate::algs::extrema::{Answer, ExtremaScan, PhaseTimes, Sample};
use crate::algs::halo::HaloExchange;
use crate::algs::reduction::{Reducible, reduce_answer};
use crate::config::Config;
use crate::data::block::Block;
use crate::extrema_error::ExtremaError;
use crate::io::input::read_field_values;
use crate::topology::decomposition::Topology;

/// Rank that reads the input and receives the reduced answer.
pub const ROOT: usize = 0;

/// Scan `block` while its halo is in flight.
///
/// Sends the boundary planes, posts the receives, scans the interior, then
/// waits for the halo and scans the outer shell. Returns this rank's
/// partial answer with zeroed timings.
pub fn compute_extrema<T, C>(
    block: &Block<T>,
    topo: &Topology,
    comm: &C,
    tags: &ExchangeTags,
) -> Result<Answer<T>, ExtremaError>
where
    T: Sample,
    C: Communicator,
{
    let mut halo = HaloExchange::start(block, *topo.neighbors(), comm, tags.halo);
    halo.recv();

    let mut scan = ExtremaScan::new(block.steps());
    scan.scan_interior(block);

    halo.wait()?;
    scan.scan_shell(&halo);
    halo.free()?;
    Ok(scan.finish(PhaseTimes::default()))
}

/// Run the whole pipeline on one rank; `Some(answer)` on [`ROOT`].
pub fn run_rank<C: Communicator>(comm: &C, config: &Config) -> Result<Option<Answer<f32>>, ExtremaError> {
    run_rank_with_tags(comm, config, &ExchangeTags::default())
}

/// [`run_rank`] over any sample type, with explicit message tags.
pub fn run_rank_with_tags<C, T>(
    comm: &C,
    config: &Config,
    tags: &ExchangeTags,
) -> Result<Option<Answer<T>>, ExtremaError>
where
    C: Communicator,
    T: Sample + Reducible + std::str::FromStr,
{
    let start = Instant::now();
    config.validate(comm.size())?;
    let topo = Topology::new(config.grid()?, config.global()?, comm.size(), comm.rank())?;

    let values = if comm.rank() == ROOT {
        match read_field_values::<T>(&config.input_file) {
            Ok(reader) => Some(reader),
            Err(e) => {
                abort_distribution(comm, &topo, ROOT, tags.scatter);
                return Err(e);
            }
        }
    } else {
        None
    };
    let block = scatter_from_root(comm, &topo, config.nstep, ROOT, tags.scatter, values)?;
    let read = start.elapsed().as_secs_f64();
    log::debug!("rank {}: block {} received", comm.rank(), block.bound());

    let compute_start = Instant::now();
    let partial = compute_extrema(&block, &topo, comm, tags)?;
    let compute = compute_start.elapsed().as_secs_f64();

    let times = PhaseTimes {
        read,
        compute,
        total: start.elapsed().as_secs_f64(),
    };
    let answer = reduce_answer(comm, ROOT, tags.reduce, &Answer { times, ..partial })?;
    if let Some(a) = &answer {
        log::info!(
            "read {:.6}s, compute {:.6}s, total {:.6}s over {} rank(s)",
            a.times.read,
            a.times.compute,
            a.times.total,
            comm.size()
        );
    }
    Ok(answer)
}
