//! `halo-extrema <input> <px> <py> <pz> <nx> <ny> <nz> <nstep> <output>`
//!
//! With the `mpi-support` feature every MPI process is one rank. Without
//! it, the binary runs all `px * py * pz` ranks as threads of one process
//! over an in-memory communicator.

use std::process::ExitCode;

use clap::Parser;
use halo_extrema::algs::pipeline::run_rank;
use halo_extrema::config::Config;
use halo_extrema::extrema_error::ExtremaError;
use halo_extrema::io::output::write_answer;

#[cfg(feature = "mpi-support")]
fn run(config: &Config) -> Result<(), ExtremaError> {
    use halo_extrema::algs::communicator::{Communicator, MpiComm};

    let comm = MpiComm::new().ok_or_else(|| ExtremaError::comm(0, "MPI is already initialised"))?;
    log::debug!("rank {} of {}: {:?}", comm.rank(), comm.size(), config);
    match run_rank(&comm, config) {
        Ok(Some(answer)) => write_answer(&config.output_file, &answer),
        Ok(None) => Ok(()),
        Err(e) => {
            log::error!("rank {}: {e}", comm.rank());
            // peers may be blocked on this rank
            comm.abort(1)
        }
    }
}

#[cfg(not(feature = "mpi-support"))]
fn run(config: &Config) -> Result<(), ExtremaError> {
    use halo_extrema::algs::communicator::LocalComm;
    use halo_extrema::algs::pipeline::ROOT;

    let nprocs = config.nprocs();
    // configuration errors surface before any rank thread starts
    config.validate(nprocs)?;
    let comms = LocalComm::universe(nprocs);
    log::debug!("running {nprocs} rank(s) in-process: {config:?}");
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .iter()
            .map(|comm| s.spawn(move || run_rank(comm, config)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|p| std::panic::resume_unwind(p)))
            .collect()
    });
    let mut answer = None;
    for (rank, result) in results.into_iter().enumerate() {
        match result? {
            Some(a) if rank == ROOT => answer = Some(a),
            _ => {}
        }
    }
    match answer {
        Some(a) => write_answer(&config.output_file, &a),
        None => Err(ExtremaError::InvariantViolation("root produced no answer".into())),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let config = Config::parse();
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("halo-extrema: {e}");
            ExitCode::FAILURE
        }
    }
}
