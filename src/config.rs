//! Run configuration, parsed from nine positional arguments:
//!
//! ```text
//! halo-extrema <input> <px> <py> <pz> <nx> <ny> <nz> <nstep> <output>
//! ```

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::extrema_error::ExtremaError;
use crate::topology::decomposition::subdomain_extent;
use crate::topology::point::{MAX_COORD, Point};

/// Distributed local-extremum counting over a time-varying 3-D field.
#[derive(Parser, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Field file: whitespace-separated values, z-major, time steps adjacent
    pub input_file: PathBuf,
    /// Processes along x
    pub px: usize,
    /// Processes along y
    pub py: usize,
    /// Processes along z
    pub pz: usize,
    /// Field extent along x
    pub nx: usize,
    /// Field extent along y
    pub ny: usize,
    /// Field extent along z
    pub nz: usize,
    /// Time steps per cell
    pub nstep: usize,
    /// Where the root writes the answer
    pub output_file: PathBuf,
}

fn extent(axis: usize, v: usize) -> Result<isize, ExtremaError> {
    if v > MAX_COORD as usize {
        return Err(ExtremaError::ExtentTooLarge { axis, extent: v });
    }
    Ok(v as isize)
}

impl Config {
    /// Parse an argument list whose first item is the program name.
    pub fn from_args<I, S>(args: I) -> Result<Self, ExtremaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString> + Clone,
    {
        Config::try_parse_from(args).map_err(|e| ExtremaError::Usage(e.to_string()))
    }

    /// Process grid `(px, py, pz)`.
    pub fn grid(&self) -> Result<Point, ExtremaError> {
        Ok(Point::new(extent(0, self.px)?, extent(1, self.py)?, extent(2, self.pz)?))
    }

    /// Field shape `(nx, ny, nz)`.
    pub fn global(&self) -> Result<Point, ExtremaError> {
        Ok(Point::new(extent(0, self.nx)?, extent(1, self.ny)?, extent(2, self.nz)?))
    }

    /// Check the configuration against `nprocs` running processes and return
    /// the sub-domain extent.
    pub fn validate(&self, nprocs: usize) -> Result<Point, ExtremaError> {
        let local = subdomain_extent(self.grid()?, self.global()?, nprocs)?;
        if self.nstep == 0 {
            return Err(ExtremaError::ZeroSteps);
        }
        Ok(local)
    }

    /// Number of processes the grid needs.
    pub fn nprocs(&self) -> usize {
        self.px.saturating_mul(self.py).saturating_mul(self.pz)
    }
}
