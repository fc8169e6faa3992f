//! Process topology: maps a linear rank onto a 3-D process grid and the
//! global field onto equal-sized sub-domains.
//!
//! Ranks are enumerated with z outermost, then y, then x innermost:
//! `rank = x + px * (y + py * z)`. Every other component (input scatter,
//! neighbor lookup, gather) uses this same order.

use crate::debug_invariants::DebugInvariants;
use crate::extrema_error::ExtremaError;
use crate::topology::face::{Face, Neighbors};
use crate::topology::point::{MAX_COORD, Point};

/// Validate a process grid against a global field and return the
/// per-process sub-domain extent.
///
/// Checked once at startup; any failure is a fatal configuration error.
pub fn subdomain_extent(grid: Point, global: Point, nprocs: usize) -> Result<Point, ExtremaError> {
    for axis in 0..3 {
        if grid.get(axis) <= 0 || global.get(axis) <= 0 {
            return Err(ExtremaError::EmptyExtent { axis });
        }
    }
    if grid.volume() != nprocs {
        return Err(ExtremaError::ProcessCountMismatch {
            expected: grid.volume(),
            found: nprocs,
        });
    }
    let mut local = Point::ORIGIN;
    for axis in 0..3 {
        let (g, p) = (global.extent(axis), grid.extent(axis));
        if g % p != 0 {
            return Err(ExtremaError::NonDivisibleExtent {
                axis,
                global: g,
                procs: p,
            });
        }
        let extent = g / p;
        if extent as isize > MAX_COORD {
            return Err(ExtremaError::ExtentTooLarge { axis, extent });
        }
        local.set(axis, extent as isize);
    }
    Ok(local)
}

/// Linear rank of the process at grid coordinate `coord`, or `None` when
/// `coord` falls outside the grid.
#[inline]
pub fn rank_of(grid: Point, coord: Point) -> Option<usize> {
    if !grid.contains(&coord) {
        return None;
    }
    let (px, py) = (grid.x() as usize, grid.y() as usize);
    Some(coord.x() as usize + px * (coord.y() as usize + py * coord.z() as usize))
}

/// Grid coordinate of `rank`; inverse of [`rank_of`].
#[inline]
pub fn coord_of(grid: Point, rank: usize) -> Point {
    let (px, py) = (grid.x() as usize, grid.y() as usize);
    let x = rank % px;
    let y = (rank / px) % py;
    let z = rank / (px * py);
    Point::from_extents(x, y, z)
}

/// One process's view of the decomposition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topology {
    grid: Point,
    global: Point,
    local: Point,
    rank: usize,
    coord: Point,
    neighbors: Neighbors,
}

impl Topology {
    /// Build the topology for `rank` out of `nprocs` processes arranged
    /// as `grid` over a field of shape `global`.
    pub fn new(grid: Point, global: Point, nprocs: usize, rank: usize) -> Result<Self, ExtremaError> {
        let local = subdomain_extent(grid, global, nprocs)?;
        if rank >= nprocs {
            return Err(ExtremaError::RankOutOfRange { rank, size: nprocs });
        }
        let coord = coord_of(grid, rank);
        let mut neighbors = Neighbors::NONE;
        for face in Face::ALL {
            let n = coord.shifted(face.axis(), face.delta());
            neighbors.set(face, rank_of(grid, n));
        }
        let topo = Self {
            grid,
            global,
            local,
            rank,
            coord,
            neighbors,
        };
        crate::debug_invariants!(topo.validate_invariants(), "Topology::new");
        log::debug!(
            "rank {rank}: grid coord {coord}, sub-domain {local}, neighbors {:?}",
            topo.neighbors.as_array()
        );
        Ok(topo)
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of processes in the grid.
    #[inline]
    pub fn nprocs(&self) -> usize {
        self.grid.volume()
    }

    #[inline]
    pub fn grid(&self) -> Point {
        self.grid
    }

    #[inline]
    pub fn coord(&self) -> Point {
        self.coord
    }

    /// Shape of the whole field.
    #[inline]
    pub fn global_extent(&self) -> Point {
        self.global
    }

    /// Shape of every process's sub-domain.
    #[inline]
    pub fn local_extent(&self) -> Point {
        self.local
    }

    #[inline]
    pub fn neighbors(&self) -> &Neighbors {
        &self.neighbors
    }

    /// Global coordinate of the first cell owned by `rank`.
    pub fn origin_of(&self, rank: usize) -> Point {
        coord_of(self.grid, rank).mul(&self.local)
    }

    /// Global coordinate of this process's first cell.
    pub fn origin(&self) -> Point {
        self.origin_of(self.rank)
    }

    /// Owning rank and local coordinate of a global cell.
    #[inline]
    pub fn owner_of(&self, cell: Point) -> (usize, Point) {
        crate::check_access!(self.global.contains(&cell), "cell {cell} outside field {}", self.global);
        let b = self.local;
        let coord = Point::new(cell.x() / b.x(), cell.y() / b.y(), cell.z() / b.z());
        let local = Point::new(cell.x() % b.x(), cell.y() % b.y(), cell.z() % b.z());
        // `coord` is inside the grid because `cell` is inside the field.
        let owner = coord.x() as usize
            + self.grid.x() as usize * (coord.y() as usize + self.grid.y() as usize * coord.z() as usize);
        (owner, local)
    }
}

impl DebugInvariants for Topology {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Topology");
    }

    fn validate_invariants(&self) -> Result<(), ExtremaError> {
        if rank_of(self.grid, self.coord) != Some(self.rank) {
            return Err(ExtremaError::InvariantViolation(format!(
                "rank {} does not round-trip through coord {}",
                self.rank, self.coord
            )));
        }
        if self.local.mul(&self.grid) != self.global {
            return Err(ExtremaError::InvariantViolation(format!(
                "sub-domain {} x grid {} does not tile field {}",
                self.local, self.grid, self.global
            )));
        }
        for (face, n) in self.neighbors.present() {
            if n >= self.nprocs() || n == self.rank {
                return Err(ExtremaError::InvariantViolation(format!(
                    "neighbor {n} across {face} is not a valid peer of rank {}",
                    self.rank
                )));
            }
        }
        Ok(())
    }
}
