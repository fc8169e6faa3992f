//! Local-extremum classification and per-step global extrema.
//!
//! A value `v` is a local maximum when no participating axis-neighbor `w`
//! satisfies `w > v - EPS`, and a local minimum when none satisfies
//! `w < v + EPS`. Neighbors across a face with no neighboring process are
//! left out of the vote, so points on the domain edge compare against
//! fewer than six values. A point with no participating neighbor at all is
//! both a minimum and a maximum.
//!
//! The scan is split so it can overlap a halo exchange:
//! [`ExtremaScan::scan_interior`] needs only the local block,
//! [`ExtremaScan::scan_shell`] needs a completed [`Neighborhood`].

use bytemuck::Pod;
use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::algs::communicator::Communicator;
use crate::algs::halo::HaloExchange;
use crate::data::block::Block;
use crate::topology::face::Face;
use crate::topology::point::Point;

/// Comparison tolerance of the extremum vote.
pub const EPS: f64 = 1e-4;

/// Scalar type a field can hold.
pub trait Sample: Pod + Float + Into<f64> + Send + Sync + std::fmt::Debug {}

impl<T> Sample for T where T: Pod + Float + Into<f64> + Send + Sync + std::fmt::Debug {}

/// Wall-clock durations in seconds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimes {
    /// Reading and distributing the input.
    pub read: f64,
    /// Exchange plus scan.
    pub compute: f64,
    pub total: f64,
}

/// Per-step extremum counts and global extrema, plus phase timings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Answer<T> {
    pub cnt_min: Vec<u64>,
    pub cnt_max: Vec<u64>,
    pub gmin: Vec<T>,
    pub gmax: Vec<T>,
    pub times: PhaseTimes,
}

impl<T: Float> Answer<T> {
    /// Identity answer for `steps` samples: zero counts, `gmin` at the
    /// largest finite value and `gmax` at the lowest.
    pub fn new(steps: usize) -> Self {
        Self {
            cnt_min: vec![0; steps],
            cnt_max: vec![0; steps],
            gmin: vec![T::max_value(); steps],
            gmax: vec![T::min_value(); steps],
            times: PhaseTimes::default(),
        }
    }

    #[inline]
    pub fn steps(&self) -> usize {
        self.cnt_min.len()
    }
}

/// Outcome of one extremum vote.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Extremum {
    pub min: bool,
    pub max: bool,
}

/// Vote `v` against its participating neighbors with tolerance `eps`.
pub fn classify<T: Into<f64>>(v: T, neighbors: impl IntoIterator<Item = T>, eps: f64) -> Extremum {
    let v: f64 = v.into();
    let mut e = Extremum { min: true, max: true };
    for w in neighbors {
        let w: f64 = w.into();
        if w > v - eps {
            e.max = false;
        }
        if w < v + eps {
            e.min = false;
        }
        if !(e.min || e.max) {
            break;
        }
    }
    e
}

/// Read access to a block and whatever lies one cell beyond its faces.
pub trait Neighborhood<T> {
    fn block(&self) -> &Block<T>;
    /// `true` when values one step outside `face` may be read.
    fn has_neighbor(&self, face: Face) -> bool;
    fn at(&self, t: usize, x: isize, y: isize, z: isize) -> T;
}

impl<'a, T: Pod, C: Communicator> Neighborhood<T> for HaloExchange<'a, T, C> {
    fn block(&self) -> &Block<T> {
        HaloExchange::block(self)
    }

    fn has_neighbor(&self, face: Face) -> bool {
        self.neighbors().has(face)
    }

    #[inline]
    fn at(&self, t: usize, x: isize, y: isize, z: isize) -> T {
        HaloExchange::at(self, t, x, y, z)
    }
}

/// A block whose every face is a domain edge.
#[derive(Copy, Clone, Debug)]
pub struct Isolated<'a, T>(pub &'a Block<T>);

impl<'a, T: Copy> Neighborhood<T> for Isolated<'a, T> {
    fn block(&self) -> &Block<T> {
        self.0
    }

    fn has_neighbor(&self, _face: Face) -> bool {
        false
    }

    #[inline]
    fn at(&self, t: usize, x: isize, y: isize, z: isize) -> T {
        self.0.get(t, x as usize, y as usize, z as usize)
    }
}

/// `0` and `extent - 1`, once each.
fn ends(extent: usize) -> impl Iterator<Item = usize> {
    [0, extent.saturating_sub(1)]
        .into_iter()
        .take(if extent > 1 { 2 } else { 1 })
}

/// Call `f` once for every cell of the outermost one-cell shell of a
/// block of shape `bound`.
pub fn for_each_shell_point(bound: Point, mut f: impl FnMut(usize, usize, usize)) {
    let (bx, by, bz) = (bound.extent(0), bound.extent(1), bound.extent(2));
    if bx == 0 || by == 0 || bz == 0 {
        return;
    }
    let inner = |b: usize| 1..b.saturating_sub(1);
    for x in ends(bx) {
        for z in 0..bz {
            for y in 0..by {
                f(x, y, z);
            }
        }
    }
    for y in ends(by) {
        for z in 0..bz {
            for x in inner(bx) {
                f(x, y, z);
            }
        }
    }
    for z in ends(bz) {
        for y in inner(by) {
            for x in inner(bx) {
                f(x, y, z);
            }
        }
    }
}

/// Accumulates one process's answer.
#[derive(Clone, Debug)]
pub struct ExtremaScan<T> {
    acc: Answer<T>,
}

impl<T: Sample> ExtremaScan<T> {
    pub fn new(steps: usize) -> Self {
        Self {
            acc: Answer::new(steps),
        }
    }

    #[inline(always)]
    fn record(&mut self, t: usize, v: T, e: Extremum) {
        if v < self.acc.gmin[t] {
            self.acc.gmin[t] = v;
        }
        if v > self.acc.gmax[t] {
            self.acc.gmax[t] = v;
        }
        self.acc.cnt_min[t] += u64::from(e.min);
        self.acc.cnt_max[t] += u64::from(e.max);
    }

    /// Scan every cell at least one step away from each face; all six
    /// neighbors of such a cell are local.
    pub fn scan_interior(&mut self, block: &Block<T>) {
        let b = block.bound();
        let (bx, by, bz) = (b.extent(0), b.extent(1), b.extent(2));
        let steps = block.steps();
        debug_assert_eq!(steps, self.acc.steps());
        let data = block.as_slice();
        let dx = steps;
        let dy = bx * steps;
        let dz = bx * by * steps;
        for z in 1..bz.saturating_sub(1) {
            for y in 1..by.saturating_sub(1) {
                for x in 1..bx.saturating_sub(1) {
                    let base = block.index(0, x, y, z);
                    for t in 0..steps {
                        let i = base + t;
                        let e = classify(
                            data[i],
                            [
                                data[i - dx],
                                data[i + dx],
                                data[i - dy],
                                data[i + dy],
                                data[i - dz],
                                data[i + dz],
                            ],
                            EPS,
                        );
                        self.record(t, data[i], e);
                    }
                }
            }
        }
    }

    /// Scan the outermost shell. Faces without a neighbor drop out of the
    /// vote; every other neighbor is read through `view`.
    pub fn scan_shell<V: Neighborhood<T>>(&mut self, view: &V) {
        let b = view.block().bound();
        let steps = view.block().steps();
        debug_assert_eq!(steps, self.acc.steps());
        let present: [bool; 6] = std::array::from_fn(|i| view.has_neighbor(Face::from_index(i)));
        for_each_shell_point(b, |x, y, z| {
            let p = [x as isize, y as isize, z as isize];
            let mut nbrs = [[0isize; 3]; 6];
            let mut n = 0;
            for face in Face::ALL {
                let axis = face.axis();
                let mut c = p;
                c[axis] += face.delta();
                if (0..b.get(axis)).contains(&c[axis]) || present[face.index()] {
                    nbrs[n] = c;
                    n += 1;
                }
            }
            for t in 0..steps {
                let v = view.at(t, p[0], p[1], p[2]);
                let e = classify(v, nbrs[..n].iter().map(|c| view.at(t, c[0], c[1], c[2])), EPS);
                self.record(t, v, e);
            }
        });
    }

    /// Partial answer accumulated so far.
    pub fn answer(&self) -> &Answer<T> {
        &self.acc
    }

    pub fn finish(self, times: PhaseTimes) -> Answer<T> {
        Answer { times, ..self.acc }
    }
}

/// Serial scan of a whole block with every face treated as a domain edge.
pub fn scan_block<T: Sample>(block: &Block<T>) -> Answer<T> {
    let mut scan = ExtremaScan::new(block.steps());
    scan.scan_interior(block);
    scan.scan_shell(&Isolated(block));
    scan.finish(PhaseTimes::default())
}
