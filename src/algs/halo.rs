//! Non-blocking exchange of one-cell boundary planes between neighboring
//! sub-domains.
//!
//! A [`HaloExchange`] borrows its process's [`Block`] and owns six
//! [`Block2D`] receive buffers, one per face. Its lifecycle is
//!
//! ```text
//! start() ──► Sent ──recv()──► Receiving ──wait()──► Complete ──free()──► Freed
//! ```
//!
//! Each boundary plane is a strided slice of the block buffer covering
//! every time sample, described once per orientation by a
//! [`PlaneDescriptor`]: `count` contiguous runs of `block_len` values,
//! `stride` values apart. Planes are received densely packed in the
//! [`Block2D`] layout of that face.

use bytemuck::Pod;

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{cast_slice, cast_slice_mut, copy_into};
use crate::data::block::{Block, Block2D};
use crate::debug_invariants::DebugInvariants;
use crate::extrema_error::ExtremaError;
use crate::topology::face::{Face, Neighbors};
use crate::topology::point::Point;

/// Orientation of a boundary plane, named by the two axes it spans.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Plane of constant x.
    Yz,
    /// Plane of constant y.
    Zx,
    /// Plane of constant z.
    Xy,
}

impl Orientation {
    pub const fn of(face: Face) -> Orientation {
        match face.axis() {
            0 => Orientation::Yz,
            1 => Orientation::Zx,
            _ => Orientation::Xy,
        }
    }
}

/// Strided view of one boundary plane across all time samples:
/// `count` runs of `block_len` contiguous values, run `i` starting at
/// `offset + i * stride`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlaneDescriptor {
    pub count: usize,
    pub block_len: usize,
    pub stride: usize,
}

impl PlaneDescriptor {
    /// Number of values the plane carries.
    #[inline]
    pub fn len(&self) -> usize {
        self.count * self.block_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the plane starting at `offset` in `src` to `out`, densely packed.
    pub fn pack<T: Copy>(&self, src: &[T], offset: usize, out: &mut Vec<T>) {
        out.reserve(self.len());
        for i in 0..self.count {
            let start = offset + i * self.stride;
            out.extend_from_slice(&src[start..start + self.block_len]);
        }
    }
}

/// The three per-orientation descriptors of a block shape.
///
/// Shape-derived only, so one set serves every time step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlaneDescriptors {
    pub yz: PlaneDescriptor,
    pub zx: PlaneDescriptor,
    pub xy: PlaneDescriptor,
}

impl PlaneDescriptors {
    pub fn new(bound: Point, steps: usize) -> Self {
        let (bx, by, bz) = (bound.extent(0), bound.extent(1), bound.extent(2));
        Self {
            yz: PlaneDescriptor {
                count: by * bz,
                block_len: steps,
                stride: bx * steps,
            },
            zx: PlaneDescriptor {
                count: bz,
                block_len: bx * steps,
                stride: bx * by * steps,
            },
            xy: PlaneDescriptor {
                count: bx * by,
                block_len: steps,
                stride: steps,
            },
        }
    }

    pub fn get(&self, orientation: Orientation) -> &PlaneDescriptor {
        match orientation {
            Orientation::Yz => &self.yz,
            Orientation::Zx => &self.zx,
            Orientation::Xy => &self.xy,
        }
    }

    #[inline]
    pub fn for_face(&self, face: Face) -> &PlaneDescriptor {
        self.get(Orientation::of(face))
    }
}

/// In-plane extents `(width, height)` of the halo plane across `face`.
pub fn face_extent(face: Face, bound: Point) -> (usize, usize) {
    let (bx, by, bz) = (bound.extent(0), bound.extent(1), bound.extent(2));
    match face.axis() {
        0 => (by, bz),
        1 => (bx, bz),
        _ => (bx, by),
    }
}

/// Block-local cell where the plane sent across `face` begins.
fn send_origin(face: Face, bound: Point) -> Point {
    let mut origin = Point::ORIGIN;
    if face.is_positive() {
        origin.set(face.axis(), bound.get(face.axis()) - 1);
    }
    origin
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HaloState {
    /// Boundary planes sent, receives not yet posted.
    Sent,
    Receiving,
    /// Every posted receive has landed.
    Complete,
    Freed,
}

/// One halo exchange over a borrowed block.
pub struct HaloExchange<'a, T, C: Communicator> {
    block: &'a Block<T>,
    comm: &'a C,
    neighbors: Neighbors,
    tag: CommTag,
    planes: Option<PlaneDescriptors>,
    sends: Vec<C::SendHandle>,
    recvs: [Option<(usize, C::RecvHandle)>; 6],
    halo: [Block2D<T>; 6],
    state: HaloState,
}

impl<'a, T: Pod, C: Communicator> HaloExchange<'a, T, C> {
    /// Build the plane descriptors and send one boundary plane to every
    /// present neighbor.
    ///
    /// Uses tags `tag ..= tag + 5`, one per receiving face.
    pub fn start(block: &'a Block<T>, neighbors: Neighbors, comm: &'a C, tag: CommTag) -> Self {
        let bound = block.bound();
        let steps = block.steps();
        let planes = PlaneDescriptors::new(bound, steps);
        let halo = std::array::from_fn(|i| {
            let face = Face::from_index(i);
            if neighbors.has(face) {
                let (w, h) = face_extent(face, bound);
                Block2D::new(w, h, steps)
            } else {
                Block2D::empty(steps)
            }
        });

        let mut sends = Vec::with_capacity(neighbors.count());
        let mut packed = Vec::new();
        for (face, peer) in neighbors.present() {
            let o = send_origin(face, bound);
            let offset = block.index(0, o.x() as usize, o.y() as usize, o.z() as usize);
            packed.clear();
            planes.for_face(face).pack(block.as_slice(), offset, &mut packed);
            // the peer files this plane under its opposite face
            let t = tag.offset(face.opposite().index() as u16);
            sends.push(comm.isend(peer, t.as_u16(), cast_slice(&packed)));
        }
        log::debug!(
            "rank {}: halo planes sent to {} neighbor(s)",
            comm.rank(),
            sends.len()
        );

        Self {
            block,
            comm,
            neighbors,
            tag,
            planes: Some(planes),
            sends,
            recvs: std::array::from_fn(|_| None),
            halo,
            state: HaloState::Sent,
        }
    }

    /// Post one receive per present neighbor.
    pub fn recv(&mut self) {
        assert_eq!(self.state, HaloState::Sent, "halo recv() called in state {:?}", self.state);
        let comm = self.comm;
        for (face, peer) in self.neighbors.present() {
            let i = face.index();
            let t = self.tag.offset(i as u16);
            let h = comm.irecv(peer, t.as_u16(), cast_slice_mut(self.halo[i].as_mut_slice()));
            self.recvs[i] = Some((peer, h));
        }
        self.state = HaloState::Receiving;
    }

    /// Block until every posted receive has completed and copy the planes
    /// into the halo buffers.
    ///
    /// All receives are drained even when one fails; the first failure is
    /// returned.
    pub fn wait(&mut self) -> Result<(), ExtremaError> {
        assert_eq!(
            self.state,
            HaloState::Receiving,
            "halo wait() called in state {:?}",
            self.state
        );
        let mut maybe_err = None;
        for i in 0..6 {
            let Some((peer, h)) = self.recvs[i].take() else {
                continue;
            };
            match h.wait() {
                Some(data) => {
                    if let Err(e) = copy_into(peer, &data, self.halo[i].as_mut_slice()) {
                        maybe_err.get_or_insert(e);
                    }
                }
                None => {
                    maybe_err.get_or_insert_with(|| ExtremaError::comm(peer, "halo receive returned no data"));
                }
            }
        }
        self.state = HaloState::Complete;
        match maybe_err {
            Some(e) => Err(e),
            None => {
                crate::debug_invariants!(self.validate_invariants(), "HaloExchange::wait");
                Ok(())
            }
        }
    }

    /// Value at `(t, x, y, z)` where the coordinate is either inside the
    /// block or exactly one cell outside it along exactly one axis.
    ///
    /// Halo coordinates are only meaningful after [`wait`](Self::wait) and
    /// only across faces with a neighbor.
    #[inline]
    pub fn at(&self, t: usize, x: isize, y: isize, z: isize) -> T {
        if self.block.contains(x, y, z) {
            return self.block.get(t, x as usize, y as usize, z as usize);
        }
        let b = self.block.bound();
        let c = [x, y, z];
        let axis = match c.iter().zip(b.to_array()).position(|(&v, e)| v < 0 || v >= e) {
            Some(axis) => axis,
            None => unreachable!("coordinate inside the block was routed to the halo"),
        };
        crate::check_access!(
            (c[axis] == -1 || c[axis] == b.get(axis))
                && (0..3).all(|k| k == axis || (0..b.get(k)).contains(&c[k])),
            "halo access ({x}, {y}, {z}) is not one step outside {}",
            b
        );
        let face = Face::along(axis, if c[axis] < 0 { -1 } else { 1 });
        crate::check_access!(
            self.state == HaloState::Complete && self.neighbors.has(face),
            "halo access across {face} with neighbor {:?} in state {:?}",
            self.neighbors.get(face),
            self.state
        );
        let (a, bb) = match axis {
            0 => (y, z),
            1 => (x, z),
            _ => (x, y),
        };
        self.halo[face.index()].get(t, a as usize, bb as usize)
    }

    /// Wait for every outstanding send and release the plane descriptors.
    pub fn free(mut self) -> Result<(), ExtremaError> {
        for h in self.sends.drain(..) {
            let _ = h.wait();
        }
        self.planes = None;
        self.state = HaloState::Freed;
        Ok(())
    }
}

impl<'a, T, C: Communicator> HaloExchange<'a, T, C> {
    #[inline]
    pub fn block(&self) -> &'a Block<T> {
        self.block
    }

    #[inline]
    pub fn neighbors(&self) -> &Neighbors {
        &self.neighbors
    }

    #[inline]
    pub fn state(&self) -> HaloState {
        self.state
    }

    /// Received plane across `face`; empty for faces without a neighbor.
    pub fn plane(&self, face: Face) -> &Block2D<T> {
        &self.halo[face.index()]
    }
}

impl<'a, T: Pod, C: Communicator> DebugInvariants for HaloExchange<'a, T, C> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "HaloExchange");
    }

    fn validate_invariants(&self) -> Result<(), ExtremaError> {
        let bound = self.block.bound();
        let steps = self.block.steps();
        for face in Face::ALL {
            let plane = &self.halo[face.index()];
            let expected = if self.neighbors.has(face) {
                let (w, h) = face_extent(face, bound);
                w * h * steps
            } else {
                0
            };
            if plane.len() != expected {
                return Err(ExtremaError::InvariantViolation(format!(
                    "halo plane {face} holds {} values, expected {expected}",
                    plane.len()
                )));
            }
            if let Some(p) = &self.planes
                && self.neighbors.has(face)
                && p.for_face(face).len() != expected
            {
                return Err(ExtremaError::InvariantViolation(format!(
                    "plane descriptor for {face} covers {} values, expected {expected}",
                    p.for_face(face).len()
                )));
            }
        }
        Ok(())
    }
}

impl<'a, T, C: Communicator> Drop for HaloExchange<'a, T, C> {
    fn drop(&mut self) {
        // requests own their buffers until completed
        for h in self.sends.drain(..) {
            let _ = h.wait();
        }
        for slot in self.recvs.iter_mut() {
            if let Some((_, h)) = slot.take() {
                let _ = h.wait();
            }
        }
    }
}
