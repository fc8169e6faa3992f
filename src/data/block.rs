//! Dense per-process storage for a time-varying 3-D field.
//!
//! A [`Block`] owns `volume(bound) * steps` values laid out z-major, then y,
//! then x, with time fastest-varying: all samples of one `(x, y, z)` cell are
//! contiguous. A [`Block2D`] is the degenerate case `z = 1` used as the
//! receive buffer for one halo face.
//!
//! # Bounds checking
//! Accessors are checked with `assert!` when `debug_assertions` or the
//! `check-invariants` feature is on. Otherwise they index without a check;
//! callers must uphold `(t, x, y, z) < (steps, bound)`. Out-of-range access is
//! a bug in the caller, never bad input.

use bytemuck::Zeroable;

use crate::debug_invariants::DebugInvariants;
use crate::extrema_error::ExtremaError;
use crate::topology::point::Point;

#[cfg(any(debug_assertions, feature = "check-invariants"))]
#[inline(always)]
fn load<T: Copy>(data: &[T], i: usize) -> T {
    data[i]
}

#[cfg(not(any(debug_assertions, feature = "check-invariants")))]
#[inline(always)]
fn load<T: Copy>(data: &[T], i: usize) -> T {
    // SAFETY: callers pass an offset produced by `Block::index` for a
    // coordinate inside the block, which is their documented precondition.
    unsafe { *data.get_unchecked(i) }
}

#[cfg(any(debug_assertions, feature = "check-invariants"))]
#[inline(always)]
fn load_mut<T>(data: &mut [T], i: usize) -> &mut T {
    &mut data[i]
}

#[cfg(not(any(debug_assertions, feature = "check-invariants")))]
#[inline(always)]
fn load_mut<T>(data: &mut [T], i: usize) -> &mut T {
    // SAFETY: see `load`.
    unsafe { data.get_unchecked_mut(i) }
}

/// One process's sub-domain: `bound` cells × `steps` samples.
#[derive(Clone, PartialEq)]
pub struct Block<T> {
    bound: Point,
    steps: usize,
    data: Vec<T>,
}

impl<T> std::fmt::Debug for Block<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("bound", &self.bound)
            .field("steps", &self.steps)
            .field("len", &self.data.len())
            .finish()
    }
}

impl<T: Copy + Zeroable> Block<T> {
    /// Zero-initialised block of shape `bound` with `steps` samples per cell.
    ///
    /// # Panics
    /// Panics if a component of `bound` is negative or the element count
    /// overflows `usize`.
    pub fn new(bound: Point, steps: usize) -> Self {
        assert!(
            bound.all_ge(&Point::ORIGIN),
            "block bound {bound} has a negative extent"
        );
        let len = bound
            .volume()
            .checked_mul(steps)
            .unwrap_or_else(|| panic!("block {bound} x {steps} steps overflows usize"));
        Self {
            bound,
            steps,
            data: vec![T::zeroed(); len],
        }
    }

    /// Wrap an existing buffer laid out in block order.
    ///
    /// Returns `None` if `data.len() != volume(bound) * steps`.
    pub fn from_vec(bound: Point, steps: usize, data: Vec<T>) -> Option<Self> {
        let len = bound.volume().checked_mul(steps)?;
        (data.len() == len).then_some(Self { bound, steps, data })
    }
}

impl<T: Copy> Block<T> {
    /// Extent in x, y, z.
    #[inline]
    pub fn bound(&self) -> Point {
        self.bound
    }

    /// Number of time samples per cell.
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of cells, `volume(bound)`.
    #[inline]
    pub fn cells(&self) -> usize {
        self.bound.volume()
    }

    /// Total number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` if the block stores no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Linear offset of `(t, x, y, z)` in the buffer.
    #[inline(always)]
    pub fn index(&self, t: usize, x: usize, y: usize, z: usize) -> usize {
        let (bx, by) = (self.bound.x() as usize, self.bound.y() as usize);
        crate::check_access!(
            t < self.steps
                && x < bx
                && y < by
                && (z as isize) < self.bound.z(),
            "block access ({t}, {x}, {y}, {z}) outside {} x {} steps",
            self.bound,
            self.steps
        );
        ((z * by + y) * bx + x) * self.steps + t
    }

    /// Value at `(t, x, y, z)`.
    #[inline(always)]
    pub fn get(&self, t: usize, x: usize, y: usize, z: usize) -> T {
        let i = self.index(t, x, y, z);
        load(&self.data, i)
    }

    /// Mutable reference to the value at `(t, x, y, z)`.
    #[inline(always)]
    pub fn get_mut(&mut self, t: usize, x: usize, y: usize, z: usize) -> &mut T {
        let i = self.index(t, x, y, z);
        load_mut(&mut self.data, i)
    }

    /// Store `value` at `(t, x, y, z)`.
    #[inline]
    pub fn set(&mut self, t: usize, x: usize, y: usize, z: usize, value: T) {
        *self.get_mut(t, x, y, z) = value;
    }

    /// All time samples of one cell.
    #[inline]
    pub fn samples(&self, x: usize, y: usize, z: usize) -> &[T] {
        let start = self.index(0, x, y, z);
        &self.data[start..start + self.steps]
    }

    /// `true` if the signed coordinate lies inside `bound`.
    #[inline]
    pub fn contains(&self, x: isize, y: isize, z: isize) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && x < self.bound.x()
            && y < self.bound.y()
            && z < self.bound.z()
    }

    /// Entire buffer in block order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Entire mutable buffer in block order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Copy> DebugInvariants for Block<T> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Block");
    }

    fn validate_invariants(&self) -> Result<(), ExtremaError> {
        if !self.bound.all_ge(&Point::ORIGIN) {
            return Err(ExtremaError::InvariantViolation(format!(
                "block bound {} has a negative extent",
                self.bound
            )));
        }
        if self.data.len() != self.bound.volume() * self.steps {
            return Err(ExtremaError::InvariantViolation(format!(
                "block buffer holds {} values, bound {} x {} steps needs {}",
                self.data.len(),
                self.bound,
                self.steps,
                self.bound.volume() * self.steps
            )));
        }
        Ok(())
    }
}

/// A single received boundary plane: a [`Block`] with z-extent 1.
///
/// The two in-plane axes are the axes orthogonal to the face normal, in
/// ascending order (`(y, z)` for an x-face, `(x, z)` for a y-face,
/// `(x, y)` for a z-face).
#[derive(Clone, Debug, PartialEq)]
pub struct Block2D<T> {
    block: Block<T>,
}

impl<T: Copy + Zeroable> Block2D<T> {
    /// Zeroed `width × height` plane with `steps` samples per cell.
    pub fn new(width: usize, height: usize, steps: usize) -> Self {
        Self {
            block: Block::new(Point::from_extents(width, height, 1), steps),
        }
    }

    /// Plane with no cells; stands in for a face without a neighbor.
    pub fn empty(steps: usize) -> Self {
        Self::new(0, 0, steps)
    }
}

impl<T: Copy> Block2D<T> {
    /// In-plane extents `(width, height)`.
    #[inline]
    pub fn extent(&self) -> (usize, usize) {
        let b = self.block.bound();
        (b.x() as usize, b.y() as usize)
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.block.len()
    }

    /// `true` if the plane stores no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    /// Value at in-plane coordinate `(a, b)`, sample `t`.
    #[inline(always)]
    pub fn get(&self, t: usize, a: usize, b: usize) -> T {
        self.block.get(t, a, b, 0)
    }

    /// Underlying single-layer block.
    #[inline]
    pub fn block(&self) -> &Block<T> {
        &self.block
    }

    /// Entire buffer.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.block.as_slice()
    }

    /// Entire mutable buffer, the landing zone of a halo receive.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.block.as_mut_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_zeroed_and_sized() {
        let b = Block::<f32>::new(Point::new(2, 3, 4), 5);
        assert_eq!(b.len(), 2 * 3 * 4 * 5);
        assert_eq!(b.cells(), 24);
        assert!(b.as_slice().iter().all(|&v| v == 0.0));
        b.validate_invariants().unwrap();
    }

    #[test]
    fn time_is_fastest_then_x_y_z() {
        let b = Block::<f32>::new(Point::new(2, 3, 4), 5);
        assert_eq!(b.index(0, 0, 0, 0), 0);
        assert_eq!(b.index(1, 0, 0, 0), 1);
        assert_eq!(b.index(0, 1, 0, 0), 5);
        assert_eq!(b.index(0, 0, 1, 0), 10);
        assert_eq!(b.index(0, 0, 0, 1), 30);
        assert_eq!(b.index(4, 1, 2, 3), b.len() - 1);
    }

    #[test]
    fn set_get_and_samples() {
        let mut b = Block::<f32>::new(Point::new(2, 2, 2), 3);
        for t in 0..3 {
            b.set(t, 1, 0, 1, t as f32 + 0.5);
        }
        assert_eq!(b.get(2, 1, 0, 1), 2.5);
        assert_eq!(b.samples(1, 0, 1), &[0.5, 1.5, 2.5]);
        assert_eq!(b.get(0, 0, 1, 1), 0.0);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Block::from_vec(Point::new(2, 1, 1), 2, vec![0.0f32; 4]).is_some());
        assert!(Block::from_vec(Point::new(2, 1, 1), 2, vec![0.0f32; 3]).is_none());
    }

    #[test]
    fn contains_signed() {
        let b = Block::<f32>::new(Point::new(2, 2, 2), 1);
        assert!(b.contains(1, 1, 1));
        assert!(!b.contains(-1, 0, 0));
        assert!(!b.contains(0, 2, 0));
    }

    #[test]
    fn block2d_layout() {
        let mut p = Block2D::<f32>::new(3, 2, 2);
        assert_eq!(p.extent(), (3, 2));
        assert_eq!(p.len(), 12);
        // (t, a, b) -> (b * width + a) * steps + t
        p.as_mut_slice()[(1 * 3 + 2) * 2 + 1] = 9.0;
        assert_eq!(p.get(1, 2, 1), 9.0);
        assert!(Block2D::<f32>::empty(4).is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "block access")]
    fn out_of_bounds_aborts_in_checked_builds() {
        let b = Block::<f32>::new(Point::new(2, 2, 2), 1);
        let _ = b.get(0, 2, 0, 0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "block access")]
    fn time_out_of_bounds_aborts_in_checked_builds() {
        let b = Block::<f32>::new(Point::new(2, 2, 2), 1);
        let _ = b.get(1, 0, 0, 0);
    }
}
