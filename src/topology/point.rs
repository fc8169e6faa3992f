//! `Point`: a bounds-checked 3-tuple of integers
//!
//! The same type serves as a coordinate and as a shape. Coordinates are
//! signed because the halo accessor addresses cells one step outside a
//! sub-domain (`-1` or `bound`). Shapes are always non-negative.
//!
//! The partial-order helpers [`Point::all_lt`] and [`Point::all_ge`] are
//! component-wise, so `ORIGIN.all_le(p) && p.all_lt(shape)` tests whether
//! `p` lies strictly inside `shape`. They are deliberately *not* exposed as
//! `PartialOrd`, whose `<`/`>=` would not agree with each other.

use std::fmt;

/// Largest coordinate magnitude accepted by [`Point::new`].
///
/// Implementation bound, not a domain limit: it keeps `volume() * steps`
/// comfortably inside `usize`.
pub const MAX_COORD: isize = 1 << 20;

/// Three integer components `(x, y, z)`.
#[derive(
    Copy, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct Point([isize; 3]);

impl Point {
    /// `(0, 0, 0)`.
    pub const ORIGIN: Point = Point([0, 0, 0]);

    /// Creates a point.
    ///
    /// # Panics
    ///
    /// With invariant checking enabled, panics if a component's magnitude
    /// exceeds [`MAX_COORD`].
    #[inline]
    pub fn new(x: isize, y: isize, z: isize) -> Self {
        let p = Point([x, y, z]);
        p.check_range();
        p
    }

    /// Creates a shape from unsigned extents.
    #[inline]
    pub fn from_extents(x: usize, y: usize, z: usize) -> Self {
        Self::new(x as isize, y as isize, z as isize)
    }

    #[inline]
    fn check_range(&self) {
        crate::check_access!(
            self.0.iter().all(|c| c.abs() <= MAX_COORD),
            "point {self} exceeds coordinate bound {MAX_COORD}"
        );
    }

    #[inline]
    pub const fn x(&self) -> isize {
        self.0[0]
    }

    #[inline]
    pub const fn y(&self) -> isize {
        self.0[1]
    }

    #[inline]
    pub const fn z(&self) -> isize {
        self.0[2]
    }

    /// Component along `axis` (0 = x, 1 = y, 2 = z).
    #[inline]
    pub fn get(&self, axis: usize) -> isize {
        crate::check_access!(axis < 3, "axis {axis} out of range");
        self.0[axis]
    }

    /// Component along `axis` as an unsigned extent.
    #[inline]
    pub fn extent(&self, axis: usize) -> usize {
        let v = self.get(axis);
        crate::check_access!(v >= 0, "negative extent {v} on axis {axis}");
        v as usize
    }

    /// Overwrites one component. Only used while building shapes.
    #[inline]
    pub fn set(&mut self, axis: usize, value: isize) {
        crate::check_access!(axis < 3, "axis {axis} out of range");
        self.0[axis] = value;
        self.check_range();
    }

    /// Copy of `self` moved by `delta` along `axis`.
    #[inline]
    pub fn shifted(&self, axis: usize, delta: isize) -> Point {
        let mut p = *self;
        p.set(axis, self.get(axis) + delta);
        p
    }

    /// Product of the three components, i.e. the cell count of a shape.
    #[inline]
    pub fn volume(&self) -> usize {
        self.0.iter().map(|&c| c.max(0) as usize).product()
    }

    /// Component-wise `self < other` on every axis.
    #[inline]
    pub fn all_lt(&self, other: &Point) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a < b)
    }

    /// Component-wise `self >= other` on every axis.
    #[inline]
    pub fn all_ge(&self, other: &Point) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a >= b)
    }

    /// Component-wise `self <= other` on every axis.
    #[inline]
    pub fn all_le(&self, other: &Point) -> bool {
        other.all_ge(self)
    }

    /// `true` if `p` lies in `[0, self)` on every axis.
    #[inline]
    pub fn contains(&self, p: &Point) -> bool {
        p.all_ge(&Point::ORIGIN) && p.all_lt(self)
    }

    /// Component-wise product.
    #[inline]
    pub fn mul(&self, other: &Point) -> Point {
        Point::new(self.0[0] * other.0[0], self.0[1] * other.0[1], self.0[2] * other.0[2])
    }

    /// Component-wise sum.
    #[inline]
    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.0[0] + other.0[0], self.0[1] + other.0[1], self.0[2] + other.0[2])
    }

    #[inline]
    pub const fn to_array(self) -> [isize; 3] {
        self.0
    }
}

impl From<[isize; 3]> for Point {
    fn from(v: [isize; 3]) -> Self {
        Point::new(v[0], v[1], v[2])
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Point")
            .field(&self.0[0])
            .field(&self.0[1])
            .field(&self.0[2])
            .finish()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0[0], self.0[1], self.0[2])
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(Point, [isize; 3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_product() {
        assert_eq!(Point::new(2, 3, 4).volume(), 24);
        assert_eq!(Point::new(5, 0, 4).volume(), 0);
    }

    #[test]
    fn partial_order_is_componentwise() {
        let a = Point::new(1, 1, 1);
        let b = Point::new(2, 2, 2);
        assert!(a.all_lt(&b));
        assert!(!b.all_lt(&a));
        assert!(b.all_ge(&a));
        // mixed: neither strictly below nor at-or-above
        let c = Point::new(0, 3, 1);
        assert!(!c.all_lt(&b));
        assert!(!c.all_ge(&a));
    }

    #[test]
    fn contains_excludes_upper_bound_and_negatives() {
        let shape = Point::new(2, 3, 4);
        assert!(shape.contains(&Point::new(0, 0, 0)));
        assert!(shape.contains(&Point::new(1, 2, 3)));
        assert!(!shape.contains(&Point::new(2, 0, 0)));
        assert!(!shape.contains(&Point::new(0, -1, 0)));
    }

    #[test]
    fn shifted_and_set() {
        let mut p = Point::new(1, 2, 3);
        assert_eq!(p.shifted(1, -1), Point::new(1, 1, 3));
        p.set(2, 7);
        assert_eq!(p.z(), 7);
    }

    #[test]
    fn debug_and_display() {
        let p = Point::new(7, -1, 3);
        assert_eq!(format!("{:?}", p), "Point(7, -1, 3)");
        assert_eq!(format!("{}", p), "(7, -1, 3)");
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic]
    fn out_of_range_panics_when_checked() {
        let _ = Point::new(MAX_COORD + 1, 0, 0);
    }
}

#[cfg(test)]
mod serde_tests {
    use super::*;

    #[test]
    fn json_roundtrip() {
        let p = Point::new(4, 5, 6);
        let s = serde_json::to_string(&p).unwrap();
        assert_eq!(s, "[4,5,6]");
        let q: Point = serde_json::from_str(&s).unwrap();
        assert_eq!(p, q);
    }
}
