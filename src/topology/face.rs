//! The six faces of a sub-domain and the neighbor table indexed by them.
//!
//! Index convention, used on the wire and in every per-face array:
//! `-x, -y, -z, +x, +y, +z`.

use std::fmt;

/// One of the six axis-aligned faces of a box.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    NegX = 0,
    NegY = 1,
    NegZ = 2,
    PosX = 3,
    PosY = 4,
    PosZ = 5,
}

impl Face {
    /// All faces in index order.
    pub const ALL: [Face; 6] = [
        Face::NegX,
        Face::NegY,
        Face::NegZ,
        Face::PosX,
        Face::PosY,
        Face::PosZ,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Face with the given index.
    ///
    /// # Panics
    /// Panics if `i >= 6`.
    #[inline]
    pub const fn from_index(i: usize) -> Face {
        Face::ALL[i]
    }

    /// Axis of the face normal (0 = x, 1 = y, 2 = z).
    #[inline]
    pub const fn axis(self) -> usize {
        self.index() % 3
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.index() >= 3
    }

    /// Unit step along the face normal: `-1` or `+1`.
    #[inline]
    pub const fn delta(self) -> isize {
        if self.is_positive() { 1 } else { -1 }
    }

    /// The face on the other side of the same axis.
    #[inline]
    pub const fn opposite(self) -> Face {
        Face::from_index((self.index() + 3) % 6)
    }

    /// Face pointing along `axis` in direction `delta` (`-1` or `+1`).
    #[inline]
    pub const fn along(axis: usize, delta: isize) -> Face {
        if delta > 0 {
            Face::from_index(axis + 3)
        } else {
            Face::from_index(axis)
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Face::NegX => "-x",
            Face::NegY => "-y",
            Face::NegZ => "-z",
            Face::PosX => "+x",
            Face::PosY => "+y",
            Face::PosZ => "+z",
        };
        f.write_str(s)
    }
}

/// Face-neighbor ranks of one process; `None` marks a true domain edge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Neighbors([Option<usize>; 6]);

impl Neighbors {
    /// A process with no neighbors at all (a single-rank run).
    pub const NONE: Neighbors = Neighbors([None; 6]);

    #[inline]
    pub fn get(&self, face: Face) -> Option<usize> {
        self.0[face.index()]
    }

    #[inline]
    pub fn set(&mut self, face: Face, rank: Option<usize>) {
        self.0[face.index()] = rank;
    }

    #[inline]
    pub fn has(&self, face: Face) -> bool {
        self.0[face.index()].is_some()
    }

    /// `(face, rank)` for every face that has a neighbor, in index order.
    pub fn present(&self) -> impl Iterator<Item = (Face, usize)> + '_ {
        Face::ALL
            .into_iter()
            .filter_map(|f| self.get(f).map(|r| (f, r)))
    }

    /// Number of faces with a neighbor.
    pub fn count(&self) -> usize {
        self.0.iter().flatten().count()
    }

    pub const fn as_array(&self) -> &[Option<usize>; 6] {
        &self.0
    }
}
