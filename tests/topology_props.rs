use halo_extrema::topology::{Face, Point, Topology, coord_of, rank_of};
use proptest::prelude::*;

mod util;
use util::p;

fn grid_and_field() -> impl Strategy<Value = (Point, Point)> {
    (1isize..4, 1isize..4, 1isize..4, 1isize..4, 1isize..4, 1isize..4)
        .prop_map(|(px, py, pz, bx, by, bz)| (p(px, py, pz), p(px * bx, py * by, pz * bz)))
}

proptest! {
    #[test]
    fn rank_coord_roundtrip((grid, _field) in grid_and_field()) {
        for r in 0..grid.volume() {
            prop_assert_eq!(rank_of(grid, coord_of(grid, r)), Some(r));
        }
    }

    #[test]
    fn neighbors_are_symmetric((grid, field) in grid_and_field()) {
        let n = grid.volume();
        let topos: Vec<_> = (0..n).map(|r| Topology::new(grid, field, n, r).unwrap()).collect();
        for t in &topos {
            for face in Face::ALL {
                match t.neighbors().get(face) {
                    Some(m) => {
                        prop_assert_eq!(topos[m].neighbors().get(face.opposite()), Some(t.rank()));
                        prop_assert_eq!(topos[m].coord(), t.coord().shifted(face.axis(), face.delta()));
                    }
                    None => {
                        let c = t.coord().get(face.axis());
                        let edge = if face.is_positive() { grid.get(face.axis()) - 1 } else { 0 };
                        prop_assert_eq!(c, edge);
                    }
                }
            }
        }
    }

    #[test]
    fn every_cell_has_exactly_one_owner((grid, field) in grid_and_field()) {
        let n = grid.volume();
        let topo = Topology::new(grid, field, n, 0).unwrap();
        let mut owned = vec![0usize; n];
        for z in 0..field.z() {
            for y in 0..field.y() {
                for x in 0..field.x() {
                    let (r, local) = topo.owner_of(p(x, y, z));
                    prop_assert!(topo.local_extent().contains(&local));
                    prop_assert_eq!(topo.origin_of(r).add(&local), p(x, y, z));
                    owned[r] += 1;
                }
            }
        }
        prop_assert!(owned.iter().all(|&c| c == topo.local_extent().volume()));
    }
}
