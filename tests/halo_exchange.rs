use halo_extrema::algs::Communicator;
use halo_extrema::algs::communicator::CommTag;
use halo_extrema::algs::distribute::scatter_field;
use halo_extrema::algs::halo::{HaloExchange, HaloState};
use halo_extrema::topology::{Face, Point, Topology};

mod util;
use util::{p, ramp, run_ranks};

/// Every coordinate one step outside a face with a neighbor, plus every
/// interior coordinate, must read the global field at the same position.
fn check_grid(grid: Point, field_shape: Point, steps: usize) {
    let field = ramp(field_shape, steps);
    let n = grid.volume();
    let topo0 = Topology::new(grid, field_shape, n, 0).unwrap();
    let parts = scatter_field(&field, &topo0);
    let field = &field;
    let checked = run_ranks(n, |c| {
        let topo = Topology::new(grid, field_shape, n, c.rank()).unwrap();
        let block = &parts[c.rank()];
        let mut h = HaloExchange::start(block, *topo.neighbors(), c, CommTag::new(200));
        h.recv();
        h.wait().unwrap();
        assert_eq!(h.state(), HaloState::Complete);

        let o = topo.origin();
        let b = block.bound();
        let mut count = 0usize;
        for face in Face::ALL {
            if !topo.neighbors().has(face) {
                assert!(h.plane(face).is_empty());
                continue;
            }
            let axis = face.axis();
            let fixed = if face.is_positive() { b.get(axis) } else { -1 };
            for z in 0..b.z() {
                for y in 0..b.y() {
                    for x in 0..b.x() {
                        let mut q = [x, y, z];
                        if q[axis] != 0 {
                            continue;
                        }
                        q[axis] = fixed;
                        let g = [o.x() + q[0], o.y() + q[1], o.z() + q[2]];
                        for t in 0..steps {
                            assert_eq!(
                                h.at(t, q[0], q[1], q[2]),
                                field.get(t, g[0] as usize, g[1] as usize, g[2] as usize),
                                "rank {} face {face} at {q:?} step {t}",
                                c.rank()
                            );
                            count += 1;
                        }
                    }
                }
            }
        }
        for (x, y, z) in [(0, 0, 0), (b.x() - 1, b.y() - 1, b.z() - 1)] {
            assert_eq!(h.at(0, x, y, z), block.get(0, x as usize, y as usize, z as usize));
        }
        h.free().unwrap();
        count
    });
    // every halo value of every present face was compared
    let expected: usize = (0..n)
        .map(|r| {
            let topo = Topology::new(grid, field_shape, n, r).unwrap();
            let b = topo.local_extent();
            topo.neighbors()
                .present()
                .map(|(f, _)| b.volume() / b.extent(f.axis()) * steps)
                .sum::<usize>()
        })
        .sum();
    assert_eq!(checked.iter().sum::<usize>(), expected);
}

#[test]
fn two_ranks_along_x() {
    check_grid(p(2, 1, 1), p(4, 3, 2), 2);
}

#[test]
fn two_ranks_along_y_and_z() {
    check_grid(p(1, 2, 1), p(3, 4, 2), 3);
    check_grid(p(1, 1, 2), p(2, 3, 4), 1);
}

#[test]
fn full_cube_of_ranks() {
    check_grid(p(2, 2, 2), p(4, 4, 4), 2);
}

#[test]
fn three_by_three_in_a_plane() {
    check_grid(p(3, 3, 1), p(6, 3, 2), 2);
}

#[test]
fn planes_are_sized_by_face() {
    let grid = p(2, 2, 2);
    let shape = p(6, 4, 2);
    let field = ramp(shape, 3);
    let topo0 = Topology::new(grid, shape, 8, 0).unwrap();
    let parts = scatter_field(&field, &topo0);
    let sizes = run_ranks(8, |c| {
        let topo = Topology::new(grid, shape, 8, c.rank()).unwrap();
        let mut h = HaloExchange::start(&parts[c.rank()], *topo.neighbors(), c, CommTag::new(300));
        h.recv();
        h.wait().unwrap();
        let s: Vec<_> = Face::ALL.iter().map(|&f| h.plane(f).extent()).collect();
        h.free().unwrap();
        s
    });
    // rank 0 sits at the low corner: neighbors only on +x, +y, +z
    assert_eq!(sizes[0], vec![(0, 0), (0, 0), (0, 0), (2, 1), (3, 1), (3, 2)]);
}
