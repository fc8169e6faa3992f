use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use halo_extrema::algs::communicator::{CommTag, LocalComm};
use halo_extrema::algs::distribute::scatter_field;
use halo_extrema::algs::extrema::{ExtremaScan, Isolated, scan_block};
use halo_extrema::algs::halo::HaloExchange;
use halo_extrema::synthetic::random_field;
use halo_extrema::topology::{Point, Topology};

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("extrema_scan");

    for n in [16isize, 32, 64] {
        let field = random_field(Point::new(n, n, n), 4, 1);

        group.bench_with_input(BenchmarkId::new("interior", n), &n, |b, _| {
            b.iter(|| {
                let mut scan = ExtremaScan::new(field.steps());
                scan.scan_interior(&field);
                black_box(scan.answer().cnt_max[0]);
            });
        });

        group.bench_with_input(BenchmarkId::new("shell", n), &n, |b, _| {
            b.iter(|| {
                let mut scan = ExtremaScan::new(field.steps());
                scan.scan_shell(&Isolated(&field));
                black_box(scan.answer().cnt_max[0]);
            });
        });

        group.bench_with_input(BenchmarkId::new("whole_block", n), &n, |b, _| {
            b.iter(|| black_box(scan_block(&field)));
        });
    }

    group.finish();
}

fn bench_halo(c: &mut Criterion) {
    let mut group = c.benchmark_group("halo_exchange");
    let grid = Point::new(2, 1, 1);

    for n in [16isize, 32] {
        let shape = Point::new(2 * n, n, n);
        let field = random_field(shape, 4, 2);
        let topos: Vec<_> = (0..2).map(|r| Topology::new(grid, shape, 2, r).unwrap()).collect();
        let parts = scatter_field(&field, &topos[0]);

        group.bench_with_input(BenchmarkId::new("two_ranks", n), &n, |b, _| {
            b.iter(|| {
                let comms = LocalComm::universe(2);
                std::thread::scope(|s| {
                    for r in 0..2 {
                        let (comm, topo, block) = (&comms[r], &topos[r], &parts[r]);
                        s.spawn(move || {
                            let mut h = HaloExchange::start(block, *topo.neighbors(), comm, CommTag::new(1));
                            h.recv();
                            h.wait().unwrap();
                            h.free().unwrap();
                        });
                    }
                });
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scan, bench_halo);
criterion_main!(benches);
