#![allow(dead_code)]
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use halo_extrema::{
    algs::communicator::LocalComm,
    data::block::Block,
    topology::point::Point,
};

pub fn p(x: isize, y: isize, z: isize) -> Point {
    Point::new(x, y, z)
}

/// Run `f` once per rank of an `n`-rank in-memory universe, one thread per
/// rank; results come back in rank order.
pub fn run_ranks<F, R>(n: usize, f: F) -> Vec<R>
where
    F: Fn(&LocalComm) -> R + Sync,
    R: Send,
{
    let comms = LocalComm::universe(n);
    let f = &f;
    std::thread::scope(|s| {
        let handles: Vec<_> = comms.iter().map(|c| s.spawn(move || f(c))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Field whose value is its own linear index.
pub fn ramp(shape: Point, steps: usize) -> Block<f32> {
    let n = shape.volume() * steps;
    Block::from_vec(shape, steps, (0..n).map(|i| i as f32).collect()).unwrap()
}

/// Fresh path under the system temp dir, unique per process and call.
pub fn temp_path(stem: &str) -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let k = NEXT.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("halo-extrema-{stem}-{}-{k}.txt", std::process::id()))
}
