//! Deterministic test fields and the writer for the input file format.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::data::block::Block;
use crate::extrema_error::ExtremaError;
use crate::topology::point::Point;

/// Field of shape `shape` with `steps` samples per cell, uniform in
/// `[-1, 1)`. The same seed always yields the same field.
pub fn random_field(shape: Point, steps: usize, seed: u64) -> Block<f32> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut block = Block::new(shape, steps);
    for v in block.as_mut_slice() {
        *v = rng.gen_range(-1.0f32..1.0);
    }
    block
}

/// Write `block` as a field file: one line per cell in `z`, `y`, `x`
/// order, holding that cell's time samples.
pub fn write_field<T: Copy + Display>(path: impl AsRef<Path>, block: &Block<T>) -> Result<(), ExtremaError> {
    let path = path.as_ref();
    let io = |e| ExtremaError::io(path, e);
    let mut out = BufWriter::new(File::create(path).map_err(io)?);
    let steps = block.steps().max(1);
    for cell in block.as_slice().chunks(steps) {
        for v in cell {
            write!(out, "{v} ").map_err(io)?;
        }
        writeln!(out).map_err(io)?;
    }
    out.flush().map_err(io)?;
    log::debug!("field {} x {} steps written to {}", block.bound(), block.steps(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::input::read_field_values;

    #[test]
    fn seeded_fields_repeat() {
        let a = random_field(Point::new(3, 2, 2), 2, 7);
        let b = random_field(Point::new(3, 2, 2), 2, 7);
        let c = random_field(Point::new(3, 2, 2), 2, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.as_slice().iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn written_field_reads_back() {
        let path = std::env::temp_dir().join(format!("halo-extrema-synth-{}.txt", std::process::id()));
        let field = random_field(Point::new(2, 3, 2), 3, 1);
        write_field(&path, &field).unwrap();
        let vals: Vec<f32> = read_field_values(&path).unwrap().collect::<Result<_, _>>().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(vals, field.as_slice());
    }
}
