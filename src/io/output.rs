//! Three-line answer format.
//!
//! ```text
//! (cnt_min, cnt_max) (cnt_min, cnt_max) ...
//! (gmin, gmax) (gmin, gmax) ...
//! read compute total
//! ```
//!
//! One pair per time step, each followed by a space. Floating-point values
//! are printed with six decimals.

use std::fmt::Write as _;
use std::path::Path;

use crate::algs::extrema::Answer;
use crate::extrema_error::ExtremaError;

pub fn format_answer<T: Copy + Into<f64>>(answer: &Answer<T>) -> String {
    let mut out = String::new();
    for (lo, hi) in answer.cnt_min.iter().zip(&answer.cnt_max) {
        let _ = write!(out, "({lo}, {hi}) ");
    }
    out.push('\n');
    for (&lo, &hi) in answer.gmin.iter().zip(&answer.gmax) {
        let _ = write!(out, "({:.6}, {:.6}) ", lo.into(), hi.into());
    }
    out.push('\n');
    let t = &answer.times;
    let _ = writeln!(out, "{:.6} {:.6} {:.6}", t.read, t.compute, t.total);
    out
}

/// Write [`format_answer`] to `path`, replacing any existing file.
pub fn write_answer<T: Copy + Into<f64>>(path: impl AsRef<Path>, answer: &Answer<T>) -> Result<(), ExtremaError> {
    let path = path.as_ref();
    std::fs::write(path, format_answer(answer)).map_err(|e| ExtremaError::io(path, e))?;
    log::info!("answer written to {}", path.display());
    Ok(())
}
