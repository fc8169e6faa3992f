//! Element-wise reduction of per-rank partial answers to the root.
//!
//! Each field is reduced with one gather collective followed by a fold in
//! rank order on the root, so the result does not depend on message
//! arrival order.

use bytemuck::Pod;

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::extrema::{Answer, PhaseTimes, Sample};
use crate::algs::wire::{cast_slice, decode_values};
use crate::extrema_error::ExtremaError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    Min,
    Max,
}

/// Values that can be combined element-wise by a [`ReduceOp`].
pub trait Reducible: Pod {
    fn combine(self, other: Self, op: ReduceOp) -> Self;
}

macro_rules! impl_reducible {
    ($($t:ty),*) => {$(
        impl Reducible for $t {
            #[inline]
            fn combine(self, other: Self, op: ReduceOp) -> Self {
                match op {
                    ReduceOp::Sum => self + other,
                    ReduceOp::Min => if other < self { other } else { self },
                    ReduceOp::Max => if other > self { other } else { self },
                }
            }
        }
    )*};
}

impl_reducible!(u64, f32, f64);

/// Reduce `local` element-wise across all ranks; `Some(result)` on `root`.
///
/// Every rank must pass a slice of the same length.
pub fn reduce_to_root<C, T>(
    comm: &C,
    root: usize,
    tag: CommTag,
    op: ReduceOp,
    local: &[T],
) -> Result<Option<Vec<T>>, ExtremaError>
where
    C: Communicator,
    T: Reducible,
{
    let Some(parts) = comm.gather_to_root(root, tag.as_u16(), cast_slice(local))? else {
        return Ok(None);
    };
    let mut acc: Option<Vec<T>> = None;
    for (peer, bytes) in parts.iter().enumerate() {
        let vals: Vec<T> = decode_values(peer, bytes, local.len())?;
        acc = Some(match acc {
            None => vals,
            Some(mut a) => {
                for (x, y) in a.iter_mut().zip(vals) {
                    *x = x.combine(y, op);
                }
                a
            }
        });
    }
    Ok(Some(acc.unwrap_or_default()))
}

/// Combine every rank's partial answer on `root`: counts are summed,
/// `gmin` takes the minimum, `gmax` and the timings take the maximum.
///
/// Uses tags `tag ..= tag + 4`.
pub fn reduce_answer<C, T>(
    comm: &C,
    root: usize,
    tag: CommTag,
    local: &Answer<T>,
) -> Result<Option<Answer<T>>, ExtremaError>
where
    C: Communicator,
    T: Sample + Reducible,
{
    let t = &local.times;
    let cnt_min = reduce_to_root(comm, root, tag, ReduceOp::Sum, &local.cnt_min)?;
    let cnt_max = reduce_to_root(comm, root, tag.offset(1), ReduceOp::Sum, &local.cnt_max)?;
    let gmin = reduce_to_root(comm, root, tag.offset(2), ReduceOp::Min, &local.gmin)?;
    let gmax = reduce_to_root(comm, root, tag.offset(3), ReduceOp::Max, &local.gmax)?;
    let times = reduce_to_root(
        comm,
        root,
        tag.offset(4),
        ReduceOp::Max,
        &[t.read, t.compute, t.total],
    )?;
    match (cnt_min, cnt_max, gmin, gmax, times) {
        (Some(cnt_min), Some(cnt_max), Some(gmin), Some(gmax), Some(times)) => {
            let &[read, compute, total] = times.as_slice() else {
                return Err(ExtremaError::comm(root, "timing reduction lost values"));
            };
            Ok(Some(Answer {
                cnt_min,
                cnt_max,
                gmin,
                gmax,
                times: PhaseTimes {
                    read,
                    compute,
                    total,
                },
            }))
        }
        _ => Ok(None),
    }
}
