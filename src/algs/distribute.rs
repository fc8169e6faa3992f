//! Distribution of the input field from the root and the inverse gather.
//!
//! The root streams the field once in file order (`z`, `y`, `x`, then `t`
//! fastest) and never holds more than one layer of sub-domains at a time:
//! ranks sharing a grid `(x, y)` column share one staging block. A rank's
//! block is sent as soon as its last cell is written, and a staging block
//! is not overwritten until the send of its previous contents has
//! completed.
//!
//! Once the whole file has been read, the root sends every served rank a
//! one-byte status on the tag after the block tag, so a rank only keeps its
//! block when every other rank has one too. If reading fails, ranks that
//! have not received a block yet get a zero-length message instead, and
//! ranks already served get a failed status. Both report
//! [`ExtremaError::DistributionAborted`].

use bytemuck::Pod;
use itertools::iproduct;

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{cast_slice, cast_slice_mut, copy_into, decode_values};
use crate::data::block::Block;
use crate::extrema_error::ExtremaError;
use crate::topology::decomposition::Topology;
use crate::topology::point::Point;

const STATUS_OK: u8 = 1;
const STATUS_ABORTED: u8 = 0;

/// Copy the `part.bound()` sub-box of `global` starting at `origin` into `part`.
fn extract<T: Copy>(global: &Block<T>, origin: Point, part: &mut Block<T>) {
    let b = part.bound();
    let row = b.extent(0) * part.steps();
    for (z, y) in iproduct!(0..b.extent(2), 0..b.extent(1)) {
        let src = global.index(0, origin.extent(0), origin.extent(1) + y, origin.extent(2) + z);
        let dst = part.index(0, 0, y, z);
        part.as_mut_slice()[dst..dst + row].copy_from_slice(&global.as_slice()[src..src + row]);
    }
}

/// Copy `part` into `global` at `origin`; inverse of [`extract`].
fn place<T: Copy>(global: &mut Block<T>, origin: Point, part: &Block<T>) {
    let b = part.bound();
    let row = b.extent(0) * part.steps();
    for (z, y) in iproduct!(0..b.extent(2), 0..b.extent(1)) {
        let dst = global.index(0, origin.extent(0), origin.extent(1) + y, origin.extent(2) + z);
        let src = part.index(0, 0, y, z);
        global.as_mut_slice()[dst..dst + row].copy_from_slice(&part.as_slice()[src..src + row]);
    }
}

/// Partition a whole field into one block per rank, in rank order.
pub fn scatter_field<T: Pod>(global: &Block<T>, topo: &Topology) -> Vec<Block<T>> {
    assert_eq!(
        global.bound(),
        topo.global_extent(),
        "field shape does not match the topology"
    );
    (0..topo.nprocs())
        .map(|r| {
            let mut part = Block::new(topo.local_extent(), global.steps());
            extract(global, topo.origin_of(r), &mut part);
            part
        })
        .collect()
}

/// Tell every rank except `root` that no block is coming.
///
/// For a root that fails before it starts streaming values.
pub fn abort_distribution<C: Communicator>(comm: &C, topo: &Topology, root: usize, tag: CommTag) {
    let handles: Vec<_> = (0..topo.nprocs())
        .filter(|&r| r != root)
        .map(|r| comm.isend(r, tag.as_u16(), &[]))
        .collect();
    for h in handles {
        let _ = h.wait();
    }
    log::warn!("rank {root}: input distribution aborted");
}

/// Receive this rank's block from `root`; on `root`, stream `values` and
/// send every other rank its block.
///
/// Uses `tag` for blocks and `tag.offset(1)` for the closing status. A
/// rank returns its block only after the root has read the whole input.
/// `values` is only consulted on `root`; a missing iterator on the root is
/// an empty input.
pub fn scatter_from_root<C, T, I>(
    comm: &C,
    topo: &Topology,
    steps: usize,
    root: usize,
    tag: CommTag,
    values: Option<I>,
) -> Result<Block<T>, ExtremaError>
where
    C: Communicator,
    T: Pod,
    I: IntoIterator<Item = Result<T, ExtremaError>>,
{
    if comm.rank() != root {
        return receive_block(comm, topo, steps, root, tag);
    }

    let grid = topo.grid();
    let local = topo.local_extent();
    let global = topo.global_extent();
    let (px, py) = (grid.extent(0), grid.extent(1));
    let expected = global.volume() * steps;

    let mut staging: Vec<Block<T>> = (0..px * py).map(|_| Block::new(local, steps)).collect();
    let mut pending: Vec<Option<C::SendHandle>> = (0..px * py).map(|_| None).collect();
    let mut sent = vec![false; topo.nprocs()];
    sent[root] = true;
    let mut own = None;

    let mut values = values.into_iter().flatten();
    let mut read = 0usize;
    let mut failure = None;
    'stream: for (z, y, x) in iproduct!(0..global.extent(2), 0..global.extent(1), 0..global.extent(0)) {
        let (owner, l) = topo.owner_of(Point::from_extents(x, y, z));
        let slot = owner % (px * py);
        if l == Point::ORIGIN
            && let Some(h) = pending[slot].take()
        {
            // staging block is about to be reused for the next layer
            let _ = h.wait();
        }
        for t in 0..steps {
            match values.next() {
                Some(Ok(v)) => staging[slot].set(t, l.extent(0), l.extent(1), l.extent(2), v),
                Some(Err(e)) => {
                    failure = Some(e);
                    break 'stream;
                }
                None => {
                    failure = Some(ExtremaError::InputTruncated {
                        expected,
                        found: read,
                    });
                    break 'stream;
                }
            }
            read += 1;
        }
        if l.add(&Point::new(1, 1, 1)) == local {
            if owner == root {
                own = Some(staging[slot].clone());
            } else {
                pending[slot] = Some(comm.isend(owner, tag.as_u16(), cast_slice(staging[slot].as_slice())));
                sent[owner] = true;
                log::debug!("rank {root}: block for rank {owner} sent");
            }
        }
    }

    if failure.is_none() && values.next().is_some() {
        log::warn!("input holds more than {expected} values; the rest is ignored");
    }

    let status = [if failure.is_none() { STATUS_OK } else { STATUS_ABORTED }];
    let mut closing = Vec::with_capacity(topo.nprocs());
    for r in (0..topo.nprocs()).filter(|&r| r != root) {
        closing.push(if sent[r] {
            comm.isend(r, tag.offset(1).as_u16(), &status)
        } else {
            comm.isend(r, tag.as_u16(), &[])
        });
    }
    for h in pending.into_iter().flatten().chain(closing) {
        let _ = h.wait();
    }

    match (failure, own) {
        (Some(e), _) => Err(e),
        (None, Some(block)) => Ok(block),
        (None, None) => Err(ExtremaError::InvariantViolation(format!(
            "root rank {root} never completed its own block"
        ))),
    }
}

fn receive_block<C: Communicator, T: Pod>(
    comm: &C,
    topo: &Topology,
    steps: usize,
    root: usize,
    tag: CommTag,
) -> Result<Block<T>, ExtremaError> {
    let mut block = Block::new(topo.local_extent(), steps);
    let h = comm.irecv(root, tag.as_u16(), cast_slice_mut(block.as_mut_slice()));
    match h.wait() {
        Some(data) if data.is_empty() => return Err(ExtremaError::DistributionAborted),
        Some(data) => copy_into(root, &data, block.as_mut_slice())?,
        None => return Err(ExtremaError::comm(root, "block receive returned no data")),
    }

    let mut status = [0u8; 1];
    let h = comm.irecv(root, tag.offset(1).as_u16(), &mut status);
    match h.wait().as_deref() {
        Some([STATUS_OK]) => Ok(block),
        Some([STATUS_ABORTED]) => Err(ExtremaError::DistributionAborted),
        Some(other) => Err(ExtremaError::comm(
            root,
            format!("malformed distribution status of {} byte(s)", other.len()),
        )),
        None => Err(ExtremaError::comm(root, "status receive returned no data")),
    }
}

/// Reassemble the whole field on `root` from every rank's block.
///
/// Returns `Ok(None)` on every other rank.
pub fn gather_to_root<C: Communicator, T: Pod>(
    comm: &C,
    topo: &Topology,
    root: usize,
    tag: CommTag,
    block: &Block<T>,
) -> Result<Option<Block<T>>, ExtremaError> {
    let Some(parts) = comm.gather_to_root(root, tag.as_u16(), cast_slice(block.as_slice()))? else {
        return Ok(None);
    };
    let steps = block.steps();
    let mut global = Block::new(topo.global_extent(), steps);
    for (r, bytes) in parts.iter().enumerate() {
        let vals = decode_values::<T>(r, bytes, block.len())?;
        let part = Block::from_vec(topo.local_extent(), steps, vals)
            .ok_or_else(|| ExtremaError::comm(r, "gathered block has the wrong shape"))?;
        place(&mut global, topo.origin_of(r), &part);
    }
    Ok(Some(global))
}
