//! Thin façade over intra-process or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees: every
//! backend copies the send buffer before `isend` returns, so the caller may
//! reuse it immediately). All handles are **waitable** but non-blocking;
//! callers must `.wait()` a receive before trusting its payload.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};

use crate::extrema_error::ExtremaError;

/// Message tag newtype so exchange epochs cannot collide by accident.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    #[inline]
    pub const fn new(v: u16) -> Self {
        CommTag(v)
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Tag `k` slots after this one.
    #[inline]
    pub const fn offset(self, k: u16) -> CommTag {
        CommTag(self.0.wrapping_add(k))
    }
}

/// Tags for every exchange of one run.
///
/// `halo` reserves six consecutive tags (one per receiving face), `scatter`
/// two (blocks, then the read status) and `reduce` five (one per reduced
/// field).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExchangeTags {
    pub halo: CommTag,
    pub scatter: CommTag,
    pub gather: CommTag,
    pub reduce: CommTag,
}

impl ExchangeTags {
    pub const fn from_base(base: CommTag) -> Self {
        Self {
            halo: base,
            scatter: base.offset(6),
            gather: base.offset(8),
            reduce: base.offset(9),
        }
    }
}

impl Default for ExchangeTags {
    fn default() -> Self {
        Self::from_base(CommTag::new(333))
    }
}

/// Non-blocking communication interface (minimal by design).
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// This process's identifier in `[0, size)`.
    fn rank(&self) -> usize;
    /// Number of participating processes.
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive expecting `buf.len()` bytes. The payload is returned
    /// by [`Wait::wait`]; a backend either returns it whole or fails, never
    /// truncates it, so callers can check the length themselves.
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;

    /// Collect every rank's `local` bytes at `root`, indexed by rank.
    ///
    /// All ranks must pass slices of the same length. Returns `Ok(None)` on
    /// every rank except `root`. The default implementation is built from
    /// point-to-point messages; backends with a native collective override it.
    fn gather_to_root(
        &self,
        root: usize,
        tag: u16,
        local: &[u8],
    ) -> Result<Option<Vec<Vec<u8>>>, ExtremaError> {
        if self.rank() != root {
            let _ = self.isend(root, tag, local).wait();
            return Ok(None);
        }
        let mut pending = Vec::with_capacity(self.size().saturating_sub(1));
        for peer in (0..self.size()).filter(|&p| p != root) {
            let mut scratch = vec![0u8; local.len()];
            pending.push((peer, self.irecv(peer, tag, &mut scratch)));
        }
        let mut parts = vec![Vec::new(); self.size()];
        parts[root] = local.to_vec();
        // drain every handle before reporting the first failure
        let mut maybe_err = None;
        for (peer, h) in pending {
            match h.wait() {
                Some(data) if data.len() == local.len() => parts[peer] = data,
                Some(data) if maybe_err.is_none() => {
                    maybe_err = Some(ExtremaError::comm(
                        peer,
                        format!("expected {} bytes in gather, got {}", local.len(), data.len()),
                    ));
                }
                None if maybe_err.is_none() => {
                    maybe_err = Some(ExtremaError::comm(peer, "gather receive returned no data"));
                }
                _ => {}
            }
        }
        match maybe_err {
            Some(err) => Err(err),
            None => Ok(Some(parts)),
        }
    }
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Compile-time no-op comm for single-rank runs and serial unit tests.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}
}

// --- LocalComm: N ranks sharing one address space ---
type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Default)]
struct Mailbox {
    queues: Mutex<HashMap<Key, VecDeque<Bytes>>>,
    arrived: Condvar,
}

/// In-memory communicator: every rank of a [`LocalComm::universe`] shares
/// one mailbox. Sends are buffered and complete immediately; receives block
/// in `wait` until a matching `(src, dst, tag)` message is queued.
///
/// Messages with the same key are delivered FIFO, matched to receives in
/// the order those receives are waited on.
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .finish()
    }
}

impl LocalComm {
    /// `size` connected communicators, one per rank, in rank order.
    pub fn universe(size: usize) -> Vec<LocalComm> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }
}

pub struct LocalRecv {
    mailbox: Arc<Mailbox>,
    key: Key,
}

impl Wait for LocalRecv {
    fn wait(self) -> Option<Vec<u8>> {
        let mut queues = self.mailbox.queues.lock();
        loop {
            // whole payload, so size checks downstream see an oversized message
            if let Some(bytes) = queues.get_mut(&self.key).and_then(VecDeque::pop_front) {
                return Some(bytes.to_vec());
            }
            self.mailbox.arrived.wait(&mut queues);
        }
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalRecv;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        debug_assert!(peer < self.size, "send to rank {peer} outside universe of {}", self.size);
        let key = (self.rank, peer, tag);
        self.mailbox
            .queues
            .lock()
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
        self.mailbox.arrived.notify_all();
    }

    fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> LocalRecv {
        debug_assert!(peer < self.size, "receive from rank {peer} outside universe of {}", self.size);
        LocalRecv {
            mailbox: Arc::clone(&self.mailbox),
            key: (peer, self.rank, tag),
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, ExtremaError, Wait};
    use mpi::environment::Universe;
    use mpi::request::StaticScope;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{Communicator as _, Destination, Equivalence, Root, Source};

    /// rsmpi world communicator. Owns the MPI environment: dropping the
    /// last `MpiComm` finalizes MPI.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        rank: usize,
        size: usize,
        // dropped last so `world` is released before MPI_Finalize
        _universe: Universe,
    }

    impl MpiComm {
        /// Initialise MPI. Returns `None` if MPI was already initialised.
        pub fn new() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Some(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }

        /// Terminate every rank; used when a fatal error leaves peers blocked.
        pub fn abort(&self, code: i32) -> ! {
            self.world.abort(code)
        }
    }

    /// Outstanding request over a buffer leaked to `'static` for the
    /// request's lifetime and reclaimed in `wait`.
    pub struct MpiHandle {
        complete: Option<Box<dyn FnOnce() -> usize>>,
        buf: *mut [u8],
        is_recv: bool,
    }

    impl Wait for MpiHandle {
        fn wait(mut self) -> Option<Vec<u8>> {
            let received = self.complete.take().map_or(0, |complete| complete());
            // SAFETY: `buf` came from `Box::leak` in `isend`/`irecv` and the
            // request that borrowed it has completed above.
            let owned = unsafe { Box::from_raw(self.buf) };
            self.is_recv.then(|| {
                let mut data = owned.into_vec();
                data.truncate(received);
                data
            })
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiHandle;
        type RecvHandle = MpiHandle;

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiHandle {
            let leaked: &'static mut [u8] = Box::leak(buf.to_vec().into_boxed_slice());
            let raw: *mut [u8] = leaked;
            // SAFETY: `raw` is only dereferenced again after the request completes.
            let shared: &'static [u8] = unsafe { &*raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, shared, i32::from(tag));
            MpiHandle {
                complete: Some(Box::new(move || {
                    req.wait();
                    0
                })),
                buf: raw,
                is_recv: false,
            }
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiHandle {
            let leaked: &'static mut [u8] = Box::leak(vec![0u8; buf.len()].into_boxed_slice());
            let raw: *mut [u8] = leaked;
            // SAFETY: the request is the only user of the buffer until `wait`.
            let target: &'static mut [u8] = unsafe { &mut *raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_receive_into_with_tag(StaticScope, target, i32::from(tag));
            MpiHandle {
                complete: Some(Box::new(move || {
                    let status = req.wait();
                    status.count(u8::equivalent_datatype()).max(0) as usize
                })),
                buf: raw,
                is_recv: true,
            }
        }

        fn gather_to_root(
            &self,
            root: usize,
            _tag: u16,
            local: &[u8],
        ) -> Result<Option<Vec<Vec<u8>>>, ExtremaError> {
            let root_process = self.world.process_at_rank(root as i32);
            if self.rank != root {
                root_process.gather_into(local);
                return Ok(None);
            }
            let mut all = vec![0u8; local.len() * self.size];
            root_process.gather_into_root(local, &mut all[..]);
            if local.is_empty() {
                return Ok(Some(vec![Vec::new(); self.size]));
            }
            Ok(Some(all.chunks(local.len()).map(<[u8]>::to_vec).collect()))
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::{MpiComm, MpiHandle};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_roundtrip_two_ranks() {
        let comms = LocalComm::universe(2);
        let (c0, c1) = (&comms[0], &comms[1]);

        let mut recv_buf = [0u8; 4];
        let recv_handle = c1.irecv(0, 7, &mut recv_buf);
        c0.isend(1, 7, &[1, 2, 3, 4]).wait();

        let data = recv_handle
            .wait()
            .expect("Expected to receive data from rank 0");
        recv_buf.copy_from_slice(&data);
        assert_eq!(&recv_buf, &[1, 2, 3, 4]);
    }

    #[test]
    fn local_tags_do_not_mix() {
        let comms = LocalComm::universe(2);
        comms[0].isend(1, 2, &[2]);
        comms[0].isend(1, 1, &[1]);
        let mut b = [0u8; 1];
        assert_eq!(comms[1].irecv(0, 1, &mut b).wait().unwrap(), vec![1]);
        assert_eq!(comms[1].irecv(0, 2, &mut b).wait().unwrap(), vec![2]);
    }

    #[test]
    fn oversized_payload_is_not_truncated() {
        let comms = LocalComm::universe(2);
        comms[0].isend(1, 3, &[1, 2, 3]);
        let mut b = [0u8; 2];
        assert_eq!(comms[1].irecv(0, 3, &mut b).wait().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn universes_are_isolated() {
        let a = LocalComm::universe(2);
        let b = LocalComm::universe(2);
        a[0].isend(1, 5, &[10]);
        b[0].isend(1, 5, &[20]);
        let mut buf = [0u8; 1];
        assert_eq!(b[1].irecv(0, 5, &mut buf).wait().unwrap(), vec![20]);
        assert_eq!(a[1].irecv(0, 5, &mut buf).wait().unwrap(), vec![10]);
    }

    #[test]
    fn receive_blocks_until_send_arrives() {
        let comms = LocalComm::universe(2);
        std::thread::scope(|s| {
            let c1 = &comms[1];
            let h = s.spawn(move || {
                let mut b = [0u8; 3];
                c1.irecv(0, 9, &mut b).wait()
            });
            std::thread::sleep(std::time::Duration::from_millis(20));
            comms[0].isend(1, 9, &[7, 8, 9]);
            assert_eq!(h.join().unwrap(), Some(vec![7, 8, 9]));
        });
    }

    #[test]
    fn default_gather_collects_in_rank_order() {
        let comms = LocalComm::universe(3);
        let out: Vec<_> = std::thread::scope(|s| {
            let hs: Vec<_> = comms
                .iter()
                .map(|c| s.spawn(move || c.gather_to_root(1, 40, &[c.rank() as u8; 2])))
                .collect();
            hs.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
        });
        assert!(out[0].is_none());
        assert!(out[2].is_none());
        assert_eq!(out[1].as_ref().unwrap(), &vec![vec![0, 0], vec![1, 1], vec![2, 2]]);
    }

    #[test]
    fn gather_length_mismatch_is_comm_error() {
        let comms = LocalComm::universe(2);
        comms[1].isend(0, 41, &[1, 2, 3]);
        let err = comms[0].gather_to_root(0, 41, &[0, 0]).unwrap_err();
        assert!(matches!(err, ExtremaError::CommError { neighbor: 1, .. }));
    }

    #[test]
    fn no_comm_is_single_rank() {
        let c = NoComm;
        assert_eq!((c.rank(), c.size()), (0, 1));
        let got = c.gather_to_root(0, 1, &[4, 2]).unwrap();
        assert_eq!(got, Some(vec![vec![4, 2]]));
    }
}
