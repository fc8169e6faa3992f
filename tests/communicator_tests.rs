use halo_extrema::algs::communicator::{CommTag, Communicator, ExchangeTags, LocalComm, NoComm, Wait};

mod util;

#[test]
fn local_round_trip() {
    let tag = CommTag(0x1000);
    let comms = LocalComm::universe(2);

    let msg = b"hello";
    comms[0].isend(1, tag.as_u16(), msg).wait();

    let mut buf = [0u8; 5];
    let h = comms[1].irecv(0, tag.as_u16(), &mut buf);
    let got = h.wait().unwrap();
    assert_eq!(&got, msg);
}

#[test]
fn local_fifo_order() {
    let tag = CommTag(0x1001);
    let comms = LocalComm::universe(2);

    for i in 0..10u8 {
        comms[0].isend(1, tag.as_u16(), &[i]);
    }
    let mut out = Vec::new();
    for _ in 0..10 {
        let mut b = [0u8; 1];
        let h = comms[1].irecv(0, tag.as_u16(), &mut b);
        out.push(h.wait().unwrap()[0]);
    }
    assert_eq!(out, (0u8..10u8).collect::<Vec<_>>());
}

#[test]
fn truncation_is_ok() {
    let tag = CommTag(0x1002);
    let comms = LocalComm::universe(2);

    comms[0].isend(1, tag.as_u16(), &[1, 2, 3, 4, 5, 6]);
    let mut b = [0u8; 4];
    let got = comms[1].irecv(0, tag.as_u16(), &mut b).wait().unwrap();
    assert_eq!(got, vec![1, 2, 3, 4]);
}

#[test]
fn sources_do_not_mix() {
    let tag = CommTag(0x1003);
    let comms = LocalComm::universe(3);
    comms[2].isend(0, tag.as_u16(), &[2]);
    comms[1].isend(0, tag.as_u16(), &[1]);
    let mut b = [0u8; 1];
    assert_eq!(comms[0].irecv(1, tag.as_u16(), &mut b).wait(), Some(vec![1]));
    assert_eq!(comms[0].irecv(2, tag.as_u16(), &mut b).wait(), Some(vec![2]));
}

#[test]
fn ring_exchange_across_threads() {
    let n = 5;
    let got = util::run_ranks(n, |c| {
        let right = (c.rank() + 1) % n;
        let left = (c.rank() + n - 1) % n;
        let mut b = [0u8; 1];
        let h = c.irecv(left, 7, &mut b);
        c.isend(right, 7, &[c.rank() as u8]);
        h.wait().unwrap()[0]
    });
    assert_eq!(got, vec![4, 0, 1, 2, 3]);
}

#[test]
fn gather_on_every_root() {
    for root in 0..3 {
        let out = util::run_ranks(3, |c| c.gather_to_root(root, 90 + root as u16, &[c.rank() as u8 * 10]).unwrap());
        for (r, o) in out.iter().enumerate() {
            if r == root {
                assert_eq!(o.as_deref(), Some(&[vec![0], vec![10], vec![20]][..]));
            } else {
                assert!(o.is_none());
            }
        }
    }
}

#[test]
fn no_comm_send_is_noop() {
    let c = NoComm;
    let mut b = [0u8; 2];
    c.isend(0, 1, &[1, 2]).wait();
    assert_eq!(c.irecv(0, 1, &mut b).wait(), None);
}

#[test]
fn exchange_tags_do_not_overlap() {
    let t = ExchangeTags::default();
    let halo: Vec<u16> = (0..6).map(|k| t.halo.offset(k).as_u16()).collect();
    let reduce: Vec<u16> = (0..5).map(|k| t.reduce.offset(k).as_u16()).collect();
    let mut all: Vec<u16> = halo
        .iter()
        .chain(&reduce)
        .copied()
        .chain([t.scatter.as_u16(), t.scatter.offset(1).as_u16(), t.gather.as_u16()])
        .collect();
    let n = all.len();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), n);
}
