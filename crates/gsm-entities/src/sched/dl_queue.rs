use std::collections::VecDeque;

use gsm_core::frame_number::{GSM_HYPERFRAME, MAX_FN_AHEAD};
use gsm_core::{ChanNr, FrameNumber, LinkId};
use gsm_saps::ph::{PhDataReq, PhTchReq};

/// Downlink primitive waiting for its block
#[derive(Debug, Clone)]
pub enum DlPrim {
    Data(PhDataReq),
    Tch(PhTchReq),
}

impl DlPrim {
    pub fn fn_(&self) -> FrameNumber {
        match self {
            DlPrim::Data(p) => p.fn_,
            DlPrim::Tch(p) => p.fn_,
        }
    }

    pub fn chan_nr(&self) -> ChanNr {
        match self {
            DlPrim::Data(p) => p.chan_nr,
            DlPrim::Tch(p) => p.chan_nr,
        }
    }

    /// TCH primitives always address the main channel
    pub fn link_id(&self) -> LinkId {
        match self {
            DlPrim::Data(p) => p.link_id,
            DlPrim::Tch(_) => gsm_core::LID_DEDIC,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            DlPrim::Data(p) => &p.data,
            DlPrim::Tch(p) => &p.data,
        }
    }
}

/// FIFO of downlink primitives of one timeslot
#[derive(Debug, Default)]
pub struct DlQueue {
    prims: VecDeque<DlPrim>,
}

impl DlQueue {
    pub fn push(&mut self, prim: DlPrim) {
        self.prims.push_back(prim);
    }

    pub fn len(&self) -> usize {
        self.prims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prims.is_empty()
    }

    pub fn clear(&mut self) {
        self.prims.clear();
    }

    /// Drops all primitives of one channel, e.g. when it is deactivated
    pub fn flush_chan(&mut self, chan_nr: ChanNr, link_id: LinkId) {
        self.prims.retain(|p| !(p.chan_nr() == chan_nr && p.link_id() == link_id));
    }

    /// Takes the next primitive due at `fn_` on the given channel.
    ///
    /// Walks the queue in order. Stale primitives are dropped. A primitive due
    /// now but addressed to another channel means the upper layer got the layout
    /// wrong; it is dropped as well.
    pub fn dequeue(&mut self, fn_: FrameNumber, chan_nr: ChanNr, link_id: LinkId) -> Option<DlPrim> {
        let mut i = 0;
        while i < self.prims.len() {
            let prim_fn = self.prims[i].fn_();
            let ahead = (prim_fn.value() + GSM_HYPERFRAME - fn_.value()) % GSM_HYPERFRAME;

            if ahead > MAX_FN_AHEAD {
                let stale = self.prims.remove(i);
                tracing::warn!(frame = %fn_, "dequeue: dropping stale prim for fn {:?}, chan_nr 0x{:02x}", prim_fn, stale.map_or(0, |p| p.chan_nr()));
                continue;
            }
            if ahead > 0 {
                i += 1;
                continue;
            }

            let prim = &self.prims[i];
            if prim.chan_nr() == chan_nr && prim.link_id() == link_id {
                return self.prims.remove(i);
            }
            // Another channel's primitive due now may still be picked up by that channel
            i += 1;
        }
        None
    }

    /// Drops primitives for `fn_` that no channel consumed, called once the frame is fully scheduled
    pub fn expire(&mut self, fn_: FrameNumber) {
        self.prims.retain(|p| {
            if p.fn_() == fn_ {
                tracing::warn!(frame = %fn_, "expire: prim for chan_nr 0x{:02x} link 0x{:02x} does not match the multiframe layout", p.chan_nr(), p.link_id());
                false
            } else {
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(fn_: u32, chan_nr: ChanNr) -> DlPrim {
        DlPrim::Data(PhDataReq { fn_: FrameNumber::new(fn_), chan_nr, link_id: 0, data: vec![fn_ as u8] })
    }

    #[test]
    fn test_fifo_and_filtering() {
        let mut q = DlQueue::default();
        q.push(data(10, 0x41));
        q.push(data(10, 0x49));
        q.push(data(14, 0x41));

        assert!(q.dequeue(FrameNumber::new(9), 0x41, 0).is_none());
        assert_eq!(q.dequeue(FrameNumber::new(10), 0x49, 0).unwrap().data(), &[10]);
        assert!(q.dequeue(FrameNumber::new(10), 0x41, 0x40).is_none());
        assert_eq!(q.dequeue(FrameNumber::new(10), 0x41, 0).unwrap().data(), &[10]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.dequeue(FrameNumber::new(14), 0x41, 0).unwrap().data(), &[14]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_stale_dropped_across_wrap() {
        let mut q = DlQueue::default();
        q.push(data(GSM_HYPERFRAME - 200, 0x41));
        q.push(data(GSM_HYPERFRAME - 2, 0x41));
        q.push(data(3, 0x41));

        // fn 3 sees the first prim as stale, the second one as past too
        let p = q.dequeue(FrameNumber::new(3), 0x41, 0).unwrap();
        assert_eq!(p.fn_().value(), 3);
        assert!(q.is_empty());
    }

    #[test]
    fn test_future_prim_across_wrap_kept() {
        let mut q = DlQueue::default();
        q.push(data(2, 0x41));
        assert!(q.dequeue(FrameNumber::new(GSM_HYPERFRAME - 4), 0x41, 0).is_none());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_flush_and_expire() {
        let mut q = DlQueue::default();
        q.push(data(10, 0x41));
        q.push(data(10, 0x49));
        q.push(data(20, 0x49));
        q.flush_chan(0x49, 0);
        assert_eq!(q.len(), 1);
        q.expire(FrameNumber::new(10));
        assert!(q.is_empty());
    }
}
