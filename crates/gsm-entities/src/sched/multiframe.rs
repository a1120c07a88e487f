//! Multiframe layouts per physical channel configuration (3GPP TS 45.002 clause 7).
//!
//! Each layout maps `fn % period` to the logical channel and block position active
//! on downlink and uplink. Tables are built at compile time and never change.

use gsm_core::{FrameNumber, Pchan, Timeslot};

use super::chan_desc::ChanType;

/// What happens on one timeslot in one frame of a multiframe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedFrame {
    pub dl_chan: ChanType,
    /// Position of this burst within its downlink block
    pub dl_bid: u8,
    pub ul_chan: ChanType,
    /// Position of this burst within its uplink block
    pub ul_bid: u8,
}

const IDLE: SchedFrame = SchedFrame {
    dl_chan: ChanType::Idle,
    dl_bid: 0,
    ul_chan: ChanType::Idle,
    ul_bid: 0,
};

/// One multiframe layout and the timeslots it applies to
#[derive(Debug)]
pub struct Multiframe {
    pub pchan: Pchan,
    pub slotmask: u8,
    pub period: u32,
    pub frames: &'static [SchedFrame],
    pub name: &'static str,
}

impl Multiframe {
    #[inline(always)]
    pub fn frame(&self, fn_: FrameNumber) -> &SchedFrame {
        &self.frames[fn_.modulo(self.period) as usize]
    }

    /// True if the frame carries a SACCH burst in the given direction
    pub fn is_sacch(&self, fn_: FrameNumber, uplink: bool) -> bool {
        let f = self.frame(fn_);
        if uplink { f.ul_chan.is_sacch() } else { f.dl_chan.is_sacch() }
    }

    /// True if the channel appears anywhere in the layout
    pub fn contains(&self, chan: ChanType) -> bool {
        self.frames.iter().any(|f| f.dl_chan == chan || f.ul_chan == chan)
    }
}

/// Returns the layout for a physical channel configuration on a timeslot, if defined
pub fn find_mframe(pchan: Pchan, tn: Timeslot) -> Option<&'static Multiframe> {
    if tn as usize >= gsm_core::NUM_TIMESLOTS {
        return None;
    }
    MULTIFRAMES.iter().find(|mf| mf.pchan == pchan && mf.slotmask & (1 << tn) != 0)
}

// ---------------------------------------------------------------------------
// Table construction

/// Puts a four burst downlink block at `start`
const fn dl_block<const N: usize>(mut t: [SchedFrame; N], start: usize, chan: ChanType) -> [SchedFrame; N] {
    let mut i = 0;
    while i < 4 {
        t[start + i].dl_chan = chan;
        t[start + i].dl_bid = i as u8;
        i += 1;
    }
    t
}

const fn is_dedicated(chan: ChanType) -> bool {
    matches!(
        chan,
        ChanType::Sdcch4_0 | ChanType::Sdcch4_1 | ChanType::Sdcch4_2 | ChanType::Sdcch4_3
            | ChanType::Sacch4_0 | ChanType::Sacch4_1 | ChanType::Sacch4_2 | ChanType::Sacch4_3
            | ChanType::Sdcch8_0 | ChanType::Sdcch8_1 | ChanType::Sdcch8_2 | ChanType::Sdcch8_3
            | ChanType::Sdcch8_4 | ChanType::Sdcch8_5 | ChanType::Sdcch8_6 | ChanType::Sdcch8_7
            | ChanType::Sacch8_0 | ChanType::Sacch8_1 | ChanType::Sacch8_2 | ChanType::Sacch8_3
            | ChanType::Sacch8_4 | ChanType::Sacch8_5 | ChanType::Sacch8_6 | ChanType::Sacch8_7
    )
}

/// Dedicated uplink blocks follow their downlink counterparts 15 frames later.
/// All other uplink frames carry `filler`.
const fn ul_from_dl<const N: usize>(mut t: [SchedFrame; N], filler: ChanType) -> [SchedFrame; N] {
    let mut i = 0;
    while i < N {
        let src = t[(i + N - 15) % N];
        if is_dedicated(src.dl_chan) {
            t[i].ul_chan = src.dl_chan;
            t[i].ul_bid = src.dl_bid;
        } else {
            t[i].ul_chan = filler;
            t[i].ul_bid = 0;
        }
        i += 1;
    }
    t
}

/// Replaces one SDCCH subchannel by the CBCH on downlink.
/// Its uplink and its SACCH in both directions fall idle.
const fn with_cbch<const N: usize>(mut t: [SchedFrame; N], sdcch: ChanType, sacch: ChanType) -> [SchedFrame; N] {
    let mut i = 0;
    while i < N {
        if t[i].dl_chan as u8 == sdcch as u8 {
            t[i].dl_chan = ChanType::Cbch;
        } else if t[i].dl_chan as u8 == sacch as u8 {
            t[i].dl_chan = ChanType::Idle;
            t[i].dl_bid = 0;
        }
        if t[i].ul_chan as u8 == sdcch as u8 || t[i].ul_chan as u8 == sacch as u8 {
            t[i].ul_chan = ChanType::Idle;
            t[i].ul_bid = 0;
        }
        i += 1;
    }
    t
}

/// Downlink of one 51-multiframe of a CCCH timeslot. `sdcch` selects the combined
/// layout, `second` the SACCH subchannels of the odd 51-multiframe.
const fn ccch51_dl(sdcch: bool, second: bool) -> [SchedFrame; 51] {
    let mut t = [IDLE; 51];
    let mut k = 0;
    while k < 5 {
        t[k * 10].dl_chan = ChanType::Fcch;
        t[k * 10 + 1].dl_chan = ChanType::Sch;
        k += 1;
    }
    t = dl_block(t, 2, ChanType::Bcch);
    t = dl_block(t, 6, ChanType::Ccch);
    t = dl_block(t, 12, ChanType::Ccch);
    t = dl_block(t, 16, ChanType::Ccch);
    if sdcch {
        t = dl_block(t, 22, ChanType::Sdcch4_0);
        t = dl_block(t, 26, ChanType::Sdcch4_1);
        t = dl_block(t, 32, ChanType::Sdcch4_2);
        t = dl_block(t, 36, ChanType::Sdcch4_3);
        if second {
            t = dl_block(t, 42, ChanType::Sacch4_2);
            t = dl_block(t, 46, ChanType::Sacch4_3);
        } else {
            t = dl_block(t, 42, ChanType::Sacch4_0);
            t = dl_block(t, 46, ChanType::Sacch4_1);
        }
    } else {
        t = dl_block(t, 22, ChanType::Ccch);
        t = dl_block(t, 26, ChanType::Ccch);
        t = dl_block(t, 32, ChanType::Ccch);
        t = dl_block(t, 36, ChanType::Ccch);
        t = dl_block(t, 42, ChanType::Ccch);
        t = dl_block(t, 46, ChanType::Ccch);
    }
    t
}

const fn concat51(a: [SchedFrame; 51], b: [SchedFrame; 51]) -> [SchedFrame; 102] {
    let mut t = [IDLE; 102];
    let mut i = 0;
    while i < 51 {
        t[i] = a[i];
        t[i + 51] = b[i];
        i += 1;
    }
    t
}

const fn bcch() -> [SchedFrame; 51] {
    let mut t = ccch51_dl(false, false);
    let mut i = 0;
    while i < 51 {
        t[i].ul_chan = ChanType::Rach;
        i += 1;
    }
    t
}

const fn bcch_sdcch4() -> [SchedFrame; 102] {
    ul_from_dl(concat51(ccch51_dl(true, false), ccch51_dl(true, true)), ChanType::Rach)
}

const fn sdcch8() -> [SchedFrame; 102] {
    const SDCCH: [ChanType; 8] = [
        ChanType::Sdcch8_0, ChanType::Sdcch8_1, ChanType::Sdcch8_2, ChanType::Sdcch8_3,
        ChanType::Sdcch8_4, ChanType::Sdcch8_5, ChanType::Sdcch8_6, ChanType::Sdcch8_7,
    ];
    const SACCH: [ChanType; 8] = [
        ChanType::Sacch8_0, ChanType::Sacch8_1, ChanType::Sacch8_2, ChanType::Sacch8_3,
        ChanType::Sacch8_4, ChanType::Sacch8_5, ChanType::Sacch8_6, ChanType::Sacch8_7,
    ];
    let mut t = [IDLE; 102];
    let mut half = 0;
    while half < 2 {
        let base = half * 51;
        let mut s = 0;
        while s < 8 {
            t = dl_block(t, base + s * 4, SDCCH[s]);
            s += 1;
        }
        let mut a = 0;
        while a < 4 {
            t = dl_block(t, base + 32 + a * 4, SACCH[half * 4 + a]);
            a += 1;
        }
        half += 1;
    }
    ul_from_dl(t, ChanType::Idle)
}

/// TCH/F with SACCH/TF. The SACCH block starts 26 frames later per timeslot pair.
const fn tchf(tn: usize) -> [SchedFrame; 104] {
    let mut t = [IDLE; 104];
    let mut i = 0;
    while i < 104 {
        let k = i / 26;
        let j = i % 26;
        let (chan, bid) = if j < 12 {
            (ChanType::TchF, j % 4)
        } else if j == 12 {
            (ChanType::SacchTF, (k + 4 - tn % 4) % 4)
        } else if j < 25 {
            (ChanType::TchF, (j - 13) % 4)
        } else {
            (ChanType::Idle, 0)
        };
        t[i] = SchedFrame { dl_chan: chan, dl_bid: bid as u8, ul_chan: chan, ul_bid: bid as u8 };
        i += 1;
    }
    t
}

/// PDCH: twelve radio blocks per 52-multiframe plus PTCCH and idle frames
const fn pdch() -> [SchedFrame; 104] {
    let mut t = [IDLE; 104];
    let mut i = 0;
    while i < 104 {
        let j = i % 52;
        let (chan, bid) = if j == 12 || j == 38 {
            (ChanType::Ptcch, i / 26)
        } else if j == 25 || j == 51 {
            (ChanType::Idle, 0)
        } else {
            // Blocks are aligned to the start of each 13 frame group
            (ChanType::Pdtch, (j % 13) % 4)
        };
        t[i] = SchedFrame { dl_chan: chan, dl_bid: bid as u8, ul_chan: chan, ul_bid: bid as u8 };
        i += 1;
    }
    t
}

static FRAME_IDLE: [SchedFrame; 1] = [IDLE];
static FRAME_BCCH: [SchedFrame; 51] = bcch();
static FRAME_BCCH_SDCCH4: [SchedFrame; 102] = bcch_sdcch4();
static FRAME_BCCH_SDCCH4_CBCH: [SchedFrame; 102] = with_cbch(bcch_sdcch4(), ChanType::Sdcch4_2, ChanType::Sacch4_2);
static FRAME_SDCCH8: [SchedFrame; 102] = sdcch8();
static FRAME_SDCCH8_CBCH: [SchedFrame; 102] = with_cbch(sdcch8(), ChanType::Sdcch8_2, ChanType::Sacch8_2);
static FRAME_TCHF_TS0: [SchedFrame; 104] = tchf(0);
static FRAME_TCHF_TS1: [SchedFrame; 104] = tchf(1);
static FRAME_TCHF_TS2: [SchedFrame; 104] = tchf(2);
static FRAME_TCHF_TS3: [SchedFrame; 104] = tchf(3);
static FRAME_PDCH: [SchedFrame; 104] = pdch();

pub static MULTIFRAMES: [Multiframe; 11] = [
    Multiframe { pchan: Pchan::None, slotmask: 0xff, period: 1, frames: &FRAME_IDLE, name: "IDLE" },
    Multiframe { pchan: Pchan::Ccch, slotmask: 0x01, period: 51, frames: &FRAME_BCCH, name: "BCCH+CCCH" },
    Multiframe { pchan: Pchan::CcchSdcch4, slotmask: 0x01, period: 102, frames: &FRAME_BCCH_SDCCH4, name: "BCCH+CCCH+SDCCH/4+SACCH/4" },
    Multiframe { pchan: Pchan::CcchSdcch4Cbch, slotmask: 0x01, period: 102, frames: &FRAME_BCCH_SDCCH4_CBCH, name: "BCCH+CCCH+SDCCH/4+SACCH/4+CBCH" },
    Multiframe { pchan: Pchan::Sdcch8, slotmask: 0xff, period: 102, frames: &FRAME_SDCCH8, name: "SDCCH/8+SACCH/8" },
    Multiframe { pchan: Pchan::Sdcch8Cbch, slotmask: 0xff, period: 102, frames: &FRAME_SDCCH8_CBCH, name: "SDCCH/8+SACCH/8+CBCH" },
    Multiframe { pchan: Pchan::TchF, slotmask: 0x11, period: 104, frames: &FRAME_TCHF_TS0, name: "TCH/F+SACCH" },
    Multiframe { pchan: Pchan::TchF, slotmask: 0x22, period: 104, frames: &FRAME_TCHF_TS1, name: "TCH/F+SACCH" },
    Multiframe { pchan: Pchan::TchF, slotmask: 0x44, period: 104, frames: &FRAME_TCHF_TS2, name: "TCH/F+SACCH" },
    Multiframe { pchan: Pchan::TchF, slotmask: 0x88, period: 104, frames: &FRAME_TCHF_TS3, name: "TCH/F+SACCH" },
    Multiframe { pchan: Pchan::Pdch, slotmask: 0xff, period: 104, frames: &FRAME_PDCH, name: "PDTCH+PACCH+PTCCH" },
];
