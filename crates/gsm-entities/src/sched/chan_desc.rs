use gsm_core::{ChanNr, LID_DEDIC, LID_SACCH, LinkId};

/// Logical channel types that can appear in a multiframe layout.
/// Each one has its own `ChanState` per timeslot.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChanType {
    Idle = 0,
    Fcch,
    Sch,
    Bcch,
    Rach,
    Ccch,
    TchF,
    Sdcch4_0,
    Sdcch4_1,
    Sdcch4_2,
    Sdcch4_3,
    Sdcch8_0,
    Sdcch8_1,
    Sdcch8_2,
    Sdcch8_3,
    Sdcch8_4,
    Sdcch8_5,
    Sdcch8_6,
    Sdcch8_7,
    SacchTF,
    Sacch4_0,
    Sacch4_1,
    Sacch4_2,
    Sacch4_3,
    Sacch8_0,
    Sacch8_1,
    Sacch8_2,
    Sacch8_3,
    Sacch8_4,
    Sacch8_5,
    Sacch8_6,
    Sacch8_7,
    Pdtch,
    Ptcch,
    Cbch,
}

pub const NUM_CHAN_TYPES: usize = ChanType::Cbch as usize + 1;

impl ChanType {
    pub const ALL: [ChanType; NUM_CHAN_TYPES] = [
        ChanType::Idle, ChanType::Fcch, ChanType::Sch, ChanType::Bcch, ChanType::Rach, ChanType::Ccch, ChanType::TchF,
        ChanType::Sdcch4_0, ChanType::Sdcch4_1, ChanType::Sdcch4_2, ChanType::Sdcch4_3,
        ChanType::Sdcch8_0, ChanType::Sdcch8_1, ChanType::Sdcch8_2, ChanType::Sdcch8_3,
        ChanType::Sdcch8_4, ChanType::Sdcch8_5, ChanType::Sdcch8_6, ChanType::Sdcch8_7,
        ChanType::SacchTF,
        ChanType::Sacch4_0, ChanType::Sacch4_1, ChanType::Sacch4_2, ChanType::Sacch4_3,
        ChanType::Sacch8_0, ChanType::Sacch8_1, ChanType::Sacch8_2, ChanType::Sacch8_3,
        ChanType::Sacch8_4, ChanType::Sacch8_5, ChanType::Sacch8_6, ChanType::Sacch8_7,
        ChanType::Pdtch, ChanType::Ptcch, ChanType::Cbch,
    ];

    #[inline(always)]
    pub fn idx(self) -> usize {
        self as usize
    }

    #[inline(always)]
    pub fn desc(self) -> &'static ChanDesc {
        &CHAN_DESC[self as usize]
    }

    pub fn is_sacch(self) -> bool {
        self.desc().link_id == LID_SACCH
    }

    /// Always treated as active, independent of activation requests
    pub fn is_auto_active(self) -> bool {
        self.desc().flags & CHAN_FLAG_AUTO_ACTIVE != 0
    }

    /// Belongs to a packet data channel, upward traffic goes to the PCU
    pub fn is_pdch(self) -> bool {
        self.desc().flags & CHAN_FLAG_PDCH != 0
    }
}

/// Downlink burst producer of a channel family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxHandler {
    None,
    Idle,
    Fcch,
    Sch,
    Data,
    Pdtch,
    TchF,
}

/// Uplink burst consumer of a channel family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxHandler {
    None,
    Rach,
    Data,
    Pdtch,
    TchF,
}

pub const CHAN_FLAG_AUTO_ACTIVE: u8 = 1 << 0;
pub const CHAN_FLAG_PDCH: u8 = 1 << 1;

/// Static properties of a logical channel type
#[derive(Debug)]
pub struct ChanDesc {
    pub name: &'static str,
    /// RSL channel number type bits, the timeslot is ORed in at runtime
    pub chan_nr: ChanNr,
    pub link_id: LinkId,
    pub flags: u8,
    pub tx: TxHandler,
    pub rx: RxHandler,
}

pub const RSL_CHAN_BM_ACCHS: ChanNr = 0x08;
pub const RSL_CHAN_SDCCH4_ACCH: ChanNr = 0x20;
pub const RSL_CHAN_SDCCH8_ACCH: ChanNr = 0x40;
pub const RSL_CHAN_BCCH: ChanNr = 0x80;
pub const RSL_CHAN_RACH: ChanNr = 0x88;
pub const RSL_CHAN_PCH_AGCH: ChanNr = 0x90;
pub const RSL_CHAN_OSMO_PDCH: ChanNr = 0xc0;
pub const RSL_CHAN_OSMO_CBCH4: ChanNr = 0xc8;

const fn d(name: &'static str, chan_nr: ChanNr, link_id: LinkId, flags: u8, tx: TxHandler, rx: RxHandler) -> ChanDesc {
    ChanDesc { name, chan_nr, link_id, flags, tx, rx }
}

const AUTO: u8 = CHAN_FLAG_AUTO_ACTIVE;
const SDCCH4: ChanNr = RSL_CHAN_SDCCH4_ACCH;
const SDCCH8: ChanNr = RSL_CHAN_SDCCH8_ACCH;

pub static CHAN_DESC: [ChanDesc; NUM_CHAN_TYPES] = [
    d("IDLE", 0, LID_DEDIC, 0, TxHandler::Idle, RxHandler::None),
    d("FCCH", RSL_CHAN_BCCH, LID_DEDIC, AUTO, TxHandler::Fcch, RxHandler::None),
    d("SCH", RSL_CHAN_BCCH, LID_DEDIC, AUTO, TxHandler::Sch, RxHandler::None),
    d("BCCH", RSL_CHAN_BCCH, LID_DEDIC, AUTO, TxHandler::Data, RxHandler::None),
    d("RACH", RSL_CHAN_RACH, LID_DEDIC, AUTO, TxHandler::None, RxHandler::Rach),
    d("CCCH", RSL_CHAN_PCH_AGCH, LID_DEDIC, AUTO, TxHandler::Data, RxHandler::None),
    d("TCH/F", RSL_CHAN_BM_ACCHS, LID_DEDIC, 0, TxHandler::TchF, RxHandler::TchF),
    d("SDCCH/4(0)", SDCCH4, LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SDCCH/4(1)", SDCCH4 + (1 << 3), LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SDCCH/4(2)", SDCCH4 + (2 << 3), LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SDCCH/4(3)", SDCCH4 + (3 << 3), LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SDCCH/8(0)", SDCCH8, LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SDCCH/8(1)", SDCCH8 + (1 << 3), LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SDCCH/8(2)", SDCCH8 + (2 << 3), LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SDCCH/8(3)", SDCCH8 + (3 << 3), LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SDCCH/8(4)", SDCCH8 + (4 << 3), LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SDCCH/8(5)", SDCCH8 + (5 << 3), LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SDCCH/8(6)", SDCCH8 + (6 << 3), LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SDCCH/8(7)", SDCCH8 + (7 << 3), LID_DEDIC, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/TF", RSL_CHAN_BM_ACCHS, LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/4(0)", SDCCH4, LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/4(1)", SDCCH4 + (1 << 3), LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/4(2)", SDCCH4 + (2 << 3), LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/4(3)", SDCCH4 + (3 << 3), LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/8(0)", SDCCH8, LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/8(1)", SDCCH8 + (1 << 3), LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/8(2)", SDCCH8 + (2 << 3), LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/8(3)", SDCCH8 + (3 << 3), LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/8(4)", SDCCH8 + (4 << 3), LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/8(5)", SDCCH8 + (5 << 3), LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/8(6)", SDCCH8 + (6 << 3), LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("SACCH/8(7)", SDCCH8 + (7 << 3), LID_SACCH, 0, TxHandler::Data, RxHandler::Data),
    d("PDTCH", RSL_CHAN_OSMO_PDCH, LID_DEDIC, CHAN_FLAG_PDCH, TxHandler::Pdtch, RxHandler::Pdtch),
    d("PTCCH", RSL_CHAN_OSMO_PDCH, LID_DEDIC, CHAN_FLAG_PDCH, TxHandler::Data, RxHandler::Rach),
    d("CBCH", RSL_CHAN_OSMO_CBCH4, LID_DEDIC, AUTO, TxHandler::Data, RxHandler::None),
];
