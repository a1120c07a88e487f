use core::fmt::Display;

use gsm_core::FrameNumber;
use gsm_core::Sap;
use gsm_core::gsm_entities::GsmEntity;

use super::cb::*;
use super::mph::*;
use super::ph::*;
use super::trx::*;

/// Exhaustive list of primitives that can be carried in a SapMsg
#[derive(Debug)]
pub enum SapMsgInner {
    // TRX-SAP
    TrxBurstInd(TrxBurstInd),
    TrxBurstReq(TrxBurstReq),

    // PH-SAP
    PhRtsInd(PhRtsInd),
    PhDataReq(PhDataReq),
    PhDataInd(PhDataInd),
    PhTchReq(PhTchReq),
    PhTchInd(PhTchInd),
    PhRachInd(PhRachInd),

    // MPH-SAP
    MphActivateReq(MphActivateReq),
    MphModeReq(MphModeReq),
    MphCipherReq(MphCipherReq),
    MphSetPchanReq(MphSetPchanReq),
    MphConf(MphConf),
    MphErrorInd(MphErrorInd),

    // CB-SAP
    CbSmsCmd(CbSmsCmd),
}

impl Display for SapMsgInner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            // TRX-SAP
            SapMsgInner::TrxBurstInd(_) => write!(f, "TrxBurstInd"),
            SapMsgInner::TrxBurstReq(_) => write!(f, "TrxBurstReq"),

            // PH-SAP
            SapMsgInner::PhRtsInd(_) => write!(f, "PhRtsInd"),
            SapMsgInner::PhDataReq(_) => write!(f, "PhDataReq"),
            SapMsgInner::PhDataInd(_) => write!(f, "PhDataInd"),
            SapMsgInner::PhTchReq(_) => write!(f, "PhTchReq"),
            SapMsgInner::PhTchInd(_) => write!(f, "PhTchInd"),
            SapMsgInner::PhRachInd(_) => write!(f, "PhRachInd"),

            // MPH-SAP
            SapMsgInner::MphActivateReq(_) => write!(f, "MphActivateReq"),
            SapMsgInner::MphModeReq(_) => write!(f, "MphModeReq"),
            SapMsgInner::MphCipherReq(_) => write!(f, "MphCipherReq"),
            SapMsgInner::MphSetPchanReq(_) => write!(f, "MphSetPchanReq"),
            SapMsgInner::MphConf(_) => write!(f, "MphConf"),
            SapMsgInner::MphErrorInd(_) => write!(f, "MphErrorInd"),

            // CB-SAP
            SapMsgInner::CbSmsCmd(_) => write!(f, "CbSmsCmd"),
        }
    }
}

#[derive(Debug)]
pub struct SapMsg {
    pub sap: Sap,
    pub src: GsmEntity,
    pub dest: GsmEntity,
    /// Downlink frame number at the time the message was created
    pub dltime: FrameNumber,

    pub msg: SapMsgInner,
}

impl SapMsg {
    pub fn new(
        sap: Sap,
        src: GsmEntity,
        dest: GsmEntity,
        t_submit: FrameNumber,
        msg: SapMsgInner,
    ) -> Self {
        Self {
            sap,
            src,
            dest,
            dltime: t_submit,
            msg,
        }
    }

    pub fn get_source(&self) -> &GsmEntity {
        &self.src
    }
    pub fn get_dest(&self) -> &GsmEntity {
        &self.dest
    }
    pub fn get_sap(&self) -> &Sap {
        &self.sap
    }
}
