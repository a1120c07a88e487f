use gsm_core::{FrameNumber, ModType, Sbit, Ubit};
use gsm_saps::mph::enums::{RslCmode, TchMode};
use gsm_saps::ph::UlMeas;
use gsm_saps::trx::TrxBurstInd;

use crate::codec::BitErrors;

use super::SchedErr;

/// Running sums of the per-burst measurements of one uplink block
#[derive(Debug, Clone, Default)]
pub struct MeasAcc {
    rssi_sum: i32,
    rssi_num: u8,
    toa256_sum: i32,
    toa_num: u8,
    ci_cb_sum: i32,
    ci_cb_num: u8,
}

impl MeasAcc {
    pub fn reset(&mut self) {
        *self = MeasAcc::default();
    }

    pub fn add(&mut self, bi: &TrxBurstInd) {
        self.rssi_sum += bi.rssi as i32;
        self.rssi_num += 1;
        self.toa256_sum += bi.toa256 as i32;
        self.toa_num += 1;
        if let Some(ci) = bi.ci_cb {
            self.ci_cb_sum += ci as i32;
            self.ci_cb_num += 1;
        }
    }

    /// Averages over the bursts seen so far. Empty sums give zero.
    pub fn average(&self, errors: BitErrors) -> UlMeas {
        fn avg(sum: i32, num: u8) -> i32 {
            if num == 0 { 0 } else { sum / num as i32 }
        }
        UlMeas {
            rssi: avg(self.rssi_sum, self.rssi_num) as i8,
            toa256: avg(self.toa256_sum, self.toa_num) as i16,
            lqual_cb: avg(self.ci_cb_sum, self.ci_cb_num) as i16,
            ber10k: errors.ber10k(),
            n_bits_total: errors.n_bits_total.min(u16::MAX as u32) as u16,
            n_errors: errors.n_errors.min(u16::MAX as u32) as u16,
        }
    }
}

/// AMR codec set and in-band signalling state of one channel
#[derive(Debug, Clone, Default)]
pub struct AmrState {
    /// Active codec set, codec modes 0..=7, at most 4 entries
    pub codecs: Vec<u8>,
    /// Index into `codecs` of the last received uplink frame
    pub ul_ft: u8,
    /// Index into `codecs` used for downlink speech
    pub dl_ft: u8,
    /// Last mode request received from the MS
    pub ul_cmr: u8,
    /// Mode request sent to the MS
    pub dl_cmr: u8,
}

/// Channel mode, set as a whole by a mode request
#[derive(Debug, Clone, Default)]
pub struct ModeCfg {
    pub rsl_cmode: RslCmode,
    pub tch_mode: TchMode,
    pub codecs: Vec<u8>,
    pub initial_id: u8,
}

/// State of one logical channel on one timeslot
#[derive(Debug, Default)]
pub struct ChanState {
    pub active: bool,

    /// Downlink burst buffer, kept between the bursts of a block
    dl_bursts: Option<Vec<Ubit>>,
    /// False once the buffer content must not be sent anymore
    dl_valid: bool,
    pub dl_mod: ModType,

    /// Uplink reassembly buffer
    ul_bursts: Option<Vec<Sbit>>,
    /// First frame of the block currently being received
    pub ul_first_fn: FrameNumber,
    /// First frame of the previous block (TCH)
    pub ul_prev_first_fn: FrameNumber,
    /// Bit n set when burst n of the block was received
    pub ul_mask: u8,
    /// Set on bid 0, cleared when the block is decoded or dropped
    pub ul_block_open: bool,
    pub meas: MeasAcc,

    /// Consecutive blocks without a decodable frame
    pub lost_frames: u8,
    /// Last uplink frame handed to this channel
    pub last_tdma_fn: Option<FrameNumber>,
    pub proc_tdma_fs: u32,
    pub lost_tdma_fs: u32,

    pub rsl_cmode: RslCmode,
    pub tch_mode: TchMode,
    pub amr: AmrState,

    /// A5/1 key per direction, None when ciphering is off
    pub ul_cipher: Option<[u8; 8]>,
    pub dl_cipher: Option<[u8; 8]>,

    pending_mode: Option<ModeCfg>,
    pending_ul_cipher: Option<Option<[u8; 8]>>,
    pending_dl_cipher: Option<Option<[u8; 8]>>,
}

fn alloc<T: Clone + Default>(len: usize) -> Result<Vec<T>, SchedErr> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| SchedErr::NoMemory)?;
    v.resize(len, T::default());
    Ok(v)
}

impl ChanState {
    /// Starts a fresh activation, all block and mode state cleared
    pub fn activate(&mut self) {
        *self = ChanState { active: true, ..Default::default() };
    }

    /// Stops the channel and drops its buffers, including any partially received block
    pub fn deactivate(&mut self) {
        self.active = false;
        self.release_buffers();
    }

    /// Frees both burst buffers; the only place they are dropped
    pub fn release_buffers(&mut self) {
        self.dl_bursts = None;
        self.dl_valid = false;
        self.ul_bursts = None;
        self.ul_mask = 0;
        self.ul_block_open = false;
    }

    pub fn has_dl_buf(&self) -> bool {
        self.dl_bursts.is_some()
    }

    /// Returns the downlink buffer, allocating `len` zeroed bits on first use
    pub fn dl_buf_alloc(&mut self, len: usize) -> Result<&mut [Ubit], SchedErr> {
        if self.dl_bursts.as_ref().is_none_or(|b| b.len() != len) {
            self.dl_bursts = Some(alloc(len)?);
        }
        self.dl_valid = true;
        self.dl_bursts.as_deref_mut().ok_or(SchedErr::NoMemory)
    }

    /// Downlink buffer, if it holds something to send
    pub fn dl_buf(&self) -> Option<&[Ubit]> {
        if self.dl_valid { self.dl_bursts.as_deref() } else { None }
    }

    /// Downlink buffer regardless of validity, for carrying over interleaved halves
    pub fn dl_buf_raw_mut(&mut self) -> Option<&mut [Ubit]> {
        self.dl_bursts.as_deref_mut()
    }

    pub fn dl_invalidate(&mut self) {
        self.dl_valid = false;
    }

    /// Returns the uplink buffer, allocating `len` erased soft bits on first use
    pub fn ul_buf_alloc(&mut self, len: usize) -> Result<&mut [Sbit], SchedErr> {
        if self.ul_bursts.as_ref().is_none_or(|b| b.len() != len) {
            self.ul_bursts = Some(alloc(len)?);
        }
        self.ul_bursts.as_deref_mut().ok_or(SchedErr::NoMemory)
    }

    pub fn ul_buf(&self) -> Option<&[Sbit]> {
        self.ul_bursts.as_deref()
    }

    /// Sets the channel mode. Applies at the next block boundary while the channel runs.
    pub fn set_mode(&mut self, mode: ModeCfg) {
        if self.active {
            self.pending_mode = Some(mode);
        } else {
            self.apply_mode(mode);
        }
    }

    /// Sets the cipher key of one direction, None disables ciphering.
    /// Applies at the next block boundary while the channel runs.
    pub fn set_cipher(&mut self, downlink: bool, key: Option<[u8; 8]>) {
        if !self.active {
            if downlink { self.dl_cipher = key } else { self.ul_cipher = key }
            return;
        }
        if downlink {
            self.pending_dl_cipher = Some(key);
        } else {
            self.pending_ul_cipher = Some(key);
        }
    }

    /// Applies pending mode and cipher changes, called at bid 0 in either direction
    pub fn apply_pending(&mut self) {
        if let Some(mode) = self.pending_mode.take() {
            self.apply_mode(mode);
        }
        if let Some(key) = self.pending_dl_cipher.take() {
            self.dl_cipher = key;
        }
        if let Some(key) = self.pending_ul_cipher.take() {
            self.ul_cipher = key;
        }
    }

    fn apply_mode(&mut self, mode: ModeCfg) {
        tracing::debug!("apply_mode: {:?} {:?} codecs={:?} initial_id={}", mode.rsl_cmode, mode.tch_mode, mode.codecs, mode.initial_id);
        self.rsl_cmode = mode.rsl_cmode;
        self.tch_mode = mode.tch_mode;
        self.amr = AmrState {
            codecs: mode.codecs,
            ul_ft: mode.initial_id,
            dl_ft: mode.initial_id,
            ul_cmr: mode.initial_id,
            dl_cmr: mode.initial_id,
        };
    }

    /// Opens a new uplink block of `len` soft bits starting at `fn_`
    pub fn ul_block_start(&mut self, fn_: FrameNumber, len: usize) -> Result<(), SchedErr> {
        let buf = self.ul_buf_alloc(len)?;
        buf.fill(0);
        self.ul_mask = 0;
        self.meas.reset();
        self.ul_first_fn = fn_;
        self.ul_block_open = true;
        Ok(())
    }
}
