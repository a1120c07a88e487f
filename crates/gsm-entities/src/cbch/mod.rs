//! Cell broadcast channel (3GPP TS 44.012)
//!
//! SMS-CB messages of up to four 22 byte blocks are queued per CBCH flavour and
//! sent one block per 51-multiframe. TB = (fn / 51) % 8 selects the basic CBCH
//! for TB 0..3 and the extended one for TB 4..7. A message starts at TB 0 or 4.

use std::collections::VecDeque;

use gsm_core::FrameNumber;
use gsm_saps::cb::{CbCmdType, CbSmsCmd};
use thiserror::Error;

use crate::codec::{GSM_MACBLOCK_LEN, GSM_MACBLOCK_PADDING};

/// Payload bytes per CBCH block, after the block type octet
pub const CBCH_BLOCK_PAYLOAD: usize = GSM_MACBLOCK_LEN - 1;
/// Blocks per SMS-CB message
pub const CBCH_MAX_BLOCKS: usize = 4;
/// Messages waiting per CBCH flavour before new ones are rejected
pub const CBCH_QUEUE_MAX: usize = 15;

/// Block type octet: LPD 01, last block flag, sequence number
const LPD: u8 = 0x20;
const LAST_BLOCK: u8 = 0x10;
const SEQ_NULL_MSG: u8 = 0x0f;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CbchErr {
    #[error("empty SMS-CB message")]
    EmptyMessage,
    #[error("SMS-CB message of {len} bytes does not fit in {max} bytes", max = CBCH_MAX_BLOCKS * CBCH_BLOCK_PAYLOAD)]
    MessageTooLong { len: usize },
    #[error("CBCH queue full")]
    QueueFull,
}

#[derive(Debug, Clone)]
struct SmscbMsg {
    blocks: Vec<[u8; CBCH_BLOCK_PAYLOAD]>,
}

impl SmscbMsg {
    fn from_bytes(msg: &[u8]) -> Result<Self, CbchErr> {
        if msg.is_empty() {
            return Err(CbchErr::EmptyMessage);
        }
        if msg.len() > CBCH_MAX_BLOCKS * CBCH_BLOCK_PAYLOAD {
            return Err(CbchErr::MessageTooLong { len: msg.len() });
        }
        let blocks = msg
            .chunks(CBCH_BLOCK_PAYLOAD)
            .map(|chunk| {
                let mut block = [GSM_MACBLOCK_PADDING; CBCH_BLOCK_PAYLOAD];
                block[..chunk.len()].copy_from_slice(chunk);
                block
            })
            .collect();
        Ok(Self { blocks })
    }
}

/// Queue and scheduling state of one CBCH flavour
#[derive(Debug, Default)]
struct CbchQueue {
    queue: VecDeque<SmscbMsg>,
    default: Option<SmscbMsg>,
    /// Message being sent in the current four block cycle
    cur: Option<SmscbMsg>,
}

impl CbchQueue {
    fn cmd(&mut self, cmd_type: CbCmdType, msg: &[u8]) -> Result<(), CbchErr> {
        match cmd_type {
            CbCmdType::Normal | CbCmdType::Schedule => {
                let m = SmscbMsg::from_bytes(msg)?;
                if self.queue.len() >= CBCH_QUEUE_MAX {
                    return Err(CbchErr::QueueFull);
                }
                self.queue.push_back(m);
            }
            CbCmdType::Default => {
                self.default = Some(SmscbMsg::from_bytes(msg)?);
            }
            CbCmdType::Null => {
                self.default = None;
            }
        }
        Ok(())
    }

    fn next_block(&mut self, block_nr: usize) -> [u8; GSM_MACBLOCK_LEN] {
        if block_nr == 0 {
            self.cur = self.queue.pop_front().or_else(|| self.default.clone());
        }

        let Some(msg) = &self.cur else {
            return null_block();
        };
        let Some(payload) = msg.blocks.get(block_nr) else {
            return null_block();
        };

        let mut out = [0u8; GSM_MACBLOCK_LEN];
        out[0] = LPD | block_nr as u8;
        if block_nr + 1 == msg.blocks.len() {
            out[0] |= LAST_BLOCK;
        }
        out[1..].copy_from_slice(payload);
        out
    }
}

/// Block sent when no message is scheduled
pub fn null_block() -> [u8; GSM_MACBLOCK_LEN] {
    let mut out = [GSM_MACBLOCK_PADDING; GSM_MACBLOCK_LEN];
    out[0] = LPD | SEQ_NULL_MSG;
    out
}

/// SMS cell broadcast state of the cell
#[derive(Debug, Default)]
pub struct Cbch {
    basic: CbchQueue,
    extended: CbchQueue,
}

impl Cbch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a message or changes the default message
    pub fn cmd(&mut self, cmd: &CbSmsCmd) -> Result<(), CbchErr> {
        tracing::debug!("cbch cmd: {:?} extended={} {} bytes", cmd.cmd_type, cmd.extended, cmd.msg.len());
        let q = if cmd.extended { &mut self.extended } else { &mut self.basic };
        q.cmd(cmd.cmd_type, &cmd.msg)
    }

    /// Number of messages waiting on the basic and extended CBCH
    pub fn queue_len(&self) -> (usize, usize) {
        (self.basic.queue.len(), self.extended.queue.len())
    }

    /// Block to send on the CBCH block starting at `fn_`
    pub fn next_block(&mut self, fn_: FrameNumber) -> [u8; GSM_MACBLOCK_LEN] {
        let tb = (fn_.value() / 51) % 8;
        let block_nr = (tb % 4) as usize;
        let block = if tb < 4 { self.basic.next_block(block_nr) } else { self.extended.next_block(block_nr) };
        tracing::trace!(frame = %fn_, "cbch next_block: tb {} {:02x?}", tb, block);
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(cmd_type: CbCmdType, extended: bool, msg: Vec<u8>) -> CbSmsCmd {
        CbSmsCmd { cmd_type, extended, msg }
    }

    fn fn_for_tb(tb: u32) -> FrameNumber {
        FrameNumber::new(51 * tb + 8 * 51 * 3)
    }

    #[test]
    fn test_null_when_idle() {
        let mut cbch = Cbch::new();
        for tb in 0..8 {
            let b = cbch.next_block(fn_for_tb(tb));
            assert_eq!(b[0], 0x2f);
            assert!(b[1..].iter().all(|x| *x == 0x2b));
        }
    }

    #[test]
    fn test_message_blocks() {
        let mut cbch = Cbch::new();
        let msg: Vec<u8> = (0..88).map(|i| i as u8).collect();
        cbch.cmd(&cmd(CbCmdType::Normal, false, msg.clone())).unwrap();

        for tb in 0..4u32 {
            let b = cbch.next_block(fn_for_tb(tb));
            let lb = if tb == 3 { 0x10 } else { 0 };
            assert_eq!(b[0], 0x20 | lb | tb as u8);
            assert_eq!(&b[1..], &msg[tb as usize * 22..(tb as usize + 1) * 22]);
        }
        // Sent once only
        assert_eq!(cbch.next_block(fn_for_tb(8))[0], 0x2f);
    }

    #[test]
    fn test_short_message_padded() {
        let mut cbch = Cbch::new();
        cbch.cmd(&cmd(CbCmdType::Schedule, false, vec![0xaa; 30])).unwrap();
        let b0 = cbch.next_block(fn_for_tb(0));
        assert_eq!(b0[0], 0x20);
        let b1 = cbch.next_block(fn_for_tb(1));
        assert_eq!(b1[0], 0x31);
        assert_eq!(&b1[1..9], &[0xaa; 8]);
        assert!(b1[9..].iter().all(|x| *x == 0x2b));
        // No third block
        assert_eq!(cbch.next_block(fn_for_tb(2))[0], 0x2f);
    }

    #[test]
    fn test_extended_and_default() {
        let mut cbch = Cbch::new();
        cbch.cmd(&cmd(CbCmdType::Default, false, vec![0x11; 22])).unwrap();
        cbch.cmd(&cmd(CbCmdType::Normal, true, vec![0x22; 22])).unwrap();
        assert_eq!(cbch.queue_len(), (0, 1));

        // Basic sends the default message, extended its queued one
        assert_eq!(cbch.next_block(fn_for_tb(0))[1], 0x11);
        assert_eq!(cbch.next_block(fn_for_tb(4))[1], 0x22);
        assert_eq!(cbch.next_block(fn_for_tb(8))[1], 0x11);
        assert_eq!(cbch.next_block(fn_for_tb(12))[0], 0x2f);

        cbch.cmd(&cmd(CbCmdType::Null, false, Vec::new())).unwrap();
        assert_eq!(cbch.next_block(fn_for_tb(16))[0], 0x2f);
    }

    #[test]
    fn test_rejects_bad_commands() {
        let mut cbch = Cbch::new();
        assert_eq!(cbch.cmd(&cmd(CbCmdType::Normal, false, vec![])), Err(CbchErr::EmptyMessage));
        assert_eq!(cbch.cmd(&cmd(CbCmdType::Normal, false, vec![0; 89])), Err(CbchErr::MessageTooLong { len: 89 }));
        for _ in 0..CBCH_QUEUE_MAX {
            cbch.cmd(&cmd(CbCmdType::Normal, false, vec![1; 22])).unwrap();
        }
        assert_eq!(cbch.cmd(&cmd(CbCmdType::Normal, false, vec![1; 22])), Err(CbchErr::QueueFull));
    }
}
