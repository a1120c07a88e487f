/// Type of an SMS cell broadcast command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbCmdType {
    /// Broadcast the message once
    Normal,
    /// Schedule message, sent like a normal message
    Schedule,
    /// Replace the default message, sent whenever nothing else is queued
    Default,
    /// Clear the default message
    Null,
}

/// SMS broadcast command from the cell broadcast centre
#[derive(Debug, Clone)]
pub struct CbSmsCmd {
    pub cmd_type: CbCmdType,
    /// Extended CBCH (TB 4..7) instead of the basic one (TB 0..3)
    pub extended: bool,
    /// Up to 4 blocks of 22 bytes
    pub msg: Vec<u8>,
}
