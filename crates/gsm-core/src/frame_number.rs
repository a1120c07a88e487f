use core::fmt;

/// Number of TDMA frames in a hyperframe. FN wraps back to 0 here.
/// Divisible by 26, 51, 102 and 104, so `fn % period` stays continuous across the wrap.
pub const GSM_HYPERFRAME: u32 = 2048 * 26 * 51;

/// Nominal duration of one TDMA frame in microseconds
pub const FRAME_DURATION_US: u64 = 4615;

/// Downlink primitives for frames further ahead than this are taken as stale
pub const MAX_FN_AHEAD: u32 = 100;

/// Difference between two int frame numbers, handling wrap-around of the hyperframe.
/// Result lies in [-GSM_HYPERFRAME/2, GSM_HYPERFRAME/2)
pub fn fn_int_diff(a: i64, b: i64) -> i32 {
    let wrap = GSM_HYPERFRAME as i64;
    let mut diff = a - b;
    while diff < -wrap / 2 { diff += wrap; }
    while diff >= wrap / 2 { diff -= wrap; }
    diff as i32
}

/// TDMA frame number, always kept in [0, GSM_HYPERFRAME)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameNumber(u32);

impl FrameNumber {
    pub fn new(fn_: u32) -> FrameNumber {
        FrameNumber(fn_ % GSM_HYPERFRAME)
    }

    /// Converts a possibly negative or oversized int into a FrameNumber
    pub fn from_int(fn_: i64) -> FrameNumber {
        FrameNumber(fn_.rem_euclid(GSM_HYPERFRAME as i64) as u32)
    }

    #[inline(always)]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Add a (possibly negative) number of frames
    pub fn add(self, frames: i32) -> FrameNumber {
        FrameNumber::from_int(self.0 as i64 + frames as i64)
    }

    /// Next frame
    #[inline(always)]
    pub fn inc(self) -> FrameNumber {
        self.add(1)
    }

    /// Signed difference `self - b` in frames, the shortest way around the hyperframe
    pub fn diff(self, b: Self) -> i32 {
        fn_int_diff(self.0 as i64, b.0 as i64)
    }

    /// Age of this frame number compared to now
    #[inline(always)]
    pub fn age(self, now: FrameNumber) -> i32 {
        now.diff(self)
    }

    /// Position within a multiframe of the given period
    #[inline(always)]
    pub fn modulo(self, period: u32) -> u32 {
        self.0 % period
    }

    /// Superframe-based T1 field (fn / (26 * 51))
    pub fn t1(self) -> u32 {
        self.0 / (26 * 51)
    }

    /// T2 field, position in the 26-multiframe
    pub fn t2(self) -> u32 {
        self.0 % 26
    }

    /// T3 field, position in the 51-multiframe
    pub fn t3(self) -> u32 {
        self.0 % 51
    }
}

impl From<u32> for FrameNumber {
    fn from(v: u32) -> Self {
        FrameNumber::new(v)
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:7}", self.0)
    }
}

impl fmt::Debug for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn={}/{:02}/{:02}", self.0, self.t2(), self.t3())
    }
}
