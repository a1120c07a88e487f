//! A5/1 stream cipher and burst level ciphering.
//!
//! Register layout and key loading follow the public reference description:
//! three LFSRs of 19, 22 and 23 bits with majority clocking.

use gsm_core::{FrameNumber, GSM_BURST_LEN, Sbit, Ubit};

/// Keystream bits per burst and direction
pub const A5_BURST_BITS: usize = 114;

const R1_MASK: u32 = 0x07ffff;
const R2_MASK: u32 = 0x3fffff;
const R3_MASK: u32 = 0x7fffff;

const R1_MID: u32 = 0x000100;
const R2_MID: u32 = 0x000400;
const R3_MID: u32 = 0x000400;

const R1_TAPS: u32 = 0x072000;
const R2_TAPS: u32 = 0x300000;
const R3_TAPS: u32 = 0x700080;

const R1_OUT: u32 = 0x040000;
const R2_OUT: u32 = 0x200000;
const R3_OUT: u32 = 0x400000;

#[inline(always)]
fn parity(x: u32) -> u32 {
    x.count_ones() & 1
}

#[inline(always)]
fn clock_one(reg: u32, mask: u32, taps: u32) -> u32 {
    let feedback = parity(reg & taps);
    ((reg << 1) & mask) | feedback
}

struct A51 {
    r1: u32,
    r2: u32,
    r3: u32,
}

impl A51 {
    fn new(key: &[u8; 8], count: u32) -> Self {
        let mut s = A51 { r1: 0, r2: 0, r3: 0 };
        for i in 0..64 {
            s.clock_all();
            let bit = ((key[i / 8] >> (i & 7)) & 1) as u32;
            s.xor_in(bit);
        }
        for i in 0..22 {
            s.clock_all();
            s.xor_in((count >> i) & 1);
        }
        for _ in 0..100 {
            s.clock_majority();
        }
        s
    }

    fn xor_in(&mut self, bit: u32) {
        self.r1 ^= bit;
        self.r2 ^= bit;
        self.r3 ^= bit;
    }

    fn clock_all(&mut self) {
        self.r1 = clock_one(self.r1, R1_MASK, R1_TAPS);
        self.r2 = clock_one(self.r2, R2_MASK, R2_TAPS);
        self.r3 = clock_one(self.r3, R3_MASK, R3_TAPS);
    }

    fn clock_majority(&mut self) {
        let m1 = parity(self.r1 & R1_MID);
        let m2 = parity(self.r2 & R2_MID);
        let m3 = parity(self.r3 & R3_MID);
        let maj = (m1 + m2 + m3 >= 2) as u32;
        if m1 == maj {
            self.r1 = clock_one(self.r1, R1_MASK, R1_TAPS);
        }
        if m2 == maj {
            self.r2 = clock_one(self.r2, R2_MASK, R2_TAPS);
        }
        if m3 == maj {
            self.r3 = clock_one(self.r3, R3_MASK, R3_TAPS);
        }
    }

    fn output(&self) -> Ubit {
        (parity(self.r1 & R1_OUT) ^ parity(self.r2 & R2_OUT) ^ parity(self.r3 & R3_OUT)) as Ubit
    }

    fn fill(&mut self, out: &mut [Ubit; A5_BURST_BITS]) {
        for b in out.iter_mut() {
            self.clock_majority();
            *b = self.output();
        }
    }
}

/// Generates the downlink and uplink keystream for one TDMA frame
pub fn a5_1(key: &[u8; 8], count: u32) -> ([Ubit; A5_BURST_BITS], [Ubit; A5_BURST_BITS]) {
    let mut lfsr = A51::new(key, count);
    let mut dl = [0u8; A5_BURST_BITS];
    let mut ul = [0u8; A5_BURST_BITS];
    lfsr.fill(&mut dl);
    lfsr.fill(&mut ul);
    (dl, ul)
}

/// 22 bit COUNT input: T1 (11 bits), T3 (6 bits), T2 (5 bits)
pub fn a5_count(fn_: FrameNumber) -> u32 {
    (fn_.t1() << 11) | (fn_.t3() << 5) | fn_.t2()
}

/// Burst positions of the two 57 bit ciphered data fields; stealing flags stay clear
const DATA_FIELDS: [(usize, usize); 2] = [(3, 60), (88, 145)];

/// Ciphers the data fields of a hard bit normal burst in place
pub fn cipher_burst(burst: &mut [Ubit], ks: &[Ubit; A5_BURST_BITS]) {
    debug_assert!(burst.len() >= GSM_BURST_LEN);
    let mut k = 0;
    for (start, end) in DATA_FIELDS {
        for b in burst[start..end].iter_mut() {
            *b ^= ks[k];
            k += 1;
        }
    }
}

/// Deciphers the data fields of a soft bit normal burst in place
pub fn decipher_burst(burst: &mut [Sbit], ks: &[Ubit; A5_BURST_BITS]) {
    debug_assert!(burst.len() >= GSM_BURST_LEN);
    let mut k = 0;
    for (start, end) in DATA_FIELDS {
        for s in burst[start..end].iter_mut() {
            if ks[k] != 0 {
                *s = s.saturating_neg();
            }
            k += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use gsm_core::bits::pack_msb;

    use super::*;

    #[test]
    fn test_reference_vector() {
        let key = [0x12, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef];
        let (dl, ul) = a5_1(&key, 0x134);

        let mut a_to_b = [0u8; 15];
        let mut b_to_a = [0u8; 15];
        pack_msb(&dl, &mut a_to_b, 0, 114);
        pack_msb(&ul, &mut b_to_a, 0, 114);
        assert_eq!(a_to_b, [0x53, 0x4e, 0xaa, 0x58, 0x2f, 0xe8, 0x15, 0x1a, 0xb6, 0xe1, 0x85, 0x5a, 0x72, 0x8c, 0x00]);
        assert_eq!(b_to_a, [0x24, 0xfd, 0x35, 0xa3, 0x5d, 0x5f, 0xb6, 0x52, 0x6d, 0x32, 0xf9, 0x06, 0xdf, 0x1a, 0xc0]);
    }

    #[test]
    fn test_count_layout() {
        let fn_ = FrameNumber::new(26 * 51 * 3 + 100);
        let count = a5_count(fn_);
        assert_eq!(count >> 11, 3);
        assert_eq!((count >> 5) & 0x3f, fn_.t3());
        assert_eq!(count & 0x1f, fn_.t2());
    }

    #[test]
    fn test_cipher_roundtrip_soft() {
        let key = [1, 2, 3, 4, 5, 6, 7, 8];
        let (dl, _) = a5_1(&key, a5_count(FrameNumber::new(4242)));

        let plain: Vec<u8> = (0..148).map(|i| ((i * 5) % 3 == 0) as u8).collect();
        let mut ciphered = plain.clone();
        cipher_burst(&mut ciphered, &dl);
        assert_ne!(ciphered, plain);
        assert_eq!(ciphered[60], plain[60]);
        assert_eq!(ciphered[87], plain[87]);

        let mut soft: Vec<i8> = ciphered.iter().map(|b| if *b != 0 { -100 } else { 100 }).collect();
        decipher_burst(&mut soft, &dl);
        let back: Vec<u8> = soft.iter().map(|s| (*s < 0) as u8).collect();
        assert_eq!(back, plain);
    }
}
