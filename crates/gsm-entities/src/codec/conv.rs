// Convolutional codes and puncturing for GSM 05.03

use gsm_core::Ubit;

/// Description of a terminated rate 1/N convolutional code, optionally punctured.
///
/// Polynomials are bit masks where bit j is the coefficient of D^j, i.e. it taps the
/// register value that entered j steps ago. For recursive systematic codes `rgen`
/// holds the feedback polynomial, and an output whose generator equals `rgen` is the
/// systematic output.
#[derive(Debug)]
pub struct ConvCode {
    pub name: &'static str,
    /// Output bits per input bit
    pub n: usize,
    /// Constraint length
    pub k: usize,
    /// Input bits, excluding the K-1 tail bits
    pub len: usize,
    pub polys: &'static [u32],
    pub rgen: Option<u32>,
    /// Mother code positions that are not transmitted, ascending
    pub puncture: &'static [u16],
}

#[inline(always)]
fn parity(x: u32) -> u8 {
    (x.count_ones() & 1) as u8
}

impl ConvCode {
    /// Output length of the terminated mother code
    pub const fn mother_len(&self) -> usize {
        (self.len + self.k - 1) * self.n
    }

    /// Output length after puncturing
    pub const fn coded_len(&self) -> usize {
        self.mother_len() - self.puncture.len()
    }

    pub const fn num_states(&self) -> usize {
        1 << (self.k - 1)
    }

    /// One encoder step from `state` with input `u`.
    /// Returns the next state and the N output bits packed LSB first.
    #[inline]
    pub(crate) fn transition(&self, state: u32, u: Ubit) -> (u32, u32) {
        let mask = (1u32 << (self.k - 1)) - 1;
        let w = match self.rgen {
            Some(r) => u ^ parity(r & (state << 1)),
            None => u,
        } as u32;
        let reg = (state << 1) | w;

        let mut out = 0u32;
        for (i, g) in self.polys.iter().enumerate() {
            let bit = match self.rgen {
                Some(r) if *g == r => u as u32,
                _ => parity(g & reg) as u32,
            };
            out |= bit << i;
        }
        (reg & mask, out)
    }

    /// Input bit that drives the register towards the zero state during termination
    #[inline]
    pub(crate) fn tail_input(&self, state: u32) -> Ubit {
        match self.rgen {
            Some(r) => parity(r & (state << 1)),
            None => 0,
        }
    }

    /// Encodes `self.len` bits of `input` into `self.coded_len()` bits of `output`,
    /// terminating the trellis and applying the puncturing pattern.
    pub fn encode(&self, input: &[Ubit], output: &mut [Ubit]) {
        assert!(input.len() >= self.len, "{}: input too short", self.name);
        assert!(output.len() >= self.coded_len(), "{}: output too short", self.name);

        let mut state = 0;
        let mut mother_idx = 0;
        let mut punct_idx = 0;
        let mut out_idx = 0;

        for i in 0..self.len + self.k - 1 {
            let u = if i < self.len { input[i] & 1 } else { self.tail_input(state) };
            let (next, out) = self.transition(state, u);
            for j in 0..self.n {
                if punct_idx < self.puncture.len() && self.puncture[punct_idx] as usize == mother_idx {
                    punct_idx += 1;
                } else {
                    output[out_idx] = ((out >> j) & 1) as Ubit;
                    out_idx += 1;
                }
                mother_idx += 1;
            }
            state = next;
        }
    }
}

/// Rate 1/2, K=5 code of the control channels: G0 = 1 + D^3 + D^4, G1 = 1 + D + D^3 + D^4
const G0: u32 = 0x19;
const G1: u32 = 0x1b;
const G2: u32 = 0x15;
const G3: u32 = 0x1f;
const G4: u32 = 0x6d;
const G5: u32 = 0x53;
const G6: u32 = 0x5f;

const GEN_G0_G1: &[u32] = &[G0, G1];

/// 184 data bits + 40 bit fire code
pub static CONV_XCCH: ConvCode = ConvCode {
    name: "xcch", n: 2, k: 5, len: 224, polys: GEN_G0_G1, rgen: None, puncture: &[],
};

/// PDTCH CS-2: 6 USF precoded bits + 268 data bits + 16 bit CRC
pub static CONV_CS2: ConvCode = ConvCode {
    name: "cs2", n: 2, k: 5, len: 290, polys: GEN_G0_G1, rgen: None, puncture: &PUNCT_CS2,
};

/// PDTCH CS-3: 6 USF precoded bits + 312 data bits + 16 bit CRC
pub static CONV_CS3: ConvCode = ConvCode {
    name: "cs3", n: 2, k: 5, len: 334, polys: GEN_G0_G1, rgen: None, puncture: &PUNCT_CS3,
};

/// 8 bit RA + 6 bit CRC
pub static CONV_RACH: ConvCode = ConvCode {
    name: "rach", n: 2, k: 5, len: 14, polys: GEN_G0_G1, rgen: None, puncture: &[],
};

/// 25 bit SB info + 10 bit CRC
pub static CONV_SCH: ConvCode = ConvCode {
    name: "sch", n: 2, k: 5, len: 35, polys: GEN_G0_G1, rgen: None, puncture: &[],
};

/// 182 class 1 bits + 3 bit CRC
pub static CONV_TCH_FR: ConvCode = ConvCode {
    name: "tch_fr", n: 2, k: 5, len: 185, polys: GEN_G0_G1, rgen: None, puncture: &[],
};

const PUNCT_CS2: [u16; 132] = puncture_cs2();
const PUNCT_CS3: [u16; 220] = puncture_cs3();

/// Positions 3 + 4i for i in 3..=146, except every 12th starting at i = 9
const fn puncture_cs2() -> [u16; 132] {
    let mut out = [0u16; 132];
    let mut n = 0;
    let mut i = 3;
    while i <= 146 {
        if !(i >= 9 && (i - 9) % 12 == 0) {
            out[n] = (3 + 4 * i) as u16;
            n += 1;
        }
        i += 1;
    }
    out
}

/// Positions 3 + 6i and 5 + 6i for i in 2..=111
const fn puncture_cs3() -> [u16; 220] {
    let mut out = [0u16; 220];
    let mut n = 0;
    let mut i = 2;
    while i <= 111 {
        out[n] = (3 + 6 * i) as u16;
        out[n + 1] = (5 + 6 * i) as u16;
        n += 2;
        i += 1;
    }
    out
}

// TCH/AFS puncturing, positions in the unpunctured mother code

pub const PUNCT_AFS_12_2: [u16; 60] = [
    321, 325, 329, 333, 337, 341, 345, 349, 353, 357,
    361, 363, 365, 369, 373, 377, 379, 381, 385, 389,
    393, 395, 397, 401, 405, 409, 411, 413, 417, 421,
    425, 427, 429, 433, 437, 441, 443, 445, 449, 453,
    457, 459, 461, 465, 469, 473, 475, 477, 481, 485,
    489, 491, 493, 495, 497, 499, 501, 503, 505, 507,
];

pub const PUNCT_AFS_10_2: [u16; 194] = [
    1, 4, 7, 10, 16, 19, 22, 28, 31, 34, 40, 43, 46,
    52, 55, 58, 64, 67, 70, 76, 79, 82, 88, 91, 94, 100,
    103, 106, 112, 115, 118, 124, 127, 130, 136, 139, 142, 148, 151,
    154, 160, 163, 166, 172, 175, 178, 184, 187, 190, 196, 199, 202,
    208, 211, 214, 220, 223, 226, 232, 235, 238, 244, 247, 250, 253,
    256, 259, 262, 265, 268, 271, 274, 277, 280, 283, 286, 289, 292,
    295, 298, 301, 304, 307, 310, 313, 316, 319, 322, 325, 328, 331,
    334, 337, 340, 343, 346, 349, 352, 355, 358, 361, 364, 367, 370,
    373, 376, 379, 382, 385, 388, 391, 394, 397, 400, 403, 406, 409,
    412, 415, 418, 421, 424, 427, 430, 433, 436, 439, 442, 445, 448,
    451, 454, 457, 460, 463, 466, 469, 472, 475, 478, 481, 484, 487,
    490, 493, 496, 499, 502, 505, 508, 511, 514, 517, 520, 523, 526,
    529, 532, 535, 538, 541, 544, 547, 550, 553, 556, 559, 562, 565,
    568, 571, 574, 577, 580, 583, 586, 589, 592, 595, 598, 601, 604,
    607, 610, 613, 616, 619, 622, 625, 628, 631, 634, 637, 640,
];

pub const PUNCT_AFS_7_95: [u16; 65] = [
    1, 2, 4, 5, 8, 22, 70, 118, 166, 214, 262, 310, 317,
    319, 325, 332, 334, 341, 343, 349, 356, 358, 365, 367, 373, 380,
    382, 385, 389, 391, 397, 404, 406, 409, 413, 415, 421, 428, 430,
    433, 437, 439, 445, 452, 454, 457, 461, 463, 469, 476, 478, 481,
    485, 487, 490, 493, 500, 502, 503, 505, 506, 508, 509, 511, 512,
];

pub const PUNCT_AFS_7_4: [u16; 26] = [
    0, 355, 361, 367, 373, 379, 385, 391, 397, 403, 409, 415, 421,
    427, 433, 439, 445, 451, 457, 460, 463, 466, 468, 469, 471, 472,
];

pub const PUNCT_AFS_6_7: [u16; 128] = [
    1, 3, 7, 11, 15, 27, 39, 55, 67, 79, 95, 107, 119,
    135, 147, 159, 175, 187, 199, 215, 227, 239, 255, 267, 279, 287,
    291, 295, 299, 303, 307, 311, 315, 319, 323, 327, 331, 335, 339,
    343, 347, 351, 355, 359, 363, 367, 369, 371, 375, 377, 379, 383,
    385, 387, 391, 393, 395, 399, 401, 403, 407, 409, 411, 415, 417,
    419, 423, 425, 427, 431, 433, 435, 439, 441, 443, 447, 449, 451,
    455, 457, 459, 463, 465, 467, 471, 473, 475, 479, 481, 483, 487,
    489, 491, 495, 497, 499, 503, 505, 507, 511, 513, 515, 519, 521,
    523, 527, 529, 531, 535, 537, 539, 543, 545, 547, 549, 551, 553,
    555, 557, 559, 561, 563, 565, 567, 569, 571, 573, 575,
];

pub const PUNCT_AFS_5_9: [u16; 72] = [
    0, 1, 3, 5, 7, 11, 15, 31, 47, 63, 79, 95, 111,
    127, 143, 159, 175, 191, 207, 223, 239, 255, 271, 287, 303, 319,
    327, 331, 335, 343, 347, 351, 359, 363, 367, 375, 379, 383, 391,
    395, 399, 407, 411, 415, 423, 427, 431, 439, 443, 447, 455, 459,
    463, 467, 471, 475, 479, 483, 487, 491, 495, 499, 503, 507, 509,
    511, 512, 513, 515, 516, 517, 519,
];

pub const PUNCT_AFS_5_15: [u16; 117] = [
    0, 4, 5, 9, 10, 14, 15, 20, 25, 30, 35, 40, 50,
    60, 70, 80, 90, 100, 110, 120, 130, 140, 150, 160, 170, 180,
    190, 200, 210, 220, 230, 240, 250, 260, 270, 280, 290, 300, 310,
    315, 320, 325, 330, 334, 335, 340, 344, 345, 350, 354, 355, 360,
    364, 365, 370, 374, 375, 380, 384, 385, 390, 394, 395, 400, 404,
    405, 410, 414, 415, 420, 424, 425, 430, 434, 435, 440, 444, 445,
    450, 454, 455, 460, 464, 465, 470, 474, 475, 480, 484, 485, 490,
    494, 495, 500, 504, 505, 510, 514, 515, 520, 524, 525, 529, 530,
    534, 535, 539, 540, 544, 545, 549, 550, 554, 555, 559, 560, 564,
];

pub const PUNCT_AFS_4_75: [u16; 87] = [
    0, 1, 2, 4, 5, 7, 9, 15, 25, 35, 45, 55, 65,
    75, 85, 95, 105, 115, 125, 135, 145, 155, 165, 175, 185, 195,
    205, 215, 225, 235, 245, 255, 265, 275, 285, 295, 305, 315, 325,
    335, 345, 355, 365, 375, 385, 395, 400, 405, 410, 415, 420, 425,
    430, 435, 440, 445, 450, 455, 459, 460, 465, 470, 475, 479, 480,
    485, 490, 495, 499, 500, 505, 509, 510, 515, 517, 519, 520, 522,
    524, 525, 526, 527, 529, 530, 531, 532, 534,
];

/// TCH/AFS codes, indexed by AMR codec mode 0 (4.75) ..= 7 (12.2).
/// Each produces 448 coded bits, the remaining 8 carry the in-band mode id.
pub static CONV_AFS: [ConvCode; 8] = [
    ConvCode { name: "afs_4_75", n: 5, k: 7, len: 101, polys: &[G4, G4, G5, G6, G6], rgen: Some(G6), puncture: &PUNCT_AFS_4_75 },
    ConvCode { name: "afs_5_15", n: 5, k: 5, len: 109, polys: &[G1, G1, G2, G3, G3], rgen: Some(G3), puncture: &PUNCT_AFS_5_15 },
    ConvCode { name: "afs_5_9", n: 4, k: 7, len: 124, polys: &[G4, G5, G6, G6], rgen: Some(G6), puncture: &PUNCT_AFS_5_9 },
    ConvCode { name: "afs_6_7", n: 4, k: 5, len: 140, polys: &[G1, G2, G3, G3], rgen: Some(G3), puncture: &PUNCT_AFS_6_7 },
    ConvCode { name: "afs_7_4", n: 3, k: 5, len: 154, polys: &[G1, G2, G3], rgen: Some(G3), puncture: &PUNCT_AFS_7_4 },
    ConvCode { name: "afs_7_95", n: 3, k: 7, len: 165, polys: &[G4, G5, G6], rgen: Some(G4), puncture: &PUNCT_AFS_7_95 },
    ConvCode { name: "afs_10_2", n: 3, k: 5, len: 210, polys: &[G1, G2, G3], rgen: Some(G3), puncture: &PUNCT_AFS_10_2 },
    ConvCode { name: "afs_12_2", n: 2, k: 5, len: 250, polys: &[G0, G1], rgen: Some(G0), puncture: &PUNCT_AFS_12_2 },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coded_lengths() {
        assert_eq!(CONV_XCCH.coded_len(), 456);
        assert_eq!(CONV_CS2.mother_len(), 588);
        assert_eq!(CONV_CS2.coded_len(), 456);
        assert_eq!(CONV_CS3.mother_len(), 676);
        assert_eq!(CONV_CS3.coded_len(), 456);
        assert_eq!(CONV_RACH.coded_len(), 36);
        assert_eq!(CONV_SCH.coded_len(), 78);
        assert_eq!(CONV_TCH_FR.coded_len(), 378);
        for code in CONV_AFS.iter() {
            assert_eq!(code.coded_len(), 448, "{}", code.name);
        }
    }

    #[test]
    fn test_puncture_patterns_ascending() {
        let all: [&ConvCode; 10] = [
            &CONV_CS2, &CONV_CS3, &CONV_AFS[0], &CONV_AFS[1], &CONV_AFS[2],
            &CONV_AFS[3], &CONV_AFS[4], &CONV_AFS[5], &CONV_AFS[6], &CONV_AFS[7],
        ];
        for code in all {
            assert!(code.puncture.windows(2).all(|w| w[0] < w[1]), "{}", code.name);
            assert!((*code.puncture.last().unwrap() as usize) < code.mother_len(), "{}", code.name);
        }
    }

    #[test]
    fn test_afs_puncture_tables() {
        assert_eq!(&PUNCT_AFS_10_2[..8], &[1, 4, 7, 10, 16, 19, 22, 28]);
        assert_eq!(PUNCT_AFS_10_2[PUNCT_AFS_10_2.len() - 1], 640);
        assert_eq!(&PUNCT_AFS_7_95[..6], &[1, 2, 4, 5, 8, 22]);
        assert_eq!(&PUNCT_AFS_7_4[..3], &[0, 355, 361]);
        assert_eq!(&PUNCT_AFS_6_7[..6], &[1, 3, 7, 11, 15, 27]);
        assert_eq!(&PUNCT_AFS_5_9[..6], &[0, 1, 3, 5, 7, 11]);
        assert_eq!(&PUNCT_AFS_5_15[..6], &[0, 4, 5, 9, 10, 14]);
        assert_eq!(&PUNCT_AFS_4_75[..6], &[0, 1, 2, 4, 5, 7]);
        assert_eq!(&PUNCT_AFS_12_2[..4], &[321, 325, 329, 333]);
    }

    #[test]
    fn test_xcch_impulse_response() {
        // A single 1 followed by zeros yields the generator taps, interleaved G0/G1
        let mut input = [0u8; 224];
        input[0] = 1;
        let mut out = [0u8; 456];
        CONV_XCCH.encode(&input, &mut out);
        assert_eq!(&out[..10], &[1, 1, 0, 1, 0, 0, 1, 1, 1, 1]);
        assert!(out[10..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_recursive_code_terminates() {
        for code in CONV_AFS.iter() {
            let input: Vec<u8> = (0..code.len).map(|i| ((i * 7 + 3) % 5 == 0) as u8).collect();
            let mut state = 0;
            for i in 0..code.len + code.k - 1 {
                let u = if i < code.len { input[i] } else { code.tail_input(state) };
                state = code.transition(state, u).0;
            }
            assert_eq!(state, 0, "{}", code.name);
        }
    }
}
