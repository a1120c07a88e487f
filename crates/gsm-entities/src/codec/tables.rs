//! Constant patterns and bit orders of GSM 05.03

use gsm_core::Ubit;

/// Stealing flag patterns (hl, hu per burst) identifying PDTCH CS-1..CS-4
pub const PDTCH_HL_HU: [[Ubit; 8]; 4] = [
    [1, 1, 1, 1, 1, 1, 1, 1],
    [1, 1, 0, 0, 1, 0, 0, 0],
    [0, 0, 1, 0, 0, 0, 0, 1],
    [0, 0, 0, 1, 0, 1, 1, 0],
];

/// USF precoding of CS-2 and CS-3; the last three bits are the USF, LSB first
pub const USF_TO_SIX: [[Ubit; 6]; 8] = [
    [0, 0, 0, 0, 0, 0],
    [1, 0, 0, 1, 0, 0],
    [0, 1, 0, 0, 1, 0],
    [1, 1, 0, 1, 1, 0],
    [0, 0, 1, 0, 0, 1],
    [1, 0, 1, 1, 0, 1],
    [0, 1, 1, 0, 1, 1],
    [1, 1, 1, 1, 1, 1],
];

/// USF block code of CS-4
pub const USF_TO_TWELVE: [[Ubit; 12]; 8] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 1, 0, 1, 0, 0, 0, 0, 1, 0, 1, 1],
    [0, 0, 1, 1, 0, 1, 1, 1, 0, 1, 1, 0],
    [1, 1, 1, 0, 0, 1, 1, 1, 1, 1, 0, 1],
    [0, 0, 0, 0, 1, 1, 0, 1, 1, 1, 0, 1],
    [1, 1, 0, 1, 1, 1, 0, 1, 0, 1, 1, 0],
    [0, 0, 1, 1, 1, 0, 1, 0, 1, 0, 1, 1],
    [1, 1, 1, 0, 1, 0, 1, 0, 0, 0, 0, 0],
];

/// In-band codec mode id of TCH/AFS, sent in the first 8 coded bits
pub const AFS_IC: [[Ubit; 8]; 4] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [1, 0, 1, 1, 1, 0, 1, 0],
    [0, 1, 1, 1, 0, 1, 0, 1],
    [1, 1, 0, 0, 1, 1, 1, 1],
];

/// Per AMR codec mode: speech bits, class 1a bits covered by the CRC, frame bytes
#[derive(Debug, Clone, Copy)]
pub struct AmrModeInfo {
    pub bits: usize,
    pub prot: usize,
    pub bytes: usize,
}

pub const AMR_MODES: [AmrModeInfo; 8] = [
    AmrModeInfo { bits: 95, prot: 39, bytes: 12 },
    AmrModeInfo { bits: 103, prot: 49, bytes: 13 },
    AmrModeInfo { bits: 118, prot: 55, bytes: 15 },
    AmrModeInfo { bits: 134, prot: 55, bytes: 17 },
    AmrModeInfo { bits: 148, prot: 61, bytes: 19 },
    AmrModeInfo { bits: 159, prot: 75, bytes: 20 },
    AmrModeInfo { bits: 204, prot: 65, bytes: 26 },
    AmrModeInfo { bits: 244, prot: 81, bytes: 31 },
];

/// Widths of the 76 GSM 06.10 parameters in frame order:
/// 8 LARs, then per subframe Nc, bc, Mc, xmaxc and 13 RPE pulses
pub const FR_PARAM_BITS: [u8; 76] = fr_param_bits();

const fn fr_param_bits() -> [u8; 76] {
    let mut out = [0u8; 76];
    let lar = [6, 6, 5, 5, 4, 4, 3, 3];
    let mut i = 0;
    while i < 8 {
        out[i] = lar[i];
        i += 1;
    }
    let mut sf = 0;
    while sf < 4 {
        let base = 8 + sf * 17;
        out[base] = 7;
        out[base + 1] = 2;
        out[base + 2] = 2;
        out[base + 3] = 6;
        let mut p = 0;
        while p < 13 {
            out[base + 4 + p] = 3;
            p += 1;
        }
        sf += 1;
    }
    out
}

/// Position in the 260 bit FR frame (after the signature nibble) of each
/// class-ordered bit d[k], GSM 05.03 table 2. d[0..50] is class 1a,
/// d[50..182] class 1b, d[182..] class 2.
pub const FR_BIT_ORDER: [u16; 260] = [
    0, 47, 103, 159, 215, 1, 6, 12, 2, 7, 48, 104, 160,
    216, 8, 22, 13, 17, 18, 14, 23, 3, 49, 105, 161, 217,
    9, 26, 36, 92, 148, 204, 37, 93, 149, 205, 38, 94, 150,
    206, 39, 95, 151, 207, 40, 96, 152, 208, 50, 106, 162, 218,
    4, 10, 15, 19, 24, 27, 30, 33, 41, 97, 153, 209, 43,
    99, 155, 211, 45, 101, 157, 213, 51, 107, 163, 219, 53, 56,
    59, 62, 65, 68, 71, 74, 77, 80, 83, 86, 89, 54, 57,
    60, 63, 66, 69, 72, 75, 78, 81, 84, 87, 90, 109, 112,
    115, 118, 121, 124, 127, 130, 133, 136, 139, 142, 145, 110, 113,
    116, 119, 122, 125, 128, 131, 134, 137, 140, 143, 146, 165, 168,
    171, 174, 177, 180, 183, 186, 189, 192, 195, 198, 201, 166, 169,
    172, 175, 178, 181, 184, 187, 190, 193, 196, 199, 202, 221, 224,
    227, 230, 233, 236, 239, 242, 245, 248, 251, 254, 257, 222, 225,
    228, 231, 234, 237, 240, 243, 246, 249, 252, 255, 258, 20, 28,
    55, 58, 61, 64, 67, 70, 73, 76, 79, 82, 85, 88, 91,
    111, 114, 117, 120, 123, 126, 129, 132, 135, 138, 141, 144, 147,
    167, 170, 173, 176, 179, 182, 185, 188, 191, 194, 197, 200, 203,
    223, 226, 229, 232, 235, 238, 241, 244, 247, 250, 253, 256, 259,
    42, 98, 154, 210, 44, 100, 156, 212, 46, 102, 158, 214, 52,
    108, 164, 220, 5, 11, 16, 21, 25, 29, 31, 32, 34, 35,
];

/// Position in the 260 bit w sequence of each class-ordered EFR bit d[k].
/// d[0..65] are the CRC protected bits, d[65..73] the CRC itself.
pub const EFR_BIT_ORDER: [u16; 260] = [
    38, 39, 40, 41, 42, 43, 145, 146, 147, 148, 149, 150, 93,
    94, 200, 201, 47, 88, 99, 140, 44, 151, 95, 202, 1, 2,
    7, 9, 17, 18, 23, 45, 46, 152, 153, 96, 203, 3, 4,
    10, 11, 15, 8, 5, 6, 12, 16, 19, 97, 204, 0, 13,
    14, 20, 24, 25, 27, 154, 206, 195, 247, 89, 141, 196, 248,
    252, 253, 254, 255, 256, 257, 258, 259, 98, 205, 48, 49, 100,
    101, 155, 156, 207, 208, 90, 142, 197, 249, 21, 22, 26, 28,
    32, 33, 50, 102, 157, 209, 91, 92, 143, 144, 198, 199, 250,
    251, 29, 30, 31, 34, 35, 36, 37, 51, 55, 59, 63, 67,
    103, 107, 111, 115, 119, 158, 162, 166, 170, 174, 210, 214, 218,
    222, 226, 52, 56, 60, 64, 68, 73, 76, 79, 82, 85, 104,
    108, 112, 116, 120, 125, 128, 131, 134, 137, 159, 163, 167, 171,
    175, 180, 183, 186, 189, 192, 211, 215, 219, 223, 227, 232, 235,
    238, 241, 244, 53, 57, 61, 65, 69, 71, 72, 74, 77, 80,
    83, 86, 105, 109, 113, 117, 121, 123, 124, 126, 129, 132, 135,
    138, 160, 164, 168, 172, 176, 178, 179, 181, 184, 187, 190, 193,
    212, 216, 220, 224, 228, 230, 231, 233, 236, 239, 242, 245, 54,
    58, 62, 66, 70, 75, 78, 81, 84, 87, 106, 110, 114, 118,
    122, 127, 130, 133, 136, 139, 161, 165, 169, 173, 177, 182, 185,
    188, 191, 194, 213, 217, 221, 225, 229, 234, 237, 240, 243, 246,
];

/// The 65 EFR speech bits (s, 0-based) covered by the additional 8 bit CRC
pub const EFR_PROTECTED: [u8; 65] = [
    38, 39, 40, 41, 42, 43, 47, 86, 44, 1, 2, 7, 9,
    17, 18, 23, 45, 46, 141, 142, 143, 144, 145, 146, 91, 92,
    194, 195, 97, 136, 147, 93, 196, 148, 149, 94, 197, 3, 4,
    10, 11, 15, 8, 5, 6, 12, 16, 19, 95, 198, 0, 13,
    14, 20, 24, 25, 27, 150, 200, 189, 239, 87, 137, 190, 240,
];

/// EFR speech bits sent three times, recovered by majority vote
pub const EFR_REPEATED: [usize; 4] = [69, 119, 172, 222];
