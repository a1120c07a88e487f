use gsm_core::Ubit;

/// Systematic CRC over unpacked bits, MSB first, as used by GSM 05.03.
/// `poly` omits the leading x^bits term; the transmitted parity is the
/// register contents XOR `remainder`.
#[derive(Debug)]
pub struct CrcCode {
    pub bits: u32,
    pub poly: u64,
    pub init: u64,
    pub remainder: u64,
}

impl CrcCode {
    /// Computes the parity over `data`, already XORed with the remainder
    pub fn compute(&self, data: &[Ubit]) -> u64 {
        let mask = (1u64 << self.bits) - 1;
        let mut crc = self.init;
        for b in data {
            let feedback = ((crc >> (self.bits - 1)) & 1) ^ (*b & 1) as u64;
            crc <<= 1;
            if feedback != 0 {
                crc ^= self.poly;
            }
            crc &= mask;
        }
        crc ^ self.remainder
    }

    /// Writes the parity over `data` into `parity`, MSB first
    pub fn set_bits(&self, data: &[Ubit], parity: &mut [Ubit]) {
        let crc = self.compute(data);
        let n = self.bits as usize;
        for i in 0..n {
            parity[i] = ((crc >> (n - 1 - i)) & 1) as Ubit;
        }
    }

    /// Returns true when `parity` matches the parity computed over `data`
    pub fn check_bits(&self, data: &[Ubit], parity: &[Ubit]) -> bool {
        let crc = self.compute(data);
        let n = self.bits as usize;
        parity[..n].iter().enumerate().all(|(i, p)| (*p & 1) as u64 == (crc >> (n - 1 - i)) & 1)
    }
}

/// Fire code of xCCH and PDTCH CS-1: g(D) = (D^23 + 1)(D^17 + D^3 + 1)
pub static CRC_FIRE40: CrcCode = CrcCode { bits: 40, poly: 0x0004820009, init: 0, remainder: 0xff_ffff_ffff };
/// PDTCH CS-2..4: D^16 + D^12 + D^5 + 1
pub static CRC_CS234: CrcCode = CrcCode { bits: 16, poly: 0x1021, init: 0, remainder: 0xffff };
/// SCH: D^10 + D^8 + D^6 + D^5 + D^4 + D^2 + 1
pub static CRC_SCH: CrcCode = CrcCode { bits: 10, poly: 0x175, init: 0, remainder: 0x3ff };
/// RACH: D^6 + D^5 + D^3 + D^2 + D + 1
pub static CRC_RACH: CrcCode = CrcCode { bits: 6, poly: 0x27, init: 0, remainder: 0x3f };
/// TCH/FR class 1a: D^3 + D + 1
pub static CRC_TCH_FR: CrcCode = CrcCode { bits: 3, poly: 0x3, init: 0, remainder: 0x7 };
/// TCH/EFR protected bits: D^8 + D^4 + D^3 + D^2 + 1
pub static CRC_TCH_EFR: CrcCode = CrcCode { bits: 8, poly: 0x1d, init: 0, remainder: 0 };
/// TCH/AFS class 1a: D^6 + D^5 + D^3 + D^2 + D + 1
pub static CRC_AMR: CrcCode = CrcCode { bits: 6, poly: 0x2f, init: 0, remainder: 0x3f };
