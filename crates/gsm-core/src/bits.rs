//! Helpers for converting between packed bytes, unpacked hard bits and soft bits.
//!
//! Soft bits are signed: a positive value means a received `0`, a negative value a
//! received `1`, and 0 means no information (erased or punctured).

/// Soft bit, -127 (surely 1) ..= 127 (surely 0)
pub type Sbit = i8;
/// Unpacked hard bit, 0 or 1
pub type Ubit = u8;

pub const SBIT_ZERO: Sbit = 127;
pub const SBIT_ONE: Sbit = -127;

#[inline(always)]
pub fn hard_to_soft(bit: Ubit) -> Sbit {
    if bit != 0 { SBIT_ONE } else { SBIT_ZERO }
}

/// Soft zero is treated as a 0 decision
#[inline(always)]
pub fn soft_to_hard(sbit: Sbit) -> Ubit {
    (sbit < 0) as Ubit
}

pub fn hard_to_soft_buf(src: &[Ubit], dst: &mut [Sbit]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = hard_to_soft(*s);
    }
}

pub fn soft_to_hard_buf(src: &[Sbit], dst: &mut [Ubit]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = soft_to_hard(*s);
    }
}

/// Unpacks `num_bits` bits from `bytes`, least significant bit of each byte first
pub fn unpack_lsb(bytes: &[u8], bits: &mut [Ubit], num_bits: usize) {
    for i in 0..num_bits {
        bits[i] = (bytes[i / 8] >> (i % 8)) & 1;
    }
}

/// Packs `num_bits` bits into `bytes`, least significant bit of each byte first.
/// Unused trailing bits of the last byte are cleared.
pub fn pack_lsb(bits: &[Ubit], bytes: &mut [u8], num_bits: usize) {
    for b in bytes.iter_mut().take(num_bits.div_ceil(8)) {
        *b = 0;
    }
    for i in 0..num_bits {
        bytes[i / 8] |= (bits[i] & 1) << (i % 8);
    }
}

/// Unpacks `num_bits` bits from `bytes` starting at bit offset `bit_offset`, most significant bit first
pub fn unpack_msb(bytes: &[u8], bit_offset: usize, bits: &mut [Ubit], num_bits: usize) {
    for i in 0..num_bits {
        let pos = bit_offset + i;
        bits[i] = (bytes[pos / 8] >> (7 - pos % 8)) & 1;
    }
}

/// Packs `num_bits` bits into `bytes` starting at bit offset `bit_offset`, most significant bit first.
/// Bits outside the written range are left untouched.
pub fn pack_msb(bits: &[Ubit], bytes: &mut [u8], bit_offset: usize, num_bits: usize) {
    for i in 0..num_bits {
        let pos = bit_offset + i;
        let mask = 1u8 << (7 - pos % 8);
        if bits[i] & 1 != 0 {
            bytes[pos / 8] |= mask;
        } else {
            bytes[pos / 8] &= !mask;
        }
    }
}

/// Writes the low `num_bits` of `value` MSB first into `bits`
pub fn set_bits_msb(bits: &mut [Ubit], value: u64, num_bits: usize) {
    for i in 0..num_bits {
        bits[i] = ((value >> (num_bits - 1 - i)) & 1) as Ubit;
    }
}

/// Reads `num_bits` MSB-first bits into an integer
pub fn get_bits_msb(bits: &[Ubit], num_bits: usize) -> u64 {
    bits[..num_bits].iter().fold(0u64, |acc, b| (acc << 1) | (*b & 1) as u64)
}

/// Renders hard bits as a compact `0101...` string, for trace logs
pub fn ubits_to_string(bits: &[Ubit]) -> String {
    bits.iter().map(|b| if *b != 0 { '1' } else { '0' }).collect()
}

/// Renders soft bits as `0`, `1` or `?` per position, for trace logs
pub fn sbits_to_string(bits: &[Sbit]) -> String {
    bits.iter().map(|b| match *b {
        0 => '?',
        v if v < 0 => '1',
        _ => '0',
    }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsb_packing() {
        let bytes = [0b1000_0001u8, 0x0f];
        let mut bits = [0u8; 16];
        unpack_lsb(&bytes, &mut bits, 16);
        assert_eq!(&bits[..8], &[1, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&bits[8..], &[1, 1, 1, 1, 0, 0, 0, 0]);

        let mut out = [0xffu8; 2];
        pack_lsb(&bits, &mut out, 12);
        assert_eq!(out, [0x81, 0x0f]);
    }

    #[test]
    fn test_msb_packing_with_offset() {
        let mut bytes = [0xd0u8, 0x00];
        let bits = [1, 0, 1, 1, 0, 1, 1, 1];
        pack_msb(&bits, &mut bytes, 4, 8);
        assert_eq!(bytes, [0xdb, 0x70]);

        let mut back = [0u8; 8];
        unpack_msb(&bytes, 4, &mut back, 8);
        assert_eq!(back, bits);
    }

    #[test]
    fn test_get_set_bits() {
        let mut bits = [0u8; 10];
        set_bits_msb(&mut bits, 0x2a5, 10);
        assert_eq!(ubits_to_string(&bits), "1010100101");
        assert_eq!(get_bits_msb(&bits, 10), 0x2a5);
    }

    #[test]
    fn test_soft_conversion() {
        assert_eq!(soft_to_hard(hard_to_soft(1)), 1);
        assert_eq!(soft_to_hard(hard_to_soft(0)), 0);
        assert_eq!(soft_to_hard(0), 0);
        assert_eq!(sbits_to_string(&[5, -3, 0]), "01?");
    }
}
