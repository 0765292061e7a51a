const COILS_PER_BYTE: usize = 8;

/// Number of bytes needed to carry the given number of coils
pub const fn bytes_needed(coils: usize) -> usize {
    coils.div_ceil(COILS_PER_BYTE)
}

/// Pack coil states into bytes, low bit first.
///
/// Coil `i` lands in byte `i / 8`, bit `i % 8`. Unused high bits of the last
/// byte are zero.
pub fn pack_coils(coils: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; bytes_needed(coils.len())];

    for (coil_index, &coil) in coils.iter().enumerate() {
        if coil {
            bytes[coil_index / COILS_PER_BYTE] |= 1 << (coil_index % COILS_PER_BYTE);
        }
    }
    bytes
}

/// Unpack `count` coil states from packed bytes.
///
/// Returns `None` if `bytes` is too short to hold `count` coils.
pub fn unpack_coils(bytes: &[u8], count: usize) -> Option<Vec<bool>> {
    if bytes.len() < bytes_needed(count) {
        return None;
    }

    let coils = (0..count)
        .map(|coil_index| {
            let bit_flag: u8 = 1 << (coil_index % COILS_PER_BYTE);
            bytes[coil_index / COILS_PER_BYTE] & bit_flag != 0
        })
        .collect();
    Some(coils)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bytes_needed_works() {
        assert_eq!(bytes_needed(0), 0);
        assert_eq!(bytes_needed(1), 1);
        assert_eq!(bytes_needed(8), 1);
        assert_eq!(bytes_needed(9), 2);
        assert_eq!(bytes_needed(16), 2);
        assert_eq!(bytes_needed(17), 3);
        assert_eq!(bytes_needed(2000), 250);
    }

    #[test]
    fn pack_coils_works() {
        assert_eq!(pack_coils(&[]), Vec::<u8>::new());
        assert_eq!(pack_coils(&[true]), vec![0b0000000_1]);
        assert_eq!(pack_coils(&[true, false, true]), vec![0b00000_101]);
        assert_eq!(
            pack_coils(&[true, false, true, true, false, false, false, false, true]),
            vec![0x0D, 0x01]
        );
    }

    #[test]
    fn unpack_coils_works() {
        assert_eq!(
            unpack_coils(&[0b01110010], 8).unwrap(),
            vec![false, true, false, false, true, true, true, false]
        );
        assert_eq!(
            unpack_coils(&[0b10011100, 0b0000_1001], 12).unwrap(),
            vec![false, false, true, true, true, false, false, true, true, false, false, true]
        );
        // trailing bits beyond `count` are ignored
        assert_eq!(unpack_coils(&[0xFF], 2).unwrap(), vec![true, true]);
    }

    #[test]
    fn unpack_coils_short_input() {
        assert_eq!(unpack_coils(&[0xFF], 9), None);
    }
}
