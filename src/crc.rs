/// CRC-7 calculation (polynomial `x^7 + x^3 + 1`), returns the raw 7-bit value.
pub fn crc7(data: &[u8]) -> u8 {
    let mut crc = 0;
    for mut byte in data.iter().cloned() {
        for _bit in 0..8 {
            crc <<= 1;
            if ((byte & 0x80) ^ (crc & 0x80)) != 0 {
                crc ^= 0x09;
            }
            byte <<= 1;
        }
    }
    crc & 0x7F
}

/// Checksum byte of a command frame: CRC-7 in bits 7..1, stop bit in bit 0.
pub fn frame_checksum(data: &[u8]) -> u8 {
    (crc7(data) << 1) | 0x01
}

/// CRC-16 (polynomial `0x1021`, MSB first) starting from `seed`.
pub fn crc16_with_seed(seed: u16, data: &[u8]) -> u16 {
    let mut crc = seed;
    for &byte in data {
        crc = ((crc >> 8) & 0xFF) | (crc << 8);
        crc ^= u16::from(byte);
        crc ^= (crc & 0xFF) >> 4;
        crc ^= crc << 12;
        crc ^= (crc & 0xFF) << 5;
    }
    crc
}

/// CRC-16 appended by the card to data blocks.
pub fn crc16(data: &[u8]) -> u16 {
    crc16_with_seed(0x0000, data)
}

/// CRC-16/CCITT with the `0xFFFF` initial value.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    crc16_with_seed(0xFFFF, data)
}
