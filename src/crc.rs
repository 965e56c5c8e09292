//! CRC-32 (ISO-3309, reflected, polynomial 0xEDB88320).
//! The same table drives the ZipCrypto key schedule.

/// Standard CRC32 lookup table (polynomial 0xEDB88320).
pub const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

const CRC32_SEED: u32 = 0xFFFFFFFF;

/// Fold one byte into a raw (uncomplemented) CRC register.
#[inline]
pub fn update(crc: u32, b: u8) -> u32 {
    (crc >> 8) ^ CRC32_TABLE[((crc ^ b as u32) & 0xff) as usize]
}

/// CRC-32 of a whole buffer.
pub fn checksum(bytes: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(bytes);
    crc.finalize()
}

/// Incremental CRC-32 over a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    pub fn new() -> Self {
        Crc32 { state: CRC32_SEED }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state = update(self.state, b);
        }
    }

    /// Complemented value, as stored in ZIP headers. Does not consume the
    /// accumulator, so more bytes may follow.
    pub fn finalize(&self) -> u32 {
        self.state ^ CRC32_SEED
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_spot_check() {
        assert_eq!(CRC32_TABLE[0], 0x00000000);
        assert_eq!(CRC32_TABLE[1], 0x77073096);
        assert_eq!(CRC32_TABLE[255], 0x2D02EF8D);
    }

    #[test]
    fn test_empty() {
        assert_eq!(checksum(b""), 0);
    }

    #[test]
    fn test_check_vector() {
        assert_eq!(checksum(b"123456789"), 0xCBF43926);
        assert_eq!(checksum(b"hello"), 0x3610A686);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut crc = Crc32::new();
        for chunk in data.chunks(7) {
            crc.update(chunk);
        }
        assert_eq!(crc.finalize(), checksum(data));
        assert_eq!(crc.finalize(), 0x414FA339);
    }

    #[test]
    fn test_matches_crc32fast() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4099).collect();
        let mut h = crc32fast::Hasher::new();
        h.update(&data);
        assert_eq!(checksum(&data), h.finalize());
    }
}
