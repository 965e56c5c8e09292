use crate::crypto::ENCR_HEADER_LEN;
use crate::error::{ZipError, ZipResult};
use crate::header::LOCAL_HEADER_LEN;

/// Narrow a payload length to the 32-bit size field.
///
/// Everything up to the central directory (local header, name, encryption
/// header, payload) must fit in 32 bits, or the compressed size and the
/// central directory offset would wrap. Larger entries need ZIP64.
pub fn checked_size(name_len: usize, size: u64, encrypted: bool) -> ZipResult<u32> {
    let header = if encrypted { ENCR_HEADER_LEN } else { 0 };
    let total = (LOCAL_HEADER_LEN + name_len + header) as u64 + size;
    if total > u32::MAX as u64 {
        return Err(ZipError::EntryTooLarge(size));
    }
    Ok(size as u32)
}

/// The single file carried by an archive.
///
/// `uncompressed_size` and `crc32` are committed to the local header before
/// any payload is seen. Writing a different number of bytes, or bytes with a
/// different CRC, yields a well-formed but wrong archive; nothing checks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    name: Vec<u8>,
    uncompressed_size: u32,
    crc32: u32,
}

impl ZipEntry {
    pub fn new(name: impl Into<Vec<u8>>, uncompressed_size: u32, crc32: u32) -> Self {
        ZipEntry {
            name: name.into(),
            uncompressed_size,
            crc32,
        }
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Stored size on disk: the payload plus the encryption header if any.
    pub fn compressed_size(&self, encrypted: bool) -> u32 {
        if encrypted {
            self.uncompressed_size
                .wrapping_add(ENCR_HEADER_LEN as u32)
        } else {
            self.uncompressed_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_size() {
        let e = ZipEntry::new("a.txt", 5, 0x3610A686);
        assert_eq!(e.compressed_size(false), 5);
        assert_eq!(e.compressed_size(true), 17);
    }

    #[test]
    fn test_compressed_size_wraps() {
        let e = ZipEntry::new("big", u32::MAX, 0);
        assert_eq!(e.compressed_size(true), 11);
    }

    #[test]
    fn test_checked_size_limit() {
        let max = u32::MAX as u64;
        let plain_max = max - 30 - 1;
        assert_eq!(checked_size(1, plain_max, false).unwrap(), plain_max as u32);
        assert!(matches!(
            checked_size(1, plain_max + 1, false),
            Err(ZipError::EntryTooLarge(n)) if n == plain_max + 1
        ));

        let encrypted_max = plain_max - 12;
        assert!(checked_size(1, encrypted_max, true).is_ok());
        assert!(checked_size(1, encrypted_max + 1, true).is_err());
        // Fits the size field but not next to its headers.
        assert!(checked_size(1, max - 5, true).is_err());
        assert!(checked_size(0, max + 1, false).is_err());
        assert_eq!(checked_size(5, 0, true).unwrap(), 0);
    }
}
