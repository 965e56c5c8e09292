//! On-disk layout of the three ZIP records this crate writes and reads.
//! All multi-byte fields are little-endian.

use crate::entry::ZipEntry;

pub const SIG_LOCAL_FILE_HEADER: u32 = 0x04034b50; // "PK\x03\x04"
pub const SIG_CENTRAL_DIRECTORY: u32 = 0x02014b50; // "PK\x01\x02"
pub const SIG_END_OF_CENTRAL_DIR: u32 = 0x06054b50; // "PK\x05\x06"

pub const LOCAL_HEADER_LEN: usize = 30;
pub const CENTRAL_HEADER_LEN: usize = 46;
pub const EOCD_LEN: usize = 22;

// General purpose flags
pub const FLAG_ENCRYPTED: u16 = 0x0001;

/// Version 2.0, used both for "made by" and "needed to extract".
pub const VERSION: u16 = 0x14;
pub const METHOD_STORE: u16 = 0;

/// Local file header followed by the raw name. Time and date are zero.
pub fn local_file_header(entry: &ZipEntry, flags: u16) -> Vec<u8> {
    let encrypted = flags & FLAG_ENCRYPTED != 0;
    let name = entry.name();
    let mut buf = Vec::with_capacity(LOCAL_HEADER_LEN + name.len());
    buf.extend_from_slice(&SIG_LOCAL_FILE_HEADER.to_le_bytes());
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&flags.to_le_bytes());
    buf.extend_from_slice(&METHOD_STORE.to_le_bytes());
    buf.extend_from_slice(&[0u8; 4]); // mod time, mod date
    buf.extend_from_slice(&entry.crc32().to_le_bytes());
    buf.extend_from_slice(&entry.compressed_size(encrypted).to_le_bytes());
    buf.extend_from_slice(&entry.uncompressed_size().to_le_bytes());
    buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // extra field length
    buf.extend_from_slice(name);
    buf
}

/// Central directory header followed by the raw name.
///
/// The relative offset of the local header is always written as 0. That is
/// only right because the entry is the first and only one in the archive.
pub fn central_directory_header(entry: &ZipEntry, flags: u16) -> Vec<u8> {
    let encrypted = flags & FLAG_ENCRYPTED != 0;
    let name = entry.name();
    let mut buf = Vec::with_capacity(CENTRAL_HEADER_LEN + name.len());
    buf.extend_from_slice(&SIG_CENTRAL_DIRECTORY.to_le_bytes());
    buf.extend_from_slice(&VERSION.to_le_bytes()); // made by
    buf.extend_from_slice(&VERSION.to_le_bytes()); // needed
    buf.extend_from_slice(&flags.to_le_bytes());
    buf.extend_from_slice(&METHOD_STORE.to_le_bytes());
    buf.extend_from_slice(&[0u8; 4]); // mod time, mod date
    buf.extend_from_slice(&entry.crc32().to_le_bytes());
    buf.extend_from_slice(&entry.compressed_size(encrypted).to_le_bytes());
    buf.extend_from_slice(&entry.uncompressed_size().to_le_bytes());
    buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // extra field length
    buf.extend_from_slice(&0u16.to_le_bytes()); // comment length
    buf.extend_from_slice(&0u16.to_le_bytes()); // disk number start
    buf.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
    buf.extend_from_slice(&0u32.to_le_bytes()); // external attributes
    buf.extend_from_slice(&0u32.to_le_bytes()); // local header offset
    buf.extend_from_slice(name);
    buf
}

/// End of central directory record for a one-entry archive, no comment.
pub fn end_of_central_directory(cd_size: u32, cd_offset: u32) -> [u8; EOCD_LEN] {
    let mut buf = [0u8; EOCD_LEN];
    buf[0..4].copy_from_slice(&SIG_END_OF_CENTRAL_DIR.to_le_bytes());
    // bytes 4..8: this disk, disk with central directory
    buf[8..10].copy_from_slice(&1u16.to_le_bytes());
    buf[10..12].copy_from_slice(&1u16.to_le_bytes());
    buf[12..16].copy_from_slice(&cd_size.to_le_bytes());
    buf[16..20].copy_from_slice(&cd_offset.to_le_bytes());
    // bytes 20..22: comment length
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_header_bytes() {
        let e = ZipEntry::new("a.txt", 5, 0x3610A686);
        let h = local_file_header(&e, 0);
        assert_eq!(h.len(), 35);
        assert_eq!(
            h,
            [
                0x50, 0x4B, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x86, 0xA6, 0x10, 0x36, 0x05, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x05, 0x00,
                0x00, 0x00, b'a', b'.', b't', b'x', b't',
            ]
        );
    }

    #[test]
    fn test_local_header_encrypted_sizes() {
        let e = ZipEntry::new("a.txt", 5, 0x3610A686);
        let h = local_file_header(&e, FLAG_ENCRYPTED);
        assert_eq!(h[6], 0x01);
        assert_eq!(h[7], 0x00);
        assert_eq!(&h[18..22], &17u32.to_le_bytes());
        assert_eq!(&h[22..26], &5u32.to_le_bytes());
    }

    #[test]
    fn test_central_header_mirrors_local() {
        let e = ZipEntry::new("dir/file.bin", 1000, 0xDEADBEEF);
        let local = local_file_header(&e, FLAG_ENCRYPTED);
        let central = central_directory_header(&e, FLAG_ENCRYPTED);
        assert_eq!(central.len(), CENTRAL_HEADER_LEN + 12);
        assert_eq!(&central[0..4], b"PK\x01\x02");
        assert_eq!(&central[4..6], &[0x14, 0x00]);
        // version needed .. name length line up, shifted by the made-by field
        assert_eq!(&central[6..30], &local[4..28]);
        assert_eq!(&central[30..46], &[0u8; 16]);
        assert_eq!(&central[46..], b"dir/file.bin");
    }

    #[test]
    fn test_eocd_bytes() {
        let r = end_of_central_directory(51, 40);
        assert_eq!(
            r,
            [
                0x50, 0x4B, 0x05, 0x06, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 51, 0x00,
                0x00, 0x00, 40, 0x00, 0x00, 0x00, 0x00, 0x00,
            ]
        );
    }
}
