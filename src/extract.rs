use std::io::{self, Read, Write};

use crate::archive::{CompressionMethod, ZipArchive, ZipFileEntry};
use crate::crypto::{ENCR_HEADER_LEN, ZipCrypto};
use crate::error::{ZipError, ZipResult};

const BUF_SIZE: usize = 32768;

/// Write the plaintext of one entry into `writer`, decrypting if needed.
/// Returns the CRC32 of the extracted data after checking it against the
/// entry.
pub fn extract_entry<W: Write>(
    archive: &mut ZipArchive,
    entry: &ZipFileEntry,
    writer: &mut W,
    password: Option<&[u8]>,
) -> ZipResult<u32> {
    if let CompressionMethod::Other(n) = entry.compression_method {
        return Err(ZipError::UnsupportedCompressionMethod(n));
    }

    let reader = archive.seek_to(entry.data_pos)?;
    let mut limited = reader.take(entry.compressed_size);

    // Validate password for encrypted files.
    let (mut crypto, size) = if entry.is_encrypted() {
        let pwd = password.ok_or(ZipError::PasswordNotSet)?;
        let size = entry
            .compressed_size
            .checked_sub(ENCR_HEADER_LEN as u64)
            .ok_or(ZipError::CorruptedFile)?;
        let mut enc_header = [0u8; ENCR_HEADER_LEN];
        limited.read_exact(&mut enc_header)?;

        let mut c = ZipCrypto::new(pwd);
        if !c.check_header(&enc_header, entry.file_crc) {
            return Err(ZipError::InvalidPassword);
        }
        (Some(c), size)
    } else {
        (None, entry.compressed_size)
    };

    let crc = copy_stored(&mut limited, writer, size, crypto.as_mut())?;
    if crc != entry.file_crc {
        return Err(ZipError::InvalidFileCrc {
            expected: entry.file_crc,
            got: crc,
        });
    }
    Ok(crc)
}

/// Check every entry without writing anything out.
pub fn test_all(archive: &mut ZipArchive, password: Option<&[u8]>) -> ZipResult<()> {
    let entries: Vec<ZipFileEntry> = archive.entries.clone();
    for entry in &entries {
        extract_entry(archive, entry, &mut io::sink(), password)?;
    }
    Ok(())
}

fn copy_stored<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    size: u64,
    mut crypto: Option<&mut ZipCrypto>,
) -> ZipResult<u32> {
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = [0u8; BUF_SIZE];
    let mut remaining = size;

    while remaining > 0 {
        let to_read = remaining.min(BUF_SIZE as u64) as usize;
        reader.read_exact(&mut buf[..to_read])?;

        let data = &mut buf[..to_read];
        if let Some(ref mut c) = crypto {
            c.decrypt(data);
        }

        hasher.update(data);
        writer.write_all(data).map_err(ZipError::CantOpenDestFile)?;
        remaining -= to_read as u64;
    }

    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc;
    use crate::entry::ZipEntry;
    use crate::writer::{CheckByte, ZipEncoderBuilder};

    fn build(data: &[u8], password: Option<&[u8]>, check: CheckByte) -> ZipArchive {
        let mut out = Vec::new();
        let entry = ZipEntry::new("f.bin", data.len() as u32, crc::checksum(data));
        let mut builder = ZipEncoderBuilder::new(entry).check_byte(check);
        if let Some(pwd) = password {
            builder = builder.password(pwd);
        }
        let (mut zip, ()) = builder.build(&mut out).unwrap();
        zip.write(data);
        zip.finalize();
        ZipArchive::from_bytes(out).unwrap()
    }

    #[test]
    fn test_extract_plain() {
        let mut archive = build(b"hello", None, CheckByte::CrcLow);
        let entry = archive.entries[0].clone();
        let mut out = Vec::new();
        let crc = extract_entry(&mut archive, &entry, &mut out, None).unwrap();
        assert_eq!(out, b"hello");
        assert_eq!(crc, 0x3610A686);
    }

    #[test]
    fn test_extract_encrypted_large() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i ^ (i >> 9)) as u8).collect();
        for check in [CheckByte::CrcLow, CheckByte::CrcHigh] {
            let mut archive = build(&data, Some(&b"infected"[..]), check);
            let entry = archive.entries[0].clone();
            let mut out = Vec::new();
            extract_entry(&mut archive, &entry, &mut out, Some(&b"infected"[..])).unwrap();
            assert_eq!(out, data);
        }
    }

    #[test]
    fn test_missing_password() {
        let mut archive = build(b"hello", Some(&b"pw"[..]), CheckByte::CrcLow);
        assert!(matches!(
            test_all(&mut archive, None),
            Err(ZipError::PasswordNotSet)
        ));
    }

    #[test]
    fn test_wrong_password() {
        let mut archive = build(b"hello", Some(&b"pw"[..]), CheckByte::CrcLow);
        // The check byte lets a wrong password through about 1 time in 128;
        // the CRC check catches those.
        assert!(matches!(
            test_all(&mut archive, Some(&b"nope"[..])),
            Err(ZipError::InvalidPassword) | Err(ZipError::InvalidFileCrc { .. })
        ));
    }

    #[test]
    fn test_bad_crc_detected() {
        let mut out = Vec::new();
        let entry = ZipEntry::new("f.bin", 5, 0x12345678);
        let (mut zip, ()) = crate::writer::ZipEncoder::new(&mut out, entry, None).unwrap();
        zip.write(b"hello");
        zip.finalize();

        let mut archive = ZipArchive::from_bytes(out).unwrap();
        assert!(matches!(
            test_all(&mut archive, None),
            Err(ZipError::InvalidFileCrc {
                expected: 0x12345678,
                got: 0x3610A686
            })
        ));
    }
}
