//! PKware ZIP traditional encryption ("ZipCrypto").
//! Keys initialized to [305419896, 591751049, 878082192].
//! Uses the CRC32 table for key updates.
//!
//! The cipher is weak and kept only for format compatibility.

use crate::crc;

pub const ENCR_HEADER_LEN: usize = 12;

const INITIAL_KEYS: [u32; 3] = [0x12345678, 0x23456789, 0x34567890];
const KEY1_MULTIPLIER: u32 = 134775813;

/// ZipCrypto state for one stream. Bytes must be processed strictly in
/// order; a clone may be used to peek but not advanced independently.
#[derive(Debug, Clone)]
pub struct ZipCrypto {
    key: [u32; 3],
}

impl ZipCrypto {
    pub fn new(password: &[u8]) -> Self {
        let mut c = ZipCrypto { key: INITIAL_KEYS };
        for &b in password {
            c.update_keys(b);
        }
        c
    }

    pub fn keys(&self) -> [u32; 3] {
        self.key
    }

    fn update_keys(&mut self, c: u8) {
        self.key[0] = crc::update(self.key[0], c);
        self.key[1] = self.key[1].wrapping_add(self.key[0] & 0xff);
        self.key[1] = self.key[1].wrapping_mul(KEY1_MULTIPLIER).wrapping_add(1);
        self.key[2] = crc::update(self.key[2], (self.key[1] >> 24) as u8);
    }

    fn keystream_byte(&self) -> u8 {
        let temp = self.key[2] | 2;
        (temp.wrapping_mul(temp ^ 1) >> 8) as u8
    }

    /// Encrypt one byte. Keys advance on the plaintext.
    pub fn encrypt_byte(&mut self, p: u8) -> u8 {
        let c = p ^ self.keystream_byte();
        self.update_keys(p);
        c
    }

    /// Decrypt one byte. Keys advance on the recovered plaintext.
    pub fn decrypt_byte(&mut self, c: u8) -> u8 {
        let p = c ^ self.keystream_byte();
        self.update_keys(p);
        p
    }

    /// Encrypt data in place.
    pub fn encrypt(&mut self, data: &mut [u8]) {
        for b in data.iter_mut() {
            *b = self.encrypt_byte(*b);
        }
    }

    /// Decrypt data in place.
    pub fn decrypt(&mut self, data: &mut [u8]) {
        for b in data.iter_mut() {
            *b = self.decrypt_byte(*b);
        }
    }

    /// Build the encrypted 12-byte header that precedes the payload.
    /// The last seed byte is replaced by `check` before encryption.
    pub fn encrypt_header(
        &mut self,
        mut seed: [u8; ENCR_HEADER_LEN],
        check: u8,
    ) -> [u8; ENCR_HEADER_LEN] {
        seed[ENCR_HEADER_LEN - 1] = check;
        self.encrypt(&mut seed);
        seed
    }

    /// Decrypt the 12-byte encryption header and validate the check byte.
    /// Returns true if the password looks correct. The state is left
    /// positioned at the first payload byte either way.
    ///
    /// Both the low CRC byte (written by this crate's encoder) and the high
    /// CRC byte (APPNOTE writers) are accepted.
    pub fn check_header(&mut self, enc_header: &[u8; ENCR_HEADER_LEN], file_crc: u32) -> bool {
        let mut header = *enc_header;
        self.decrypt(&mut header);
        let last_byte = header[ENCR_HEADER_LEN - 1];
        last_byte == file_crc as u8 || last_byte == (file_crc >> 24) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_keys() {
        let c = ZipCrypto::new(b"");
        assert_eq!(c.keys(), [305419896, 591751049, 878082192]);
    }

    #[test]
    fn test_key_update_deterministic() {
        let c1 = ZipCrypto::new(b"password");
        let c2 = ZipCrypto::new(b"password");
        assert_eq!(c1.keys(), c2.keys());
        assert_eq!(c1.keys(), [0xea9b4e4d, 0xba789085, 0x5ff8707d]);
    }

    #[test]
    fn test_different_passwords_different_keys() {
        let c1 = ZipCrypto::new(b"abc");
        let c2 = ZipCrypto::new(b"xyz");
        assert_ne!(c1.keys(), c2.keys());
    }

    #[test]
    fn test_first_keystream_byte() {
        assert_eq!(ZipCrypto::new(b"").keystream_byte(), 0xab);
        assert_eq!(ZipCrypto::new(b"pw").keystream_byte(), 0xe3);
        assert_eq!(ZipCrypto::new(b"infected").keystream_byte(), 0x03);
    }

    #[test]
    fn test_encrypt_vector() {
        let mut data = *b"hello world";
        ZipCrypto::new(b"secret").encrypt(&mut data);
        assert_eq!(
            data,
            [0xa0, 0x25, 0x4d, 0x7b, 0x73, 0xb2, 0x1f, 0x38, 0xa9, 0xf5, 0xf0]
        );
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let data = b"hello world";
        let mut buf = *data;

        ZipCrypto::new(b"secret").encrypt(&mut buf);
        assert_ne!(&buf, data);

        ZipCrypto::new(b"secret").decrypt(&mut buf);
        assert_eq!(&buf, data);
    }

    #[test]
    fn test_chunking_does_not_matter() {
        let data: Vec<u8> = (0..200u8).collect();

        let mut whole = data.clone();
        ZipCrypto::new(b"pw").encrypt(&mut whole);

        let mut c = ZipCrypto::new(b"pw");
        let mut pieces = data.clone();
        for chunk in pieces.chunks_mut(13) {
            c.encrypt(chunk);
        }
        assert_eq!(whole, pieces);
    }

    #[test]
    fn test_header_check() {
        let crc = 0x3610A686;
        let mut enc = ZipCrypto::new(b"pw");
        let header = enc.encrypt_header([0x55; ENCR_HEADER_LEN], crc as u8);

        let mut good = ZipCrypto::new(b"pw");
        assert!(good.check_header(&header, crc));
        assert_eq!(good.keys(), enc.keys());

        let mut bad = ZipCrypto::new(b"wrong");
        let mut plain = header;
        bad.clone().decrypt(&mut plain);
        let accepted = bad.check_header(&header, crc);
        assert_eq!(accepted, plain[11] == 0x86 || plain[11] == 0x36);
    }

    #[test]
    fn test_header_check_high_byte() {
        let crc = 0x3610A686;
        let header = ZipCrypto::new(b"pw").encrypt_header([0; ENCR_HEADER_LEN], (crc >> 24) as u8);
        assert!(ZipCrypto::new(b"pw").check_header(&header, crc));
    }
}
