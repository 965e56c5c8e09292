//! Staging for streams whose length and CRC are only known at the end.
//!
//! The local header needs both up front, so chunks are held in memory until
//! the stream ends. With a password they are kept encrypted at rest under
//! their own ZipCrypto stream, then replayed through a fresh decryptor into
//! the encoder.

use std::io::Write;

use crate::crc::Crc32;
use crate::crypto::ZipCrypto;
use crate::entry::{self, ZipEntry};
use crate::error::ZipResult;
use crate::sink::IoSink;
use crate::writer::{CheckByte, ZipEncoderBuilder};

pub struct Spool {
    password: Option<Vec<u8>>,
    at_rest: Option<ZipCrypto>,
    chunks: Vec<Vec<u8>>,
    size: u64,
    crc: Crc32,
    check_byte: CheckByte,
}

impl Spool {
    pub fn new(password: Option<&[u8]>) -> Self {
        Spool {
            password: password.map(<[u8]>::to_vec),
            at_rest: password.map(ZipCrypto::new),
            chunks: Vec::new(),
            size: 0,
            crc: Crc32::new(),
            check_byte: CheckByte::default(),
        }
    }

    pub fn check_byte(mut self, check_byte: CheckByte) -> Self {
        self.check_byte = check_byte;
        self
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.size += chunk.len() as u64;
        self.crc.update(chunk);

        let mut stored = chunk.to_vec();
        if let Some(c) = self.at_rest.as_mut() {
            c.encrypt(&mut stored);
        }
        self.chunks.push(stored);
    }

    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn crc32(&self) -> u32 {
        self.crc.finalize()
    }

    /// Encode everything pushed so far as a one-entry archive into `out`.
    pub fn finish<W: Write>(self, out: W, name: impl Into<Vec<u8>>) -> ZipResult<W> {
        let name = name.into();
        let size = entry::checked_size(name.len(), self.size, self.password.is_some())?;
        let entry = ZipEntry::new(name, size, self.crc.finalize());

        let mut builder = ZipEncoderBuilder::new(entry).check_byte(self.check_byte);
        if let Some(pwd) = self.password.as_deref() {
            builder = builder.password(pwd);
        }
        let (mut zip, res) = builder.build(IoSink::new(out))?;
        res?;
        let mut replay = self.password.as_deref().map(ZipCrypto::new);
        for mut chunk in self.chunks {
            if let Some(c) = replay.as_mut() {
                c.decrypt(&mut chunk);
            }
            zip.write(&chunk)?;
        }
        zip.finalize_into_inner()
    }
}
