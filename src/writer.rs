//! Single-entry, stored-method ZIP encoder.
//!
//! The archive is produced in one forward pass: the local header (and the
//! encryption header, if any) goes out on construction, payload chunks are
//! forwarded as they arrive, and [`ZipEncoder::finalize`] appends the central
//! directory and end record.
//!
//! ```
//! use zipcrypt_rs::writer::ZipEncoder;
//! use zipcrypt_rs::entry::ZipEntry;
//!
//! let mut out = Vec::new();
//! let entry = ZipEntry::new("a.txt", 5, 0x3610A686);
//! let (mut zip, ()) = ZipEncoder::new(&mut out, entry, None)?;
//! zip.write(b"hello");
//! zip.finalize();
//! assert_eq!(&out[..4], b"PK\x03\x04");
//! # Ok::<(), zipcrypt_rs::error::ZipError>(())
//! ```

use std::io::Write;

use crate::crypto::{ENCR_HEADER_LEN, ZipCrypto};
use crate::entry::ZipEntry;
use crate::error::{ZipError, ZipResult};
use crate::header::{self, FLAG_ENCRYPTED};
use crate::sink::{IoSink, Sink};

/// Which CRC byte goes into the last slot of the encryption header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckByte {
    /// Low-order byte of the CRC-32.
    #[default]
    CrcLow,
    /// High-order byte of the CRC-32, as described in PKWARE's APPNOTE.
    CrcHigh,
}

impl CheckByte {
    fn select(self, crc: u32) -> u8 {
        match self {
            Self::CrcLow => crc as u8,
            Self::CrcHigh => (crc >> 24) as u8,
        }
    }
}

/// Builds a [`ZipEncoder`].
#[derive(Debug, Clone)]
pub struct ZipEncoderBuilder<'a> {
    entry: ZipEntry,
    password: Option<&'a [u8]>,
    header_seed: Option<[u8; ENCR_HEADER_LEN]>,
    check_byte: CheckByte,
}

impl<'a> ZipEncoderBuilder<'a> {
    pub fn new(entry: ZipEntry) -> Self {
        ZipEncoderBuilder {
            entry,
            password: None,
            header_seed: None,
            check_byte: CheckByte::default(),
        }
    }

    /// Encrypt the entry with ZipCrypto.
    pub fn password(mut self, password: &'a [u8]) -> Self {
        self.password = Some(password);
        self
    }

    /// Use fixed bytes instead of OS randomness for the encryption header.
    /// Only meant for reproducible output.
    pub fn header_seed(mut self, seed: [u8; ENCR_HEADER_LEN]) -> Self {
        self.header_seed = Some(seed);
        self
    }

    pub fn check_byte(mut self, check_byte: CheckByte) -> Self {
        self.check_byte = check_byte;
        self
    }

    /// Emit the local header (plus encryption header) into `sink` as one
    /// write, and return the encoder together with that write's output.
    ///
    /// The bytes are the same as writing the two headers separately, but a
    /// sink sees a single call here, so construction yields one output.
    pub fn build<S: Sink>(self, mut sink: S) -> ZipResult<(ZipEncoder<S>, S::Output)> {
        let entry = self.entry;
        if entry.name().len() > u16::MAX as usize {
            return Err(ZipError::NameTooLong(entry.name().len()));
        }

        let mut cipher = self.password.map(ZipCrypto::new);
        let flags = if cipher.is_some() { FLAG_ENCRYPTED } else { 0 };

        let mut head = header::local_file_header(&entry, flags);
        if let Some(c) = cipher.as_mut() {
            let seed = match self.header_seed {
                Some(seed) => seed,
                None => {
                    let mut seed = [0u8; ENCR_HEADER_LEN];
                    getrandom::getrandom(&mut seed)?;
                    seed
                }
            };
            let check = self.check_byte.select(entry.crc32());
            head.extend_from_slice(&c.encrypt_header(seed, check));
        }

        let zip_size = head.len() as u64;
        let output = sink.write(&head);

        let encoder = ZipEncoder {
            sink,
            entry,
            flags,
            cipher,
            zip_size,
            scratch: Vec::new(),
        };
        Ok((encoder, output))
    }
}

/// Streams one stored entry into a [`Sink`].
///
/// The total length of all chunks passed to [`write`](Self::write) must equal
/// the entry's declared size, and their CRC must equal the declared CRC.
/// Neither is checked.
pub struct ZipEncoder<S: Sink> {
    sink: S,
    entry: ZipEntry,
    flags: u16,
    cipher: Option<ZipCrypto>,
    zip_size: u64,
    scratch: Vec<u8>,
}

impl<S: Sink> ZipEncoder<S> {
    /// Start an archive. With a password the entry is encrypted and the
    /// encryption header comes from the OS random source.
    pub fn new(sink: S, entry: ZipEntry, password: Option<&[u8]>) -> ZipResult<(Self, S::Output)> {
        let mut builder = ZipEncoderBuilder::new(entry);
        if let Some(pwd) = password {
            builder = builder.password(pwd);
        }
        builder.build(sink)
    }

    pub fn entry(&self) -> &ZipEntry {
        &self.entry
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Bytes handed to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.zip_size
    }

    /// Forward the next chunk of plaintext, encrypting it if needed.
    pub fn write(&mut self, chunk: &[u8]) -> S::Output {
        self.zip_size += chunk.len() as u64;
        match self.cipher.as_mut() {
            Some(c) => {
                self.scratch.clear();
                self.scratch.extend_from_slice(chunk);
                c.encrypt(&mut self.scratch);
                self.sink.write(&self.scratch)
            }
            None => self.sink.write(chunk),
        }
    }

    /// Write the central directory and end record in one sink write.
    pub fn finalize(self) -> S::Output {
        self.finish_parts().1
    }

    fn finish_parts(mut self) -> (S, S::Output) {
        let central = header::central_directory_header(&self.entry, self.flags);
        let eocd = header::end_of_central_directory(central.len() as u32, self.zip_size as u32);

        let mut tail = central;
        tail.extend_from_slice(&eocd);
        let output = self.sink.write(&tail);
        (self.sink, output)
    }
}

impl<W: Write> ZipEncoder<IoSink<W>> {
    /// Finalize and hand back the flushed writer.
    pub fn finalize_into_inner(self) -> ZipResult<W> {
        let (sink, res) = self.finish_parts();
        res?;
        let mut inner = sink.into_inner();
        inner.flush()?;
        Ok(inner)
    }
}
