//! Reader for stored ZIP archives without ZIP64, enough to list and verify
//! what [`ZipEncoder`](crate::writer::ZipEncoder) produces.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::encoding::decode_name;
use crate::error::{ZipError, ZipResult};
use crate::header::{
    CENTRAL_HEADER_LEN, EOCD_LEN, FLAG_ENCRYPTED, LOCAL_HEADER_LEN, METHOD_STORE,
    SIG_CENTRAL_DIRECTORY, SIG_END_OF_CENTRAL_DIR, SIG_LOCAL_FILE_HEADER,
};

const MAX_COMMENT_LEN: u64 = u16::MAX as u64;

trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Store,
    Other(u16),
}

impl CompressionMethod {
    fn from_id(id: u16) -> Self {
        match id {
            METHOD_STORE => Self::Store,
            n => Self::Other(n),
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store => write!(f, "Stored"),
            Self::Other(n) => write!(f, "Method{n}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub raw_name: Vec<u8>,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub file_crc: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub header_offset: u64,
    /// Start of the stored bytes, encryption header included.
    pub data_pos: u64,
}

impl ZipFileEntry {
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }
}

pub struct ZipArchive {
    reader: Box<dyn ReadSeek>,
    pub entries: Vec<ZipFileEntry>,
    pub is_encrypted: bool,
}

fn le_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

impl ZipArchive {
    pub fn open(path: &str) -> ZipResult<Self> {
        let file = File::open(path).map_err(ZipError::CantOpenFile)?;
        Self::from_reader(Box::new(file))
    }

    pub fn from_bytes(data: Vec<u8>) -> ZipResult<Self> {
        Self::from_reader(Box::new(Cursor::new(data)))
    }

    fn from_reader(reader: Box<dyn ReadSeek>) -> ZipResult<Self> {
        let mut archive = ZipArchive {
            reader,
            entries: Vec::new(),
            is_encrypted: false,
        };
        archive.parse()?;
        Ok(archive)
    }

    /// Positioned read access for extraction.
    pub(crate) fn seek_to(&mut self, pos: u64) -> ZipResult<&mut dyn Read> {
        self.reader.seek(SeekFrom::Start(pos))?;
        let reader: &mut dyn Read = &mut self.reader;
        Ok(reader)
    }

    fn parse(&mut self) -> ZipResult<()> {
        let file_len = self.reader.seek(SeekFrom::End(0))?;
        let (eocd_pos, eocd) = self.find_eocd(file_len)?;

        let total_entries = le_u16(&eocd, 10) as usize;
        let cd_size = le_u32(&eocd, 12) as u64;
        let cd_offset = le_u32(&eocd, 16) as u64;
        if cd_offset + cd_size > eocd_pos {
            return Err(ZipError::CorruptedFile);
        }

        let mut cd = vec![0u8; cd_size as usize];
        self.reader.seek(SeekFrom::Start(cd_offset))?;
        self.reader.read_exact(&mut cd)?;

        let mut pos = 0usize;
        for _ in 0..total_entries {
            let (entry, next) = parse_central_header(&cd, pos)?;
            pos = next;
            self.entries.push(entry);
        }

        for i in 0..self.entries.len() {
            let data_pos = self.read_local_header(self.entries[i].header_offset)?;
            if data_pos + self.entries[i].compressed_size > cd_offset {
                return Err(ZipError::CorruptedFile);
            }
            self.entries[i].data_pos = data_pos;
        }

        self.is_encrypted = self.entries.iter().any(ZipFileEntry::is_encrypted);
        Ok(())
    }

    /// Scan back from the tail for the end record. The record is only
    /// accepted if its comment length reaches exactly to end of file.
    fn find_eocd(&mut self, file_len: u64) -> ZipResult<(u64, [u8; EOCD_LEN])> {
        if file_len < EOCD_LEN as u64 {
            return Err(ZipError::NotZipFile);
        }
        let tail_len = file_len.min(EOCD_LEN as u64 + MAX_COMMENT_LEN);
        let tail_start = file_len - tail_len;
        let mut tail = vec![0u8; tail_len as usize];
        self.reader.seek(SeekFrom::Start(tail_start))?;
        self.reader.read_exact(&mut tail)?;

        for at in (0..=tail.len() - EOCD_LEN).rev() {
            if le_u32(&tail, at) != SIG_END_OF_CENTRAL_DIR {
                continue;
            }
            let comment_len = le_u16(&tail, at + 20) as usize;
            if at + EOCD_LEN + comment_len != tail.len() {
                continue;
            }
            let mut eocd = [0u8; EOCD_LEN];
            eocd.copy_from_slice(&tail[at..at + EOCD_LEN]);
            return Ok((tail_start + at as u64, eocd));
        }
        Err(ZipError::NotZipFile)
    }

    /// Returns the position just past the local header.
    fn read_local_header(&mut self, header_offset: u64) -> ZipResult<u64> {
        let mut head = [0u8; LOCAL_HEADER_LEN];
        self.reader.seek(SeekFrom::Start(header_offset))?;
        self.reader.read_exact(&mut head)?;
        if le_u32(&head, 0) != SIG_LOCAL_FILE_HEADER {
            return Err(ZipError::CorruptedFile);
        }
        let name_len = le_u16(&head, 26) as u64;
        let extra_len = le_u16(&head, 28) as u64;
        Ok(header_offset + LOCAL_HEADER_LEN as u64 + name_len + extra_len)
    }
}

fn parse_central_header(cd: &[u8], pos: usize) -> ZipResult<(ZipFileEntry, usize)> {
    let fixed = cd
        .get(pos..pos + CENTRAL_HEADER_LEN)
        .ok_or(ZipError::CorruptedFile)?;
    if le_u32(fixed, 0) != SIG_CENTRAL_DIRECTORY {
        return Err(ZipError::CorruptedFile);
    }

    let name_len = le_u16(fixed, 28) as usize;
    let extra_len = le_u16(fixed, 30) as usize;
    let comment_len = le_u16(fixed, 32) as usize;
    let name_start = pos + CENTRAL_HEADER_LEN;
    let raw_name = cd
        .get(name_start..name_start + name_len)
        .ok_or(ZipError::CorruptedFile)?
        .to_vec();
    let next = name_start + name_len + extra_len + comment_len;
    if next > cd.len() {
        return Err(ZipError::CorruptedFile);
    }

    let entry = ZipFileEntry {
        file_name: decode_name(&raw_name, None)?,
        raw_name,
        flags: le_u16(fixed, 8),
        compression_method: CompressionMethod::from_id(le_u16(fixed, 10)),
        file_crc: le_u32(fixed, 16),
        compressed_size: le_u32(fixed, 20) as u64,
        uncompressed_size: le_u32(fixed, 24) as u64,
        header_offset: le_u32(fixed, 42) as u64,
        data_pos: 0,
    };
    Ok((entry, next))
}
