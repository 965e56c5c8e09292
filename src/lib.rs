pub mod archive;
pub mod crc;
pub mod crypto;
pub mod encoding;
pub mod entry;
pub mod error;
pub mod extract;
pub mod header;
pub mod sink;
pub mod spool;
pub mod writer;
