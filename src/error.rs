use std::fmt;

#[derive(Debug)]
pub enum ZipError {
    NotZipFile,
    CorruptedFile,
    CantOpenFile(std::io::Error),
    CantOpenDestFile(std::io::Error),
    NameTooLong(usize),
    EntryTooLarge(u64),
    UnknownEncoding(String),
    Random(getrandom::Error),
    UnsupportedCompressionMethod(u16),
    InvalidFileCrc { expected: u32, got: u32 },
    PasswordNotSet,
    InvalidPassword,
    Io(std::io::Error),
}

impl fmt::Display for ZipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotZipFile => write!(f, "not a ZIP file"),
            Self::CorruptedFile => write!(f, "corrupted file"),
            Self::CantOpenFile(e) => write!(f, "can't open file: {e}"),
            Self::CantOpenDestFile(e) => write!(f, "can't open dest file: {e}"),
            Self::NameTooLong(n) => write!(f, "entry name too long: {n} bytes"),
            Self::EntryTooLarge(n) => {
                write!(f, "entry too large: {n} bytes (ZIP64 is not supported)")
            }
            Self::UnknownEncoding(l) => write!(f, "unknown encoding: {l}"),
            Self::Random(e) => write!(f, "can't generate encryption header: {e}"),
            Self::UnsupportedCompressionMethod(m) => {
                write!(f, "unsupported compression method: {m}")
            }
            Self::InvalidFileCrc { expected, got } => {
                write!(
                    f,
                    "invalid file CRC: expected {expected:08x}, got {got:08x}"
                )
            }
            Self::PasswordNotSet => write!(f, "password was not set"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ZipError {}

impl From<std::io::Error> for ZipError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<getrandom::Error> for ZipError {
    fn from(e: getrandom::Error) -> Self {
        Self::Random(e)
    }
}

pub type ZipResult<T> = Result<T, ZipError>;
