//! Entry-name code pages.
//!
//! The encoder never sets the UTF-8 name flag, so readers fall back to a
//! legacy code page for names that are not plain ASCII. Encoding the name up
//! front lets the caller pick the code page the consumer expects.

use encoding_rs::Encoding;

use crate::error::{ZipError, ZipResult};

fn lookup(label: &str) -> ZipResult<&'static Encoding> {
    Encoding::for_label(label.as_bytes()).ok_or_else(|| ZipError::UnknownEncoding(label.to_string()))
}

/// Encode an entry name. `None` keeps the UTF-8 bytes.
/// Characters the code page can't represent become numeric character
/// references, as encoding_rs does for every legacy encoder.
pub fn encode_name(name: &str, label: Option<&str>) -> ZipResult<Vec<u8>> {
    match label {
        None => Ok(name.as_bytes().to_vec()),
        Some(label) => {
            let (cow, _encoding_used, _had_errors) = lookup(label)?.encode(name);
            Ok(cow.into_owned())
        }
    }
}

/// Decode raw name bytes to a UTF-8 string.
/// Valid UTF-8 is used as is; otherwise the given code page applies, or
/// EUC-KR (CP949) when none is given.
pub fn decode_name(bytes: &[u8], label: Option<&str>) -> ZipResult<String> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Ok(s.to_string());
    }

    let encoding = match label {
        Some(label) => lookup(label)?,
        None => encoding_rs::EUC_KR,
    };
    let (cow, _encoding_used, _had_errors) = encoding.decode(bytes);
    Ok(cow.into_owned())
}
