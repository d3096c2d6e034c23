//! `data:<media-type>;base64,<payload>` encoding used for inline buffers and images

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{AssetError, Result};

/// Media type written for inline geometry buffers
pub const OCTET_STREAM: &str = "application/octet-stream";

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Decoded inline payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub media_type: String,
    pub data: Vec<u8>,
}

/// Whether a URI carries its payload inline
pub fn is_data_uri(uri: &str) -> bool {
    uri.starts_with(DATA_PREFIX)
}

/// Encode bytes as a base64 data URI
pub fn encode_data_uri(media_type: &str, data: &[u8]) -> String {
    format!(
        "{DATA_PREFIX}{media_type}{BASE64_MARKER},{}",
        STANDARD.encode(data)
    )
}

/// Decode a base64 data URI
///
/// The header and payload must be separated by a comma and the header must
/// declare base64 encoding.
pub fn decode_data_uri(uri: &str) -> Result<DataUri> {
    let rest = uri
        .strip_prefix(DATA_PREFIX)
        .ok_or_else(|| AssetError::MalformedDataUri("missing 'data:' prefix".to_string()))?;

    let (header, payload) = rest.split_once(',').ok_or_else(|| {
        AssetError::MalformedDataUri("missing ',' between header and payload".to_string())
    })?;

    let media_type = header.strip_suffix(BASE64_MARKER).ok_or_else(|| {
        AssetError::MalformedDataUri(format!("header '{header}' is not base64 encoded"))
    })?;

    let data = STANDARD
        .decode(payload.trim())
        .map_err(|e| AssetError::MalformedDataUri(e.to_string()))?;

    Ok(DataUri {
        media_type: media_type.to_string(),
        data,
    })
}

/// File extension for an inline image's media type
///
/// PNG payloads keep `png`; everything else is written as `jpg`.
pub fn extension_for_media_type(media_type: &str) -> &'static str {
    if media_type.to_ascii_lowercase().contains("png") {
        "png"
    } else {
        "jpg"
    }
}
