use crate::error::{BackdropError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

/// `data:<mime>;base64,<payload>` split into mime type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| BackdropError::InvalidDataUri(preview(uri)))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| BackdropError::InvalidDataUri(preview(uri)))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| BackdropError::InvalidDataUri(preview(uri)))?;
    let bytes = BASE64_STANDARD.decode(payload.trim())?;
    Ok((mime.to_string(), bytes))
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    let encoded = BASE64_STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, encoded)
}

/// Mime type for an image file extension, defaulting to PNG.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "image/png",
    }
}

// Error messages carry only the start of a possibly huge URI.
fn preview(uri: &str) -> String {
    uri.chars().take(32).collect()
}
