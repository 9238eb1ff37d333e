//! Normalisation of base64 media payloads sent by the portals.
//!
//! Browsers hand us either a bare base64 string or a data URL such as
//! `data:image/png;base64,iVBOR...`. Upstream model APIs and object storage
//! want the bare payload plus a MIME type, so the prefix is split off here.
//! Anything starting with `data:` is a data URL and must declare `;base64`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;

/// A base64 media payload with its data-URL prefix removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload<'a> {
    pub mime_type: String,
    pub data: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("media payload is empty")]
    Empty,
    #[error("data URL is malformed or not base64 encoded")]
    NotBase64,
}

impl MediaError {
    /// Client-facing message naming the request field that carried the payload
    pub fn for_field(&self, field: &str) -> String {
        match self {
            MediaError::Empty => format!("{} is required", field),
            MediaError::NotBase64 => format!("{} must be base64 or a base64 data URL", field),
        }
    }
}

/// Split a payload into its MIME type and bare base64 data.
///
/// `default_mime` is used for bare payloads and for data URLs that omit the
/// media type (`data:;base64,...`).
pub fn normalize<'a>(payload: &'a str, default_mime: &str) -> Result<MediaPayload<'a>, MediaError> {
    let trimmed = payload.trim();
    let (mime, data) = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (mime, data) = split_data_url(rest).ok_or(MediaError::NotBase64)?;
            (mime.unwrap_or(default_mime), data.trim())
        }
        None => (default_mime, trimmed),
    };

    if data.is_empty() {
        return Err(MediaError::Empty);
    }

    Ok(MediaPayload {
        mime_type: mime.to_ascii_lowercase(),
        data,
    })
}

/// Decode a normalised payload into raw bytes
pub fn decode(media: &MediaPayload<'_>) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(media.data)
}

/// Encode raw bytes for inline transmission
pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// File extension used when storing a payload of the given MIME type
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// Whether a MIME type is an image format we accept for report photos
pub fn is_supported_image(mime_type: &str) -> bool {
    extension_for_mime(mime_type) != "bin"
}

/// Split the part after `data:` into media type and payload; `None` unless
/// the header ends in `;base64`
fn split_data_url(rest: &str) -> Option<(Option<&str>, &str)> {
    let (header, data) = rest.split_once(',')?;
    let mime = header.trim().strip_suffix(";base64")?;
    let mime = mime.split(';').next().filter(|m| !m.is_empty());
    Some((mime, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_reads_mime_from_prefix() {
        let media = normalize("data:image/PNG;base64,iVBORw0KGgo=", "image/jpeg").unwrap();
        assert_eq!(media.mime_type, "image/png");
        assert_eq!(media.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_normalize_defaults_mime_for_bare_payload() {
        let media = normalize("  GkXfo59ChoEBQveBAULygQRC  ", "audio/webm").unwrap();
        assert_eq!(media.mime_type, "audio/webm");
        assert_eq!(media.data, "GkXfo59ChoEBQveBAULygQRC");
    }

    #[test]
    fn test_normalize_handles_codec_parameters() {
        let media = normalize("data:audio/webm;codecs=opus;base64,GkXf", "audio/ogg").unwrap();
        assert_eq!(media.mime_type, "audio/webm");
        assert_eq!(media.data, "GkXf");
    }

    #[test]
    fn test_normalize_rejects_empty_payloads() {
        assert_eq!(normalize("", "image/jpeg"), Err(MediaError::Empty));
        assert_eq!(normalize("   ", "image/jpeg"), Err(MediaError::Empty));
        assert_eq!(
            normalize("data:image/jpeg;base64,", "image/jpeg"),
            Err(MediaError::Empty)
        );
    }

    #[test]
    fn test_normalize_rejects_non_base64_data_urls() {
        assert_eq!(
            normalize("data:image/jpeg,%FF%D8%FF", "image/jpeg"),
            Err(MediaError::NotBase64)
        );
        assert_eq!(
            normalize("data:text/plain;charset=utf-8,hello", "image/jpeg"),
            Err(MediaError::NotBase64)
        );
        assert_eq!(
            normalize("data:image/png;base64", "image/jpeg"),
            Err(MediaError::NotBase64)
        );
        assert_eq!(
            MediaError::NotBase64.for_field("imageBase64"),
            "imageBase64 must be base64 or a base64 data URL"
        );
    }

    #[test]
    fn test_decode_and_extension() {
        let url = format!("data:image/png;base64,{}", encode(b"png!"));
        let media = normalize(&url, "x").unwrap();
        assert_eq!(decode(&media).unwrap(), b"png!");
        assert_eq!(extension_for_mime(&media.mime_type), "png");
        assert!(!is_supported_image("application/pdf"));
    }
}
