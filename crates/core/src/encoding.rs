use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

/// A validated, normalized image data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDataUrl {
    #[serde(rename = "dataUrl")]
    pub data_url: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub bytes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("input is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("decoded bytes do not look like a png, jpeg, or gif image")]
    UnrecognizedImage,
}

pub fn encode_text(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

pub fn decode_text(encoded: &str) -> Result<String, EncodingError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Normalize raw base64 or a full data URL into `data:<mime>;base64,<payload>`.
///
/// The media type is sniffed from the decoded magic bytes, not trusted from
/// any incoming prefix.
pub fn image_data_url(input: &str) -> Result<ImageDataUrl, EncodingError> {
    let payload = input.trim();
    let payload = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    let payload: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD.decode(payload.as_bytes())?;
    let mime_type = sniff_image_mime(&bytes).ok_or(EncodingError::UnrecognizedImage)?;

    Ok(ImageDataUrl {
        data_url: format!("data:{mime_type};base64,{payload}"),
        mime_type: mime_type.to_string(),
        bytes: bytes.len(),
    })
}

fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A complete 1x1 transparent png.
    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

    #[test]
    fn text_round_trips() {
        let encoded = encode_text("hello, utilbelt");
        assert_eq!(encoded, "aGVsbG8sIHV0aWxiZWx0");
        assert_eq!(decode_text(&encoded).unwrap(), "hello, utilbelt");
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        assert!(matches!(
            decode_text("not base64!!!"),
            Err(EncodingError::InvalidBase64(_))
        ));
    }

    #[test]
    fn decode_rejects_non_utf8_bytes() {
        // 0xFF on its own is not valid UTF-8.
        assert!(matches!(
            decode_text("/w=="),
            Err(EncodingError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn raw_base64_becomes_a_png_data_url() {
        let image = image_data_url(PNG_1X1).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data_url, format!("data:image/png;base64,{PNG_1X1}"));
        assert!(image.bytes > 0);
    }

    #[test]
    fn existing_data_url_prefix_is_replaced_by_sniffed_type() {
        let input = format!("data:application/octet-stream;base64,{PNG_1X1}");
        let image = image_data_url(&input).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data_url, format!("data:image/png;base64,{PNG_1X1}"));
    }

    #[test]
    fn jpeg_magic_bytes_are_sniffed() {
        let payload = STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);
        let image = image_data_url(&payload).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn non_image_bytes_are_rejected() {
        let payload = encode_text("just some text");
        assert!(matches!(
            image_data_url(&payload),
            Err(EncodingError::UnrecognizedImage)
        ));
    }

    #[test]
    fn embedded_line_breaks_are_stripped_before_decoding() {
        let (head, tail) = PNG_1X1.split_at(20);
        let wrapped = format!("{head}\r\n{tail}");
        let image = image_data_url(&wrapped).unwrap();
        assert_eq!(image.data_url, format!("data:image/png;base64,{PNG_1X1}"));
    }
}
