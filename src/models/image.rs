//! Captured image payloads
//!
//! Opaque to the nutrition engine; only the inference backend looks inside.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const JPEG_MIME: &str = "image/jpeg";

/// One captured frame
#[derive(Clone, PartialEq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            mime_type: JPEG_MIME.to_string(),
            data,
        }
    }

    /// Decode a base64 payload, tolerating a `data:<mime>;base64,` prefix
    pub fn from_base64(encoded: &str, mime_type: Option<&str>) -> Result<Self, base64::DecodeError> {
        let (prefix_mime, body) = match encoded.split_once(";base64,") {
            Some((head, body)) => (head.strip_prefix("data:"), body),
            None => (None, encoded),
        };
        let data = STANDARD.decode(body.trim())?;
        let mime_type = mime_type.or(prefix_mime).unwrap_or(JPEG_MIME).to_string();
        Ok(Self { mime_type, data })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_base64_with_data_url() {
        let image = ImagePayload::from_base64("data:image/png;base64,AQID", None).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, vec![1, 2, 3]);
        assert_eq!(image.to_base64(), "AQID");
    }

    #[test]
    fn test_from_base64_defaults_to_jpeg() {
        let image = ImagePayload::from_base64("AQID", None).unwrap();
        assert_eq!(image.mime_type, JPEG_MIME);
        assert!(ImagePayload::from_base64("not base64!", None).is_err());
    }
}
