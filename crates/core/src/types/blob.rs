//! Opaque binary references attached to orders (photos, signatures).

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Errors that can occur when decoding an [`ExternalBlob`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobError {
    /// Neither inline bytes nor a URL were supplied.
    #[error("blob must carry either bytes or a url")]
    Empty,
    /// Both inline bytes and a URL were supplied.
    #[error("blob cannot carry both bytes and a url")]
    Ambiguous,
    /// Inline bytes were not valid base64.
    #[error("blob bytes are not valid base64")]
    InvalidBase64,
    /// A data URL could not be decoded.
    #[error("malformed data url")]
    MalformedDataUrl,
}

/// Binary content that is either held inline or referenced by URL.
///
/// Inline bytes are reference-counted, so cloning an order that carries a
/// photo does not copy the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BlobRepr", into = "BlobRepr")]
pub enum ExternalBlob {
    /// Bytes held in memory.
    Bytes(Arc<[u8]>),
    /// Content stored elsewhere.
    Url(String),
}

impl ExternalBlob {
    /// Wrap raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Reference content by URL.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Decode a `data:<mime>;base64,<payload>` URL into inline bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a base64 data URL.
    pub fn from_data_url(data_url: &str) -> Result<Self, BlobError> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or(BlobError::MalformedDataUrl)?;
        let (meta, payload) = rest.split_once(',').ok_or(BlobError::MalformedDataUrl)?;
        if !meta.ends_with(";base64") {
            return Err(BlobError::MalformedDataUrl);
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| BlobError::InvalidBase64)?;
        Ok(Self::from_bytes(bytes))
    }

    /// Inline bytes, if the blob is held in memory.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Url(_) => None,
        }
    }

    /// Remote URL, if the blob is stored elsewhere.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Bytes(_) => None,
            Self::Url(url) => Some(url),
        }
    }

    /// Best-effort content type of inline bytes, sniffed from magic numbers.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self.bytes() {
            Some([0xFF, 0xD8, 0xFF, ..]) => "image/jpeg",
            Some([0x89, b'P', b'N', b'G', ..]) => "image/png",
            Some([b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..]) => "image/webp",
            _ => "application/octet-stream",
        }
    }

    /// A URL that renders the content directly: a `data:` URL for inline
    /// bytes, or the stored URL.
    #[must_use]
    pub fn direct_url(&self) -> String {
        match self {
            Self::Bytes(bytes) => format!(
                "data:{};base64,{}",
                self.content_type(),
                STANDARD.encode(bytes)
            ),
            Self::Url(url) => url.clone(),
        }
    }

    /// Size of inline content in bytes (zero for URL references).
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes().map_or(0, <[u8]>::len)
    }

    /// Whether the blob carries no inline bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wire form: `{"bytes": "<base64>"}` or `{"url": "..."}`.
#[derive(Serialize, Deserialize)]
struct BlobRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bytes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl TryFrom<BlobRepr> for ExternalBlob {
    type Error = BlobError;

    fn try_from(repr: BlobRepr) -> Result<Self, Self::Error> {
        match (repr.bytes, repr.url) {
            (Some(encoded), None) => STANDARD
                .decode(encoded)
                .map(Self::from_bytes)
                .map_err(|_| BlobError::InvalidBase64),
            (None, Some(url)) => Ok(Self::Url(url)),
            (Some(_), Some(_)) => Err(BlobError::Ambiguous),
            (None, None) => Err(BlobError::Empty),
        }
    }
}

impl From<ExternalBlob> for BlobRepr {
    fn from(blob: ExternalBlob) -> Self {
        match blob {
            ExternalBlob::Bytes(bytes) => Self {
                bytes: Some(STANDARD.encode(bytes)),
                url: None,
            },
            ExternalBlob::Url(url) => Self {
                bytes: None,
                url: Some(url),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_direct_url_for_inline_bytes() {
        let blob = ExternalBlob::from_bytes(PNG_HEADER.to_vec());
        assert_eq!(blob.content_type(), "image/png");
        assert_eq!(blob.direct_url(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_direct_url_for_remote() {
        let blob = ExternalBlob::from_url("https://cdn.example.com/a.jpg");
        assert_eq!(blob.direct_url(), "https://cdn.example.com/a.jpg");
        assert!(blob.bytes().is_none());
        assert!(blob.is_empty());
    }

    #[test]
    fn test_from_data_url() {
        let blob = ExternalBlob::from_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(blob.bytes().unwrap(), PNG_HEADER);
        assert_eq!(blob.len(), 8);

        assert_eq!(
            ExternalBlob::from_data_url("image/png;base64,AAAA"),
            Err(BlobError::MalformedDataUrl)
        );
        assert_eq!(
            ExternalBlob::from_data_url("data:text/plain,hello"),
            Err(BlobError::MalformedDataUrl)
        );
        assert_eq!(
            ExternalBlob::from_data_url("data:image/png;base64,***"),
            Err(BlobError::InvalidBase64)
        );
    }

    #[test]
    fn test_content_type_sniffing() {
        assert_eq!(
            ExternalBlob::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]).content_type(),
            "image/jpeg"
        );
        let mut webp = b"RIFF".to_vec();
        webp.extend_from_slice(&[0, 0, 0, 0]);
        webp.extend_from_slice(b"WEBPVP8 ");
        assert_eq!(ExternalBlob::from_bytes(webp).content_type(), "image/webp");
        assert_eq!(
            ExternalBlob::from_bytes(vec![1, 2, 3]).content_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_wire_form() {
        let json = serde_json::to_value(ExternalBlob::from_url("https://x.test/p")).unwrap();
        assert_eq!(json, serde_json::json!({ "url": "https://x.test/p" }));

        let blob: ExternalBlob = serde_json::from_value(serde_json::json!({ "bytes": "AQID" })).unwrap();
        assert_eq!(blob.bytes().unwrap(), [1, 2, 3]);

        assert!(serde_json::from_value::<ExternalBlob>(serde_json::json!({})).is_err());
        assert!(
            serde_json::from_value::<ExternalBlob>(
                serde_json::json!({ "bytes": "AQID", "url": "https://x.test" })
            )
            .is_err()
        );
    }
}
