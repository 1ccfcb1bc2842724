//! Photo and signature uploads.

use axum::body::Bytes;
use cardshop_core::ExternalBlob;

/// Content types accepted for the card photo and signature files.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Largest accepted upload (5 MB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const INVALID_IMAGE_MESSAGE: &str = "Please upload a valid image file (JPEG, PNG, or WebP)";
pub const TOO_LARGE_MESSAGE: &str = "File size must be less than 5MB";
pub const PHOTO_REQUIRED_MESSAGE: &str = "Photo is required";
pub const SIGNATURE_REQUIRED_MESSAGE: &str = "Signature is required";
pub const UNREADABLE_SIGNATURE_MESSAGE: &str = "Signature could not be read. Please sign again";

/// A file part from a multipart form.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    /// Browsers submit an empty part when no file was chosen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Declared content type, falling back to sniffing the bytes when the
    /// browser sent none or a generic one.
    #[must_use]
    pub fn effective_content_type(&self) -> String {
        match self.content_type.as_deref() {
            Some(declared) if !declared.is_empty() && declared != "application/octet-stream" => {
                declared.to_ascii_lowercase()
            }
            _ => ExternalBlob::from_bytes(self.bytes.to_vec())
                .content_type()
                .to_string(),
        }
    }

    /// Check type and size.
    ///
    /// # Errors
    ///
    /// Returns the message to show next to the file input.
    pub fn validate_image(&self) -> Result<(), &'static str> {
        let content_type = self.effective_content_type();
        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(INVALID_IMAGE_MESSAGE);
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(TOO_LARGE_MESSAGE);
        }
        Ok(())
    }

    #[must_use]
    pub fn into_blob(self) -> ExternalBlob {
        ExternalBlob::from_bytes(self.bytes.to_vec())
    }
}

/// Validate the card photo.
///
/// # Errors
///
/// Returns the message to show next to the photo input.
pub fn photo_blob(photo: Option<Upload>) -> Result<ExternalBlob, &'static str> {
    let photo = photo
        .filter(|p| !p.is_empty())
        .ok_or(PHOTO_REQUIRED_MESSAGE)?;
    photo.validate_image()?;
    Ok(photo.into_blob())
}

/// Validate the signature: a data URL drawn on the signature pad, or an
/// uploaded image when scripting is unavailable. The drawn signature wins.
///
/// # Errors
///
/// Returns the message to show next to the signature pad.
pub fn signature_blob(
    data_url: Option<&str>,
    file: Option<Upload>,
) -> Result<ExternalBlob, &'static str> {
    if let Some(data_url) = data_url.map(str::trim).filter(|d| !d.is_empty()) {
        let blob =
            ExternalBlob::from_data_url(data_url).map_err(|_| UNREADABLE_SIGNATURE_MESSAGE)?;
        let drawn = Upload {
            file_name: None,
            content_type: data_url_media_type(data_url).map(String::from),
            bytes: Bytes::from(blob.bytes().unwrap_or_default().to_vec()),
        };
        if drawn.is_empty() {
            return Err(SIGNATURE_REQUIRED_MESSAGE);
        }
        drawn.validate_image()?;
        return Ok(drawn.into_blob());
    }

    let file = file
        .filter(|f| !f.is_empty())
        .ok_or(SIGNATURE_REQUIRED_MESSAGE)?;
    file.validate_image()?;
    Ok(file.into_blob())
}

/// Media type of a `data:` URL, e.g. `image/png` in `data:image/png;base64,...`.
fn data_url_media_type(data_url: &str) -> Option<&str> {
    let meta = data_url.strip_prefix("data:")?.split(',').next()?;
    meta.split(';').next().map(str::trim)
}
