use base64::{engine::general_purpose::STANDARD, Engine};
use std::{fmt, path::Path, sync::Arc};
use thiserror::Error;

const IMAGE_MIME_PREFIX: &str = "image/";

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Image file is empty")]
    Empty,
    #[error("Failed to read image file: {0}")]
    ReadFailed(#[from] std::io::Error),
    #[error("Declared content type `{0}` is not an image")]
    NotAnImage(String),
    #[error("Could not recognize image format: {0}")]
    UnrecognizedFormat(#[from] image::ImageError),
}

/// Self-contained `data:` URL encoding of an image, usable both as the
/// classification request body and as an `<img src>`.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data_url: Arc<str>,
    content_type_len: usize,
}

impl ImagePayload {
    /// Encodes raw image bytes. A declared `image/*` type is trusted as the
    /// browser would; anything else is sniffed from the bytes.
    pub fn from_bytes(bytes: &[u8], declared_type: Option<&str>) -> Result<Self, PayloadError> {
        if bytes.is_empty() {
            return Err(PayloadError::Empty);
        }

        // Parameters such as `; charset=` never reach the data URL.
        let essence = declared_type.map(|declared| {
            declared
                .split(';')
                .next()
                .unwrap_or(declared)
                .trim()
        });
        let content_type = match essence {
            Some(declared) if is_image_type(declared) => declared.to_ascii_lowercase(),
            _ => image::guess_format(bytes)?.to_mime_type().to_string(),
        };

        let data_url = format!("data:{};base64,{}", content_type, STANDARD.encode(bytes));

        Ok(Self {
            content_type_len: content_type.len(),
            data_url: data_url.into(),
        })
    }

    /// Same as [`ImagePayload::from_bytes`], but refuses any declared type that
    /// is not `image/*`. Drops go through this path.
    pub fn from_declared_image(bytes: &[u8], declared_type: &str) -> Result<Self, PayloadError> {
        if !is_image_type(declared_type) {
            return Err(PayloadError::NotAnImage(declared_type.to_string()));
        }
        Self::from_bytes(bytes, Some(declared_type))
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, PayloadError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Self::from_bytes(&bytes, None)
    }

    pub fn as_str(&self) -> &str {
        &self.data_url
    }

    pub fn content_type(&self) -> &str {
        let start = "data:".len();
        &self.data_url[start..start + self.content_type_len]
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("content_type", &self.content_type())
            .field("len", &self.data_url.len())
            .finish()
    }
}

pub fn is_image_type(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with(IMAGE_MIME_PREFIX)
}
