//! Image payloads for vision requests.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::{Result, VisionError};

/// An image ready to be sent to the vision model.
///
/// The bytes are held in memory and encoded as a base64 data URL at request
/// time; the mime type comes from the file extension when loaded from disk.
#[derive(Clone)]
pub struct ImageData {
    bytes: Vec<u8>,
    mime: String,
    source: Option<PathBuf>,
}

impl ImageData {
    /// Load an image file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| VisionError::Image(format!("{}: {e}", path.display())))?;
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            bytes,
            mime,
            source: Some(path.to_path_buf()),
        })
    }

    /// Wrap raw image bytes.
    pub fn from_bytes(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            source: None,
        }
    }

    /// The file this image was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Mime type sent with the payload.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Base64 data URL for the chat-completions image content part.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("bytes", &self.bytes.len())
            .field("mime", &self.mime)
            .field("source", &self.source)
            .finish()
    }
}
