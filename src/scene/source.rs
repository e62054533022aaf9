//! Provides the byte sources backing a scene: decoded embedded data URIs.
//!
//! Each document buffer maps to exactly one [`ByteSource`] at the same
//! position, so two buffers can never collapse onto one name.
//!
//! # Examples
//! ```
//! use sceneload::scene::source::decode_data_uri;
//!
//! let bytes = decode_data_uri("data:application/octet-stream;base64,AACAPw==").unwrap();
//! assert_eq!(bytes, 1.0f32.to_le_bytes());
//! ```

use base64::Engine;

use super::document::SceneDocument;
use super::error::{DataUriError, LoadError, LoadResult};
use super::view::ByteRange;
use super::LoadOptions;

/// Decodes an embedded data URI to raw bytes.
///
/// Everything before the first `,` (the `data:` scheme and media type) is
/// ignored; the rest must be standard base64 with padding.
///
/// # Examples
/// ```
/// use sceneload::scene::source::decode_data_uri;
///
/// assert_eq!(decode_data_uri("ignored,aGk=").unwrap(), b"hi");
/// assert!(decode_data_uri("Monster.bin").is_err());
/// ```
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, DataUriError> {
    let (_, encoded) = uri.split_once(',').ok_or(DataUriError::MissingSeparator)?;
    Ok(base64::engine::general_purpose::STANDARD.decode(encoded)?)
}

/// The decoded bytes of one document buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteSource {
    /// The buffer's id if the document keys its buffers, else its position.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Decoded buffers, in the same order as the document's buffer list.
#[derive(Debug, Default)]
pub struct ByteSources {
    sources: Vec<ByteSource>,
}

impl ByteSources {
    /// Decodes every buffer of `doc`.
    ///
    /// # Errors
    /// Returns [`LoadError::TooManyBuffers`] if the document declares more
    /// buffers than `options.max_buffers`, or [`LoadError::Decode`] for the
    /// first buffer whose URI cannot be decoded.
    pub fn from_document(doc: &SceneDocument, options: &LoadOptions) -> LoadResult<Self> {
        if doc.buffers.len() > options.max_buffers {
            return Err(LoadError::TooManyBuffers {
                declared: doc.buffers.len(),
                limit: options.max_buffers,
            });
        }

        let mut sources = Vec::with_capacity(doc.buffers.len());
        for (i, buffer) in doc.buffers.iter().enumerate() {
            let name = doc.buffers.label(i);
            let bytes = decode_data_uri(&buffer.uri).map_err(|reason| LoadError::Decode {
                source_name: format!("buffer {}", name),
                reason,
            })?;

            if let Some(declared) = buffer.byte_length {
                if declared != bytes.len() {
                    tracing::warn!(
                        buffer = %name,
                        declared,
                        decoded = bytes.len(),
                        "buffer byteLength disagrees with its decoded size"
                    );
                }
            }
            tracing::debug!(buffer = %name, len = bytes.len(), "decoded buffer");

            sources.push(ByteSource { name, bytes });
        }

        Ok(Self { sources })
    }

    /// Looks up the source for the buffer at `index` in document order.
    pub fn by_position(&self, index: usize) -> Option<&ByteSource> {
        self.sources.get(index)
    }

    /// Returns the bytes covered by a range produced by
    /// [`resolve_view`](super::view::resolve_view).
    pub fn slice(&self, range: ByteRange) -> Option<&[u8]> {
        let end = range.offset.checked_add(range.length)?;
        self.by_position(range.buffer)?.bytes.get(range.offset..end)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
