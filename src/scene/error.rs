//! Provides the error type shared by every stage of a scene load.
//!
//! Every variant is fatal to the current load: the first failure aborts the
//! whole pipeline and no partial part list is returned.
//!
//! # Examples
//! ```
//! use sceneload::scene::LoadError;
//!
//! let err = LoadError::MalformedAttributeData { length: 7 };
//! assert_eq!(
//!     err.to_string(),
//!     "attribute data of 7 bytes is not a whole number of 32-bit floats"
//! );
//! ```

use super::document::Reference;

/// The boxed error returned by an [`ImageCodec`](super::ImageCodec).
pub type CodecError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The result type for scene loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur while loading a scene.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),
    #[error("scene document is not well-formed: {0}")]
    DocumentParse(#[source] serde_json::Error),
    #[error("missing field `{field}` in {location}")]
    MissingField {
        field: &'static str,
        location: String,
    },
    #[error("scene document has a field of the wrong type: {detail}")]
    TypeMismatch { detail: String },
    #[error("accessor {0} does not exist")]
    MissingAccessor(Reference),
    #[error("bufferView {0} does not exist")]
    MissingBufferView(Reference),
    #[error("buffer {0} does not exist")]
    MissingBuffer(Reference),
    #[error("image {0} does not exist")]
    MissingImage(Reference),
    #[error("texture {0} does not exist")]
    MissingTexture(Reference),
    #[error("material {0} does not exist")]
    MissingMaterial(Reference),
    #[error("meshes[{mesh}].primitives[{primitive}] has no `{attribute}` attribute")]
    MissingAttribute {
        attribute: &'static str,
        mesh: String,
        primitive: usize,
    },
    #[error("byte range {offset}+{length} exceeds buffer of {available} bytes")]
    OutOfRange {
        offset: usize,
        length: usize,
        available: usize,
    },
    #[error("failed to decode {source_name}: {reason}")]
    Decode {
        source_name: String,
        #[source]
        reason: DataUriError,
    },
    #[error("attribute data of {length} bytes is not a whole number of 32-bit floats")]
    MalformedAttributeData { length: usize },
    #[error("failed to decode image {image}: {reason}")]
    ImageDecode {
        image: String,
        #[source]
        reason: CodecError,
    },
    #[error("accessor {accessor} has component type {component_type}; only 5126 (FLOAT) is supported")]
    UnsupportedComponentType {
        accessor: Reference,
        component_type: u32,
    },
    #[error("{collection} defines id {id:?} more than once")]
    DuplicateId {
        collection: &'static str,
        id: String,
    },
    #[error("scene declares {declared} buffers; at most {limit} are tracked")]
    TooManyBuffers { declared: usize, limit: usize },
    #[error(
        "meshes[{mesh}].primitives[{primitive}] names no texture and the scene has {image_count} images"
    )]
    UnboundImage {
        mesh: String,
        primitive: usize,
        image_count: usize,
    },
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match e.classify() {
            Category::Data => LoadError::TypeMismatch {
                detail: e.to_string(),
            },
            Category::Io | Category::Syntax | Category::Eof => LoadError::DocumentParse(e),
        }
    }
}

/// Errors produced while unpacking an embedded `data:` URI.
#[derive(Debug, thiserror::Error)]
pub enum DataUriError {
    #[error("expected an embedded data URI with a `,` before the payload")]
    MissingSeparator,
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}
