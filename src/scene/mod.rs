//! Provides the embedded-asset scene loader.
//!
//! A scene document carries its vertex data and textures inline as base64
//! data URIs. Loading walks every mesh primitive in document order, resolves
//! its `POSITION` and `TEXCOORD_0` accessors down to byte ranges of the
//! decoded buffers, decodes those ranges as floats, binds the primitive's
//! image, and emits one [`RenderPart`] per primitive.
//!
//! The load is a single synchronous pass. The first failure aborts it and no
//! partial result is returned.
//!
//! # Examples
//! ```
//! use sceneload::scene::{self, LoadError};
//!
//! let result = scene::parse_slice(b"not a scene");
//! assert!(matches!(result, Err(LoadError::DocumentParse(_))));
//! ```

pub mod decode;
pub mod document;
pub mod error;
pub mod source;
pub mod view;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use serde::Deserialize;

pub use decode::{DecodedImage, ImageCodec, ImageCrateCodec};
pub use error::{CodecError, DataUriError, LoadError, LoadResult};

use document::{ImageSource, Primitive, Reference, SceneDocument};
use source::{decode_data_uri, ByteSources};

/// The vertex position attribute semantic.
pub const POSITION: &str = "POSITION";
/// The first texture coordinate attribute semantic.
pub const TEXCOORD_0: &str = "TEXCOORD_0";

/// Options controlling a scene load.
///
/// # Examples
/// ```
/// use sceneload::scene::LoadOptions;
///
/// let options: LoadOptions = serde_json::from_str(r#"{"flip_vertically": true}"#).unwrap();
/// assert!(options.flip_vertically);
/// assert_eq!(options.max_buffers, LoadOptions::default().max_buffers);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Store image rows bottom-to-top, as OpenGL texture uploads expect.
    /// Applies to every image of the scene.
    pub flip_vertically: bool,
    /// The most buffers a document may declare.
    pub max_buffers: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            flip_vertically: false,
            max_buffers: 64,
        }
    }
}

/// The render-ready data of one mesh primitive.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use sceneload::scene::{DecodedImage, RenderPart};
///
/// let part = RenderPart {
///     positions: vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0],
///     texcoords: vec![0.0, 0.0, 1.0, 1.0],
///     image: Arc::new(DecodedImage {
///         pixels: vec![255; 4],
///         width: 1,
///         height: 1,
///         channels: 4,
///     }),
/// };
/// assert_eq!(part.vertex_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPart {
    /// Flat vertex positions as decoded from the position accessor.
    pub positions: Vec<f32>,
    /// Flat texture coordinates as decoded from the `TEXCOORD_0` accessor.
    pub texcoords: Vec<f32>,
    /// The primitive's texture, shared with every part bound to the same image.
    pub image: Arc<DecodedImage>,
}

impl RenderPart {
    /// Returns the number of whole XYZ positions.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Iterates positions as XYZ vectors, ignoring a trailing partial triple.
    pub fn positions_vec3(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions.chunks_exact(3).map(Vec3::from_slice)
    }

    /// Iterates texture coordinates as UV vectors.
    pub fn texcoords_vec2(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.texcoords.chunks_exact(2).map(Vec2::from_slice)
    }

    /// Returns the axis-aligned bounds of the positions, if there are any.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use glam::Vec3;
    /// use sceneload::scene::{DecodedImage, RenderPart};
    ///
    /// let part = RenderPart {
    ///     positions: vec![1.0, -2.0, 0.5, -1.0, 4.0, 0.0],
    ///     texcoords: vec![],
    ///     image: Arc::new(DecodedImage { pixels: vec![], width: 0, height: 0, channels: 4 }),
    /// };
    /// let (min, max) = part.bounds().unwrap();
    /// assert_eq!(min, Vec3::new(-1.0, -2.0, 0.0));
    /// assert_eq!(max, Vec3::new(1.0, 4.0, 0.5));
    /// ```
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.positions_vec3().fold(None, |acc, p| match acc {
            None => Some((p, p)),
            Some((min, max)) => Some((min.min(p), max.max(p))),
        })
    }
}

/// Loads scenes into [`RenderPart`]s.
///
/// The loader holds no state between calls; one loader may serve many
/// loads, including from several threads when its codec allows it.
///
/// # Examples
/// ```
/// use std::path::Path;
///
/// use sceneload::scene::{LoadOptions, SceneLoader};
///
/// let loader = SceneLoader::new().with_options(LoadOptions {
///     flip_vertically: true,
///     ..LoadOptions::default()
/// });
/// assert!(loader.load_from_path(Path::new("does_not_exist.gltf")).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SceneLoader<C = ImageCrateCodec> {
    options: LoadOptions,
    codec: C,
}

impl SceneLoader {
    /// Creates a loader with default options and the `image` crate codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: ImageCodec> SceneLoader<C> {
    /// Replaces the load options.
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the image codec.
    pub fn with_codec<D: ImageCodec>(self, codec: D) -> SceneLoader<D> {
        SceneLoader {
            options: self.options,
            codec,
        }
    }

    /// Returns the options every load uses.
    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Reads the whole file at `path` and loads it.
    ///
    /// # Errors
    /// Returns [`LoadError::Io`] if the file cannot be read, or any error of
    /// [`SceneLoader::load_from_bytes`].
    #[tracing::instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    pub fn load_from_path(&self, path: &Path) -> LoadResult<Vec<RenderPart>> {
        let data = std::fs::read(path)?;
        self.load_from_bytes(&data)
    }

    /// Loads a scene document already in memory.
    ///
    /// # Errors
    /// Returns the first error met while parsing, resolving, or decoding.
    pub fn load_from_bytes(&self, data: &[u8]) -> LoadResult<Vec<RenderPart>> {
        let doc = SceneDocument::from_slice(data)?;
        let sources = ByteSources::from_document(&doc, &self.options)?;
        let mut images = ImageCache::new(self, &doc, &sources);

        let mut parts = Vec::new();
        for (mesh_index, mesh) in doc.meshes.iter().enumerate() {
            let mesh_label = doc.meshes.label(mesh_index);
            for (primitive_index, primitive) in mesh.primitives.iter().enumerate() {
                let attribute = |semantic: &'static str| {
                    primitive
                        .attribute(semantic)
                        .ok_or_else(|| LoadError::MissingAttribute {
                            attribute: semantic,
                            mesh: mesh_label.clone(),
                            primitive: primitive_index,
                        })
                };

                let positions = view::read_attribute(&doc, &sources, attribute(POSITION)?)?;
                let texcoords = view::read_attribute(&doc, &sources, attribute(TEXCOORD_0)?)?;
                let image_index = bind_image(&doc, primitive, &mesh_label, primitive_index)?;
                let image = images.get(image_index)?;

                tracing::debug!(
                    mesh = %mesh_label,
                    primitive = primitive_index,
                    positions = positions.len(),
                    texcoords = texcoords.len(),
                    image = %doc.images.label(image_index),
                    "assembled render part"
                );
                parts.push(RenderPart {
                    positions,
                    texcoords,
                    image,
                });
            }
        }

        tracing::debug!(parts = parts.len(), "loaded scene");
        Ok(parts)
    }
}

/// Loads the scene at `path` with default options.
///
/// # Errors
/// See [`SceneLoader::load_from_path`].
///
/// # Examples
/// ```
/// use std::path::Path;
///
/// use sceneload::scene::{self, LoadError};
///
/// let result = scene::parse(Path::new("does_not_exist.gltf"));
/// assert!(matches!(result, Err(LoadError::Io(_))));
/// ```
pub fn parse(path: &Path) -> LoadResult<Vec<RenderPart>> {
    SceneLoader::new().load_from_path(path)
}

/// Loads an in-memory scene document with default options.
///
/// # Errors
/// See [`SceneLoader::load_from_bytes`].
pub fn parse_slice(data: &[u8]) -> LoadResult<Vec<RenderPart>> {
    SceneLoader::new().load_from_bytes(data)
}

/// Picks the image a primitive renders with.
///
/// A texture named by the primitive's material wins; otherwise a scene with
/// exactly one image binds it to everything.
fn bind_image(
    doc: &SceneDocument,
    primitive: &Primitive,
    mesh: &str,
    primitive_index: usize,
) -> LoadResult<usize> {
    if let Some(material_ref) = &primitive.material {
        let material = doc
            .materials
            .get(material_ref)
            .ok_or_else(|| LoadError::MissingMaterial(material_ref.clone()))?;

        if let Some(texture_ref) = &material.texture {
            let texture = doc
                .textures
                .get(texture_ref)
                .ok_or_else(|| LoadError::MissingTexture(texture_ref.clone()))?;
            return doc
                .images
                .position(&texture.source)
                .ok_or_else(|| LoadError::MissingImage(texture.source.clone()));
        }
    }

    if doc.images.len() == 1 {
        return Ok(0);
    }

    Err(LoadError::UnboundImage {
        mesh: mesh.to_string(),
        primitive: primitive_index,
        image_count: doc.images.len(),
    })
}

/// Decodes each image at most once per load.
struct ImageCache<'a, C> {
    loader: &'a SceneLoader<C>,
    doc: &'a SceneDocument,
    sources: &'a ByteSources,
    decoded: HashMap<usize, Arc<DecodedImage>>,
}

impl<'a, C: ImageCodec> ImageCache<'a, C> {
    fn new(loader: &'a SceneLoader<C>, doc: &'a SceneDocument, sources: &'a ByteSources) -> Self {
        Self {
            loader,
            doc,
            sources,
            decoded: HashMap::new(),
        }
    }

    fn get(&mut self, index: usize) -> LoadResult<Arc<DecodedImage>> {
        if let Some(image) = self.decoded.get(&index) {
            return Ok(image.clone());
        }

        let name = format!("images[{}]", self.doc.images.label(index));
        let image = self
            .doc
            .images
            .get_index(index)
            .ok_or(LoadError::MissingImage(Reference::Index(index)))?;

        let owned;
        let bytes: &[u8] = match &image.source {
            ImageSource::Uri(uri) => {
                owned = decode_data_uri(uri).map_err(|reason| LoadError::Decode {
                    source_name: name.clone(),
                    reason,
                })?;
                &owned
            }
            ImageSource::View(view_ref) => view::view_bytes(self.doc, self.sources, view_ref)?,
        };

        tracing::trace!(
            image = %name,
            mime_type = image.mime_type.as_deref().unwrap_or("unspecified"),
            len = bytes.len(),
            "decoding image"
        );
        let decoded = Arc::new(decode::decode_image(
            &self.loader.codec,
            &name,
            bytes,
            self.loader.options.flip_vertically,
        )?);
        self.decoded.insert(index, decoded.clone());
        Ok(decoded)
    }
}
