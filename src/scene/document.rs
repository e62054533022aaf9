//! Provides the typed scene document model.
//!
//! The document is deserialized once into loosely-typed raw structs and then
//! validated into the public types below, so every required field is checked
//! in one place and later stages never look anything up by string key.
//!
//! Top-level collections may be written either as JSON arrays (referenced by
//! position) or as JSON objects keyed by id (referenced by id). Keyed
//! collections keep their document order.
//!
//! # Examples
//! ```
//! use sceneload::scene::document::{Reference, SceneDocument};
//!
//! let doc = SceneDocument::from_slice(
//!     br#"{
//!         "buffers": {"Monster": {"uri": "data:application/octet-stream;base64,AAAAAA=="}},
//!         "bufferViews": [],
//!         "accessors": [],
//!         "meshes": [],
//!         "images": []
//!     }"#,
//! )
//! .unwrap();
//! assert_eq!(doc.buffers.position(&Reference::Id("Monster".into())), Some(0));
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use super::error::{LoadError, LoadResult};

/// The accessor component type for 32-bit IEEE-754 floats.
pub const COMPONENT_TYPE_FLOAT: u32 = 5126;

/// Points at one entry of a [`Collection`], by position or by id.
///
/// # Examples
/// ```
/// use sceneload::scene::document::Reference;
///
/// assert_eq!(Reference::Index(2).to_string(), "#2");
/// assert_eq!(Reference::Id("monster_jpg".into()).to_string(), "\"monster_jpg\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// A position in the collection.
    Index(usize),
    /// The key of an entry in a keyed collection.
    Id(String),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Index(i) => write!(f, "#{}", i),
            Reference::Id(id) => write!(f, "{:?}", id),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    id: Option<String>,
    value: T,
}

/// An ordered collection of document objects, optionally keyed by id.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Collection<T> {
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the collection has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a reference to a position in document order.
    ///
    /// Ids only resolve in keyed collections; positions resolve in both.
    pub fn position(&self, reference: &Reference) -> Option<usize> {
        match reference {
            Reference::Index(i) => (*i < self.entries.len()).then_some(*i),
            Reference::Id(id) => self
                .entries
                .iter()
                .position(|e| e.id.as_deref() == Some(id.as_str())),
        }
    }

    /// Looks up an entry by reference.
    pub fn get(&self, reference: &Reference) -> Option<&T> {
        self.position(reference).map(|i| &self.entries[i].value)
    }

    /// Looks up an entry by position.
    pub fn get_index(&self, index: usize) -> Option<&T> {
        self.entries.get(index).map(|e| &e.value)
    }

    /// Returns a printable label for the entry at `index`: its id if keyed,
    /// otherwise its position.
    pub fn label(&self, index: usize) -> String {
        match self.entries.get(index).and_then(|e| e.id.as_deref()) {
            Some(id) => format!("{:?}", id),
            None => index.to_string(),
        }
    }

    /// Iterates over entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.value)
    }

    /// Validates every entry, rejecting ids that appear more than once.
    fn try_map<U>(
        self,
        collection: &'static str,
        mut f: impl FnMut(String, T) -> LoadResult<U>,
    ) -> LoadResult<Collection<U>> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.entries.len());
        for (i, entry) in self.entries.into_iter().enumerate() {
            let label = match &entry.id {
                Some(id) => {
                    if !seen.insert(id.clone()) {
                        return Err(LoadError::DuplicateId {
                            collection,
                            id: id.clone(),
                        });
                    }
                    format!("{:?}", id)
                }
                None => i.to_string(),
            };
            entries.push(Entry {
                id: entry.id,
                value: f(label, entry.value)?,
            });
        }
        Ok(Collection { entries })
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Collection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CollectionVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for CollectionVisitor<T> {
            type Value = Collection<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array or an object keyed by id")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(value) = seq.next_element()? {
                    entries.push(Entry { id: None, value });
                }
                Ok(Collection { entries })
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((id, value)) = map.next_entry::<String, T>()? {
                    entries.push(Entry {
                        id: Some(id),
                        value,
                    });
                }
                Ok(Collection { entries })
            }
        }

        deserializer.deserialize_any(CollectionVisitor(PhantomData))
    }
}

// ---- Validated document ----

/// A validated scene document.
#[derive(Debug, Clone)]
pub struct SceneDocument {
    pub buffers: Collection<Buffer>,
    pub buffer_views: Collection<BufferView>,
    pub accessors: Collection<Accessor>,
    pub meshes: Collection<Mesh>,
    pub images: Collection<Image>,
    pub textures: Collection<Texture>,
    pub materials: Collection<Material>,
}

/// A binary buffer declared by an embedded data URI.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub uri: String,
    /// The producer-declared length, if any.
    pub byte_length: Option<usize>,
}

/// A byte range within a buffer.
#[derive(Debug, Clone)]
pub struct BufferView {
    pub buffer: Reference,
    pub byte_offset: usize,
    pub byte_length: usize,
}

/// A typed view of a buffer view.
#[derive(Debug, Clone)]
pub struct Accessor {
    pub buffer_view: Reference,
    pub component_type: u32,
    pub count: usize,
    /// The element shape, e.g. `VEC3`.
    pub kind: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
}

/// One drawable part of a mesh.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub attributes: HashMap<String, Reference>,
    pub material: Option<Reference>,
}

impl Primitive {
    /// Returns the accessor bound to a vertex attribute semantic.
    pub fn attribute(&self, semantic: &str) -> Option<&Reference> {
        self.attributes.get(semantic)
    }
}

/// Where an image's encoded bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An embedded data URI.
    Uri(String),
    /// A buffer view holding the encoded bytes.
    View(Reference),
}

#[derive(Debug, Clone)]
pub struct Image {
    pub source: ImageSource,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub source: Reference,
}

/// The only part of a material the loader reads: which texture it samples.
#[derive(Debug, Clone, Default)]
pub struct Material {
    pub texture: Option<Reference>,
}

impl SceneDocument {
    /// Parses and validates a scene document from raw JSON bytes.
    ///
    /// # Errors
    /// Returns [`LoadError::DocumentParse`] for malformed JSON,
    /// [`LoadError::TypeMismatch`] for wrongly-typed fields, and
    /// [`LoadError::MissingField`] for absent required fields.
    ///
    /// # Examples
    /// ```
    /// use sceneload::scene::document::SceneDocument;
    /// use sceneload::scene::LoadError;
    ///
    /// let result = SceneDocument::from_slice(br#"{"buffers": []}"#);
    /// assert!(matches!(result, Err(LoadError::MissingField { field: "bufferViews", .. })));
    /// ```
    pub fn from_slice(data: &[u8]) -> LoadResult<Self> {
        let raw: RawDocument = serde_json::from_slice(data)?;
        raw.validate()
    }
}

// ---- Raw JSON structure ----

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    buffers: Option<Collection<RawBuffer>>,
    buffer_views: Option<Collection<RawBufferView>>,
    accessors: Option<Collection<RawAccessor>>,
    meshes: Option<Collection<RawMesh>>,
    images: Option<Collection<RawImage>>,
    #[serde(default)]
    textures: Collection<RawTexture>,
    #[serde(default)]
    materials: Collection<RawMaterial>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBuffer {
    uri: Option<String>,
    byte_length: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBufferView {
    buffer: Option<Reference>,
    byte_offset: Option<usize>,
    byte_length: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAccessor {
    buffer_view: Option<Reference>,
    component_type: Option<u32>,
    count: Option<usize>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct RawMesh {
    primitives: Option<Vec<RawPrimitive>>,
}

#[derive(Deserialize)]
struct RawPrimitive {
    attributes: Option<HashMap<String, Reference>>,
    material: Option<Reference>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImage {
    uri: Option<String>,
    buffer_view: Option<Reference>,
    mime_type: Option<String>,
}

#[derive(Deserialize)]
struct RawTexture {
    source: Option<Reference>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMaterial {
    pbr_metallic_roughness: Option<RawPbr>,
    #[serde(default)]
    values: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPbr {
    base_color_texture: Option<RawTextureInfo>,
}

#[derive(Deserialize)]
struct RawTextureInfo {
    index: Option<Reference>,
}

fn required<T>(value: Option<T>, field: &'static str, location: &str) -> LoadResult<T> {
    value.ok_or_else(|| LoadError::MissingField {
        field,
        location: location.to_string(),
    })
}

impl RawDocument {
    fn validate(self) -> LoadResult<SceneDocument> {
        let buffers = required(self.buffers, "buffers", "document")?;
        let buffers = buffers.try_map("buffers", |label, b| {
            let location = format!("buffers[{}]", label);
            Ok(Buffer {
                uri: required(b.uri, "uri", &location)?,
                byte_length: b.byte_length,
            })
        })?;

        let buffer_views = required(self.buffer_views, "bufferViews", "document")?;
        let buffer_views = buffer_views.try_map("bufferViews", |label, v| {
            let location = format!("bufferViews[{}]", label);
            Ok(BufferView {
                buffer: required(v.buffer, "buffer", &location)?,
                byte_offset: v.byte_offset.unwrap_or(0),
                byte_length: required(v.byte_length, "byteLength", &location)?,
            })
        })?;

        let accessors = required(self.accessors, "accessors", "document")?;
        let accessors = accessors.try_map("accessors", |label, a| {
            let location = format!("accessors[{}]", label);
            Ok(Accessor {
                buffer_view: required(a.buffer_view, "bufferView", &location)?,
                component_type: required(a.component_type, "componentType", &location)?,
                count: required(a.count, "count", &location)?,
                kind: a.kind,
            })
        })?;

        let meshes = required(self.meshes, "meshes", "document")?;
        let meshes = meshes.try_map("meshes", |label, m| {
            let location = format!("meshes[{}]", label);
            let primitives = required(m.primitives, "primitives", &location)?
                .into_iter()
                .enumerate()
                .map(|(i, p)| {
                    let location = format!("{}.primitives[{}]", location, i);
                    Ok(Primitive {
                        attributes: required(p.attributes, "attributes", &location)?,
                        material: p.material,
                    })
                })
                .collect::<LoadResult<Vec<_>>>()?;
            Ok(Mesh { primitives })
        })?;

        let images = required(self.images, "images", "document")?;
        let images = images.try_map("images", |label, img| {
            let source = match (img.uri, img.buffer_view) {
                (Some(uri), _) => ImageSource::Uri(uri),
                (None, Some(view)) => ImageSource::View(view),
                (None, None) => {
                    return Err(LoadError::MissingField {
                        field: "uri",
                        location: format!("images[{}]", label),
                    })
                }
            };
            Ok(Image {
                source,
                mime_type: img.mime_type,
            })
        })?;

        let textures = self.textures.try_map("textures", |label, t| {
            let location = format!("textures[{}]", label);
            Ok(Texture {
                source: required(t.source, "source", &location)?,
            })
        })?;

        let materials = self.materials.try_map("materials", |label, m| {
            let texture = match m.pbr_metallic_roughness.and_then(|p| p.base_color_texture) {
                Some(info) => Some(required(
                    info.index,
                    "index",
                    &format!("materials[{}].pbrMetallicRoughness.baseColorTexture", label),
                )?),
                // glTF 1.0 names the diffuse texture by id; a color array means untextured
                None => match m.values.get("diffuse").and_then(|v| v.as_str()) {
                    Some(id) if !id.is_empty() => Some(Reference::Id(id.to_string())),
                    _ => None,
                },
            };
            Ok(Material { texture })
        })?;

        Ok(SceneDocument {
            buffers,
            buffer_views,
            accessors,
            meshes,
            images,
            textures,
            materials,
        })
    }
}
