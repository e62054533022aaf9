//! Provides sceneload, a loader for glTF-style scenes whose buffers and
//! images are embedded as base64 data URIs.
//!
//! The loader turns a scene document into an ordered list of
//! [`RenderPart`](scene::RenderPart)s, one per mesh primitive, each holding
//! decoded vertex positions, texture coordinates, and a decoded texture image.
//! Uploading them to the GPU is left to the caller.
//!
//! # Build
//! ```text
//! cargo build --release
//! ```
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! let parts = sceneload::scene::parse(Path::new("assets/Monster.gltf")).unwrap();
//! for part in &parts {
//!     println!("{} vertices, {}x{} texture", part.vertex_count(), part.image.width, part.image.height);
//! }
//! ```

pub mod scene;

pub use scene::{parse, LoadError, LoadOptions, RenderPart, SceneLoader};
