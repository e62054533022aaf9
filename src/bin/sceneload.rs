//! Provides the `sceneload-cli` tool for inspecting embedded-asset scenes.
//!
//! Usage: `sceneload-cli <scene_file> [--flip-vertically] [--dump-images <dir>]`
//!
//! Prints one line per render part. With `--dump-images`, writes every
//! distinct decoded texture as a PNG into the given directory.
//!
//! # Examples
//! ```text
//! sceneload-cli assets/Monster.gltf --dump-images out/
//! ```

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, ValueHint};
use sceneload::scene::{DecodedImage, LoadOptions, SceneLoader};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Logging output filters; comma-separated
    #[arg(long, default_value = "warn,sceneload=info", env = "SCENELOAD_LOG")]
    log_filter: String,
    /// Store texture rows bottom-to-top
    #[arg(long)]
    flip_vertically: bool,
    /// The most buffers a scene may declare
    #[arg(long, default_value_t = LoadOptions::default().max_buffers)]
    max_buffers: usize,
    /// Write each decoded texture as PNG into this directory
    #[arg(long, value_hint = ValueHint::DirPath)]
    dump_images: Option<PathBuf>,
    /// The scene file to load
    #[arg(value_hint = ValueHint::FilePath)]
    scene: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(cli.log_filter.as_str())
        .init();

    let loader = SceneLoader::new().with_options(LoadOptions {
        flip_vertically: cli.flip_vertically,
        max_buffers: cli.max_buffers,
    });

    let parts = match loader.load_from_path(&cli.scene) {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Error: failed to load {}: {}", cli.scene.display(), e);
            process::exit(1);
        }
    };

    for (i, part) in parts.iter().enumerate() {
        let bounds = part
            .bounds()
            .map(|(min, max)| format!("bounds {:?}..{:?}", min.to_array(), max.to_array()))
            .unwrap_or_else(|| "no bounds".to_string());
        println!(
            "part {}: {} vertices, {} uvs, {}x{}x{} texture, {}",
            i,
            part.vertex_count(),
            part.texcoords.len() / 2,
            part.image.width,
            part.image.height,
            part.image.channels,
            bounds
        );
    }

    if let Some(dir) = cli.dump_images {
        let mut written: Vec<&Arc<DecodedImage>> = Vec::new();
        for part in &parts {
            if written.iter().any(|img| Arc::ptr_eq(img, &part.image)) {
                continue;
            }
            let path = dir.join(format!("texture_{}.png", written.len()));
            if let Err(e) = save_png(&part.image, &path) {
                eprintln!("Error: failed to write {}: {}", path.display(), e);
                process::exit(1);
            }
            tracing::info!(path = %path.display(), "wrote texture");
            written.push(&part.image);
        }
    }
}

fn save_png(img: &DecodedImage, path: &Path) -> image::ImageResult<()> {
    let color = match img.channels {
        1 => image::ExtendedColorType::L8,
        2 => image::ExtendedColorType::La8,
        3 => image::ExtendedColorType::Rgb8,
        _ => image::ExtendedColorType::Rgba8,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image::save_buffer(path, &img.pixels, img.width, img.height, color)
}
