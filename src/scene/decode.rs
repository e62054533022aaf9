//! Provides the byte-level decoders: attribute floats and embedded images.
//!
//! # Examples
//! ```
//! use sceneload::scene::decode::floats_from_le_bytes;
//!
//! let bytes = [0x00, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x00, 0x40];
//! assert_eq!(floats_from_le_bytes(&bytes).unwrap(), vec![1.0, 2.0]);
//! ```

use super::error::{CodecError, LoadError, LoadResult};

/// Reinterprets bytes as little-endian IEEE-754 32-bit floats.
///
/// This copies bit patterns; it never parses text.
///
/// # Errors
/// Returns [`LoadError::MalformedAttributeData`] if the length is not a
/// multiple of 4.
///
/// # Examples
/// ```
/// use sceneload::scene::decode::floats_from_le_bytes;
/// use sceneload::scene::LoadError;
///
/// let result = floats_from_le_bytes(&[0, 0, 0]);
/// assert!(matches!(result, Err(LoadError::MalformedAttributeData { length: 3 })));
/// ```
pub fn floats_from_le_bytes(bytes: &[u8]) -> LoadResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(LoadError::MalformedAttributeData {
            length: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// A decoded raster image, one byte per channel per pixel, row-major.
///
/// # Examples
/// ```
/// use sceneload::scene::DecodedImage;
///
/// let img = DecodedImage {
///     pixels: vec![255, 0, 0, 255],
///     width: 1,
///     height: 1,
///     channels: 4,
/// };
/// assert_eq!(img.row_len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 1 (gray), 2 (gray + alpha), 3 (RGB) or 4 (RGBA).
    pub channels: u8,
}

impl DecodedImage {
    /// Returns the number of bytes in one row of pixels.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Returns the pixel byte count implied by the dimensions, or None on
    /// overflow.
    pub fn expected_len(&self) -> Option<usize> {
        self.row_len().checked_mul(self.height as usize)
    }

    /// Reverses the order of the pixel rows in place.
    pub fn flip_vertically(&mut self) {
        let row_len = self.row_len();
        if row_len == 0 {
            return;
        }
        let rows = self.pixels.len() / row_len;
        for top in 0..rows / 2 {
            let bottom = rows - 1 - top;
            let (upper, lower) = self.pixels.split_at_mut(bottom * row_len);
            upper[top * row_len..(top + 1) * row_len].swap_with_slice(&mut lower[..row_len]);
        }
    }
}

/// Decodes encoded image bytes (PNG, JPEG, ...) into raw pixels.
pub trait ImageCodec {
    /// Decodes a complete encoded image.
    ///
    /// # Errors
    /// Returns an error if the bytes are corrupt or the codec is unsupported.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError>;
}

impl<T: ImageCodec + ?Sized> ImageCodec for &T {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        (**self).decode(bytes)
    }
}

/// The default codec, backed by the `image` crate.
///
/// Keeps the source's channel layout and converts samples to 8 bits.
///
/// # Examples
/// ```
/// use sceneload::scene::{ImageCodec, ImageCrateCodec};
///
/// assert!(ImageCrateCodec.decode(b"not an image").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        use image::GenericImageView;

        let img = image::load_from_memory(bytes)?;
        let (width, height) = img.dimensions();
        let channels = img.color().channel_count();
        let pixels = match channels {
            1 => img.into_luma8().into_raw(),
            2 => img.into_luma_alpha8().into_raw(),
            3 => img.into_rgb8().into_raw(),
            _ => img.into_rgba8().into_raw(),
        };

        Ok(DecodedImage {
            pixels,
            width,
            height,
            channels: channels.min(4),
        })
    }
}

/// Decodes an image through `codec`, checks the pixel buffer against the
/// reported dimensions, and flips rows when `flip_vertically` is set.
///
/// `name` identifies the image in errors.
pub fn decode_image<C: ImageCodec + ?Sized>(
    codec: &C,
    name: &str,
    bytes: &[u8],
    flip_vertically: bool,
) -> LoadResult<DecodedImage> {
    let mut image = codec
        .decode(bytes)
        .map_err(|reason| LoadError::ImageDecode {
            image: name.to_string(),
            reason,
        })?;

    if image.expected_len() != Some(image.pixels.len()) {
        return Err(LoadError::ImageDecode {
            image: name.to_string(),
            reason: format!(
                "codec returned {} bytes for a {}x{} image with {} channels",
                image.pixels.len(),
                image.width,
                image.height,
                image.channels
            )
            .into(),
        });
    }

    if flip_vertically {
        image.flip_vertically();
    }

    tracing::debug!(
        image = name,
        width = image.width,
        height = image.height,
        channels = image.channels,
        "decoded image"
    );
    Ok(image)
}
