//! Resolves accessor → bufferView → buffer chains into byte ranges.

use super::decode::floats_from_le_bytes;
use super::document::{Reference, SceneDocument, COMPONENT_TYPE_FLOAT};
use super::error::{LoadError, LoadResult};
use super::source::{ByteSource, ByteSources};

/// A validated byte range within one decoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Position of the buffer in the document's buffer list.
    pub buffer: usize,
    pub offset: usize,
    pub length: usize,
}

/// Checks that `offset + length` fits inside `available` bytes.
///
/// # Examples
/// ```
/// use sceneload::scene::view::check_range;
///
/// assert!(check_range(4, 8, 12).is_ok());
/// assert!(check_range(4, 9, 12).is_err());
/// ```
pub fn check_range(offset: usize, length: usize, available: usize) -> LoadResult<()> {
    match offset.checked_add(length) {
        Some(end) if end <= available => Ok(()),
        _ => Err(LoadError::OutOfRange {
            offset,
            length,
            available,
        }),
    }
}

/// Resolves a bufferView reference to a validated range.
pub fn resolve_view(
    doc: &SceneDocument,
    sources: &ByteSources,
    view: &Reference,
) -> LoadResult<ByteRange> {
    locate(doc, sources, view).map(|(range, _)| range)
}

/// Resolves a bufferView reference and returns its bytes.
pub fn view_bytes<'a>(
    doc: &SceneDocument,
    sources: &'a ByteSources,
    view: &Reference,
) -> LoadResult<&'a [u8]> {
    let (range, source) = locate(doc, sources, view)?;
    sources.slice(range).ok_or(LoadError::OutOfRange {
        offset: range.offset,
        length: range.length,
        available: source.bytes.len(),
    })
}

fn locate<'a>(
    doc: &SceneDocument,
    sources: &'a ByteSources,
    view: &Reference,
) -> LoadResult<(ByteRange, &'a ByteSource)> {
    let buffer_view = doc
        .buffer_views
        .get(view)
        .ok_or_else(|| LoadError::MissingBufferView(view.clone()))?;

    let missing_buffer = || LoadError::MissingBuffer(buffer_view.buffer.clone());
    let buffer = doc
        .buffers
        .position(&buffer_view.buffer)
        .ok_or_else(missing_buffer)?;
    let source = sources.by_position(buffer).ok_or_else(missing_buffer)?;

    check_range(
        buffer_view.byte_offset,
        buffer_view.byte_length,
        source.bytes.len(),
    )?;

    tracing::trace!(
        view = %view,
        buffer = %source.name,
        offset = buffer_view.byte_offset,
        length = buffer_view.byte_length,
        "resolved bufferView"
    );

    let range = ByteRange {
        buffer,
        offset: buffer_view.byte_offset,
        length: buffer_view.byte_length,
    };
    Ok((range, source))
}

/// Resolves an accessor to the bytes of its bufferView.
///
/// # Errors
/// Fails with [`LoadError::MissingAccessor`] for a dangling accessor and
/// [`LoadError::UnsupportedComponentType`] for anything but 32-bit floats,
/// before any bytes are touched.
pub fn resolve_accessor<'a>(
    doc: &SceneDocument,
    sources: &'a ByteSources,
    accessor: &Reference,
) -> LoadResult<&'a [u8]> {
    let acc = doc
        .accessors
        .get(accessor)
        .ok_or_else(|| LoadError::MissingAccessor(accessor.clone()))?;

    if acc.component_type != COMPONENT_TYPE_FLOAT {
        return Err(LoadError::UnsupportedComponentType {
            accessor: accessor.clone(),
            component_type: acc.component_type,
        });
    }

    let bytes = view_bytes(doc, sources, &acc.buffer_view)?;
    tracing::trace!(
        accessor = %accessor,
        count = acc.count,
        kind = acc.kind.as_deref().unwrap_or("?"),
        len = bytes.len(),
        "resolved accessor"
    );
    Ok(bytes)
}

/// Resolves an accessor and decodes it as little-endian 32-bit floats.
pub fn read_attribute(
    doc: &SceneDocument,
    sources: &ByteSources,
    accessor: &Reference,
) -> LoadResult<Vec<f32>> {
    floats_from_le_bytes(resolve_accessor(doc, sources, accessor)?)
}
