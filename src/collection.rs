//! The working document: an ordered page collection with a selection set.
//!
//! The order of [`PageRef`]s in a [`PageCollection`] IS the output document
//! order. The selection set holds 0-based indices into that order and is
//! remapped on every mutation so it always refers to the pages the user
//! selected, never to stale slots.
//!
//! Indices arrive from asynchronous UI events that can race with
//! concurrent mutation, so every index-taking operation here is a no-op or
//! clamps when given an out-of-range index. Nothing in this module panics
//! on bad input.

use std::collections::BTreeSet;

use image::RgbImage;

use crate::error::Result;
use crate::raster::{self, RenderHandle};
use crate::store::FileId;

/// Where a page's content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A page of a source PDF document.
    PdfPage,
    /// An imported raster image.
    Image,
}

/// Page rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// 90 degrees clockwise.
    Clockwise90,
    /// 180 degrees.
    Rotate180,
    /// 270 degrees clockwise.
    Clockwise270,
}

impl Rotation {
    /// Rotation as degrees (0, 90, 180 or 270).
    pub fn as_degrees(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Rotate180 => 180,
            Self::Clockwise270 => 270,
        }
    }

    /// Parse a rotation from degrees.
    ///
    /// Accepts multiples of 90; anything else returns `None`.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::None),
            90 => Some(Self::Clockwise90),
            180 => Some(Self::Rotate180),
            270 => Some(Self::Clockwise270),
            _ => None,
        }
    }

    /// This rotation plus a further quarter turn clockwise.
    pub fn rotated_cw(self) -> Self {
        match self {
            Self::None => Self::Clockwise90,
            Self::Clockwise90 => Self::Rotate180,
            Self::Rotate180 => Self::Clockwise270,
            Self::Clockwise270 => Self::None,
        }
    }
}

/// One logical page of the working document.
///
/// A `PageRef` is independent of which original file or page it came from:
/// it references immutable source bytes through a [`FileId`] and renders
/// through a non-owning [`RenderHandle`]. The only owned raster state is
/// the cached thumbnail, which is dropped whenever the rotation changes.
#[derive(Debug, Clone)]
pub struct PageRef {
    /// Whether the page is a PDF page or an image.
    pub source_kind: SourceKind,

    /// 1-based page number within the source file. Always 1 for images.
    pub source_page_number: u32,

    /// Handle to the source file's bytes in the file store.
    pub source_file: FileId,

    /// Original name of the source file, used for output naming and errors.
    pub source_name: String,

    /// Current page rotation.
    rotation: Rotation,

    /// Renders this page's pixels at a requested scale and rotation.
    render_handle: Option<RenderHandle>,

    /// Cached thumbnail raster, invalidated on rotation change.
    cached_thumbnail: Option<RgbImage>,
}

impl PageRef {
    /// Create a reference to a page of a source PDF.
    ///
    /// PDF pages have no renderer until an external rasterizer is attached
    /// with [`PageRef::attach_render_handle`].
    pub fn pdf_page(file: FileId, page_number: u32, source_name: impl Into<String>) -> Self {
        Self {
            source_kind: SourceKind::PdfPage,
            source_page_number: page_number.max(1),
            source_file: file,
            source_name: source_name.into(),
            rotation: Rotation::None,
            render_handle: None,
            cached_thumbnail: None,
        }
    }

    /// Create a reference to an imported image.
    pub fn image(file: FileId, source_name: impl Into<String>, handle: RenderHandle) -> Self {
        Self {
            source_kind: SourceKind::Image,
            source_page_number: 1,
            source_file: file,
            source_name: source_name.into(),
            rotation: Rotation::None,
            render_handle: Some(handle),
            cached_thumbnail: None,
        }
    }

    /// Current rotation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Set the rotation, dropping the cached thumbnail if it changed.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        if self.rotation != rotation {
            self.rotation = rotation;
            self.cached_thumbnail = None;
        }
    }

    /// Rotate a further 90 degrees clockwise.
    pub fn rotate_cw(&mut self) {
        self.set_rotation(self.rotation.rotated_cw());
    }

    /// The attached render handle, if any.
    pub fn render_handle(&self) -> Option<&RenderHandle> {
        self.render_handle.as_ref()
    }

    /// Attach (or replace) the render handle for this page.
    pub fn attach_render_handle(&mut self, handle: RenderHandle) {
        self.render_handle = Some(handle);
        self.cached_thumbnail = None;
    }

    /// Render and cache a thumbnail of this page.
    ///
    /// The thumbnail scale keeps the longest side at or under 120 px and
    /// never exceeds the thumbnail quality tier. Subsequent calls return
    /// the cache until the rotation changes.
    ///
    /// # Errors
    ///
    /// Fails if no render handle is attached or rendering fails.
    pub fn thumbnail(&mut self) -> Result<&RgbImage> {
        if self.cached_thumbnail.is_none() {
            let handle = self.render_handle.as_ref().ok_or_else(|| {
                crate::error::PagedeckError::rasterize_failure("no rasterizer attached to page")
            })?;
            let (w, h) = handle.native_size();
            let scale = raster::thumbnail_scale(w, h);
            let image = handle.render(scale, self.rotation)?;
            self.cached_thumbnail = Some(image);
        }
        Ok(self.cached_thumbnail.as_ref().expect("thumbnail just set"))
    }

    /// Whether a thumbnail is currently cached.
    pub fn has_cached_thumbnail(&self) -> bool {
        self.cached_thumbnail.is_some()
    }
}

/// Ordered pages plus the current selection.
#[derive(Debug, Default)]
pub struct PageCollection {
    pages: Vec<PageRef>,
    selected: BTreeSet<usize>,
    last_selected: Option<usize>,
}

impl PageCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// The pages in document order.
    pub fn pages(&self) -> &[PageRef] {
        &self.pages
    }

    /// Mutable access to one page; `None` when out of range.
    pub fn page_mut(&mut self, index: usize) -> Option<&mut PageRef> {
        self.pages.get_mut(index)
    }

    /// One page by index; `None` when out of range.
    pub fn page(&self, index: usize) -> Option<&PageRef> {
        self.pages.get(index)
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the collection holds no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Append pages at the end (imports always append).
    pub fn push_pages(&mut self, refs: impl IntoIterator<Item = PageRef>) {
        self.pages.extend(refs);
    }

    /// Remove the pages at the given indices.
    ///
    /// Out-of-range and duplicate indices are ignored. Every surviving
    /// selected index `i` is remapped to `i - |{removed < i}|` so the
    /// selection keeps following the same pages.
    pub fn remove_pages(&mut self, indices: &[usize]) {
        let mut removed: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.pages.len())
            .collect();
        removed.sort_unstable();
        removed.dedup();
        if removed.is_empty() {
            return;
        }

        // Remove descending so earlier removals don't shift later ones.
        for &index in removed.iter().rev() {
            self.pages.remove(index);
        }

        let remap = |i: usize| i - removed.partition_point(|&r| r < i);
        self.selected = self
            .selected
            .iter()
            .copied()
            .filter(|i| removed.binary_search(i).is_err())
            .map(remap)
            .collect();
        self.last_selected = self
            .last_selected
            .filter(|i| removed.binary_search(i).is_err())
            .map(remap);
    }

    /// Remove one page, remapping the selection like [`Self::remove_pages`].
    pub fn remove_page(&mut self, index: usize) {
        self.remove_pages(&[index]);
    }

    /// Remove every selected page and clear the selection.
    pub fn remove_selected(&mut self) {
        let selected: Vec<usize> = self.selected.iter().copied().collect();
        self.remove_pages(&selected);
        self.clear_selection();
    }

    /// Move a (possibly non-contiguous) block of pages to `target`.
    ///
    /// The moved pages end up as one contiguous run, in their original
    /// relative order, inserted before the page that currently sits at
    /// `target` (a `target` of `len` appends). Untouched pages keep their
    /// relative order. Afterwards the selection is exactly the moved run.
    ///
    /// Dropping onto an index that is itself part of the moved block is a
    /// no-op, as is an empty or fully out-of-range block. Returns whether
    /// the collection changed.
    pub fn move_block(&mut self, source_indices: &[usize], target: usize) -> bool {
        let mut moved: Vec<usize> = source_indices
            .iter()
            .copied()
            .filter(|&i| i < self.pages.len())
            .collect();
        moved.sort_unstable();
        moved.dedup();

        if moved.is_empty() || moved.binary_search(&target).is_ok() {
            return false;
        }

        // Extract in ascending original order, keep the rest in order.
        let mut pages_to_move = Vec::with_capacity(moved.len());
        let mut remaining = Vec::with_capacity(self.pages.len() - moved.len());
        for (index, page) in self.pages.drain(..).enumerate() {
            if moved.binary_search(&index).is_ok() {
                pages_to_move.push(page);
            } else {
                remaining.push(page);
            }
        }

        // Insert before the element that sat at `target`; every moved index
        // below it no longer occupies a slot.
        let before_target = moved.partition_point(|&i| i < target);
        let insert_at = (target - before_target).min(remaining.len());

        let moved_count = pages_to_move.len();
        remaining.splice(insert_at..insert_at, pages_to_move);
        self.pages = remaining;

        self.selected = (insert_at..insert_at + moved_count).collect();
        self.last_selected = Some(insert_at);
        true
    }

    /// Move a single page, expressed through the block algorithm.
    pub fn move_page(&mut self, from: usize, to: usize) -> bool {
        self.move_block(&[from], to)
    }

    /// Rotate one page 90 degrees clockwise. Out of range is a no-op.
    pub fn rotate_page(&mut self, index: usize) {
        if let Some(page) = self.pages.get_mut(index) {
            page.rotate_cw();
        }
    }

    /// Rotate every selected page 90 degrees clockwise.
    pub fn rotate_selected(&mut self) {
        let selected: Vec<usize> = self.selected.iter().copied().collect();
        for index in selected {
            self.rotate_page(index);
        }
    }

    /// The selected indices in ascending order.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    /// Number of selected pages.
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Whether the index is currently selected.
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Add one page to the selection. Out of range is a no-op.
    pub fn select_page(&mut self, index: usize) {
        if index < self.pages.len() {
            self.selected.insert(index);
            self.last_selected = Some(index);
        }
    }

    /// Toggle one page's selection. Out of range is a no-op.
    pub fn toggle_selection(&mut self, index: usize) {
        if index >= self.pages.len() {
            return;
        }
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        }
        self.last_selected = Some(index);
    }

    /// Select the inclusive range between `a` and `b`, in either order,
    /// replacing the current selection. Bounds are clamped.
    pub fn select_range(&mut self, a: usize, b: usize) {
        if self.pages.is_empty() {
            return;
        }
        let max_index = self.pages.len() - 1;
        let (lo, hi) = (a.min(b).min(max_index), a.max(b).min(max_index));
        self.selected = (lo..=hi).collect();
        self.last_selected = Some(hi);
    }

    /// The anchor used by shift-click range selection.
    pub fn last_selected(&self) -> Option<usize> {
        self.last_selected
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected.clear();
        self.last_selected = None;
    }

    /// Select every page.
    pub fn select_all(&mut self) {
        self.selected = (0..self.pages.len()).collect();
    }

    /// Whether every page is selected (false when empty).
    pub fn all_selected(&self) -> bool {
        !self.pages.is_empty() && self.selected.len() == self.pages.len()
    }

    /// Select all pages, or clear the selection if all are already selected.
    pub fn toggle_select_all(&mut self) {
        if self.all_selected() {
            self.clear_selection();
        } else {
            self.select_all();
        }
    }

    /// Drop every page and the selection. Only the explicit "clear" action
    /// calls this.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.clear_selection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FileStore;
    use crate::store::SourceFileKind;

    fn collection_of(n: usize) -> PageCollection {
        let mut store = FileStore::new();
        let file = store.register("doc.pdf", vec![0u8], SourceFileKind::Pdf);
        let mut collection = PageCollection::new();
        collection.push_pages((1..=n as u32).map(|p| PageRef::pdf_page(file, p, "doc.pdf")));
        collection
    }

    fn order(collection: &PageCollection) -> Vec<u32> {
        collection
            .pages()
            .iter()
            .map(|p| p.source_page_number)
            .collect()
    }

    #[test]
    fn test_rotation_cycle() {
        let mut r = Rotation::None;
        for expected in [90, 180, 270, 0] {
            r = r.rotated_cw();
            assert_eq!(r.as_degrees(), expected);
        }
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Clockwise90));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Clockwise90));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Clockwise270));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn test_remove_pages_remaps_selection() {
        let mut collection = collection_of(6);
        collection.select_page(1);
        collection.select_page(3);
        collection.select_page(5);

        collection.remove_pages(&[0, 3]);

        assert_eq!(order(&collection), vec![2, 3, 5, 6]);
        // 1 -> 0 (one removal below), 3 removed, 5 -> 3 (two removals below).
        assert_eq!(collection.selected_indices(), vec![0, 3]);
    }

    #[test]
    fn test_remove_pages_property() {
        // Post-removal index of a surviving selected page equals
        // i - |removed below i|, for every combination over a small deck.
        let n = 7;
        for removed_mask in 0u32..(1 << n) {
            let removed: Vec<usize> = (0..n).filter(|i| removed_mask & (1 << i) != 0).collect();
            let mut collection = collection_of(n);
            for i in 0..n {
                collection.select_page(i);
            }
            collection.remove_pages(&removed);

            for i in (0..n).filter(|i| !removed.contains(i)) {
                let expected = i - removed.iter().filter(|&&r| r < i).count();
                assert!(
                    collection.is_selected(expected),
                    "page {i} lost its selection for removal set {removed:?}"
                );
            }
            assert_eq!(collection.selected_count(), n - removed.len());
        }
    }

    #[test]
    fn test_remove_pages_ignores_out_of_range() {
        let mut collection = collection_of(3);
        collection.remove_pages(&[5, 99]);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_move_block_scenario() {
        // [A,B,C,D,E], select B and D, drop on E.
        let mut collection = collection_of(5);
        let moved = collection.move_block(&[1, 3], 4);

        assert!(moved);
        assert_eq!(order(&collection), vec![1, 3, 2, 4, 5]);
        assert_eq!(collection.selected_indices(), vec![2, 3]);
    }

    #[test]
    fn test_move_block_to_front() {
        let mut collection = collection_of(5);
        collection.move_block(&[2, 4], 0);

        assert_eq!(order(&collection), vec![3, 5, 1, 2, 4]);
        assert_eq!(collection.selected_indices(), vec![0, 1]);
    }

    #[test]
    fn test_move_block_to_end() {
        let mut collection = collection_of(5);
        collection.move_block(&[0, 1], 5);

        assert_eq!(order(&collection), vec![3, 4, 5, 1, 2]);
        assert_eq!(collection.selected_indices(), vec![3, 4]);
    }

    #[test]
    fn test_move_block_onto_itself_is_noop() {
        let mut collection = collection_of(5);
        collection.select_page(1);
        collection.select_page(2);

        for target in [1, 2] {
            let moved = collection.move_block(&[1, 2], target);
            assert!(!moved);
            assert_eq!(order(&collection), vec![1, 2, 3, 4, 5]);
            assert_eq!(collection.selected_indices(), vec![1, 2]);
        }
    }

    #[test]
    fn test_move_block_preserves_relative_order() {
        for target in 0..=6 {
            let mut collection = collection_of(6);
            let block = [4, 0, 2]; // deliberately unsorted input
            if !collection.move_block(&block, target) {
                continue;
            }
            let new_order = order(&collection);

            // Moved pages stay in ascending original order...
            let moved_positions: Vec<usize> = [1u32, 3, 5]
                .iter()
                .map(|p| new_order.iter().position(|x| x == p).unwrap())
                .collect();
            assert!(moved_positions.windows(2).all(|w| w[1] == w[0] + 1));

            // ...and so do the untouched pages.
            let untouched: Vec<usize> = [2u32, 4, 6]
                .iter()
                .map(|p| new_order.iter().position(|x| x == p).unwrap())
                .collect();
            assert!(untouched.windows(2).all(|w| w[1] > w[0]));
        }
    }

    #[test]
    fn test_move_block_boundary_sweep() {
        // Every target against every 2-page block of a 5-page deck: the
        // block must land contiguously at target - |moved < target|, and
        // the boundary one-past the last moved index must behave like any
        // other target.
        for first in 0..5usize {
            for second in first + 1..5usize {
                for target in 0..=5usize {
                    let block = [first, second];
                    let mut collection = collection_of(5);
                    let changed = collection.move_block(&block, target);

                    if block.contains(&target) {
                        assert!(!changed);
                        continue;
                    }
                    let before = block.iter().filter(|&&i| i < target).count();
                    let expected_at = (target - before).min(3);
                    assert_eq!(
                        collection.selected_indices(),
                        vec![expected_at, expected_at + 1],
                        "block {block:?} target {target}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_move_block_out_of_range_indices_filtered() {
        let mut collection = collection_of(3);
        let moved = collection.move_block(&[7, 9], 0);
        assert!(!moved);
        assert_eq!(order(&collection), vec![1, 2, 3]);
    }

    #[test]
    fn test_selection_basics() {
        let mut collection = collection_of(4);

        collection.toggle_selection(2);
        assert!(collection.is_selected(2));
        collection.toggle_selection(2);
        assert!(!collection.is_selected(2));

        collection.select_range(3, 1);
        assert_eq!(collection.selected_indices(), vec![1, 2, 3]);
        assert_eq!(collection.last_selected(), Some(3));

        collection.clear_selection();
        assert_eq!(collection.selected_count(), 0);
        assert_eq!(collection.last_selected(), None);
    }

    #[test]
    fn test_select_range_clamps() {
        let mut collection = collection_of(3);
        collection.select_range(1, 99);
        assert_eq!(collection.selected_indices(), vec![1, 2]);
    }

    #[test]
    fn test_toggle_select_all() {
        let mut collection = collection_of(3);

        collection.toggle_select_all();
        assert!(collection.all_selected());

        collection.toggle_select_all();
        assert_eq!(collection.selected_count(), 0);

        // Partially selected toggles to all.
        collection.select_page(0);
        collection.toggle_select_all();
        assert!(collection.all_selected());
    }

    #[test]
    fn test_toggle_select_all_empty() {
        let mut collection = PageCollection::new();
        collection.toggle_select_all();
        assert!(!collection.all_selected());
        assert_eq!(collection.selected_count(), 0);
    }

    #[test]
    fn test_out_of_range_selection_is_noop() {
        let mut collection = collection_of(2);
        collection.select_page(9);
        collection.toggle_selection(9);
        assert_eq!(collection.selected_count(), 0);
    }

    #[test]
    fn test_remove_selected() {
        let mut collection = collection_of(5);
        collection.select_page(0);
        collection.select_page(2);
        collection.select_page(4);

        collection.remove_selected();

        assert_eq!(order(&collection), vec![2, 4]);
        assert_eq!(collection.selected_count(), 0);
    }

    #[test]
    fn test_rotate_page_marks_thumbnail_stale() {
        let mut collection = collection_of(1);
        assert_eq!(collection.page(0).unwrap().rotation(), Rotation::None);

        collection.rotate_page(0);
        assert_eq!(
            collection.page(0).unwrap().rotation(),
            Rotation::Clockwise90
        );
        assert!(!collection.page(0).unwrap().has_cached_thumbnail());

        // Out of range does nothing.
        collection.rotate_page(42);
    }

    #[test]
    fn test_rotate_selected() {
        let mut collection = collection_of(3);
        collection.select_page(0);
        collection.select_page(2);
        collection.rotate_selected();

        assert_eq!(
            collection.page(0).unwrap().rotation(),
            Rotation::Clockwise90
        );
        assert_eq!(collection.page(1).unwrap().rotation(), Rotation::None);
        assert_eq!(
            collection.page(2).unwrap().rotation(),
            Rotation::Clockwise90
        );
    }

    #[test]
    fn test_clear() {
        let mut collection = collection_of(3);
        collection.select_all();
        collection.clear();
        assert!(collection.is_empty());
        assert_eq!(collection.selected_count(), 0);
    }

    #[test]
    fn test_thumbnail_caching_and_invalidation() {
        use crate::raster::{ImagePage, RenderHandle};

        let mut store = FileStore::new();
        let file = store.register("photo.png", vec![0u8], SourceFileKind::Image);
        let source = ImagePage::from_image(RgbImage::new(400, 240));
        let mut page = PageRef::image(file, "photo.png", RenderHandle::new(source));

        let thumbnail = page.thumbnail().unwrap();
        // Longest side capped at 120 px.
        assert_eq!(thumbnail.width(), 120);
        assert_eq!(thumbnail.height(), 72);
        assert!(page.has_cached_thumbnail());

        // Rotation drops the cache; the fresh render is rotated.
        page.rotate_cw();
        assert!(!page.has_cached_thumbnail());
        let rotated = page.thumbnail().unwrap();
        assert_eq!((rotated.width(), rotated.height()), (72, 120));
    }

    #[test]
    fn test_thumbnail_without_renderer_fails() {
        let mut collection = collection_of(1);
        let err = collection.page_mut(0).unwrap().thumbnail().unwrap_err();
        assert!(matches!(
            err,
            crate::error::PagedeckError::RasterizeFailure { .. }
        ));
    }
}
