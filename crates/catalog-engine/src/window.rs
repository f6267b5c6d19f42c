use catalog_types::{ItemId, Row};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Fixed geometry of a virtualized list, in pixels and rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub row_height: u32,
    pub viewport_height: u32,
    pub overscan: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            row_height: 48,
            viewport_height: 600,
            overscan: 4,
        }
    }
}

/// Inclusive row index range materialized by the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRange {
    pub start: usize,
    pub end: usize,
}

impl WindowRange {
    pub fn row_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

/// Scroll bookkeeping over a list of `row_count` equally tall rows.
///
/// Every operation is index arithmetic; nothing scans or copies the rows.
#[derive(Debug, Clone)]
pub struct VirtualWindow {
    row_height: u32,
    viewport_height: u32,
    overscan: usize,
    row_count: usize,
    scroll_offset: u64,
}

impl VirtualWindow {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            // A zero row height would make every offset map to row 0.
            row_height: config.row_height.max(1),
            viewport_height: config.viewport_height,
            overscan: config.overscan,
            row_count: 0,
            scroll_offset: 0,
        }
    }

    pub fn config(&self) -> WindowConfig {
        WindowConfig {
            row_height: self.row_height,
            viewport_height: self.viewport_height,
            overscan: self.overscan,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn total_height(&self) -> u64 {
        self.row_count as u64 * u64::from(self.row_height)
    }

    /// Largest offset that still fills the viewport.
    pub fn max_offset(&self) -> u64 {
        self.total_height()
            .saturating_sub(u64::from(self.viewport_height))
    }

    /// Adopt a new row list length, keeping the offset inside the content.
    pub fn set_row_count(&mut self, row_count: usize) {
        self.row_count = row_count;
        self.scroll_offset = self.scroll_offset.min(self.max_offset());
    }

    pub fn resize(&mut self, viewport_height: u32) {
        self.viewport_height = viewport_height;
        self.scroll_offset = self.scroll_offset.min(self.max_offset());
    }

    pub fn on_scroll(&mut self, offset: u64) -> Option<WindowRange> {
        self.scroll_offset = offset.min(self.max_offset());
        trace!(offset = self.scroll_offset, "scrolled");
        self.range()
    }

    /// Place row `index` roughly a third of the way down the viewport.
    pub fn scroll_to_index(&mut self, index: usize) -> Option<WindowRange> {
        let target = (index as u64).saturating_mul(u64::from(self.row_height));
        self.on_scroll(target.saturating_sub(u64::from(self.viewport_height / 3)))
    }

    /// Scroll so the row of `item_id` is visible. Returns `false` and leaves the
    /// offset untouched when the id has no row.
    pub fn scroll_to_id(&mut self, index: &RowIndex, item_id: ItemId) -> bool {
        match index.get(item_id) {
            Some(pos) => {
                self.scroll_to_index(pos);
                true
            }
            None => false,
        }
    }

    /// Current materialized range, or `None` for an empty list.
    pub fn range(&self) -> Option<WindowRange> {
        if self.row_count == 0 {
            return None;
        }
        let row_height = u64::from(self.row_height);
        let first = (self.scroll_offset / row_height) as usize;
        let start = first.saturating_sub(self.overscan).min(self.row_count - 1);
        let per_viewport = u64::from(self.viewport_height).div_ceil(row_height) as usize;
        let end = start
            .saturating_add(per_viewport)
            .saturating_add(self.overscan.saturating_mul(2))
            .min(self.row_count - 1);
        Some(WindowRange { start, end })
    }

    /// Borrow the materialized rows. Never allocates.
    pub fn slice<'r, T>(&self, rows: &'r [T]) -> &'r [T] {
        let Some(range) = self.range() else {
            return &[];
        };
        let end = range.end.min(rows.len().saturating_sub(1));
        rows.get(range.start..=end).unwrap_or(&[])
    }
}

impl Default for VirtualWindow {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}

/// Item id to row position, rebuilt whenever the row list changes.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    positions: HashMap<ItemId, usize>,
}

impl RowIndex {
    pub fn build(rows: &[Row]) -> Self {
        let mut positions = HashMap::with_capacity(rows.len());
        for (pos, row) in rows.iter().enumerate() {
            if let Some(item_id) = row.item_id() {
                positions.entry(item_id).or_insert(pos);
            }
        }
        Self { positions }
    }

    pub fn get(&self, item_id: ItemId) -> Option<usize> {
        self.positions.get(&item_id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Decides when the set of visible item ids is worth announcing.
///
/// Emits only when the window range moved *and* the resulting id list differs
/// from the last emission.
#[derive(Debug, Clone)]
pub struct VisibleItemsTracker {
    last_range: Option<WindowRange>,
    last_ids: Vec<ItemId>,
    stale: bool,
}

impl Default for VisibleItemsTracker {
    fn default() -> Self {
        Self {
            last_range: None,
            last_ids: Vec::new(),
            stale: true,
        }
    }
}

impl VisibleItemsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, range: Option<WindowRange>, rows: &[Row]) -> Option<&[ItemId]> {
        if !self.stale && range == self.last_range {
            return None;
        }
        self.stale = false;
        self.last_range = range;

        let slice = match range {
            Some(range) => rows.get(range.start..=range.end).unwrap_or(&[]),
            None => &[],
        };
        let mut seen = HashSet::with_capacity(slice.len());
        let ids: Vec<ItemId> = slice
            .iter()
            .filter_map(Row::item_id)
            .filter(|id| seen.insert(*id))
            .collect();

        if ids == self.last_ids {
            return None;
        }
        self.last_ids = ids;
        Some(&self.last_ids)
    }

    /// Forget the last range after the rows were replaced, so an unchanged
    /// range over different rows is re-evaluated.
    pub fn rows_replaced(&mut self) {
        self.stale = true;
    }

    pub fn last_emitted(&self) -> &[ItemId] {
        &self.last_ids
    }
}
