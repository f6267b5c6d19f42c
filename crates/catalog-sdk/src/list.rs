use catalog_engine::{RowIndex, VirtualWindow, VisibleItemsTracker, WindowConfig, WindowRange};
use catalog_types::{ItemId, Row};
use tracing::trace;

/// Callback receiving the distinct item ids of the materialized rows.
pub type VisibleItemsListener = Box<dyn FnMut(&[ItemId]) + Send>;

/// Rows currently displayed plus the window over them.
///
/// Every change that can alter the materialized range (new rows, scroll,
/// resize, scroll-to) runs the visible-items check and notifies listeners.
pub struct ListView {
    rows: Vec<Row>,
    index: RowIndex,
    window: VirtualWindow,
    tracker: VisibleItemsTracker,
    listeners: Vec<VisibleItemsListener>,
}

impl ListView {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            rows: Vec::new(),
            index: RowIndex::default(),
            window: VirtualWindow::new(config),
            tracker: VisibleItemsTracker::new(),
            listeners: Vec::new(),
        }
    }

    /// Replace the row list. Returns the newly visible ids when they changed.
    pub fn set_rows(&mut self, rows: Vec<Row>) -> Option<Vec<ItemId>> {
        self.index = RowIndex::build(&rows);
        self.window.set_row_count(rows.len());
        self.rows = rows;
        self.tracker.rows_replaced();
        self.notify()
    }

    pub fn scroll(&mut self, offset: u64) -> Option<Vec<ItemId>> {
        self.window.on_scroll(offset);
        self.notify()
    }

    pub fn resize(&mut self, viewport_height: u32) -> Option<Vec<ItemId>> {
        self.window.resize(viewport_height);
        self.notify()
    }

    /// Scroll the row of `item_id` into view. `false` when it has no row.
    pub fn scroll_to(&mut self, item_id: ItemId) -> (bool, Option<Vec<ItemId>>) {
        if !self.window.scroll_to_id(&self.index, item_id) {
            trace!(%item_id, "scroll target has no row");
            return (false, None);
        }
        (true, self.notify())
    }

    pub fn add_listener(&mut self, listener: VisibleItemsListener) {
        self.listeners.push(listener);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows inside the materialized range.
    pub fn visible(&self) -> &[Row] {
        self.window.slice(&self.rows)
    }

    pub fn range(&self) -> Option<WindowRange> {
        self.window.range()
    }

    pub fn window(&self) -> &VirtualWindow {
        &self.window
    }

    pub fn visible_item_ids(&self) -> &[ItemId] {
        self.tracker.last_emitted()
    }

    pub fn position_of(&self, item_id: ItemId) -> Option<usize> {
        self.index.get(item_id)
    }

    fn notify(&mut self) -> Option<Vec<ItemId>> {
        let range = self.window.range();
        let ids = self.tracker.observe(range, &self.rows)?.to_vec();
        for listener in &mut self.listeners {
            listener(&ids);
        }
        Some(ids)
    }
}

impl Default for ListView {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}
