use std::sync::Arc;

use catalog_engine::{CacheStats, PartitionCache, is_visible, visible_rows};
use catalog_runtime::{CatalogEvent, CatalogRuntime, Config, DispatchOutcome, GroupStore, Operation};
use catalog_types::{
    DivisionId, DivisionScope, GroupSelector, ItemId, MutationAction, Row, ViewMode,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::events::EventStream;
use crate::list::{ListView, VisibleItemsListener};

/// Facade a grouped-list UI talks to.
///
/// Holds the runtime, a partition cache and the displayed list. Every state
/// change re-renders the rows of the current selection and scope.
pub struct Client<S: GroupStore> {
    runtime: CatalogRuntime<S>,
    cache: PartitionCache,
    list: ListView,
    selected: Option<GroupSelector>,
}

impl<S: GroupStore> Client<S> {
    /// Load the catalog from `store` and render every group of the main scope.
    pub async fn connect(store: Arc<S>, config: Config) -> Result<Self> {
        let list = ListView::new(config.window);
        let runtime = CatalogRuntime::connect(store, config).await?;
        let mut client = Self {
            runtime,
            cache: PartitionCache::default(),
            list,
            selected: None,
        };
        client.render();
        Ok(client)
    }

    /// Rows for an arbitrary selection and scope, without touching the list.
    pub fn visible_rows(
        &mut self,
        selected: Option<GroupSelector>,
        scope: &DivisionScope,
    ) -> Vec<Row> {
        let sources = self.runtime.sources();
        visible_rows(
            &mut self.cache,
            &sources,
            scope,
            selected,
            &self.runtime.config().labels,
        )
    }

    /// Apply a group mutation optimistically, send it and reconcile.
    ///
    /// The optimistic rows are rendered (and listeners notified) before the
    /// store is contacted.
    pub async fn dispatch(&mut self, action: MutationAction) -> Result<DispatchOutcome> {
        self.run(Operation::from(action)).await
    }

    /// Hide active, ungrouped items from Unassigned.
    pub async fn exclude(&mut self, item_ids: Vec<ItemId>) -> Result<DispatchOutcome> {
        self.run(Operation::Exclude { item_ids }).await
    }

    pub async fn include(&mut self, item_ids: Vec<ItemId>) -> Result<DispatchOutcome> {
        self.run(Operation::Include { item_ids }).await
    }

    /// Remove from every explicit group and from the exclusion set.
    pub async fn unassign(&mut self, item_ids: Vec<ItemId>) -> Result<DispatchOutcome> {
        self.run(Operation::Unassign { item_ids }).await
    }

    async fn run(&mut self, operation: Operation) -> Result<DispatchOutcome> {
        let pending = self.runtime.begin(operation)?;
        self.render();

        let store = Arc::clone(self.runtime.store());
        let report =
            catalog_runtime::execute(store.as_ref(), &pending.plan, self.runtime.config().batch_size())
                .await;
        let outcome = self.runtime.finish(&pending, report).await;
        debug!(operation = %pending.id, ?outcome, "operation resolved");

        self.render();
        Ok(outcome)
    }

    /// Refetch server truth.
    pub async fn refresh(&mut self) -> Result<bool> {
        let adopted = self.runtime.refresh().await?;
        self.render();
        Ok(adopted)
    }

    /// Show one group (`Some`) or every visible group (`None`).
    ///
    /// Results of operations still in flight are discarded once they resolve.
    pub fn select_group(&mut self, selected: Option<GroupSelector>) -> Result<()> {
        if let Some(GroupSelector::Explicit(id)) = selected
            && self.runtime.state().current().find(id).is_none()
        {
            return Err(Error::NotFound(format!("group {}", id)));
        }
        self.selected = selected;
        self.runtime.switch_group();
        self.render();
        Ok(())
    }

    /// Enter a division (`Some`) or go back to the main scope (`None`).
    ///
    /// A selected explicit group that the new scope hides is deselected.
    pub fn switch_division(&mut self, division_id: Option<DivisionId>) -> Result<()> {
        if self.runtime.state().division_scope(division_id).is_none() {
            let id = division_id.map(|id| id.to_string()).unwrap_or_default();
            return Err(Error::NotFound(format!("division {}", id)));
        }
        self.runtime.switch_division(division_id)?;

        if let Some(selected) = self.selected
            && !is_visible(self.runtime.state().current(), self.runtime.scope(), selected)
        {
            self.selected = None;
        }
        self.render();
        Ok(())
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.runtime.set_view_mode(view_mode);
        self.render();
    }

    /// Register a callback for changes of the visible item ids.
    pub fn on_visible_items_changed<F>(&mut self, listener: F)
    where
        F: FnMut(&[ItemId]) + Send + 'static,
    {
        let listener: VisibleItemsListener = Box::new(listener);
        self.list.add_listener(listener);
    }

    /// Scroll the row of `item_id` into view. Returns `false`, leaving the
    /// offset untouched, when the item has no row in the current list.
    pub fn scroll_to(&mut self, item_id: ItemId) -> bool {
        let (found, changed) = self.list.scroll_to(item_id);
        self.announce(changed);
        found
    }

    pub fn scroll(&mut self, offset: u64) {
        let changed = self.list.scroll(offset);
        self.announce(changed);
    }

    pub fn resize(&mut self, viewport_height: u32) -> Result<()> {
        if viewport_height == 0 {
            return Err(Error::InvalidInput(
                "viewport height must be positive".to_string(),
            ));
        }
        let changed = self.list.resize(viewport_height);
        self.announce(changed);
        Ok(())
    }

    /// Rows of the current selection and scope.
    pub fn rows(&self) -> &[Row] {
        self.list.rows()
    }

    /// Rows inside the materialized window.
    pub fn visible_slice(&self) -> &[Row] {
        self.list.visible()
    }

    pub fn list(&self) -> &ListView {
        &self.list
    }

    pub fn selected(&self) -> Option<GroupSelector> {
        self.selected
    }

    pub fn subscribe(&mut self) -> EventStream {
        EventStream::new(self.runtime.subscribe())
    }

    pub fn runtime(&self) -> &CatalogRuntime<S> {
        &self.runtime
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn render(&mut self) {
        let scope = self.runtime.scope().clone();
        let rows = self.visible_rows(self.selected, &scope);
        let changed = self.list.set_rows(rows);
        self.announce(changed);
    }

    fn announce(&mut self, changed: Option<Vec<ItemId>>) {
        if let Some(item_ids) = changed {
            self.runtime
                .emit(CatalogEvent::VisibleItemsChanged { item_ids });
        }
    }
}
