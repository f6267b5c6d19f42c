use catalog_types::{Catalog, ExclusionSet, GroupSelector, GroupsSnapshot, ViewMode};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

use crate::partition::{Membership, PartitionInputs};

/// Shared, immutable inputs of one partition computation.
///
/// Cloning is cheap. Two sources are "the same" for memoization when every
/// `Arc` points at the same allocation and the view mode matches.
#[derive(Debug, Clone, Default)]
pub struct PartitionSources {
    pub catalog: Arc<Catalog>,
    pub groups: Arc<GroupsSnapshot>,
    pub exclusions: Arc<ExclusionSet>,
    pub view_mode: ViewMode,
}

impl PartitionSources {
    pub fn new(
        catalog: Arc<Catalog>,
        groups: Arc<GroupsSnapshot>,
        exclusions: Arc<ExclusionSet>,
        view_mode: ViewMode,
    ) -> Self {
        Self {
            catalog,
            groups,
            exclusions,
            view_mode,
        }
    }

    pub fn inputs(&self) -> PartitionInputs<'_> {
        PartitionInputs::new(&self.catalog, &self.groups, &self.exclusions, self.view_mode)
    }

    fn same_identity(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.catalog, &other.catalog)
            && Arc::ptr_eq(&self.groups, &other.groups)
            && Arc::ptr_eq(&self.exclusions, &other.exclusions)
            && self.view_mode == other.view_mode
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug)]
struct CacheEntry {
    // Holding the Arcs keeps the allocations alive, so a pointer can never be
    // reused by a different snapshot while the entry exists.
    sources: PartitionSources,
    selector: GroupSelector,
    membership: Arc<Membership>,
}

/// Memoizes [`PartitionInputs::membership`] on snapshot identity and selector.
///
/// Bounded: once `capacity` entries are held, the least recently used one is
/// evicted.
#[derive(Debug)]
pub struct PartitionCache {
    entries: VecDeque<CacheEntry>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for PartitionCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl PartitionCache {
    pub const DEFAULT_CAPACITY: usize = 32;

    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn membership(
        &mut self,
        sources: &PartitionSources,
        selector: GroupSelector,
    ) -> Arc<Membership> {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.selector == selector && e.sources.same_identity(sources))
        {
            self.hits += 1;
            trace!(%selector, "partition cache hit");
            // Move to the back so eviction drops the coldest entry.
            if let Some(entry) = self.entries.remove(pos) {
                let membership = Arc::clone(&entry.membership);
                self.entries.push_back(entry);
                return membership;
            }
        }

        self.misses += 1;
        let membership = Arc::new(sources.inputs().membership(selector));
        trace!(%selector, size = membership.len(), "partition cache miss");

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(CacheEntry {
            sources: sources.clone(),
            selector,
            membership: Arc::clone(&membership),
        });
        membership
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
