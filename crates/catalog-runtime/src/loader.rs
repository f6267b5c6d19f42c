use catalog_types::{CatalogItem, Division, ExclusionSet, Group, GroupKind};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::store::{GroupStore, StoreResult};

/// Authoritative state as returned by one round of inbound listings.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub items: Vec<CatalogItem>,
    pub groups: Vec<Group>,
    pub exclusions: ExclusionSet,
    pub divisions: Vec<Division>,
    pub fetched_at: DateTime<Utc>,
}

/// Fetch items, groups, divisions and the exclusions of the Unassigned scope.
///
/// The three independent listings run concurrently; exclusions wait for the
/// group listing because their scope is the Unassigned backing id.
pub async fn load<S>(store: &S) -> StoreResult<LoadedCatalog>
where
    S: GroupStore + ?Sized,
{
    let (items, groups, divisions) = tokio::try_join!(
        store.list_items(),
        store.list_groups(),
        store.list_divisions()
    )?;

    let scope = groups
        .iter()
        .find(|g| g.kind == GroupKind::Unassigned)
        .and_then(|g| g.id);
    let exclusions = match scope {
        Some(scope) => {
            ExclusionSet::from_exclusions(Some(scope), store.list_exclusions(scope).await?)
        }
        None => ExclusionSet::new(None),
    };

    debug!(
        items = items.len(),
        groups = groups.len(),
        exclusions = exclusions.len(),
        divisions = divisions.len(),
        "catalog loaded"
    );

    Ok(LoadedCatalog {
        items,
        groups,
        exclusions,
        divisions,
        fetched_at: Utc::now(),
    })
}
