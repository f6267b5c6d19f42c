mod division;
mod exclusion;
mod group;
mod ids;
mod item;
mod selector;

pub use division::{Division, DivisionScope};
pub use exclusion::{Exclusion, ExclusionSet};
pub use group::{Group, GroupKind, GroupMember, GroupsSnapshot, Revision};
pub use ids::{BusinessId, DivisionId, GroupId, ItemId, OperationId};
pub use item::{Catalog, CatalogItem, ItemAttributes};
pub use selector::{GroupSelector, ParseSelectorError, ViewMode};
