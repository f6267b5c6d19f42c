use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ids::ItemId;

/// One row of the external item catalog listing.
///
/// Immutable once loaded; `status_active` only changes through an external
/// catalog sync, which replaces the whole [`Catalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ItemId,
    pub status_active: bool,
    /// Rubro/category tag. May be empty for malformed rows; never a partition criterion.
    #[serde(default)]
    pub rubro_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl CatalogItem {
    pub fn active(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            status_active: true,
            rubro_code: String::new(),
            display_name: None,
            price: None,
        }
    }

    pub fn discontinued(id: impl Into<ItemId>) -> Self {
        Self {
            status_active: false,
            ..Self::active(id)
        }
    }

    pub fn with_rubro(mut self, rubro_code: impl Into<String>) -> Self {
        self.rubro_code = rubro_code.into();
        self
    }

    pub fn with_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Display attributes used to enrich group members.
    pub fn attributes(&self) -> ItemAttributes {
        ItemAttributes {
            display_name: self.display_name.clone(),
            category: (!self.rubro_code.trim().is_empty()).then(|| self.rubro_code.clone()),
            price: self.price,
        }
    }
}

/// Display attributes joined onto bare item ids. Every field is optional;
/// consumers fall back to placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl ItemAttributes {
    /// Number of known attributes. Used to avoid replacing rich data with poorer data.
    pub fn richness(&self) -> usize {
        usize::from(self.display_name.is_some())
            + usize::from(self.category.is_some())
            + usize::from(self.price.is_some())
    }
}

/// Flat item collection keyed by identity, preserving listing order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    positions: HashMap<ItemId, usize>,
}

impl Catalog {
    /// Build a catalog from a listing. Duplicate ids keep their first occurrence.
    pub fn new(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let mut catalog = Self::default();
        for item in items {
            if catalog.positions.contains_key(&item.id) {
                continue;
            }
            catalog.positions.insert(item.id, catalog.items.len());
            catalog.items.push(item);
        }
        catalog
    }

    pub fn get(&self, id: ItemId) -> Option<&CatalogItem> {
        self.positions.get(&id).map(|&pos| &self.items[pos])
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.positions.contains_key(&id)
    }

    /// `Some(true)` for active items, `Some(false)` for discontinued, `None` when unknown.
    pub fn is_active(&self, id: ItemId) -> Option<bool> {
        self.get(id).map(|item| item.status_active)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<CatalogItem> for Catalog {
    fn from_iter<T: IntoIterator<Item = CatalogItem>>(iter: T) -> Self {
        Self::new(iter)
    }
}
