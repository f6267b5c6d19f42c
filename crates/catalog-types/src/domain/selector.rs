use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::GroupId;

/// Which group a view is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSelector {
    Explicit(GroupId),
    Unassigned,
    Discontinued,
}

impl GroupSelector {
    pub fn explicit_id(self) -> Option<GroupId> {
        match self {
            GroupSelector::Explicit(id) => Some(id),
            GroupSelector::Unassigned | GroupSelector::Discontinued => None,
        }
    }

    pub fn is_implicit(self) -> bool {
        !matches!(self, GroupSelector::Explicit(_))
    }
}

impl fmt::Display for GroupSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupSelector::Explicit(id) => write!(f, "{}", id),
            GroupSelector::Unassigned => write!(f, "unassigned"),
            GroupSelector::Discontinued => write!(f, "discontinued"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSelectorError(String);

impl fmt::Display for ParseSelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid group selector '{}': expected a group id, 'unassigned' or 'discontinued'",
            self.0
        )
    }
}

impl std::error::Error for ParseSelectorError {}

impl FromStr for GroupSelector {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unassigned" => Ok(GroupSelector::Unassigned),
            "discontinued" => Ok(GroupSelector::Discontinued),
            other => other
                .parse::<u64>()
                .map(|raw| GroupSelector::Explicit(GroupId::new(raw)))
                .map_err(|_| ParseSelectorError(s.to_string())),
        }
    }
}

/// Catalog universe used when listing explicit group members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Active,
    Discontinued,
}

impl ViewMode {
    pub fn admits(self, status_active: bool) -> bool {
        match self {
            ViewMode::Active => status_active,
            ViewMode::Discontinued => !status_active,
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ViewMode::Active),
            "discontinued" => Ok(ViewMode::Discontinued),
            other => Err(format!("unknown view mode: {}", other)),
        }
    }
}
