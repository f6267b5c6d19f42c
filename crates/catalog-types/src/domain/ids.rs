use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

numeric_id!(
    /// Catalog item identity (article or supply). Unique and positive.
    ItemId
);

numeric_id!(
    /// Server-assigned group identity.
    GroupId
);

numeric_id!(
    /// Organizational unit restricting which explicit groups are visible.
    DivisionId
);

numeric_id!(
    /// Business (tenant) owning a catalog. Group names are unique per business.
    BusinessId
);

numeric_id!(
    /// Client-side mutation identity, issued in strictly increasing order.
    OperationId
);
