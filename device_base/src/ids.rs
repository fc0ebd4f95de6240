/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt;

use serde::{Deserialize, Serialize};

/* Id newtypes for type-safe row references. */

macro_rules! row_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Serialize,
            Deserialize,
            Debug,
            Clone,
            Copy,
            Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// A device catalog row.
    DeviceId
);
row_id!(
    /// A switch port row.
    PortId
);
row_id!(
    /// A credential vault entry.
    CredentialId
);
row_id!(
    /// An event row.
    EventId
);
row_id!(
    /// A status-history row.
    HistoryId
);
