//! Opaque identifier newtypes.
//!
//! Identifiers are plain strings minted by the id manager; the newtypes
//! exist so that definition, usage, and aside ids cannot be confused at
//! call sites. The encoded shapes are a convention of the id manager:
//!
//! ```text
//! definition: {scenario}.{block_type}[.{slug}].d{n}
//! usage:      {definition_id}.u{m}
//! aside:      {definition_id}.{aside_type} or {usage_id}.{aside_type}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

id_newtype! {
    /// Identifier for a configured component definition.
    DefinitionId
}

id_newtype! {
    /// Identifier for a placement of a definition in a content tree.
    UsageId
}

id_newtype! {
    /// Identifier for an aside attached to a definition or usage.
    AsideId
}
