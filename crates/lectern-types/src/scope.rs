//! Field visibility scopes.
//!
//! Every field a component declares carries a scope that determines how its
//! value is shared: per-definition content, per-usage settings, per-user
//! state, and so on. The two relational scopes (`Parent`, `Children`) are
//! not declared by components; the runtime uses them to persist tree
//! structure between scenario loads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::KeyError;

/// The visibility class of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Definition-scoped content, shared by every usage of the definition.
    Content,
    /// Usage-scoped settings.
    Settings,
    /// Per-user, per-usage state.
    UserState,
    /// Per-user preferences shared across every block of one type.
    Preferences,
    /// Per-user data crossing all blocks (e.g. timezone, language).
    UserInfo,
    /// Aggregate state across all users of one usage.
    UserStateSummary,
    /// Per-type configuration, global to the block class.
    Configuration,
    /// The usage id of a block's parent.
    Parent,
    /// The usage ids of a block's children.
    Children,
}

impl Scope {
    /// The block-scope bucket this scope's values are keyed under.
    ///
    /// `"type"` and `"all"` are special: keys under them skip the
    /// `{scenario}.{tag}.…` decomposition and use the scope id verbatim.
    pub fn block_scope_name(self) -> &'static str {
        match self {
            Scope::Content => "definition",
            Scope::Settings | Scope::UserState | Scope::UserStateSummary => "usage",
            Scope::Preferences | Scope::Configuration => "type",
            Scope::UserInfo => "all",
            Scope::Parent => "parent",
            Scope::Children => "children",
        }
    }

    /// Whether values in this scope belong to a single user.
    pub fn is_user_specific(self) -> bool {
        matches!(
            self,
            Scope::UserState | Scope::Preferences | Scope::UserInfo
        )
    }

    /// The snake_case name of the scope.
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Content => "content",
            Scope::Settings => "settings",
            Scope::UserState => "user_state",
            Scope::Preferences => "preferences",
            Scope::UserInfo => "user_info",
            Scope::UserStateSummary => "user_state_summary",
            Scope::Configuration => "configuration",
            Scope::Parent => "parent",
            Scope::Children => "children",
        }
    }

    /// All scopes, in declaration order.
    pub fn all() -> [Scope; 9] {
        [
            Scope::Content,
            Scope::Settings,
            Scope::UserState,
            Scope::Preferences,
            Scope::UserInfo,
            Scope::UserStateSummary,
            Scope::Configuration,
            Scope::Parent,
            Scope::Children,
        ]
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::all()
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| KeyError::UnknownScope(s.to_string()))
    }
}
