//! Stand-in user service.
//!
//! A real deployment resolves users from a platform directory; the
//! workbench fabricates a predictable user from whatever id the runtime
//! was configured with, so components depending on user data still work.

use serde::{Deserialize, Serialize};

/// A workbench user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbenchUser {
    pub id: Option<String>,
    pub full_name: String,
    pub emails: Vec<String>,
}

/// Fabricates the current user for the workbench.
#[derive(Debug)]
pub struct UserService {
    user: WorkbenchUser,
}

impl UserService {
    pub fn new(user_id: Option<String>) -> Self {
        let full_name = match &user_id {
            Some(id) => format!("Lectern User ({id})"),
            None => "Lectern User (anonymous)".to_string(),
        };
        UserService {
            user: WorkbenchUser {
                id: user_id,
                full_name,
                emails: vec!["user@example.com".to_string()],
            },
        }
    }

    /// The acting user.
    pub fn current_user(&self) -> &WorkbenchUser {
        &self.user
    }
}
