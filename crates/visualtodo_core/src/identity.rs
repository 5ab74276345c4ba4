//! Persistent anonymous user identity.
//!
//! The id is generated once per installation and stored in the local
//! fallback store so every session addresses the same remote collection.

use crate::repo::local_store::{LocalStore, LocalStoreResult};
use log::info;
use uuid::Uuid;

pub const USER_ID_KEY: &str = "todo-user-id";

const USER_ID_PREFIX: &str = "user_";
const USER_ID_SUFFIX_LEN: usize = 9;

/// Returns the stored user id, creating and storing one when absent.
pub fn resolve_user_id(store: &dyn LocalStore) -> LocalStoreResult<String> {
    if let Some(existing) = store.get(USER_ID_KEY)? {
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }

    let user_id = generate_user_id();
    store.set(USER_ID_KEY, &user_id)?;
    info!("event=identity_created module=identity status=ok");
    Ok(user_id)
}

/// `user_` followed by nine lowercase alphanumeric characters.
pub fn generate_user_id() -> String {
    let suffix = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(USER_ID_SUFFIX_LEN)
        .collect::<String>();
    format!("{USER_ID_PREFIX}{suffix}")
}
