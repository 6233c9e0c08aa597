//! Signup/login over the [`ContentStore`]'s `users` table.
//!
//! Passwords are hashed as plain `SHA-256(password)` with no separate
//! salt column.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ContentError;
use crate::store::{ContentStore, Row};

const USERS_TABLE: &str = "users";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub mobile: String,
    pub is_premium: bool,
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Create a user row `{name, mobile, password_hash, is_premium: false}`.
///
/// # Errors
///
/// Returns [`ContentError::Store`] if `mobile` is already registered, or
/// whatever the underlying store reports.
pub async fn signup(
    store: &impl ContentStore,
    name: &str,
    mobile: &str,
    password: &str,
) -> Result<User, ContentError> {
    let mut mobile_filter = Row::new();
    mobile_filter.insert("mobile".to_string(), Value::String(mobile.to_string()));
    let existing = store.select(USERS_TABLE, &mobile_filter).await?;
    if !existing.is_empty() {
        return Err(ContentError::Store {
            reason: format!("mobile {mobile} is already registered"),
        });
    }

    let mut row = Row::new();
    row.insert("name".to_string(), Value::String(name.to_string()));
    row.insert("mobile".to_string(), Value::String(mobile.to_string()));
    row.insert("password_hash".to_string(), Value::String(hash_password(password)));
    row.insert("is_premium".to_string(), Value::Bool(false));
    store.insert(USERS_TABLE, row).await?;

    Ok(User {
        name: name.to_string(),
        mobile: mobile.to_string(),
        is_premium: false,
    })
}

/// Look up a user by `(mobile, sha256(password))`.
///
/// # Errors
///
/// Returns [`ContentError::NotFound`] when no row matches.
pub async fn login(store: &impl ContentStore, mobile: &str, password: &str) -> Result<User, ContentError> {
    let mut filter = Row::new();
    filter.insert("mobile".to_string(), Value::String(mobile.to_string()));
    filter.insert("password_hash".to_string(), Value::String(hash_password(password)));
    let rows = store.select(USERS_TABLE, &filter).await?;
    let row = rows.into_iter().next().ok_or(ContentError::NotFound)?;
    row_to_user(&row)
}

fn row_to_user(row: &Row) -> Result<User, ContentError> {
    let name = row.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
    let mobile = row.get("mobile").and_then(Value::as_str).unwrap_or_default().to_string();
    let is_premium = row.get("is_premium").and_then(Value::as_bool).unwrap_or(false);
    Ok(User { name, mobile, is_premium })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryContentStore;

    #[tokio::test]
    async fn signup_then_login_round_trips() {
        let store = MemoryContentStore::new();
        signup(&store, "Asha", "919900000001", "hunter2").await.unwrap();

        let user = login(&store, "919900000001", "hunter2").await.unwrap();
        assert_eq!(user.name, "Asha");
        assert!(!user.is_premium);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_not_found() {
        let store = MemoryContentStore::new();
        signup(&store, "Asha", "919900000001", "hunter2").await.unwrap();

        let err = login(&store, "919900000001", "wrong").await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound));
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_mobile() {
        let store = MemoryContentStore::new();
        signup(&store, "Asha", "919900000001", "hunter2").await.unwrap();

        let err = signup(&store, "Asha Again", "919900000001", "other").await.unwrap_err();
        assert!(matches!(err, ContentError::Store { .. }));
    }
}
