//! Reading and writing the session shadow copy.
//!
//! These helpers are the only code that touches the session keys. They are
//! called by the manager while it executes storage effects.

use crate::constants::storage_keys;
use crate::error::Result;
use crate::providers::KeyValueStore;
use crate::state::{Session, StoredSession};

/// Read every session key.
///
/// # Errors
///
/// Returns the first storage error.
pub async fn load<K: KeyValueStore>(store: &K) -> Result<StoredSession> {
    Ok(StoredSession {
        token: store.get(storage_keys::TOKEN).await?,
        user_id: store.get(storage_keys::USER_ID).await?,
        username: store.get(storage_keys::USERNAME).await?,
        email: store.get(storage_keys::EMAIL).await?,
        role: store.get(storage_keys::ROLE).await?,
    })
}

/// Read only the token key.
///
/// # Errors
///
/// Returns the storage error, if any.
pub async fn read_token<K: KeyValueStore>(store: &K) -> Result<Option<String>> {
    store.get(storage_keys::TOKEN).await
}

/// Write every field of `session`.
///
/// Stops at the first failure; the caller is expected to [`clear`] what
/// was partially written.
///
/// # Errors
///
/// Returns the first storage error.
pub async fn save<K: KeyValueStore>(store: &K, session: &Session) -> Result<()> {
    let user_id = session.user_id.to_string();
    let fields = [
        (storage_keys::TOKEN, session.token.as_str()),
        (storage_keys::USER_ID, user_id.as_str()),
        (storage_keys::USERNAME, session.username.as_str()),
        (storage_keys::EMAIL, session.email.as_str()),
        (storage_keys::ROLE, session.role.as_str()),
    ];

    for (key, value) in fields {
        store.set(key, value).await?;
    }
    Ok(())
}

/// Remove every session key.
///
/// Every key is attempted even after a failure.
///
/// # Errors
///
/// Returns the first storage error.
pub async fn clear<K: KeyValueStore>(store: &K) -> Result<()> {
    let mut first_error = None;

    for key in storage_keys::ALL {
        if let Err(e) = store.remove(key).await {
            tracing::warn!(key, error = %e, "Failed to remove session key");
            first_error.get_or_insert(e);
        }
    }

    first_error.map_or(Ok(()), Err)
}
