// src/directory.rs - User directory lookup and id resolution

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::model::UserRef;

/// One mobile number with its on-call window (`HH:MM` bounds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileEntry {
    /// Phone number in whatever format the gateway accepts
    pub number: String,
    /// Inclusive `HH:MM` start of the on-call window
    #[serde(default)]
    pub from_time: String,
    /// Exclusive `HH:MM` end of the window; "00:00" means end of day
    #[serde(default)]
    pub to_time: String,
}

/// Delivery-address projection of a directory user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque directory id
    #[serde(rename = "_id")]
    pub id: String,
    /// Login name, used in logs and event payloads
    pub login: String,
    /// Mobile numbers with their on-call windows
    #[serde(default)]
    pub mobile: Vec<MobileEntry>,
    /// E-mail address, if any
    #[serde(default)]
    pub email: Option<String>,
}

/// Inbound dependency: the service's user directory.
///
/// Implementations perform one batched lookup and return the subset of
/// users that exist, projected down to `{login, mobile, email}`. Missing
/// ids yield fewer results, never an error.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// One batched lookup for all `ids`.
    async fn find_users(&self, ids: &[String]) -> Result<Vec<User>>;
}

/// Whether `id` is a well-formed opaque user id: 24 lowercase hex chars.
pub fn valid_user_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Resolve an action's user references into delivery-address records.
///
/// Malformed ids are dropped silently. An empty surviving set
/// short-circuits with no directory lookup at all; otherwise one batched
/// lookup runs. Lookup failures propagate so the caller can publish a
/// `findUsersFailed` event before surfacing the error.
pub async fn resolve_users(directory: &dyn UserDirectory, refs: &[UserRef]) -> Result<Vec<User>> {
    let ids: Vec<String> = refs
        .iter()
        .filter(|r| {
            let ok = valid_user_id(&r.id);
            if !ok {
                debug!("dropping malformed user id {:?}", r.id);
            }
            ok
        })
        .map(|r| r.id.clone())
        .collect();

    if ids.is_empty() {
        return Ok(Vec::new());
    }
    directory.find_users(&ids).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlarmError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDirectory {
        calls: AtomicUsize,
        users: Vec<User>,
    }

    #[async_trait]
    impl UserDirectory for CountingDirectory {
        async fn find_users(&self, ids: &[String]) -> Result<Vec<User>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .users
                .iter()
                .filter(|u| ids.contains(&u.id))
                .cloned()
                .collect())
        }
    }

    struct FailingDirectory;

    #[async_trait]
    impl UserDirectory for FailingDirectory {
        async fn find_users(&self, _ids: &[String]) -> Result<Vec<User>> {
            Err(AlarmError::Directory("store unavailable".into()))
        }
    }

    fn user(id: &str, login: &str) -> User {
        User {
            id: id.to_string(),
            login: login.to_string(),
            mobile: Vec::new(),
            email: None,
        }
    }

    #[test]
    fn id_validation() {
        assert!(valid_user_id("5f2a9c1d3e4b5a6c7d8e9f01"));
        assert!(!valid_user_id("5F2A9C1D3E4B5A6C7D8E9F01")); // uppercase
        assert!(!valid_user_id("5f2a9c1d3e4b5a6c7d8e9f0")); // short
        assert!(!valid_user_id("zzzz9c1d3e4b5a6c7d8e9f01")); // non-hex
        assert!(!valid_user_id(""));
    }

    #[tokio::test]
    async fn empty_references_skip_the_lookup() {
        let dir = CountingDirectory { calls: AtomicUsize::new(0), users: vec![] };
        let users = resolve_users(&dir, &[]).await.unwrap();
        assert!(users.is_empty());
        assert_eq!(dir.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_ids_drop_to_empty_without_lookup() {
        let dir = CountingDirectory { calls: AtomicUsize::new(0), users: vec![] };
        let refs = vec![
            UserRef { id: "not-an-id".into() },
            UserRef { id: String::new() },
        ];
        let users = resolve_users(&dir, &refs).await.unwrap();
        assert!(users.is_empty());
        assert_eq!(dir.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_batched_lookup_returns_existing_subset() {
        let dir = CountingDirectory {
            calls: AtomicUsize::new(0),
            users: vec![user("5f2a9c1d3e4b5a6c7d8e9f01", "alice")],
        };
        let refs = vec![
            UserRef { id: "5f2a9c1d3e4b5a6c7d8e9f01".into() },
            UserRef { id: "5f2a9c1d3e4b5a6c7d8e9f02".into() }, // missing in directory
            UserRef { id: "bogus".into() },                    // malformed, dropped
        ];
        let users = resolve_users(&dir, &refs).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].login, "alice");
        assert_eq!(dir.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        let refs = vec![UserRef { id: "5f2a9c1d3e4b5a6c7d8e9f01".into() }];
        let err = resolve_users(&FailingDirectory, &refs).await.unwrap_err();
        assert!(matches!(err, AlarmError::Directory(_)));
    }
}
