use std::sync::Mutex;

use crate::model::User;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("name/email required")]
    MissingField,
}

struct StoreInner {
    users: Vec<User>,
    next_id: u64,
}

/// In-memory user table shared by every transport.
///
/// Ids are decimal strings of a per-store counter starting at 1. Each store
/// owns its own counter, so independent stores never interfere.
pub struct UserStore {
    inner: Mutex<StoreInner>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                users: Vec::new(),
                next_id: 1,
            }),
        }
    }

    pub fn list(&self) -> Vec<User> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.users.clone()
    }

    /// Appends a user. Both fields must be non-empty.
    pub fn create(&self, name: &str, email: &str) -> Result<User, StoreError> {
        if name.is_empty() || email.is_empty() {
            return Err(StoreError::MissingField);
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let user = User {
            id: inner.next_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        };
        inner.next_id += 1;
        inner.users.push(user.clone());
        Ok(user)
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
