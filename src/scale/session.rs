//! Explicit session context for the bearer token.
//!
//! The token lives only in this process and is passed to every API call
//! site by cloning the `Session` handle. A 401 from any endpoint clears
//! it, which the app observes as the unauthenticated transition.

use std::sync::{Arc, RwLock};

/// Shared authentication state with a single process-wide lifecycle.
#[derive(Debug, Clone, Default)]
pub struct Session {
  token: Arc<RwLock<Option<String>>>,
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  /// Store the access token after a successful login.
  pub fn set(&self, token: String) {
    if let Ok(mut guard) = self.token.write() {
      *guard = Some(token);
    }
  }

  /// Drop the token (logout, or a 401 response).
  pub fn clear(&self) {
    if let Ok(mut guard) = self.token.write() {
      *guard = None;
    }
  }

  /// Current token, if authenticated.
  pub fn token(&self) -> Option<String> {
    self.token.read().ok().and_then(|guard| guard.clone())
  }

  pub fn is_authenticated(&self) -> bool {
    self.token().is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lifecycle() {
    let session = Session::new();
    assert!(!session.is_authenticated());

    session.set("tok".to_string());
    assert_eq!(session.token().as_deref(), Some("tok"));

    session.clear();
    assert!(session.token().is_none());
  }

  #[test]
  fn test_clones_share_state() {
    let session = Session::new();
    let clone = session.clone();

    session.set("tok".to_string());
    assert!(clone.is_authenticated());

    clone.clear();
    assert!(!session.is_authenticated());
  }
}
