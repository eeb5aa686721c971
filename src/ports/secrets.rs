//! Secret lookup collaborator port.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret backend unavailable: {0}")]
    Unavailable(String),
}

/// Key/value credential lookup. `Ok(None)` means the credential is not
/// provisioned, which soft-disables the adapter that needs it.
#[cfg_attr(test, mockall::automock)]
pub trait SecretStore: Send + Sync {
    fn get_secret(&self, key: &str) -> Result<Option<String>, SecretError>;
}

/// Read a credential, treating a failed backend the same as an absent value.
///
/// Adapters must not fail a search because the secret backend is down; the
/// condition is logged and the source soft-disables.
pub fn get_secret_safe(store: &dyn SecretStore, key: &str) -> Option<String> {
    match store.get_secret(key) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, error = %err, "secret backend unavailable, treating credential as absent");
            None
        }
    }
}

/// Secret store backed by environment variables, loaded from `.env` by the
/// binary. Keys are upper-cased: `rakuten_app_id` reads `RAKUTEN_APP_ID`.
#[derive(Debug, Default)]
pub struct EnvSecrets;

impl EnvSecrets {
    pub fn new() -> Self {
        Self
    }
}

impl SecretStore for EnvSecrets {
    fn get_secret(&self, key: &str) -> Result<Option<String>, SecretError> {
        match std::env::var(key.to_uppercase()) {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            Ok(_) | Err(std::env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(SecretError::Unavailable(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_lookup_passes_value_through() {
        let mut store = MockSecretStore::new();
        store
            .expect_get_secret()
            .returning(|_| Ok(Some("app-id".to_string())));

        assert_eq!(
            get_secret_safe(&store, "rakuten_app_id"),
            Some("app-id".to_string())
        );
    }

    #[test]
    fn test_safe_lookup_treats_backend_failure_as_absent() {
        let mut store = MockSecretStore::new();
        store
            .expect_get_secret()
            .returning(|_| Err(SecretError::Unavailable("keychain locked".to_string())));

        assert_eq!(get_secret_safe(&store, "rakuten_app_id"), None);
    }

    #[test]
    fn test_env_secrets_reads_uppercased_key() {
        std::env::set_var("FLIPSCOUT_TEST_SECRET", "value");
        let store = EnvSecrets::new();

        assert_eq!(
            store.get_secret("flipscout_test_secret").unwrap(),
            Some("value".to_string())
        );
        std::env::remove_var("FLIPSCOUT_TEST_SECRET");
    }

    #[test]
    fn test_env_secrets_missing_is_none_not_error() {
        let store = EnvSecrets::new();
        assert_eq!(store.get_secret("flipscout_never_set").unwrap(), None);
    }
}
