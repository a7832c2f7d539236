use std::collections::HashMap;
use std::string::FromUtf8Error;

use thiserror::Error;

const SERVICE: &str = "dayplan";
const ACCOUNT: &str = "chat-completions";
const LABEL: &str = "Dayplan plan-generation API key";

#[derive(Debug, Error)]
pub enum KeyringError {
    #[error("secret service error: {0}")]
    SecretService(#[from] oo7::Error),
    #[error("stored API key is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

fn lookup() -> HashMap<&'static str, &'static str> {
    HashMap::from([("service", SERVICE), ("account", ACCOUNT)])
}

/// Bearer credential kept in the desktop Secret Service.
pub struct ApiKeyVault {
    keyring: oo7::Keyring,
}

impl ApiKeyVault {
    pub async fn open() -> Result<Self, KeyringError> {
        Ok(Self {
            keyring: oo7::Keyring::new().await?,
        })
    }

    /// Save `key`, replacing any previous one.
    pub async fn store(&self, key: &str) -> Result<(), KeyringError> {
        self.keyring
            .create_item(LABEL, &lookup(), key.trim().as_bytes(), true)
            .await?;
        log::info!("Stored API key in keyring");
        Ok(())
    }

    pub async fn load(&self) -> Result<Option<String>, KeyringError> {
        let items = self.keyring.search_items(&lookup()).await?;
        let Some(item) = items.first() else {
            return Ok(None);
        };
        decode_key(item.secret().await?.to_vec())
    }

    /// Remove every stored key. Returns how many entries were deleted.
    pub async fn forget(&self) -> Result<usize, KeyringError> {
        let items = self.keyring.search_items(&lookup()).await?;
        let count = items.len();
        for item in items {
            item.delete().await?;
        }
        log::info!("Removed {} API key entries from keyring", count);
        Ok(count)
    }
}

/// A blank secret counts as no key.
fn decode_key(bytes: Vec<u8>) -> Result<Option<String>, KeyringError> {
    let key = String::from_utf8(bytes)?;
    let key = key.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_trimmed_key() {
        let key = decode_key(b"  sk-or-v1-abc\n".to_vec()).unwrap();
        assert_eq!(key.as_deref(), Some("sk-or-v1-abc"));
    }

    #[test]
    fn blank_secret_is_no_key() {
        assert_eq!(decode_key(b"   ".to_vec()).unwrap(), None);
        assert_eq!(decode_key(Vec::new()).unwrap(), None);
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        assert!(matches!(
            decode_key(vec![0xff, 0xfe]),
            Err(KeyringError::Utf8(_))
        ));
    }

    #[test]
    fn lookup_is_scoped_to_dayplan() {
        let attrs = lookup();
        assert_eq!(attrs.get("service"), Some(&"dayplan"));
        assert_eq!(attrs.len(), 2);
    }
}
