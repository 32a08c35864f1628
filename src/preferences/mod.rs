use log::{ error, warn };
use std::fmt;

use crate::storage::{ KeyValueStore, StorageError, THEME_KEY };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Absent means dark; anything other than `"dark"` means light.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            None | Some("dark") => Theme::Dark,
            Some(_) => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub async fn load_theme(kv: &dyn KeyValueStore) -> Theme {
    match kv.get(THEME_KEY).await {
        Ok(token) => Theme::from_token(token.as_deref()),
        Err(e) => {
            warn!("Could not read theme preference, using default: {}", e);
            Theme::default()
        }
    }
}

pub async fn save_theme(kv: &dyn KeyValueStore, theme: Theme) -> Result<(), StorageError> {
    kv.set(THEME_KEY, theme.as_str()).await
}

/// Flips the saved theme and returns the new one. The new value is
/// returned even if it could not be saved.
pub async fn toggle_theme(kv: &dyn KeyValueStore) -> Theme {
    let next = load_theme(kv).await.toggled();
    if let Err(e) = save_theme(kv, next).await {
        error!("Failed to save theme preference: {}", e);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    #[test]
    fn test_token_mapping() {
        assert_eq!(Theme::from_token(None), Theme::Dark);
        assert_eq!(Theme::from_token(Some("dark")), Theme::Dark);
        assert_eq!(Theme::from_token(Some("light")), Theme::Light);
        assert_eq!(Theme::from_token(Some("solarized")), Theme::Light);
    }

    #[tokio::test]
    async fn test_toggle_persists_token() {
        let kv = MemoryKeyValueStore::new();
        assert_eq!(load_theme(&kv).await, Theme::Dark);

        assert_eq!(toggle_theme(&kv).await, Theme::Light);
        assert_eq!(kv.get(THEME_KEY).await.unwrap().as_deref(), Some("light"));

        assert_eq!(toggle_theme(&kv).await, Theme::Dark);
        assert_eq!(kv.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));
    }
}
