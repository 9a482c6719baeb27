//! User preferences kept as key-value pairs.

use crate::core::error::AppError;
use crate::core::traits::SettingsService;
use crate::infrastructure::traits::SettingsRepository;
use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    VibrationEnabled,
    FlashEnabled,
    ThemeMode,
    Language,
}

impl SettingKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::VibrationEnabled => "vibration_enabled",
            SettingKey::FlashEnabled => "flash_enabled",
            SettingKey::ThemeMode => "theme_mode",
            SettingKey::Language => "language",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    System,
    Light,
    Dark,
}

impl Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ThemeMode::System => "system",
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        })
    }
}

impl FromStr for ThemeMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(ThemeMode::System),
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Vibrate while a fake call rings. Default `true`.
    pub vibration_enabled: bool,
    /// Blink the camera flash while a fake call rings. Default `false`.
    pub flash_enabled: bool,
    /// Default `system`.
    pub theme_mode: ThemeMode,
    /// Language code, default `vi`.
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            vibration_enabled: true,
            flash_enabled: false,
            theme_mode: ThemeMode::System,
            language: "vi".to_owned(),
        }
    }
}

/// Partial update; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub vibration_enabled: Option<bool>,
    pub flash_enabled: Option<bool>,
    pub theme_mode: Option<ThemeMode>,
    pub language: Option<String>,
}

pub struct StoredSettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl StoredSettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        StoredSettingsService { repo }
    }

    async fn read<T: FromStr + Send>(&self, key: SettingKey, default: T) -> Result<T, AppError> {
        match self.repo.get_setting(key.as_str()).await? {
            None => Ok(default),
            Some(raw) => match raw.parse() {
                Ok(value) => Ok(value),
                Err(_) => {
                    warn!("ignoring unreadable value {raw:?} for {}", key.as_str());
                    Ok(default)
                }
            },
        }
    }

}

#[async_trait]
impl SettingsService for StoredSettingsService {
    async fn load(&self) -> Result<Settings, AppError> {
        let defaults = Settings::default();

        Ok(Settings {
            vibration_enabled: self
                .read(SettingKey::VibrationEnabled, defaults.vibration_enabled)
                .await?,
            flash_enabled: self
                .read(SettingKey::FlashEnabled, defaults.flash_enabled)
                .await?,
            theme_mode: self.read(SettingKey::ThemeMode, defaults.theme_mode).await?,
            language: self.read(SettingKey::Language, defaults.language).await?,
        })
    }

    async fn update(&self, patch: SettingsPatch) -> Result<Settings, AppError> {
        if let Some(language) = &patch.language {
            if language.trim().is_empty() {
                return Err(AppError::InvalidInput("language must not be empty".to_owned()));
            }
        }

        let mut changes = Vec::new();
        if let Some(value) = patch.vibration_enabled {
            changes.push((SettingKey::VibrationEnabled.as_str(), value.to_string()));
        }
        if let Some(value) = patch.flash_enabled {
            changes.push((SettingKey::FlashEnabled.as_str(), value.to_string()));
        }
        if let Some(value) = patch.theme_mode {
            changes.push((SettingKey::ThemeMode.as_str(), value.to_string()));
        }
        if let Some(value) = patch.language {
            changes.push((SettingKey::Language.as_str(), value.trim().to_owned()));
        }

        if !changes.is_empty() {
            self.repo.put_settings(&changes).await?;
        }

        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemorySettings {
        values: Mutex<HashMap<String, String>>,
        broken_key: Option<&'static str>,
    }

    #[async_trait]
    impl SettingsRepository for MemorySettings {
        async fn get_setting(&self, key: &str) -> Result<Option<String>, ()> {
            Ok(self.values.lock().await.get(key).cloned())
        }

        async fn put_settings(&self, values: &[(&str, String)]) -> Result<(), ()> {
            if values.iter().any(|(key, _)| Some(*key) == self.broken_key) {
                return Err(());
            }
            let mut stored = self.values.lock().await;
            for (key, value) in values {
                stored.insert((*key).to_owned(), value.clone());
            }
            Ok(())
        }
    }

    fn service() -> (Arc<MemorySettings>, StoredSettingsService) {
        let repo = Arc::new(MemorySettings::default());
        (repo.clone(), StoredSettingsService::new(repo))
    }

    #[tokio::test]
    async fn test_defaults_when_nothing_stored() {
        let (_, settings) = service();
        assert_eq!(settings.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_values() {
        let (_, settings) = service();

        let updated = settings
            .update(SettingsPatch {
                flash_enabled: Some(true),
                theme_mode: Some(ThemeMode::Dark),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(updated.flash_enabled);
        assert_eq!(updated.theme_mode, ThemeMode::Dark);
        assert!(updated.vibration_enabled);
        assert_eq!(updated.language, "vi");
    }

    #[tokio::test]
    async fn test_unreadable_value_falls_back_to_default() {
        let (repo, settings) = service();
        repo.put_settings(&[
            ("theme_mode", "purple".to_owned()),
            ("vibration_enabled", "maybe".to_owned()),
        ])
        .await
        .unwrap();

        let loaded = settings.load().await.unwrap();
        assert_eq!(loaded.theme_mode, ThemeMode::System);
        assert!(loaded.vibration_enabled);
    }

    #[tokio::test]
    async fn test_failed_update_changes_nothing() {
        let repo = Arc::new(MemorySettings {
            broken_key: Some("language"),
            ..Default::default()
        });
        let settings = StoredSettingsService::new(repo.clone());

        let result = settings
            .update(SettingsPatch {
                vibration_enabled: Some(false),
                flash_enabled: Some(true),
                language: Some("en".to_owned()),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::Storage)));
        assert!(repo.values.lock().await.is_empty());
        assert_eq!(settings.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_empty_language_is_rejected() {
        let (_, settings) = service();
        let result = settings
            .update(SettingsPatch {
                language: Some("  ".to_owned()),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_theme_mode_round_trips_through_text() {
        for mode in [ThemeMode::System, ThemeMode::Light, ThemeMode::Dark] {
            assert_eq!(mode.to_string().parse::<ThemeMode>(), Ok(mode));
        }
    }
}
