use serde::{Deserialize, Serialize};

/// Per-user preference bundle.
///
/// Stored as a JSON document on the user record. Keys missing from the
/// stored document are backfilled with defaults on read, so bundles written
/// by older versions keep deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub theme: String,

    pub language: String,

    pub notifications_enabled: bool,

    pub email_notifications: bool,

    pub chat_history_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "system".to_string(),
            language: "en".to_string(),
            notifications_enabled: true,
            email_notifications: true,
            chat_history_enabled: true,
        }
    }
}

/// Partial preference update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub theme: Option<String>,
    pub language: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub email_notifications: Option<bool>,
    pub chat_history_enabled: Option<bool>,
}

impl Preferences {
    /// Parse a stored bundle, backfilling defaults for anything missing.
    /// Unreadable documents fall back to the full default bundle.
    #[must_use]
    pub fn from_stored(raw: Option<&str>) -> Self {
        raw.and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default()
    }

    pub fn to_stored(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn apply(&mut self, update: PreferencesUpdate) {
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
        if let Some(language) = update.language {
            self.language = language;
        }
        if let Some(notifications_enabled) = update.notifications_enabled {
            self.notifications_enabled = notifications_enabled;
        }
        if let Some(email_notifications) = update.email_notifications {
            self.email_notifications = email_notifications;
        }
        if let Some(chat_history_enabled) = update.chat_history_enabled {
            self.chat_history_enabled = chat_history_enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_are_backfilled() {
        let prefs = Preferences::from_stored(Some(r#"{"theme":"dark"}"#));

        assert_eq!(prefs.theme, "dark");
        assert_eq!(prefs.language, "en");
        assert!(prefs.notifications_enabled);
    }

    #[test]
    fn test_absent_or_garbage_document_yields_defaults() {
        assert_eq!(Preferences::from_stored(None), Preferences::default());
        assert_eq!(
            Preferences::from_stored(Some("not json")),
            Preferences::default()
        );
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut prefs = Preferences::default();
        prefs.apply(PreferencesUpdate {
            theme: Some("dark".to_string()),
            notifications_enabled: Some(false),
            ..Default::default()
        });

        assert_eq!(prefs.theme, "dark");
        assert!(!prefs.notifications_enabled);
        assert_eq!(prefs.language, "en");
        assert!(prefs.chat_history_enabled);
    }

    #[test]
    fn test_round_trip() {
        let prefs = Preferences::default();
        let stored = prefs.to_stored().unwrap();
        assert_eq!(Preferences::from_stored(Some(&stored)), prefs);
    }
}
