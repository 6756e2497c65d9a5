//! Preference document: admins, prompt / localization texts, group policy, and bot data.
//!
//! Text values may be stored base64-encoded; [`Preference::decode_texts`] decodes them in place.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Texts {
    #[serde(default)]
    pub prompts: HashMap<String, String>,
    #[serde(default)]
    pub localizations: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    /// Admin chat id → display name.
    #[serde(default)]
    pub admins: HashMap<i64, String>,
    #[serde(default)]
    pub texts: Texts,
    #[serde(rename = "botdata", default)]
    pub bot_data: serde_json::Value,
    #[serde(rename = "onlyAdminsCanCommandInGroup", default)]
    pub only_admins_can_command_in_group: bool,
}

impl Preference {
    pub fn is_admin(&self, chat_id: i64) -> bool {
        self.admins.contains_key(&chat_id)
    }

    /// Prompt text for `key`; `None` when missing or empty.
    pub fn prompt(&self, key: &str) -> Option<&str> {
        self.texts
            .prompts
            .get(key)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn localization(&self, key: &str) -> Option<&str> {
        self.texts.localizations.get(key).map(String::as_str)
    }

    /// Replaces every prompt and localization that is valid base64 of UTF-8 text with its
    /// decoded form. Other values are kept verbatim.
    pub fn decode_texts(&mut self) {
        for value in self
            .texts
            .prompts
            .values_mut()
            .chain(self.texts.localizations.values_mut())
        {
            if let Some(decoded) = decode_base64_text(value) {
                *value = decoded;
            }
        }
    }
}

fn decode_base64_text(value: &str) -> Option<String> {
    let bytes = STANDARD.decode(value).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_document() {
        let json = r#"{
            "admins": {"42": "owner", "-100": "ops group"},
            "texts": {"prompts": {"start": "Welcome!"}},
            "botdata": {"version": 3},
            "onlyAdminsCanCommandInGroup": true
        }"#;
        let pref: Preference = serde_json::from_str(json).unwrap();

        assert!(pref.is_admin(42));
        assert!(pref.is_admin(-100));
        assert!(!pref.is_admin(7));
        assert!(pref.only_admins_can_command_in_group);
        assert_eq!(pref.prompt("start"), Some("Welcome!"));
        assert!(pref.texts.localizations.is_empty());
        assert_eq!(pref.bot_data["version"], 3);
    }

    #[test]
    fn test_missing_fields_default() {
        let pref: Preference = serde_json::from_str("{}").unwrap();
        assert!(pref.admins.is_empty());
        assert!(!pref.only_admins_can_command_in_group);
        assert_eq!(pref.prompt("start"), None);
    }

    #[test]
    fn test_decode_texts() {
        let mut pref = Preference::default();
        // "Hello there" / "Привет"
        pref.texts
            .prompts
            .insert("start".into(), "SGVsbG8gdGhlcmU=".into());
        pref.texts
            .localizations
            .insert("hi".into(), "0J/RgNC40LLQtdGC".into());
        pref.texts
            .prompts
            .insert("plain".into(), "not base64!".into());

        pref.decode_texts();

        assert_eq!(pref.prompt("start"), Some("Hello there"));
        assert_eq!(pref.localization("hi"), Some("Привет"));
        assert_eq!(pref.prompt("plain"), Some("not base64!"));
    }

    #[test]
    fn test_decode_keeps_non_utf8_payload() {
        let mut pref = Preference::default();
        // Valid base64 of bytes 0xff 0xfe, which is not UTF-8.
        pref.texts.prompts.insert("bin".into(), "//4=".into());
        pref.decode_texts();
        assert_eq!(pref.prompt("bin"), Some("//4="));
    }
}
