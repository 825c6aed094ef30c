//! Credentials and endpoints, resolved once and passed in explicitly.

use crate::error::{CardError, Result};
use crate::mail::DEFAULT_SENDER;
use crate::message::{DEFAULT_FALLBACK_MODEL, DEFAULT_PRIMARY_MODEL};

/// Everything the workflow needs to reach the two vendors.
///
/// Keys may be absent; the generator and dispatcher report a
/// [`CardError::Configuration`] when asked to work without one.
#[derive(Clone)]
pub struct CardConfig {
    /// Gemini API key.
    pub gemini_api_key: Option<String>,
    /// Resend API key, forwarded by the relay.
    pub resend_api_key: Option<String>,
    /// Model tried first.
    pub primary_model: String,
    /// Model tried once when the primary is not found.
    pub fallback_model: String,
    /// Verified sender identity.
    pub sender: String,
}

impl std::fmt::Debug for CardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardConfig")
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "resend_api_key",
                &self.resend_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("primary_model", &self.primary_model)
            .field("fallback_model", &self.fallback_model)
            .field("sender", &self.sender)
            .finish()
    }
}

impl Default for CardConfig {
    /// Built-in defaults, ignoring the environment.
    fn default() -> Self {
        CardConfigBuilder::new().build_with(|_| None)
    }
}

impl CardConfig {
    /// Creates a new `CardConfigBuilder`.
    pub fn builder() -> CardConfigBuilder {
        CardConfigBuilder::new()
    }

    /// Resolves everything from the environment.
    pub fn from_env() -> Self {
        CardConfigBuilder::new().build()
    }

    /// The Gemini key, or a configuration error naming the variable to set.
    pub fn require_gemini_key(&self) -> Result<&str> {
        non_blank(self.gemini_api_key.as_deref()).ok_or_else(|| {
            CardError::Configuration(
                "GEMINI_API_KEY (or GOOGLE_API_KEY) not set and no API key provided".into(),
            )
        })
    }

    /// The Resend key, or a configuration error naming the variable to set.
    pub fn require_resend_key(&self) -> Result<&str> {
        non_blank(self.resend_api_key.as_deref()).ok_or_else(|| {
            CardError::Configuration("RESEND_API_KEY not set and no API key provided".into())
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Builder for [`CardConfig`].
///
/// Explicit values win; unset values fall back to environment variables,
/// then to built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct CardConfigBuilder {
    gemini_api_key: Option<String>,
    resend_api_key: Option<String>,
    primary_model: Option<String>,
    fallback_model: Option<String>,
    sender: Option<String>,
}

impl CardConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Gemini key. Falls back to `GEMINI_API_KEY`, then
    /// `GOOGLE_API_KEY`.
    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    /// Sets the Resend key. Falls back to `RESEND_API_KEY`.
    pub fn resend_api_key(mut self, key: impl Into<String>) -> Self {
        self.resend_api_key = Some(key.into());
        self
    }

    /// Sets the primary model identifier.
    pub fn primary_model(mut self, model: impl Into<String>) -> Self {
        self.primary_model = Some(model.into());
        self
    }

    /// Sets the fallback model identifier.
    pub fn fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = Some(model.into());
        self
    }

    /// Sets the sender identity. Falls back to `FESTIVE_SENDER`.
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Builds the config.
    pub fn build(self) -> CardConfig {
        self.build_with(|name| std::env::var(name).ok())
    }

    fn build_with(self, env: impl Fn(&str) -> Option<String>) -> CardConfig {
        let gemini_api_key = self
            .gemini_api_key
            .or_else(|| env("GEMINI_API_KEY"))
            .or_else(|| env("GOOGLE_API_KEY"));
        let resend_api_key = self.resend_api_key.or_else(|| env("RESEND_API_KEY"));
        let sender = self
            .sender
            .or_else(|| env("FESTIVE_SENDER"))
            .unwrap_or_else(|| DEFAULT_SENDER.to_string());

        CardConfig {
            gemini_api_key,
            resend_api_key,
            primary_model: self
                .primary_model
                .unwrap_or_else(|| DEFAULT_PRIMARY_MODEL.to_string()),
            fallback_model: self
                .fallback_model
                .unwrap_or_else(|| DEFAULT_FALLBACK_MODEL.to_string()),
            sender,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fake_env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = CardConfigBuilder::new().build_with(fake_env(&[]));
        assert!(config.gemini_api_key.is_none());
        assert!(config.resend_api_key.is_none());
        assert_eq!(config.primary_model, "gemini-2.5-flash");
        assert_eq!(config.fallback_model, "gemini-1.5-flash");
        assert_eq!(config.sender, DEFAULT_SENDER);
    }

    #[test]
    fn test_environment_fallbacks() {
        let config = CardConfigBuilder::new().build_with(fake_env(&[
            ("GOOGLE_API_KEY", "google"),
            ("RESEND_API_KEY", "re_123"),
            ("FESTIVE_SENDER", "Cards <cards@example.com>"),
        ]));
        assert_eq!(config.gemini_api_key.as_deref(), Some("google"));
        assert_eq!(config.resend_api_key.as_deref(), Some("re_123"));
        assert_eq!(config.sender, "Cards <cards@example.com>");

        let config = CardConfigBuilder::new().build_with(fake_env(&[
            ("GEMINI_API_KEY", "gemini"),
            ("GOOGLE_API_KEY", "google"),
        ]));
        assert_eq!(config.gemini_api_key.as_deref(), Some("gemini"));
    }

    #[test]
    fn test_explicit_values_win() {
        let config = CardConfig::builder()
            .gemini_api_key("explicit")
            .primary_model("gemini-3-flash")
            .build_with(fake_env(&[("GEMINI_API_KEY", "env")]));
        assert_eq!(config.gemini_api_key.as_deref(), Some("explicit"));
        assert_eq!(config.primary_model, "gemini-3-flash");
    }

    #[test]
    fn test_require_keys() {
        let config = CardConfig::default();
        assert!(matches!(
            config.require_gemini_key(),
            Err(CardError::Configuration(_))
        ));
        assert!(matches!(
            config.require_resend_key(),
            Err(CardError::Configuration(_))
        ));

        let config = CardConfig::builder()
            .gemini_api_key("g")
            .resend_api_key("  ")
            .build_with(fake_env(&[]));
        assert_eq!(config.require_gemini_key().unwrap(), "g");
        assert!(config.require_resend_key().is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = CardConfig::builder()
            .gemini_api_key("secret-gemini")
            .resend_api_key("secret-resend")
            .build_with(fake_env(&[]));
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
