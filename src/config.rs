//! Configuration loading and language-tag resolution

/// Session configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Language tag used when `start_listening` is called without one.
    /// `None` falls back to the host locale at call time.
    pub default_language: Option<String>,

    /// Request the microphone permission automatically when `start_listening`
    /// finds it ungranted
    pub auto_request_permission: bool,

    /// Ask the recognizer for partial results while listening
    pub partial_results: bool,

    /// Maximum number of recognition alternatives per result
    pub max_alternatives: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: None,
            auto_request_permission: true,
            partial_results: true,
            max_alternatives: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn load() -> Self {
        let defaults = Self::default();

        Self {
            default_language: std::env::var("VOICEBRIDGE_LANGUAGE")
                .ok()
                .filter(|s| !s.is_empty()),
            auto_request_permission: env_bool(
                "VOICEBRIDGE_AUTO_REQUEST_PERMISSION",
                defaults.auto_request_permission,
            ),
            partial_results: env_bool("VOICEBRIDGE_PARTIAL_RESULTS", defaults.partial_results),
            max_alternatives: std::env::var("VOICEBRIDGE_MAX_ALTERNATIVES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_alternatives),
        }
    }

    /// Resolve the language tag for a listen attempt.
    ///
    /// Resolution happens at call time: an explicit tag wins, then the
    /// configured default, then the host locale. A locale change between
    /// calls affects the next attempt, never the active one.
    pub fn resolve_language(&self, explicit: Option<&str>) -> String {
        if let Some(tag) = explicit {
            return tag.to_string();
        }
        if let Some(tag) = &self.default_language {
            return tag.clone();
        }
        host_language_tag()
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Read the host locale from the environment and normalize it to a BCP-47
/// style tag (`en_US.UTF-8` -> `en-US`). Falls back to `en-US`.
fn host_language_tag() -> String {
    std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LANG"))
        .ok()
        .and_then(|raw| normalize_locale(&raw))
        .unwrap_or_else(|| "en-US".to_string())
}

fn normalize_locale(raw: &str) -> Option<String> {
    let base = raw.split('.').next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}
