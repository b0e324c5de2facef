use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_API_URL: &str = "http://localhost:3000";
pub(crate) const DEFAULT_AUTOSAVE_MS: i64 = 1000;

/// Runtime settings injected by the hosting page as `window.ENV`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    /// Quiet period before buffered edits are written.
    pub autosave_ms: i64,
}

impl EnvConfig {
    pub fn new() -> Self {
        let mut config = Self::defaults();

        let Some(env) = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object())
        else {
            return config;
        };

        let get = |key: &str| js_sys::Reflect::get(&env, &key.into()).ok();

        // `API_URL` is documented; `api_url` is still accepted.
        if let Some(url) = get("API_URL")
            .and_then(|v| v.as_string())
            .or_else(|| get("api_url").and_then(|v| v.as_string()))
        {
            config.api_url = url;
        }

        if let Some(ms) = get("AUTOSAVE_MS").and_then(|v| v.as_f64()) {
            config.autosave_ms = Self::sanitize_autosave_ms(ms);
        }

        config
    }

    pub fn defaults() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            autosave_ms: DEFAULT_AUTOSAVE_MS,
        }
    }

    /// Non-finite or non-positive values fall back to the default.
    pub(crate) fn sanitize_autosave_ms(ms: f64) -> i64 {
        if ms.is_finite() && ms >= 1.0 {
            ms.round() as i64
        } else {
            DEFAULT_AUTOSAVE_MS
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}
