//! Environment-variable configuration for the crawl engine.
//!
//! Configuration loading proper (file formats, layering) is a non-goal per
//! `spec.md` §1; this module only resolves the `MWI_*` overrides listed in
//! `spec.md` §6 on top of hardcoded defaults, following the
//! `env_value`/`env_u64`/`env_bool` helper style used throughout the teacher
//! codebase's own `config.rs`.

use std::env;

/// Runtime-tunable knobs, all overridable via `MWI_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bounded in-flight HTTP operations per batch (`P` in spec.md §4.3/§5).
    pub fetch_concurrency: usize,
    /// Total per-request timeout in seconds (`T` in spec.md §4.3).
    pub fetch_timeout_secs: u64,
    /// User agent sent with every fetch.
    pub fetch_user_agent: String,
    /// Outlink/media discovery depth cap (spec.md §4.4).
    pub link_depth_cap: i32,

    /// Readable Refiner retry attempts (`R` in spec.md §4.5).
    pub readable_retries: u32,
    /// Readable Refiner batch size (`B` in spec.md §4.5).
    pub readable_batch_size: usize,
    /// Per-attempt timeout in seconds for the readable extractor.
    pub readable_timeout_secs: u64,

    /// Whether the Relevance Gate (§4.6) is enabled at all.
    pub openrouter_enabled: bool,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    /// Gate HTTP call timeout in seconds.
    pub openrouter_timeout_secs: u64,
    /// Truncation length for the readable body sent to the gate.
    pub openrouter_readable_max_chars: usize,
    /// Max gate calls per run (`K` in spec.md §4.6).
    pub openrouter_max_calls_per_run: u64,

    /// Media download retries (spec.md §4.7).
    pub media_download_retries: u32,
    /// Max media file size in bytes before rejection.
    pub media_max_file_size_bytes: u64,
    /// Minimum accepted image dimensions (width, height).
    pub media_min_dimensions: (u32, u32),
    /// k for k-means dominant-color extraction.
    pub media_color_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_concurrency: 10,
            fetch_timeout_secs: 30,
            fetch_user_agent: "MyWebIntelligence/1.0 (+https://github.com/mywebintelligence)"
                .to_string(),
            link_depth_cap: 3,

            readable_retries: 3,
            readable_batch_size: 10,
            readable_timeout_secs: 30,

            openrouter_enabled: false,
            openrouter_api_key: None,
            openrouter_model: "openrouter/auto".to_string(),
            openrouter_timeout_secs: 15,
            openrouter_readable_max_chars: 6_000,
            openrouter_max_calls_per_run: 500,

            media_download_retries: 2,
            media_max_file_size_bytes: 10 * 1024 * 1024,
            media_min_dimensions: (100, 100),
            media_color_k: 5,
        }
    }
}

impl Config {
    /// Load defaults, then apply any `MWI_*` overrides found in the process
    /// environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env_usize("MWI_FETCH_CONCURRENCY") {
            cfg.fetch_concurrency = v;
        }
        if let Some(v) = env_u64("MWI_FETCH_TIMEOUT_SECS") {
            cfg.fetch_timeout_secs = v;
        }
        if let Some(v) = env_value("MWI_FETCH_USER_AGENT") {
            cfg.fetch_user_agent = v;
        }
        if let Some(v) = env_i32("MWI_LINK_DEPTH_CAP") {
            cfg.link_depth_cap = v;
        }

        if let Some(v) = env_u64("MWI_READABLE_RETRIES") {
            cfg.readable_retries = v as u32;
        }
        if let Some(v) = env_usize("MWI_READABLE_BATCH_SIZE") {
            cfg.readable_batch_size = v;
        }
        if let Some(v) = env_u64("MWI_READABLE_TIMEOUT_SECS") {
            cfg.readable_timeout_secs = v;
        }

        if let Some(v) = env_bool("MWI_OPENROUTER_ENABLED") {
            cfg.openrouter_enabled = v;
        }
        if let Some(v) = env_value("MWI_OPENROUTER_API_KEY") {
            cfg.openrouter_api_key = Some(v);
        }
        if let Some(v) = env_value("MWI_OPENROUTER_MODEL") {
            cfg.openrouter_model = v;
        }
        if let Some(v) = env_u64("MWI_OPENROUTER_TIMEOUT") {
            cfg.openrouter_timeout_secs = v;
        }
        if let Some(v) = env_usize("MWI_OPENROUTER_READABLE_MAX_CHARS") {
            cfg.openrouter_readable_max_chars = v;
        }
        if let Some(v) = env_u64("MWI_OPENROUTER_MAX_CALLS_PER_RUN") {
            cfg.openrouter_max_calls_per_run = v;
        }

        cfg
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    env_value(key).map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_u64(key: &str) -> Option<u64> {
    env_value(key).and_then(|v| v.parse().ok())
}

fn env_i32(key: &str) -> Option<i32> {
    env_value(key).and_then(|v| v.parse().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_value(key).and_then(|v| v.parse().ok())
}

/// Split a comma-separated list into trimmed, non-empty terms. Used by the
/// `addterm`/`addurl` verbs' CSV flags (spec.md §6).
#[must_use]
pub fn parse_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.fetch_concurrency, 10);
        assert_eq!(cfg.fetch_timeout_secs, 30);
        assert_eq!(cfg.link_depth_cap, 3);
        assert_eq!(cfg.readable_retries, 3);
        assert_eq!(cfg.readable_batch_size, 10);
        assert!(!cfg.openrouter_enabled);
        assert_eq!(cfg.openrouter_timeout_secs, 15);
        assert_eq!(cfg.openrouter_readable_max_chars, 6_000);
        assert_eq!(cfg.openrouter_max_calls_per_run, 500);
        assert_eq!(cfg.media_min_dimensions, (100, 100));
    }

    #[test]
    fn env_overrides_apply() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MWI_FETCH_CONCURRENCY", "4");
            std::env::set_var("MWI_OPENROUTER_ENABLED", "true");
            std::env::set_var("MWI_OPENROUTER_MAX_CALLS_PER_RUN", "25");
        }
        let cfg = Config::from_env();
        assert_eq!(cfg.fetch_concurrency, 4);
        assert!(cfg.openrouter_enabled);
        assert_eq!(cfg.openrouter_max_calls_per_run, 25);
        unsafe {
            std::env::remove_var("MWI_FETCH_CONCURRENCY");
            std::env::remove_var("MWI_OPENROUTER_ENABLED");
            std::env::remove_var("MWI_OPENROUTER_MAX_CALLS_PER_RUN");
        }
    }

    #[test]
    fn parse_csv_trims_and_drops_empties() {
        assert_eq!(
            parse_csv(" asthme, pollution ,,urbaine"),
            vec!["asthme", "pollution", "urbaine"]
        );
    }
}
