use std::path::PathBuf;
use std::time::Duration;

use slotbook_core::config::{ConfigError, or_default, parsed_or, process_env, required};

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project URL of the hosted backend (e.g. "https://abc.supabase.co"). Env var: `SUPABASE_URL`.
    pub supabase_url: String,
    /// Public anon key sent as `apikey` on every request. Env var: `SUPABASE_ANON_KEY`.
    pub anon_key: String,
    /// Directory holding the local durable store (default ".slotbook"). Env var: `SLOTBOOK_DATA_DIR`.
    pub data_dir: PathBuf,
    /// Storage bucket for profile photos (default "volunteer-photos"). Env var: `SLOTBOOK_PHOTO_BUCKET`.
    pub photo_bucket: String,
    /// TCP connect timeout for HTTP calls (default 10s). Env var: `SLOTBOOK_CONNECT_TIMEOUT_SECS`.
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase_url = required(lookup, "SUPABASE_URL")?
            .trim_end_matches('/')
            .to_owned();
        Ok(Self {
            supabase_url,
            anon_key: required(lookup, "SUPABASE_ANON_KEY")?,
            data_dir: PathBuf::from(or_default(lookup, "SLOTBOOK_DATA_DIR", ".slotbook")),
            photo_bucket: or_default(lookup, "SLOTBOOK_PHOTO_BUCKET", "volunteer-photos"),
            connect_timeout: Duration::from_secs(parsed_or(
                lookup,
                "SLOTBOOK_CONNECT_TIMEOUT_SECS",
                10u64,
            )?),
        })
    }
}
