//! Config & Validation (SPEC_FULL §4.9).
//!
//! Plain data plus a single `validate()` gate, checked once at client
//! construction time rather than scattered across call sites — mirrors the
//! teacher's validate-at-build pattern for its feed manager.

use chrono::NaiveDate;

use crate::error::{IntrinioError, Result};
use crate::types::Provider;

/// Client configuration (SPEC_FULL §4.9). `log_level` is intentionally not
/// modeled: installing and filtering a `tracing` subscriber is the
/// caller's concern, not this crate's.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub provider: Provider,
    pub delayed: bool,
    pub num_threads: usize,
    pub symbols: Vec<String>,
    pub manual_ip_address: Option<String>,
    pub max_queue_size: usize,
    pub bypass_parsing: bool,
    pub replay_date: Option<NaiveDate>,
    pub with_simulated_delay: bool,
    pub delete_file_when_done: bool,
    pub write_to_csv: bool,
    pub csv_file_path: Option<String>,
    pub debug: bool,
}

impl Config {
    /// Construct a config with the documented defaults for everything but
    /// the required fields.
    pub fn new(api_key: impl Into<String>, provider: Provider) -> Self {
        let max_queue_size = if provider.is_options() {
            crate::constants::DEFAULT_MAX_QUEUE_SIZE_OPTIONS
        } else {
            crate::constants::DEFAULT_MAX_QUEUE_SIZE_EQUITIES
        };
        Self {
            api_key: api_key.into(),
            provider,
            delayed: false,
            num_threads: provider.min_threads(),
            symbols: Vec::new(),
            manual_ip_address: None,
            max_queue_size,
            bypass_parsing: false,
            replay_date: None,
            with_simulated_delay: false,
            delete_file_when_done: false,
            write_to_csv: false,
            csv_file_path: None,
            debug: false,
        }
    }

    /// Validate construction-time invariants (SPEC_FULL §4.9). Fatal —
    /// called once before a `Client` is built.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(IntrinioError::Config("api_key must not be empty".to_owned()));
        }

        let floor = self.provider.min_threads();
        if self.num_threads < floor {
            return Err(IntrinioError::Config(format!(
                "num_threads must be >= {floor} for provider {:?}, got {}",
                self.provider, self.num_threads
            )));
        }

        if self.provider == Provider::MANUAL && self.manual_ip_address.is_none() {
            return Err(IntrinioError::Config(
                "manual_ip_address is required when provider is MANUAL".to_owned(),
            ));
        }

        if self.write_to_csv && self.csv_file_path.is_none() {
            return Err(IntrinioError::Config(
                "csv_file_path is required when write_to_csv is set".to_owned(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let cfg = Config::new("", Provider::REALTIME);
        assert!(matches!(cfg.validate(), Err(IntrinioError::Config(_))));
    }

    #[test]
    fn rejects_options_below_thread_floor() {
        let mut cfg = Config::new("key", Provider::OPRA);
        cfg.num_threads = 2;
        assert!(matches!(cfg.validate(), Err(IntrinioError::Config(_))));
    }

    #[test]
    fn accepts_equities_with_two_threads() {
        let mut cfg = Config::new("key", Provider::REALTIME);
        cfg.num_threads = 2;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn manual_provider_requires_ip() {
        let cfg = Config::new("key", Provider::MANUAL);
        assert!(matches!(cfg.validate(), Err(IntrinioError::Config(_))));
    }

    #[test]
    fn write_to_csv_requires_path() {
        let mut cfg = Config::new("key", Provider::REALTIME);
        cfg.write_to_csv = true;
        assert!(matches!(cfg.validate(), Err(IntrinioError::Config(_))));
        cfg.csv_file_path = Some("out.csv".to_owned());
        assert!(cfg.validate().is_ok());
    }
}
