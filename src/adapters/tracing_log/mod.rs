// Tracing log adapter - Structured logging using tracing crate

use tracing_subscriber::EnvFilter;

use crate::domain::errors::*;

/// Installs the global tracing subscriber
pub struct TracingLogAdapter;

impl TracingLogAdapter {
    /// Build the filter: `RUST_LOG` when set, `level` otherwise
    pub fn filter(level: &str) -> Result<EnvFilter, DomainError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(level).map_err(|e| {
                DomainError::ConfigFail(format!("Invalid log level '{}': {}", level, e))
            }),
        }
    }

    /// Install a text or JSON subscriber. Returns false if one was already
    /// installed, which is not an error.
    pub fn init(level: &str, json: bool) -> Result<bool, DomainError> {
        let filter = Self::filter(level)?;
        let installed = if json {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .is_ok()
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init()
                .is_ok()
        };
        Ok(installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        TracingLogAdapter::init("info", false).unwrap();
        assert!(!TracingLogAdapter::init("debug", true).unwrap());
    }

    #[test]
    fn test_filter_accepts_directives() {
        assert!(TracingLogAdapter::filter("snipfix=debug,warn").is_ok());
    }
}
