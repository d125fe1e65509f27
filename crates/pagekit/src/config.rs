//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result, bail};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound applied to requested page sizes.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Page size used when a request does not set one (default: 10).
    pub default_page_size: u32,

    /// Largest page size a request may ask for (default: 100).
    pub max_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_page_size: u32 = lookup("PAGEKIT_DEFAULT_PAGE_SIZE")
            .unwrap_or_else(|| DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .context("PAGEKIT_DEFAULT_PAGE_SIZE must be a valid u32")?;

        let max_page_size: u32 = lookup("PAGEKIT_MAX_PAGE_SIZE")
            .unwrap_or_else(|| MAX_PAGE_SIZE.to_string())
            .parse()
            .context("PAGEKIT_MAX_PAGE_SIZE must be a valid u32")?;

        if default_page_size == 0 || max_page_size == 0 {
            bail!("page sizes must be greater than 0");
        }
        if default_page_size > max_page_size {
            bail!(
                "PAGEKIT_DEFAULT_PAGE_SIZE ({default_page_size}) exceeds PAGEKIT_MAX_PAGE_SIZE ({max_page_size})"
            );
        }

        Ok(Self {
            default_page_size,
            max_page_size,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_vars(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_page_size, 100);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_vars(lookup(&[
            ("PAGEKIT_DEFAULT_PAGE_SIZE", "25"),
            ("PAGEKIT_MAX_PAGE_SIZE", "500"),
        ]))
        .unwrap();

        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.max_page_size, 500);
    }

    #[test]
    fn rejects_garbage_numbers() {
        let err = Config::from_vars(lookup(&[("PAGEKIT_MAX_PAGE_SIZE", "lots")])).unwrap_err();
        assert!(err.to_string().contains("PAGEKIT_MAX_PAGE_SIZE"));
    }

    #[test]
    fn rejects_default_above_max() {
        let result = Config::from_vars(lookup(&[
            ("PAGEKIT_DEFAULT_PAGE_SIZE", "50"),
            ("PAGEKIT_MAX_PAGE_SIZE", "20"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_page_size() {
        let result = Config::from_vars(lookup(&[("PAGEKIT_DEFAULT_PAGE_SIZE", "0")]));
        assert!(result.is_err());
    }
}
