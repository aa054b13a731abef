use anyhow::{anyhow, Result};
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{debug, info};

use crate::search::PAGE_SIZE;

pub const API_URL_KEY: &str = "ESTATE_API_URL";
pub const PAGE_SIZE_KEY: &str = "ESTATE_PAGE_SIZE";
pub const TIMEOUT_KEY: &str = "ESTATE_TIMEOUT_SECS";
pub const SESSION_PATH_KEY: &str = "ESTATE_SESSION_PATH";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub page_size: usize,
    pub timeout: Duration,
    pub session_path: PathBuf,
}

impl Config {
    /// Read settings from the environment
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let page_size: usize = try_load(&lookup, PAGE_SIZE_KEY, &PAGE_SIZE.to_string())?;
        if page_size == 0 {
            return Err(anyhow!("Invalid {PAGE_SIZE_KEY} value: must be at least 1"));
        }

        Ok(Self {
            api_url: try_load(&lookup, API_URL_KEY, "http://localhost:3000")?,
            page_size,
            timeout: Duration::from_secs(try_load(&lookup, TIMEOUT_KEY, "30")?),
            session_path: try_load(&lookup, SESSION_PATH_KEY, ".estate-session.json")?,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    debug!("{key}={raw}");
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value {raw:?}: {e}"))
}

#[cfg(test)]
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
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.page_size, 8);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.session_path, PathBuf::from(".estate-session.json"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (API_URL_KEY, "https://homes.example.com"),
            (PAGE_SIZE_KEY, " 12 "),
            (TIMEOUT_KEY, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://homes.example.com");
        assert_eq!(config.page_size, 12);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values_name_the_key() {
        let err = Config::from_lookup(lookup(&[(TIMEOUT_KEY, "soon")])).unwrap_err();
        assert!(err.to_string().contains(TIMEOUT_KEY));

        let err = Config::from_lookup(lookup(&[(PAGE_SIZE_KEY, "0")])).unwrap_err();
        assert!(err.to_string().contains(PAGE_SIZE_KEY));
    }
}
