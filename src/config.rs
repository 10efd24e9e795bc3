use anyhow::{Context, Result};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_LOGIN_TTL_SECS: i64 = 3600;

/// Runtime settings, read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub db_pool_size: u32,
    pub login_ttl_secs: i64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL not found")?;
        let bind_address =
            lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let db_pool_size = match lookup("DB_POOL_SIZE") {
            Some(size) => size
                .parse::<u32>()
                .with_context(|| format!("DB_POOL_SIZE is not a number: {}", size))?,
            None => DEFAULT_POOL_SIZE,
        };
        let login_ttl_secs = match lookup("LOGIN_TTL_SECS") {
            Some(ttl) => ttl
                .parse::<i64>()
                .with_context(|| format!("LOGIN_TTL_SECS is not a number: {}", ttl))?,
            None => DEFAULT_LOGIN_TTL_SECS,
        };
        if db_pool_size == 0 {
            anyhow::bail!("DB_POOL_SIZE must be at least 1");
        }

        Ok(Self {
            database_url,
            bind_address,
            db_pool_size,
            login_ttl_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let s = settings(&[("DATABASE_URL", "mysql://localhost/estate")]).unwrap();
        assert_eq!(s.database_url, "mysql://localhost/estate");
        assert_eq!(s.bind_address, "127.0.0.1:8080");
        assert_eq!(s.db_pool_size, 10);
        assert_eq!(s.login_ttl_secs, 3600);
    }

    #[test]
    fn database_url_is_required() {
        let err = settings(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn overrides_are_parsed() {
        let s = settings(&[
            ("DATABASE_URL", "mysql://db/estate"),
            ("BIND_ADDRESS", "0.0.0.0:9000"),
            ("DB_POOL_SIZE", "4"),
            ("LOGIN_TTL_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(s.bind_address, "0.0.0.0:9000");
        assert_eq!(s.db_pool_size, 4);
        assert_eq!(s.login_ttl_secs, 60);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(settings(&[("DATABASE_URL", "x"), ("DB_POOL_SIZE", "many")]).is_err());
        assert!(settings(&[("DATABASE_URL", "x"), ("DB_POOL_SIZE", "0")]).is_err());
        assert!(settings(&[("DATABASE_URL", "x"), ("LOGIN_TTL_SECS", "1h")]).is_err());
    }
}
