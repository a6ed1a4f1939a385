use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

const PREFIX: &str = "MARKETING_ADMIN_";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    Mongo,
    Memory,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Backend, ()> {
        match s {
            "mongo" => Ok(Backend::Mongo),
            "memory" => Ok(Backend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub mongodb_uri: String,
    pub database_name: String,
    pub bind_address: String,
    pub backend: Backend,
    pub storage_path: PathBuf,
    pub seed_defaults: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database_name: "marketing_admin".to_string(),
            bind_address: "127.0.0.1:8080".to_string(),
            backend: Backend::Mongo,
            storage_path: default_storage_path(),
            seed_defaults: true,
            bootstrap_admin: None,
        }
    }
}

impl Config {
    /// Reads `MARKETING_ADMIN_*` variables, after loading a `.env` file from
    /// the working directory if there is one.
    pub fn from_env() -> Result<Config, Error> {
        let _ = dotenvy::dotenv();

        Config::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", PREFIX, name));
        let defaults = Config::default();

        let backend = match var("BACKEND") {
            Some(value) => value
                .parse()
                .map_err(|_| invalid("BACKEND", &value))?,
            None => defaults.backend,
        };

        let seed_defaults = match var("SEED") {
            Some(value) => parse_flag(&value).ok_or_else(|| invalid("SEED", &value))?,
            None => defaults.seed_defaults,
        };

        let bootstrap_admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            (Some(_), None) => return Err(invalid("ADMIN_PASSWORD", "")),
            (None, Some(_)) => return Err(invalid("ADMIN_EMAIL", "")),
        };

        Ok(Config {
            mongodb_uri: var("MONGODB_URI").unwrap_or(defaults.mongodb_uri),
            database_name: var("DATABASE").unwrap_or(defaults.database_name),
            bind_address: var("BIND").unwrap_or(defaults.bind_address),
            backend,
            storage_path: var("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            seed_defaults,
            bootstrap_admin,
        })
    }
}

fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marketing_admin")
        .join("storage.json")
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn invalid(name: &str, value: &str) -> Error {
    Error::InvalidConfig {
        name: format!("{}{}", PREFIX, name),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_without_variables() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, Config::default());
        assert!(config.storage_path.ends_with("marketing_admin/storage.json"));
    }

    #[test]
    fn variables_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("MARKETING_ADMIN_BACKEND", "memory"),
            ("MARKETING_ADMIN_SEED", "false"),
            ("MARKETING_ADMIN_BIND", "0.0.0.0:9000"),
            ("MARKETING_ADMIN_ADMIN_EMAIL", "admin@example.com"),
            ("MARKETING_ADMIN_ADMIN_PASSWORD", "secret123"),
        ]))
        .unwrap();

        assert_eq!(config.backend, Backend::Memory);
        assert!(!config.seed_defaults);
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(
            config.bootstrap_admin,
            Some(BootstrapAdmin {
                email: "admin@example.com".into(),
                password: "secret123".into(),
            })
        );
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let result = Config::from_lookup(lookup(&[("MARKETING_ADMIN_BACKEND", "sqlite")]));

        assert_eq!(
            result.unwrap_err(),
            Error::InvalidConfig {
                name: "MARKETING_ADMIN_BACKEND".into(),
                value: "sqlite".into(),
            }
        );
    }
}
