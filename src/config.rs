//! Configuration management - Collects environment settings once at startup.
//!
//! Every component receives its settings through [`AppConfig`] at
//! construction; nothing reads the environment mid-run. Required fields are
//! validated here, before any store access, so a misconfigured deployment
//! fails immediately.

use std::env;
use std::path::PathBuf;

use mongodb::bson::Bson;
use tracing::warn;

use crate::errors::{Error, Result};

/// Default directory for per-run backup artifacts.
const DEFAULT_BACKUP_DIR: &str = "backups";

/// The two originating financial entities a run is restricted to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityScope {
    /// STOP entity identifier
    pub stop_id: String,
    /// YOYO entity identifier
    pub yoyo_id: String,
}

impl EntityScope {
    /// The scope as a `$in` filter value.
    #[must_use]
    pub fn in_filter(&self) -> Bson {
        Bson::Array(vec![
            Bson::String(self.stop_id.clone()),
            Bson::String(self.yoyo_id.clone()),
        ])
    }
}

/// Transactional-email settings. Optional as a block: when any part is
/// missing the run proceeds without notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailConfig {
    /// Resend API key
    pub api_key: String,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
}

/// Application configuration, loaded once in `main` and passed by reference
/// into every component.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Store connection string
    pub mongodb_uri: String,
    /// Database to operate on
    pub database_name: String,
    /// Financial-entity scope for the arrears and status routines
    pub scope: EntityScope,
    /// Email settings, `None` when notifications are disabled
    pub email: Option<EmailConfig>,
    /// Where per-run backup artifacts are written
    pub backup_dir: PathBuf,
}

/// Loads the configuration from the process environment.
pub fn load() -> Result<AppConfig> {
    from_lookup(|name| env::var(name).ok())
}

/// Builds the configuration from an arbitrary variable source. Empty values
/// count as unset.
fn from_lookup<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
    let require = |name: &str| {
        get(name).ok_or_else(|| Error::Config(format!("{name} is not set")))
    };

    let mongodb_uri = require("MONGODB_URI")?;
    let database_name = require("DATABASE_NAME")?;
    let scope = EntityScope {
        stop_id: require("STOP_ID")?,
        yoyo_id: require("YOYO_ID")?,
    };

    let email = match (get("RESEND_API_KEY"), get("EMAIL_FROM"), get("EMAIL_TO")) {
        (Some(api_key), Some(from), Some(to)) => Some(EmailConfig { api_key, from, to }),
        _ => {
            warn!("email settings incomplete, notifications disabled for this run");
            None
        }
    };

    let backup_dir = get("BACKUP_DIR").unwrap_or_else(|| DEFAULT_BACKUP_DIR.to_owned());

    Ok(AppConfig {
        mongodb_uri,
        database_name,
        scope,
        email,
        backup_dir: PathBuf::from(backup_dir),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn base_vars() -> HashMap<String, String> {
        vars(&[
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("DATABASE_NAME", "middleware"),
            ("STOP_ID", "stop-entity"),
            ("YOYO_ID", "yoyo-entity"),
        ])
    }

    fn load_from(map: &HashMap<String, String>) -> Result<AppConfig> {
        from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn loads_required_settings() {
        let config = load_from(&base_vars()).unwrap();
        assert_eq!(config.database_name, "middleware");
        assert_eq!(config.scope.stop_id, "stop-entity");
        assert!(config.email.is_none());
        assert_eq!(config.backup_dir, PathBuf::from("backups"));
    }

    #[test]
    fn missing_scope_id_is_fatal() {
        let mut map = base_vars();
        map.remove("YOYO_ID");
        let err = load_from(&map).unwrap_err();
        assert!(matches!(err, Error::Config(message) if message.contains("YOYO_ID")));
    }

    #[test]
    fn empty_value_counts_as_unset() {
        let mut map = base_vars();
        map.insert("STOP_ID".to_owned(), String::new());
        assert!(load_from(&map).is_err());
    }

    #[test]
    fn complete_email_block_enables_notifications() {
        let mut map = base_vars();
        map.insert("RESEND_API_KEY".to_owned(), "re_123".to_owned());
        map.insert("EMAIL_FROM".to_owned(), "ops@example.com".to_owned());
        map.insert("EMAIL_TO".to_owned(), "team@example.com".to_owned());
        let config = load_from(&map).unwrap();
        let email = config.email.unwrap();
        assert_eq!(email.from, "ops@example.com");
    }

    #[test]
    fn partial_email_block_disables_notifications() {
        let mut map = base_vars();
        map.insert("RESEND_API_KEY".to_owned(), "re_123".to_owned());
        let config = load_from(&map).unwrap();
        assert!(config.email.is_none());
    }

    #[test]
    fn scope_in_filter_lists_both_entities() {
        let config = load_from(&base_vars()).unwrap();
        let filter = config.scope.in_filter();
        assert_eq!(
            filter,
            Bson::Array(vec![
                Bson::String("stop-entity".to_owned()),
                Bson::String("yoyo-entity".to_owned()),
            ])
        );
    }
}
