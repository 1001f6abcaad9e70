// src/config.rs - Dispatcher configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Notification dispatch configuration, loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bound of the SMS gateway job queue
    #[serde(default = "default_sms_queue_depth")]
    pub sms_queue_depth: usize,

    /// Transliterate SMS text to the constrained gateway character set
    #[serde(default = "default_sms_transliterate")]
    pub sms_transliterate: bool,

    /// Subject line of alarm e-mails
    #[serde(default = "default_mail_subject")]
    pub mail_subject: String,
}

fn default_sms_queue_depth() -> usize {
    32
}

fn default_sms_transliterate() -> bool {
    true
}

fn default_mail_subject() -> String {
    "Alarm notification".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sms_queue_depth: default_sms_queue_depth(),
            sms_transliterate: default_sms_transliterate(),
            mail_subject: default_mail_subject(),
        }
    }
}

impl Config {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }
}
