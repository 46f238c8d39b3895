use crate::error::{LifecycleError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Fixed defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_CONFIG_PATH: &str = "/etc/picostack/lifecycle.yaml";
pub const DEFAULT_BINARY: &str = "/usr/local/bin/picostk";
pub const DEFAULT_USER: &str = "picostack";
pub const DEFAULT_GROUP: &str = "picostack";
pub const DEFAULT_LOCK_FILE: &str = "/var/lock/subsys/picostack";
pub const DEFAULT_SUDO: &str = "sudo";

// ---------------------------------------------------------------------------
// ConfigWarning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Deescalation
// ---------------------------------------------------------------------------

/// How control calls are switched to the service identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deescalation {
    /// `sudo -g <group> -u <user> <binary> ...`
    #[default]
    Sudo,
    /// Run the binary directly under the current identity.
    None,
}

impl Deescalation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Deescalation::Sudo => "sudo",
            Deescalation::None => "none",
        }
    }
}

impl fmt::Display for Deescalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Deescalation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sudo" => Ok(Deescalation::Sudo),
            "none" => Ok(Deescalation::None),
            other => Err(format!(
                "unknown deescalation '{other}'; expected 'sudo' or 'none'"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// LifecycleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default = "default_lock_file")]
    pub lock_file: PathBuf,
    #[serde(default)]
    pub deescalation: Deescalation,
    #[serde(default = "default_sudo")]
    pub sudo_path: PathBuf,
    /// Propagate control call failures to the exit code.
    #[serde(default)]
    pub strict: bool,
}

fn default_binary() -> PathBuf {
    PathBuf::from(DEFAULT_BINARY)
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

fn default_lock_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOCK_FILE)
}

fn default_sudo() -> PathBuf {
    PathBuf::from(DEFAULT_SUDO)
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            user: default_user(),
            group: default_group(),
            lock_file: default_lock_file(),
            deescalation: Deescalation::default(),
            sudo_path: default_sudo(),
            strict: false,
        }
    }
}

impl LifecycleConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the well-known location is
    /// read if present, otherwise the built-in defaults are returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(LifecycleError::ConfigNotFound(path.to_path_buf()));
                }
                Self::load_from(path)
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    tracing::debug!("no config at {DEFAULT_CONFIG_PATH}, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        // An empty file is a valid "all defaults" config.
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg = serde_yaml::from_str(&data).map_err(|source| LifecycleError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.deescalation == Deescalation::Sudo {
            if self.user.trim().is_empty() {
                warnings.push(ConfigWarning {
                    message: "user is empty; sudo will run as root".to_string(),
                });
            }
            if self.group.trim().is_empty() {
                warnings.push(ConfigWarning {
                    message: "group is empty; sudo will keep the target user's group"
                        .to_string(),
                });
            }
        }

        if self.binary.is_relative() {
            warnings.push(ConfigWarning {
                message: format!(
                    "binary '{}' is relative and will be resolved through PATH",
                    self.binary.display()
                ),
            });
        }

        if self.lock_file.file_name().is_none() {
            warnings.push(ConfigWarning {
                message: format!(
                    "lock_file '{}' does not name a file",
                    self.lock_file.display()
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_fixed_constants() {
        let cfg = LifecycleConfig::default();
        assert_eq!(cfg.binary, PathBuf::from("/usr/local/bin/picostk"));
        assert_eq!(cfg.user, "picostack");
        assert_eq!(cfg.group, "picostack");
        assert_eq!(cfg.deescalation, Deescalation::Sudo);
        assert!(!cfg.strict);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        std::fs::write(&path, "user: vmops\nstrict: true\n").unwrap();

        let cfg = LifecycleConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.user, "vmops");
        assert!(cfg.strict);
        assert_eq!(cfg.group, "picostack");
        assert_eq!(cfg.lock_file, PathBuf::from(DEFAULT_LOCK_FILE));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(
            LifecycleConfig::load(Some(&path)).unwrap(),
            LifecycleConfig::default()
        );
    }

    #[test]
    fn deescalation_yaml_is_snake_case() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        std::fs::write(&path, "deescalation: none\n").unwrap();
        let cfg = LifecycleConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.deescalation, Deescalation::None);
    }

    #[test]
    fn missing_explicit_config_is_error() {
        let dir = TempDir::new().unwrap();
        let err = LifecycleConfig::load(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, LifecycleError::ConfigNotFound(_)));
    }

    #[test]
    fn malformed_yaml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        std::fs::write(&path, "strict: [not, a, bool]\n").unwrap();
        let err = LifecycleConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidConfig { .. }));
    }

    #[test]
    fn deescalation_from_str() {
        assert_eq!("sudo".parse::<Deescalation>().unwrap(), Deescalation::Sudo);
        assert_eq!("none".parse::<Deescalation>().unwrap(), Deescalation::None);
        assert!("su".parse::<Deescalation>().is_err());
    }

    #[test]
    fn validate_flags_suspicious_values() {
        let cfg = LifecycleConfig {
            binary: PathBuf::from("picostk"),
            user: String::new(),
            lock_file: PathBuf::from("/"),
            ..LifecycleConfig::default()
        };
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.message.contains("user is empty")));
        assert!(warnings.iter().any(|w| w.message.contains("relative")));
        assert!(warnings.iter().any(|w| w.message.contains("does not name a file")));
    }

    #[test]
    fn empty_user_is_fine_without_sudo() {
        let cfg = LifecycleConfig {
            user: String::new(),
            group: String::new(),
            deescalation: Deescalation::None,
            ..LifecycleConfig::default()
        };
        assert!(cfg.validate().is_empty());
    }
}
