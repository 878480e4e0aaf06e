//! Configuration resolved once at run start.
//!
//! Raw values come from the command line / environment as [`Options`];
//! [`Settings::resolve`] turns them into the immutable run configuration,
//! consulting the optional TOML config file for target aliases.
//!
//! ```toml
//! [tesults]
//! nightly = "eyJ0eXAiOiJKV1QiLCJhbGc..."
//! smoke = "eyJ0eXAiOiJKV1QiLCJhbGc..."
//! ```
//!
//! With the file above, `--tesults-target nightly` uploads with the nightly
//! token; any other value is used verbatim as the token.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{ReportError, ReportResult};
use crate::model::CaseResult;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tesults.toml";

/// Whether a test without an explicit suite gets one from its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuitePolicy {
    ExplicitOnly,
    #[default]
    DeriveFromModule,
}

/// Synthetic case describing the build as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    pub name: String,
    pub result: CaseResult,
    pub description: Option<String>,
    pub reason: Option<String>,
}

/// Unresolved option values as supplied by the user.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub target: Option<String>,
    pub files: Option<PathBuf>,
    pub nosuites: bool,
    pub build_name: Option<String>,
    pub build_result: Option<String>,
    pub build_description: Option<String>,
    pub build_reason: Option<String>,
    pub save_output: bool,
}

/// Resolved, immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub enabled: bool,
    pub target: String,
    pub suite_policy: SuitePolicy,
    pub attachment_root: Option<PathBuf>,
    pub build: Option<BuildRecord>,
    pub save_output: bool,
}

impl Settings {
    /// Settings for a run that records and uploads nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            target: String::new(),
            suite_policy: SuitePolicy::default(),
            attachment_root: None,
            build: None,
            save_output: false,
        }
    }

    /// Enabled settings for `target` with every optional feature off.
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            enabled: true,
            target: target.into(),
            ..Self::disabled()
        }
    }

    /// Resolve raw options, reading target aliases from `config_file`.
    ///
    /// Never fails: a broken config file is logged and the supplied target
    /// is used verbatim.
    pub fn resolve(options: Options, config_file: Option<&Path>) -> Self {
        let Some(supplied) = options.target.filter(|t| !t.is_empty()) else {
            info!("no tesults target supplied, reporting disabled");
            return Self::disabled();
        };

        let aliases = match config_file {
            Some(path) => match TargetAliases::load(path) {
                Ok(aliases) => aliases,
                Err(e) => {
                    warn!(error = %e, "ignoring tesults config file");
                    TargetAliases::default()
                }
            },
            None => TargetAliases::default(),
        };
        let target = aliases.resolve(&supplied);

        let build = options.build_name.filter(|n| !n.is_empty()).map(|name| {
            BuildRecord {
                name,
                result: options
                    .build_result
                    .as_deref()
                    .map(CaseResult::coerce)
                    .unwrap_or_default(),
                description: options.build_description.filter(|d| !d.is_empty()),
                reason: options.build_reason.filter(|r| !r.is_empty()),
            }
        });

        Self {
            enabled: true,
            target,
            suite_policy: if options.nosuites {
                SuitePolicy::ExplicitOnly
            } else {
                SuitePolicy::DeriveFromModule
            },
            attachment_root: options.files,
            build,
            save_output: options.save_output,
        }
    }

    pub fn with_attachment_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.attachment_root = Some(root.into());
        self
    }

    pub fn with_suite_policy(mut self, policy: SuitePolicy) -> Self {
        self.suite_policy = policy;
        self
    }

    pub fn with_build(mut self, build: BuildRecord) -> Self {
        self.build = Some(build);
        self
    }

    pub fn with_save_output(mut self, save: bool) -> Self {
        self.save_output = save;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    tesults: BTreeMap<String, String>,
}

/// `[tesults]` table of the config file: alias -> credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetAliases {
    entries: BTreeMap<String, String>,
}

impl TargetAliases {
    pub fn load(path: &Path) -> ReportResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        Self::parse(&text).map_err(|e| match e {
            ReportError::Config { message } => ReportError::Config {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    pub fn parse(text: &str) -> ReportResult<Self> {
        let file: ConfigFile = toml::from_str(text).map_err(|e| ReportError::Config {
            message: e.to_string(),
        })?;
        Ok(Self {
            entries: file.tesults,
        })
    }

    /// The credential stored under `supplied`, or `supplied` itself.
    pub fn resolve(&self, supplied: &str) -> String {
        match self.entries.get(supplied) {
            Some(token) => {
                debug!(alias = supplied, "resolved tesults target from config file");
                token.clone()
            }
            None => {
                if !self.entries.is_empty() {
                    info!(
                        alias = supplied,
                        "no config entry for target, using the supplied value as the token"
                    );
                }
                supplied.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(target: &str) -> Options {
        Options {
            target: Some(target.to_string()),
            ..Options::default()
        }
    }

    #[test]
    fn missing_target_disables_everything() {
        let settings = Settings::resolve(Options::default(), None);
        assert!(!settings.enabled);
        assert!(settings.build.is_none());

        let settings = Settings::resolve(options(""), None);
        assert!(!settings.enabled);
    }

    #[test]
    fn target_alias_is_resolved_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tesults.toml");
        std::fs::write(&path, "[tesults]\nnightly = \"token-123\"\n").unwrap();

        let settings = Settings::resolve(options("nightly"), Some(&path));
        assert_eq!(settings.target, "token-123");

        let settings = Settings::resolve(options("raw-token"), Some(&path));
        assert_eq!(settings.target, "raw-token");
    }

    #[test]
    fn broken_config_falls_back_to_supplied_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tesults.toml");
        std::fs::write(&path, "[tesults\nnot toml").unwrap();

        let settings = Settings::resolve(options("raw"), Some(&path));
        assert!(settings.enabled);
        assert_eq!(settings.target, "raw");

        let missing = dir.path().join("absent.toml");
        let settings = Settings::resolve(options("raw"), Some(&missing));
        assert_eq!(settings.target, "raw");
    }

    #[test]
    fn config_without_tesults_table_is_empty() {
        let aliases = TargetAliases::parse("[other]\nkey = \"v\"\n").unwrap();
        assert_eq!(aliases.resolve("key"), "key");
    }

    #[test]
    fn build_record_fields_and_result_coercion() {
        let settings = Settings::resolve(
            Options {
                build_name: Some("1.4.2".into()),
                build_result: Some("success".into()),
                build_description: Some("nightly".into()),
                build_reason: Some(String::new()),
                ..options("t")
            },
            None,
        );
        let build = settings.build.unwrap();
        assert_eq!(build.name, "1.4.2");
        assert_eq!(build.result, CaseResult::Unknown);
        assert_eq!(build.description.as_deref(), Some("nightly"));
        assert_eq!(build.reason, None);
    }

    #[test]
    fn nosuites_selects_explicit_only() {
        let settings = Settings::resolve(
            Options {
                nosuites: true,
                ..options("t")
            },
            None,
        );
        assert_eq!(settings.suite_policy, SuitePolicy::ExplicitOnly);
        assert_eq!(
            Settings::resolve(options("t"), None).suite_policy,
            SuitePolicy::DeriveFromModule
        );
    }
}
