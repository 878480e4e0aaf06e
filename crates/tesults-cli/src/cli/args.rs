use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tesults_core::Options;

#[derive(Parser)]
#[command(
    name = "tesults",
    version,
    about = "Upload cargo test results to Tesults"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read a libtest JSON event stream and upload the results
    Upload(UploadArgs),
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct TesultsArgs {
    /// Tesults target token, or an alias from the [tesults] table of the config file.
    /// Reporting is disabled without it.
    #[arg(long = "tesults-target", env = "TESULTS_TARGET")]
    pub target: Option<String>,

    /// Root directory of per-case attachment folders (<files>/<suite>/<name>/)
    #[arg(long = "tesults-files", env = "TESULTS_FILES")]
    pub files: Option<PathBuf>,

    /// Do not use the module path as suite for tests without an explicit suite
    #[arg(long = "tesults-nosuites")]
    pub nosuites: bool,

    #[arg(long = "tesults-build-name")]
    pub build_name: Option<String>,

    /// One of pass, fail, unknown
    #[arg(long = "tesults-build-result", default_value = "unknown")]
    pub build_result: String,

    #[arg(long = "tesults-build-description")]
    pub build_description: Option<String>,

    /// Build failure reason
    #[arg(long = "tesults-build-reason")]
    pub build_reason: Option<String>,

    /// Save captured test output as an output.log attachment (needs --tesults-files)
    #[arg(long = "tesults-save-output")]
    pub save_output: bool,
}

impl TesultsArgs {
    pub fn to_options(&self) -> Options {
        Options {
            target: self.target.clone(),
            files: self.files.clone(),
            nosuites: self.nosuites,
            build_name: self.build_name.clone(),
            build_result: Some(self.build_result.clone()),
            build_description: self.build_description.clone(),
            build_reason: self.build_reason.clone(),
            save_output: self.save_output,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct UploadArgs {
    /// libtest JSON output (`cargo test -- -Z unstable-options --format json --report-time`);
    /// `-` or absent reads stdin
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub tesults: TesultsArgs,

    /// TOML config file holding target aliases (defaults to ./tesults.toml when present)
    #[arg(long, env = "TESULTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Results service base URL
    #[arg(long = "tesults-url", env = "TESULTS_URL", default_value = tesults_core::client::DEFAULT_URL)]
    pub url: String,

    /// Also write the payload JSON to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Build the payload but do not submit it
    #[arg(long)]
    pub dry_run: bool,

    /// Exit non-zero when the upload is rejected or fails
    #[arg(long)]
    pub strict: bool,
}
