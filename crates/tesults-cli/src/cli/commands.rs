use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tesults_core::config::DEFAULT_CONFIG_FILE;
use tesults_core::{report, ClientConfig, FsLister, Session, Settings, TesultsClient, UploadOutcome};
use tracing::{info, warn};

use super::args::{Cli, Command, UploadArgs};
use crate::exit_codes::{EXIT_SUCCESS, TESTS_FAILED, UPLOAD_FAILED};
use crate::libtest::Ingest;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Upload(args) => upload(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(EXIT_SUCCESS)
        }
    }
}

async fn upload(args: UploadArgs) -> anyhow::Result<i32> {
    let config_file = config_file(args.config.as_deref());
    let settings = Settings::resolve(args.tesults.to_options(), config_file.as_deref());

    let reader = open_input(args.input.as_deref())?;
    let mut ingest = Ingest::new(Session::new(settings), &FsLister);
    for line in reader.lines() {
        let line = line.context("failed to read test output")?;
        ingest.line(&line);
    }
    let (session, stats) = ingest.finish_run();
    info!(
        passed = stats.passed,
        failed = stats.failed,
        ignored = stats.ignored,
        skipped_lines = stats.skipped_lines,
        recorded = session.cases().len(),
        "test output processed"
    );
    let run_code = if stats.failed > 0 { TESTS_FAILED } else { EXIT_SUCCESS };

    let Some(payload) = report::assemble(session, &FsLister) else {
        print_outcome(&UploadOutcome::NoResults);
        return Ok(run_code);
    };

    if let Some(out) = &args.output {
        match report::write_payload(&payload, out) {
            Ok(()) => info!(path = %out.display(), "payload written"),
            Err(e) => warn!(path = %out.display(), error = %e, "failed to write payload"),
        }
    }
    if args.dry_run {
        info!(cases = payload.results.cases.len(), "dry run, not submitting");
        return Ok(run_code);
    }

    let client = TesultsClient::new(ClientConfig::default().with_url(&args.url))?;
    let outcome = match report::submit(&payload, &client).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Tesults upload failed: {e}");
            return Ok(reporting_failed(args.strict, run_code));
        }
    };
    print_outcome(&outcome);
    if outcome.is_success() {
        Ok(run_code)
    } else {
        Ok(reporting_failed(args.strict, run_code))
    }
}

/// A reporting failure only overrides the run status under `--strict`.
fn reporting_failed(strict: bool, run_code: i32) -> i32 {
    if strict {
        UPLOAD_FAILED
    } else {
        run_code
    }
}

fn print_outcome(outcome: &UploadOutcome) {
    for line in outcome.lines() {
        println!("{line}");
    }
}

/// Explicit `--config`, else `./tesults.toml` when it exists.
fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

fn open_input(input: Option<&Path>) -> anyhow::Result<Box<dyn BufRead>> {
    let reader: Box<dyn Read> = match input {
        None => Box::new(std::io::stdin()),
        Some(path) if path == Path::new("-") => Box::new(std::io::stdin()),
        Some(path) => Box::new(
            std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
    };
    Ok(Box::new(BufReader::new(reader)))
}
