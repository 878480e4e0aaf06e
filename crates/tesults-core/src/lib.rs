//! Test-case aggregation and upload to Tesults.
//!
//! A host runner drives one [`Session`] per run:
//!
//! - [`Recorder::start`] when a test is set up,
//! - [`Recorder::finish`] once its body has run, which enriches the runner's
//!   result with suite, params, description, custom tags and attachments,
//! - [`report::upload`] at run end, which appends the optional build case
//!   and submits everything in a single request.
//!
//! # Quick Start
//!
//! ```no_run
//! use tesults_core::{
//!     report, CallReport, ClientConfig, FsLister, Recorder, Session, Settings, TesultsClient,
//!     TestItem,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut session = Session::new(Settings::for_target("token"));
//! let recorder = Recorder::new(&FsLister);
//!
//! let item = TestItem::new("tests/test_login.py::test_ok", "test_ok")
//!     .with_module("tests/test_login.py");
//! recorder.start(&mut session, &item);
//! recorder.finish(&mut session, &item, &CallReport::passed());
//!
//! let client = TesultsClient::new(ClientConfig::default())?;
//! let outcome = report::upload(session, &FsLister, &client).await?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```
//!
//! Reporting never fails the run it reports on: every enrichment step is
//! best-effort and a disabled session (no target) records nothing.

pub mod attachments;
pub mod client;
pub mod config;
pub mod error;
pub mod marks;
pub mod model;
pub mod recorder;
pub mod report;
pub mod session;

pub use attachments::{FileLister, FsLister};
pub use client::{ClientConfig, ResultsSink, TesultsClient};
pub use config::{BuildRecord, Options, Settings, SuitePolicy, TargetAliases};
pub use error::{ReportError, ReportResult};
pub use marks::{Mark, Marks};
pub use model::{CaseResult, Metadata, Report, Results, SubmitStatus, TestCase};
pub use recorder::{CallReport, Recorder, TestItem};
pub use report::UploadOutcome;
pub use session::Session;
