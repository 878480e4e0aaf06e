//! Adapter for the libtest JSON event stream.
//!
//! Each line is one event. `cargo test` runs several test binaries in a row,
//! each starting with a `suite` `started` event, so test ids are qualified by
//! the binary's position in the stream.
//!
//! libtest carries no test metadata, so items are built without marks: the
//! case suite comes from the module path, and explicit suites, params,
//! descriptions and custom tags are only available to runners that drive
//! the `Recorder` with their own `Marks`.

use serde::Deserialize;
use tesults_core::session::now_ms;
use tesults_core::{CallReport, FileLister, Recorder, Session, TestItem};
use tracing::{debug, trace};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Event {
    Suite(SuiteEvent),
    Test(TestEvent),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct SuiteEvent {
    event: String,
}

#[derive(Debug, Deserialize)]
struct TestEvent {
    event: String,
    name: String,
    #[serde(default)]
    exec_time: Option<f64>,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Counters for the end-of-run log line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub passed: usize,
    pub failed: usize,
    pub ignored: usize,
    pub skipped_lines: usize,
}

/// Feeds libtest events into a session.
pub struct Ingest<'a> {
    recorder: Recorder<'a>,
    session: Session,
    binary: usize,
    stats: IngestStats,
}

impl<'a> Ingest<'a> {
    pub fn new(session: Session, lister: &'a dyn FileLister) -> Self {
        Self {
            recorder: Recorder::new(lister),
            session,
            binary: 0,
            stats: IngestStats::default(),
        }
    }

    /// Process one line of output. Anything that is not an event is skipped.
    pub fn line(&mut self, line: &str) {
        let line = line.trim();
        if !line.starts_with('{') {
            self.stats.skipped_lines += 1;
            return;
        }
        let event: Event = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "skipping unparseable line");
                self.stats.skipped_lines += 1;
                return;
            }
        };
        match event {
            Event::Suite(suite) if suite.event == "started" => self.binary += 1,
            Event::Suite(_) | Event::Other => {}
            Event::Test(test) => self.test_event(test),
        }
    }

    fn test_event(&mut self, test: TestEvent) {
        let item = self.item(&test.name);
        match test.event.as_str() {
            "started" => self.recorder.start(&mut self.session, &item),
            "ok" => {
                self.stats.passed += 1;
                let mut report = CallReport::passed();
                report.output = test.stdout.clone();
                self.finish(&item, &report, test.exec_time);
            }
            "failed" => {
                self.stats.failed += 1;
                let report = CallReport {
                    outcome: "failed".to_string(),
                    failure: failure_text(&test),
                    output: test.stdout.clone(),
                };
                self.finish(&item, &report, test.exec_time);
            }
            "ignored" => {
                self.stats.ignored += 1;
                // Ignored tests are not always announced as started.
                if !self.session.is_in_flight(&item.id) {
                    self.recorder.start(&mut self.session, &item);
                }
                let mut report = CallReport::with_outcome("skipped");
                report.failure = test.message.clone();
                self.finish(&item, &report, None);
            }
            other => trace!(event = other, name = %test.name, "ignoring test event"),
        }
    }

    fn finish(&mut self, item: &TestItem, report: &CallReport, exec_time: Option<f64>) {
        let end = now_ms();
        if let Some(secs) = exec_time {
            if self.session.is_in_flight(&item.id) {
                let elapsed = (secs.max(0.0) * 1000.0).round() as i64;
                self.session.begin_at(&item.id, end.saturating_sub(elapsed));
            }
        }
        self.recorder.finish_at(&mut self.session, item, report, end);
    }

    fn item(&self, full_name: &str) -> TestItem {
        let (module, name) = split_test_path(full_name);
        let item = TestItem::new(format!("{}/{}", self.binary, full_name), name);
        match module {
            Some(module) => item.with_module(module),
            None => item,
        }
    }

    pub fn finish_run(self) -> (Session, IngestStats) {
        if self.session.in_flight_len() > 0 {
            debug!(
                count = self.session.in_flight_len(),
                "tests started but never finished"
            );
        }
        (self.session, self.stats)
    }
}

/// `parser::tests::parses_empty` -> (`parser::tests`, `parses_empty`).
pub fn split_test_path(full_name: &str) -> (Option<&str>, &str) {
    match full_name.rsplit_once("::") {
        Some((module, name)) => (Some(module), name),
        None => (None, full_name),
    }
}

fn failure_text(test: &TestEvent) -> Option<String> {
    let parts: Vec<&str> = [test.stdout.as_deref(), test.message.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim_end)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
