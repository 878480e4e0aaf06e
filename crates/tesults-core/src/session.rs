//! Per-run session state: settings, in-flight starts and finalized cases.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::config::Settings;
use crate::model::TestCase;

/// Current wall-clock time in ms since the epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// State of one test run.
///
/// Created when the run starts and dropped once the report is submitted;
/// nothing survives across runs.
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    in_flight: HashMap<String, i64>,
    finalized: HashSet<String>,
    cases: Vec<TestCase>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            in_flight: HashMap::new(),
            finalized: HashSet::new(),
            cases: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Finalized cases in finalization order.
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Mark `test_id` as started now. No-op when disabled or when the test
    /// was already finalized in this run.
    pub fn begin(&mut self, test_id: &str) {
        self.begin_at(test_id, now_ms());
    }

    pub fn begin_at(&mut self, test_id: &str, start_ms: i64) {
        if !self.settings.enabled {
            return;
        }
        if self.finalized.contains(test_id) {
            debug!(test_id, "test already finalized in this run, start ignored");
            return;
        }
        trace!(test_id, start_ms, "test started");
        self.in_flight.insert(test_id.to_string(), start_ms);
    }

    /// Whether `test_id` has started and not yet been finalized.
    pub fn is_in_flight(&self, test_id: &str) -> bool {
        self.in_flight.contains_key(test_id)
    }

    /// Finalize `test_id` with the end time taken now.
    ///
    /// Returns `false` without recording anything if the test was never
    /// started (or was already finalized).
    pub fn finalize(&mut self, test_id: &str, case: TestCase) -> bool {
        self.finalize_at(test_id, case, now_ms())
    }

    pub fn finalize_at(&mut self, test_id: &str, mut case: TestCase, end_ms: i64) -> bool {
        let Some(start) = self.in_flight.remove(test_id) else {
            debug!(test_id, "finalize without matching start, ignored");
            return false;
        };
        self.finalized.insert(test_id.to_string());
        case.start = Some(start);
        case.end = Some(end_ms.max(start));
        trace!(test_id, result = %case.result, "test finalized");
        self.cases.push(case);
        true
    }

    /// Hand the finalized cases over for assembly.
    pub fn into_cases(self) -> (Settings, Vec<TestCase>) {
        (self.settings, self.cases)
    }
}
