//! Turns one completed test into a [`TestCase`].
//!
//! Every enrichment step is best-effort: if the runner hands us something we
//! cannot interpret, the corresponding field is left out and the run goes on.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::attachments::{self, FileLister};
use crate::config::{Settings, SuitePolicy};
use crate::marks::{self, Marks};
use crate::model::{CaseResult, TestCase};
use crate::session::{now_ms, Session};

/// A test as declared by the runner.
#[derive(Debug, Clone, Default)]
pub struct TestItem {
    /// Run-unique identifier.
    pub id: String,
    /// Generated name, including any `[param-values]` suffix.
    pub name: String,
    /// Path of the containing module, e.g. `tests/test_login.py`.
    pub module: Option<String>,
    pub marks: Marks,
}

impl TestItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            module: None,
            marks: Marks::new(),
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_mark(mut self, name: impl Into<String>, mark: marks::Mark) -> Self {
        self.marks.insert(name.into(), mark);
        self
    }
}

/// Result of the test body as reported by the runner.
#[derive(Debug, Clone, Default)]
pub struct CallReport {
    /// Runner outcome: `passed`, `failed`, `skipped`, ...
    pub outcome: String,
    /// Rendered failure text.
    pub failure: Option<String>,
    /// Captured output of the test.
    pub output: Option<String>,
}

impl CallReport {
    pub fn passed() -> Self {
        Self {
            outcome: "passed".to_string(),
            ..Self::default()
        }
    }

    pub fn failed(failure: impl Into<String>) -> Self {
        Self {
            outcome: "failed".to_string(),
            failure: Some(failure.into()),
            output: None,
        }
    }

    pub fn with_outcome(outcome: impl Into<String>) -> Self {
        Self {
            outcome: outcome.into(),
            ..Self::default()
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// Drives the session for each test lifecycle.
pub struct Recorder<'a> {
    lister: &'a dyn FileLister,
}

impl<'a> Recorder<'a> {
    pub fn new(lister: &'a dyn FileLister) -> Self {
        Self { lister }
    }

    /// Setup phase: remember when the test started.
    pub fn start(&self, session: &mut Session, item: &TestItem) {
        session.begin(&item.id);
    }

    /// Call phase finished: build the case and finalize it now.
    pub fn finish(&self, session: &mut Session, item: &TestItem, report: &CallReport) -> bool {
        self.finish_at(session, item, report, now_ms())
    }

    pub fn finish_at(
        &self,
        session: &mut Session,
        item: &TestItem,
        report: &CallReport,
        end_ms: i64,
    ) -> bool {
        if !session.is_in_flight(&item.id) {
            debug!(test_id = %item.id, "no in-flight entry, not recording");
            return false;
        }
        let case = self.build_case(session.settings(), item, report);
        session.finalize_at(&item.id, case, end_ms)
    }

    /// Enrich the runner's result into a case (timing is added by the session).
    pub fn build_case(&self, settings: &Settings, item: &TestItem, report: &CallReport) -> TestCase {
        let result = CaseResult::from_outcome(&report.outcome);
        let mut case = TestCase::new(item.name.clone(), result);
        case.reason = Some(failure_reason(result, report));
        case.suite = resolve_suite(item, settings.suite_policy);

        if let Some((params, base_name)) = extract_params(&item.name, &item.marks) {
            case.params = Some(params);
            case.name = base_name;
        }

        case.desc = description(&item.marks);

        let root = settings.attachment_root.as_deref();
        if settings.save_output {
            if let (Some(root), Some(output)) = (root, report.output.as_deref()) {
                if !output.is_empty() {
                    if let Err(e) =
                        attachments::save_output(root, case.suite.as_deref(), &item.name, output)
                    {
                        warn!(test_id = %item.id, error = %e, "could not save captured output");
                    }
                }
            }
        }
        // Attachment folders are keyed by the generated name so every
        // parametrized variant gets its own.
        case.files = attachments::discover(self.lister, root, case.suite.as_deref(), &item.name);

        case.custom = marks::custom_tags(&item.marks);
        case
    }
}

/// Empty for passing tests; the failure text (or at least the outcome) otherwise.
pub fn failure_reason(result: CaseResult, report: &CallReport) -> String {
    if result == CaseResult::Pass {
        return String::new();
    }
    match report.failure.as_deref() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ if !report.outcome.is_empty() => report.outcome.clone(),
        _ => CaseResult::Unknown.to_string(),
    }
}

/// Explicit `suite` mark, else (when allowed) the module's file stem.
pub fn resolve_suite(item: &TestItem, policy: SuitePolicy) -> Option<String> {
    if let Some(suite) = item.marks.get("suite").and_then(|m| m.first()) {
        return Some(suite.to_string());
    }
    match policy {
        SuitePolicy::ExplicitOnly => None,
        SuitePolicy::DeriveFromModule => item.module.as_deref().and_then(suite_from_module),
    }
}

/// `tests/unit/test_mod.py` -> `test_mod`.
pub fn suite_from_module(module: &str) -> Option<String> {
    let last = module.rsplit('/').next().unwrap_or(module);
    let stem = match last.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => last,
    };
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Parameter values encoded in `name[v1-v2]`, keyed by the `parametrize` mark.
///
/// Returns the params and the name without its bracketed suffix. When there
/// are more values than declared keys the whole bracket is stored under a
/// single `[k1-k2]` key.
pub fn extract_params(name: &str, marks: &Marks) -> Option<(BTreeMap<String, String>, String)> {
    let mark = marks.get("parametrize")?;
    let keys: Vec<&str> = mark
        .args()
        .iter()
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();

    let (base, rest) = name.split_once('[')?;
    let raw = rest.strip_suffix(']').unwrap_or(rest);
    let values: Vec<&str> = raw.split('-').collect();

    let mut params = BTreeMap::new();
    if values.len() > keys.len() {
        params.insert(format!("[{}]", keys.join("-")), format!("[{raw}]"));
    } else {
        for (key, value) in keys.iter().zip(values) {
            params.insert(key.to_string(), value.to_string());
        }
    }
    if params.is_empty() {
        return None;
    }
    Some((params, base.to_string()))
}

/// `description` (or `desc`) mark with a positional value.
pub fn description(marks: &Marks) -> Option<String> {
    ["description", "desc"]
        .iter()
        .find_map(|name| marks.get(*name).and_then(|m| m.first()))
        .map(str::to_string)
}
