//! Declared test annotations ("marks").
//!
//! The vocabulary is open: any name may appear, and the recorder only gives
//! meaning to a handful of them. Everything else becomes a custom tag.

use std::collections::BTreeMap;

/// Marks the recorder interprets itself or deliberately drops.
pub const RESERVED_MARKS: &[&str] = &[
    "parametrize",
    "filterwarnings",
    "skip",
    "skipif",
    "usefixtures",
    "xfail",
    "suite",
    "description",
    "desc",
];

/// Prefix for custom tag keys so they never collide with case fields.
pub const CUSTOM_TAG_PREFIX: char = '_';

/// Value attached to a mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    /// Declared without positional arguments.
    Bare,
    /// Declared with one or more positional arguments.
    Args(Vec<String>),
}

impl Mark {
    pub fn arg(value: impl Into<String>) -> Self {
        Self::Args(vec![value.into()])
    }

    /// First positional argument, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Bare => None,
            Self::Args(args) => args.first().map(String::as_str),
        }
    }

    pub fn args(&self) -> &[String] {
        match self {
            Self::Bare => &[],
            Self::Args(args) => args,
        }
    }
}

/// Marks declared on one test, by name.
pub type Marks = BTreeMap<String, Mark>;

pub fn is_reserved(name: &str) -> bool {
    RESERVED_MARKS.contains(&name)
}

/// Custom tags for every non-reserved mark.
///
/// Bare marks carry their own name as the value.
pub fn custom_tags(marks: &Marks) -> BTreeMap<String, String> {
    marks
        .iter()
        .filter(|(name, _)| !is_reserved(name))
        .map(|(name, mark)| {
            let value = mark.first().unwrap_or(name.as_str()).to_string();
            (format!("{CUSTOM_TAG_PREFIX}{name}"), value)
        })
        .collect()
}
