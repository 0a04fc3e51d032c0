//! Classification labels.
//!
//! A workflow author declares a closed set of labels as a plain Rust enum and
//! implements [`Label`] for it. The classifier only ever hands back values of
//! that enum, so a routing table keyed by the label can be checked for
//! completeness when it is built.

use std::fmt;
use std::hash::Hash;

use crate::error::{SwitchyardError, SwitchyardResult};

/// A value from a small, closed set of classification outcomes.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Topic { General, News }
///
/// impl Label for Topic {
///     fn all() -> &'static [Self] { &[Topic::General, Topic::News] }
///     fn as_str(&self) -> &'static str {
///         match self { Topic::General => "general", Topic::News => "news" }
///     }
/// }
/// ```
pub trait Label: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every declared value, in declaration order.
    fn all() -> &'static [Self];

    /// The canonical wire form: lowercase, no surrounding whitespace.
    fn as_str(&self) -> &'static str;

    /// Human-readable form shown to end users. Defaults to the wire form
    /// with its first letter upper-cased.
    fn display_name(&self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Case-fold and trim raw model output so it can be compared against
/// canonical label strings.
///
/// Quotes, backticks and trailing full stops are stripped as well, since
/// models frequently wrap a one-word answer in them.
pub fn normalize_label(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '.' | '*'))
        .trim()
        .to_lowercase()
}

/// The labels a classifier may return plus the fallback used for anything
/// it cannot map.
///
/// The default is guaranteed to be a member of the set, so resolution always
/// yields a member.
#[derive(Debug, Clone)]
pub struct LabelSet<L: Label> {
    labels: Vec<L>,
    default: L,
}

impl<L: Label> LabelSet<L> {
    /// Build a label set.
    ///
    /// Returns `ConfigError` if `labels` is empty or does not contain
    /// `default`.
    pub fn new(labels: impl IntoIterator<Item = L>, default: L) -> SwitchyardResult<Self> {
        let mut unique: Vec<L> = Vec::new();
        for label in labels {
            if !unique.contains(&label) {
                unique.push(label);
            }
        }
        if unique.is_empty() {
            return Err(SwitchyardError::config("label set must not be empty"));
        }
        if !unique.contains(&default) {
            return Err(SwitchyardError::config(format!(
                "default label '{}' is not a member of the label set",
                default.as_str()
            )));
        }
        Ok(Self { labels: unique, default })
    }

    /// A set containing every declared value of `L`.
    pub fn all(default: L) -> Self {
        let mut labels = L::all().to_vec();
        if !labels.contains(&default) {
            labels.push(default);
        }
        Self { labels, default }
    }

    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    pub fn default_label(&self) -> L {
        self.default
    }

    pub fn contains(&self, label: L) -> bool {
        self.labels.contains(&label)
    }

    /// Map raw model text onto a member of the set, if it names one.
    pub fn resolve(&self, raw: &str) -> Option<L> {
        let normalized = normalize_label(raw);
        self.labels
            .iter()
            .copied()
            .find(|label| label.as_str() == normalized)
    }

    /// Like `resolve`, falling back to the default label.
    pub fn resolve_or_default(&self, raw: &str) -> L {
        self.resolve(raw).unwrap_or(self.default)
    }

    /// Comma-separated canonical names, for prompt construction.
    pub fn describe(&self) -> String {
        self.labels
            .iter()
            .map(|l| format!("'{}'", l.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
