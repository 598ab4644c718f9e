//! Callout paragraph recognition.
//!
//! A callout is an ordinary paragraph whose first line starts with a keyword
//! prefix such as `Note:`. One data-driven recognizer covers every kind; the
//! three standard kinds come from the [`CalloutKind`] table.
//!
//! Recognizers are kept in a [`CalloutRegistry`] ordered by priority (highest
//! first, insertion order among equals). Only entries ranked above
//! [`PARAGRAPH_PRIORITY`] pre-empt plain paragraph rendering; a paragraph that
//! no recognizer claims is simply a paragraph.

/// Priority of the plain paragraph fallback.
pub const PARAGRAPH_PRIORITY: i32 = 100;

/// Priority given to the standard callouts.
pub const DEFAULT_CALLOUT_PRIORITY: i32 = 1000;

/// The standard callout kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CalloutKind {
    Note,
    Info,
    Warning,
}

impl CalloutKind {
    /// All standard kinds in registration order.
    pub const ALL: [Self; 3] = [Self::Note, Self::Info, Self::Warning];

    /// Line prefix that triggers this kind.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Note => "Note:",
            Self::Info => "Info:",
            Self::Warning => "Warning:",
        }
    }

    /// CSS class set on the rendered paragraph.
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

/// A single callout recognizer: `(prefix, css_class)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Callout {
    prefix: String,
    css_class: String,
}

impl Callout {
    /// Create a recognizer for an arbitrary prefix and class.
    #[must_use]
    pub fn new(prefix: impl Into<String>, css_class: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            css_class: css_class.into(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn css_class(&self) -> &str {
        &self.css_class
    }

    /// Whether `line` opens this callout.
    ///
    /// Case-sensitive, and leading whitespace is not skipped.
    #[must_use]
    pub fn trigger(&self, line: &str) -> bool {
        !self.prefix.is_empty() && line.starts_with(&self.prefix)
    }

    /// Two recognizers conflict when they could fire on the same line.
    fn overlaps(&self, other: &Self) -> bool {
        self.prefix.chars().next() == other.prefix.chars().next()
    }
}

impl From<CalloutKind> for Callout {
    fn from(kind: CalloutKind) -> Self {
        Self::new(kind.prefix(), kind.css_class())
    }
}

/// A value paired with the priority it was registered at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prioritized<T> {
    pub value: T,
    pub priority: i32,
}

/// Error returned when a new callout could fire on the same lines as an
/// existing one.
#[derive(Debug, thiserror::Error)]
#[error("callout prefix {new:?} overlaps with registered prefix {existing:?}")]
pub struct CalloutConflict {
    pub new: String,
    pub existing: String,
}

/// Ordered set of callout recognizers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CalloutRegistry {
    entries: Vec<Prioritized<Callout>>,
}

impl CalloutRegistry {
    /// Registry without any callouts. Every paragraph renders plain.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding `Note:`, `Info:` and `Warning:` at `priority`.
    #[must_use]
    pub fn standard(priority: i32) -> Self {
        Self {
            entries: CalloutKind::ALL
                .into_iter()
                .map(|kind| Prioritized {
                    value: Callout::from(kind),
                    priority,
                })
                .collect(),
        }
    }

    /// Add a recognizer.
    ///
    /// Higher priorities are tried first; equal priorities keep insertion
    /// order so output is reproducible.
    pub fn with_callout(mut self, callout: Callout, priority: i32) -> Result<Self, CalloutConflict> {
        if let Some(existing) = self.entries.iter().find(|e| e.value.overlaps(&callout)) {
            return Err(CalloutConflict {
                new: callout.prefix,
                existing: existing.value.prefix.clone(),
            });
        }
        let position = self
            .entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            position,
            Prioritized {
                value: callout,
                priority,
            },
        );
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order they are tried.
    pub fn iter(&self) -> impl Iterator<Item = &Prioritized<Callout>> {
        self.entries.iter()
    }

    /// Find the callout opened by a paragraph starting at `offset` in `source`.
    ///
    /// Returns `None` when the offset is not a valid position in `source`,
    /// when the paragraph is merely indented (leading whitespace is not
    /// tolerated), or when no recognizer triggers on its first line.
    /// Container markup such as `> ` before the paragraph is allowed.
    #[must_use]
    pub fn recognize(&self, source: &str, offset: usize) -> Option<&Callout> {
        let rest = source.get(offset..)?;
        let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let lead = &source[line_start..offset];
        if !lead.is_empty() && lead.trim().is_empty() {
            return None;
        }

        let line = rest.lines().next().unwrap_or_default();
        self.entries
            .iter()
            .filter(|e| e.priority > PARAGRAPH_PRIORITY)
            .map(|e| &e.value)
            .find(|callout| callout.trigger(line))
    }
}
