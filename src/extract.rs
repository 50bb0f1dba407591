use lazy_static::lazy_static;
use regex::Regex;

/// Returned when the agent reply contains nothing that looks like SQL.
pub const SQL_NOT_FOUND: &str = "N/A";

lazy_static! {
    static ref SQL_PATTERN: Regex =
        Regex::new(r"(?is)\b(select|show|with|describe|explain).*").expect("valid SQL pattern");
}

/// How much of the text after the keyword gets kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractMode {
    /// Everything from the first keyword to the end of the text. Trailing
    /// narrative rides along and usually breaks re-execution; this is the
    /// long-standing behavior callers see today.
    #[default]
    ToEnd,
    /// Stop at the first `;` after the keyword (terminator kept). Opt-in:
    /// changes observable output on replies with trailing prose.
    FirstStatement,
}

/// Scans free-form agent output for the first thing that looks like the
/// start of a SQL statement.
///
/// This is a token scan, not a parser: a keyword at the start of an ordinary
/// word ("shown", "without") fires it, and quoting and comments are invisible
/// to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlExtractor {
    mode: ExtractMode,
}

impl SqlExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: ExtractMode) -> Self {
        Self { mode }
    }

    /// Returns the SQL candidate, or [`SQL_NOT_FOUND`] when no keyword
    /// occurs anywhere in the text.
    pub fn extract(&self, agent_text: &str) -> String {
        let matched = match SQL_PATTERN.find(agent_text) {
            Some(m) => m.as_str(),
            None => return SQL_NOT_FOUND.to_string(),
        };

        let candidate = match self.mode {
            ExtractMode::ToEnd => matched,
            ExtractMode::FirstStatement => match matched.find(';') {
                Some(idx) => &matched[..=idx],
                None => matched,
            },
        };

        candidate.trim().to_string()
    }
}
