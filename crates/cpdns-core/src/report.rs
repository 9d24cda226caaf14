//! Run transcript
//!
//! The report is an explicit value built up by the engine and returned with
//! the run outcome. It is the body of the notification and what the binary
//! echoes to the console unless `--quiet` is set.

use chrono::{DateTime, Utc};

/// Severity of a report line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Info,
    Ok,
    Warn,
    Error,
}

impl LineKind {
    fn marker(self) -> &'static str {
        match self {
            LineKind::Info => "[info]",
            LineKind::Ok => "[ ok ]",
            LineKind::Warn => "[warn]",
            LineKind::Error => "[fail]",
        }
    }
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub kind: LineKind,
    pub text: String,
}

impl std::fmt::Display for ReportLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind.marker(), self.text)
    }
}

/// Ordered transcript of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    started_at: DateTime<Utc>,
    lines: Vec<ReportLine>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            lines: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: LineKind, text: impl Into<String>) {
        self.lines.push(ReportLine {
            kind,
            text: text.into(),
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(LineKind::Info, text);
    }

    pub fn ok(&mut self, text: impl Into<String>) {
        self.push(LineKind::Ok, text);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.push(LineKind::Warn, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(LineKind::Error, text);
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    /// Whether any line contains `needle` (used heavily by tests)
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.text.contains(needle))
    }

    /// Plain-text rendering, one line per entry
    pub fn render(&self) -> String {
        let mut out = format!("Run started {}\n", self.started_at.to_rfc3339());
        for line in &self.lines {
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}
