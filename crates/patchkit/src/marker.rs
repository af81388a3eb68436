//! Provenance markers
//!
//! Every change leaves a comment saying what made it and when, e.g.
//! `# These 2 lines added by provision-0.1.0 at 2026-10-17 09:30:00 +0000`.

use chrono::{DateTime, FixedOffset, Local};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Identifies the tool making a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    tool: String,
    version: String,
    at: Option<DateTime<FixedOffset>>,
}

impl Stamp {
    /// Stamp changes with the current time
    pub fn new(tool: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            version: version.into(),
            at: None,
        }
    }

    /// Stamp changes with a fixed time
    pub fn at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.at = Some(at);
        self
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    fn by(&self) -> String {
        let at = self.at.unwrap_or_else(|| Local::now().fixed_offset());
        format!(
            "by {}-{} at {}",
            self.tool,
            self.version,
            at.format(TIME_FORMAT)
        )
    }

    /// Marker for a whole generated file
    pub fn generated_by(&self) -> String {
        format!("Generated {}", self.by())
    }

    /// Marker for an edited line
    pub fn edited_by(&self) -> String {
        format!("This line edited {}", self.by())
    }

    /// Marker for added lines
    pub fn added_by(&self, nlines: usize) -> String {
        if nlines == 1 {
            format!("This line added {}", self.by())
        } else {
            format!("These {} lines added {}", nlines, self.by())
        }
    }
}

/// Whether a line is an "added by" marker comment
pub fn is_added_marker(line: &str, comment_char: &str) -> bool {
    let Some(body) = line.trim().strip_prefix(comment_char) else {
        return false;
    };
    let body = body.trim_start();
    (body.starts_with("This line added by ") || body.starts_with("These "))
        && body.contains(" added by ")
}

/// Whether a line carries a "Generated by" marker
pub fn is_generated_marker(line: &str) -> bool {
    line.contains("Generated by ")
}
