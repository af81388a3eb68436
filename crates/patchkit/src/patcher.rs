//! Idempotent file edits
//!
//! Each operation reads the whole file, checks whether its change is already
//! there, and only then builds the new content and hands it to the writer in
//! one piece. A file that fails a check is never written.

use crate::error::{Error, Result};
use crate::marker::{Stamp, is_added_marker};
use crate::writer::{FileOwner, PrivilegedWriter, is_writable};
use regex::Regex;
use std::fs;
use std::path::Path;

/// What a patch operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The file was rewritten
    Applied,
    /// The change was already present; nothing written
    AlreadyApplied,
}

impl PatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// State of a file that's expected to be generated by us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStatus {
    /// The config hasn't been generated yet
    Missing,
    /// Present, but without our "Generated by" marker
    NeedsRegeneration,
    /// Present and generated by us
    Generated,
}

impl ConfigStatus {
    pub fn is_met(&self) -> bool {
        matches!(self, Self::Generated)
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::Missing => "the config hasn't been generated yet",
            Self::NeedsRegeneration => "the config needs to be regenerated",
            Self::Generated => "the config was generated",
        }
    }
}

/// Options for [`Patcher::insert_into_file`]
#[derive(Debug, Clone, Default)]
pub struct InsertOptions {
    /// Overrides the patcher's comment character for the marker line
    pub comment_char: Option<String>,
    /// Line that must directly precede the anchor
    pub insert_after: Option<String>,
}

/// What [`grep`] looks for
#[derive(Debug, Clone)]
pub enum Pattern {
    Text(String),
    Regex(Regex),
}

impl Pattern {
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    fn is_match(&self, line: &str) -> bool {
        match self {
            Self::Text(text) => line.contains(text.as_str()),
            Self::Regex(re) => re.is_match(line),
        }
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Lines of `path` matching `pattern`.
///
/// `None` when the file doesn't exist or nothing matches.
pub fn grep(pattern: &Pattern, path: &Path) -> Result<Option<Vec<String>>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(path, e)),
    };

    let matches: Vec<String> = content
        .lines()
        .filter(|l| pattern.is_match(l))
        .map(String::from)
        .collect();

    Ok(if matches.is_empty() { None } else { Some(matches) })
}

/// Applies idempotent, marked edits to text files
pub struct Patcher<W> {
    writer: W,
    stamp: Stamp,
    comment_char: String,
}

impl<W: PrivilegedWriter> Patcher<W> {
    pub fn new(writer: W, stamp: Stamp) -> Self {
        Self {
            writer,
            stamp,
            comment_char: "#".to_string(),
        }
    }

    /// Comment character used for marker lines (default `#`)
    pub fn with_comment_char(mut self, comment_char: impl Into<String>) -> Self {
        self.comment_char = comment_char.into();
        self
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Replace every line starting with `line` (ignoring indentation).
    ///
    /// The replaced line is kept as a `was:` comment under an "edited by"
    /// marker, which is also how a second run recognises its own work.
    pub fn change_line(&self, line: &str, replacement: &str, path: &Path) -> Result<PatchOutcome> {
        let result = self.change_line_inner(line, replacement, path);
        self.report(path, &result);
        result
    }

    fn change_line_inner(&self, line: &str, replacement: &str, path: &Path) -> Result<PatchOutcome> {
        let content = read(path)?;
        let lines = split_lines(&content);
        let eol = line_ending(&content);
        let line = line.trim_start();
        let was = format!("{} was: ", self.comment_char);
        let marker = self.stamp.edited_by();

        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        let mut changed = false;
        let mut recorded = false;

        for (i, raw) in lines.iter().enumerate() {
            let current = text(raw);
            let trimmed = current.trim_start();
            let indent = &current[..current.len() - trimmed.len()];

            if trimmed.starts_with(&was) && trimmed[was.len()..].starts_with(line) {
                recorded = true;
            }

            let previous_was = i > 0 && text(lines[i - 1]).trim_start().starts_with(&was);
            if trimmed.starts_with(line) && !previous_was {
                out.push(format!("{}{} {}{}", indent, self.comment_char, marker, eol));
                out.push(format!("{}{}{}{}", indent, was, trimmed, eol));
                out.push(format!("{}{}{}", indent, replacement, ending(raw)));
                changed = true;
            } else {
                out.push((*raw).to_string());
            }
        }

        if changed {
            self.commit(path, &out.concat())?;
            Ok(PatchOutcome::Applied)
        } else if recorded {
            Ok(PatchOutcome::AlreadyApplied)
        } else {
            Err(Error::LineNotFound {
                path: path.to_path_buf(),
                line: line.to_string(),
            })
        }
    }

    /// Insert `lines` directly before the first line equal to `anchor`.
    pub fn insert_into_file(
        &self,
        anchor: &str,
        path: &Path,
        lines: &str,
        opts: &InsertOptions,
    ) -> Result<PatchOutcome> {
        let result = self.insert_inner(anchor, path, lines, opts);
        self.report(path, &result);
        result
    }

    fn insert_inner(
        &self,
        anchor: &str,
        path: &Path,
        block: &str,
        opts: &InsertOptions,
    ) -> Result<PatchOutcome> {
        let comment_char = opts.comment_char.as_deref().unwrap_or(&self.comment_char);
        let content = read(path)?;
        let lines = split_lines(&content);
        let eol = line_ending(&content);
        let block_lines: Vec<&str> = block.lines().collect();
        let nlines = block_lines.len();

        let Some(at) = lines.iter().position(|l| text(l).trim() == anchor.trim()) else {
            return Err(Error::AnchorNotFound {
                path: path.to_path_buf(),
                anchor: anchor.trim().to_string(),
            });
        };

        if at > nlines {
            let start = at - nlines;
            let present = lines[start..at].iter().map(|l| text(l)).eq(block_lines.iter().copied());
            if present && is_added_marker(text(lines[start - 1]), comment_char) {
                return Ok(PatchOutcome::AlreadyApplied);
            }
        }

        if let Some(expected) = &opts.insert_after {
            let found = if at > 0 { text(lines[at - 1]).trim() } else { "" };
            if found != expected.trim() {
                return Err(Error::AnchorMismatch {
                    path: path.to_path_buf(),
                    expected: expected.trim().to_string(),
                    found: found.to_string(),
                });
            }
        }

        let mut out = lines[..at].concat();
        out.push_str(&format!("{} {}{}", comment_char, self.stamp.added_by(nlines), eol));
        for l in &block_lines {
            out.push_str(l);
            out.push_str(eol);
        }
        out.push_str(&lines[at..].concat());

        self.commit(path, &out)?;
        Ok(PatchOutcome::Applied)
    }

    /// Append `text` unless a line already starts with its first non-blank line.
    ///
    /// Creates the file if it doesn't exist. Blank text is an error.
    pub fn append_to_file(&self, text: &str, path: &Path) -> Result<PatchOutcome> {
        let result = self.append_inner(text, path);
        self.report(path, &result);
        result
    }

    fn append_inner(&self, text: &str, path: &Path) -> Result<PatchOutcome> {
        let existing = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::io(path, e)),
        };

        let Some(first) = text.lines().find(|l| !l.trim().is_empty()) else {
            return Err(Error::EmptyText {
                path: path.to_path_buf(),
            });
        };
        if existing.lines().any(|l| l.starts_with(first)) {
            return Ok(PatchOutcome::AlreadyApplied);
        }

        let eol = line_ending(&existing);
        let mut content = existing;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push_str(eol);
        }
        content.push_str(&format!(
            "{} {}{}",
            self.comment_char,
            self.stamp.added_by(text.lines().count()),
            eol
        ));
        for l in text.lines() {
            content.push_str(l);
            content.push_str(eol);
        }

        self.commit(path, &content)?;
        Ok(PatchOutcome::Applied)
    }

    /// Make `keyword <to>` the setting for `keyword`.
    ///
    /// Lines matching `^keyword\s+<from>` are removed (with their marker, if
    /// we added them) and `keyword <to>` is appended unless a line already
    /// matches `^keyword\s+<to>`. `from` and `to` are regular expressions.
    pub fn set_directive(&self, keyword: &str, from: &str, to: &str, path: &Path) -> Result<PatchOutcome> {
        let result = self.directive_inner(keyword, from, to, path);
        self.report(path, &result);
        result
    }

    fn directive_inner(&self, keyword: &str, from: &str, to: &str, path: &Path) -> Result<PatchOutcome> {
        let escaped = regex::escape(keyword);
        let stale = Regex::new(&format!(r"^{escaped}\s+{from}"))?;
        let wanted = Regex::new(&format!(r"^{escaped}\s+{to}"))?;

        let content = read(path)?;
        let lines = split_lines(&content);
        let eol = line_ending(&content);

        let mut out: Vec<String> = Vec::with_capacity(lines.len() + 2);
        let mut removed = false;
        for raw in &lines {
            let line = text(raw);
            if stale.is_match(line) && !wanted.is_match(line) {
                if out
                    .last()
                    .is_some_and(|prev| is_added_marker(text(prev), &self.comment_char))
                {
                    out.pop();
                }
                removed = true;
            } else {
                out.push((*raw).to_string());
            }
        }

        let present = out.iter().any(|l| wanted.is_match(text(l)));
        if !present {
            if let Some(last) = out.last_mut().filter(|l| !l.ends_with('\n')) {
                last.push_str(eol);
            }
            out.push(format!("{} {}{}", self.comment_char, self.stamp.added_by(1), eol));
            out.push(format!("{} {}{}", keyword, unescape_literal(to), eol));
        }

        if !removed && present {
            return Ok(PatchOutcome::AlreadyApplied);
        }

        self.commit(path, &out.concat())?;
        Ok(PatchOutcome::Applied)
    }

    /// Whether `path` is a config we generated
    pub fn config_status(&self, path: &Path) -> Result<ConfigStatus> {
        if !path.exists() {
            return Ok(ConfigStatus::Missing);
        }
        let marker = Pattern::Text(format!("Generated by {}", self.stamp.tool()));
        Ok(match grep(&marker, path)? {
            Some(_) => ConfigStatus::Generated,
            None => ConfigStatus::NeedsRegeneration,
        })
    }

    fn commit(&self, path: &Path, content: &str) -> Result<()> {
        let owner = FileOwner::of(path)?;
        let elevate = !is_writable(path);
        if elevate {
            log::debug!("{} isn't writable, writing as its owner", path.display());
        }
        self.writer.write_as(owner.as_ref(), path, content, elevate)
    }

    fn report(&self, path: &Path, result: &Result<PatchOutcome>) {
        match result {
            Ok(PatchOutcome::Applied) => log::info!("Patched {}", path.display()),
            Ok(PatchOutcome::AlreadyApplied) => {
                log::info!("{} is already patched", path.display());
            }
            Err(e) => log::error!("{}. {}", e, e.category().advice()),
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Lines with their endings kept, so untouched lines are written back as read
fn split_lines(content: &str) -> Vec<&str> {
    content.split_inclusive('\n').collect()
}

/// A line without its `\n` or `\r\n`
fn text(line: &str) -> &str {
    line.strip_suffix('\n')
        .map_or(line, |l| l.strip_suffix('\r').unwrap_or(l))
}

fn ending(line: &str) -> &str {
    &line[text(line).len()..]
}

/// Terminator for lines we add
fn line_ending(content: &str) -> &'static str {
    if content.contains("\r\n") { "\r\n" } else { "\n" }
}

/// Literal text for a directive value given as a simple pattern
fn unescape_literal(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
