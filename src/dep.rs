//! The dependency a CLI invocation acts for
//!
//! Each command builds one `CliDep` named after what it's checking, with
//! the `[vars]` table from provision.toml plus any `--var` overrides.

use depkit::{DepContext, SourceLocation};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct CliDep {
    name: String,
    vars: BTreeMap<String, String>,
    location: Option<SourceLocation>,
    unmeetable: RefCell<Option<String>>,
    required: RefCell<Vec<String>>,
}

impl CliDep {
    pub fn new(name: impl Into<String>, vars: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            vars,
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Why the dependency can never be met, if something said so
    pub fn unmeetable(&self) -> Option<String> {
        self.unmeetable.borrow().clone()
    }

    /// Other dependencies declared along the way, in declaration order
    pub fn required(&self) -> Vec<String> {
        self.required.borrow().clone()
    }
}

impl DepContext for CliDep {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_location(&self) -> Option<SourceLocation> {
        self.location.clone()
    }

    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn mark_unmeetable(&self, message: &str) {
        log::debug!("{} marked unmeetable", self.name);
        self.unmeetable.borrow_mut().get_or_insert_with(|| message.to_string());
    }

    fn require(&self, deps: &[String]) {
        let mut required = self.required.borrow_mut();
        for dep in deps {
            if !required.contains(dep) {
                required.push(dep.clone());
            }
        }
    }
}

/// Parse `key=value` pairs from the command line
pub fn parse_pairs(pairs: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => anyhow::bail!("Expected key=value, got '{}'", pair),
        })
        .collect()
}
