//! Platform and variant choices
//!
//! A [`ChoiceSet`] lets a dependency declare different behavior per named
//! choice (usually a platform) and then picks exactly one of them. Choices
//! are validated against a closed set declared up front; `otherwise` is
//! always allowed and always eligible as the fallback.
//!
//! Behavior is either a literal value or a deferred block. Blocks run only
//! when their choice wins, so branches with side effects (like giving up on
//! an unsupported platform) never fire for the wrong host.
//!
//! # Example
//!
//! ```ignore
//! let set = ChoiceSet::new(&dep, &["linux", "osx"])?;
//! let packages = set.choose(&host.match_list(), |c| {
//!     c.on("linux", ["postgresql", "libpq-dev"])?;
//!     c.on_deferred("osx", |scope| {
//!         scope.unsupported_platform();
//!         None
//!     })?;
//!     Ok(None)
//! })?;
//! ```

use crate::context::DepContext;
use crate::error::{Error, Result};
use crate::host::Host;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// The reserved fallback choice
pub const OTHERWISE: &str = "otherwise";

/// A literal choice value: an ordered list, or a mapping kept as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceValue {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl ChoiceValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
        }
    }

    /// The list form, if this is a list
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            Self::Map(_) => None,
        }
    }

    /// The mapping form, if this is a mapping
    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Map(map) => Some(map),
            Self::List(_) => None,
        }
    }
}

impl fmt::Display for ChoiceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(items) => write!(f, "{}", items.join(", ")),
            Self::Map(map) => {
                let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{}", pairs.join(", "))
            }
        }
    }
}

// A single scalar becomes a one-element list
impl From<&str> for ChoiceValue {
    fn from(value: &str) -> Self {
        Self::List(vec![value.to_string()])
    }
}

impl From<String> for ChoiceValue {
    fn from(value: String) -> Self {
        Self::List(vec![value])
    }
}

impl From<Vec<String>> for ChoiceValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for ChoiceValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ChoiceValue {
    fn from(values: [&str; N]) -> Self {
        Self::List(values.iter().map(|v| (*v).to_string()).collect())
    }
}

impl From<BTreeMap<String, String>> for ChoiceValue {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::Map(map)
    }
}

/// One or more choice names
pub trait ChoiceNames {
    fn choice_names(&self) -> Vec<String>;
}

impl ChoiceNames for &str {
    fn choice_names(&self) -> Vec<String> {
        vec![(*self).to_string()]
    }
}

impl ChoiceNames for String {
    fn choice_names(&self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl ChoiceNames for &[&str] {
    fn choice_names(&self) -> Vec<String> {
        self.iter().map(|n| (*n).to_string()).collect()
    }
}

impl<const N: usize> ChoiceNames for [&str; N] {
    fn choice_names(&self) -> Vec<String> {
        self.iter().map(|n| (*n).to_string()).collect()
    }
}

impl ChoiceNames for Vec<String> {
    fn choice_names(&self) -> Vec<String> {
        self.clone()
    }
}

/// Outcome of [`ChoiceSet::select`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chosen {
    /// `name` won; `value` is `None` when its block produced nothing
    Choice { name: String, value: Option<ChoiceValue> },
    /// Nothing was registered and the declaring block returned this itself
    Direct(ChoiceValue),
    /// No registered choice matched a candidate, and there's no `otherwise`
    NoMatch,
}

impl Chosen {
    pub fn into_value(self) -> Option<ChoiceValue> {
        match self {
            Self::Choice { value, .. } => value,
            Self::Direct(value) => Some(value),
            Self::NoMatch => None,
        }
    }

    /// Name of the winning choice
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Choice { name, .. } => Some(name),
            Self::Direct(_) | Self::NoMatch => None,
        }
    }
}

/// A block evaluated only if its choice wins
pub type Deferred<'a> = Rc<dyn Fn(&ChoiceScope<'_>) -> Option<ChoiceValue> + 'a>;

/// What a choice does when selected
#[derive(Clone)]
pub enum Behavior<'a> {
    Value(ChoiceValue),
    Deferred(Deferred<'a>),
}

impl fmt::Debug for Behavior<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// What a deferred block can reach while it runs
pub struct ChoiceScope<'s> {
    owner: &'s dyn DepContext,
    platform: &'s str,
}

impl ChoiceScope<'_> {
    /// Look up a variable on the owning dependency
    pub fn var(&self, name: &str) -> Option<String> {
        self.owner.var(name)
    }

    /// Give up: the owning dependency can't be met on this platform
    pub fn unsupported_platform(&self) {
        let mut message = format!(
            "I don't know how to install '{}' on {}.\nYou could teach me how!",
            self.owner.name(),
            self.platform
        );
        if let Some(location) = self.owner.source_location() {
            message.push_str(&format!(" The dep is in {}.", location));
        }
        log::error!("{}", message);
        self.owner.mark_unmeetable(&message);
    }
}

/// A set of named behaviors for one decision
///
/// Created per decision, filled in by the declaring block, queried once by
/// [`ChoiceSet::choose`] and then dropped.
pub struct ChoiceSet<'a> {
    owner: &'a dyn DepContext,
    possible: Vec<String>,
    registered: HashMap<String, Behavior<'a>>,
    platform: Option<String>,
}

impl fmt::Debug for ChoiceSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChoiceSet")
            .field("owner", &self.owner.name())
            .field("possible", &self.possible)
            .field("registered", &self.registered)
            .finish()
    }
}

impl<'a> ChoiceSet<'a> {
    /// Declare the closed set of choices; `otherwise` is implicit
    pub fn new(owner: &'a dyn DepContext, possible: &[&str]) -> Result<Self> {
        if possible.contains(&OTHERWISE) {
            return Err(Error::InvalidChoiceName {
                name: OTHERWISE.to_string(),
            });
        }

        let mut possible: Vec<String> = possible.iter().map(|p| (*p).to_string()).collect();
        possible.push(OTHERWISE.to_string());

        Ok(Self {
            owner,
            possible,
            registered: HashMap::new(),
            platform: None,
        })
    }

    /// Name the platform in unsupported-platform messages after this host
    pub fn with_host(mut self, host: &Host) -> Self {
        self.platform = Some(host.description());
        self
    }

    /// Allowed choice names, `otherwise` last
    pub fn possible_choices(&self) -> &[String] {
        &self.possible
    }

    /// Whether behavior has been registered for a name
    pub fn is_registered(&self, name: &str) -> bool {
        self.registered.contains_key(name)
    }

    /// Look up a variable on the owning dependency
    pub fn var(&self, name: &str) -> Option<String> {
        self.owner.var(name)
    }

    /// Register behavior for one or more choices
    ///
    /// Supplying both a value and a block is an error, as is any name
    /// outside the declared set. Nothing is registered if any name is bad.
    pub fn register<N: ChoiceNames>(
        &mut self,
        names: N,
        value: Option<ChoiceValue>,
        block: Option<Deferred<'a>>,
    ) -> Result<()> {
        let names = names.choice_names();

        if value.is_some() && block.is_some() {
            return Err(Error::ConflictingBehavior {
                choice: names.join(", "),
            });
        }

        if let Some(bad) = names.iter().find(|n| !self.possible.contains(*n)) {
            return Err(Error::UnknownChoice {
                choice: bad.clone(),
                owner: self.owner.name().to_string(),
                expected: self.possible.join(", "),
            });
        }

        let behavior = match block {
            Some(block) => Behavior::Deferred(block),
            None => Behavior::Value(value.unwrap_or(ChoiceValue::List(Vec::new()))),
        };

        for name in names {
            self.registered.insert(name, behavior.clone());
        }
        Ok(())
    }

    /// Register a value for one or more choices
    pub fn on<N: ChoiceNames, V: Into<ChoiceValue>>(&mut self, names: N, value: V) -> Result<()> {
        self.register(names, Some(value.into()), None)
    }

    /// Register a block for one or more choices
    pub fn on_deferred<N, F>(&mut self, names: N, block: F) -> Result<()>
    where
        N: ChoiceNames,
        F: Fn(&ChoiceScope<'_>) -> Option<ChoiceValue> + 'a,
    {
        self.register(names, None, Some(Rc::new(block)))
    }

    /// Same as [`on`](Self::on), for declarations keyed by something other
    /// than platform (e.g. the package manager to go via)
    pub fn via<N: ChoiceNames, V: Into<ChoiceValue>>(&mut self, names: N, value: V) -> Result<()> {
        self.on(names, value)
    }

    /// Register the fallback value
    pub fn otherwise<V: Into<ChoiceValue>>(&mut self, value: V) -> Result<()> {
        self.on(OTHERWISE, value)
    }

    /// Register the fallback block
    pub fn otherwise_deferred<F>(&mut self, block: F) -> Result<()>
    where
        F: Fn(&ChoiceScope<'_>) -> Option<ChoiceValue> + 'a,
    {
        self.on_deferred(OTHERWISE, block)
    }

    /// Run the declaring block, then evaluate the winning choice
    ///
    /// `candidates` are tried in order (most specific first), then
    /// `otherwise`. If the block registered nothing, its own non-empty
    /// return value is the answer.
    pub fn select<S, F>(mut self, candidates: &[S], declare: F) -> Result<Chosen>
    where
        S: AsRef<str>,
        F: FnOnce(&mut Self) -> Result<Option<ChoiceValue>>,
    {
        let direct = declare(&mut self)?;

        if self.registered.is_empty() {
            return Ok(match direct.filter(|value| !value.is_empty()) {
                Some(value) => {
                    log::info!("{}: using {}", self.owner.name(), value);
                    Chosen::Direct(value)
                }
                None => {
                    log::warn!("{}: no choices declared", self.owner.name());
                    Chosen::NoMatch
                }
            });
        }

        let winner = candidates
            .iter()
            .map(AsRef::as_ref)
            .chain(std::iter::once(OTHERWISE))
            .find(|name| self.registered.contains_key(*name))
            .map(str::to_string);

        let Some(name) = winner else {
            let tried: Vec<&str> = candidates.iter().map(AsRef::as_ref).collect();
            log::warn!("{}: no choice matched [{}]", self.owner.name(), tried.join(", "));
            return Ok(Chosen::NoMatch);
        };

        log::info!("{}: chose '{}'", self.owner.name(), name);
        let value = self
            .registered
            .remove(&name)
            .and_then(|b| self.evaluate(b));
        Ok(Chosen::Choice { name, value })
    }

    /// [`select`](Self::select), keeping only the value
    ///
    /// `None` means nothing matched, or the winning block produced no value.
    pub fn choose<S, F>(self, candidates: &[S], declare: F) -> Result<Option<ChoiceValue>>
    where
        S: AsRef<str>,
        F: FnOnce(&mut Self) -> Result<Option<ChoiceValue>>,
    {
        self.select(candidates, declare).map(Chosen::into_value)
    }

    fn evaluate(&self, behavior: Behavior<'a>) -> Option<ChoiceValue> {
        match behavior {
            Behavior::Value(value) => Some(value),
            Behavior::Deferred(block) => {
                let platform = self
                    .platform
                    .clone()
                    .unwrap_or_else(|| Host::current().description());
                let scope = ChoiceScope {
                    owner: self.owner,
                    platform: &platform,
                };
                block(&scope)
            }
        }
    }
}
