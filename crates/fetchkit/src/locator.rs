//! Source locators
//!
//! A locator is the string a dependency gives as its source, e.g.
//! `https://nginx.org/download/nginx-1.25.3.tar.gz` or
//! `git://github.com/rbenv/rbenv.git`. Parsing splits it into a scheme,
//! which picks the fetch strategy, and an address.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Transport a locator asks for
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scheme {
    Http,
    Https,
    Ftp,
    Git,
    /// Anything else; parsed fine, but nothing fetches it
    Other(String),
}

impl Scheme {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Ftp => "ftp",
            Self::Git => "git",
            Self::Other(s) => s,
        }
    }

    /// External tool a scheme can't be fetched without
    pub fn required_tool(&self) -> Option<&'static str> {
        match self {
            Self::Git => Some("git"),
            _ => None,
        }
    }
}

impl From<&str> for Scheme {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "http" => Self::Http,
            "https" => Self::Https,
            "ftp" => Self::Ftp,
            "git" => Self::Git,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed source locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocator {
    raw: String,
    scheme: Scheme,
    address: String,
    url: Url,
}

impl SourceLocator {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let url = Url::parse(raw).map_err(|e| Error::InvalidLocator {
            locator: raw.to_string(),
            message: e.to_string(),
        })?;

        let scheme = Scheme::from(url.scheme());
        let address = raw
            .split_once("://")
            .map(|(_, rest)| rest.to_string())
            .unwrap_or_else(|| url.path().to_string());

        Ok(Self {
            raw: raw.to_string(),
            scheme,
            address,
            url,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Everything after `scheme://`
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Last path segment, e.g. `nginx-1.25.3.tar.gz`
    pub fn file_name(&self) -> Option<&str> {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
    }

    /// Directory name for a checkout of this locator
    pub fn checkout_name(&self) -> Option<&str> {
        self.file_name()
            .map(|name| name.strip_suffix(".git").unwrap_or(name))
            .filter(|name| !name.is_empty())
    }
}

impl FromStr for SourceLocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A source as declared: either the locator itself or a callable
/// producing it when sources are set up
pub enum SourceSpec<'a> {
    Literal(String),
    Deferred(Box<dyn Fn() -> String + 'a>),
}

impl SourceSpec<'_> {
    pub fn resolve(&self) -> String {
        match self {
            Self::Literal(s) => s.clone(),
            Self::Deferred(f) => f(),
        }
    }
}

impl fmt::Debug for SourceSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<&str> for SourceSpec<'_> {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_string())
    }
}

impl From<String> for SourceSpec<'_> {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}
