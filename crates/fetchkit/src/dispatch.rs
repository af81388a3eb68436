//! Routing sources to fetch strategies
//!
//! Setup and processing are separate steps: sources are parsed and their
//! tool requirements declared while the dependency is being checked, and
//! only fetched later when it's being met.

use crate::error::{Error, Result};
use crate::locator::{SourceLocator, SourceSpec};
use crate::strategy::FetchStrategy;
use depkit::DepContext;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Parses sources and hands each to the strategy for its scheme
#[derive(Default)]
pub struct SourceDispatcher {
    strategies: BTreeMap<String, Rc<dyn FetchStrategy>>,
    locators: Vec<SourceLocator>,
}

impl SourceDispatcher {
    /// Dispatcher with an empty scheme table
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard table: http, https and ftp go to `archive`, git to `git`
    pub fn standard(archive: Rc<dyn FetchStrategy>, git: Rc<dyn FetchStrategy>) -> Self {
        Self::new()
            .with_strategy("http", Rc::clone(&archive))
            .with_strategy("https", Rc::clone(&archive))
            .with_strategy("ftp", archive)
            .with_strategy("git", git)
    }

    pub fn with_strategy(mut self, scheme: &str, strategy: Rc<dyn FetchStrategy>) -> Self {
        self.strategies.insert(scheme.to_ascii_lowercase(), strategy);
        self
    }

    /// Schemes with a registered strategy, sorted
    pub fn supported_schemes(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    pub fn strategy_for(&self, scheme: &str) -> Option<&Rc<dyn FetchStrategy>> {
        self.strategies.get(scheme)
    }

    pub fn locators(&self) -> &[SourceLocator] {
        &self.locators
    }

    /// Resolve and parse `sources`, and declare the tools they need on
    /// `owner`. Returns those tools.
    pub fn setup_source_uris(&mut self, owner: &dyn DepContext, sources: &[SourceSpec<'_>]) -> Result<Vec<String>> {
        let mut locators = Vec::with_capacity(sources.len());
        for spec in sources {
            match SourceLocator::parse(&spec.resolve()) {
                Ok(loc) => locators.push(loc),
                Err(e) => {
                    log::error!("{}: {}. {}", owner.name(), e, e.category().advice());
                    return Err(e);
                }
            }
        }
        self.locators = locators;

        let tools = self.required_tools();
        if !tools.is_empty() {
            owner.require(&tools);
        }
        log::info!(
            "{}: {} source(s), requires [{}]",
            owner.name(),
            self.locators.len(),
            tools.join(", ")
        );
        Ok(tools)
    }

    /// Tools needed by the schemes in use
    pub fn required_tools(&self) -> Vec<String> {
        self.locators
            .iter()
            .filter_map(|loc| loc.scheme().required_tool())
            .map(String::from)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Fetch every source in order.
    ///
    /// A failed source doesn't stop the others; the first error is returned
    /// once all of them have been tried.
    pub fn process_sources(&self, on_line: &mut dyn FnMut(&str)) -> Result<()> {
        let mut first_err = None;
        let mut failed = 0;
        for locator in &self.locators {
            if let Err(e) = self.process(locator, on_line) {
                failed += 1;
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            None => {
                log::info!("Fetched {} source(s)", self.locators.len());
                Ok(())
            }
            Some(e) => {
                log::error!("{} of {} source(s) failed", failed, self.locators.len());
                Err(e)
            }
        }
    }

    fn process(&self, locator: &SourceLocator, on_line: &mut dyn FnMut(&str)) -> Result<()> {
        let scheme = locator.scheme().as_str();
        let Some(strategy) = self.strategies.get(scheme) else {
            let err = Error::UnsupportedScheme {
                scheme: scheme.to_string(),
                locator: locator.raw().to_string(),
            };
            log::error!(
                "{}. Supported: {}.",
                err,
                self.supported_schemes()
                    .iter()
                    .map(|s| format!("{s}://"))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return Err(err);
        };

        log::debug!("{} -> {}", locator, strategy.name());
        strategy.fetch(locator, on_line).inspect_err(|e| {
            log::error!("Couldn't fetch {}: {}. {}", locator, e, e.category().advice());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::MockStrategy;
    use depkit::SourceLocation;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Owner {
        required: RefCell<Vec<String>>,
    }

    impl DepContext for Owner {
        fn name(&self) -> &str {
            "rbenv"
        }

        fn source_location(&self) -> Option<SourceLocation> {
            None
        }

        fn var(&self, _name: &str) -> Option<String> {
            None
        }

        fn mark_unmeetable(&self, _message: &str) {}

        fn require(&self, deps: &[String]) {
            self.required.borrow_mut().extend_from_slice(deps);
        }
    }

    fn setup(sources: &[&str]) -> (SourceDispatcher, Rc<MockStrategy>, Rc<MockStrategy>, Owner) {
        let archive = Rc::new(MockStrategy::new("archive"));
        let git = Rc::new(MockStrategy::new("git"));
        let mut dispatcher = SourceDispatcher::standard(archive.clone(), git.clone());
        let owner = Owner::default();
        let specs: Vec<SourceSpec<'_>> = sources.iter().map(|s| SourceSpec::from(*s)).collect();
        dispatcher.setup_source_uris(&owner, &specs).unwrap();
        (dispatcher, archive, git, owner)
    }

    #[test]
    fn test_git_source_requires_git() {
        let (_, _, _, owner) = setup(&[
            "http://example.com/a.tgz",
            "git://example.com/b.git",
            "git://example.com/c.git",
        ]);
        assert_eq!(*owner.required.borrow(), vec!["git".to_string()]);
    }

    #[test]
    fn test_archive_only_requires_nothing() {
        let (dispatcher, _, _, owner) = setup(&["http://example.com/a.tgz", "ftp://example.com/b.tgz"]);
        assert!(owner.required.borrow().is_empty());
        assert!(dispatcher.required_tools().is_empty());
    }

    #[test]
    fn test_dispatch_routes_every_scheme() {
        let (dispatcher, archive, git, _) = setup(&[
            "http://example.com/a.tgz",
            "git://example.com/b.git",
            "xmpp://chat.example.com",
        ]);

        let err = dispatcher.process_sources(&mut |_| {}).unwrap_err();

        assert_eq!(archive.calls(), vec!["http://example.com/a.tgz".to_string()]);
        assert_eq!(git.calls(), vec!["git://example.com/b.git".to_string()]);
        match err {
            Error::UnsupportedScheme { scheme, .. } => assert_eq!(scheme, "xmpp"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_https_and_ftp_go_to_archive() {
        let (dispatcher, archive, git, _) = setup(&["https://example.com/a.zip", "ftp://example.com/b.tar"]);

        dispatcher.process_sources(&mut |_| {}).unwrap();

        assert_eq!(archive.calls().len(), 2);
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_dispatch_reaches_strategies_in_any_order() {
        let orderings = [
            ["xmpp://chat.example.com", "http://example.com/a.tgz", "git://example.com/b.git"],
            ["http://example.com/a.tgz", "xmpp://chat.example.com", "git://example.com/b.git"],
            ["git://example.com/b.git", "http://example.com/a.tgz", "xmpp://chat.example.com"],
            ["xmpp://chat.example.com", "git://example.com/b.git", "http://example.com/a.tgz"],
        ];

        for sources in orderings {
            let (dispatcher, archive, git, _) = setup(&sources);

            let err = dispatcher.process_sources(&mut |_| {}).unwrap_err();

            assert_eq!(archive.calls(), vec!["http://example.com/a.tgz".to_string()], "{sources:?}");
            assert_eq!(git.calls(), vec!["git://example.com/b.git".to_string()], "{sources:?}");
            assert!(matches!(err, Error::UnsupportedScheme { .. }), "{sources:?}");
        }
    }

    #[test]
    fn test_first_error_is_returned() {
        let archive = Rc::new(MockStrategy::new("archive").failing_on("http://example.com/a.tgz"));
        let git = Rc::new(MockStrategy::new("git"));
        let mut dispatcher = SourceDispatcher::standard(archive.clone(), git.clone());
        let specs = [
            SourceSpec::from("http://example.com/a.tgz"),
            SourceSpec::from("xmpp://chat.example.com"),
        ];
        dispatcher.setup_source_uris(&Owner::default(), &specs).unwrap();

        let err = dispatcher.process_sources(&mut |_| {}).unwrap_err();

        assert!(matches!(err, Error::DownloadFailed { .. }));
    }

    #[test]
    fn test_strategy_failure_doesnt_stop_processing() {
        let archive = Rc::new(MockStrategy::new("archive").failing_on("http://example.com/a.tgz"));
        let git = Rc::new(MockStrategy::new("git"));
        let mut dispatcher = SourceDispatcher::standard(archive.clone(), git.clone());
        let specs = [
            SourceSpec::from("http://example.com/a.tgz"),
            SourceSpec::from("git://example.com/b.git"),
        ];
        dispatcher.setup_source_uris(&Owner::default(), &specs).unwrap();

        assert!(dispatcher.process_sources(&mut |_| {}).is_err());
        assert_eq!(git.calls(), vec!["git://example.com/b.git".to_string()]);
    }

    #[test]
    fn test_output_lines_forwarded() {
        let (dispatcher, _, _, _) = setup(&["git://example.com/b.git"]);
        let mut lines = Vec::new();

        dispatcher.process_sources(&mut |l| lines.push(l.to_string())).unwrap();

        assert_eq!(lines, vec!["git fetching git://example.com/b.git".to_string()]);
    }

    #[test]
    fn test_deferred_source_and_bad_locator() {
        let mut dispatcher = SourceDispatcher::standard(
            Rc::new(MockStrategy::new("archive")),
            Rc::new(MockStrategy::new("git")),
        );
        let owner = Owner::default();
        let specs = [SourceSpec::Deferred(Box::new(|| "git://example.com/late.git".to_string()))];
        dispatcher.setup_source_uris(&owner, &specs).unwrap();
        assert_eq!(dispatcher.locators()[0].raw(), "git://example.com/late.git");

        let bad = [SourceSpec::from("no scheme here")];
        assert!(matches!(
            dispatcher.setup_source_uris(&owner, &bad),
            Err(Error::InvalidLocator { .. })
        ));
    }

    #[test]
    fn test_supported_schemes_sorted() {
        let (dispatcher, _, _, _) = setup(&[]);
        assert_eq!(dispatcher.supported_schemes(), vec!["ftp", "git", "http", "https"]);
    }
}
