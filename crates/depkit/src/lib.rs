//! # depkit
//!
//! Convergence decisions for declarative provisioning.
//!
//! A dependency describes a desired system state. Before converging it, the
//! engine needs to answer two questions this crate covers:
//!
//! - **Is it already met?** [`CommandLocationVerifier`] checks that the
//!   commands a dependency provides are present and all come from one place.
//! - **How do we converge it here?** [`ChoiceSet`] picks the platform-specific
//!   behavior for the current [`Host`].
//!
//! ## Example
//!
//! ```ignore
//! use depkit::{CommandLocationVerifier, PrefixInstallSource};
//!
//! let brew = PrefixInstallSource::new("homebrew", vec!["/opt/homebrew/bin".into()]);
//! let verifier = CommandLocationVerifier::new(&executor, &brew);
//!
//! let location = verifier.commands_in_path("postgres", &["psql", "pg_dump"], None);
//! if location.is_conflicting() {
//!     // someone else installed half of these; don't touch them
//! }
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`ProcessExecutor`]: Runs external commands
//! - [`DepContext`]: The dependency a decision is made for
//! - [`InstallSource`]: The component's own install mechanism
//!
//! This allows the crate to be used without hard dependencies on a
//! specific process runner or dependency engine.

pub mod choice;
pub mod context;
pub mod error;
pub mod host;
pub mod probe;
pub mod text;
pub mod types;
pub mod verify;

// Re-export main types at crate root
pub use choice::{Behavior, ChoiceNames, ChoiceScope, ChoiceSet, ChoiceValue, Chosen, Deferred, OTHERWISE};
pub use context::{DepContext, InstallSource, PrefixInstallSource, ProcessExecutor};
pub use error::{Error, ErrorCategory, Result};
pub use host::Host;
pub use probe::PathProbe;
pub use types::{CommandLocation, CommandOutput, Located, RunOptions, SourceLocation};
pub use verify::CommandLocationVerifier;
