use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "provision")]
#[command(version)]
#[command(about = "Check and converge a machine, one dependency at a time", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that commands are installed, all from one place
    Check(CheckArgs),

    /// Edit a file exactly once per change
    Patch(PatchArgs),

    /// Download and unpack or clone sources
    Fetch(FetchArgs),

    /// Pick a value per platform for this host
    Choose(ChooseArgs),

    /// Show the detected platform
    Host {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

// ============================================================================
// Check
// ============================================================================

#[derive(Parser)]
pub struct CheckArgs {
    /// Commands that should all be on the PATH
    #[arg(required = true)]
    pub commands: Vec<String>,

    /// Treat this directory as ours instead of the configured install dirs
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Name to report the check under (defaults to the first command)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// Patch
// ============================================================================

#[derive(Parser)]
pub struct PatchArgs {
    /// Show what would change without writing
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: PatchCommand,
}

#[derive(Subcommand)]
pub enum PatchCommand {
    /// Replace lines starting with some text, keeping a record of the old one
    ChangeLine {
        /// File to edit
        file: PathBuf,

        /// Start of the line to replace (leading whitespace ignored)
        #[arg(short, long)]
        line: String,

        /// Replacement line
        #[arg(short = 'w', long = "with")]
        replacement: String,
    },

    /// Insert lines just before an anchor line
    Insert {
        /// File to edit
        file: PathBuf,

        /// Line to insert before
        #[arg(short, long)]
        before: String,

        /// Line to insert (repeatable)
        #[arg(short, long = "text", required = true)]
        text: Vec<String>,

        /// Only insert if the line before the anchor is this
        #[arg(short, long)]
        after: Option<String>,

        /// Comment character for the marker line
        #[arg(short, long)]
        comment_char: Option<String>,
    },

    /// Append lines to the end of a file
    Append {
        /// File to edit (created if missing)
        file: PathBuf,

        /// Line to append (repeatable)
        #[arg(short, long = "text", required = true)]
        text: Vec<String>,
    },

    /// Switch a `keyword value` directive from one value to another
    Directive {
        /// File to edit
        file: PathBuf,

        /// Directive keyword (e.g. PermitRootLogin)
        keyword: String,

        /// Value to remove
        #[arg(short, long)]
        from: String,

        /// Value to set
        #[arg(short, long)]
        to: String,
    },

    /// Check whether a config file was generated by us
    Status {
        /// File to inspect
        file: PathBuf,
    },

    /// Show lines of a file matching a pattern
    Grep {
        /// File to search
        file: PathBuf,

        /// Text (or regex with --regex) to look for
        pattern: String,

        /// Treat the pattern as a regular expression
        #[arg(short, long)]
        regex: bool,
    },
}

// ============================================================================
// Fetch
// ============================================================================

#[derive(Parser)]
pub struct FetchArgs {
    /// Source URLs (http, https, ftp or git)
    #[arg(required = true)]
    pub sources: Vec<String>,

    /// Name to report the fetch under
    #[arg(short, long, default_value = "sources")]
    pub name: String,
}

// ============================================================================
// Choose
// ============================================================================

#[derive(Parser)]
pub struct ChooseArgs {
    /// Value for one or more choices: `linux,ubuntu=build-essential,libssl-dev`
    #[arg(short, long = "option")]
    pub options: Vec<String>,

    /// Value when no choice matches
    #[arg(long, conflicts_with = "unsupported")]
    pub otherwise: Option<String>,

    /// Give up when no choice matches
    #[arg(long)]
    pub unsupported: bool,

    /// Allowed choice names (comma-separated, defaults to common platforms)
    #[arg(long, value_delimiter = ',')]
    pub choices: Vec<String>,

    /// Candidates to try instead of the detected host's (comma-separated, most specific first)
    #[arg(long, value_delimiter = ',')]
    pub platform: Vec<String>,

    /// Extra variable visible to the choice (`key=value`, repeatable)
    #[arg(long = "var")]
    pub vars: Vec<String>,

    /// Name of the dependency the choice is for
    #[arg(short, long, default_value = "choice")]
    pub name: String,
}

// ============================================================================
// Config
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show config file location and resolved settings
    Show,
}
