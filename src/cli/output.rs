//! Styled terminal output
//!
//! Status lines for the CLI. Reports themselves are printed as-is so they can
//! be piped; everything here is silenced by `--quiet`.

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    /// Create a new output handler
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }
}
