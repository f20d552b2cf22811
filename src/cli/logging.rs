//! Logging utilities for CLI output

/// Log level for CLI output
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Normal output level
    Normal,
    /// Verbose output with additional details
    Verbose,
}

impl LogLevel {
    /// Resolve the level from the global CLI flags; quiet beats verbose.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }
}

/// Log a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}

/// Warnings go to stderr at every level except quiet
pub fn warn(level: LogLevel, msg: &str) {
    if level != LogLevel::Quiet {
        eprintln!("warning: {msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert!(LogLevel::from_flags(true, false) == LogLevel::Quiet);
        assert!(LogLevel::from_flags(true, true) == LogLevel::Quiet);
        assert!(LogLevel::from_flags(false, true) == LogLevel::Verbose);
        assert!(LogLevel::from_flags(false, false) == LogLevel::Normal);
    }
}
