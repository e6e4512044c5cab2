//! Diagnostics written straight to stderr, for the stretch of startup where
//! the logger does not exist yet and for the final fatal error

use colored::{ColoredString, Colorize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Error,
    Info,
    /// Printed right before the process exits
    Fatal,
}

impl Severity {
    fn tag(self) -> ColoredString {
        match self {
            Self::Error => "[tagwm error]".red().bold(),
            Self::Info => "[tagwm info]".purple().bold(),
            Self::Fatal => "[tagwm fatal]".yellow().bold(),
        }
    }
}

/// A diagnostic line without its trailing newline
pub(crate) fn render(severity: Severity, args: fmt::Arguments) -> String {
    format!("{}: {}", severity.tag(), args)
}

#[macro_export]
macro_rules! tagwm_error {
    ($($arg:tt)*) => {
        eprintln!("{}", $crate::macros::render($crate::macros::Severity::Error, format_args!($($arg)*)))
    };
}

#[macro_export]
macro_rules! tagwm_info {
    ($($arg:tt)*) => {
        eprintln!("{}", $crate::macros::render($crate::macros::Severity::Info, format_args!($($arg)*)))
    };
}

/// Report an unrecoverable error and exit with status 1
#[macro_export]
macro_rules! tagwm_fatal {
    ($($arg:tt)*) => {{
        eprintln!("{}", $crate::macros::render($crate::macros::Severity::Fatal, format_args!($($arg)*)));
        std::process::exit(1)
    }};
}

#[cfg(test)]
mod tests {
    use super::{render, Severity};

    fn plain(line: &str) -> String {
        String::from_utf8(strip_ansi_escapes::strip(line).unwrap()).unwrap()
    }

    #[test]
    fn lines_carry_their_severity() {
        let line = render(Severity::Error, format_args!("no config at {}", "~/.tagwm.yml"));
        assert_eq!(plain(&line), "[tagwm error]: no config at ~/.tagwm.yml");

        let line = render(Severity::Fatal, format_args!("{:#}", anyhow::anyhow!("display gone")));
        assert_eq!(plain(&line), "[tagwm fatal]: display gone");
        assert_eq!(plain(&render(Severity::Info, format_args!("x"))), "[tagwm info]: x");
    }
}
