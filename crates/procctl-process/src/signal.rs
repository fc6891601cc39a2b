//! Signal vocabulary for process termination.
//!
//! Covers the signals this library sends or names on `kill` command lines.
//! All functions here are pure; actual delivery lives in
//! [`crate::terminate`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Termination signals with stable numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// SIGHUP (1) - Hangup, often used to reload configuration.
    Hup,
    /// SIGINT (2) - Interrupt from keyboard (Ctrl+C).
    Int,
    /// SIGQUIT (3) - Quit with core dump.
    Quit,
    /// SIGKILL (9) - Forceful termination (cannot be caught).
    Kill,
    /// SIGTERM (15) - Graceful termination request.
    Term,
}

impl Signal {
    /// Returns the signal number.
    pub fn number(&self) -> i32 {
        match self {
            Signal::Hup => 1,
            Signal::Int => 2,
            Signal::Quit => 3,
            Signal::Kill => 9,
            Signal::Term => 15,
        }
    }

    /// Returns the signal name (without the SIG prefix).
    pub fn name(&self) -> &'static str {
        match self {
            Signal::Hup => "HUP",
            Signal::Int => "INT",
            Signal::Quit => "QUIT",
            Signal::Kill => "KILL",
            Signal::Term => "TERM",
        }
    }

    /// Creates a signal from a number.
    pub fn from_number(num: i32) -> Option<Self> {
        match num {
            1 => Some(Signal::Hup),
            2 => Some(Signal::Int),
            3 => Some(Signal::Quit),
            9 => Some(Signal::Kill),
            15 => Some(Signal::Term),
            _ => None,
        }
    }

    /// Returns whether this signal can be caught or ignored by the process.
    pub fn is_catchable(&self) -> bool {
        !matches!(self, Signal::Kill)
    }

    /// Returns the dashed flag form used on `kill` command lines, e.g. `-15`.
    pub fn as_kill_flag(&self) -> String {
        with_leading_dash(&number_of(*self))
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIG{}", self.name())
    }
}

/// Returns the decimal code of a signal as a string.
pub fn number_of(signal: Signal) -> String {
    signal.number().to_string()
}

/// Prepends `-` to a signal token unless one is already present.
///
/// Idempotent: applying it twice yields the same result as once.
pub fn with_leading_dash(token: &str) -> String {
    if token.starts_with('-') {
        token.to_string()
    } else {
        format!("-{token}")
    }
}
