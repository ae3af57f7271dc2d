//! Console output gated on `-q` / `-v`.
//!
//! Quiet keeps only errors. The default prints one line per pipeline step.
//! Verbose adds tool command lines and step timings.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

const QUIET: u8 = 0;
const STEPS: u8 = 1;
const VERBOSE: u8 = 2;

static LEVEL: AtomicU8 = AtomicU8::new(STEPS);

/// Set the output level from the command-line flags; `quiet` wins.
pub fn init(quiet: bool, verbose: bool) {
    let level = match (quiet, verbose) {
        (true, _) => QUIET,
        (false, true) => VERBOSE,
        (false, false) => STEPS,
    };
    LEVEL.store(level, Ordering::Relaxed);
}

/// `-v` was given.
pub fn is_verbose() -> bool {
    LEVEL.load(Ordering::Relaxed) == VERBOSE
}

/// `-q` was given.
pub fn is_quiet() -> bool {
    LEVEL.load(Ordering::Relaxed) == QUIET
}

/// `println!` that only fires under `-v`.
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            println!($($arg)*);
        }
    };
}

pub(crate) use vprintln;

/// `println!` for pipeline step lines, silenced by `-q`.
macro_rules! dprintln {
    ($($arg:tt)*) => {
        if !$crate::verbose::is_quiet() {
            println!($($arg)*);
        }
    };
}

pub(crate) use dprintln;

/// Reports how long a pipeline step took once it goes out of scope (`-v` only).
pub struct Timer {
    step: String,
    started: Instant,
}

impl Timer {
    /// Start timing `step`.
    pub fn start(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            started: Instant::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if is_verbose() {
            println!("  {} took {:.1?}", self.step, self.elapsed());
        }
    }
}
