// src/exit.rs
//! Process exit codes for `prank`.
//!
//! Provides a stable contract for scripts and automation.

use std::process::Termination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PrankExit {
    /// Operation completed successfully.
    Success = 0,
    /// Generic error (IO, malformed config file, clustering failure).
    Error = 1,
    /// Parameters rejected (bad config values, too few points for k).
    InvalidInput = 2,
}

impl PrankExit {
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl Termination for PrankExit {
    fn report(self) -> std::process::ExitCode {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        std::process::ExitCode::from(self.code() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(PrankExit::Success.code(), 0);
        assert_eq!(PrankExit::Error.code(), 1);
        assert_eq!(PrankExit::InvalidInput.code(), 2);
    }
}
