//! Exit code constants for the plancoach CLI.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CONFIG` | Invalid CLI arguments or configuration |
//! | 3 | `PROVIDER_UNAVAILABLE` | Provider cannot be constructed or reached |

/// Process exit code.
///
/// The numeric values are part of the public API.
///
/// ```rust
/// use plancoach_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::CONFIG.as_i32(), 2);
/// assert_eq!(ExitCode::SUCCESS, ExitCode::from_i32(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// General failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// Invalid arguments or configuration
    pub const CONFIG: ExitCode = ExitCode(2);

    /// Missing credential, unreachable provider, or a failed provider call
    pub const PROVIDER_UNAVAILABLE: ExitCode = ExitCode(3);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
