// /////////////////////////////////////////////////////////////////////////////
// Polystore Coordinator
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Standardized Unix exit codes following BSD `sysexits.h` conventions, so a
//! shell script driving the CLI can branch on failure class without parsing
//! stderr.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    #[default]
    Success = 0,
    Error = 1,
    /// Invalid arguments, unknown subcommand.
    UsageError = 64,
    /// Malformed document, chunk, or relation input.
    DataError = 65,
    /// Input file not found or unreadable.
    NoInput = 66,
    /// A backend adapter is unreachable.
    Unavailable = 69,
    /// Saga rollback required, or compensation itself failed.
    Software = 70,
    IoError = 74,
    /// Retryable condition exhausted its budget (backpressure, transient).
    TempFail = 75,
    NoPerm = 77,
    /// Configuration file or environment override failed validation.
    Config = 78,
    Interrupted = 130,
    Terminated = 143,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps a `CoordinatorError` onto the exit code a caller should observe,
    /// using the error's own category rather than string sniffing.
    pub fn from_coordinator_error(error: &polystore_domain::CoordinatorError) -> Self {
        use polystore_domain::CoordinatorError::*;
        match error {
            InvalidConfiguration(_) => ExitCode::Config,
            InvalidDocument(_) | InvalidChunk(_) | InvalidRelation(_) | SerializationError(_) => ExitCode::DataError,
            IntegrityError(_) => ExitCode::DataError,
            NotFound(_) => ExitCode::NoInput,
            Conflict(_) => ExitCode::Error,
            AdapterFailed { .. } | SagaRollbackRequired(_) | CompensationFailed { .. } => ExitCode::Software,
            DeadlineExceeded(_) => ExitCode::TempFail,
            IoError(_) => ExitCode::IoError,
            InternalError(_) => ExitCode::Software,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::Software => "Internal software error",
            ExitCode::IoError => "I/O error",
            ExitCode::TempFail => "Temporary failure, retry",
            ExitCode::NoPerm => "Permission denied",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polystore_domain::CoordinatorError;

    #[test]
    fn exit_code_values_match_sysexits() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::UsageError.as_i32(), 64);
        assert_eq!(ExitCode::Config.as_i32(), 78);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn not_found_maps_to_no_input() {
        assert_eq!(
            ExitCode::from_coordinator_error(&CoordinatorError::NotFound("doc".into())),
            ExitCode::NoInput
        );
    }

    #[test]
    fn deadline_exceeded_maps_to_temp_fail() {
        assert_eq!(
            ExitCode::from_coordinator_error(&CoordinatorError::DeadlineExceeded("payload_stream".into())),
            ExitCode::TempFail
        );
    }

    #[test]
    fn display_includes_description_and_code() {
        let rendered = format!("{}", ExitCode::UsageError);
        assert!(rendered.contains("Command line usage error"));
        assert!(rendered.contains("64"));
    }
}
