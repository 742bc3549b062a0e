use std::process::ExitCode;

/// Exit codes for the fubber CLI.
///
/// - `Success` (0): command completed.
/// - `ResolutionFailure` (1): no project for the working directory, or the
///   query failed to parse.
/// - `StoreFailure` (2): I/O or store error.
/// - `InvalidArguments` (3): the command line did not parse.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    ResolutionFailure,
    StoreFailure,
    InvalidArguments,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::ResolutionFailure => ExitCode::from(1),
            ExitStatus::StoreFailure => ExitCode::from(2),
            ExitStatus::InvalidArguments => ExitCode::from(3),
        }
    }
}
