#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Exit code reported when a process was killed or never produced a real exit
/// status (timeout, signal, launch failure).
pub const KILLED_EXIT_CODE: i32 = -1;

/// Shell used to interpret scripts when none is configured.
pub const DEFAULT_SHELL: &str = "bash";

/// `PATH` handed to sandboxed scripts when none is configured.
pub const DEFAULT_SANDBOX_PATH: &str = "/usr/bin:/bin";

/// Deadline for ad-hoc script runs, in milliseconds.
pub const DEFAULT_RUN_TIMEOUT_MS: u64 = 10_000;

/// Deadline for each process spawned while grading a test case, in
/// milliseconds.
pub const DEFAULT_CASE_TIMEOUT_MS: u64 = 5_000;

/// Per-stream capture limit for sandboxed processes.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// How long output readers may keep draining after the process is gone.
pub const DRAIN_GRACE_MS: u64 = 250;

/// Number of characters of expected output shown when a test case fails.
pub const EXPECTED_PREVIEW_CHARS: usize = 200;

/// Directory questions are loaded from when `QUESTIONS_ROOT` is unset.
pub const DEFAULT_QUESTIONS_ROOT: &str = "questions";

/// Default number of questions graded concurrently by the CLI.
pub const DEFAULT_JOBS: usize = 4;
