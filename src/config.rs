#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{path::PathBuf, sync::OnceLock, time::Duration};

use crate::constants::{
    DEFAULT_CASE_TIMEOUT_MS, DEFAULT_JOBS, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_QUESTIONS_ROOT,
    DEFAULT_RUN_TIMEOUT_MS, DEFAULT_SANDBOX_PATH, DEFAULT_SHELL,
};

/// Runtime configuration sourced from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the question folders.
    questions_root:   PathBuf,
    /// Shell binary used to interpret scripts.
    shell:            String,
    /// `PATH` exposed to sandboxed scripts.
    sandbox_path:     String,
    /// Deadline for ad-hoc script runs.
    run_timeout:      Duration,
    /// Deadline for each process spawned while grading a test case.
    case_timeout:     Duration,
    /// Per-stream capture limit.
    max_output_bytes: usize,
    /// Number of questions graded concurrently.
    jobs:             usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            questions_root:   PathBuf::from(DEFAULT_QUESTIONS_ROOT),
            shell:            DEFAULT_SHELL.to_string(),
            sandbox_path:     DEFAULT_SANDBOX_PATH.to_string(),
            run_timeout:      Duration::from_millis(DEFAULT_RUN_TIMEOUT_MS),
            case_timeout:     Duration::from_millis(DEFAULT_CASE_TIMEOUT_MS),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            jobs:             DEFAULT_JOBS,
        }
    }
}

impl Config {
    /// Builds a configuration from environment variables, falling back to
    /// defaults for anything missing or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let questions_root = std::env::var("QUESTIONS_ROOT")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.questions_root);

        Self {
            questions_root,
            shell: read_string("QUIZGRADE_SHELL", defaults.shell),
            sandbox_path: read_string("QUIZGRADE_SANDBOX_PATH", defaults.sandbox_path),
            run_timeout: read_timeout_ms("QUIZGRADE_RUN_TIMEOUT_MS", DEFAULT_RUN_TIMEOUT_MS),
            case_timeout: read_timeout_ms("QUIZGRADE_CASE_TIMEOUT_MS", DEFAULT_CASE_TIMEOUT_MS),
            max_output_bytes: read_usize("QUIZGRADE_MAX_OUTPUT_BYTES", defaults.max_output_bytes),
            jobs: read_usize("QUIZGRADE_JOBS", defaults.jobs).max(1),
        }
    }

    /// Returns the question store root directory.
    pub fn questions_root(&self) -> &PathBuf {
        &self.questions_root
    }

    /// Returns the shell used to interpret scripts.
    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Returns the `PATH` exposed to sandboxed scripts.
    pub fn sandbox_path(&self) -> &str {
        &self.sandbox_path
    }

    /// Returns the deadline for ad-hoc script runs.
    pub fn run_timeout(&self) -> Duration {
        self.run_timeout
    }

    /// Returns the deadline for each process spawned by the script grader.
    pub fn case_timeout(&self) -> Duration {
        self.case_timeout
    }

    /// Returns the per-stream capture limit.
    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    /// Returns how many questions may be graded at once.
    pub fn jobs(&self) -> usize {
        self.jobs
    }
}

/// Process-wide configuration, read from the environment on first use.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Returns the process-wide configuration, initializing it on demand.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Reads a non-empty, trimmed string variable.
fn read_string(env: &str, default: String) -> String {
    std::env::var(env)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
}

/// Parses an environment variable into a `usize`.
fn read_usize(env: &str, default: usize) -> usize {
    std::env::var(env)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

/// Parses an environment variable into a `Duration` of milliseconds, falling
/// back to `default_ms` when parsing fails, the value is zero, or the variable
/// is missing.
fn read_timeout_ms(env: &str, default_ms: u64) -> Duration {
    std::env::var(env)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(default_ms))
}
