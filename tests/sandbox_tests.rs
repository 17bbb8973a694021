use std::time::{Duration, Instant};

use quizgrade::{RunResult, SandboxRunner, ScriptRunner, constants::KILLED_EXIT_CODE};

const DEADLINE: Duration = Duration::from_secs(5);

async fn run(script: &str, stdin: &str) -> RunResult {
    SandboxRunner::new().run(script, stdin, DEADLINE).await
}

#[tokio::test]
async fn captures_stdout_and_exit_code() {
    let result = run("echo hello", "").await;

    assert_eq!(result.stdout, "hello\n");
    assert_eq!(result.stderr, "");
    assert_eq!(result.exit_code, 0);
    assert!(!result.timed_out);
    assert!(result.success());
}

#[tokio::test]
async fn keeps_stderr_separate() {
    let result = run("echo out; echo err >&2; exit 3", "").await;

    assert_eq!(result.stdout, "out\n");
    assert_eq!(result.stderr, "err\n");
    assert_eq!(result.exit_code, 3);
    assert!(!result.success());
    assert!(!result.killed());
}

#[tokio::test]
async fn feeds_stdin_and_closes_it() {
    let result = run(
        r#"while read -r line; do echo "got $line"; done; echo done"#,
        "one\ntwo\n",
    )
    .await;

    assert_eq!(result.stdout, "got one\ngot two\ndone\n");
    assert!(!result.timed_out);
}

#[tokio::test]
async fn empty_stdin_reads_eof() {
    let result = run(r#"if read -r line; then echo "line"; else echo "eof"; fi"#, "").await;

    assert_eq!(result.stdout, "eof\n");
}

#[tokio::test]
async fn deadline_kills_and_keeps_partial_output() {
    let started = Instant::now();
    let result = SandboxRunner::new()
        .run("echo partial; sleep 10; echo never", "", Duration::from_millis(300))
        .await;

    assert!(result.timed_out);
    assert_eq!(result.exit_code, KILLED_EXIT_CODE);
    assert_eq!(result.stdout, "partial\n");
    assert!(
        result.stderr.ends_with("[timed out after 300 ms]"),
        "stderr was {:?}",
        result.stderr
    );
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn environment_is_cleared_except_path() {
    let result = run(r#"echo "home=${HOME:-unset}"; echo "path=$PATH""#, "").await;

    assert_eq!(result.stdout, "home=unset\npath=/usr/bin:/bin\n");
}

#[tokio::test]
async fn custom_path_is_exposed() {
    let result = SandboxRunner::new()
        .with_path_env("/bin:/usr/bin")
        .run(r#"echo "$PATH""#, "", DEADLINE)
        .await;

    assert_eq!(result.stdout, "/bin:/usr/bin\n");
}

#[tokio::test]
async fn scratch_directory_is_removed_afterwards() {
    let result = run("pwd; touch scratch-file; ls", "").await;

    let mut lines = result.stdout.lines();
    let dir = lines.next().expect("pwd output");
    assert!(dir.contains("quizgrade-run-"), "cwd was {dir}");
    assert_eq!(lines.next(), Some("scratch-file"));
    assert!(!std::path::Path::new(dir).exists());
}

#[tokio::test]
async fn missing_shell_is_a_launch_failure() {
    let result = SandboxRunner::new()
        .with_shell("definitely-not-a-shell")
        .run("echo hi", "", DEADLINE)
        .await;

    assert_eq!(result.stdout, "");
    assert_eq!(result.exit_code, KILLED_EXIT_CODE);
    assert!(!result.timed_out);
    assert!(
        result.stderr.contains("cannot find shell"),
        "stderr was {:?}",
        result.stderr
    );
}

#[tokio::test]
async fn output_is_capped() {
    let result = SandboxRunner::new()
        .with_max_output_bytes(16)
        .run("printf 'a%.0s' {1..1000}", "", DEADLINE)
        .await;

    assert_eq!(result.stdout, "a".repeat(16));
    assert!(result.truncated);
    assert_eq!(result.exit_code, 0);
}

#[tokio::test]
async fn runs_are_independent() {
    let runner = SandboxRunner::new();
    let (first, second) = tokio::join!(
        runner.run("read -r x; echo first-$x", "1\n", DEADLINE),
        runner.run("read -r x; echo second-$x", "2\n", DEADLINE),
    );

    assert_eq!(first.stdout, "first-1\n");
    assert_eq!(second.stdout, "second-2\n");
}

#[test]
fn result_serializes_camel_case() {
    let json = serde_json::to_value(RunResult {
        stdout: "x".into(),
        exit_code: 0,
        ..RunResult::default()
    })
    .expect("serialize");

    assert_eq!(json["exitCode"], 0);
    assert_eq!(json["timedOut"], false);
}

#[cfg(target_os = "linux")]
mod process_group {
    use super::*;

    /// Whether `pid` is still running (zombies count as gone).
    fn alive(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => {
                let state = stat
                    .rsplit_once(')')
                    .and_then(|(_, rest)| rest.split_whitespace().next());
                !matches!(state, Some("Z") | Some("X"))
            }
            Err(_) => false,
        }
    }

    async fn assert_gone(pid: u32) {
        for _ in 0..20 {
            if !alive(pid) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("background process {pid} outlived the run");
    }

    #[tokio::test]
    async fn background_children_die_on_timeout() {
        let result = SandboxRunner::new()
            .run(
                "sleep 30 >/dev/null 2>&1 & echo $!; wait",
                "",
                Duration::from_millis(300),
            )
            .await;

        assert!(result.timed_out);
        let pid: u32 = result.stdout.trim().parse().expect("pid");
        assert_gone(pid).await;
    }

    #[tokio::test]
    async fn background_children_die_after_normal_exit() {
        let result = run("sleep 30 >/dev/null 2>&1 & echo $!", "").await;

        assert!(!result.timed_out);
        assert_eq!(result.exit_code, 0);
        let pid: u32 = result.stdout.trim().parse().expect("pid");
        assert_gone(pid).await;
    }
}
