use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use quizgrade::{
    Evaluator, Question, QuestionType, RunResult, SandboxRunner, ScriptRunner,
    grade::ScriptGrader, question::TestCase,
};

fn bash_question(solution: Option<&str>, tests: Option<Vec<TestCase>>) -> Question {
    Question::builder()
        .id("script")
        .version("1")
        .kind(QuestionType::Bash)
        .maybe_solution_script(solution)
        .maybe_tests(tests)
        .build()
}

fn sandbox() -> Evaluator {
    Evaluator::new(Arc::new(SandboxRunner::new())).with_case_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn mismatch_reports_failing_case_and_expected_preview() {
    let question = bash_question(Some("echo hi"), None);

    let result = sandbox().evaluate(&question, "echo bye").await;

    assert_eq!(result.score(), 0.0);
    assert!(!result.passed());
    assert!(result.feedback().contains("Test 1"), "{}", result.feedback());
    assert!(result.feedback().contains(": hi..."), "{}", result.feedback());
}

#[tokio::test]
async fn identical_script_gets_full_marks() {
    let question = bash_question(Some("read -r n; echo $((n * 2))"), None);

    let result = sandbox()
        .evaluate(&question, "read -r n; echo $((n * 2))")
        .await;

    assert_eq!(result.score(), 1.0);
    assert!(result.passed());
    assert_eq!(result.feedback(), "All tests passed.");
    let details = result.details().expect("details");
    assert_eq!(details.total, 1);
    assert_eq!(details.cases[0].description.as_deref(), Some("Default"));
}

#[tokio::test]
async fn every_case_counts() {
    let question = bash_question(
        Some("cat"),
        Some(vec![TestCase::with_stdin("3\n"), TestCase::with_stdin("5\n")]),
    );

    let wrong = sandbox().evaluate(&question, "echo wrong").await;
    assert_eq!(wrong.score(), 0.0);
    assert!(wrong.feedback().contains("Test 1"));
    assert!(wrong.feedback().contains("Test 2"));

    let partial = sandbox()
        .evaluate(&question, r#"read -r n; [ "$n" = 3 ] && echo 3 || echo nope"#)
        .await;
    assert_eq!(partial.score(), 0.5);
    assert!(!partial.passed());
    assert!(!partial.feedback().contains("Test 1"));
    assert!(partial.feedback().contains("Test 2"));

    let details = partial.details().expect("details");
    assert_eq!((details.passed, details.total), (1, 2));
    assert!(details.cases[0].passed);
    assert!(!details.cases[1].passed);
}

#[tokio::test]
async fn surrounding_whitespace_is_ignored() {
    let question = bash_question(Some("echo hi"), None);

    let result = sandbox().evaluate(&question, r"printf '\n  hi  \n\n'").await;

    assert!(result.passed());
}

#[tokio::test]
async fn stderr_and_exit_code_do_not_count() {
    let question = bash_question(Some("echo hi"), None);

    let result = sandbox()
        .evaluate(&question, "echo hi; echo noise >&2; exit 4")
        .await;

    assert!(result.passed());
}

#[tokio::test]
async fn setup_runs_before_both_scripts() {
    let question = bash_question(
        Some(r#"echo "$GREETING""#),
        Some(vec![
            TestCase::builder()
                .description("with setup")
                .setup("GREETING=hello")
                .build(),
        ]),
    );

    let good = sandbox().evaluate(&question, r#"echo "$GREETING""#).await;
    assert!(good.passed());

    let bad = sandbox().evaluate(&question, "echo").await;
    assert!(!bad.passed());
    assert!(bad.feedback().contains("hello"));
}

#[tokio::test]
async fn timed_out_case_fails() {
    let question = bash_question(Some("echo hi"), None);
    let evaluator = Evaluator::new(Arc::new(SandboxRunner::new()))
        .with_case_timeout(Duration::from_millis(300));

    let result = evaluator.evaluate(&question, "sleep 10; echo hi").await;

    assert_eq!(result.score(), 0.0);
    let details = result.details().expect("details");
    assert!(details.cases[0].timed_out);
    assert!(!details.cases[0].passed);
}

#[tokio::test]
async fn missing_reference_never_runs_anything() {
    let runner = Arc::new(RecordingRunner::default());
    let evaluator = Evaluator::new(runner.clone());

    for solution in [None, Some(""), Some("   \n")] {
        let result = evaluator
            .evaluate(&bash_question(solution, None), "echo hi")
            .await;
        assert_eq!(result.score(), 0.0);
        assert_eq!(result.feedback(), "Question has no reference solution.");
        assert!(result.details().is_none());
    }
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn empty_test_list_falls_back_to_default_case() {
    let question = bash_question(Some("echo hi"), Some(Vec::new()));

    let result = sandbox().evaluate(&question, "echo hi").await;

    assert!(result.passed());
    assert_eq!(result.details().expect("details").total, 1);
}

#[tokio::test]
async fn long_expected_output_is_previewed() {
    let question = bash_question(Some("printf 'x%.0s' {1..500}"), None);

    let result = sandbox().evaluate(&question, "echo short").await;

    let preview = format!(": {}...", "x".repeat(200));
    assert!(result.feedback().ends_with(&preview), "{}", result.feedback());
    assert!(!result.feedback().contains(&"x".repeat(201)));
}

/// Records every run and echoes the script back as stdout.
#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<(String, String, Duration)>>,
}

impl RecordingRunner {
    fn calls(&self) -> Vec<(String, String, Duration)> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl ScriptRunner for RecordingRunner {
    async fn run(&self, script: &str, stdin: &str, deadline: Duration) -> RunResult {
        self.calls
            .lock()
            .expect("lock")
            .push((script.to_string(), stdin.to_string(), deadline));
        RunResult {
            stdout: format!("{script}|{stdin}\n"),
            ..RunResult::default()
        }
    }
}

#[tokio::test]
async fn reference_runs_for_every_case_before_the_answer() {
    let runner = RecordingRunner::default();
    let question = bash_question(
        Some("REF"),
        Some(vec![
            TestCase::with_stdin("1"),
            TestCase::builder().stdin("2").setup("SETUP").build(),
        ]),
    );

    let result = ScriptGrader::new(&runner, Duration::from_millis(1234))
        .grade(&question, "ANS")
        .await;

    let calls: Vec<(String, String)> = runner
        .calls()
        .into_iter()
        .map(|(script, stdin, deadline)| {
            assert_eq!(deadline, Duration::from_millis(1234));
            (script, stdin)
        })
        .collect();
    assert_eq!(
        calls,
        vec![
            ("REF".to_string(), "1".to_string()),
            ("SETUP\nREF".to_string(), "2".to_string()),
            ("ANS".to_string(), "1".to_string()),
            ("SETUP\nANS".to_string(), "2".to_string()),
        ]
    );
    assert_eq!(result.score(), 0.0);
    assert!(result.feedback().contains("Test 2"));
    assert!(result.feedback().contains("SETUP\nREF|2"));
}

#[tokio::test]
async fn injected_runner_decides_the_outcome() {
    let runner = Arc::new(RecordingRunner::default());
    let question = bash_question(Some("same"), None);

    let result = Evaluator::new(runner.clone())
        .evaluate(&question, "same")
        .await;

    assert!(result.passed());
    assert_eq!(runner.calls().len(), 2);
}
