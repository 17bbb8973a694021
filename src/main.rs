#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # quizgrade
//!
//! Command line front end for the grading engine.
//!
//! - `quizgrade run script.sh --stdin input.txt` runs a script in the sandbox
//!   and prints the captured result as JSON.
//! - `quizgrade eval <QUESTION_ID> answer.sh` grades one answer.
//! - `quizgrade grade submissions.json` grades a whole session.
//! - `quizgrade list` lists the questions under `QUESTIONS_ROOT`.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};
use quizgrade::{
    config,
    grade::{Evaluator, Submission, render_questions, render_session, score_session_concurrently},
    process::{SandboxRunner, ScriptRunner},
    question::DirStore,
};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Run a script in the sandbox
    Run {
        /// File to feed to the script's stdin
        stdin:      Option<PathBuf>,
        /// Deadline override in milliseconds
        timeout_ms: Option<u64>,
        /// Script file
        script:     PathBuf,
    },
    /// Grade one answer to one question
    Eval {
        /// Question id
        question: String,
        /// Answer file, or `-` for stdin
        answer:   PathBuf,
    },
    /// Grade a submission file
    Grade {
        /// Print JSON instead of a table
        json:        bool,
        /// Questions graded at once
        jobs:        Option<usize>,
        /// Submission file, or `-` for stdin
        submissions: PathBuf,
    },
    /// List questions in the store
    List,
}

/// Parsed command line.
#[derive(Debug, Clone)]
struct Opts {
    /// Enable debug logging
    verbose: bool,
    /// Command to run
    cmd:     Cmd,
}

/// Parse the command line arguments
fn options() -> Opts {
    let verbose = short('v')
        .long("verbose")
        .help("Log every sandbox run")
        .switch();

    let run = {
        let stdin = long("stdin")
            .help("File whose contents are written to the script's stdin")
            .argument::<PathBuf>("FILE")
            .optional();
        let timeout_ms = long("timeout-ms")
            .help("Deadline in milliseconds (default QUIZGRADE_RUN_TIMEOUT_MS)")
            .argument::<u64>("MS")
            .optional();
        let script = positional::<PathBuf>("SCRIPT").help("Shell script to run");
        construct!(Cmd::Run {
            stdin,
            timeout_ms,
            script
        })
    }
    .to_options()
    .command("run")
    .help("Run a shell script in the sandbox and print the result as JSON");

    let eval = {
        let question = positional::<String>("QUESTION_ID").help("Id of the question to grade");
        let answer = positional::<PathBuf>("ANSWER").help("Answer file, or - for stdin");
        construct!(Cmd::Eval { question, answer })
    }
    .to_options()
    .command("eval")
    .help("Grade one answer and print the result as JSON");

    let grade = {
        let json = long("json").help("Print the session score as JSON").switch();
        let jobs = short('j')
            .long("jobs")
            .help("How many questions to grade at once (default QUIZGRADE_JOBS)")
            .argument::<usize>("N")
            .optional();
        let submissions = positional::<PathBuf>("SUBMISSIONS")
            .help("JSON array of {questionId, answer}, or an object with an `answers` array");
        construct!(Cmd::Grade {
            json,
            jobs,
            submissions
        })
    }
    .to_options()
    .command("grade")
    .help("Grade a set of answers and print the session score");

    let list = pure(Cmd::List)
        .to_options()
        .command("list")
        .help("List the questions under QUESTIONS_ROOT");

    let cmd = construct!([run, eval, grade, list]);

    construct!(Opts { verbose, cmd })
        .to_options()
        .descr("Sandboxed script runner and grader")
        .run()
}

/// Accepted layouts of a submission file.
#[derive(Deserialize)]
#[serde(untagged)]
enum SubmissionFile {
    /// `[{"questionId": .., "answer": ..}]`
    List(Vec<Submission>),
    /// `{"answers": [..]}`
    Body {
        /// The submitted answers.
        answers: Vec<Submission>,
    },
}

/// Reads a whole file, or stdin when `path` is `-`.
async fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Could not read stdin")?;
        return Ok(buf);
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let opts = options();

    let level = if opts.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(fmt)
        .with(LevelFilter::from_level(level))
        .init();

    let config = config::get();
    let store = DirStore::new(config.questions_root());

    match opts.cmd {
        Cmd::Run {
            stdin,
            timeout_ms,
            script,
        } => {
            let code = read_input(&script).await?;
            let input = match stdin {
                Some(path) => read_input(&path).await?,
                None => String::new(),
            };
            let deadline = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.run_timeout());

            let result = SandboxRunner::from_config(config)
                .run(&code, &input, deadline)
                .await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Cmd::Eval { question, answer } => {
            let loaded = store
                .load(&question)
                .await
                .with_context(|| format!("Could not load question `{question}`"))?;
            let answer = read_input(&answer).await?;

            let result = Evaluator::from_config(config)
                .evaluate(&loaded, &answer)
                .await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Cmd::Grade {
            json,
            jobs,
            submissions,
        } => {
            let raw = read_input(&submissions).await?;
            let submissions = match serde_json::from_str::<SubmissionFile>(&raw).with_context(
                || format!("{} is not a list of {{questionId, answer}}", submissions.display()),
            )? {
                SubmissionFile::List(answers) | SubmissionFile::Body { answers } => answers,
            };

            let evaluator = Evaluator::from_config(config);
            let session = score_session_concurrently(
                &evaluator,
                &store,
                &submissions,
                jobs.unwrap_or_else(|| config.jobs()),
            )
            .await;

            if json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            } else {
                println!("{}", render_session(&session));
                let summary = format!("Final score: {:.1}%", session.percent());
                let summary = if session.final_score >= 1.0 {
                    summary.green()
                } else if session.final_score > 0.0 {
                    summary.yellow()
                } else {
                    summary.red()
                };
                println!("{summary}");
            }
        }
        Cmd::List => {
            let metas = store
                .list()
                .await
                .with_context(|| format!("Could not list {}", store.root().display()))?;
            println!("{}", render_questions(&metas));
        }
    };

    Ok(())
}
