//! Interactive quiz taking.

use std::time::Duration;

use lectern_core::catalog::format_time_limit;
use lectern_core::model::{AnswerChoice, AttemptResult};
use lectern_core::{AttemptRunner, LecternError, QuizPhase, QuizSession, QuizSettings, SubmitTrigger};
use tokio::io::AsyncBufRead;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::prompt::{confirm_question, is_yes, Prompt};

/// One line of learner input during an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuizCommand {
    Answer(AnswerChoice),
    Next,
    Previous,
    /// 1-based question number.
    GoTo(usize),
    Submit,
    Quit,
    Help,
}

impl QuizCommand {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if let Some(choice) = AnswerChoice::parse(line) {
            return Some(Self::Answer(choice));
        }
        let mut parts = line.split_whitespace();
        let cmd = parts.next()?.to_lowercase();
        match cmd.as_str() {
            "n" | "next" => Some(Self::Next),
            "p" | "prev" | "previous" => Some(Self::Previous),
            "g" | "go" => parts.next()?.parse().ok().filter(|n| *n > 0).map(Self::GoTo),
            "s" | "submit" => Some(Self::Submit),
            "q" | "quit" => Some(Self::Quit),
            "?" | "h" | "help" => Some(Self::Help),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Finished {
    Graded(AttemptResult),
    Quit,
}

/// Answer to a question asked while the countdown runs.
#[derive(Debug)]
enum Confirmed {
    Yes,
    No,
    /// Time ran out first and the attempt was graded.
    Expired(AttemptResult),
}

/// Runs attempts until the learner stops, passes, or runs out of attempts.
pub async fn run<R: AsyncBufRead + Unpin>(
    runner: &AttemptRunner,
    settings: &QuizSettings,
    prompt: &mut Prompt<R>,
) -> anyhow::Result<()> {
    print_intro(&runner.snapshot());

    if runner.phase() == QuizPhase::Locked {
        println!("No attempts remaining.");
        return Ok(());
    }
    if !prompt.confirm("Start the quiz?").await? {
        return Ok(());
    }
    runner.with_session(QuizSession::start)?;

    loop {
        match attempt(runner, settings, prompt).await? {
            Finished::Quit => {
                println!("Attempt abandoned; nothing was submitted.");
                return Ok(());
            }
            Finished::Graded(result) => {
                print_result(&result);
                if !runner.with_session(|s| s.can_retake()) {
                    return Ok(());
                }
                if !prompt.confirm("Retake the quiz?").await? {
                    return Ok(());
                }
                runner.with_session(|s| {
                    s.retake()?;
                    s.start()
                })?;
            }
        }
    }
}

async fn attempt<R: AsyncBufRead + Unpin>(
    runner: &AttemptRunner,
    settings: &QuizSettings,
    prompt: &mut Prompt<R>,
) -> anyhow::Result<Finished> {
    let mut ticker = interval(Duration::from_secs(settings.tick_seconds));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    print_question(&runner.snapshot());

    loop {
        let input = tokio::select! {
            _ = ticker.tick() => None,
            line = prompt.line() => Some(line?),
        };

        let Some(line) = input else {
            if let Some(result) = on_tick(runner).await {
                return Ok(Finished::Graded(result));
            }
            continue;
        };

        // End of input.
        let Some(line) = line else {
            return Ok(Finished::Quit);
        };

        let Some(command) = QuizCommand::parse(&line) else {
            print_help();
            continue;
        };

        let outcome = match command {
            QuizCommand::Answer(choice) => runner.with_session(|s| {
                s.answer_current(choice)?;
                s.next().map(|_| ())
            }),
            QuizCommand::Next => runner.with_session(|s| s.next().map(|_| ())),
            QuizCommand::Previous => runner.with_session(|s| s.previous().map(|_| ())),
            QuizCommand::GoTo(n) => runner.with_session(|s| s.jump_to(n - 1)),
            QuizCommand::Submit => match submit(runner, settings, prompt, &mut ticker).await? {
                Some(result) => return Ok(Finished::Graded(result)),
                None => Ok(()),
            },
            QuizCommand::Quit => {
                match confirm_timed(runner, prompt, &mut ticker, "Quit without submitting?").await? {
                    Confirmed::Yes => return Ok(Finished::Quit),
                    Confirmed::Expired(result) => return Ok(Finished::Graded(result)),
                    Confirmed::No => Ok(()),
                }
            }
            QuizCommand::Help => {
                print_help();
                continue;
            }
        };

        if let Err(e) = outcome {
            println!("  {e}");
        }
        if runner.phase() == QuizPhase::Submitted {
            if let Some(result) = runner.with_session(|s| s.result().cloned()) {
                return Ok(Finished::Graded(result));
            }
        }
        print_question(&runner.snapshot());
    }
}

/// Advances the countdown; returns the result if time ran out.
async fn on_tick(runner: &AttemptRunner) -> Option<AttemptResult> {
    match runner.tick().await {
        Ok(Some(result)) => {
            println!();
            println!("Time is up. Your answers were submitted automatically.");
            return Some(result);
        }
        Ok(None) => {
            if let Some(left) = runner.with_session(|s| s.remaining_minutes()) {
                if left <= 5 {
                    println!("  {left} minute(s) left");
                }
            }
        }
        Err(e) => eprintln!("Automatic submission failed: {e}\nSubmit again with 's'."),
    }
    None
}

/// Asks a yes/no question without pausing the countdown.
async fn confirm_timed<R: AsyncBufRead + Unpin>(
    runner: &AttemptRunner,
    prompt: &mut Prompt<R>,
    ticker: &mut Interval,
    question: &str,
) -> anyhow::Result<Confirmed> {
    prompt.show(&confirm_question(question))?;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(result) = on_tick(runner).await {
                    return Ok(Confirmed::Expired(result));
                }
            }
            line = prompt.line() => {
                let yes = is_yes(line?.as_deref());
                return Ok(if yes { Confirmed::Yes } else { Confirmed::No });
            }
        }
    }
}

/// Submits, asking for confirmation when questions are unanswered.
///
/// Returns `None` if the learner backed out or the request failed; the
/// answers are kept either way.
async fn submit<R: AsyncBufRead + Unpin>(
    runner: &AttemptRunner,
    settings: &QuizSettings,
    prompt: &mut Prompt<R>,
    ticker: &mut Interval,
) -> anyhow::Result<Option<AttemptResult>> {
    let trigger = if settings.confirm_incomplete {
        SubmitTrigger::User
    } else {
        SubmitTrigger::UserConfirmed
    };

    let outcome = match runner.submit(trigger).await {
        Err(LecternError::ConfirmationRequired { unanswered }) => {
            let question = format!("{unanswered} question(s) unanswered. Submit anyway?");
            match confirm_timed(runner, prompt, ticker, &question).await? {
                Confirmed::Yes => runner.submit(SubmitTrigger::UserConfirmed).await,
                Confirmed::No => return Ok(None),
                Confirmed::Expired(result) => return Ok(Some(result)),
            }
        }
        other => other,
    };

    match outcome {
        Ok(result) => Ok(Some(result)),
        Err(e) => {
            println!("  Submission failed: {e}");
            if e.is_transient() {
                println!("  Your answers are kept; try 's' again.");
            }
            Ok(None)
        }
    }
}

// ============================================================================
// Output
// ============================================================================

fn print_intro(session: &QuizSession) {
    let quiz = session.quiz();
    println!("{}", quiz.title);
    if !quiz.description.is_empty() {
        println!("{}", quiz.description);
    }
    if !quiz.instructions.is_empty() {
        println!();
        println!("{}", quiz.instructions);
    }
    println!();
    println!("  Questions: {}", session.question_count());
    println!("  Passing score: {}%", quiz.passing_score);
    if let Some(limit) = quiz.time_limit_minutes {
        println!("  Time limit: {}", format_time_limit(limit));
    }
    println!("  Attempts remaining: {}", session.attempts_remaining());
    if let Some(best) = session.best_score() {
        println!("  Best score: {best:.1}%");
    }
    println!();
}

fn print_question(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };

    println!();
    let mut header = format!(
        "Question {}/{} ({} pt)  answered {}/{}",
        session.current_index() + 1,
        session.question_count(),
        question.points,
        session.answered_count(),
        session.question_count()
    );
    if let Some(left) = session.remaining_minutes() {
        header.push_str(&format!("  time left: {left} min"));
    }
    println!("{header}");
    println!("{}", question.question_text);

    let selected = session.answer_for(question.id);
    for choice in AnswerChoice::ALL {
        let marker = if selected == Some(choice) { '*' } else { ' ' };
        println!(" {marker} {choice}) {}", question.option(choice));
    }
}

fn print_help() {
    println!("  a-d answer | n next | p previous | g <number> go to | s submit | q quit");
}

fn print_result(result: &AttemptResult) {
    println!();
    println!(
        "Score: {:.2}% ({}/{} correct) - {}",
        result.score,
        result.correct_answers,
        result.total_questions,
        if result.passed { "PASSED" } else { "NOT PASSED" }
    );
    println!(
        "Attempt {} - {} attempt(s) remaining",
        result.attempt_number, result.remaining_attempts
    );

    for (i, q) in result.results.iter().enumerate() {
        let mark = if q.is_correct { "correct" } else { "wrong" };
        let given = q.user_answer.map_or("-", AnswerChoice::as_str);
        println!();
        println!("{}. {} [{mark}]", i + 1, q.question_text);
        println!("   your answer: {given}, correct: {}", q.correct_answer);
        if let Some(explanation) = q.explanation.as_deref().filter(|e| !e.is_empty()) {
            println!("   {explanation}");
        }
    }
}
