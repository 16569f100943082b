//! Plain-text screens for the terminal shell.

use std::fmt::Write as _;

use services::QuizView;
use trivia_core::ScoreSummary;
use trivia_core::model::{QuizPhase, UserAnswer, Username};

pub fn question_screen(view: &QuizView) -> String {
    let Some(question) = view.question.as_ref() else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nQuestion {} of {}  ({}s left)",
        view.question_number(),
        view.total,
        view.time_remaining
    );
    let _ = writeln!(out, "Questions answered: {} / {}", view.answered, view.total);
    let _ = writeln!(out, "{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        let _ = writeln!(out, "  {}) {option}", i + 1);
    }
    out.push_str("Your answer: ");
    out
}

/// Only announce round numbers and the last few seconds.
pub fn should_announce(remaining: u32) -> bool {
    remaining <= 5 || remaining % 10 == 0
}

pub fn clock_line(remaining: u32) -> String {
    match remaining {
        1 => "  1 second left".to_string(),
        n => format!("  {n} seconds left"),
    }
}

pub fn results_screen(user: &Username, score: &ScoreSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nWell done, {user}!");
    let _ = writeln!(out, "Total questions:   {}", score.total());
    let _ = writeln!(out, "Correct answers:   {}", score.correct());
    let _ = writeln!(out, "Incorrect answers: {}", score.incorrect());
    let _ = writeln!(out, "Score:             {} / {}", score.correct(), score.total());
    let _ = writeln!(out, "Percentage:        {:.2}%\n", score.percentage());
    for (i, outcome) in score.outcomes().iter().enumerate() {
        let mark = if outcome.is_correct { "+" } else { "-" };
        let chosen = match &outcome.chosen {
            UserAnswer::Answered(text) => text.as_str(),
            UserAnswer::NoAnswer => "(no answer)",
        };
        let _ = writeln!(out, "{mark} {}. {}", i + 1, outcome.prompt);
        let _ = writeln!(out, "    your answer: {chosen}");
        if !outcome.is_correct {
            let _ = writeln!(out, "    correct answer: {}", outcome.correct_answer);
        }
    }
    out.push_str("\nType 'restart' to play again or 'home' to sign out.");
    out
}

pub fn phase_screen(user: &Username, view: &QuizView, score: Option<&ScoreSummary>) -> String {
    match &view.phase {
        QuizPhase::Active => question_screen(view),
        QuizPhase::Complete => score.map_or_else(String::new, |s| results_screen(user, s)),
        QuizPhase::Error { message } => {
            format!("\n{message}\nType 'restart' to try again or 'home' to sign out.")
        }
        QuizPhase::Idle | QuizPhase::Loading => "Loading questions...".to_string(),
    }
}

pub fn help() -> &'static str {
    "Commands:\n  <number>  pick an answer\n  restart   start a new quiz\n  home      sign out\n  quit      leave (progress is kept)"
}
