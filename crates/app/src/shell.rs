use std::error::Error;
use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info};

use services::{AppServices, LoginError, QuizDriver, Transition};
use trivia_core::model::Username;

use crate::render;

type ShellResult<T> = Result<T, Box<dyn Error>>;

/// A line typed while a quiz is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Choice(usize),
    Restart,
    Home,
    Quit,
    Help,
    Unknown,
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Ok(n) = line.parse::<usize>() {
            return Self::Choice(n);
        }
        match line.to_ascii_lowercase().as_str() {
            "restart" | "r" => Self::Restart,
            "home" | "h" => Self::Home,
            "quit" | "q" | "exit" => Self::Quit,
            "help" | "?" => Self::Help,
            _ => Self::Unknown,
        }
    }
}

enum Exit {
    Quit,
    Home,
}

/// Line-oriented front end over `AppServices`.
pub struct Shell {
    services: AppServices,
    lines: Lines<BufReader<Stdin>>,
}

impl Shell {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    pub async fn run(mut self) -> ShellResult<()> {
        let login = self.services.login();
        loop {
            let user = match login.current_user().await? {
                Some(user) => {
                    println!("Welcome back, {user}!");
                    user
                }
                None => match self.sign_in().await? {
                    Some(user) => user,
                    None => return Ok(()),
                },
            };

            match self.play(&user).await? {
                Exit::Quit => return Ok(()),
                Exit::Home => login.logout().await?,
            }
        }
    }

    async fn sign_in(&mut self) -> ShellResult<Option<Username>> {
        let login = self.services.login();
        loop {
            prompt("Enter your name: ");
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            match login.login(&line).await {
                Ok(user) => {
                    println!("Hello, {user}! Type 'help' at any time for commands.");
                    return Ok(Some(user));
                }
                Err(LoginError::Username(err)) => println!("{err}"),
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn play(&mut self, user: &Username) -> ShellResult<Exit> {
        let mut driver = self.services.quiz_driver();
        println!("Loading questions...");
        driver.start().await?;
        show(&driver, user);

        loop {
            tokio::select! {
                line = self.lines.next_line() => {
                    let Some(line) = line? else {
                        return Ok(Exit::Quit);
                    };
                    match Input::parse(&line) {
                        Input::Quit => return Ok(Exit::Quit),
                        Input::Home => {
                            driver.reset().await?;
                            return Ok(Exit::Home);
                        }
                        Input::Restart => {
                            println!("Loading questions...");
                            driver.restart().await?;
                            show(&driver, user);
                        }
                        Input::Help => println!("{}", render::help()),
                        Input::Choice(n) => choose(&mut driver, user, n).await?,
                        Input::Unknown => println!("Type an answer number, or 'help'."),
                    }
                }
                Some(event) = driver.next_timer_event() => {
                    match driver.handle_timer_event(event).await? {
                        Transition::Ticked { remaining } if render::should_announce(remaining) => {
                            println!("{}", render::clock_line(remaining));
                        }
                        Transition::Advanced { .. } | Transition::Completed => {
                            println!("\nTime's up!");
                            show(&driver, user);
                        }
                        Transition::Ticked { .. } | Transition::Ignored => {}
                    }
                }
            }
        }
    }
}

async fn choose(driver: &mut QuizDriver, user: &Username, number: usize) -> ShellResult<()> {
    let view = driver.view();
    let picked = view
        .question
        .as_ref()
        .and_then(|q| number.checked_sub(1).and_then(|i| q.options().get(i)))
        .cloned();

    let Some(answer) = picked else {
        match view.question {
            Some(q) => println!("Pick a number from 1 to {}.", q.options().len()),
            None => println!("There is no question to answer. Type 'restart' or 'home'."),
        }
        return Ok(());
    };

    debug!(question = view.current_index, "answer submitted");
    if driver.submit_answer(&answer).await? != Transition::Ignored {
        show(driver, user);
    }
    Ok(())
}

fn show(driver: &QuizDriver, user: &Username) {
    let score = driver.score();
    if let Some(score) = &score {
        info!(
            correct = score.correct(),
            total = score.total(),
            "showing results"
        );
    }
    prompt(&render::phase_screen(user, &driver.view(), score.as_ref()));
}

fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_commands() {
        assert_eq!(Input::parse(" 2 "), Input::Choice(2));
        assert_eq!(Input::parse("RESTART"), Input::Restart);
        assert_eq!(Input::parse("home"), Input::Home);
        assert_eq!(Input::parse("q"), Input::Quit);
        assert_eq!(Input::parse("?"), Input::Help);
        assert_eq!(Input::parse("Paris"), Input::Unknown);
    }
}
