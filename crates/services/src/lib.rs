#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod fetch_policy;
pub mod login_service;
pub mod question_source;
pub mod sessions;

pub use app_services::AppServices;
pub use config::QuizConfig;
pub use error::{AppServicesError, ConfigError, FetchError, LoginError, QuizError};
pub use fetch_policy::FetchPolicy;
pub use login_service::LoginService;
pub use question_source::{Difficulty, OpenTdbSource, QuestionQuery, QuestionSource};

pub use sessions::{
    CountdownTimer, QuizDriver, QuizEngine, QuizSettings, QuizView, TimerEvent, Transition,
};
