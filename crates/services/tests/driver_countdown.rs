use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use services::{
    AppServices, FetchError, FetchPolicy, QuestionQuery, QuestionSource, QuizDriver, QuizSettings,
    TimerEvent, Transition,
};
use storage::{InMemoryStore, KeyValueStore, QUIZ_STATE_KEY, Storage};
use trivia_core::model::{QuestionDraft, QuizPhase, SessionState, UserAnswer};

const LIMIT: u32 = 3;

struct ThreeCapitals;

#[async_trait]
impl QuestionSource for ThreeCapitals {
    async fn fetch(&self, _query: &QuestionQuery) -> Result<Vec<QuestionDraft>, FetchError> {
        Ok([("France", "Paris"), ("Italy", "Rome"), ("Spain", "Madrid")]
            .into_iter()
            .map(|(country, capital)| QuestionDraft {
                prompt: format!("Capital of {country}?"),
                correct_answer: capital.to_string(),
                incorrect_answers: vec!["Berlin".to_string(), "Oslo".to_string()],
            })
            .collect())
    }
}

fn services(kv: &InMemoryStore) -> AppServices {
    AppServices::from_parts(
        Storage {
            kv: Arc::new(kv.clone()),
        },
        Arc::new(ThreeCapitals),
        QuizSettings {
            query: QuestionQuery {
                amount: 3,
                ..QuestionQuery::default()
            },
            fetch_policy: FetchPolicy::new(1, Duration::ZERO, Duration::ZERO),
            time_limit_secs: LIMIT,
            shuffle_seed: Some(11),
        },
    )
}

async fn pump(driver: &mut QuizDriver) -> (TimerEvent, Transition) {
    let event = driver.next_timer_event().await.expect("timer channel open");
    let transition = driver.handle_timer_event(event).await.unwrap();
    (event, transition)
}

async fn persisted(kv: &InMemoryStore) -> SessionState {
    let blob = kv.read(QUIZ_STATE_KEY).await.unwrap().expect("persisted state");
    serde_json::from_str(&blob).unwrap()
}

#[tokio::test(start_paused = true)]
async fn countdown_ticks_are_persisted_then_expiry_advances() {
    let kv = InMemoryStore::new();
    let mut driver = services(&kv).quiz_driver();
    assert_eq!(driver.start().await.unwrap(), QuizPhase::Active);
    assert_eq!(driver.view().time_remaining, LIMIT);

    let (_, transition) = pump(&mut driver).await;
    assert_eq!(transition, Transition::Ticked { remaining: 2 });
    assert_eq!(persisted(&kv).await.time_remaining(), 2);

    let (_, transition) = pump(&mut driver).await;
    assert_eq!(transition, Transition::Ticked { remaining: 1 });

    let (event, transition) = pump(&mut driver).await;
    assert!(matches!(event, TimerEvent::Expired { question: 0, .. }));
    assert_eq!(transition, Transition::Advanced { index: 1 });

    let state = persisted(&kv).await;
    assert_eq!(state.answers(), &[UserAnswer::NoAnswer]);
    assert_eq!(state.current_index(), 1);
    assert_eq!(state.time_remaining(), LIMIT);

    // The clock restarted for the new question.
    let (event, _) = pump(&mut driver).await;
    assert_eq!(event.question(), 1);
}

#[tokio::test(start_paused = true)]
async fn timing_out_every_question_completes_with_zero_score() {
    let kv = InMemoryStore::new();
    let mut driver = services(&kv).quiz_driver();
    driver.start().await.unwrap();

    let mut completed = false;
    while !completed {
        let (_, transition) = pump(&mut driver).await;
        completed = transition == Transition::Completed;
    }

    assert_eq!(driver.view().phase, QuizPhase::Complete);
    assert_eq!(driver.view().time_remaining, 0);
    let score = driver.score().unwrap();
    assert_eq!(score.total(), 3);
    assert_eq!(score.correct(), 0);
    assert!(score.outcomes().iter().all(|o| o.chosen.is_timeout()));

    // The clock is stopped once the quiz is over.
    let silent = tokio::time::timeout(Duration::from_secs(10), driver.next_timer_event()).await;
    assert!(silent.is_err());
}

#[tokio::test(start_paused = true)]
async fn answering_cancels_the_pending_expiry() {
    let kv = InMemoryStore::new();
    let mut driver = services(&kv).quiz_driver();
    driver.start().await.unwrap();
    pump(&mut driver).await;
    pump(&mut driver).await;

    // One second left; the expiry for question 0 is about to fire.
    tokio::time::sleep(Duration::from_millis(999)).await;
    let transition = driver.submit_answer("Paris").await.unwrap();
    assert_eq!(transition, Transition::Advanced { index: 1 });

    let (event, transition) = pump(&mut driver).await;
    assert_eq!(event.question(), 1);
    assert_eq!(transition, Transition::Ticked { remaining: 2 });
    assert_eq!(driver.engine().state().answers(), &[UserAnswer::answered("Paris")]);
}

#[tokio::test(start_paused = true)]
async fn stale_event_is_ignored_after_restart() {
    let kv = InMemoryStore::new();
    let mut driver = services(&kv).quiz_driver();
    driver.start().await.unwrap();
    let (stale, _) = pump(&mut driver).await;

    driver.restart().await.unwrap();
    assert_eq!(
        driver.handle_timer_event(stale).await.unwrap(),
        Transition::Ignored
    );
    assert_eq!(driver.view().time_remaining, LIMIT);
}

#[tokio::test(start_paused = true)]
async fn resumed_quiz_counts_down_from_saved_clock() {
    let kv = InMemoryStore::new();
    let services = services(&kv);

    let mut first = services.quiz_driver();
    first.start().await.unwrap();
    first.submit_answer("Paris").await.unwrap();
    pump(&mut first).await;
    drop(first);

    let mut second = services.quiz_driver();
    second.start().await.unwrap();
    assert_eq!(second.view().current_index, 1);
    assert_eq!(second.view().time_remaining, 2);

    let (_, transition) = pump(&mut second).await;
    assert_eq!(transition, Transition::Ticked { remaining: 1 });
    let (event, transition) = pump(&mut second).await;
    assert!(matches!(event, TimerEvent::Expired { question: 1, .. }));
    assert_eq!(transition, Transition::Advanced { index: 2 });
}

#[tokio::test(start_paused = true)]
async fn reset_stops_the_clock_and_clears_state() {
    let kv = InMemoryStore::new();
    let mut driver = services(&kv).quiz_driver();
    driver.start().await.unwrap();

    driver.reset().await.unwrap();
    assert_eq!(kv.read(QUIZ_STATE_KEY).await.unwrap(), None);
    assert_eq!(driver.view().phase, QuizPhase::Idle);
    let silent = tokio::time::timeout(Duration::from_secs(5), driver.next_timer_event()).await;
    assert!(silent.is_err());
}
