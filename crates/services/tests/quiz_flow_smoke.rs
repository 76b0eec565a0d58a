use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use quiz_core::model::{CategorySelection, Difficulty, Provenance};
use quiz_core::time::{fixed_clock, fixed_now};
use services::error::SourceError;
use services::{
    AdvanceOutcome, QuestionResolver, QuestionSource, QuizWorkflow, ResumeOutcome, StartInput,
    TickOutcome,
};
use services::source::QuestionFile;
use storage::repository::{SessionRecord, SessionStore, Storage};

fn workflow(storage: &Storage) -> QuizWorkflow {
    QuizWorkflow::new(QuestionResolver::generated_only(), storage.clone())
        .with_clock(fixed_clock())
}

fn start_input(amount: usize, seconds: u32, name: &str) -> StartInput {
    StartInput {
        amount,
        seconds_per_question: seconds,
        selection: CategorySelection::Any,
        difficulty: Difficulty::Any,
        player_name: name.to_owned(),
    }
}

#[tokio::test]
async fn offline_quiz_runs_to_completion_and_records_the_leaderboard() {
    let storage = Storage::in_memory();
    let workflow = workflow(&storage);

    let mut session = workflow.start(start_input(5, 20, "Asha")).await.unwrap();
    assert_eq!(session.state().total(), 5);
    assert_eq!(session.state().provenance(), Provenance::Generated);

    let mut expected_score = 0;
    for round in 0..5 {
        if round % 2 == 0 {
            let correct = session
                .state()
                .current_item()
                .unwrap()
                .correct_answer()
                .to_owned();
            workflow.select(&mut session, correct).await.unwrap();
            expected_score += 1;
        }
        workflow.submit(&mut session).await.unwrap();
        let outcome = workflow.advance(&mut session).await.unwrap();
        match outcome {
            AdvanceOutcome::Next { index, .. } => assert_eq!(index, round + 1),
            AdvanceOutcome::Finished(summary) => {
                assert_eq!(round, 4);
                assert_eq!(summary.score, expected_score);
                assert_eq!(summary.total, 5);
                assert_eq!(
                    summary.percentage,
                    (f64::from(expected_score) / 5.0 * 100.0).round() as u32
                );
            }
        }
    }
    assert!(session.is_finished());

    let board = workflow.leaderboard().await.unwrap();
    assert_eq!(board.len(), 1);
    let entry = &board.entries()[0];
    assert_eq!(entry.name, "Asha");
    assert_eq!(entry.score, expected_score);
    assert_eq!(entry.total, 5);
    assert_eq!(entry.recorded_at, fixed_now());
}

#[tokio::test]
async fn anonymous_players_get_a_default_leaderboard_name() {
    let storage = Storage::in_memory();
    let workflow = workflow(&storage);

    let mut session = workflow.start(start_input(5, 20, "  ")).await.unwrap();
    for _ in 0..5 {
        workflow.skip(&mut session).await.unwrap();
        workflow.advance(&mut session).await.unwrap();
    }
    let board = workflow.leaderboard().await.unwrap();
    assert_eq!(board.entries()[0].name, "Anonymous");
    assert_eq!(board.entries()[0].percentage, 0);
}

#[tokio::test]
async fn input_is_clamped_not_rejected() {
    let storage = Storage::in_memory();
    let workflow = workflow(&storage);

    let session = workflow.start(start_input(100, 2, "Asha")).await.unwrap();
    assert_eq!(session.state().total(), 20);
    assert_eq!(session.state().seconds_per_question(), 5);
}

#[tokio::test]
async fn snapshot_resumes_mid_question_with_exact_remaining_time() {
    let storage = Storage::in_memory();

    {
        let workflow = workflow(&storage);
        let mut session = workflow.start(start_input(5, 30, "Asha")).await.unwrap();
        let token = session.token();
        workflow.submit(&mut session).await.unwrap();
        workflow.advance(&mut session).await.unwrap();
        for _ in 0..7 {
            let outcome = workflow.tick(&mut session, token).await.unwrap();
            assert_eq!(outcome, TickOutcome::Ignored, "stale token must not tick");
        }
        let token = session.token();
        for _ in 0..7 {
            workflow.tick(&mut session, token).await.unwrap();
        }
        assert_eq!(session.state().timer_remaining(), 23);
    }

    // A new process restores the same question and countdown.
    let workflow = workflow(&storage);
    let ResumeOutcome::InProgress(resumed) = workflow.resume().await.unwrap() else {
        panic!("expected an in-progress session");
    };
    assert_eq!(resumed.state().current_index(), 1);
    assert_eq!(resumed.state().timer_remaining(), 23);
    assert_eq!(resumed.state().answered_count(), 1);
}

#[tokio::test]
async fn finished_snapshot_resumes_to_the_results_view() {
    let storage = Storage::in_memory();
    let workflow = workflow(&storage);

    let mut session = workflow.start(start_input(5, 20, "Asha")).await.unwrap();
    for _ in 0..5 {
        workflow.skip(&mut session).await.unwrap();
        workflow.advance(&mut session).await.unwrap();
    }

    let ResumeOutcome::Completed(summary) = workflow.resume().await.unwrap() else {
        panic!("expected a completed view");
    };
    assert_eq!(summary.total, 5);
    assert_eq!(summary.score, 0);
}

#[tokio::test]
async fn invalid_snapshot_is_discarded_for_a_fresh_start() {
    let storage = Storage::in_memory();
    let workflow = workflow(&storage);

    let session = workflow.start(start_input(5, 20, "Asha")).await.unwrap();
    let mut record = SessionRecord::from_state(session.state());
    record.score = 99;
    storage.sessions.save_session(&record).await.unwrap();

    assert!(matches!(
        workflow.resume().await.unwrap(),
        ResumeOutcome::Fresh
    ));
    assert!(storage.sessions.load_session().await.unwrap().is_none());
}

#[tokio::test]
async fn empty_store_resumes_fresh() {
    let storage = Storage::in_memory();
    let workflow = workflow(&storage);
    assert!(matches!(
        workflow.resume().await.unwrap(),
        ResumeOutcome::Fresh
    ));
}

#[tokio::test]
async fn reset_clears_the_snapshot_and_cancels_a_pending_start() {
    struct SlowSource;

    #[async_trait]
    impl QuestionSource for SlowSource {
        async fn fetch(&self) -> Result<QuestionFile, SourceError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(QuestionFile {
                questions: Vec::new(),
            })
        }
    }

    let storage = Storage::in_memory();
    let workflow = Arc::new(
        QuizWorkflow::new(
            QuestionResolver::with_source(Arc::new(SlowSource)),
            storage.clone(),
        )
        .with_clock(fixed_clock()),
    );

    let pending = {
        let workflow = Arc::clone(&workflow);
        tokio::spawn(async move { workflow.start(start_input(5, 20, "Asha")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    workflow.reset().await.unwrap();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(services::StartError::Cancelled)));
    assert!(storage.sessions.load_session().await.unwrap().is_none());
}

#[tokio::test]
async fn every_transition_persists_a_restorable_snapshot() {
    let storage = Storage::in_memory();
    let workflow = workflow(&storage);

    let mut session = workflow.start(start_input(5, 20, "Asha")).await.unwrap();
    let token = session.token();

    workflow.tick(&mut session, token).await.unwrap();
    let record = storage.sessions.load_session().await.unwrap().unwrap();
    assert_eq!(record.timer_remaining, 19);

    workflow
        .select(&mut session, "whatever".to_owned())
        .await
        .unwrap();
    let record = storage.sessions.load_session().await.unwrap().unwrap();
    assert_eq!(record.selected_option.as_deref(), Some("whatever"));

    workflow.submit(&mut session).await.unwrap();
    let record = storage.sessions.load_session().await.unwrap().unwrap();
    assert_eq!(record.answers.iter().flatten().count(), 1);

    let state = record.into_state().unwrap();
    assert_eq!(state.answered_count(), 1);
}
