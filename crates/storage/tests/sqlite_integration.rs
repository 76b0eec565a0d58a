use quiz_core::model::{
    CategorySelection, Difficulty, Leaderboard, LeaderboardEntry, Provenance, QuizConfig,
    QuizItem, SessionMeta, SessionState,
};
use quiz_core::time::fixed_now;
use storage::repository::{
    LeaderboardStore, PreferenceStore, SessionRecord, SessionStore, StorageError, ThemePreference,
};
use storage::sqlite::SqliteStore;

fn build_record() -> SessionRecord {
    let item = QuizItem::new(
        "Speed & Distance".into(),
        "A car travels 120 km at 60 km/h. How many hours does it take?".into(),
        "2 hours".into(),
        vec![
            "2 hours".into(),
            "2.5 hours".into(),
            "1.5 hours".into(),
            "3 hours".into(),
        ],
        "Use t = d / s. t = 120 / 60 = 2 hours.".into(),
    )
    .unwrap();
    let mut state = SessionState::new(
        vec![item.clone(), item],
        QuizConfig::clamped(5, 30),
        Provenance::Mixed,
        SessionMeta {
            difficulty: Difficulty::Any,
            category: CategorySelection::Any,
            player_name: "Ravi".into(),
        },
    );
    state.set_selection(Some("2 hours".into()));
    state.submit_current().unwrap();
    state.advance();
    state.tick_down();
    SessionRecord::from_state(&state)
}

#[tokio::test]
async fn sqlite_round_trips_the_session_snapshot() {
    let store = SqliteStore::connect("sqlite:file:memdb_session?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    assert!(store.load_session().await.unwrap().is_none());

    let record = build_record();
    store.save_session(&record).await.unwrap();
    let loaded = store.load_session().await.unwrap().expect("snapshot");
    assert_eq!(loaded, record);

    // Restoring yields an equivalent live state.
    let state = loaded.into_state().unwrap();
    assert_eq!(state.score(), 1);
    assert_eq!(state.current_index(), 1);
    assert_eq!(state.timer_remaining(), 29);

    store.clear_session().await.unwrap();
    assert!(store.load_session().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_overwrites_on_save() {
    let store = SqliteStore::connect("sqlite:file:memdb_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    let mut record = build_record();
    store.save_session(&record).await.unwrap();
    record.timer_remaining = 5;
    store.save_session(&record).await.unwrap();

    let loaded = store.load_session().await.unwrap().expect("snapshot");
    assert_eq!(loaded.timer_remaining, 5);
}

#[tokio::test]
async fn corrupt_session_value_surfaces_as_serialization_error() {
    let store = SqliteStore::connect("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    sqlx::query("INSERT INTO kv_store (key, value) VALUES ('quiz_session_v2', 'not json')")
        .execute(store.pool())
        .await
        .unwrap();

    let err = store.load_session().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn sqlite_round_trips_leaderboard_and_theme() {
    let store = SqliteStore::connect("sqlite:file:memdb_board?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    assert!(store.load_leaderboard().await.unwrap().is_empty());

    let mut board = Leaderboard::new();
    board.record(LeaderboardEntry {
        name: "Ravi".into(),
        score: 9,
        total: 10,
        percentage: 90,
        recorded_at: fixed_now(),
    });
    store.save_leaderboard(&board).await.unwrap();
    assert_eq!(store.load_leaderboard().await.unwrap(), board);

    assert!(store.theme().await.unwrap().is_none());
    store.set_theme(ThemePreference::Dark).await.unwrap();
    assert_eq!(store.theme().await.unwrap(), Some(ThemePreference::Dark));
}
