//! High-score persistence against the file-backed store.

use std::fs;

use mind_chill::games::GameId;
use mind_chill::scheduler::ManualScheduler;
use mind_chill::scores::{BestScore, FileStore, HIGH_SCORES_KEY, HighScoreStore};
use mind_chill::session::SessionController;
use mind_chill::surface::SurfaceSize;

fn record_path(dir: &tempfile::TempDir) -> std::path::PathBuf
{
    dir.path().join(format!("{HIGH_SCORES_KEY}.json"))
}

fn read_record(dir: &tempfile::TempDir) -> serde_json::Value
{
    let raw = fs::read_to_string(record_path(dir)).expect("record file");
    serde_json::from_str(&raw).expect("valid json")
}

#[test]
fn first_run_writes_the_default_record()
{
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = HighScoreStore::new(FileStore::new(dir.path()));
    store.ensure_initialized().expect("init");

    let record = read_record(&dir);
    assert_eq!(record.as_object().map(|map| map.len()), Some(6));
    assert_eq!(record["snake"], 0);
    assert_eq!(record["memoryMatch"], "N/A");
    assert_eq!(store.get(GameId::BallDash), BestScore::Value(0));
}

#[test]
fn malformed_record_is_replaced_with_defaults()
{
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(record_path(&dir), "{ this is not json").expect("write");

    let mut store = HighScoreStore::new(FileStore::new(dir.path()));
    store.ensure_initialized().expect("init");

    assert_eq!(store.get(GameId::Tetris), BestScore::Value(0));
    assert_eq!(store.get(GameId::MemoryMatch), BestScore::Unset);
    assert_eq!(read_record(&dir)["tetris"], 0);
}

#[test]
fn partial_record_keeps_known_entries_and_fills_the_rest()
{
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(record_path(&dir), r#"{"snake":120,"memoryMatch":75}"#).expect("write");

    let mut store = HighScoreStore::new(FileStore::new(dir.path()));
    store.ensure_initialized().expect("init");

    assert_eq!(store.get(GameId::Snake), BestScore::Value(120));
    assert_eq!(store.get(GameId::MemoryMatch), BestScore::Value(75));
    assert_eq!(store.get(GameId::TargetClick), BestScore::Value(0));
    let record = read_record(&dir);
    assert_eq!(record.as_object().map(|map| map.len()), Some(6));
    assert_eq!(record["snake"], 120);
}

#[test]
fn best_scores_survive_a_new_controller()
{
    let dir = tempfile::tempdir().expect("tempdir");
    let available = SurfaceSize::new(1000, 1000);
    {
        let mut hub = SessionController::with_seed(
            ManualScheduler::new(),
            FileStore::new(dir.path()),
            available,
            7,
        )
        .expect("controller");
        hub.start_game(GameId::MemoryMatch);
        let summary = hub.stop().expect("stop");
        assert!(summary.is_new_high_score);
    }

    let hub = SessionController::with_seed(
        ManualScheduler::new(),
        FileStore::new(dir.path()),
        available,
        8,
    )
    .expect("controller");
    assert_eq!(hub.best_score_text(GameId::MemoryMatch), "00:00");
    assert_eq!(hub.best_score_text(GameId::Snake), "0");
}
