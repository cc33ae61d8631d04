use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::Result;
use crate::games::GameId;

pub const HIGH_SCORES_KEY: &str = "mindChillHighScores";
const UNSET_MARKER: &str = "N/A";

/// Which way a score improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMetric
{
    /// Points: bigger wins.
    HigherIsBetter,
    /// Elapsed seconds: faster wins. Displayed as `mm:ss`.
    LowerIsBetter,
}

impl ScoreMetric
{
    pub fn improves(self, score: u32, previous: BestScore) -> bool
    {
        match (self, previous) {
            (_, BestScore::Unset) => true,
            (ScoreMetric::HigherIsBetter, BestScore::Value(best)) => score > best,
            (ScoreMetric::LowerIsBetter, BestScore::Value(best)) => score < best,
        }
    }

    pub fn format(self, score: u32) -> String
    {
        match self {
            ScoreMetric::HigherIsBetter => score.to_string(),
            ScoreMetric::LowerIsBetter => format!("{:02}:{:02}", score / 60, score % 60),
        }
    }

    pub fn format_best(self, best: BestScore) -> String
    {
        match best {
            BestScore::Value(score) => self.format(score),
            BestScore::Unset => UNSET_MARKER.to_string(),
        }
    }

    /// HUD label, e.g. `Score: 340` or `Time: 02:05`.
    pub fn label(self, score: u32) -> String
    {
        match self {
            ScoreMetric::HigherIsBetter => format!("Score: {}", self.format(score)),
            ScoreMetric::LowerIsBetter => format!("Time: {}", self.format(score)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestScore
{
    Unset,
    Value(u32),
}

impl Serialize for BestScore
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    {
        match self {
            BestScore::Unset => serializer.serialize_str(UNSET_MARKER),
            BestScore::Value(score) => serializer.serialize_u32(*score),
        }
    }
}

impl<'de> Deserialize<'de> for BestScore
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error>
    {
        struct BestScoreVisitor;

        impl Visitor<'_> for BestScoreVisitor
        {
            type Value = BestScore;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result
            {
                write!(f, "a non-negative score or \"{UNSET_MARKER}\"")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<BestScore, E>
            {
                u32::try_from(value)
                    .map(BestScore::Value)
                    .map_err(|_| E::custom("score out of range"))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<BestScore, E>
            {
                u32::try_from(value)
                    .map(BestScore::Value)
                    .map_err(|_| E::custom("score out of range"))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<BestScore, E>
            {
                if value == UNSET_MARKER {
                    Ok(BestScore::Unset)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(value), &self))
                }
            }
        }

        deserializer.deserialize_any(BestScoreVisitor)
    }
}

/// The persisted record: one best score per game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScores
{
    scores: BTreeMap<GameId, BestScore>,
}

impl Default for HighScores
{
    fn default() -> Self
    {
        let scores = GameId::ALL
            .iter()
            .map(|game| (*game, game.default_best()))
            .collect();
        Self { scores }
    }
}

impl HighScores
{
    pub fn get(&self, game: GameId) -> BestScore
    {
        self.scores
            .get(&game)
            .copied()
            .unwrap_or_else(|| game.default_best())
    }

    pub fn set(&mut self, game: GameId, score: u32)
    {
        self.scores.insert(game, BestScore::Value(score));
    }

    pub fn iter(&self) -> impl Iterator<Item = (GameId, BestScore)> + '_
    {
        self.scores.iter().map(|(game, best)| (*game, *best))
    }

    /// Adds default entries for games the record does not mention. Returns
    /// whether anything was added.
    fn fill_missing(&mut self) -> bool
    {
        let mut changed = false;
        for game in GameId::ALL {
            if !self.scores.contains_key(&game) {
                self.scores.insert(game, game.default_best());
                changed = true;
            }
        }
        changed
    }
}

/// Durable key/value collaborator.
pub trait KeyValueStore
{
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore
{
    values: HashMap<String, String>,
}

impl MemoryStore
{
    pub fn new() -> Self
    {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore
{
    fn get(&self, key: &str) -> Option<String>
    {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()>
    {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore
{
    dir: PathBuf,
}

impl FileStore
{
    pub fn new(dir: impl Into<PathBuf>) -> Self
    {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf
    {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore
{
    fn get(&self, key: &str) -> Option<String>
    {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()>
    {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// Best score per game on top of a [`KeyValueStore`].
///
/// `set` is an unconditional overwrite; deciding whether a score is an
/// improvement belongs to the session controller.
#[derive(Debug)]
pub struct HighScoreStore<K>
{
    backend: K,
    cache: HighScores,
}

impl<K: KeyValueStore> HighScoreStore<K>
{
    pub fn new(backend: K) -> Self
    {
        Self {
            backend,
            cache: HighScores::default(),
        }
    }

    /// Loads the record, replacing a missing or malformed one with defaults.
    pub fn ensure_initialized(&mut self) -> Result<()>
    {
        let loaded = match self.backend.get(HIGH_SCORES_KEY) {
            None => {
                debug!("no high score record, writing defaults");
                None
            }
            Some(raw) => match serde_json::from_str::<HighScores>(&raw) {
                Ok(scores) => Some(scores),
                Err(err) => {
                    warn!("high score record is malformed ({err}), resetting to defaults");
                    None
                }
            },
        };

        match loaded {
            Some(mut scores) => {
                let patched = scores.fill_missing();
                self.cache = scores;
                if patched {
                    self.persist()?;
                }
            }
            None => {
                self.cache = HighScores::default();
                self.persist()?;
            }
        }
        Ok(())
    }

    pub fn get(&self, game: GameId) -> BestScore
    {
        self.cache.get(game)
    }

    pub fn set(&mut self, game: GameId, score: u32) -> Result<()>
    {
        self.cache.set(game, score);
        self.persist()
    }

    pub fn all(&self) -> &HighScores
    {
        &self.cache
    }

    pub fn backend(&self) -> &K
    {
        &self.backend
    }

    fn persist(&mut self) -> Result<()>
    {
        let text = serde_json::to_string(&self.cache)?;
        self.backend.set(HIGH_SCORES_KEY, &text)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn higher_is_better_needs_a_strict_improvement()
    {
        let metric = ScoreMetric::HigherIsBetter;
        assert!(metric.improves(51, BestScore::Value(50)));
        assert!(!metric.improves(50, BestScore::Value(50)));
        assert!(!metric.improves(30, BestScore::Value(50)));
    }

    #[test]
    fn lower_is_better_accepts_unset_or_faster()
    {
        let metric = ScoreMetric::LowerIsBetter;
        assert!(metric.improves(90, BestScore::Unset));
        assert!(metric.improves(89, BestScore::Value(90)));
        assert!(!metric.improves(90, BestScore::Value(90)));
        assert!(!metric.improves(120, BestScore::Value(90)));
    }

    #[test]
    fn formatting_matches_the_metric()
    {
        assert_eq!(ScoreMetric::LowerIsBetter.format(125), "02:05");
        assert_eq!(ScoreMetric::HigherIsBetter.format(340), "340");
        assert_eq!(ScoreMetric::LowerIsBetter.label(5), "Time: 00:05");
        assert_eq!(ScoreMetric::HigherIsBetter.label(10), "Score: 10");
        assert_eq!(ScoreMetric::LowerIsBetter.format_best(BestScore::Unset), "N/A");
    }

    #[test]
    fn record_uses_camel_case_keys_and_na_for_unset()
    {
        let json = serde_json::to_string(&HighScores::default()).expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["snake"], 0);
        assert_eq!(value["ballDash"], 0);
        assert_eq!(value["memoryMatch"], "N/A");
        assert_eq!(value.as_object().map(|obj| obj.len()), Some(6));
    }

    #[test]
    fn ensure_initialized_writes_defaults_once()
    {
        let mut store = HighScoreStore::new(MemoryStore::new());
        store.ensure_initialized().expect("init");
        assert_eq!(store.get(GameId::BallDash), BestScore::Value(0));
        assert_eq!(store.get(GameId::MemoryMatch), BestScore::Unset);
        assert!(store.backend().get(HIGH_SCORES_KEY).is_some());

        store.set(GameId::Snake, 70).expect("set");
        store.ensure_initialized().expect("re-init");
        assert_eq!(store.get(GameId::Snake), BestScore::Value(70));
    }

    #[test]
    fn malformed_record_is_replaced()
    {
        let mut backend = MemoryStore::new();
        backend.set(HIGH_SCORES_KEY, "{not json").expect("seed");
        let mut store = HighScoreStore::new(backend);
        store.ensure_initialized().expect("init");
        assert_eq!(store.all(), &HighScores::default());

        let raw = store.backend().get(HIGH_SCORES_KEY).expect("rewritten");
        assert!(serde_json::from_str::<HighScores>(&raw).is_ok());
    }

    #[test]
    fn wrong_value_types_count_as_malformed()
    {
        let mut backend = MemoryStore::new();
        backend
            .set(HIGH_SCORES_KEY, r#"{"snake":"lots","tetris":0}"#)
            .expect("seed");
        let mut store = HighScoreStore::new(backend);
        store.ensure_initialized().expect("init");
        assert_eq!(store.get(GameId::Snake), BestScore::Value(0));
    }

    #[test]
    fn partial_record_is_completed()
    {
        let mut backend = MemoryStore::new();
        backend
            .set(HIGH_SCORES_KEY, r#"{"snake":120,"memoryMatch":42}"#)
            .expect("seed");
        let mut store = HighScoreStore::new(backend);
        store.ensure_initialized().expect("init");
        assert_eq!(store.get(GameId::Snake), BestScore::Value(120));
        assert_eq!(store.get(GameId::MemoryMatch), BestScore::Value(42));
        assert_eq!(store.get(GameId::TargetClick), BestScore::Value(0));
        assert_eq!(store.all().iter().count(), 6);
    }

    #[test]
    fn file_store_round_trips_through_disk()
    {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = HighScoreStore::new(FileStore::new(dir.path().join("data")));
        store.ensure_initialized().expect("init");
        store.set(GameId::Tetris, 800).expect("set");

        let mut reopened = HighScoreStore::new(FileStore::new(dir.path().join("data")));
        reopened.ensure_initialized().expect("init");
        assert_eq!(reopened.get(GameId::Tetris), BestScore::Value(800));
    }
}
