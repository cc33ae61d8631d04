//! The shared game-session engine.
//!
//! [`SessionController`] owns the only [`Session`], the active module, the
//! frame scheduler, and the high-score store. Every lifecycle transition
//! goes through it, and every transition that leaves a module cancels that
//! module's tick before anything new is scheduled.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::error::{HubError, Result};
use crate::games::{self, GameId, GameModule};
use crate::input::InputEvent;
use crate::scheduler::{Scheduler, TickHandle};
use crate::scores::{HighScoreStore, KeyValueStore, ScoreMetric};
use crate::surface::{Canvas, SurfaceSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status
{
    Idle,
    Running,
    Over,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session
{
    pub active_game: Option<GameId>,
    pub score: u32,
    pub status: Status,
    pub loop_handle: Option<TickHandle>,
}

impl Default for Session
{
    fn default() -> Self
    {
        Self {
            active_game: None,
            score: 0,
            status: Status::Idle,
            loop_handle: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudView
{
    pub title: &'static str,
    pub score_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOverSummary
{
    pub game: GameId,
    pub final_score: u32,
    pub final_score_text: String,
    pub is_new_high_score: bool,
    pub best_score_text: String,
}

impl GameOverSummary
{
    pub fn message(&self) -> String
    {
        if self.is_new_high_score {
            return "New High Score!".to_string();
        }
        match self.game.metric() {
            ScoreMetric::LowerIsBetter => {
                format!("Best Time: {}", self.best_score_text)
            }
            ScoreMetric::HigherIsBetter => {
                format!("High Score: {}", self.best_score_text)
            }
        }
    }
}

pub struct SessionController<S, K>
{
    session: Session,
    module: Option<Box<dyn GameModule>>,
    scheduler: S,
    scores: HighScoreStore<K>,
    rng: StdRng,
    available: SurfaceSize,
    surface_size: SurfaceSize,
    last_timestamp: Option<Duration>,
    summary: Option<GameOverSummary>,
}

impl<S: Scheduler, K: KeyValueStore> SessionController<S, K>
{
    /// Builds an Idle controller and loads the high-score record.
    pub fn new(scheduler: S, backend: K, available: SurfaceSize) -> Result<Self>
    {
        Self::with_rng(scheduler, backend, available, StdRng::from_entropy())
    }

    /// Like [`SessionController::new`] with reproducible game layouts.
    pub fn with_seed(scheduler: S, backend: K, available: SurfaceSize, seed: u64) -> Result<Self>
    {
        Self::with_rng(scheduler, backend, available, StdRng::seed_from_u64(seed))
    }

    fn with_rng(scheduler: S, backend: K, available: SurfaceSize, rng: StdRng) -> Result<Self>
    {
        let mut scores = HighScoreStore::new(backend);
        scores.ensure_initialized()?;
        Ok(Self {
            session: Session::default(),
            module: None,
            scheduler,
            scores,
            rng,
            available,
            surface_size: SurfaceSize::new(0, 0),
            last_timestamp: None,
            summary: None,
        })
    }

    pub fn session(&self) -> &Session
    {
        &self.session
    }

    pub fn status(&self) -> Status
    {
        self.session.status
    }

    pub fn active_game(&self) -> Option<GameId>
    {
        self.session.active_game
    }

    pub fn score(&self) -> u32
    {
        self.session.score
    }

    pub fn surface_size(&self) -> SurfaceSize
    {
        self.surface_size
    }

    pub fn scheduler(&self) -> &S
    {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S
    {
        &mut self.scheduler
    }

    pub fn scores(&self) -> &HighScoreStore<K>
    {
        &self.scores
    }

    pub fn summary(&self) -> Option<&GameOverSummary>
    {
        self.summary.as_ref()
    }

    /// Starts the game named `name`. Unknown names leave the session untouched.
    pub fn start(&mut self, name: &str) -> Result<()>
    {
        let game: GameId = name.parse()?;
        self.start_game(game);
        Ok(())
    }

    pub fn start_game(&mut self, game: GameId)
    {
        let module = games::create(game, self.rng.r#gen());
        self.start_module(module);
    }

    /// Starts an already built, uninitialized module under its own id.
    pub fn start_module(&mut self, mut module: Box<dyn GameModule>)
    {
        let game = module.id();
        self.halt();
        self.summary = None;
        self.session.active_game = Some(game);
        self.session.score = 0;
        self.session.status = Status::Running;
        self.surface_size = game.surface_size(self.available);

        module.init(self.surface_size);
        self.module = Some(module);
        self.last_timestamp = None;
        self.session.loop_handle = Some(self.scheduler.request_tick());
        info!(%game, width = self.surface_size.width, height = self.surface_size.height, "session started");
    }

    /// Game-over path: stops the loop, scores the run, and persists a new best.
    pub fn stop(&mut self) -> Result<GameOverSummary>
    {
        if self.session.status != Status::Running {
            return Err(HubError::NotRunning);
        }
        let game = self.session.active_game.ok_or(HubError::NotRunning)?;
        self.halt();
        self.session.status = Status::Over;

        let score = self.session.score;
        let metric = game.metric();
        let previous = self.scores.get(game);
        let is_new_high_score = metric.improves(score, previous);
        if is_new_high_score {
            if let Err(err) = self.scores.set(game, score) {
                warn!(%game, "failed to persist high score: {err}");
            }
        }

        let summary = GameOverSummary {
            game,
            final_score: score,
            final_score_text: metric.format(score),
            is_new_high_score,
            best_score_text: metric.format_best(self.scores.get(game)),
        };
        info!(%game, score, is_new_high_score, "session over");
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Back to the menu. Safe in every state.
    pub fn reset(&mut self)
    {
        self.halt();
        self.session = Session::default();
        self.summary = None;
        self.last_timestamp = None;
        debug!("session reset");
    }

    /// Replays the current game without scoring the abandoned run.
    pub fn restart(&mut self) -> Result<()>
    {
        let game = self.session.active_game.ok_or(HubError::NoActiveGame)?;
        self.start_game(game);
        Ok(())
    }

    /// New layout area. Size-derived games are rebuilt while running.
    pub fn resize(&mut self, available: SurfaceSize) -> Result<()>
    {
        self.available = available;
        let Some(game) = self.session.active_game else {
            return Ok(());
        };
        self.surface_size = game.surface_size(available);
        if self.session.status == Status::Running && game.reinit_on_resize() {
            info!(%game, "layout changed, restarting");
            self.restart()?;
        }
        Ok(())
    }

    /// Hands an event to the active module. Callers go through
    /// [`crate::input::InputRouter`], which checks status and origin.
    pub(crate) fn deliver(&mut self, event: InputEvent) -> bool
    {
        match self.module.as_mut() {
            Some(module) => {
                module.on_input(event);
                true
            }
            None => false,
        }
    }

    /// Runs every tick the scheduler reports due. Returns the summary when
    /// the game ends during this pump.
    pub fn pump(&mut self, canvas: &mut dyn Canvas) -> Option<GameOverSummary>
    {
        let mut finished = None;
        for tick in self.scheduler.take_due() {
            if self.session.loop_handle != Some(tick.handle) {
                debug!(handle = tick.handle.id(), "dropping stale tick");
                continue;
            }
            self.session.loop_handle = None;

            let elapsed = match self.last_timestamp {
                Some(last) => tick.timestamp.saturating_sub(last),
                None => Duration::ZERO,
            };
            self.last_timestamp = Some(tick.timestamp);

            let Some(module) = self.module.as_mut() else {
                continue;
            };
            let step = module.update(elapsed);
            self.session.score = self.session.score.saturating_add(step.score_delta);

            if !step.continues {
                match self.stop() {
                    Ok(summary) => finished = Some(summary),
                    Err(err) => warn!("stop after game over failed: {err}"),
                }
                continue;
            }

            canvas.clear();
            module.render(canvas);
            self.session.loop_handle = Some(self.scheduler.request_tick());
        }
        finished
    }

    /// Paints the current frame without advancing anything.
    pub fn render(&self, canvas: &mut dyn Canvas)
    {
        canvas.clear();
        if let Some(module) = self.module.as_ref() {
            module.render(canvas);
        }
    }

    pub fn hud(&self) -> Option<HudView>
    {
        let game = self.session.active_game?;
        Some(HudView {
            title: game.title(),
            score_text: game.metric().label(self.session.score),
        })
    }

    pub fn best_score_text(&self, game: GameId) -> String
    {
        game.metric().format_best(self.scores.get(game))
    }

    /// Cancels the pending tick and tears the module down, in that order.
    fn halt(&mut self)
    {
        if let Some(handle) = self.session.loop_handle.take() {
            self.scheduler.cancel_tick(handle);
        }
        if let Some(mut module) = self.module.take() {
            module.teardown();
        }
    }
}
