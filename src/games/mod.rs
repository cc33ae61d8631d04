pub mod ball_dash;
pub mod memory_match;
pub mod snake;
pub mod space_invaders;
pub mod target_click;
pub mod tetris;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HubError;
use crate::input::{InputEvent, VirtualButton};
use crate::scores::{BestScore, ScoreMetric};
use crate::surface::{Canvas, SurfaceSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameId
{
    Snake,
    Tetris,
    BallDash,
    MemoryMatch,
    SpaceInvaders,
    TargetClick,
}

impl GameId
{
    pub const ALL: [GameId; 6] = [
        GameId::Snake,
        GameId::Tetris,
        GameId::BallDash,
        GameId::MemoryMatch,
        GameId::SpaceInvaders,
        GameId::TargetClick,
    ];

    pub fn name(self) -> &'static str
    {
        match self {
            GameId::Snake => "snake",
            GameId::Tetris => "tetris",
            GameId::BallDash => "ballDash",
            GameId::MemoryMatch => "memoryMatch",
            GameId::SpaceInvaders => "spaceInvaders",
            GameId::TargetClick => "targetClick",
        }
    }

    pub fn descriptor(self) -> GameDescriptor
    {
        match self {
            GameId::Snake => GameDescriptor {
                id: self,
                title: "Snake",
                description: "Eat, grow, and don't bite yourself",
                preferred_size: SurfaceSize::new(400, 400),
                metric: ScoreMetric::HigherIsBetter,
                buttons: &[
                    VirtualButton::Up,
                    VirtualButton::Left,
                    VirtualButton::Down,
                    VirtualButton::Right,
                ],
            },
            GameId::Tetris => GameDescriptor {
                id: self,
                title: "Tetris",
                description: "Stack falling blocks and clear rows",
                preferred_size: SurfaceSize::new(300, 600),
                metric: ScoreMetric::HigherIsBetter,
                buttons: &[
                    VirtualButton::Up,
                    VirtualButton::Down,
                    VirtualButton::Left,
                    VirtualButton::Right,
                ],
            },
            GameId::BallDash => GameDescriptor {
                id: self,
                title: "Ball Dash",
                description: "Bounce the ball and break every brick",
                preferred_size: SurfaceSize::new(480, 320),
                metric: ScoreMetric::HigherIsBetter,
                buttons: &[VirtualButton::Left, VirtualButton::Right],
            },
            GameId::MemoryMatch => GameDescriptor {
                id: self,
                title: "Memory Match",
                description: "Find all pairs as fast as you can",
                preferred_size: SurfaceSize::new(500, 500),
                metric: ScoreMetric::LowerIsBetter,
                buttons: &[
                    VirtualButton::Up,
                    VirtualButton::Left,
                    VirtualButton::Down,
                    VirtualButton::Right,
                    VirtualButton::Action,
                ],
            },
            GameId::SpaceInvaders => GameDescriptor {
                id: self,
                title: "Space Invaders",
                description: "Shoot down the marching formation",
                preferred_size: SurfaceSize::new(480, 480),
                metric: ScoreMetric::HigherIsBetter,
                buttons: &[
                    VirtualButton::Left,
                    VirtualButton::Right,
                    VirtualButton::Action,
                ],
            },
            GameId::TargetClick => GameDescriptor {
                id: self,
                title: "Target Click",
                description: "Click targets before they shrink away",
                preferred_size: SurfaceSize::new(500, 400),
                metric: ScoreMetric::HigherIsBetter,
                buttons: &[],
            },
        }
    }

    pub fn metric(self) -> ScoreMetric
    {
        self.descriptor().metric
    }

    pub fn title(self) -> &'static str
    {
        self.descriptor().title
    }

    /// Surface size for this game inside the available layout area.
    pub fn surface_size(self, available: SurfaceSize) -> SurfaceSize
    {
        self.descriptor().preferred_size.clamped_to(available)
    }

    /// Games whose layout is derived from the surface size and must be
    /// rebuilt when it changes.
    pub fn reinit_on_resize(self) -> bool
    {
        matches!(self, GameId::Tetris | GameId::MemoryMatch)
    }

    pub fn default_best(self) -> BestScore
    {
        match self.metric() {
            ScoreMetric::HigherIsBetter => BestScore::Value(0),
            ScoreMetric::LowerIsBetter => BestScore::Unset,
        }
    }
}

impl fmt::Display for GameId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

impl FromStr for GameId
{
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let wanted = s.trim();
        GameId::ALL
            .iter()
            .copied()
            .find(|game| game.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| HubError::UnknownGame(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GameDescriptor
{
    pub id: GameId,
    pub title: &'static str,
    pub description: &'static str,
    pub preferred_size: SurfaceSize,
    pub metric: ScoreMetric,
    /// On-screen pad for pointer-only play.
    pub buttons: &'static [VirtualButton],
}

pub fn registry() -> Vec<GameDescriptor>
{
    GameId::ALL.iter().map(|game| game.descriptor()).collect()
}

/// Outcome of one simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step
{
    pub continues: bool,
    pub score_delta: u32,
}

impl Step
{
    pub const fn running(score_delta: u32) -> Self
    {
        Self {
            continues: true,
            score_delta,
        }
    }

    pub const fn finished(score_delta: u32) -> Self
    {
        Self {
            continues: false,
            score_delta,
        }
    }
}

/// The contract every minigame implements.
///
/// Modules never see the session score or the high-score store: they
/// report score changes through [`Step::score_delta`] and game over through
/// [`Step::continues`]. Input is queued by `on_input` and applied by the
/// next `update`.
pub trait GameModule
{
    fn id(&self) -> GameId;

    /// Builds the layout for `size`. Called once per instance.
    fn init(&mut self, size: SurfaceSize);

    fn on_input(&mut self, event: InputEvent);

    /// Advances the simulation by `elapsed`.
    fn update(&mut self, elapsed: Duration) -> Step;

    fn render(&self, canvas: &mut dyn Canvas);

    /// Cancels module timers and drops queued input. Safe before `init`.
    fn teardown(&mut self);
}

/// Builds a fresh, uninitialized module for `id`.
pub fn create(id: GameId, seed: u64) -> Box<dyn GameModule>
{
    match id {
        GameId::Snake => Box::new(snake::Snake::new(seed)),
        GameId::Tetris => Box::new(tetris::Tetris::new(seed)),
        GameId::BallDash => Box::new(ball_dash::BallDash::new(seed)),
        GameId::MemoryMatch => Box::new(memory_match::MemoryMatch::new(seed)),
        GameId::SpaceInvaders => Box::new(space_invaders::SpaceInvaders::new(seed)),
        GameId::TargetClick => Box::new(target_click::TargetClick::new(seed)),
    }
}
