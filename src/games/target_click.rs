use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{GameId, GameModule, Step};
use crate::input::InputEvent;
use crate::surface::{Canvas, Rgb, SurfaceSize};
use crate::timers::RoundTimer;

const TARGET_RADIUS: f32 = 30.0;
const TARGET_LIFETIME: Duration = Duration::from_millis(2000);
const SPAWN_INTERVAL: Duration = Duration::from_millis(1000);
const ROUND_LENGTH: Duration = Duration::from_secs(30);
const MIN_HIT_POINTS: u32 = 10;
const MAX_HIT_POINTS: u128 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Target
{
    x: f32,
    y: f32,
    age: Duration,
}

impl Target
{
    fn remaining(&self) -> Duration
    {
        TARGET_LIFETIME.saturating_sub(self.age)
    }

    /// Only the drawing shrinks; hits always count against the full radius.
    fn drawn_radius(&self) -> f32
    {
        TARGET_RADIUS * self.remaining().as_secs_f32() / TARGET_LIFETIME.as_secs_f32()
    }

    fn hit_by(&self, x: f32, y: f32) -> bool
    {
        let (dx, dy) = (x - self.x, y - self.y);
        dx * dx + dy * dy <= TARGET_RADIUS * TARGET_RADIUS
    }
}

/// Points for hitting a target with `remaining` lifetime left.
pub fn hit_points(remaining: Duration) -> u32
{
    let scaled = remaining.as_millis() * MAX_HIT_POINTS / TARGET_LIFETIME.as_millis();
    (scaled as u32).max(MIN_HIT_POINTS)
}

pub struct TargetClick
{
    rng: StdRng,
    width: f32,
    height: f32,
    targets: Vec<Target>,
    since_spawn: Duration,
    round: RoundTimer,
    clicks: Vec<(f32, f32)>,
}

impl TargetClick
{
    pub fn new(seed: u64) -> Self
    {
        Self {
            rng: StdRng::seed_from_u64(seed),
            width: 0.0,
            height: 0.0,
            targets: Vec::new(),
            since_spawn: SPAWN_INTERVAL,
            round: RoundTimer::new(ROUND_LENGTH),
            clicks: Vec::new(),
        }
    }

    pub fn round_remaining(&self) -> Duration
    {
        self.round.remaining()
    }

    fn spawn(&mut self)
    {
        let max_x = (self.width - TARGET_RADIUS).max(TARGET_RADIUS);
        let max_y = (self.height - TARGET_RADIUS).max(TARGET_RADIUS);
        self.targets.push(Target {
            x: self.rng.gen_range(TARGET_RADIUS..=max_x),
            y: self.rng.gen_range(TARGET_RADIUS..=max_y),
            age: Duration::ZERO,
        });
    }

    /// Newest target under the pointer wins.
    fn resolve_click(&mut self, x: f32, y: f32) -> u32
    {
        let Some(index) = self.targets.iter().rposition(|target| target.hit_by(x, y)) else {
            return 0;
        };
        let target = self.targets.remove(index);
        hit_points(target.remaining())
    }
}

impl GameModule for TargetClick
{
    fn id(&self) -> GameId
    {
        GameId::TargetClick
    }

    fn init(&mut self, size: SurfaceSize)
    {
        self.width = size.width_f();
        self.height = size.height_f();
        self.targets.clear();
        self.clicks.clear();
        self.round.reset();
        // First target appears on the first update.
        self.since_spawn = SPAWN_INTERVAL;
    }

    fn on_input(&mut self, event: InputEvent)
    {
        if let InputEvent::Pointer { x, y } = event {
            self.clicks.push((x, y));
        }
    }

    fn update(&mut self, elapsed: Duration) -> Step
    {
        let mut points = 0;
        let clicks: Vec<(f32, f32)> = self.clicks.drain(..).collect();
        for (x, y) in clicks {
            points += self.resolve_click(x, y);
        }

        for target in &mut self.targets {
            target.age += elapsed;
        }
        self.targets.retain(|target| target.age < TARGET_LIFETIME);

        self.since_spawn += elapsed;
        while self.since_spawn >= SPAWN_INTERVAL {
            self.since_spawn -= SPAWN_INTERVAL;
            self.spawn();
        }

        self.round.tick(elapsed);
        if self.round.is_up() {
            return Step::finished(points);
        }
        Step::running(points)
    }

    fn render(&self, canvas: &mut dyn Canvas)
    {
        for target in &self.targets {
            let radius = target.drawn_radius();
            canvas.fill_circle(target.x, target.y, radius, Rgb::RED);
            canvas.fill_circle(target.x, target.y, radius / 2.0, Rgb::WHITE);
        }
        let secs = self.round.remaining().as_secs();
        canvas.draw_text(4.0, 4.0, &format!("{secs}s"), Rgb::GREY);
    }

    fn teardown(&mut self)
    {
        self.clicks.clear();
    }
}
