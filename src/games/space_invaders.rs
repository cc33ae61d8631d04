use std::time::Duration;

use super::{GameId, GameModule, Step};
use crate::input::{Direction, InputEvent};
use crate::surface::{Canvas, Rect, Rgb, SurfaceSize};

const PLAYER_WIDTH: f32 = 40.0;
const PLAYER_HEIGHT: f32 = 16.0;
const PLAYER_STEP: f32 = 10.0;
const PLAYER_LIFT: f32 = 30.0;

const BULLET_WIDTH: f32 = 4.0;
const BULLET_HEIGHT: f32 = 10.0;
const BULLET_SPEED: f32 = 420.0;

const ENEMY_ROWS: usize = 5;
const ENEMY_COLS: usize = 8;
const ENEMY_WIDTH: f32 = 30.0;
const ENEMY_HEIGHT: f32 = 20.0;
const ENEMY_PADDING: f32 = 15.0;
const FORMATION_TOP: f32 = 30.0;
const FORMATION_LEFT: f32 = 30.0;
const MARCH_INTERVAL: Duration = Duration::from_millis(600);
const MARCH_STEP: f32 = 10.0;
const DROP_STEP: f32 = 20.0;
const ENEMY_POINTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command
{
    Move(f32),
    Shoot,
}

pub struct SpaceInvaders
{
    width: f32,
    height: f32,
    player: Rect,
    bullets: Vec<Rect>,
    enemies: Vec<Rect>,
    /// +1 marching right, -1 marching left.
    heading: f32,
    since_march: Duration,
    commands: Vec<Command>,
}

impl SpaceInvaders
{
    /// The formation is fixed, so the seed is unused.
    pub fn new(_seed: u64) -> Self
    {
        Self {
            width: 0.0,
            height: 0.0,
            player: Rect::new(0.0, 0.0, PLAYER_WIDTH, PLAYER_HEIGHT),
            bullets: Vec::new(),
            enemies: Vec::new(),
            heading: 1.0,
            since_march: Duration::ZERO,
            commands: Vec::new(),
        }
    }

    pub fn enemies_left(&self) -> usize
    {
        self.enemies.len()
    }

    /// Columns that fit between the side margins, so narrow surfaces still
    /// leave the formation room to march.
    fn columns_for(width: f32) -> usize
    {
        let room = width - FORMATION_LEFT * 2.0 + ENEMY_PADDING;
        let fits = (room / (ENEMY_WIDTH + ENEMY_PADDING)).floor().max(1.0) as usize;
        fits.min(ENEMY_COLS)
    }

    fn form_ranks(&mut self)
    {
        let cols = Self::columns_for(self.width);
        self.enemies = (0..ENEMY_ROWS)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .map(|(row, col)| {
                Rect::new(
                    FORMATION_LEFT + col as f32 * (ENEMY_WIDTH + ENEMY_PADDING),
                    FORMATION_TOP + row as f32 * (ENEMY_HEIGHT + ENEMY_PADDING),
                    ENEMY_WIDTH,
                    ENEMY_HEIGHT,
                )
            })
            .collect();
    }

    /// One formation step: sideways, or flip and drop when the next step
    /// would cross a side boundary.
    fn march(&mut self)
    {
        let dx = MARCH_STEP * self.heading;
        let blocked = self
            .enemies
            .iter()
            .any(|enemy| enemy.x + dx < 0.0 || enemy.right() + dx > self.width);
        if blocked {
            self.heading = -self.heading;
            for enemy in &mut self.enemies {
                enemy.y += DROP_STEP;
            }
        } else {
            for enemy in &mut self.enemies {
                enemy.x += dx;
            }
        }
    }

    /// Checks the whole stretch each bullet covered this frame, so long
    /// frames can't carry a bullet past an enemy. The lowest enemy on the
    /// path is the one hit.
    fn resolve_hits(&mut self, rise: f32) -> u32
    {
        let mut destroyed = 0;
        self.bullets.retain(|bullet| {
            let swept = Rect::new(bullet.x, bullet.y, bullet.w, bullet.h + rise);
            let hit = self
                .enemies
                .iter()
                .enumerate()
                .filter(|(_, enemy)| enemy.intersects(&swept))
                .max_by(|(_, a), (_, b)| a.bottom().total_cmp(&b.bottom()))
                .map(|(index, _)| index);
            match hit {
                Some(hit) => {
                    self.enemies.swap_remove(hit);
                    destroyed += 1;
                    false
                }
                None => true,
            }
        });
        destroyed * ENEMY_POINTS
    }

    fn invaded(&self) -> bool
    {
        self.enemies
            .iter()
            .any(|enemy| enemy.bottom() >= self.player.y)
    }
}

impl GameModule for SpaceInvaders
{
    fn id(&self) -> GameId
    {
        GameId::SpaceInvaders
    }

    fn init(&mut self, size: SurfaceSize)
    {
        self.width = size.width_f();
        self.height = size.height_f();
        self.player = Rect::new(
            (self.width - PLAYER_WIDTH) / 2.0,
            self.height - PLAYER_LIFT,
            PLAYER_WIDTH,
            PLAYER_HEIGHT,
        );
        self.bullets.clear();
        self.heading = 1.0;
        self.since_march = Duration::ZERO;
        self.commands.clear();
        self.form_ranks();
    }

    fn on_input(&mut self, event: InputEvent)
    {
        let command = match event {
            InputEvent::Direction(Direction::Left) => Command::Move(-PLAYER_STEP),
            InputEvent::Direction(Direction::Right) => Command::Move(PLAYER_STEP),
            InputEvent::Primary => Command::Shoot,
            _ => return,
        };
        self.commands.push(command);
    }

    fn update(&mut self, elapsed: Duration) -> Step
    {
        let max_x = (self.width - self.player.w).max(0.0);
        for command in self.commands.drain(..) {
            match command {
                Command::Move(dx) => self.player.x = (self.player.x + dx).clamp(0.0, max_x),
                Command::Shoot => self.bullets.push(Rect::new(
                    self.player.x + (self.player.w - BULLET_WIDTH) / 2.0,
                    self.player.y - BULLET_HEIGHT,
                    BULLET_WIDTH,
                    BULLET_HEIGHT,
                )),
            }
        }

        let rise = BULLET_SPEED * elapsed.as_secs_f32();
        for bullet in &mut self.bullets {
            bullet.y -= rise;
        }

        self.since_march += elapsed;
        while self.since_march >= MARCH_INTERVAL {
            self.since_march -= MARCH_INTERVAL;
            self.march();
        }

        let points = self.resolve_hits(rise);
        self.bullets.retain(|bullet| bullet.bottom() > 0.0);
        if self.enemies.is_empty() || self.invaded() {
            return Step::finished(points);
        }
        Step::running(points)
    }

    fn render(&self, canvas: &mut dyn Canvas)
    {
        for enemy in &self.enemies {
            canvas.fill_rect(*enemy, Rgb::GREEN);
        }
        for bullet in &self.bullets {
            canvas.fill_rect(*bullet, Rgb::GOLD);
        }
        canvas.fill_rect(self.player, Rgb::BLUE);
        canvas.stroke_rect(Rect::new(0.0, 0.0, self.width, self.height), Rgb::GREY);
    }

    fn teardown(&mut self)
    {
        self.commands.clear();
    }
}
