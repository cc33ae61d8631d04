use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{GameId, GameModule, Step};
use crate::input::{Direction, InputEvent};
use crate::surface::{Canvas, Rect, Rgb, SurfaceSize};

const TILE_PX: u32 = 20;
const START_INTERVAL: Duration = Duration::from_millis(150);
const MIN_INTERVAL: Duration = Duration::from_millis(50);
const SPEEDUP_PER_FOOD: Duration = Duration::from_millis(1);
const FOOD_POINTS: u32 = 10;

type Tile = (i32, i32);

pub struct Snake
{
    rng: StdRng,
    cols: i32,
    rows: i32,
    body: VecDeque<Tile>,
    heading: Direction,
    // Applied on the next move; checked against `heading`, never against
    // itself, so two quick presses cannot fold the snake back.
    next_heading: Direction,
    food: Option<Tile>,
    move_interval: Duration,
    since_move: Duration,
    over: bool,
}

impl Snake
{
    pub fn new(seed: u64) -> Self
    {
        Self {
            rng: StdRng::seed_from_u64(seed),
            cols: 0,
            rows: 0,
            body: VecDeque::new(),
            heading: Direction::Up,
            next_heading: Direction::Up,
            food: None,
            move_interval: START_INTERVAL,
            since_move: Duration::ZERO,
            over: false,
        }
    }

    pub fn head(&self) -> Option<Tile>
    {
        self.body.front().copied()
    }

    pub fn length(&self) -> usize
    {
        self.body.len()
    }

    pub fn move_interval(&self) -> Duration
    {
        self.move_interval
    }

    fn place_food(&mut self)
    {
        let free = (self.cols * self.rows) as usize - self.body.len();
        if free == 0 {
            self.food = None;
            return;
        }
        loop {
            let tile = (
                self.rng.gen_range(0..self.cols),
                self.rng.gen_range(0..self.rows),
            );
            if !self.body.contains(&tile) {
                self.food = Some(tile);
                return;
            }
        }
    }

    /// One tile forward. Returns the points earned, or `None` on a crash.
    fn advance(&mut self) -> Option<u32>
    {
        self.heading = self.next_heading;
        let (dx, dy) = self.heading.delta();
        let (hx, hy) = self.head()?;
        let next = (hx + dx, hy + dy);

        if next.0 < 0 || next.1 < 0 || next.0 >= self.cols || next.1 >= self.rows {
            return None;
        }
        if self.body.iter().skip(1).any(|tile| *tile == next) {
            return None;
        }

        self.body.push_front(next);
        if self.food == Some(next) {
            self.move_interval = self
                .move_interval
                .saturating_sub(SPEEDUP_PER_FOOD)
                .max(MIN_INTERVAL);
            self.place_food();
            Some(FOOD_POINTS)
        } else {
            self.body.pop_back();
            Some(0)
        }
    }
}

impl GameModule for Snake
{
    fn id(&self) -> GameId
    {
        GameId::Snake
    }

    fn init(&mut self, size: SurfaceSize)
    {
        self.cols = (size.width / TILE_PX).max(1) as i32;
        self.rows = (size.height / TILE_PX).max(1) as i32;
        self.body = VecDeque::from([(self.cols / 2, self.rows / 2)]);
        self.heading = Direction::Up;
        self.next_heading = Direction::Up;
        self.move_interval = START_INTERVAL;
        self.since_move = Duration::ZERO;
        self.over = false;
        self.place_food();
    }

    fn on_input(&mut self, event: InputEvent)
    {
        if let InputEvent::Direction(direction) = event {
            if direction != self.heading.opposite() {
                self.next_heading = direction;
            }
        }
    }

    fn update(&mut self, elapsed: Duration) -> Step
    {
        if self.over || self.body.is_empty() {
            return Step::finished(0);
        }
        self.since_move += elapsed;
        let mut points = 0;
        while self.since_move >= self.move_interval {
            self.since_move -= self.move_interval;
            match self.advance() {
                Some(earned) => points += earned,
                None => {
                    self.over = true;
                    return Step::finished(points);
                }
            }
            if self.food.is_none() {
                // Board is full: nothing left to eat.
                self.over = true;
                return Step::finished(points);
            }
        }
        Step::running(points)
    }

    fn render(&self, canvas: &mut dyn Canvas)
    {
        let tile = TILE_PX as f32;
        if let Some((fx, fy)) = self.food {
            canvas.fill_circle(
                fx as f32 * tile + tile / 2.0,
                fy as f32 * tile + tile / 2.0,
                tile / 2.0 - 2.0,
                Rgb::RED,
            );
        }
        let len = self.body.len().max(1) as f32;
        for (i, (x, y)) in self.body.iter().enumerate() {
            let t = i as f32 / len;
            let color = Rgb::new((27.0 + t * 30.0) as u8, (94.0 + t * 100.0) as u8, (32.0 + t * 30.0) as u8);
            canvas.fill_rect(
                Rect::new(*x as f32 * tile, *y as f32 * tile, tile - 2.0, tile - 2.0),
                color,
            );
        }
        let size = canvas.size();
        canvas.stroke_rect(Rect::new(0.0, 0.0, size.width_f(), size.height_f()), Rgb::GREY);
    }

    fn teardown(&mut self)
    {
        self.over = true;
    }
}
