use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{GameId, GameModule, Step};
use crate::input::{Direction, InputEvent};
use crate::surface::{Canvas, Rect, Rgb, SurfaceSize};

const PADDLE_WIDTH: f32 = 80.0;
const PADDLE_HEIGHT: f32 = 10.0;
const PADDLE_STEP: f32 = 16.0;
const PADDLE_LIFT: f32 = 30.0;

const BALL_RADIUS: f32 = 8.0;
const BALL_VELOCITY: (f32, f32) = (180.0, -180.0);
const PADDLE_NUDGE: f32 = 30.0;

const BRICK_ROWS: usize = 5;
const BRICK_COLS: usize = 8;
const BRICK_HEIGHT: f32 = 16.0;
const BRICK_PADDING: f32 = 6.0;
const BRICK_TOP: f32 = 30.0;
const BRICK_SIDE: f32 = 20.0;
const BRICK_POINTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ball
{
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
}

impl Ball
{
    fn bounds(&self) -> Rect
    {
        Rect::new(
            self.x - BALL_RADIUS,
            self.y - BALL_RADIUS,
            BALL_RADIUS * 2.0,
            BALL_RADIUS * 2.0,
        )
    }
}

pub struct BallDash
{
    rng: StdRng,
    width: f32,
    height: f32,
    paddle: Rect,
    ball: Ball,
    bricks: Vec<Rect>,
    moves: Vec<f32>,
}

impl BallDash
{
    pub fn new(seed: u64) -> Self
    {
        Self {
            rng: StdRng::seed_from_u64(seed),
            width: 0.0,
            height: 0.0,
            paddle: Rect::new(0.0, 0.0, PADDLE_WIDTH, PADDLE_HEIGHT),
            ball: Ball {
                x: 0.0,
                y: 0.0,
                dx: BALL_VELOCITY.0,
                dy: BALL_VELOCITY.1,
            },
            bricks: Vec::new(),
            moves: Vec::new(),
        }
    }

    pub fn bricks_left(&self) -> usize
    {
        self.bricks.len()
    }

    fn lay_bricks(&mut self)
    {
        let span = self.width - BRICK_SIDE * 2.0;
        let brick_w = ((span - BRICK_PADDING * (BRICK_COLS as f32 - 1.0)) / BRICK_COLS as f32).max(1.0);
        self.bricks = (0..BRICK_ROWS)
            .flat_map(|row| (0..BRICK_COLS).map(move |col| (row, col)))
            .map(|(row, col)| {
                Rect::new(
                    BRICK_SIDE + col as f32 * (brick_w + BRICK_PADDING),
                    BRICK_TOP + row as f32 * (BRICK_HEIGHT + BRICK_PADDING),
                    brick_w,
                    BRICK_HEIGHT,
                )
            })
            .collect();
    }

    fn reflect_off_walls(&mut self)
    {
        let ball = &mut self.ball;
        if ball.x - BALL_RADIUS <= 0.0 {
            ball.dx = ball.dx.abs();
        } else if ball.x + BALL_RADIUS >= self.width {
            ball.dx = -ball.dx.abs();
        }
        if ball.y - BALL_RADIUS <= 0.0 {
            ball.dy = ball.dy.abs();
        }
    }

    fn bounce_off_paddle(&mut self)
    {
        if self.ball.dy <= 0.0 || !self.ball.bounds().intersects(&self.paddle) {
            return;
        }
        self.ball.dy = -self.ball.dy.abs();
        self.ball.dx += self.rng.gen_range(-PADDLE_NUDGE..=PADDLE_NUDGE);
    }

    /// Removes every brick the ball overlaps. Each axis flips at most once.
    fn break_bricks(&mut self) -> u32
    {
        let ball = self.ball.bounds();
        let (mut flip_x, mut flip_y) = (false, false);
        let before = self.bricks.len();
        self.bricks.retain(|brick| {
            if !brick.intersects(&ball) {
                return true;
            }
            let (ox, oy) = brick.overlap(&ball);
            if ox < oy {
                flip_x = true;
            } else {
                flip_y = true;
            }
            false
        });
        if flip_x {
            self.ball.dx = -self.ball.dx;
        }
        if flip_y {
            self.ball.dy = -self.ball.dy;
        }
        (before - self.bricks.len()) as u32 * BRICK_POINTS
    }
}

impl GameModule for BallDash
{
    fn id(&self) -> GameId
    {
        GameId::BallDash
    }

    fn init(&mut self, size: SurfaceSize)
    {
        self.width = size.width_f();
        self.height = size.height_f();
        self.paddle = Rect::new(
            (self.width - PADDLE_WIDTH) / 2.0,
            self.height - PADDLE_LIFT,
            PADDLE_WIDTH,
            PADDLE_HEIGHT,
        );
        self.ball = Ball {
            x: self.width / 2.0,
            y: self.paddle.y - BALL_RADIUS * 2.0,
            dx: BALL_VELOCITY.0,
            dy: BALL_VELOCITY.1,
        };
        self.moves.clear();
        self.lay_bricks();
    }

    fn on_input(&mut self, event: InputEvent)
    {
        match event {
            InputEvent::Direction(Direction::Left) => self.moves.push(-PADDLE_STEP),
            InputEvent::Direction(Direction::Right) => self.moves.push(PADDLE_STEP),
            _ => {}
        }
    }

    fn update(&mut self, elapsed: Duration) -> Step
    {
        let max_x = (self.width - self.paddle.w).max(0.0);
        for dx in self.moves.drain(..) {
            self.paddle.x = (self.paddle.x + dx).clamp(0.0, max_x);
        }

        let dt = elapsed.as_secs_f32();
        self.ball.x += self.ball.dx * dt;
        self.ball.y += self.ball.dy * dt;

        self.reflect_off_walls();
        self.bounce_off_paddle();
        let points = self.break_bricks();

        if self.ball.y + BALL_RADIUS > self.height || self.bricks.is_empty() {
            return Step::finished(points);
        }
        Step::running(points)
    }

    fn render(&self, canvas: &mut dyn Canvas)
    {
        for brick in &self.bricks {
            let row = (brick.y - BRICK_TOP) / (BRICK_HEIGHT + BRICK_PADDING);
            let t = row / BRICK_ROWS as f32;
            canvas.fill_rect(*brick, Rgb::BLUE.dimmed(1.0 - t * 0.6));
        }
        canvas.fill_rect(self.paddle, Rgb::WHITE);
        canvas.fill_circle(self.ball.x, self.ball.y, BALL_RADIUS, Rgb::GOLD);
        canvas.stroke_rect(Rect::new(0.0, 0.0, self.width, self.height), Rgb::GREY);
    }

    fn teardown(&mut self)
    {
        self.moves.clear();
    }
}
