use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{GameId, GameModule, Step};
use crate::input::{Direction, InputEvent};
use crate::surface::{Canvas, Rect, Rgb, SurfaceSize};

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

const LINE_POINTS: [u32; 5] = [0, 100, 300, 500, 800];
const BASE_DROP_MS: u64 = 1000;
const MIN_DROP_MS: u64 = 100;
const DROP_STEP_MS: u64 = 100;
const POINTS_PER_SPEEDUP: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece
{
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl Piece
{
    pub const ALL: [Piece; 7] = [
        Piece::I,
        Piece::J,
        Piece::L,
        Piece::O,
        Piece::S,
        Piece::T,
        Piece::Z,
    ];

    fn shape(self) -> Shape
    {
        let rows: &[&[u8]] = match self {
            Piece::I => &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]],
            Piece::J => &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]],
            Piece::L => &[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]],
            Piece::O => &[&[1, 1], &[1, 1]],
            Piece::S => &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]],
            Piece::T => &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]],
            Piece::Z => &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]],
        };
        rows.iter()
            .map(|row| row.iter().map(|cell| *cell != 0).collect())
            .collect()
    }

    fn color(self) -> Rgb
    {
        match self {
            Piece::I => Rgb::new(0, 240, 240),
            Piece::J => Rgb::new(0, 0, 240),
            Piece::L => Rgb::new(240, 160, 0),
            Piece::O => Rgb::new(240, 240, 0),
            Piece::S => Rgb::new(0, 240, 0),
            Piece::T => Rgb::new(160, 0, 240),
            Piece::Z => Rgb::new(240, 0, 0),
        }
    }
}

type Shape = Vec<Vec<bool>>;
type Board = Vec<Vec<Option<Piece>>>;

/// Quarter turn clockwise: `new[c][n - 1 - r] = old[r][c]`.
pub fn rotate(shape: &[Vec<bool>]) -> Shape
{
    let rows = shape.len();
    let cols = shape.first().map_or(0, Vec::len);
    let mut rotated = vec![vec![false; rows]; cols];
    for (r, row) in shape.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            rotated[c][rows - 1 - r] = *cell;
        }
    }
    rotated
}

pub fn line_points(rows_cleared: usize) -> u32
{
    LINE_POINTS.get(rows_cleared).copied().unwrap_or(LINE_POINTS[4])
}

/// Gravity interval for a running total of `points`.
pub fn drop_interval_for(points: u32) -> Duration
{
    let steps = (points / POINTS_PER_SPEEDUP) as u64;
    let ms = BASE_DROP_MS
        .saturating_sub(steps * DROP_STEP_MS)
        .max(MIN_DROP_MS);
    Duration::from_millis(ms)
}

#[derive(Debug, Clone)]
struct Active
{
    piece: Piece,
    shape: Shape,
    x: i32,
    y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action
{
    Left,
    Right,
    Rotate,
    HardDrop,
}

pub struct Tetris
{
    rng: StdRng,
    board: Board,
    active: Option<Active>,
    block: f32,
    origin_x: f32,
    points: u32,
    drop_interval: Duration,
    since_drop: Duration,
    queued: VecDeque<Action>,
    blocked: bool,
}

impl Tetris
{
    pub fn new(seed: u64) -> Self
    {
        Self {
            rng: StdRng::seed_from_u64(seed),
            board: empty_board(),
            active: None,
            block: 0.0,
            origin_x: 0.0,
            points: 0,
            drop_interval: drop_interval_for(0),
            since_drop: Duration::ZERO,
            queued: VecDeque::new(),
            blocked: false,
        }
    }

    pub fn drop_interval(&self) -> Duration
    {
        self.drop_interval
    }

    pub fn is_blocked(&self) -> bool
    {
        self.blocked
    }

    fn fits(&self, x: i32, y: i32, shape: &[Vec<bool>]) -> bool
    {
        for (r, row) in shape.iter().enumerate() {
            for (c, filled) in row.iter().enumerate() {
                if !filled {
                    continue;
                }
                let bx = x + c as i32;
                let by = y + r as i32;
                if bx < 0 || by < 0 || bx >= BOARD_WIDTH as i32 || by >= BOARD_HEIGHT as i32 {
                    return false;
                }
                if self.board[by as usize][bx as usize].is_some() {
                    return false;
                }
            }
        }
        true
    }

    fn spawn_piece(&mut self, piece: Piece) -> bool
    {
        let shape = piece.shape();
        let x = ((BOARD_WIDTH - shape[0].len()) / 2) as i32;
        if !self.fits(x, 0, &shape) {
            self.active = None;
            return false;
        }
        self.active = Some(Active {
            piece,
            shape,
            x,
            y: 0,
        });
        true
    }

    fn spawn(&mut self) -> bool
    {
        let piece = Piece::ALL[self.rng.gen_range(0..Piece::ALL.len())];
        self.spawn_piece(piece)
    }

    fn shift(&mut self, dx: i32, dy: i32) -> bool
    {
        let Some(active) = self.active.as_ref() else {
            return false;
        };
        let (x, y) = (active.x + dx, active.y + dy);
        if !self.fits(x, y, &active.shape) {
            return false;
        }
        if let Some(active) = self.active.as_mut() {
            active.x = x;
            active.y = y;
        }
        true
    }

    fn rotate_active(&mut self)
    {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let rotated = rotate(&active.shape);
        if self.fits(active.x, active.y, &rotated) {
            if let Some(active) = self.active.as_mut() {
                active.shape = rotated;
            }
        }
    }

    /// Writes the active piece into the board, clears full rows, and spawns
    /// the next piece. Returns points earned and whether the spawn succeeded.
    fn lock(&mut self) -> (u32, bool)
    {
        if let Some(active) = self.active.take() {
            for (r, row) in active.shape.iter().enumerate() {
                for (c, filled) in row.iter().enumerate() {
                    if *filled {
                        let bx = (active.x + c as i32) as usize;
                        let by = (active.y + r as i32) as usize;
                        self.board[by][bx] = Some(active.piece);
                    }
                }
            }
        }
        let earned = self.clear_rows();
        let spawned = self.spawn();
        (earned, spawned)
    }

    fn clear_rows(&mut self) -> u32
    {
        let before = self.board.len();
        self.board.retain(|row| row.iter().any(Option::is_none));
        let cleared = before - self.board.len();
        for _ in 0..cleared {
            self.board.insert(0, vec![None; BOARD_WIDTH]);
        }
        if cleared == 0 {
            return 0;
        }
        let earned = line_points(cleared);
        self.points = self.points.saturating_add(earned);
        self.drop_interval = drop_interval_for(self.points);
        earned
    }

    /// Moves down one row, locking when blocked.
    fn fall(&mut self) -> (u32, bool)
    {
        if self.shift(0, 1) {
            (0, true)
        } else {
            self.lock()
        }
    }

    fn hard_drop(&mut self) -> (u32, bool)
    {
        while self.shift(0, 1) {}
        self.lock()
    }
}

fn empty_board() -> Board
{
    vec![vec![None; BOARD_WIDTH]; BOARD_HEIGHT]
}

impl GameModule for Tetris
{
    fn id(&self) -> GameId
    {
        GameId::Tetris
    }

    fn init(&mut self, size: SurfaceSize)
    {
        let by_width = size.width_f() / BOARD_WIDTH as f32;
        let by_height = size.height_f() / BOARD_HEIGHT as f32;
        self.block = by_width.min(by_height).floor().max(1.0);
        self.origin_x = ((size.width_f() - self.block * BOARD_WIDTH as f32) / 2.0).max(0.0);
        self.board = empty_board();
        self.points = 0;
        self.drop_interval = drop_interval_for(0);
        self.since_drop = Duration::ZERO;
        self.queued.clear();
        self.blocked = !self.spawn();
    }

    fn on_input(&mut self, event: InputEvent)
    {
        let action = match event {
            InputEvent::Direction(Direction::Left) => Action::Left,
            InputEvent::Direction(Direction::Right) => Action::Right,
            InputEvent::Direction(Direction::Up) => Action::Rotate,
            InputEvent::Direction(Direction::Down) | InputEvent::Primary => Action::HardDrop,
            InputEvent::Pointer { .. } => return,
        };
        self.queued.push_back(action);
    }

    fn update(&mut self, elapsed: Duration) -> Step
    {
        if self.blocked {
            return Step::finished(0);
        }
        let mut points = 0;

        while let Some(action) = self.queued.pop_front() {
            let outcome = match action {
                Action::Left => {
                    self.shift(-1, 0);
                    continue;
                }
                Action::Right => {
                    self.shift(1, 0);
                    continue;
                }
                Action::Rotate => {
                    self.rotate_active();
                    continue;
                }
                Action::HardDrop => {
                    self.since_drop = Duration::ZERO;
                    self.hard_drop()
                }
            };
            points += outcome.0;
            if !outcome.1 {
                self.blocked = true;
                return Step::finished(points);
            }
        }

        self.since_drop += elapsed;
        while self.since_drop >= self.drop_interval {
            self.since_drop -= self.drop_interval;
            let (earned, spawned) = self.fall();
            points += earned;
            if !spawned {
                self.blocked = true;
                return Step::finished(points);
            }
        }
        Step::running(points)
    }

    fn render(&self, canvas: &mut dyn Canvas)
    {
        let block = self.block;
        let well = Rect::new(
            self.origin_x,
            0.0,
            block * BOARD_WIDTH as f32,
            block * BOARD_HEIGHT as f32,
        );
        canvas.stroke_rect(well, Rgb::GREY);
        for (r, row) in self.board.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(piece) = cell {
                    canvas.fill_rect(
                        Rect::new(self.origin_x + c as f32 * block, r as f32 * block, block, block),
                        piece.color(),
                    );
                }
            }
        }
        if let Some(active) = &self.active {
            for (r, row) in active.shape.iter().enumerate() {
                for (c, filled) in row.iter().enumerate() {
                    if *filled {
                        let x = self.origin_x + (active.x + c as i32) as f32 * block;
                        let y = (active.y + r as i32) as f32 * block;
                        canvas.fill_rect(Rect::new(x, y, block, block), active.piece.color());
                    }
                }
            }
        }
    }

    fn teardown(&mut self)
    {
        self.queued.clear();
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn started() -> Tetris
    {
        let mut tetris = Tetris::new(5);
        tetris.init(SurfaceSize::new(300, 600));
        tetris
    }

    /// Fills `rows` from the bottom, leaving columns 4 and 5 open.
    fn fill_with_gap(tetris: &mut Tetris, rows: usize)
    {
        for r in BOARD_HEIGHT - rows..BOARD_HEIGHT {
            for c in 0..BOARD_WIDTH {
                if c != 4 && c != 5 {
                    tetris.board[r][c] = Some(Piece::J);
                }
            }
        }
    }

    #[test]
    fn rotation_is_a_clockwise_transpose()
    {
        let t = Piece::T.shape();
        let rotated = rotate(&t);
        let expected: Shape = vec![
            vec![false, true, false],
            vec![false, true, true],
            vec![false, true, false],
        ];
        assert_eq!(rotated, expected);
        let full_turn = rotate(&rotate(&rotate(&rotated)));
        assert_eq!(full_turn, t);
    }

    #[test]
    fn rotation_that_would_collide_is_refused()
    {
        let mut tetris = started();
        tetris.spawn_piece(Piece::I);
        // The vertical I would cover column 5 rows 0..4.
        tetris.board[3][5] = Some(Piece::Z);
        let before = tetris.active.as_ref().map(|a| a.shape.clone());
        tetris.on_input(InputEvent::Direction(Direction::Up));
        tetris.update(Duration::ZERO);
        assert_eq!(tetris.active.as_ref().map(|a| a.shape.clone()), before);
    }

    #[test]
    fn two_rows_at_once_score_300()
    {
        let mut tetris = started();
        fill_with_gap(&mut tetris, 2);
        tetris.spawn_piece(Piece::O);
        tetris.on_input(InputEvent::Primary);
        let step = tetris.update(Duration::ZERO);
        assert_eq!(step, Step::running(300));
        assert!(tetris.board[BOARD_HEIGHT - 1].iter().all(Option::is_none));
    }

    #[test]
    fn score_table_is_super_linear()
    {
        assert_eq!(
            (1..=4).map(line_points).collect::<Vec<_>>(),
            vec![100, 300, 500, 800]
        );
    }

    #[test]
    fn drop_speeds_up_past_1000_points()
    {
        assert!(drop_interval_for(1100) < drop_interval_for(900));
        assert_eq!(drop_interval_for(0), Duration::from_millis(1000));
        assert_eq!(drop_interval_for(50_000), Duration::from_millis(100));

        let mut tetris = started();
        tetris.points = 900;
        fill_with_gap(&mut tetris, 2);
        tetris.spawn_piece(Piece::O);
        tetris.on_input(InputEvent::Direction(Direction::Down));
        tetris.update(Duration::ZERO);
        assert_eq!(tetris.points, 1200);
        assert!(tetris.drop_interval() < Duration::from_millis(1000));
    }

    #[test]
    fn gravity_follows_elapsed_time()
    {
        let mut tetris = started();
        tetris.spawn_piece(Piece::O);
        tetris.update(Duration::from_millis(999));
        assert_eq!(tetris.active.as_ref().map(|a| a.y), Some(0));
        tetris.update(Duration::from_millis(1));
        assert_eq!(tetris.active.as_ref().map(|a| a.y), Some(1));
    }

    #[test]
    fn blocked_spawn_ends_on_first_update_without_points()
    {
        let mut tetris = Tetris::new(9);
        tetris.init(SurfaceSize::new(300, 600));
        for c in 0..BOARD_WIDTH {
            tetris.board[0][c] = Some(Piece::Z);
            tetris.board[1][c] = Some(Piece::Z);
        }
        tetris.blocked = !tetris.spawn();
        assert!(tetris.is_blocked());
        assert_eq!(tetris.update(Duration::from_millis(16)), Step::finished(0));
    }

    #[test]
    fn topping_out_ends_the_game()
    {
        let mut tetris = started();
        for r in 2..BOARD_HEIGHT {
            tetris.board[r][0] = Some(Piece::L);
        }
        for c in 1..BOARD_WIDTH {
            tetris.board[2][c] = Some(Piece::L);
        }
        tetris.board[2][BOARD_WIDTH - 1] = None;
        tetris.spawn_piece(Piece::O);
        tetris.on_input(InputEvent::Primary);
        let step = tetris.update(Duration::ZERO);
        assert!(!step.continues);
    }

    #[test]
    fn render_does_not_touch_state()
    {
        let tetris = started();
        let mut canvas = crate::surface::CellCanvas::new(SurfaceSize::new(300, 600));
        let before = tetris.board.clone();
        tetris.render(&mut canvas);
        assert_eq!(tetris.board, before);
        assert!(canvas.plain_lines().iter().any(|line| line.contains('█')));
    }
}
