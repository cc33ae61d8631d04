use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{GameId, GameModule, Step};
use crate::input::{Direction, InputEvent};
use crate::surface::{Canvas, Rect, Rgb, SurfaceSize};
use crate::timers::Timers;

const GRID: usize = 4;
const PAIRS: usize = GRID * GRID / 2;
const CARD_GAP: f32 = 10.0;
const CLOCK_PERIOD: Duration = Duration::from_secs(1);
const REVEAL_DELAY: Duration = Duration::from_secs(1);

const SYMBOLS: [char; PAIRS] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face
{
    Down,
    Up,
    Matched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card
{
    pub symbol: char,
    pub face: Face,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer
{
    Clock,
    Reveal,
}

pub struct MemoryMatch
{
    rng: StdRng,
    cards: Vec<Card>,
    card_size: f32,
    origin: (f32, f32),
    cursor: usize,
    flipped: Vec<usize>,
    matched_pairs: usize,
    timers: Timers<Timer>,
    clock_started: bool,
    queued: VecDeque<InputEvent>,
}

impl MemoryMatch
{
    pub fn new(seed: u64) -> Self
    {
        Self {
            rng: StdRng::seed_from_u64(seed),
            cards: Vec::new(),
            card_size: 0.0,
            origin: (0.0, 0.0),
            cursor: 0,
            flipped: Vec::with_capacity(2),
            matched_pairs: 0,
            timers: Timers::new(),
            clock_started: false,
            queued: VecDeque::new(),
        }
    }

    pub fn cards(&self) -> &[Card]
    {
        &self.cards
    }

    pub fn active_timers(&self) -> usize
    {
        self.timers.len()
    }

    fn card_rect(&self, index: usize) -> Rect
    {
        let (row, col) = (index / GRID, index % GRID);
        let step = self.card_size + CARD_GAP;
        Rect::new(
            self.origin.0 + col as f32 * step,
            self.origin.1 + row as f32 * step,
            self.card_size,
            self.card_size,
        )
    }

    fn card_at(&self, x: f32, y: f32) -> Option<usize>
    {
        (0..self.cards.len()).find(|index| self.card_rect(*index).contains(x, y))
    }

    fn move_cursor(&mut self, direction: Direction)
    {
        let (dx, dy) = direction.delta();
        let col = (self.cursor % GRID) as i32 + dx;
        let row = (self.cursor / GRID) as i32 + dy;
        if (0..GRID as i32).contains(&col) && (0..GRID as i32).contains(&row) {
            self.cursor = row as usize * GRID + col as usize;
        }
    }

    fn flip(&mut self, index: usize)
    {
        if self.flipped.len() >= 2 {
            return;
        }
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        if card.face != Face::Down {
            return;
        }
        card.face = Face::Up;
        self.flipped.push(index);

        if !self.clock_started {
            self.clock_started = true;
            self.timers.every(CLOCK_PERIOD, Timer::Clock);
        }
        if self.flipped.len() == 2 {
            self.timers.once(REVEAL_DELAY, Timer::Reveal);
        }
    }

    fn reveal(&mut self)
    {
        if let &[a, b] = self.flipped.as_slice() {
            let face = if self.cards[a].symbol == self.cards[b].symbol {
                self.matched_pairs += 1;
                Face::Matched
            } else {
                Face::Down
            };
            self.cards[a].face = face;
            self.cards[b].face = face;
        }
        self.flipped.clear();
    }
}

impl GameModule for MemoryMatch
{
    fn id(&self) -> GameId
    {
        GameId::MemoryMatch
    }

    fn init(&mut self, size: SurfaceSize)
    {
        let side = size.width_f().min(size.height_f());
        self.card_size = ((side - CARD_GAP * (GRID as f32 - 1.0)) / GRID as f32).max(1.0);
        let used = self.card_size * GRID as f32 + CARD_GAP * (GRID as f32 - 1.0);
        self.origin = (
            ((size.width_f() - used) / 2.0).max(0.0),
            ((size.height_f() - used) / 2.0).max(0.0),
        );

        let mut symbols: Vec<char> = SYMBOLS.iter().chain(SYMBOLS.iter()).copied().collect();
        symbols.shuffle(&mut self.rng);
        self.cards = symbols
            .into_iter()
            .map(|symbol| Card {
                symbol,
                face: Face::Down,
            })
            .collect();
        self.cursor = 0;
        self.flipped.clear();
        self.matched_pairs = 0;
        self.timers.cancel_all();
        self.clock_started = false;
        self.queued.clear();
    }

    fn on_input(&mut self, event: InputEvent)
    {
        self.queued.push_back(event);
    }

    fn update(&mut self, elapsed: Duration) -> Step
    {
        // Timers armed by this frame's flips start counting from the next frame.
        let mut seconds = 0;
        for fired in self.timers.advance(elapsed) {
            match fired {
                Timer::Clock => seconds += 1,
                Timer::Reveal => self.reveal(),
            }
        }

        while let Some(event) = self.queued.pop_front() {
            match event {
                InputEvent::Direction(direction) => self.move_cursor(direction),
                InputEvent::Primary => self.flip(self.cursor),
                InputEvent::Pointer { x, y } => {
                    if let Some(index) = self.card_at(x, y) {
                        self.cursor = index;
                        self.flip(index);
                    }
                }
            }
        }

        if self.matched_pairs == PAIRS {
            self.timers.cancel_all();
            return Step::finished(seconds);
        }
        Step::running(seconds)
    }

    fn render(&self, canvas: &mut dyn Canvas)
    {
        for (index, card) in self.cards.iter().enumerate() {
            let rect = self.card_rect(index);
            let (cx, cy) = rect.center();
            match card.face {
                Face::Down => canvas.fill_rect(rect, Rgb::BLUE),
                Face::Up => {
                    canvas.fill_rect(rect, Rgb::WHITE.dimmed(0.7));
                    canvas.draw_text(cx, cy, &card.symbol.to_string(), Rgb::WHITE);
                }
                Face::Matched => {
                    canvas.fill_rect(rect, Rgb::GREEN.dimmed(0.6));
                    canvas.draw_text(cx, cy, &card.symbol.to_string(), Rgb::GREEN);
                }
            }
            if index == self.cursor {
                canvas.stroke_rect(rect, Rgb::GOLD);
            }
        }
    }

    fn teardown(&mut self)
    {
        self.timers.cancel_all();
        self.queued.clear();
    }
}
