use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tracing::debug;

use crate::games::GameId;
use crate::scheduler::Scheduler;
use crate::scores::KeyValueStore;
use crate::session::{SessionController, Status};
use crate::surface::{CELL_HEIGHT_PX, CELL_WIDTH_PX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction
{
    Up,
    Down,
    Left,
    Right,
}

impl Direction
{
    pub fn delta(self) -> (i32, i32)
    {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction
    {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Normalized input a game module consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent
{
    Direction(Direction),
    Primary,
    /// Click in surface pixel coordinates.
    Pointer { x: f32, y: f32 },
}

/// On-screen pad for pointer-only play; maps to the same events as keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualButton
{
    Up,
    Down,
    Left,
    Right,
    Action,
}

impl VirtualButton
{
    pub fn event(self) -> InputEvent
    {
        match self {
            VirtualButton::Up => InputEvent::Direction(Direction::Up),
            VirtualButton::Down => InputEvent::Direction(Direction::Down),
            VirtualButton::Left => InputEvent::Direction(Direction::Left),
            VirtualButton::Right => InputEvent::Direction(Direction::Right),
            VirtualButton::Action => InputEvent::Primary,
        }
    }

    pub fn label(self) -> &'static str
    {
        match self {
            VirtualButton::Up => "[^]",
            VirtualButton::Down => "[v]",
            VirtualButton::Left => "[<]",
            VirtualButton::Right => "[>]",
            VirtualButton::Action => "[*]",
        }
    }
}

/// Input as it arrives at the hub, before routing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HubInput
{
    /// Leave the current game, whatever it is.
    Cancel,
    /// Input produced while `origin` was on screen.
    Game { origin: GameId, event: InputEvent },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed
{
    Delivered,
    Dropped,
    Reset,
}

pub struct InputRouter;

impl InputRouter
{
    /// Delivers `input` to the active module only while its session is
    /// running. Cancel resets a running or finished session.
    pub fn route<S, K>(controller: &mut SessionController<S, K>, input: HubInput) -> Routed
    where
        S: Scheduler,
        K: KeyValueStore,
    {
        match input {
            HubInput::Cancel => match controller.status() {
                Status::Running | Status::Over => {
                    controller.reset();
                    Routed::Reset
                }
                Status::Idle => Routed::Dropped,
            },
            HubInput::Game { origin, event } => {
                let live = controller.status() == Status::Running
                    && controller.active_game() == Some(origin);
                if live && controller.deliver(event) {
                    Routed::Delivered
                } else {
                    debug!(?origin, ?event, "dropping input");
                    Routed::Dropped
                }
            }
        }
    }
}

/// Keyboard mapping shared by every game. Esc is the global cancel.
pub fn map_key(key: KeyEvent, origin: GameId) -> Option<HubInput>
{
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let event = match key.code {
        KeyCode::Esc => return Some(HubInput::Cancel),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(HubInput::Cancel);
        }
        KeyCode::Up | KeyCode::Char('w') => InputEvent::Direction(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') => InputEvent::Direction(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') => InputEvent::Direction(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') => InputEvent::Direction(Direction::Right),
        KeyCode::Char(' ') | KeyCode::Enter => InputEvent::Primary,
        _ => return None,
    };
    Some(HubInput::Game { origin, event })
}

/// Translates a left click into surface pixels. `origin` is the terminal cell
/// where the canvas starts; clicks outside the canvas are ignored.
pub fn map_mouse(
    mouse: MouseEvent,
    origin: (u16, u16),
    canvas_cells: (u16, u16),
    game: GameId,
) -> Option<HubInput>
{
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return None;
    }
    let col = mouse.column.checked_sub(origin.0)?;
    let row = mouse.row.checked_sub(origin.1)?;
    if col >= canvas_cells.0 || row >= canvas_cells.1 {
        return None;
    }
    let x = col as f32 * CELL_WIDTH_PX as f32 + CELL_WIDTH_PX as f32 / 2.0;
    let y = row as f32 * CELL_HEIGHT_PX as f32 + CELL_HEIGHT_PX as f32 / 2.0;
    Some(HubInput::Game {
        origin: game,
        event: InputEvent::Pointer { x, y },
    })
}
