//! Terminal front end: menu, HUD, play field and game-over screen.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use tracing::info;

use crate::config::HubConfig;
use crate::games::{self, GameId};
use crate::input::{self, HubInput, InputRouter, Routed, VirtualButton};
use crate::scheduler::{FrameScheduler, Scheduler};
use crate::scores::{FileStore, KeyValueStore};
use crate::session::{SessionController, Status};
use crate::surface::{Canvas, CellCanvas, SurfaceSize};

/// Rows above the play field: title/HUD and a spacer.
const CANVAS_TOP: u16 = 2;
/// Rows below the play field: virtual pad, help line, slack.
const FOOTER_ROWS: u16 = 3;
const IDLE_POLL: Duration = Duration::from_millis(50);
const BUTTON_STRIDE: u16 = 4;

struct TerminalGuard
{
    stdout: Stdout,
}

impl TerminalGuard
{
    fn enter() -> io::Result<Self>
    {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, Hide)?;
        Ok(Self { stdout })
    }

    fn stdout(&mut self) -> &mut Stdout
    {
        &mut self.stdout
    }
}

impl Drop for TerminalGuard
{
    fn drop(&mut self)
    {
        let _ = execute!(self.stdout, Show, DisableMouseCapture, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen
{
    Menu { selected: usize },
    Playing,
    GameOver,
}

enum Flow
{
    Continue,
    Quit,
}

type Controller = SessionController<FrameScheduler, FileStore>;

/// Layout area for a terminal of `cols` x `rows`.
pub fn available_area(cols: u16, rows: u16) -> SurfaceSize
{
    SurfaceSize::from_cells(cols, rows.saturating_sub(CANVAS_TOP + FOOTER_ROWS))
}

/// Runs the interactive hub until the player quits. `start` skips the menu.
pub fn run(config: &HubConfig, start: Option<GameId>) -> Result<(), String>
{
    let (cols, rows) = terminal::size().unwrap_or((80, 24));
    let scheduler = FrameScheduler::new(config.frame_interval());
    let store = FileStore::new(&config.data_dir);
    let mut controller = SessionController::new(scheduler, store, available_area(cols, rows))
        .map_err(|err| err.to_string())?;
    info!(fps = config.fps, data_dir = %config.data_dir.display(), "hub started");

    let mut term = TerminalGuard::enter().map_err(|err| err.to_string())?;
    let mut screen = Screen::Menu { selected: 0 };
    if let Some(game) = start {
        controller.start_game(game);
        screen = Screen::Playing;
    }
    let mut canvas = CellCanvas::new(controller.surface_size());

    loop {
        let wait = match screen {
            Screen::Playing => controller
                .scheduler()
                .time_until_due()
                .unwrap_or(IDLE_POLL)
                .min(IDLE_POLL),
            _ => IDLE_POLL,
        };
        if event::poll(wait).map_err(|err| err.to_string())? {
            let event = event::read().map_err(|err| err.to_string())?;
            if let Flow::Quit = handle_event(&mut controller, &mut screen, &canvas, event)? {
                break;
            }
        }
        if canvas.size() != controller.surface_size() {
            canvas = CellCanvas::new(controller.surface_size());
        }
        if screen == Screen::Playing {
            if controller.pump(&mut canvas).is_some() {
                screen = Screen::GameOver;
            } else if controller.status() == Status::Idle {
                screen = Screen::Menu { selected: 0 };
            }
        }
        draw(term.stdout(), &controller, screen, &canvas)?;
    }

    controller.reset();
    info!("hub closed");
    Ok(())
}

fn handle_event(
    controller: &mut Controller,
    screen: &mut Screen,
    canvas: &CellCanvas,
    event: Event,
) -> Result<Flow, String>
{
    match event {
        Event::Resize(cols, rows) => {
            controller
                .resize(available_area(cols, rows))
                .map_err(|err| err.to_string())?;
            Ok(Flow::Continue)
        }
        Event::Key(key) if key.kind != KeyEventKind::Release => match *screen {
            Screen::Menu { selected } => Ok(menu_key(controller, screen, selected, key)),
            Screen::Playing => {
                let input = key_input(controller, key);
                playing_input(controller, screen, input);
                Ok(Flow::Continue)
            }
            Screen::GameOver => game_over_key(controller, screen, key),
        },
        Event::Mouse(mouse) => {
            match *screen {
                Screen::Menu { .. } => menu_click(controller, screen, mouse),
                Screen::Playing => {
                    let input = mouse_input(controller, canvas, mouse);
                    playing_input(controller, screen, input);
                }
                Screen::GameOver => {}
            }
            Ok(Flow::Continue)
        }
        _ => Ok(Flow::Continue),
    }
}

fn key_input(controller: &Controller, key: KeyEvent) -> Option<HubInput>
{
    let game = controller.active_game()?;
    input::map_key(key, game)
}

fn mouse_input(controller: &Controller, canvas: &CellCanvas, mouse: MouseEvent) -> Option<HubInput>
{
    let game = controller.active_game()?;
    let canvas_cells = (canvas.cols() as u16, canvas.rows() as u16);
    if let Some(input) = input::map_mouse(mouse, (0, CANVAS_TOP), canvas_cells, game) {
        return Some(input);
    }
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return None;
    }
    let pad_row = CANVAS_TOP + canvas_cells.1;
    if mouse.row != pad_row {
        return None;
    }
    let button = button_at(game.descriptor().buttons, mouse.column)?;
    Some(HubInput::Game {
        origin: game,
        event: button.event(),
    })
}

/// The virtual pad button under terminal column `col`.
fn button_at(buttons: &[VirtualButton], col: u16) -> Option<VirtualButton>
{
    if col % BUTTON_STRIDE >= BUTTON_STRIDE - 1 {
        return None;
    }
    buttons.get((col / BUTTON_STRIDE) as usize).copied()
}

fn playing_input(controller: &mut Controller, screen: &mut Screen, input: Option<HubInput>)
{
    let Some(input) = input else {
        return;
    };
    if InputRouter::route(controller, input) == Routed::Reset {
        *screen = Screen::Menu { selected: 0 };
    }
}

fn menu_key(
    controller: &mut Controller,
    screen: &mut Screen,
    selected: usize,
    key: KeyEvent,
) -> Flow
{
    let count = GameId::ALL.len();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Flow::Quit,
        KeyCode::Up | KeyCode::Char('w') => {
            *screen = Screen::Menu {
                selected: (selected + count - 1) % count,
            };
        }
        KeyCode::Down | KeyCode::Char('s') => {
            *screen = Screen::Menu {
                selected: (selected + 1) % count,
            };
        }
        KeyCode::Enter | KeyCode::Char(' ') => launch(controller, screen, GameId::ALL[selected]),
        KeyCode::Char(ch) => {
            if let Some(index) = ch.to_digit(10) {
                let index = index as usize;
                if index >= 1 && index <= count {
                    launch(controller, screen, GameId::ALL[index - 1]);
                }
            }
        }
        _ => {}
    }
    Flow::Continue
}

fn menu_click(controller: &mut Controller, screen: &mut Screen, mouse: MouseEvent)
{
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let Some(index) = mouse.row.checked_sub(MENU_FIRST_ROW) else {
        return;
    };
    if let Some(game) = GameId::ALL.get(index as usize) {
        launch(controller, screen, *game);
    }
}

fn launch(controller: &mut Controller, screen: &mut Screen, game: GameId)
{
    controller.start_game(game);
    *screen = Screen::Playing;
}

fn game_over_key(
    controller: &mut Controller,
    screen: &mut Screen,
    key: KeyEvent,
) -> Result<Flow, String>
{
    match key.code {
        KeyCode::Char('r') | KeyCode::Enter => {
            controller.restart().map_err(|err| err.to_string())?;
            *screen = Screen::Playing;
        }
        KeyCode::Char('m') | KeyCode::Esc => {
            InputRouter::route(controller, HubInput::Cancel);
            *screen = Screen::Menu { selected: 0 };
        }
        KeyCode::Char('q') => return Ok(Flow::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Ok(Flow::Quit);
        }
        _ => {}
    }
    Ok(Flow::Continue)
}

const MENU_FIRST_ROW: u16 = 4;

/// Menu screen. Game rows start at [`MENU_FIRST_ROW`].
pub fn menu_lines<S, K>(controller: &SessionController<S, K>, selected: usize) -> Vec<String>
where
    S: Scheduler,
    K: KeyValueStore,
{
    let mut lines = Vec::new();
    lines.push("Mind Chill".to_string());
    lines.push(String::new());
    lines.push(format!("  {:<3} {:<16} {}", "", "Game", "Best"));
    lines.push(String::new());
    for (idx, game) in games::registry().iter().enumerate() {
        let marker = if idx == selected { ">" } else { " " };
        lines.push(format!(
            "{} {:<3} {:<16} {:<10} {}",
            marker,
            format!("{}.", idx + 1),
            game.title,
            controller.best_score_text(game.id),
            game.description
        ));
    }
    lines.push(String::new());
    lines.push("Arrows/WASD + Enter, 1-6, or click to play. q to quit.".to_string());
    lines
}

/// Header, play field, pad, and help line for a running game.
pub fn playing_lines<S, K>(controller: &SessionController<S, K>, canvas: &CellCanvas) -> Vec<String>
where
    S: Scheduler,
    K: KeyValueStore,
{
    let mut lines = Vec::new();
    match controller.hud() {
        Some(hud) => {
            let best = controller
                .active_game()
                .map(|game| controller.best_score_text(game))
                .unwrap_or_default();
            lines.push(format!("{}   {}   Best: {}", hud.title, hud.score_text, best));
        }
        None => lines.push(String::new()),
    }
    lines.push(String::new());
    lines.extend(canvas.lines());
    let buttons = controller
        .active_game()
        .map(|game| game.descriptor().buttons)
        .unwrap_or(&[]);
    lines.push(
        buttons
            .iter()
            .map(|button| button.label())
            .collect::<Vec<_>>()
            .join(" "),
    );
    lines.push("Esc: back to menu".to_string());
    lines
}

pub fn game_over_lines<S, K>(controller: &SessionController<S, K>) -> Vec<String>
where
    S: Scheduler,
    K: KeyValueStore,
{
    let mut lines = Vec::new();
    let Some(summary) = controller.summary() else {
        return lines;
    };
    lines.push(format!("{}: game over", summary.game.title()));
    lines.push(String::new());
    lines.push(summary.game.metric().label(summary.final_score));
    lines.push(summary.message());
    if summary.is_new_high_score {
        lines.push(format!("Best: {}", summary.best_score_text));
    }
    lines.push(String::new());
    lines.push("r: play again   m: menu   q: quit".to_string());
    lines
}

fn draw(
    stdout: &mut Stdout,
    controller: &Controller,
    screen: Screen,
    canvas: &CellCanvas,
) -> Result<(), String>
{
    let lines = match screen {
        Screen::Menu { selected } => menu_lines(controller, selected),
        Screen::Playing => playing_lines(controller, canvas),
        Screen::GameOver => game_over_lines(controller),
    };
    let output = format!("{}\r\n", lines.join("\r\n"));

    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))
        .map_err(|err| err.to_string())?;
    stdout.write_all(output.as_bytes()).map_err(|err| err.to_string())?;
    stdout.flush().map_err(|err| err.to_string())?;

    Ok(())
}
