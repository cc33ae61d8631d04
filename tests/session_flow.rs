//! Session lifecycle scenarios driven through the public controller API.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use mind_chill::games::{GameId, GameModule, Step};
use mind_chill::input::{Direction, HubInput, InputEvent, InputRouter, Routed};
use mind_chill::scheduler::ManualScheduler;
use mind_chill::scores::{BestScore, HIGH_SCORES_KEY, KeyValueStore, MemoryStore};
use mind_chill::session::{SessionController, Status};
use mind_chill::surface::{Canvas, CellCanvas, SurfaceSize};
use mind_chill::HubError;

const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Default)]
struct Log
{
    updates: Vec<Duration>,
    inputs: Vec<InputEvent>,
    torn_down: bool,
}

/// Ends with `final_score` after `frames` updates and records what it saw.
struct Scripted
{
    id: GameId,
    frames: usize,
    final_score: u32,
    log: Rc<RefCell<Log>>,
}

impl Scripted
{
    fn new(id: GameId, frames: usize, final_score: u32) -> (Box<dyn GameModule>, Rc<RefCell<Log>>)
    {
        let log = Rc::new(RefCell::new(Log::default()));
        let module = Scripted {
            id,
            frames,
            final_score,
            log: Rc::clone(&log),
        };
        (Box::new(module), log)
    }
}

impl GameModule for Scripted
{
    fn id(&self) -> GameId
    {
        self.id
    }

    fn init(&mut self, _size: SurfaceSize) {}

    fn on_input(&mut self, event: InputEvent)
    {
        self.log.borrow_mut().inputs.push(event);
    }

    fn update(&mut self, elapsed: Duration) -> Step
    {
        let mut log = self.log.borrow_mut();
        log.updates.push(elapsed);
        if log.updates.len() >= self.frames {
            Step::finished(self.final_score)
        } else {
            Step::running(0)
        }
    }

    fn render(&self, canvas: &mut dyn Canvas)
    {
        canvas.draw_text(0.0, 0.0, "scripted", mind_chill::surface::Rgb::WHITE);
    }

    fn teardown(&mut self)
    {
        self.log.borrow_mut().torn_down = true;
    }
}

fn controller() -> SessionController<ManualScheduler, MemoryStore>
{
    SessionController::with_seed(
        ManualScheduler::new(),
        MemoryStore::new(),
        SurfaceSize::new(1000, 1000),
        42,
    )
    .expect("controller")
}

fn frame(
    hub: &mut SessionController<ManualScheduler, MemoryStore>,
    canvas: &mut CellCanvas,
) -> Option<mind_chill::GameOverSummary>
{
    hub.scheduler_mut().advance(FRAME);
    hub.pump(canvas)
}

#[test]
fn ball_dash_best_only_moves_up()
{
    let mut hub = controller();
    let mut canvas = CellCanvas::new(SurfaceSize::new(480, 320));
    assert_eq!(hub.scores().get(GameId::BallDash), BestScore::Value(0));

    let (module, _) = Scripted::new(GameId::BallDash, 1, 50);
    hub.start_module(module);
    let summary = frame(&mut hub, &mut canvas).expect("game over");
    assert!(summary.is_new_high_score);
    assert_eq!(summary.final_score_text, "50");
    assert_eq!(summary.message(), "New High Score!");
    assert_eq!(hub.scores().get(GameId::BallDash), BestScore::Value(50));

    let (module, _) = Scripted::new(GameId::BallDash, 1, 30);
    hub.start_module(module);
    let summary = frame(&mut hub, &mut canvas).expect("game over");
    assert!(!summary.is_new_high_score);
    assert_eq!(summary.best_score_text, "50");
    assert_eq!(summary.message(), "High Score: 50");

    let raw = hub
        .scores()
        .backend()
        .get(HIGH_SCORES_KEY)
        .expect("record written");
    let record: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(record["ballDash"], 50);
    assert_eq!(record["memoryMatch"], "N/A");
}

#[test]
fn game_over_stops_the_loop_and_keeps_the_summary()
{
    let mut hub = controller();
    let mut canvas = CellCanvas::new(SurfaceSize::new(300, 300));
    let (module, log) = Scripted::new(GameId::Snake, 3, 20);
    hub.start_module(module);

    assert_eq!(frame(&mut hub, &mut canvas), None);
    assert_eq!(frame(&mut hub, &mut canvas), None);
    let summary = frame(&mut hub, &mut canvas).expect("game over");

    assert_eq!(hub.status(), Status::Over);
    assert_eq!(hub.score(), 20);
    assert_eq!(hub.summary(), Some(&summary));
    assert!(hub.scheduler().pending().is_empty());
    assert!(log.borrow().torn_down);

    assert_eq!(frame(&mut hub, &mut canvas), None);
    assert_eq!(log.borrow().updates.len(), 3);
}

#[test]
fn elapsed_time_comes_from_tick_timestamps()
{
    let mut hub = controller();
    let mut canvas = CellCanvas::new(SurfaceSize::new(300, 300));
    let (module, log) = Scripted::new(GameId::Snake, 100, 0);
    hub.start_module(module);

    frame(&mut hub, &mut canvas);
    frame(&mut hub, &mut canvas);
    hub.scheduler_mut().advance(FRAME * 2);
    hub.pump(&mut canvas);

    assert_eq!(log.borrow().updates, vec![Duration::ZERO, FRAME, FRAME * 2]);
    assert!(canvas.plain_lines()[0].starts_with("scripted"));
}

#[test]
fn stale_tick_after_restart_never_reaches_a_module()
{
    let mut hub = controller();
    let mut canvas = CellCanvas::new(SurfaceSize::new(300, 300));
    let (first, first_log) = Scripted::new(GameId::TargetClick, 100, 0);
    hub.start_module(first);
    let stale = hub.session().loop_handle.expect("handle");

    // The first module's tick is due but not yet delivered.
    hub.scheduler_mut().advance(FRAME);
    let (second, second_log) = Scripted::new(GameId::TargetClick, 100, 0);
    hub.start_module(second);

    assert!(hub.scheduler().cancelled().contains(&stale));
    assert_eq!(hub.pump(&mut canvas), None);
    assert!(first_log.borrow().updates.is_empty());
    assert!(first_log.borrow().torn_down);
    assert!(second_log.borrow().updates.is_empty());

    frame(&mut hub, &mut canvas);
    assert!(first_log.borrow().updates.is_empty());
    assert_eq!(second_log.borrow().updates.len(), 1);
}

#[test]
fn reset_from_any_state_returns_to_idle()
{
    let mut hub = controller();
    let mut canvas = CellCanvas::new(SurfaceSize::new(300, 300));
    hub.reset();
    assert_eq!(hub.status(), Status::Idle);

    let (module, log) = Scripted::new(GameId::Tetris, 1, 100);
    hub.start_module(module);
    frame(&mut hub, &mut canvas).expect("game over");
    hub.reset();
    assert_eq!(hub.status(), Status::Idle);
    assert_eq!(hub.summary(), None);
    assert_eq!(hub.hud(), None);
    assert!(matches!(hub.restart(), Err(HubError::NoActiveGame)));
    assert_eq!(log.borrow().updates.len(), 1);
}

#[test]
fn router_only_feeds_the_running_game()
{
    let mut hub = controller();
    let mut canvas = CellCanvas::new(SurfaceSize::new(300, 300));
    let left = InputEvent::Direction(Direction::Left);

    assert_eq!(
        InputRouter::route(&mut hub, HubInput::Game { origin: GameId::Snake, event: left }),
        Routed::Dropped
    );
    assert_eq!(InputRouter::route(&mut hub, HubInput::Cancel), Routed::Dropped);

    let (module, log) = Scripted::new(GameId::Snake, 2, 0);
    hub.start_module(module);
    assert_eq!(
        InputRouter::route(&mut hub, HubInput::Game { origin: GameId::Tetris, event: left }),
        Routed::Dropped
    );
    assert_eq!(
        InputRouter::route(&mut hub, HubInput::Game { origin: GameId::Snake, event: left }),
        Routed::Delivered
    );
    assert_eq!(log.borrow().inputs, vec![left]);

    frame(&mut hub, &mut canvas);
    frame(&mut hub, &mut canvas).expect("game over");
    assert_eq!(
        InputRouter::route(&mut hub, HubInput::Game { origin: GameId::Snake, event: left }),
        Routed::Dropped
    );
    assert_eq!(log.borrow().inputs.len(), 1);

    assert_eq!(InputRouter::route(&mut hub, HubInput::Cancel), Routed::Reset);
    assert_eq!(hub.status(), Status::Idle);
}

#[test]
fn cancel_while_running_tears_down_and_unschedules()
{
    let mut hub = controller();
    let mut canvas = CellCanvas::new(SurfaceSize::new(300, 300));
    let (module, log) = Scripted::new(GameId::SpaceInvaders, 100, 0);
    hub.start_module(module);
    frame(&mut hub, &mut canvas);

    assert_eq!(InputRouter::route(&mut hub, HubInput::Cancel), Routed::Reset);
    assert!(log.borrow().torn_down);
    assert!(hub.scheduler().pending().is_empty());
    frame(&mut hub, &mut canvas);
    assert_eq!(log.borrow().updates.len(), 1);
}

#[test]
fn a_real_snake_run_ends_and_is_scored()
{
    let mut hub = controller();
    hub.start_game(GameId::Snake);
    let mut canvas = CellCanvas::new(hub.surface_size());
    let mut summary = None;
    for _ in 0..500 {
        hub.scheduler_mut().advance(Duration::from_millis(50));
        summary = hub.pump(&mut canvas);
        if summary.is_some() {
            break;
        }
    }
    let summary = summary.expect("snake crashes into the top wall");
    assert_eq!(summary.game, GameId::Snake);
    assert_eq!(summary.is_new_high_score, summary.final_score > 0);
    assert_eq!(hub.status(), Status::Over);
    assert_eq!(
        hub.scores().get(GameId::Snake),
        BestScore::Value(summary.final_score)
    );
}

#[test]
fn unknown_names_are_rejected()
{
    let mut hub = controller();
    assert!(matches!(hub.start("minesweeper"), Err(HubError::UnknownGame(_))));
    assert_eq!(hub.status(), Status::Idle);
    hub.start("memoryMatch").expect("known game");
    assert_eq!(hub.active_game(), Some(GameId::MemoryMatch));
}
