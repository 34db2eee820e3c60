use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, ControlCmd};
use crate::disc::DiscSnapshot;
use crate::metadata::{MetadataRequest, MetadataResult, MetadataWorker};
use crate::mpris::MprisHandle;
use crate::playback::{MediaPlayer, PlayerEvent};
use crate::runtime::mpris_sync::MprisSync;
use crate::ui;

/// Everything background threads hand to the UI context.
#[derive(Debug)]
pub enum AppEvent {
    Disc(DiscSnapshot),
    Metadata(MetadataResult),
    Player(PlayerEvent),
}

/// Collaborators the event loop talks to besides the app itself.
pub struct EventSources<'a> {
    pub events: &'a Receiver<AppEvent>,
    pub controls: &'a Receiver<ControlCmd>,
    pub metadata: Option<&'a MetadataWorker>,
    pub mpris: Option<&'a MprisHandle>,
    pub progress_tick: Duration,
}

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    last_tick: Instant,
    mpris: MprisSync,
}

impl EventLoopState {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            mpris: MprisSync::default(),
        }
    }
}

impl Default for EventLoopState {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a key press to a command. Anything unmapped is ignored.
pub fn key_to_command(key: KeyEvent) -> Option<ControlCmd> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(ControlCmd::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(' ') | KeyCode::Char('p') => Some(ControlCmd::PlayPause),
        KeyCode::Char('h') | KeyCode::Left => Some(ControlCmd::Previous),
        KeyCode::Char('l') | KeyCode::Right => Some(ControlCmd::Next),
        KeyCode::Char('s') => Some(ControlCmd::Stop),
        KeyCode::Char('q') => Some(ControlCmd::Quit),
        KeyCode::Esc => Some(ControlCmd::ToggleFullscreen),
        _ => None,
    }
}

/// Apply one background event. Returns a metadata lookup to queue, if any.
pub fn handle_app_event<P: MediaPlayer>(
    event: AppEvent,
    app: &mut App<P>,
) -> Option<MetadataRequest> {
    match event {
        AppEvent::Disc(snapshot) => app.apply_disc_snapshot(snapshot),
        AppEvent::Metadata(result) => {
            app.apply_metadata(result);
            None
        }
        AppEvent::Player(ev) => {
            app.handle_player_event(ev);
            None
        }
    }
}

/// Drain pending background events and commands into `app`.
///
/// Returns false once the event channel is closed.
pub fn pump<P: MediaPlayer>(app: &mut App<P>, sources: &EventSources<'_>) -> bool {
    let mut open = true;
    loop {
        match sources.events.try_recv() {
            Ok(ev) => {
                if let Some(request) = handle_app_event(ev, app) {
                    let queued = sources
                        .metadata
                        .is_some_and(|worker| worker.request(request));
                    if !queued {
                        log::warn!("Metadata worker unavailable");
                    }
                }
            }
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                open = false;
                break;
            }
        }
    }

    while let Ok(cmd) = sources.controls.try_recv() {
        app.handle_control(cmd);
    }
    open
}

/// Main terminal event loop: handles input, UI drawing, background events
/// and MPRIS. Returns `Ok(())` when shutdown is requested.
pub fn run<P: MediaPlayer>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App<P>,
    sources: &EventSources<'_>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        if !pump(app, sources) {
            log::warn!("Event channel closed");
        }
        if app.should_quit {
            return Ok(());
        }

        if state.last_tick.elapsed() >= sources.progress_tick {
            app.tick_progress();
            state.last_tick = Instant::now();
        }

        if let Some(mpris) = sources.mpris {
            state.mpris.update(mpris, app);
        }

        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(cmd) = key_to_command(key) {
                    app.handle_control(cmd);
                }
            }
        }
    }
}
