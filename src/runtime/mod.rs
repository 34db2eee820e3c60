use std::sync::mpsc;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use log::LevelFilter;
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, ControlCmd};
use crate::disc::{CommandEnumerator, CommandProbe, DiscMonitor, MonitorLoop};
use crate::logging::init_logging;
use crate::metadata::{MetadataWorker, MusicBrainzClient};
use crate::playback::{CddaPlayer, PlaybackController};

mod event_loop;
mod mpris_sync;
mod settings;

use event_loop::AppEvent;

#[cfg(test)]
mod tests;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_warning) = settings::load_settings();

    let level = settings.log_level().unwrap_or(LevelFilter::Info);
    init_logging(&settings.logging, level);
    if let Some(warning) = config_warning {
        log::warn!("{warning}");
    }
    log::info!("Watching {}", settings.drive.device);

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();

    let player_tx = event_tx.clone();
    let player = CddaPlayer::new(&settings.playback, move |ev| {
        let _ = player_tx.send(AppEvent::Player(ev));
    });
    let controller = PlaybackController::new(
        player,
        settings.drive.device.as_str(),
        settings.playback.end_of_disc,
    );
    let mut app = App::new(controller)
        .with_fullscreen(settings.ui.start_fullscreen)
        .with_header(settings.ui.header_text.as_str())
        .with_metadata(settings.metadata.enabled);

    let mut metadata = if settings.metadata.enabled {
        let metadata_tx = event_tx.clone();
        match MetadataWorker::spawn(MusicBrainzClient::new(&settings.metadata), move |r| {
            let _ = metadata_tx.send(AppEvent::Metadata(r));
        }) {
            Ok(worker) => Some(worker),
            Err(e) => {
                log::error!("Failed to start metadata worker: {e}");
                None
            }
        }
    } else {
        None
    };

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = settings
        .mpris
        .enabled
        .then(|| crate::mpris::spawn_mpris(control_tx));

    let disc_tx = event_tx;
    let mut monitor = DiscMonitor::spawn(
        MonitorLoop::new(
            CommandProbe::new(&settings.drive),
            CommandEnumerator::new(&settings.drive),
        ),
        Duration::from_millis(settings.drive.poll_interval_ms),
        move |snapshot| {
            let _ = disc_tx.send(AppEvent::Disc(snapshot));
        },
    );
    if !monitor.is_running() {
        log::warn!("Disc monitor is not running; disc changes will not be picked up");
    }

    let mut stdout = std::io::stdout();
    let terminal = enable_raw_mode()
        .and_then(|()| execute!(stdout, EnterAlternateScreen))
        .and_then(|()| Terminal::new(CrosstermBackend::new(std::io::stdout())));

    let run_result: Result<(), Box<dyn std::error::Error>> = match terminal {
        Ok(mut terminal) => {
            let sources = event_loop::EventSources {
                events: &event_rx,
                controls: &control_rx,
                metadata: metadata.as_ref(),
                mpris: mpris.as_ref(),
                progress_tick: Duration::from_millis(settings.playback.progress_tick_ms),
            };
            let mut state = event_loop::EventLoopState::new();
            let result = event_loop::run(&mut terminal, &mut app, &sources, &mut state);
            let _ = terminal.show_cursor();
            result
        }
        Err(e) => Err(e.into()),
    };

    // The monitor goes first so no snapshot arrives for a dead player.
    monitor.shutdown();
    if let Some(worker) = metadata.as_mut() {
        worker.shutdown();
    }
    app.controller.force_stop();
    app.controller.player().shutdown();

    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen)?;

    match &run_result {
        Ok(()) => log::info!("Shutting down"),
        Err(e) => log::error!("Event loop failed: {e}"),
    }
    run_result
}
