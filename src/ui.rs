//! UI rendering helpers for the terminal user interface.
//!
//! Two layouts: the fullscreen kiosk view with only the now-playing block, and
//! the windowed view that adds a header, the raw drive status and a controls
//! footer. `Esc` switches between them.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Flex, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Gauge, Padding, Paragraph, Wrap},
};

use crate::app::{App, Progress};
use crate::playback::{MediaPlayer, PlaybackState};

const CONTROLS: [(&str, &str); 5] = [
    ("space/p", "play/pause"),
    ("h/l ←/→", "prev/next track"),
    ("s", "stop"),
    ("esc", "fullscreen"),
    ("q", "quit"),
];

/// Render the controls help text.
fn controls_text() -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect::<Vec<String>>()
        .join(" | ")
}

fn state_label(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Stopped => "Stopped",
        PlaybackState::Playing => "Playing",
        PlaybackState::Paused => "Paused",
    }
}

/// One-line transport hint under the progress bar.
fn transport_hint(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Playing => "⏮  ⏸  ⏭",
        PlaybackState::Paused | PlaybackState::Stopped => "⏮  ▶  ⏭",
    }
}

/// A block sliding across `width` cells, for tracks of unknown length.
pub fn pulse_bar(width: u16, phase: u16) -> String {
    let width = usize::from(width);
    if width == 0 {
        return String::new();
    }
    let block = (width / 5).max(1);
    let span = width + block;
    let start = (usize::from(phase) * 2) % span;

    (0..width)
        .map(|i| {
            if i + block > start && i < start {
                '█'
            } else {
                '░'
            }
        })
        .collect()
}

/// Album art stand-in: terminals cannot show the image, so say where it is.
fn art_lines<P>(app: &App<P>) -> Vec<Line<'static>> {
    let cover = app.album.as_ref().and_then(|a| a.cover.as_ref());
    let caption = match cover {
        Some(c) => match &c.path {
            Some(p) => format!("cover: {}", p.display()),
            None => format!("cover: {} ({} bytes)", c.mime_type, c.bytes.len()),
        },
        None => String::new(),
    };
    vec![
        Line::from("╭───────╮"),
        Line::from("│  ◉ ◎  │"),
        Line::from("╰───────╯"),
        Line::from(caption).italic(),
    ]
}

/// Render the now-playing block into `area`.
fn draw_now_playing<P: MediaPlayer>(frame: &mut Frame, app: &App<P>, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .flex(Flex::Center)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(art_lines(app)).alignment(Alignment::Center),
        rows[0],
    );

    let track = Paragraph::new(app.track_line())
        .alignment(Alignment::Center)
        .bold();
    frame.render_widget(track, rows[2]);

    let album = Paragraph::new(app.album_line.as_str()).alignment(Alignment::Center);
    frame.render_widget(album, rows[3]);

    let bar_area = centered_width(rows[5], 60);
    match app.progress {
        Progress::Hidden => {}
        Progress::Fraction(ratio) => {
            let gauge = Gauge::default()
                .gauge_style(Style::default().add_modifier(Modifier::BOLD))
                .ratio(ratio.clamp(0.0, 1.0))
                .label("");
            frame.render_widget(gauge, bar_area);
        }
        Progress::Pulse(phase) => {
            frame.render_widget(Paragraph::new(pulse_bar(bar_area.width, phase)), bar_area);
        }
    }

    let time = Paragraph::new(app.time_text.as_str()).alignment(Alignment::Center);
    frame.render_widget(time, rows[6]);

    if app.transport_visible {
        let hint = Paragraph::new(transport_hint(app.state())).alignment(Alignment::Center);
        frame.render_widget(hint, rows[7]);
    }

    if let Some(err) = &app.error {
        let err = Paragraph::new(err.as_str())
            .alignment(Alignment::Center)
            .italic();
        frame.render_widget(err, rows[8]);
    }
}

/// Horizontally center a region at most `width` cells wide inside `r`.
fn centered_width(r: Rect, width: u16) -> Rect {
    let width = width.min(r.width.saturating_sub(4)).max(1).min(r.width);
    Rect {
        x: r.x + (r.width.saturating_sub(width) / 2),
        width,
        ..r
    }
}

/// Render the entire UI into the provided `frame`.
pub fn draw<P: MediaPlayer>(frame: &mut Frame, app: &App<P>) {
    if app.fullscreen {
        draw_now_playing(frame, app, frame.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(15),
            Constraint::Length(3),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(app.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" spindle ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let status = {
        let mut parts: Vec<String> = vec![
            format!("DISC: {}", app.disc_state.label()),
            state_label(app.state()).to_string(),
        ];
        if app.transport_visible {
            parts.push(format!(
                "Track {}/{}",
                app.controller.current_track(),
                app.controller.total_tracks()
            ));
        }
        if !app.status_text.is_empty() {
            parts.push(format!("Drive: {}", app.status_text.replace('\n', " ")));
        }
        parts.join(" • ")
    };
    let status_par = Paragraph::new(status)
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    let main = Block::default().borders(Borders::ALL).title(" now playing ");
    let inner = main.inner(chunks[2]);
    frame.render_widget(main, chunks[2]);
    draw_now_playing(frame, app, inner);

    let footer = Paragraph::new(controls_text())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}
