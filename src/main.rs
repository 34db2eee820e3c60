mod app;
mod config;
mod disc;
mod logging;
mod metadata;
mod mpris;
mod playback;
mod runtime;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
