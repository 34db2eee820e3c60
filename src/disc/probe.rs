//! Blocking wrappers around the external disc utilities.

use std::process::{Command, Stdio};

use crate::config::{DriveSettings, expand_command};

use super::toc::TableOfContents;

/// Source of raw drive status text.
pub trait DriveProbe: Send {
    /// Current status text. Failures come back as text, never as an error.
    fn status(&mut self) -> String;
}

/// Source of the disc's table of contents.
pub trait TrackEnumerator: Send {
    fn table_of_contents(&mut self) -> TableOfContents;
}

/// Run `argv` and return stdout followed by stderr.
///
/// The exit status is ignored: disc utilities report "no disc" and similar
/// conditions through non-zero exits while still printing the useful text.
pub fn run_command(argv: &[String]) -> String {
    let Some((program, args)) = argv.split_first() else {
        return "Error: empty command".to_string();
    };

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output();

    match output {
        Ok(out) => {
            let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&out.stderr));
            if !out.status.success() {
                log::debug!("{program} exited with {}", out.status);
            }
            text
        }
        Err(e) => {
            log::warn!("Failed to execute {program}: {e}");
            format!("Error: {e}")
        }
    }
}

/// `DriveProbe` running the configured status command (`setcd -i` by default).
pub struct CommandProbe {
    argv: Vec<String>,
}

impl CommandProbe {
    pub fn new(drive: &DriveSettings) -> Self {
        Self {
            argv: expand_command(&drive.status_command, &drive.device, None),
        }
    }
}

impl DriveProbe for CommandProbe {
    fn status(&mut self) -> String {
        run_command(&self.argv)
    }
}

/// `TrackEnumerator` running the configured TOC command (`cdparanoia -Q` by default).
pub struct CommandEnumerator {
    argv: Vec<String>,
}

impl CommandEnumerator {
    pub fn new(drive: &DriveSettings) -> Self {
        Self {
            argv: expand_command(&drive.toc_command, &drive.device, None),
        }
    }
}

impl TrackEnumerator for CommandEnumerator {
    fn table_of_contents(&mut self) -> TableOfContents {
        let toc = TableOfContents::parse(&run_command(&self.argv));
        log::info!("Total Tracks: {}", toc.total_tracks());
        toc
    }
}
