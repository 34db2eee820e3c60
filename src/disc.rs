//! Disc lifecycle: drive status probing, classification, table-of-contents
//! parsing and the background monitor that reports changes.

mod monitor;
mod probe;
mod state;
mod toc;

pub use monitor::{DiscMonitor, DiscSnapshot, MonitorLoop};
pub use probe::{CommandEnumerator, CommandProbe};
pub use state::DiscState;
pub use toc::TableOfContents;
