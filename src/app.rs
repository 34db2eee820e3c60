//! Application module: the display model driven by disc, player and
//! metadata events.
//!
//! `App` in `app::model` owns the playback controller and everything the UI
//! renders.

mod model;

pub use model::*;
