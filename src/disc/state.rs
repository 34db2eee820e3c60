/// Semantic classification of the drive status text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DiscState {
    NoDisc,
    AudioDiscReady,
    TrayOpen,
    NotReady,
    /// Anything the status patterns do not cover, including probe errors.
    #[default]
    Unrecognized,
}

/// Substring patterns in priority order; the first hit decides.
const PATTERNS: [(&str, DiscState); 4] = [
    ("No disc is inserted", DiscState::NoDisc),
    ("audio disc", DiscState::AudioDiscReady),
    ("tray is open", DiscState::TrayOpen),
    ("is not ready", DiscState::NotReady),
];

/// Map raw drive status output to a `DiscState`.
///
/// Matching is case-sensitive substring containment; any text maps to some
/// state.
pub fn classify(raw: &str) -> DiscState {
    PATTERNS
        .iter()
        .find(|(needle, _)| raw.contains(needle))
        .map(|&(_, state)| state)
        .unwrap_or(DiscState::Unrecognized)
}

impl DiscState {
    pub fn label(self) -> &'static str {
        match self {
            Self::NoDisc => "no disc",
            Self::AudioDiscReady => "audio disc",
            Self::TrayOpen => "tray open",
            Self::NotReady => "not ready",
            Self::Unrecognized => "unrecognized",
        }
    }
}
