use std::time::Duration;

/// CD-DA frames (sectors) per second of audio.
pub const SECTORS_PER_SECOND: u32 = 75;

/// One audio track as listed by the TOC command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocEntry {
    /// 1-based track number.
    pub number: u32,
    pub length_sectors: Option<u32>,
    pub begin_sector: Option<u32>,
}

impl TocEntry {
    pub fn duration(&self) -> Option<Duration> {
        self.length_sectors
            .map(|s| Duration::from_millis(u64::from(s) * 1000 / u64::from(SECTORS_PER_SECOND)))
    }
}

/// Parsed table of contents, entries sorted by track number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOfContents {
    entries: Vec<TocEntry>,
}

impl TableOfContents {
    /// Parse `cdparanoia -Q` style output.
    ///
    /// A track line starts with a digit and carries the track number before the
    /// first `.`; sector length and start follow when the tool prints them:
    ///
    /// ```text
    ///   1.    16503 [03:40.03]        0 [00:00.00]    no   no  2
    /// ```
    ///
    /// Anything else (banners, the `TOTAL` line, error text) is skipped.
    pub fn parse(text: &str) -> Self {
        let mut entries: Vec<TocEntry> = text.lines().filter_map(parse_line).collect();
        entries.sort_by_key(|e| e.number);
        entries.dedup_by_key(|e| e.number);
        Self { entries }
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    /// Highest track number found, or 1 when nothing parsed.
    pub fn total_tracks(&self) -> u32 {
        self.entries.iter().map(|e| e.number).max().unwrap_or(1).max(1)
    }

    pub fn track(&self, number: u32) -> Option<&TocEntry> {
        self.entries.iter().find(|e| e.number == number)
    }

    pub fn track_duration(&self, number: u32) -> Option<Duration> {
        self.track(number).and_then(TocEntry::duration)
    }

    /// Sector right after the last audio track, when offsets are known and
    /// add up to a valid sector.
    pub fn leadout_sector(&self) -> Option<u32> {
        let last = self.entries.last()?;
        last.begin_sector?.checked_add(last.length_sectors?)
    }
}

fn parse_line(line: &str) -> Option<TocEntry> {
    let line = line.trim();
    if !line.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let (number, rest) = line.split_once('.')?;
    let number: u32 = number.trim().parse().ok()?;
    if number == 0 {
        return None;
    }

    // "16503 [03:40.03] 0 [00:00.00] ..." -> length, timestamp, begin
    let mut fields = rest.split_whitespace();
    let length_sectors = fields.next().and_then(|f| f.parse().ok());
    let begin_sector = if length_sectors.is_some() {
        fields.nth(1).and_then(|f| f.parse().ok())
    } else {
        None
    };

    Some(TocEntry {
        number,
        length_sectors,
        begin_sector,
    })
}
