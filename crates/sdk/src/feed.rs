//! In-memory feed of waves.

use std::collections::HashSet;

use crate::types::{self, WaveKey, WaveRecord};

/// Ordered history of waves.
///
/// Records are held in receipt order: the bulk history first, then live
/// `NewWave` events as they arrive. Readers get the reverse of that order,
/// most recent first.
///
/// Merging is idempotent on [`WaveKey`], so the live subscription may be
/// opened before the bulk read completes and overlap with it.
#[derive(Clone, Debug, Default)]
pub struct WaveFeed {
    records: Vec<WaveRecord>,
    keys: HashSet<WaveKey>,
    initialized: bool,
}

impl WaveFeed {
    pub fn new() -> Self { Self::default() }

    /// Replaces the feed with the bulk history.
    ///
    /// Live records appended before the first initialization that are
    /// missing from the history are kept after it, in their receipt order.
    pub fn initialize(&mut self, history: Vec<WaveRecord>) {
        let mut early = std::mem::take(&mut self.records);
        if self.initialized {
            early.clear();
        }
        self.keys.clear();
        self.records.reserve(history.len() + early.len());

        for record in history.into_iter().chain(early) {
            self.insert(record);
        }
        self.initialized = true;
    }

    /// Appends a live record, returns `false` if it was already present.
    pub fn append(&mut self, record: WaveRecord) -> bool { self.insert(record) }

    fn insert(&mut self, record: WaveRecord) -> bool {
        if !self.keys.insert(record.key()) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Whether the bulk history has been loaded.
    pub fn is_initialized(&self) -> bool { self.initialized }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Records in receipt order.
    pub fn records(&self) -> &[WaveRecord] { &self.records }

    /// Records most recent first.
    pub fn latest_first(&self) -> impl Iterator<Item = &WaveRecord> { self.records.iter().rev() }

    /// Display projection of the feed at `now`.
    pub fn view<'a>(&'a self, explorer: &'a str, now: types::Timestamp) -> FeedView<'a> {
        FeedView { feed: self, explorer, now }
    }
}

/// Feed rendered as cards, most recent first.
///
/// `{}` renders one card per wave, `{:#}` a compact table (with `display`
/// feature).
pub struct FeedView<'a> {
    feed: &'a WaveFeed,
    explorer: &'a str,
    now: types::Timestamp,
}

impl<'a> FeedView<'a> {
    pub fn cards(&self) -> impl Iterator<Item = WaveCard<'a>> + 'a {
        let (explorer, now) = (self.explorer, self.now);
        self.feed.latest_first().map(move |record| WaveCard { record, explorer, now })
    }
}

/// A single wave as shown to the user.
pub struct WaveCard<'a> {
    record: &'a WaveRecord,
    explorer: &'a str,
    now: types::Timestamp,
}

impl WaveCard<'_> {
    pub fn record(&self) -> &WaveRecord { self.record }

    pub fn time(&self) -> String { types::relative_time(self.record.timestamp, self.now) }

    pub fn explorer_url(&self) -> String {
        format!("{}/address/{}", self.explorer.trim_end_matches('/'), self.record.address)
    }
}

#[cfg(not(feature = "display"))]
impl std::fmt::Display for WaveCard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "From: {}", self.record.address)?;
        writeln!(f, "Message: {}", self.record.message)?;
        writeln!(f, "Time: {}", self.time())?;
        writeln!(f, "{}", self.explorer_url())
    }
}

#[cfg(feature = "display")]
impl std::fmt::Display for WaveCard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use colored::Colorize;

        writeln!(f, "{} {}", "From:".bold(), self.record.address.to_string().blue())?;
        writeln!(f, "{} {}", "Message:".bold(), self.record.message)?;
        writeln!(f, "{} {}", "Time:".bold(), self.time().dimmed())?;
        writeln!(f, "{}", self.explorer_url().underline())
    }
}

#[cfg(feature = "display")]
impl tabled::Tabled for WaveCard<'_> {
    const LENGTH: usize = 3;

    fn fields(&self) -> Vec<std::borrow::Cow<'_, str>> {
        vec![
            self.record.address.to_string().into(),
            self.record.message.as_str().into(),
            self.time().into(),
        ]
    }

    fn headers() -> Vec<std::borrow::Cow<'static, str>> {
        vec!["From".into(), "Message".into(), "Time".into()]
    }
}

impl std::fmt::Display for FeedView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        #[cfg(feature = "display")]
        let table = f.alternate().then(|| {
            use tabled::{Table, settings::Style};

            let mut table = Table::new(self.cards());
            table.with(Style::sharp());
            table.to_string()
        });
        #[cfg(not(feature = "display"))]
        let table: Option<String> = None;

        if let Some(table) = table {
            return writeln!(f, "{}", table);
        }

        for (i, card) in self.cards().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", card)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, address};

    use super::*;

    const A: Address = address!("0x000000000000000000000000000000000000000a");
    const B: Address = address!("0x000000000000000000000000000000000000000b");

    fn messages(feed: &WaveFeed) -> Vec<&str> {
        feed.latest_first().map(|r| r.message.as_str()).collect()
    }

    #[test]
    fn initialize_keeps_all_records_latest_first() {
        let mut feed = WaveFeed::new();
        feed.initialize(vec![
            WaveRecord::new(A, "one", 1000),
            WaveRecord::new(B, "two", 2000),
            WaveRecord::new(A, "three", 3000),
        ]);

        assert!(feed.is_initialized());
        assert_eq!(feed.len(), 3);
        assert_eq!(messages(&feed), vec!["three", "two", "one"]);
        assert_eq!(feed.records()[0].message, "one");
    }

    #[test]
    fn live_wave_goes_on_top() {
        let mut feed = WaveFeed::new();
        feed.initialize(vec![WaveRecord::new(A, "hi", 1000)]);

        assert!(feed.append(WaveRecord::new(B, "yo", 2000)));
        assert_eq!(feed.len(), 2);
        assert_eq!(messages(&feed), vec!["yo", "hi"]);
    }

    #[test]
    fn duplicate_live_wave_is_ignored() {
        let mut feed = WaveFeed::new();
        feed.initialize(vec![WaveRecord::new(A, "hi", 1000)]);

        assert!(!feed.append(WaveRecord::new(A, "hi", 1000)));
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn early_live_waves_survive_initialization() {
        let mut feed = WaveFeed::new();
        feed.append(WaveRecord::new(B, "yo", 2000));
        feed.append(WaveRecord::new(A, "hi", 1000));
        assert!(!feed.is_initialized());

        // "hi" is part of the history too, "yo" is not
        feed.initialize(vec![WaveRecord::new(A, "old", 500), WaveRecord::new(A, "hi", 1000)]);

        assert_eq!(feed.len(), 3);
        assert_eq!(messages(&feed), vec!["yo", "hi", "old"]);
    }

    #[test]
    fn reinitialize_replaces_history() {
        let mut feed = WaveFeed::new();
        feed.initialize(vec![WaveRecord::new(A, "hi", 1000)]);
        feed.initialize(vec![WaveRecord::new(B, "yo", 2000)]);

        assert_eq!(messages(&feed), vec!["yo"]);
    }

    #[test]
    fn cards_render_latest_first() {
        let mut feed = WaveFeed::new();
        feed.initialize(vec![WaveRecord::new(A, "hi", 1000)]);
        feed.append(WaveRecord::new(B, "yo", 2000));

        let view = feed.view("https://explorer.test/", 2000);
        let cards: Vec<_> = view.cards().collect();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].record().address, B);
        assert_eq!(cards[0].time(), "a few seconds ago");
        assert_eq!(cards[1].record().message, "hi");
        assert_eq!(cards[1].time(), "17 minutes ago");
        assert_eq!(cards[1].explorer_url(), format!("https://explorer.test/address/{}", A));

        let rendered = view.to_string();
        let yo = rendered.find("yo").unwrap();
        let hi = rendered.find("hi").unwrap();
        assert!(yo < hi);
    }
}
