//! # Tide Almanac Core Library
//!
//! This library composes a printable almanac: one page per calendar day, each page
//! carrying sunrise/sunset, a moon-phase icon, current-station predictions and
//! tide-station predictions (optionally with a tide curve).
//!
//! ## Design Philosophy
//!
//! ### Layout Before Drawing
//! Pages are composed into an immutable list of positioned draw commands
//! ([`layout::DrawCommand`]). A separate renderer replays that list against a
//! drawing backend ([`canvas::Canvas`]). Layout is therefore testable by asserting on
//! coordinates, and backends are testable by asserting on the calls they receive.
//!
//! ### Provider Data Is Trusted Verbatim
//! Timestamps stay in the provider's local `"YYYY-MM-DD HH:MM"` form. The only
//! time arithmetic happens where it is required: mapping hourly samples onto the
//! x axis of a curve and extracting the clock time for display.
//!
//! ### Data Flow
//! 1. **Fetch**: [`noaa`] prefetches every station series for the date range
//! 2. **Bucket**: [`bucket`] slices each series down to one calendar day
//! 3. **Normalize**: [`curve`] turns hourly samples into a drawable curve
//! 4. **Lay out**: [`layout`] stacks station blocks down each column
//! 5. **Compose**: [`page`] adds the header and drives both columns, one page per day
//! 6. **Render**: [`pdf`], [`raster`] or [`renderer`] consume the draw commands
//!
//! ## Core Types
//! - [`StationSeries`]: every prediction event for one station over the range
//! - [`PredictionEvent`]: a tide extremum or a current max/slack event
//! - [`HourlySample`]: one point of the denser series used for tide curves

use serde::{Deserialize, Serialize};

// Module declarations
pub mod bucket;
pub mod canvas;
pub mod config;
pub mod curve;
pub mod layout;
pub mod logging;
pub mod lunar;
pub mod moon_icon;
pub mod noaa;
pub mod page;
pub mod pdf;
pub mod raster;
pub mod renderer;
pub mod solar;

/// Which kind of measurement a station publishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationKind {
    /// Water height over time
    Tide,
    /// Water velocity over time
    Current,
}

/// Kind of a tide hi-lo event as reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideKind {
    High,
    Low,
    /// Any raw kind the provider sends that is not `H` or `L`
    Other(String),
}

impl TideKind {
    /// Parse the provider's raw kind code (`"H"` / `"L"`).
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "H" => TideKind::High,
            "L" => TideKind::Low,
            other => TideKind::Other(other.to_string()),
        }
    }

    /// Text shown next to the height on the page.
    pub fn label(&self) -> &str {
        match self {
            TideKind::High => "high",
            TideKind::Low => "low",
            TideKind::Other(raw) => raw,
        }
    }
}

/// Kind of a current prediction event as reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrentKind {
    MaxFlood,
    MaxEbb,
    Slack,
    /// Unknown raw kinds are echoed unchanged on the page
    Other(String),
}

impl CurrentKind {
    /// Parse the provider's raw kind (`"flood"`, `"ebb"`, `"slack"`).
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "flood" => CurrentKind::MaxFlood,
            "ebb" => CurrentKind::MaxEbb,
            "slack" => CurrentKind::Slack,
            other => CurrentKind::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CurrentKind::MaxFlood => "max flood",
            CurrentKind::MaxEbb => "max ebb",
            CurrentKind::Slack => "slack",
            CurrentKind::Other(raw) => raw,
        }
    }
}

/// Event kind, tagged by station kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Tide(TideKind),
    Current(CurrentKind),
}

/// One discrete prediction: a tide high/low or a current max/slack.
///
/// `value` is the height in feet for tide events and the signed velocity in
/// knots for current events.
///
/// # Example
/// ```
/// use tide_almanac_lib::{EventKind, PredictionEvent, TideKind};
///
/// let high = PredictionEvent::tide("2026-01-01 06:49", 9.52, TideKind::High);
/// assert_eq!(high.day_key(), "2026-01-01");
/// assert_eq!(high.kind, EventKind::Tide(TideKind::High));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionEvent {
    /// Provider-local timestamp, `"YYYY-MM-DD HH:MM"`
    pub timestamp: String,
    /// Height (ft) or velocity (knots)
    pub value: f64,
    pub kind: EventKind,
}

impl PredictionEvent {
    pub fn tide(timestamp: impl Into<String>, height_ft: f64, kind: TideKind) -> Self {
        Self {
            timestamp: timestamp.into(),
            value: height_ft,
            kind: EventKind::Tide(kind),
        }
    }

    pub fn current(timestamp: impl Into<String>, velocity_knots: f64, kind: CurrentKind) -> Self {
        Self {
            timestamp: timestamp.into(),
            value: velocity_knots,
            kind: EventKind::Current(kind),
        }
    }

    /// The `YYYY-MM-DD` prefix of the timestamp (may be shorter if malformed).
    pub fn day_key(&self) -> &str {
        date_prefix(&self.timestamp)
    }
}

/// Every prediction event for one station across the fetched range.
///
/// Owned by the fetch layer and read-only to the composition engine. Events are
/// chronologically non-decreasing as returned by the provider; an empty list means
/// the fetch failed or the provider had nothing for the range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationSeries {
    pub station_id: String,
    pub station_name: String,
    pub kind: StationKind,
    pub events: Vec<PredictionEvent>,
}

impl StationSeries {
    /// A series with no events, used when a fetch fails.
    pub fn empty(station_id: &str, station_name: &str, kind: StationKind) -> Self {
        Self {
            station_id: station_id.to_string(),
            station_name: station_name.to_string(),
            kind,
            events: Vec::new(),
        }
    }
}

/// One point of the hourly height series used to draw a tide curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    /// Provider-local timestamp, `"YYYY-MM-DD HH:MM"`
    pub timestamp: String,
    /// Tide height in feet
    pub height_ft: f64,
}

impl HourlySample {
    pub fn new(timestamp: impl Into<String>, height_ft: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            height_ft,
        }
    }
}

/// Anything carrying a provider-local timestamp string.
pub trait Timestamped {
    fn timestamp(&self) -> &str;
}

impl Timestamped for PredictionEvent {
    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

impl Timestamped for HourlySample {
    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// First ten bytes of a timestamp, or the whole string if shorter.
fn date_prefix(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}
