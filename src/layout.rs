//! # Column Layout
//!
//! Page content is described as an immutable list of positioned [`DrawCommand`]s.
//! This module defines that command model and the column layout engine that stacks
//! station blocks down one column of a page.
//!
//! ## Coordinates
//! All coordinates are PDF points with the origin at the top-left corner of the
//! page and y growing downwards. Text is positioned by its baseline.
//!
//! ## Station Blocks
//! Every block starts with a centered heading, then (tide stations only) an
//! optional curve, then the day's events, then a fixed spacing. The vertical
//! advance of each part is fixed by [`LayoutMetrics`]:
//!
//! | part | advance |
//! |---|---|
//! | heading | `name_line_height` |
//! | curve | `graph_height + graph_bottom_margin + graph_axis_clearance` |
//! | current events | `(data_line_height + line_spacing) × n` |
//! | tide events | `2 × data_line_height` for any n > 0 |
//! | no data | `data_line_height` |
//! | spacing | `station_spacing` |

use crate::curve::CurveSpec;
use crate::{CurrentKind, EventKind, PredictionEvent, StationKind};
use chrono::NaiveDateTime;
use kurbo::{Affine, BezPath, Point};
use serde::{Deserialize, Serialize};

/// Line shown for a station with no events on the day.
pub const PLACEHOLDER: &str = "Data not available";

/// Tide events share a row of this many slots; fewer events are centered.
const TIDE_SLOTS: usize = 4;

/// Baseline position within a line box, as a fraction of its height.
const BASELINE_RATIO: f64 = 0.78;

/// Gray level of body text and rules (0 = black, 1 = white).
pub const INK: f64 = 0.0;

/// Horizontal text alignment inside a text box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Font request: the backends map this onto their own faces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Font {
    pub size: f64,
    pub bold: bool,
}

impl Font {
    pub const fn regular(size: f64) -> Self {
        Self { size, bold: false }
    }

    pub const fn bold(size: f64) -> Self {
        Self { size, bold: true }
    }
}

/// A run of text placed in a box starting at `origin.x` and `width` wide.
#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    pub text: String,
    /// Left edge of the box and the text baseline
    pub origin: Point,
    pub width: f64,
    pub align: Align,
    pub font: Font,
}

impl TextItem {
    pub fn new(text: impl Into<String>, origin: Point, width: f64, align: Align, font: Font) -> Self {
        Self {
            text: text.into(),
            origin,
            width,
            align,
            font,
        }
    }
}

/// One positioned drawing operation.
#[derive(Clone, Debug)]
pub enum DrawCommand {
    Text(TextItem),
    Line {
        from: Point,
        to: Point,
        width: f64,
        gray: f64,
    },
    StrokePath {
        path: BezPath,
        width: f64,
        gray: f64,
    },
    FillPath {
        path: BezPath,
        gray: f64,
    },
    FillCircle {
        center: Point,
        radius: f64,
        gray: f64,
    },
    /// Save the graphics state and apply a transform to what follows
    PushTransform(Affine),
    /// Restore the graphics state saved by the matching push
    PopTransform,
}

impl DrawCommand {
    pub fn text(item: TextItem) -> Self {
        DrawCommand::Text(item)
    }

    pub fn rule(from: Point, to: Point, width: f64) -> Self {
        DrawCommand::Line {
            from,
            to,
            width,
            gray: INK,
        }
    }

    /// The text item, if this is a text command.
    pub fn as_text(&self) -> Option<&TextItem> {
        match self {
            DrawCommand::Text(item) => Some(item),
            _ => None,
        }
    }
}

/// Vertical rhythm and font sizes of the station columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    pub name_font_size: f64,
    pub name_line_height: f64,
    pub data_font_size: f64,
    pub data_line_height: f64,
    /// Extra gap after each current-event row
    pub line_spacing: f64,
    /// Gap after every station block
    pub station_spacing: f64,
    pub graph_height: f64,
    pub graph_bottom_margin: f64,
    /// Room below the curve for its time labels
    pub graph_axis_clearance: f64,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            name_font_size: 10.5,
            name_line_height: 14.0,
            data_font_size: 8.5,
            data_line_height: 11.0,
            line_spacing: 2.0,
            station_spacing: 8.0,
            graph_height: 64.0,
            graph_bottom_margin: 4.0,
            graph_axis_clearance: 10.0,
        }
    }
}

impl LayoutMetrics {
    /// Vertical space consumed by a curve.
    pub fn graph_advance(&self) -> f64 {
        self.graph_height + self.graph_bottom_margin + self.graph_axis_clearance
    }
}

/// Horizontal extent of one column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnFrame {
    pub x: f64,
    pub width: f64,
}

/// Everything needed to lay out one station for one day.
#[derive(Debug)]
pub struct StationBlock<'a> {
    pub name: &'a str,
    pub kind: StationKind,
    /// The day's events; `None` when the station has no series at all
    pub events: Option<Vec<&'a PredictionEvent>>,
    /// Tide curve, present only for graph stations with usable samples
    pub curve: Option<CurveSpec>,
}

/// Commands for one column and where its cursor ended.
#[derive(Debug)]
pub struct ColumnOutput {
    pub commands: Vec<DrawCommand>,
    pub cursor: f64,
}

/// Sequential layout of station blocks down one column.
///
/// The cursor is the top of the next free line. It only ever grows; the page is
/// fixed-height and a column that runs long is not reflowed.
pub struct ColumnLayout<'m> {
    frame: ColumnFrame,
    metrics: &'m LayoutMetrics,
    cursor: f64,
    commands: Vec<DrawCommand>,
}

impl<'m> ColumnLayout<'m> {
    pub fn new(frame: ColumnFrame, metrics: &'m LayoutMetrics, start_y: f64) -> Self {
        Self {
            frame,
            metrics,
            cursor: start_y,
            commands: Vec::new(),
        }
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Lay out one station block and advance the cursor past it.
    pub fn station(&mut self, block: &StationBlock<'_>) {
        self.heading(block.name);

        if let Some(curve) = &block.curve {
            self.graph(curve);
        }

        match block.events.as_deref() {
            Some(events) if !events.is_empty() => match block.kind {
                StationKind::Current => self.current_rows(events),
                StationKind::Tide => self.tide_row(events),
            },
            _ => self.placeholder(),
        }

        self.cursor += self.metrics.station_spacing;
    }

    pub fn finish(self) -> ColumnOutput {
        ColumnOutput {
            commands: self.commands,
            cursor: self.cursor,
        }
    }

    fn heading(&mut self, name: &str) {
        let line = self.metrics.name_line_height;
        let font = Font::bold(self.metrics.name_font_size);
        self.push_text(name, self.frame.x, self.frame.width, line, Align::Center, font);
        self.cursor += line;
    }

    fn graph(&mut self, curve: &CurveSpec) {
        let origin = Point::new(self.frame.x, self.cursor);
        self.commands.extend(curve.draw_commands(origin));
        self.cursor += self.metrics.graph_advance();
    }

    fn current_rows(&mut self, events: &[&PredictionEvent]) {
        let line = self.metrics.data_line_height;
        let font = Font::regular(self.metrics.data_font_size);
        let cell = self.frame.width / 3.0;

        for event in events {
            let cells = [
                format_speed(event),
                event_label(event).to_string(),
                format_time(&event.timestamp),
            ];
            for (i, text) in cells.iter().enumerate() {
                let x = self.frame.x + cell * i as f64;
                self.push_text(text, x, cell, line, Align::Center, font);
            }
            self.cursor += line + self.metrics.line_spacing;
        }
    }

    fn tide_row(&mut self, events: &[&PredictionEvent]) {
        let line = self.metrics.data_line_height;
        let font = Font::regular(self.metrics.data_font_size);
        let slots = events.len().max(TIDE_SLOTS);
        let cell = self.frame.width / slots as f64;
        let offset = (slots - events.len()) as f64 * cell / 2.0;

        let top = self.cursor;
        for (i, event) in events.iter().enumerate() {
            let x = self.frame.x + offset + cell * i as f64;
            let height = format!("{:.2} {}", event.value, event_label(event));
            self.text_at(&height, x, cell, top, line, font);
            self.text_at(&format_time(&event.timestamp), x, cell, top + line, line, font);
        }
        self.cursor = top + 2.0 * line;
    }

    fn placeholder(&mut self) {
        let line = self.metrics.data_line_height;
        let font = Font::regular(self.metrics.data_font_size);
        self.push_text(PLACEHOLDER, self.frame.x, self.frame.width, line, Align::Center, font);
        self.cursor += line;
    }

    fn push_text(&mut self, text: &str, x: f64, width: f64, line: f64, align: Align, font: Font) {
        let baseline = self.cursor + line * BASELINE_RATIO;
        self.commands.push(DrawCommand::text(TextItem::new(
            text,
            Point::new(x, baseline),
            width,
            align,
            font,
        )));
    }

    fn text_at(&mut self, text: &str, x: f64, width: f64, top: f64, line: f64, font: Font) {
        let baseline = top + line * BASELINE_RATIO;
        self.commands.push(DrawCommand::text(TextItem::new(
            text,
            Point::new(x, baseline),
            width,
            Align::Center,
            font,
        )));
    }
}

/// Lay out every block in order, starting at `start_y`.
pub fn layout_column(
    frame: ColumnFrame,
    metrics: &LayoutMetrics,
    start_y: f64,
    blocks: &[StationBlock<'_>],
) -> ColumnOutput {
    let mut column = ColumnLayout::new(frame, metrics, start_y);
    for block in blocks {
        column.station(block);
    }
    column.finish()
}

/// Clock time `HH:MM` of a provider timestamp, or an empty string if malformed.
pub fn format_time(timestamp: &str) -> String {
    parse_timestamp(timestamp)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Parse a provider-local `"YYYY-MM-DD HH:MM"` timestamp (seconds optional).
pub fn parse_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    let trimmed = timestamp.trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Speed cell of a current row: blank for slack, else one signed decimal.
///
/// Speeds that round to zero print unsigned.
pub fn format_speed(event: &PredictionEvent) -> String {
    match &event.kind {
        EventKind::Current(CurrentKind::Slack) => String::new(),
        _ => match format!("{:.1}", event.value) {
            negative_zero if negative_zero == "-0.0" => "0.0".to_string(),
            speed => speed,
        },
    }
}

/// Display label of an event kind ("max ebb", "high", ...).
pub fn event_label(event: &PredictionEvent) -> &str {
    match &event.kind {
        EventKind::Tide(kind) => kind.label(),
        EventKind::Current(kind) => kind.label(),
    }
}
