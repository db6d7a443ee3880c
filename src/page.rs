//! # Page Composition
//!
//! One page per calendar day. A page is a header (date, moon, sun times), two
//! section titles over a rule, a vertical divider, and two station columns laid
//! out by [`crate::layout`]: currents on the left, tides on the right.
//!
//! Sun and moon come through the [`Ephemeris`] seam so pages can be composed
//! deterministically in tests.

use crate::bucket::{AlmanacData, DayBuckets};
use crate::config::{Config, PageConfig};
use crate::curve::normalize;
use crate::layout::{
    layout_column, Align, ColumnFrame, DrawCommand, Font, StationBlock, TextItem,
};
use crate::lunar::{self, PhaseBucket};
use crate::moon_icon::icon_commands;
use crate::solar::{self, SunTimes};
use crate::StationKind;
use chrono::{Local, NaiveDate};
use kurbo::{Point, Size};
use tracing::debug;

const MOON_RADIUS: f64 = 18.0;
const PHASE_NAME_WIDTH: f64 = 120.0;

/// Source of the day's sun and moon figures.
pub trait Ephemeris {
    fn sun_times(&self, date: NaiveDate) -> SunTimes;

    /// Position in the synodic cycle, 0 = new, 0.5 = full.
    fn cycle_fraction(&self, date: NaiveDate) -> f64;
}

/// Ephemeris for a fixed observer, with times shown in the machine's timezone.
#[derive(Clone, Copy, Debug)]
pub struct LocalEphemeris {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocalEphemeris {
    pub fn from_config(config: &Config) -> Self {
        Self {
            latitude: config.location.latitude,
            longitude: config.location.longitude,
        }
    }
}

impl Ephemeris for LocalEphemeris {
    fn sun_times(&self, date: NaiveDate) -> SunTimes {
        solar::sun_times(date, self.latitude, self.longitude, &Local)
    }

    fn cycle_fraction(&self, date: NaiveDate) -> f64 {
        lunar::cycle_fraction(date)
    }
}

/// A composed page: its date, size and draw commands in paint order.
#[derive(Clone, Debug)]
pub struct Page {
    pub date: NaiveDate,
    pub size: Size,
    pub commands: Vec<DrawCommand>,
}

/// Page geometry derived from [`PageConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageFrame {
    pub size: Size,
    pub margin: f64,
    /// x of the vertical divider between the columns
    pub split_x: f64,
    pub left: ColumnFrame,
    pub right: ColumnFrame,
    /// Top of the section titles
    pub titles_top: f64,
}

impl PageFrame {
    pub fn new(page: &PageConfig) -> Self {
        let m = page.margin;
        let content_width = page.width - 2.0 * m;
        let split_x = m + content_width * page.current_column_fraction;
        Self {
            size: Size::new(page.width, page.height),
            margin: m,
            split_x,
            left: ColumnFrame {
                x: m,
                width: split_x - page.column_gutter - m,
            },
            right: ColumnFrame {
                x: split_x + page.column_gutter,
                width: page.width - m - (split_x + page.column_gutter),
            },
            titles_top: m + page.header_height,
        }
    }

    pub fn content_width(&self) -> f64 {
        self.size.width - 2.0 * self.margin
    }

    /// y of the rule under the section titles.
    pub fn underline_y(&self) -> f64 {
        self.titles_top + 19.0
    }

    /// Where both columns start.
    pub fn columns_top(&self) -> f64 {
        self.underline_y() + 8.0
    }
}

/// Composes almanac pages from prefetched data.
pub struct Almanac<'a, E: Ephemeris> {
    config: &'a Config,
    data: &'a AlmanacData,
    ephemeris: E,
    frame: PageFrame,
}

impl<'a, E: Ephemeris> Almanac<'a, E> {
    pub fn new(config: &'a Config, data: &'a AlmanacData, ephemeris: E) -> Self {
        Self {
            config,
            data,
            ephemeris,
            frame: PageFrame::new(&config.page),
        }
    }

    pub fn frame(&self) -> &PageFrame {
        &self.frame
    }

    /// One page per day from `start` to `end` inclusive; none if `start > end`.
    pub fn compose(&self, start: NaiveDate, end: NaiveDate) -> Vec<Page> {
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| self.compose_page(date))
            .collect()
    }

    pub fn compose_page(&self, date: NaiveDate) -> Page {
        let day = self.data.day(date);
        let mut commands = self.header(date);
        commands.extend(self.section_chrome());

        let metrics = &self.config.layout;
        let top = self.frame.columns_top();

        let currents = self.current_blocks(&day);
        let left = layout_column(self.frame.left, metrics, top, &currents);
        let tides = self.tide_blocks(&day);
        let right = layout_column(self.frame.right, metrics, top, &tides);

        debug!(
            %date,
            currents_end = left.cursor,
            tides_end = right.cursor,
            "composed page"
        );

        commands.extend(left.commands);
        commands.extend(right.commands);
        Page {
            date,
            size: self.frame.size,
            commands,
        }
    }

    fn header(&self, date: NaiveDate) -> Vec<DrawCommand> {
        let m = self.frame.margin;
        let width = self.frame.content_width();
        let center_x = self.frame.size.width / 2.0;
        let sun = self.ephemeris.sun_times(date);
        let phase = lunar::classify(self.ephemeris.cycle_fraction(date));

        let text = |s: String, x: f64, baseline: f64, w: f64, align: Align, font: Font| {
            DrawCommand::text(TextItem::new(s, Point::new(x, baseline), w, align, font))
        };

        let mut commands = vec![
            text(date.format("%A").to_string(), m, m + 20.0, width, Align::Left, Font::bold(20.0)),
            text(date.format("%B %-d, %Y").to_string(), m, m + 40.0, width, Align::Left, Font::regular(13.0)),
        ];
        commands.extend(icon_commands(phase, Point::new(center_x, m + 24.0), MOON_RADIUS));
        commands.push(phase_caption(phase, center_x, m + 54.0));
        commands.push(text(format!("Sunrise {}", sun.sunrise), m, m + 20.0, width, Align::Right, Font::regular(11.0)));
        commands.push(text(format!("Sunset {}", sun.sunset), m, m + 36.0, width, Align::Right, Font::regular(11.0)));
        commands
    }

    fn section_chrome(&self) -> Vec<DrawCommand> {
        let f = &self.frame;
        let baseline = f.titles_top + 14.0;
        let underline = f.underline_y();
        let title = |s: &str, column: ColumnFrame| {
            DrawCommand::text(TextItem::new(
                s,
                Point::new(column.x, baseline),
                column.width,
                Align::Center,
                Font::bold(13.0),
            ))
        };

        vec![
            title("Currents", f.left),
            title("Tides", f.right),
            DrawCommand::rule(
                Point::new(f.margin, underline),
                Point::new(f.size.width - f.margin, underline),
                0.8,
            ),
            DrawCommand::rule(
                Point::new(f.split_x, underline),
                Point::new(f.split_x, f.size.height - f.margin),
                0.5,
            ),
        ]
    }

    fn current_blocks(&self, day: &DayBuckets<'a>) -> Vec<StationBlock<'a>> {
        self.config
            .current_stations
            .iter()
            .map(|station| StationBlock {
                name: &station.name,
                kind: StationKind::Current,
                events: day.events(StationKind::Current, &station.id),
                curve: None,
            })
            .collect()
    }

    fn tide_blocks(&self, day: &DayBuckets<'a>) -> Vec<StationBlock<'a>> {
        let metrics = &self.config.layout;
        let width = self.frame.right.width;

        self.config
            .tide_stations
            .iter()
            .map(|station| {
                let events = day.events(StationKind::Tide, &station.id);
                let curve = if station.graph {
                    day.hourly(&station.id).and_then(|samples| {
                        normalize(
                            &samples,
                            events.as_deref().unwrap_or(&[]),
                            width,
                            metrics.graph_height,
                            self.config.graph.labels,
                        )
                    })
                } else {
                    None
                };
                StationBlock {
                    name: &station.name,
                    kind: StationKind::Tide,
                    events,
                    curve,
                }
            })
            .collect()
    }
}

fn phase_caption(phase: PhaseBucket, center_x: f64, baseline: f64) -> DrawCommand {
    DrawCommand::text(TextItem::new(
        phase.name(),
        Point::new(center_x - PHASE_NAME_WIDTH / 2.0, baseline),
        PHASE_NAME_WIDTH,
        Align::Center,
        Font::regular(9.0),
    ))
}
