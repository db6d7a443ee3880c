//! # Tide Curve Normalization
//!
//! Turns one day of hourly height samples into a drawable curve in a local
//! `width × height` box (origin top-left, y down):
//!
//! - x maps `[t_min, t_max]` of the samples linearly onto `[0, width]`
//! - y maps `[v_min, v_max]` linearly onto `[0.9·height, 0.1·height]`, so higher
//!   water sits higher on the page
//! - consecutive samples are joined by cubic segments whose control points sit at
//!   the horizontal midpoint, at the height of each endpoint, which smooths turns
//!   without overshooting either neighbour
//!
//! Fewer than two usable samples, or a flat or zero-length series, produce no
//! curve. That is a normal outcome: the caller simply skips the graph.

use crate::layout::{format_time, parse_timestamp, Align, DrawCommand, Font, TextItem, INK};
use crate::{EventKind, HourlySample, PredictionEvent, TideKind};
use chrono::{NaiveDateTime, NaiveTime};
use kurbo::{Affine, BezPath, Point};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fraction of the height left empty above and below the curve.
const VERTICAL_MARGIN: f64 = 0.1;

/// Number of plain horizontal gridlines.
const GRIDLINES: usize = 4;

/// Clock hours that get a vertical gridline and a time label.
const HOUR_MARKS: [u32; 3] = [6, 12, 18];

const GRID_GRAY: f64 = 0.8;
const ZERO_LINE_GRAY: f64 = 0.35;
const DOT_RADIUS: f64 = 1.2;
const LABEL_FONT: Font = Font::regular(5.5);
const LABEL_BOX: f64 = 28.0;
const LABEL_GAP: f64 = 2.5;
const AXIS_FONT: Font = Font::regular(6.0);
const AXIS_LABEL_DROP: f64 = 8.0;

/// How points on the curve are labelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    /// Every sample shows its value, outside the local excursion
    Values,
    /// Only samples whose time matches a hi-lo event get a high/low label
    HiLo,
}

/// Which side of its point a label sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Above,
    Below,
}

/// A text label attached to a curve point.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveLabel {
    pub text: String,
    pub anchor: Point,
    pub placement: Placement,
}

/// A vertical reference line at a fixed clock hour.
#[derive(Clone, Debug, PartialEq)]
pub struct HourMark {
    pub x: f64,
    pub label: String,
}

/// A fully normalized curve in local coordinates.
#[derive(Clone, Debug)]
pub struct CurveSpec {
    pub width: f64,
    pub height: f64,
    /// One point per usable sample, chronological
    pub points: Vec<Point>,
    /// Smooth path through `points`
    pub path: BezPath,
    /// y of the plain horizontal gridlines
    pub gridlines: Vec<f64>,
    /// y of zero height, when it falls inside the box
    pub zero_line: Option<f64>,
    pub hour_marks: Vec<HourMark>,
    pub labels: Vec<CurveLabel>,
}

/// Linear mapping from sample space into the curve box.
struct Scale {
    t_min: NaiveDateTime,
    span_secs: f64,
    v_min: f64,
    v_range: f64,
    width: f64,
    height: f64,
}

impl Scale {
    fn x(&self, t: NaiveDateTime) -> f64 {
        (t - self.t_min).num_seconds() as f64 / self.span_secs * self.width
    }

    fn y(&self, v: f64) -> f64 {
        let bottom = self.height * (1.0 - VERTICAL_MARGIN);
        let top = self.height * VERTICAL_MARGIN;
        bottom - (v - self.v_min) / self.v_range * (bottom - top)
    }
}

/// Normalize one day of hourly samples into a curve.
///
/// `hilo` is only consulted in [`LabelMode::HiLo`]: an event is labelled when its
/// `HH:MM` equals a sample's `HH:MM`, and silently skipped otherwise.
pub fn normalize(
    samples: &[&HourlySample],
    hilo: &[&PredictionEvent],
    width: f64,
    height: f64,
    mode: LabelMode,
) -> Option<CurveSpec> {
    let parsed: Vec<(NaiveDateTime, f64, &HourlySample)> = samples
        .iter()
        .filter_map(|s| parse_timestamp(&s.timestamp).map(|t| (t, s.height_ft, *s)))
        .filter(|(_, v, _)| v.is_finite())
        .collect();

    if parsed.len() < 2 {
        debug!(samples = parsed.len(), "not enough samples for a curve");
        return None;
    }

    let t_min = parsed.iter().map(|p| p.0).min()?;
    let t_max = parsed.iter().map(|p| p.0).max()?;
    let v_min = parsed.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let v_max = parsed.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let span_secs = (t_max - t_min).num_seconds() as f64;
    let v_range = v_max - v_min;

    if span_secs <= 0.0 || v_range <= 0.0 || width <= 0.0 || height <= 0.0 {
        debug!(span_secs, v_range, "degenerate curve input");
        return None;
    }

    let scale = Scale {
        t_min,
        span_secs,
        v_min,
        v_range,
        width,
        height,
    };

    let points: Vec<Point> = parsed
        .iter()
        .map(|(t, v, _)| Point::new(scale.x(*t), scale.y(*v)))
        .collect();

    let gridlines = (1..=GRIDLINES)
        .map(|i| height * i as f64 / (GRIDLINES + 1) as f64)
        .collect();

    let zero = scale.y(0.0);
    let zero_line = (0.0..=height).contains(&zero).then_some(zero);

    let labels = match mode {
        LabelMode::Values => value_labels(&parsed, &points),
        LabelMode::HiLo => hilo_labels(&parsed, &points, hilo),
    };

    Some(CurveSpec {
        width,
        height,
        path: smooth_path(&points),
        points,
        gridlines,
        zero_line,
        hour_marks: hour_marks(&scale, t_min, t_max),
        labels,
    })
}

/// Cubic segments with control points at each segment's horizontal midpoint.
fn smooth_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some(first) = points.first() else {
        return path;
    };
    path.move_to(*first);
    for pair in points.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        let mid_x = (p0.x + p1.x) / 2.0;
        path.curve_to(Point::new(mid_x, p0.y), Point::new(mid_x, p1.y), p1);
    }
    path
}

/// Value labels: above points at or below the day's mean, below the others.
fn value_labels(parsed: &[(NaiveDateTime, f64, &HourlySample)], points: &[Point]) -> Vec<CurveLabel> {
    let mean = parsed.iter().map(|p| p.1).sum::<f64>() / parsed.len() as f64;
    parsed
        .iter()
        .zip(points)
        .map(|((_, v, _), point)| CurveLabel {
            text: format!("{v:.2}"),
            anchor: *point,
            placement: if *v <= mean {
                Placement::Above
            } else {
                Placement::Below
            },
        })
        .collect()
}

/// High/low labels for hi-lo events whose clock time matches a sample exactly.
fn hilo_labels(
    parsed: &[(NaiveDateTime, f64, &HourlySample)],
    points: &[Point],
    hilo: &[&PredictionEvent],
) -> Vec<CurveLabel> {
    let sample_times: Vec<String> = parsed.iter().map(|p| format_time(&p.2.timestamp)).collect();

    hilo.iter()
        .filter_map(|event| {
            let time = format_time(&event.timestamp);
            if time.is_empty() {
                return None;
            }
            let index = sample_times.iter().position(|t| *t == time)?;
            let (label, placement) = match &event.kind {
                EventKind::Tide(TideKind::High) => ("high", Placement::Above),
                EventKind::Tide(TideKind::Low) => ("low", Placement::Below),
                _ => return None,
            };
            Some(CurveLabel {
                text: format!("{:.2} {label}", event.value),
                anchor: points[index],
                placement,
            })
        })
        .collect()
}

/// 06:00, 12:00 and 18:00 of every day touched by the samples, when in range.
fn hour_marks(scale: &Scale, t_min: NaiveDateTime, t_max: NaiveDateTime) -> Vec<HourMark> {
    let mut marks = Vec::new();
    let mut day = t_min.date();
    while day <= t_max.date() {
        for hour in HOUR_MARKS {
            let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) else {
                continue;
            };
            let instant = day.and_time(time);
            if (t_min..=t_max).contains(&instant) {
                marks.push(HourMark {
                    x: scale.x(instant),
                    label: format!("{hour:02}:00"),
                });
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    marks
}

impl CurveSpec {
    /// Left edge of a label box centered on `x`, kept inside the curve box.
    fn label_left(&self, x: f64) -> f64 {
        (x - LABEL_BOX / 2.0).clamp(0.0, (self.width - LABEL_BOX).max(0.0))
    }

    /// Commands drawing the curve with its box's top-left corner at `origin`.
    ///
    /// Gridlines come first so the curve, dots and labels sit on top of them.
    pub fn draw_commands(&self, origin: Point) -> Vec<DrawCommand> {
        let mut commands = vec![DrawCommand::PushTransform(Affine::translate(origin.to_vec2()))];

        for y in &self.gridlines {
            commands.push(DrawCommand::Line {
                from: Point::new(0.0, *y),
                to: Point::new(self.width, *y),
                width: 0.3,
                gray: GRID_GRAY,
            });
        }
        if let Some(y) = self.zero_line {
            commands.push(DrawCommand::Line {
                from: Point::new(0.0, y),
                to: Point::new(self.width, y),
                width: 0.8,
                gray: ZERO_LINE_GRAY,
            });
        }
        for mark in &self.hour_marks {
            commands.push(DrawCommand::Line {
                from: Point::new(mark.x, 0.0),
                to: Point::new(mark.x, self.height),
                width: 0.3,
                gray: GRID_GRAY,
            });
            commands.push(DrawCommand::Text(TextItem::new(
                mark.label.clone(),
                Point::new(self.label_left(mark.x), self.height + AXIS_LABEL_DROP),
                LABEL_BOX,
                Align::Center,
                AXIS_FONT,
            )));
        }

        commands.push(DrawCommand::StrokePath {
            path: self.path.clone(),
            width: 1.0,
            gray: INK,
        });
        for point in &self.points {
            commands.push(DrawCommand::FillCircle {
                center: *point,
                radius: DOT_RADIUS,
                gray: INK,
            });
        }
        for label in &self.labels {
            let baseline = match label.placement {
                Placement::Above => label.anchor.y - LABEL_GAP,
                Placement::Below => label.anchor.y + LABEL_GAP + LABEL_FONT.size,
            };
            commands.push(DrawCommand::Text(TextItem::new(
                label.text.clone(),
                Point::new(self.label_left(label.anchor.x), baseline),
                LABEL_BOX,
                Align::Center,
                LABEL_FONT,
            )));
        }

        commands.push(DrawCommand::PopTransform);
        commands
    }
}
