//! Moon-phase icons.
//!
//! Every icon is a dark disc with a light overlay. The overlay is defined on a
//! 100×100 square centered at (50, 50) and is built from two primitives:
//!
//! - the outer limb: a half circle of radius 50 from the top to the bottom of the
//!   disc, on the lit side
//! - the terminator: either a straight chord back to the top (quarters) or a half
//!   ellipse with horizontal radius 30 whose sign picks the side it bulges to
//!   (`+30` crescent, `-30` gibbous)
//!
//! Waning phases are the waxing shapes mirrored across the vertical axis.

use crate::layout::DrawCommand;
use crate::lunar::PhaseBucket;
use kurbo::{Affine, Arc, BezPath, Point, SvgArc, Vec2};

/// Side length of the square the silhouettes are defined on.
pub const ICON_SIZE: f64 = 100.0;

const OUTER_RADIUS: f64 = 50.0;
const TERMINATOR_RADIUS: f64 = 30.0;
const ARC_TOLERANCE: f64 = 0.01;

/// Gray of the unlit disc.
pub const MOON_DARK: f64 = 0.2;
/// Gray of the lit overlay.
pub const MOON_LIGHT: f64 = 0.95;

/// What to paint over the dark disc.
#[derive(Clone, Debug)]
pub enum MoonOverlay {
    /// New moon: the dark disc alone
    None,
    /// Full moon: a light disc covering everything
    Full,
    /// Any other phase: a light silhouette in icon space
    Silhouette(BezPath),
}

/// Overlay for a phase.
pub fn overlay(bucket: PhaseBucket) -> MoonOverlay {
    match bucket {
        PhaseBucket::New => MoonOverlay::None,
        PhaseBucket::Full => MoonOverlay::Full,
        PhaseBucket::WaxingCrescent => MoonOverlay::Silhouette(lit_region(Some(TERMINATOR_RADIUS), false)),
        PhaseBucket::FirstQuarter => MoonOverlay::Silhouette(lit_region(None, false)),
        PhaseBucket::WaxingGibbous => MoonOverlay::Silhouette(lit_region(Some(-TERMINATOR_RADIUS), false)),
        PhaseBucket::WaningGibbous => MoonOverlay::Silhouette(lit_region(Some(-TERMINATOR_RADIUS), true)),
        PhaseBucket::LastQuarter => MoonOverlay::Silhouette(lit_region(None, true)),
        PhaseBucket::WaningCrescent => MoonOverlay::Silhouette(lit_region(Some(TERMINATOR_RADIUS), true)),
    }
}

/// Lit region of a waxing moon, optionally mirrored into its waning twin.
///
/// `terminator` is `None` for a straight chord, otherwise the signed horizontal
/// radius of the inner arc.
fn lit_region(terminator: Option<f64>, mirror: bool) -> BezPath {
    let top = Point::new(50.0, 0.0);
    let bottom = Point::new(50.0, ICON_SIZE);

    let mut path = BezPath::new();
    path.move_to(top);
    append_arc(&mut path, top, bottom, OUTER_RADIUS, true);
    if let Some(radius) = terminator {
        // Negative radius sweeps the other way and bulges past the center line
        append_arc(&mut path, bottom, top, radius.abs(), radius < 0.0);
    }
    path.close_path();

    if mirror {
        path.apply_affine(Affine::new([-1.0, 0.0, 0.0, 1.0, ICON_SIZE, 0.0]));
    }
    path
}

/// Half ellipse between two points on the vertical diameter.
fn append_arc(path: &mut BezPath, from: Point, to: Point, rx: f64, sweep: bool) {
    let svg = SvgArc {
        from,
        to,
        radii: Vec2::new(rx, OUTER_RADIUS),
        x_rotation: 0.0,
        large_arc: false,
        sweep,
    };
    match Arc::from_svg_arc(&svg) {
        Some(arc) => path.extend(arc.append_iter(ARC_TOLERANCE)),
        None => path.line_to(to),
    }
}

/// Commands painting the icon for `bucket` as a disc of `radius` at `center`.
///
/// The dark disc is always painted first, so a new moon can never show a
/// stray overlay.
pub fn icon_commands(bucket: PhaseBucket, center: Point, radius: f64) -> Vec<DrawCommand> {
    let mut commands = vec![DrawCommand::FillCircle {
        center,
        radius,
        gray: MOON_DARK,
    }];

    match overlay(bucket) {
        MoonOverlay::None => {}
        MoonOverlay::Full => commands.push(DrawCommand::FillCircle {
            center,
            radius,
            gray: MOON_LIGHT,
        }),
        MoonOverlay::Silhouette(path) => {
            commands.push(DrawCommand::PushTransform(icon_transform(center, radius)));
            commands.push(DrawCommand::FillPath {
                path,
                gray: MOON_LIGHT,
            });
            commands.push(DrawCommand::PopTransform);
        }
    }
    commands
}

/// Maps icon space onto a disc of `radius` centered on `center`.
pub fn icon_transform(center: Point, radius: f64) -> Affine {
    let scale = radius / OUTER_RADIUS;
    let half = Vec2::new(ICON_SIZE / 2.0, ICON_SIZE / 2.0) * scale;
    Affine::translate(center.to_vec2() - half) * Affine::scale(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape;

    /// Hand-written silhouettes the generated paths must reproduce.
    fn reference(bucket: PhaseBucket) -> Option<&'static str> {
        match bucket {
            PhaseBucket::WaxingCrescent => Some("M50,0 A50,50 0 0,1 50,100 A30,50 0 0,0 50,0 Z"),
            PhaseBucket::FirstQuarter => Some("M50,0 A50,50 0 0,1 50,100 Z"),
            PhaseBucket::WaxingGibbous => Some("M50,0 A50,50 0 0,1 50,100 A30,50 0 0,1 50,0 Z"),
            PhaseBucket::WaningGibbous => Some("M50,0 A50,50 0 0,0 50,100 A30,50 0 0,0 50,0 Z"),
            PhaseBucket::LastQuarter => Some("M50,0 A50,50 0 0,0 50,100 Z"),
            PhaseBucket::WaningCrescent => Some("M50,0 A50,50 0 0,0 50,100 A30,50 0 0,1 50,0 Z"),
            PhaseBucket::New | PhaseBucket::Full => None,
        }
    }

    /// Reads the `M`/`A`/`Z` subset the references use, flattening arcs at the
    /// tolerance the generated silhouettes use.
    fn reference_path(svg: &str) -> BezPath {
        let spaced: String = svg
            .chars()
            .map(|c| match c {
                ',' => " ".to_string(),
                c if c.is_ascii_alphabetic() => format!(" {c} "),
                c => c.to_string(),
            })
            .collect();
        let tokens: Vec<&str> = spaced.split_whitespace().collect();
        let num = |i: usize| tokens[i].parse::<f64>().unwrap();

        let mut path = BezPath::new();
        let mut current = Point::ZERO;
        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                "M" => {
                    current = Point::new(num(i + 1), num(i + 2));
                    path.move_to(current);
                    i += 3;
                }
                "A" => {
                    let to = Point::new(num(i + 6), num(i + 7));
                    let arc = SvgArc {
                        from: current,
                        to,
                        radii: Vec2::new(num(i + 1), num(i + 2)),
                        x_rotation: num(i + 3).to_radians(),
                        large_arc: num(i + 4) != 0.0,
                        sweep: num(i + 5) != 0.0,
                    };
                    path.extend(Arc::from_svg_arc(&arc).unwrap().append_iter(ARC_TOLERANCE));
                    current = to;
                    i += 8;
                }
                "Z" => {
                    path.close_path();
                    i += 1;
                }
                other => panic!("unexpected token {other:?} in {svg}"),
            }
        }
        path
    }

    fn silhouette(bucket: PhaseBucket) -> BezPath {
        match overlay(bucket) {
            MoonOverlay::Silhouette(path) => path,
            other => panic!("{bucket:?} has no silhouette: {other:?}"),
        }
    }

    #[test]
    fn generated_paths_match_references() {
        for bucket in PhaseBucket::ALL {
            let Some(svg) = reference(bucket) else {
                continue;
            };
            let expected = reference_path(svg);
            let actual = silhouette(bucket);

            assert!(
                (expected.area().abs() - actual.area().abs()).abs() < 1.0,
                "{bucket:?}: area {} vs {}",
                actual.area().abs(),
                expected.area().abs()
            );
            let (eb, ab) = (expected.bounding_box(), actual.bounding_box());
            for (e, a) in [(eb.x0, ab.x0), (eb.y0, ab.y0), (eb.x1, ab.x1), (eb.y1, ab.y1)] {
                assert!((e - a).abs() < 0.1, "{bucket:?}: bounds {eb:?} vs {ab:?}");
            }
            // Same points lit on a 2-unit grid, wherever the reference is not
            // within a hair of its own boundary
            let probes = [
                Vec2::new(0.3, 0.0),
                Vec2::new(-0.3, 0.0),
                Vec2::new(0.0, 0.3),
                Vec2::new(0.0, -0.3),
            ];
            for gx in 0..50 {
                for gy in 0..50 {
                    let p = Point::new(gx as f64 * 2.0 + 1.0, gy as f64 * 2.0 + 1.0);
                    let inside = expected.contains(p);
                    if probes.iter().all(|d| expected.contains(p + *d) == inside) {
                        assert_eq!(actual.contains(p), inside, "{bucket:?} disagrees at {p:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn areas_follow_the_phase() {
        let disc = std::f64::consts::PI * 50.0 * 50.0;
        let crescent = silhouette(PhaseBucket::WaxingCrescent).area().abs();
        let quarter = silhouette(PhaseBucket::FirstQuarter).area().abs();
        let gibbous = silhouette(PhaseBucket::WaxingGibbous).area().abs();

        // Half disc minus / plus a half ellipse of radii 30 × 50
        let half_ellipse = std::f64::consts::PI * 30.0 * 50.0 / 2.0;
        assert!((quarter - disc / 2.0).abs() < 1.0);
        assert!((crescent - (disc / 2.0 - half_ellipse)).abs() < 1.0);
        assert!((gibbous - (disc / 2.0 + half_ellipse)).abs() < 1.0);
    }

    #[test]
    fn waning_mirrors_waxing() {
        let pairs = [
            (PhaseBucket::WaxingCrescent, PhaseBucket::WaningCrescent),
            (PhaseBucket::FirstQuarter, PhaseBucket::LastQuarter),
            (PhaseBucket::WaxingGibbous, PhaseBucket::WaningGibbous),
        ];
        for (waxing, waning) in pairs {
            let waxing = silhouette(waxing);
            let waning = silhouette(waning);
            for (x, y) in [(90.0, 50.0), (10.0, 50.0), (60.0, 20.0), (35.0, 70.0)] {
                assert_eq!(
                    waxing.contains(Point::new(x, y)),
                    waning.contains(Point::new(ICON_SIZE - x, y))
                );
            }
        }
        // Waxing is lit on the right
        assert!(silhouette(PhaseBucket::WaxingCrescent).contains(Point::new(95.0, 50.0)));
        assert!(!silhouette(PhaseBucket::WaxingCrescent).contains(Point::new(5.0, 50.0)));
    }

    #[test]
    fn new_moon_is_dark_disc_only() {
        let commands = icon_commands(PhaseBucket::New, Point::new(300.0, 60.0), 18.0);
        assert_eq!(commands.len(), 1);
        assert!(matches!(
            commands[0],
            DrawCommand::FillCircle { gray, .. } if gray == MOON_DARK
        ));
    }

    #[test]
    fn full_moon_is_light_disc_without_silhouette() {
        let bucket = crate::lunar::classify(0.5625);
        assert_eq!(bucket, PhaseBucket::Full);
        let commands = icon_commands(bucket, Point::new(300.0, 60.0), 18.0);
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0], DrawCommand::FillCircle { gray, .. } if gray == MOON_DARK));
        assert!(matches!(commands[1], DrawCommand::FillCircle { gray, .. } if gray == MOON_LIGHT));
        assert!(!commands
            .iter()
            .any(|c| matches!(c, DrawCommand::FillPath { .. })));
    }

    #[test]
    fn silhouette_is_scaled_onto_the_disc() {
        let center = Point::new(300.0, 60.0);
        let transform = icon_transform(center, 18.0);
        assert!((transform * Point::new(50.0, 50.0) - center).hypot() < 1e-9);
        let right = transform * Point::new(100.0, 50.0);
        assert!((right - Point::new(318.0, 60.0)).hypot() < 1e-9);

        let commands = icon_commands(PhaseBucket::LastQuarter, center, 18.0);
        assert!(matches!(commands[0], DrawCommand::FillCircle { .. }));
        assert!(matches!(commands[1], DrawCommand::PushTransform(_)));
        assert!(matches!(commands[2], DrawCommand::FillPath { .. }));
        assert!(matches!(commands[3], DrawCommand::PopTransform));
    }
}
