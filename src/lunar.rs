//! Moon phase: low-precision lunar cycle position (Schaefer 1985) and the
//! eight-way phase classification shown on each almanac page.
//!
//! Accuracy: about ±1 day for the cycle position, which is well inside the
//! width of a phase bucket (3.7 days).
//! References: Sky & Telescope BASIC "MOONFX.BAS" (Apr 1994) and the
//! 1985 phase routine (Mar 1985).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Mean synodic month length in days.
const SYNODIC_MONTH: f64 = 29.530_588_2;

/// Width of one phase bucket as a fraction of the cycle.
const BUCKET_WIDTH: f64 = 0.125;

/// Cycle position and age from Schaefer's phase routine.
#[derive(Debug, Clone, Copy)]
pub struct LunarPhase {
    /// Fraction of the synodic month elapsed since New (0 = new, 0.5 = full).
    pub cycle_fraction: f64,
    /// Age of the Moon in civil days since New.
    pub age_days: f64,
}

/// Compute Schaefer's cycle position for a proleptic-Gregorian Y-M-D.
///
/// `year` is astronomer's year (e.g. 2000).
/// `month` is 1 = Jan … 12 = Dec.
/// `day` can be fractional (noon = 0.5).
pub fn schaefer_moon(year: i32, month: u32, day: f64) -> LunarPhase {
    // Calendar → "March-based" year to simplify the day count
    let (mut y, mut m) = (year, month as i32);
    if m < 3 {
        y -= 1;
        m += 12;
    } // Jan/Feb treated as months 13/14
    m += 1;

    // Day offset from the 1900-01-00 12 UT new moon (S&T 1985)
    let days = (365.25 * y as f64).floor() + (30.6 * m as f64).floor() + day - 694_039.09;

    // Drop whole cycles, keep the fractional part
    let mut cycles = days / SYNODIC_MONTH;
    cycles -= cycles.floor();

    LunarPhase {
        cycle_fraction: cycles,
        age_days: cycles * SYNODIC_MONTH,
    }
}

/// Cycle position at local noon of `date`.
pub fn cycle_fraction(date: NaiveDate) -> f64 {
    schaefer_moon(date.year(), date.month(), date.day() as f64 + 0.5).cycle_fraction
}

/// One of the eight discrete moon phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseBucket {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl PhaseBucket {
    /// All phases in cycle order starting from New.
    pub const ALL: [PhaseBucket; 8] = [
        PhaseBucket::New,
        PhaseBucket::WaxingCrescent,
        PhaseBucket::FirstQuarter,
        PhaseBucket::WaxingGibbous,
        PhaseBucket::Full,
        PhaseBucket::WaningGibbous,
        PhaseBucket::LastQuarter,
        PhaseBucket::WaningCrescent,
    ];

    /// Name printed under the moon icon.
    pub fn name(self) -> &'static str {
        match self {
            PhaseBucket::New => "New Moon",
            PhaseBucket::WaxingCrescent => "Waxing Crescent",
            PhaseBucket::FirstQuarter => "First Quarter",
            PhaseBucket::WaxingGibbous => "Waxing Gibbous",
            PhaseBucket::Full => "Full Moon",
            PhaseBucket::WaningGibbous => "Waning Gibbous",
            PhaseBucket::LastQuarter => "Last Quarter",
            PhaseBucket::WaningCrescent => "Waning Crescent",
        }
    }
}

/// Map a cycle fraction onto one of eight phases.
///
/// Buckets are 0.125 wide and centered on the phase points. New spans the wrap
/// as `[0.9375, 1) ∪ [0, 0.0625)`, so 0.0625 opens Waxing Crescent. The other
/// interior boundaries belong to the bucket below them (0.5625 is still Full).
/// Values outside `[0, 1)` are wrapped into the cycle; NaN is treated as New.
///
/// # Example
/// ```
/// use tide_almanac_lib::lunar::{classify, PhaseBucket};
///
/// assert_eq!(classify(0.06), PhaseBucket::New);
/// assert_eq!(classify(0.0625), PhaseBucket::WaxingCrescent);
/// assert_eq!(classify(0.5), PhaseBucket::Full);
/// assert_eq!(classify(0.5625), PhaseBucket::Full);
/// assert_eq!(classify(0.94), PhaseBucket::New);
/// ```
pub fn classify(fraction: f64) -> PhaseBucket {
    if !fraction.is_finite() {
        return PhaseBucket::New;
    }
    let f = fraction.rem_euclid(1.0);
    let first = BUCKET_WIDTH / 2.0;
    if f < first || f >= 1.0 - first {
        return PhaseBucket::New;
    }
    let index = ((f - first) / BUCKET_WIDTH).ceil() as usize;
    PhaseBucket::ALL[index.clamp(1, 7)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_centered() {
        // New is half-open on both sides of the wrap
        assert_eq!(classify(0.0625 - 1e-9), PhaseBucket::New);
        assert_eq!(classify(0.0625), PhaseBucket::WaxingCrescent);

        let boundaries = [0.1875, 0.3125, 0.4375, 0.5625, 0.6875, 0.8125];
        for (i, b) in boundaries.iter().enumerate() {
            // An interior boundary belongs to the bucket below it
            assert_eq!(classify(*b), PhaseBucket::ALL[i + 1], "at {b}");
            assert_eq!(classify(b + 1e-9), PhaseBucket::ALL[i + 2], "above {b}");
        }
        // The last boundary opens the New bucket
        assert_eq!(classify(0.9375 - 1e-9), PhaseBucket::WaningCrescent);
        assert_eq!(classify(0.9375), PhaseBucket::New);
    }

    #[test]
    fn new_moon_wraps_around() {
        assert_eq!(classify(0.0), PhaseBucket::New);
        assert_eq!(classify(0.9375), PhaseBucket::New);
        assert_eq!(classify(0.999_999), PhaseBucket::New);
        assert_eq!(classify(1.02), PhaseBucket::New);
        assert_eq!(classify(-0.01), PhaseBucket::New);
        assert_eq!(classify(f64::NAN), PhaseBucket::New);
    }

    #[test]
    fn reference_values() {
        assert_eq!(classify(0.06), PhaseBucket::New);
        assert_eq!(classify(0.07), PhaseBucket::WaxingCrescent);
        assert_eq!(classify(0.25), PhaseBucket::FirstQuarter);
        assert_eq!(classify(0.5), PhaseBucket::Full);
        assert_eq!(classify(0.5625), PhaseBucket::Full);
        assert_eq!(classify(0.5626), PhaseBucket::WaningGibbous);
        assert_eq!(classify(0.75), PhaseBucket::LastQuarter);
        assert_eq!(classify(0.94), PhaseBucket::New);
    }

    #[test]
    fn buckets_are_contiguous() {
        // Walking the cycle visits every bucket once, in order
        let mut seen = vec![classify(0.0)];
        for step in 1..10_000 {
            let bucket = classify(step as f64 / 10_000.0);
            if *seen.last().unwrap() != bucket {
                seen.push(bucket);
            }
        }
        assert_eq!(seen.len(), 9);
        assert_eq!(&seen[..8], &PhaseBucket::ALL);
        assert_eq!(seen[8], PhaseBucket::New);
    }

    #[test]
    fn known_full_and_new_moons() {
        // Full moon 2026-01-03, new moon 2026-01-18
        let full = cycle_fraction(NaiveDate::from_ymd_opt(2026, 1, 3).unwrap());
        assert!((full - 0.5).abs() < 0.03, "full moon fraction {full}");
        assert_eq!(classify(full), PhaseBucket::Full);

        let new = cycle_fraction(NaiveDate::from_ymd_opt(2026, 1, 18).unwrap());
        assert_eq!(classify(new), PhaseBucket::New);
    }

    #[test]
    fn age_tracks_fraction() {
        let phase = schaefer_moon(2026, 1, 10.5);
        assert!((0.0..1.0).contains(&phase.cycle_fraction));
        assert!((phase.age_days - phase.cycle_fraction * SYNODIC_MONTH).abs() < 1e-9);
    }
}
