//! Sunrise and sunset from the NOAA general solar position equations.
//!
//! Accuracy is about a minute at mid latitudes, which is all a printed almanac
//! needs. The "sunrise" altitude includes the standard 0.833° for refraction and
//! the solar semi-diameter.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use core::f64::consts::PI;
use std::fmt::Display;

/// Zenith angle of the sun's upper limb at apparent sunrise.
const SUNRISE_ZENITH_DEG: f64 = 90.833;

/// Shown when the sun does not cross the horizon that day.
pub const NO_EVENT: &str = "--:--";

/// Sunrise and sunset as display strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SunTimes {
    pub sunrise: String,
    pub sunset: String,
}

/// Sunrise and sunset instants; `None` during polar day or night.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SunEvents {
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

/// Sunrise and sunset on the UTC calendar date `date` at `latitude` (°N) and
/// `longitude` (°E).
pub fn sun_events(date: NaiveDate, latitude: f64, longitude: f64) -> SunEvents {
    let gamma = 2.0 * PI / 365.0 * (date.ordinal() as f64 - 1.0);

    // Equation of time (minutes) and declination (radians)
    let eqtime = 229.18
        * (0.000075 + 0.001868 * gamma.cos()
            - 0.032077 * gamma.sin()
            - 0.014615 * (2.0 * gamma).cos()
            - 0.040849 * (2.0 * gamma).sin());
    let decl = 0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
        - 0.006758 * (2.0 * gamma).cos()
        + 0.000907 * (2.0 * gamma).sin()
        - 0.002697 * (3.0 * gamma).cos()
        + 0.00148 * (3.0 * gamma).sin();

    let lat = latitude.to_radians();
    let cos_ha = SUNRISE_ZENITH_DEG.to_radians().cos() / (lat.cos() * decl.cos())
        - lat.tan() * decl.tan();
    if !(-1.0..=1.0).contains(&cos_ha) {
        return SunEvents {
            sunrise: None,
            sunset: None,
        };
    }
    let ha_deg = cos_ha.acos().to_degrees();

    // Minutes after UTC midnight
    let sunrise = 720.0 - 4.0 * (longitude + ha_deg) - eqtime;
    let sunset = 720.0 - 4.0 * (longitude - ha_deg) - eqtime;

    let midnight = date.and_hms_opt(0, 0, 0).map(|t| Utc.from_utc_datetime(&t));
    let at = |minutes: f64| midnight.map(|m| m + Duration::seconds((minutes * 60.0).round() as i64));

    SunEvents {
        sunrise: at(sunrise),
        sunset: at(sunset),
    }
}

/// Sunrise and sunset for the local calendar `date`, formatted `HH:MM` in `tz`.
pub fn sun_times<Tz>(date: NaiveDate, latitude: f64, longitude: f64, tz: &Tz) -> SunTimes
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let events = sun_events(date, latitude, longitude);
    let format = |instant: Option<DateTime<Utc>>| {
        instant
            .map(|t| t.with_timezone(tz).format("%H:%M").to_string())
            .unwrap_or_else(|| NO_EVENT.to_string())
    };
    SunTimes {
        sunrise: format(events.sunrise),
        sunset: format(events.sunset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveTime, Timelike};

    const SEATTLE: (f64, f64) = (47.6062, -122.3321);

    fn minutes(hhmm: &str) -> i64 {
        let t = NaiveTime::parse_from_str(hhmm, "%H:%M").unwrap();
        (t.hour() * 60 + t.minute()) as i64
    }

    #[test]
    fn seattle_new_year() {
        let pst = FixedOffset::west_opt(8 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let times = sun_times(date, SEATTLE.0, SEATTLE.1, &pst);
        // Published: 07:58 / 16:29
        assert!((minutes(&times.sunrise) - minutes("07:58")).abs() <= 5, "{times:?}");
        assert!((minutes(&times.sunset) - minutes("16:29")).abs() <= 5, "{times:?}");
    }

    #[test]
    fn seattle_summer_solstice() {
        let pdt = FixedOffset::west_opt(7 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 6, 21).unwrap();
        let times = sun_times(date, SEATTLE.0, SEATTLE.1, &pdt);
        // Published: 05:11 / 21:10
        assert!((minutes(&times.sunrise) - minutes("05:11")).abs() <= 5, "{times:?}");
        assert!((minutes(&times.sunset) - minutes("21:10")).abs() <= 5, "{times:?}");
    }

    #[test]
    fn polar_night_has_no_events() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 21).unwrap();
        let times = sun_times(date, 78.22, 15.65, &Utc); // Longyearbyen
        assert_eq!(times.sunrise, NO_EVENT);
        assert_eq!(times.sunset, NO_EVENT);
    }

    #[test]
    fn sunset_follows_sunrise() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        let events = sun_events(date, SEATTLE.0, SEATTLE.1);
        let (rise, set) = (events.sunrise.unwrap(), events.sunset.unwrap());
        let day_length = (set - rise).num_minutes();
        // Equinox day is a little over 12 hours
        assert!((720..=745).contains(&day_length), "{day_length}");
    }
}
