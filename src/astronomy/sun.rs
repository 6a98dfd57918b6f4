//! Sun position and sunrise/sunset estimation.
//!
//! Follows the NOAA solar calculator: Julian century → geometric mean
//! longitude/anomaly → apparent longitude → declination and equation of
//! time → local hour angle → horizontal coordinates. Atmospheric refraction
//! is ignored; the sky renderer only needs degree-level accuracy.

use chrono::{DateTime, NaiveDate, Timelike, Utc};

use crate::astronomy::clock::ClockTime;

/// Sun altitude at which the upper limb touches the horizon (refraction + radius).
const SUNRISE_ALTITUDE_DEG: f64 = -0.833;

/// Sun angular position as seen from the observer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunPosition {
    /// Degrees above the horizon, negative below it.
    pub elevation: f32,
    /// Compass bearing in degrees (0 = north, 90 = east, 180 = south).
    pub azimuth: f32,
}

/// Whether the sun crosses the horizon on a given day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DaylightKind {
    Normal,
    /// Sun never sets: sunrise/sunset span the whole day.
    PolarDay,
    /// Sun never rises: sunrise and sunset collapse onto solar noon.
    PolarNight,
}

/// Estimated local sunrise/sunset for a day.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunTimes {
    pub sunrise: ClockTime,
    pub sunset: ClockTime,
    pub solar_noon: ClockTime,
    pub kind: DaylightKind,
}

/// Intermediate solar terms shared with the moon model.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SolarTerms {
    /// Apparent ecliptic longitude (degrees).
    pub apparent_longitude: f64,
    /// Corrected obliquity of the ecliptic (degrees).
    pub obliquity: f64,
    /// Declination (degrees).
    pub declination: f64,
    /// Equation of time (minutes).
    pub equation_of_time: f64,
}

/// Julian day (fractional) of a UTC timestamp.
pub(crate) fn julian_day(ts: DateTime<Utc>) -> f64 {
    ts.timestamp_millis() as f64 / 86_400_000.0 + 2_440_587.5
}

fn julian_century(jd: f64) -> f64 {
    (jd - 2_451_545.0) / 36_525.0
}

pub(crate) fn solar_terms(jd: f64) -> SolarTerms {
    let t = julian_century(jd);

    let mean_long = (280.466_46 + t * (36_000.769_83 + 0.000_303_2 * t)).rem_euclid(360.0);
    let mean_anom = 357.529_11 + t * (35_999.050_29 - 0.000_153_7 * t);
    let ecc = 0.016_708_634 - t * (0.000_042_037 + 0.000_000_126_7 * t);

    let m = mean_anom.to_radians();
    let center = m.sin() * (1.914_602 - t * (0.004_817 + 0.000_014 * t))
        + (2.0 * m).sin() * (0.019_993 - 0.000_101 * t)
        + (3.0 * m).sin() * 0.000_289;

    let true_long = mean_long + center;
    let omega = (125.04 - 1_934.136 * t).to_radians();
    let apparent_longitude = true_long - 0.005_69 - 0.004_78 * omega.sin();

    let mean_obliq =
        23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.000_59 - t * 0.001_813))) / 60.0) / 60.0;
    let obliquity = mean_obliq + 0.002_56 * omega.cos();

    let declination = (obliquity.to_radians().sin() * apparent_longitude.to_radians().sin())
        .asin()
        .to_degrees();

    let y = (obliquity.to_radians() / 2.0).tan().powi(2);
    let l0 = mean_long.to_radians();
    let equation_of_time = 4.0
        * (y * (2.0 * l0).sin() - 2.0 * ecc * m.sin()
            + 4.0 * ecc * y * m.sin() * (2.0 * l0).cos()
            - 0.5 * y * y * (4.0 * l0).sin()
            - 1.25 * ecc * ecc * (2.0 * m).sin())
        .to_degrees();

    SolarTerms {
        apparent_longitude,
        obliquity,
        declination,
        equation_of_time,
    }
}

/// Local hour angle of the sun in degrees, `[-180, 180)`, 0 at solar noon.
pub(crate) fn solar_hour_angle(ts: DateTime<Utc>, longitude: f64, terms: &SolarTerms) -> f64 {
    let minutes_utc = ts.hour() as f64 * 60.0
        + ts.minute() as f64
        + (ts.second() as f64 + ts.nanosecond() as f64 * 1e-9) / 60.0;
    let true_solar_time = (minutes_utc + terms.equation_of_time + 4.0 * longitude).rem_euclid(1440.0);
    (true_solar_time / 4.0).rem_euclid(360.0) - 180.0
}

/// Horizontal coordinates `(elevation, azimuth)` in degrees for a body with
/// the given declination and local hour angle.
pub(crate) fn horizontal_coordinates(declination: f64, hour_angle: f64, latitude: f64) -> (f64, f64) {
    let lat = latitude.to_radians();
    let dec = declination.to_radians();
    let ha = hour_angle.to_radians();

    let sin_el = lat.sin() * dec.sin() + lat.cos() * dec.cos() * ha.cos();
    let elevation = sin_el.clamp(-1.0, 1.0).asin().to_degrees();

    // Measured from south, then rotated to a north-based compass bearing
    let azimuth = ha.sin().atan2(ha.cos() * lat.sin() - dec.tan() * lat.cos()).to_degrees() + 180.0;
    (elevation, azimuth.rem_euclid(360.0))
}

pub(crate) fn sanitize_coordinates(latitude: f32, longitude: f32) -> (f64, f64) {
    let lat = if latitude.is_finite() { latitude.clamp(-90.0, 90.0) } else { 0.0 };
    let lon = if longitude.is_finite() {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    } else {
        0.0
    };
    (lat as f64, lon as f64)
}

/// Sun elevation/azimuth for a UTC timestamp and observer location (degrees).
pub fn solar_position(ts: DateTime<Utc>, latitude: f32, longitude: f32) -> SunPosition {
    let (lat, lon) = sanitize_coordinates(latitude, longitude);
    let terms = solar_terms(julian_day(ts));
    let hour_angle = solar_hour_angle(ts, lon, &terms);
    let (elevation, azimuth) = horizontal_coordinates(terms.declination, hour_angle, lat);
    SunPosition {
        elevation: elevation as f32,
        azimuth: azimuth as f32,
    }
}

/// Estimate local sunrise, sunset and solar noon for `date`.
///
/// `utc_offset_minutes` shifts the results into the observer's local clock.
pub fn estimate_sun_times(date: NaiveDate, latitude: f32, longitude: f32, utc_offset_minutes: i32) -> SunTimes {
    let (lat, lon) = sanitize_coordinates(latitude, longitude);

    // Evaluate the slowly-varying terms at (approximate) local solar noon
    let noon_utc = date.and_hms_opt(12, 0, 0).map(|dt| dt.and_utc());
    let jd = noon_utc.map(julian_day).unwrap_or(2_451_545.0) - lon / 360.0;
    let terms = solar_terms(jd);

    let noon_minutes = 720.0 - 4.0 * lon - terms.equation_of_time + utc_offset_minutes as f64;

    let lat_r = lat.to_radians();
    let dec_r = terms.declination.to_radians();
    let cos_ha = (SUNRISE_ALTITUDE_DEG.to_radians().sin() - lat_r.sin() * dec_r.sin())
        / (lat_r.cos() * dec_r.cos()).max(1e-9);

    let (half_day_deg, kind) = if cos_ha > 1.0 {
        (0.0, DaylightKind::PolarNight)
    } else if cos_ha < -1.0 {
        (180.0, DaylightKind::PolarDay)
    } else {
        (cos_ha.acos().to_degrees(), DaylightKind::Normal)
    };

    let sunrise = noon_minutes - 4.0 * half_day_deg;
    let sunset = noon_minutes + 4.0 * half_day_deg;

    SunTimes {
        sunrise: ClockTime::from_minutes(sunrise.round() as i64),
        sunset: ClockTime::from_minutes(sunset.round() as i64),
        solar_noon: ClockTime::from_minutes(noon_minutes.round() as i64),
        kind,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_equator_equinox_noon_is_overhead() {
        let pos = solar_position(utc(2024, 3, 20, 12, 0), 0.0, 0.0);
        assert!(pos.elevation > 85.0, "Equinox noon elevation = {}", pos.elevation);
    }

    #[test]
    fn test_hour_angle_zero_at_solar_noon() {
        let ts = utc(2024, 3, 20, 12, 0);
        let terms = solar_terms(julian_day(ts));
        // Equation of time is about -7.5 minutes in late March
        let ha = solar_hour_angle(ts, 0.0, &terms);
        assert!(ha.abs() < 3.0, "noon hour angle = {ha}");
        let ha = solar_hour_angle(utc(2024, 3, 20, 18, 0), 0.0, &terms);
        assert!((ha - 90.0).abs() < 3.0, "evening hour angle = {ha}");
    }

    #[test]
    fn test_midnight_below_horizon() {
        let pos = solar_position(utc(2024, 3, 20, 0, 0), 0.0, 0.0);
        assert!(pos.elevation < -85.0, "Midnight elevation = {}", pos.elevation);
    }

    #[test]
    fn test_london_summer_solstice_noon() {
        let pos = solar_position(utc(2024, 6, 21, 12, 0), 51.5, -0.12);
        assert!(
            (59.0..64.0).contains(&pos.elevation),
            "London solstice elevation = {}",
            pos.elevation
        );
        assert!((pos.azimuth - 180.0).abs() < 6.0, "azimuth = {}", pos.azimuth);
    }

    #[test]
    fn test_morning_sun_in_the_east() {
        let pos = solar_position(utc(2024, 6, 21, 6, 0), 51.5, -0.12);
        assert!(pos.elevation > 0.0);
        assert!((45.0..135.0).contains(&pos.azimuth), "azimuth = {}", pos.azimuth);
    }

    #[test]
    fn test_southern_hemisphere_noon_sun_is_north() {
        // Local solar noon in Cape Town is around 10:47 UTC
        let pos = solar_position(utc(2024, 6, 21, 10, 47), -33.9, 18.4);
        assert!(pos.azimuth < 30.0 || pos.azimuth > 330.0, "azimuth = {}", pos.azimuth);
        assert!(pos.elevation > 25.0 && pos.elevation < 40.0, "elevation = {}", pos.elevation);
    }

    #[test]
    fn test_continuous_over_a_day() {
        let start = utc(2024, 9, 1, 0, 0);
        let mut prev = solar_position(start, 40.0, -74.0).elevation;
        for minute in 1..=(24 * 60) {
            let ts = start + chrono::Duration::minutes(minute);
            let e = solar_position(ts, 40.0, -74.0).elevation;
            // The sun moves at most 0.25° per minute
            assert!((e - prev).abs() < 0.3, "jump of {} at minute {minute}", e - prev);
            prev = e;
        }
    }

    #[test]
    fn test_invalid_coordinates_degrade() {
        let pos = solar_position(utc(2024, 3, 20, 12, 0), f32::NAN, 1000.0);
        assert!(pos.elevation.is_finite());
        assert!(pos.azimuth.is_finite());
    }

    #[test]
    fn test_london_sun_times() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let times = estimate_sun_times(date, 51.5, -0.12, 60);
        assert_eq!(times.kind, DaylightKind::Normal);
        // Published: 04:43 and 21:21 BST
        let rise = times.sunrise.minutes() as i32;
        let set = times.sunset.minutes() as i32;
        assert!((rise - (4 * 60 + 43)).abs() <= 10, "sunrise {}", times.sunrise);
        assert!((set - (21 * 60 + 21)).abs() <= 10, "sunset {}", times.sunset);
    }

    #[test]
    fn test_polar_night_and_day() {
        let winter = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
        let t = estimate_sun_times(winter, 80.0, 0.0, 0);
        assert_eq!(t.kind, DaylightKind::PolarNight);
        assert_eq!(t.sunrise, t.sunset);

        let summer = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let t = estimate_sun_times(summer, 80.0, 0.0, 0);
        assert_eq!(t.kind, DaylightKind::PolarDay);
    }
}
