//! Coarse moon position and phase.
//!
//! Good to a few degrees, which is all the night sky needs: the phase comes
//! from the mean synodic month, the ecliptic longitude trails the sun by the
//! phase angle, and the orbit inclination tilts the moon off the ecliptic
//! over the draconic month.

use chrono::{DateTime, Utc};

use crate::astronomy::sun::{
    horizontal_coordinates, julian_day, sanitize_coordinates, solar_hour_angle, solar_terms,
};

/// Mean synodic month in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_853;
/// Mean draconic month in days (node to node).
const DRACONIC_MONTH_DAYS: f64 = 27.212_220_8;
/// Julian day of the reference new moon, 2000-01-06 18:14 UTC.
const REFERENCE_NEW_MOON_JD: f64 = 2_451_550.26;
/// Inclination of the lunar orbit to the ecliptic (degrees).
const ORBIT_INCLINATION_DEG: f64 = 5.14;

/// Moon angular position and phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoonPosition {
    pub elevation: f32,
    pub azimuth: f32,
    /// 0.0 = new, 0.5 = full, 1.0 = new again.
    pub phase: f32,
    /// Illuminated fraction of the disc, 0..1.
    pub illumination: f32,
}

/// Moon phase (0.0 = new, 0.5 = full) at a UTC timestamp.
pub fn moon_phase(ts: DateTime<Utc>) -> f32 {
    let cycles = (julian_day(ts) - REFERENCE_NEW_MOON_JD) / SYNODIC_MONTH_DAYS;
    cycles.rem_euclid(1.0) as f32
}

/// Illuminated fraction for a phase value.
pub fn phase_illumination(phase: f32) -> f32 {
    0.5 - 0.5 * (phase * std::f32::consts::TAU).cos()
}

/// Estimate moon elevation/azimuth/phase for a UTC timestamp and location.
pub fn moon_position(ts: DateTime<Utc>, latitude: f32, longitude: f32) -> MoonPosition {
    let (lat, lon) = sanitize_coordinates(latitude, longitude);
    let jd = julian_day(ts);
    let terms = solar_terms(jd);
    let phase = moon_phase(ts);

    let moon_long = (terms.apparent_longitude + phase as f64 * 360.0).to_radians();
    let node_arg = ((jd - REFERENCE_NEW_MOON_JD) / DRACONIC_MONTH_DAYS).rem_euclid(1.0);
    let moon_lat = (ORBIT_INCLINATION_DEG * (node_arg * std::f64::consts::TAU).sin()).to_radians();
    let eps = terms.obliquity.to_radians();

    // Ecliptic → equatorial
    let declination = (moon_lat.sin() * eps.cos() + moon_lat.cos() * eps.sin() * moon_long.sin())
        .clamp(-1.0, 1.0)
        .asin()
        .to_degrees();
    let moon_ra = (moon_long.sin() * eps.cos() - moon_lat.tan() * eps.sin())
        .atan2(moon_long.cos())
        .to_degrees();
    let sun_long = terms.apparent_longitude.to_radians();
    let sun_ra = (sun_long.sin() * eps.cos()).atan2(sun_long.cos()).to_degrees();

    // The moon's hour angle lags the sun's by the right-ascension difference
    let hour_angle = solar_hour_angle(ts, lon, &terms) + (sun_ra - moon_ra);
    let hour_angle = (hour_angle + 180.0).rem_euclid(360.0) - 180.0;

    let (elevation, azimuth) = horizontal_coordinates(declination, hour_angle, lat);
    MoonPosition {
        elevation: elevation as f32,
        azimuth: azimuth as f32,
        phase,
        illumination: phase_illumination(phase),
    }
}
