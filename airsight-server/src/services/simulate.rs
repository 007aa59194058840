//! Random but plausible readings for demo and realtime endpoints.

use std::ops::Range;

use airsight_api::models::{Reading, display_name};
use rand::Rng;
use time::OffsetDateTime;

pub const DEMO_LOCATION: &str = "Smart Kitchen Monitor";

/// Value ranges a generated reading is drawn from.
#[derive(Debug, Clone)]
pub struct Profile {
    pub aqi: Range<f64>,
    pub co2: Range<f64>,
    pub pm25: Range<f64>,
    pub voc: Range<f64>,
    pub co: Range<f64>,
    pub no2: Range<f64>,
    pub temperature: Range<f64>,
    pub humidity: Range<f64>,
}

impl Profile {
    /// A well ventilated room.
    pub fn calm() -> Self {
        Self {
            aqi: 25.0..55.0,
            co2: 400.0..600.0,
            pm25: 8.0..20.0,
            voc: 0.2..0.5,
            co: 3.0..7.0,
            no2: 20.0..45.0,
            temperature: 22.0..30.0,
            humidity: 45.0..65.0,
        }
    }

    /// Wider swings covering every quality category up to unhealthy.
    pub fn volatile() -> Self {
        Self {
            aqi: 50.0..150.0,
            co2: 400.0..1200.0,
            pm25: 5.0..55.0,
            voc: 0.1..0.9,
            co: 2.0..17.0,
            no2: 10.0..110.0,
            temperature: 20.0..35.0,
            humidity: 30.0..80.0,
        }
    }
}

pub fn generate<R: Rng>(
    rng: &mut R,
    profile: &Profile,
    device_id: &str,
    location: &str,
    now: OffsetDateTime,
) -> Reading {
    Reading {
        id: Reading::make_id(device_id, now),
        device_id: device_id.to_string(),
        timestamp: now,
        // Whole AQI points
        aqi: rng.random_range(profile.aqi.clone()).round(),
        // ppm
        co2: rng.random_range(profile.co2.clone()).round(),
        // µg/m³
        pm25: round_to(rng.random_range(profile.pm25.clone()), 1),
        // mg/m³
        voc: round_to(rng.random_range(profile.voc.clone()), 2),
        // ppm
        co: round_to(rng.random_range(profile.co.clone()), 1),
        // ppb
        no2: round_to(rng.random_range(profile.no2.clone()), 1),
        // °C
        temperature: round_to(rng.random_range(profile.temperature.clone()), 1),
        // %
        humidity: rng.random_range(profile.humidity.clone()).round(),
        location: location.to_string(),
    }
}

/// Reading served for the configured demo device.
pub fn demo_reading(device_id: &str, now: OffsetDateTime) -> Reading {
    generate(&mut rand::rng(), &Profile::calm(), device_id, DEMO_LOCATION, now)
}

/// Reading served by the realtime endpoint.
pub fn realtime_reading(device_id: &str, now: OffsetDateTime) -> Reading {
    let location = format!("{} Location", display_name(device_id));

    generate(&mut rand::rng(), &Profile::volatile(), device_id, &location, now)
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
