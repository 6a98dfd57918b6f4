//! Sky preview: renders a few frames offline and writes them as PNG.
//!
//! Usage: cargo run --release --bin sky_preview -- [OPTIONS]
//!
//! Options:
//!   --lat <DEG>          Latitude (default: 52.37)
//!   --lon <DEG>          Longitude (default: 4.90)
//!   --time <RFC3339>     Timestamp (default: now)
//!   --utc-offset <MIN>   Local offset from UTC in minutes (default: 0)
//!   --elevation <DEG>    Force the sun elevation
//!   --azimuth <DEG>      Force the sun azimuth (default with --elevation: 180)
//!   --cover <0..1>       Cloud cover (default: 0.2)
//!   --precip <KIND>      none | rain | snow | storm (default: none)
//!   --code <WMO>         Weather code
//!   --fog <0..1>         Fog density (default: 0)
//!   --wind <KMH>         Wind speed
//!   --wind-dir <DEG>     Wind direction
//!   --width <PX>         Container width in CSS px (default: 1280)
//!   --height <PX>        Container height in CSS px (default: 720)
//!   --dpr <RATIO>        Device pixel ratio (default: 1)
//!   --frames <N>         Frames to render (default: 90)
//!   --fps <N>            Frame rate (default: 30)
//!   --config <PATH>      Engine config JSON
//!   --out <PREFIX>       Output prefix (default: "sky_preview")
//!   --realtime           Pace frames on the wall clock

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};

use nimbus::core::Result;
use nimbus::engine::{
    input_channel, EngineConfig, FrameScheduler, IntervalScheduler, ManualScheduler, SkyAnimator,
};
use nimbus::sky::{PrecipitationKind, SkyStateInput, WeatherInfo};

fn main() -> Result<()> {
    nimbus::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let lat = parse_f32_arg(&args, "--lat").unwrap_or(52.37);
    let lon = parse_f32_arg(&args, "--lon").unwrap_or(4.90);
    let time = parse_str_arg(&args, "--time")
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    let utc_offset = parse_f32_arg(&args, "--utc-offset").unwrap_or(0.0) as i32;
    let width = parse_f32_arg(&args, "--width").unwrap_or(1280.0);
    let height = parse_f32_arg(&args, "--height").unwrap_or(720.0);
    let dpr = parse_f32_arg(&args, "--dpr").unwrap_or(1.0);
    let frames = parse_usize_arg(&args, "--frames").unwrap_or(90);
    let fps = parse_f32_arg(&args, "--fps").unwrap_or(30.0) as f64;
    let out = parse_str_arg(&args, "--out").unwrap_or_else(|| "sky_preview".to_string());
    let realtime = args.iter().any(|a| a == "--realtime");

    let config = match parse_str_arg(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let weather = WeatherInfo {
        cloud_cover: parse_f32_arg(&args, "--cover").unwrap_or(0.2),
        precipitation: parse_str_arg(&args, "--precip")
            .map(|s| parse_precipitation(&s))
            .unwrap_or_default(),
        fog_density: parse_f32_arg(&args, "--fog").unwrap_or(0.0),
        wind_speed_kmh: parse_f32_arg(&args, "--wind"),
        wind_direction_deg: parse_f32_arg(&args, "--wind-dir"),
        weather_code: parse_f32_arg(&args, "--code").map(|c| c as u16),
        ..Default::default()
    };

    let mut input = SkyStateInput::synthesize(time, lat, lon, utc_offset, weather);
    if let Some(elevation) = parse_f32_arg(&args, "--elevation") {
        let azimuth = parse_f32_arg(&args, "--azimuth").unwrap_or(180.0);
        input = input.with_sun(elevation, azimuth);
    }

    println!("=== Nimbus Sky Preview ===");
    println!("Time:    {} (local {})", time.to_rfc3339(), input.time.local_time);
    println!("Sun:     {:.1}° elev, {:.1}° az", input.astronomy.sun_elevation, input.astronomy.sun_azimuth);
    println!("Moon:    {:.1}° elev, phase {:.2}", input.astronomy.moon_elevation, input.astronomy.moon_phase);
    println!("Weather: cover {:.2}, {:?}, fog {:.2}", input.weather.cloud_cover, input.weather.precipitation, input.weather.fog_density);
    println!("Frames:  {} @ {} fps{}", frames, fps, if realtime { " (realtime)" } else { "" });
    println!();

    let (publisher, feed) = input_channel();
    publisher.publish(input);

    let start = Instant::now();
    if realtime {
        let animator = SkyAnimator::new(IntervalScheduler::new(fps), config, feed);
        run(animator, width, height, dpr, frames, &out)?;
    } else {
        let animator = SkyAnimator::new(ManualScheduler::new(fps), config, feed);
        run(animator, width, height, dpr, frames, &out)?;
    }
    println!("Done in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn run<S: FrameScheduler>(
    mut animator: SkyAnimator<S>,
    width: f32,
    height: f32,
    dpr: f32,
    frames: usize,
    out: &str,
) -> Result<()> {
    animator.resize(width, height, dpr);
    animator.start();
    let fired = animator.run_frames(frames);

    let stats = animator.stats().fps_stats();
    println!("Rendered {} frames ({} throttled), avg {:.1} fps", stats.frame_count, stats.skipped_frames, stats.five_sec.avg);
    if let Some(report) = animator.last_report() {
        println!(
            "Sun brightness {:.2}, stars {}, lightning {}",
            report.sun.brightness,
            report.stars_drawn,
            if report.lightning.is_some() { "active" } else { "none" }
        );
    }
    println!("Particles: {}", animator.precipitation().len());
    if let Some(gradient) = animator.css_gradient() {
        println!("CSS: {gradient}");
    }
    log::debug!("{fired} frame callbacks fired");

    let sky_path = PathBuf::from(format!("{out}_sky.png"));
    animator.sky_surface().save_png(&sky_path)?;
    println!("Wrote {}", sky_path.display());
    if let Some(clouds) = animator.cloud_surface() {
        let cloud_path = PathBuf::from(format!("{out}_clouds.png"));
        clouds.save_png(&cloud_path)?;
        println!("Wrote {}", cloud_path.display());
    }
    animator.dispose();
    Ok(())
}

fn parse_precipitation(s: &str) -> PrecipitationKind {
    match s.to_ascii_lowercase().as_str() {
        "rain" => PrecipitationKind::Rain,
        "snow" => PrecipitationKind::Snow,
        "storm" => PrecipitationKind::Storm,
        _ => PrecipitationKind::None,
    }
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
