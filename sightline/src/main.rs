#![allow(clippy::cast_possible_truncation)]

mod options;
mod settings;
mod units;

use aim::{
    guidance::DEFAULT_DEADBAND_DEG,
    AltitudeSource, Frame, Guidance, ObserverAltitude, ObserverPose, Solver, SteeringSolution,
};
use anyhow::Error as AnyError;
use clap::Parser;
use elevation::{Aggregator, ElevationSample, ProviderOutcome, SampleStatus};
use geodesy::{normalize_deg, GeoPoint};
use log::warn;
use options::{Cli, Command as CliCmd, LatLonAlt, Output};
use propah::LineOfSight;
use serde::Serialize;
use settings::Settings;
use std::io::Write;
use textplots::{Chart, Plot, Shape};
use units::{angle, or_dash, Units};

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let Cli {
        config,
        method,
        retries,
        timeout_ms,
        units,
        json,
        cmd,
    } = Cli::parse();

    env_logger::init();

    let mut settings = match config {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    if let Some(method) = method {
        settings.method = method.into();
    }
    if let Some(retries) = retries {
        settings.retries = retries;
    }
    if let Some(timeout_ms) = timeout_ms {
        settings.timeout_ms = timeout_ms;
    }
    let aggregator = settings.aggregator()?;

    match cmd {
        CliCmd::Solve {
            observer,
            target,
            instrument_height,
            heading,
            pitch,
            k_factor,
        } => {
            let observer = resolve_altitude(&aggregator, observer).await;
            let observer_alt = observer.alt.and_then(|ground_m| {
                ObserverAltitude {
                    source: AltitudeSource::Manual(ground_m),
                    instrument_height_m: instrument_height,
                }
                .resolve(None)
            });
            let target = resolve_altitude(&aggregator, target).await;
            let pose = ObserverPose {
                position: Some(with_alt(observer.point, observer_alt)),
                heading_deg: heading.map(normalize_deg),
                pitch_deg: pitch,
                frame: Frame::Earth,
            };
            let target = with_alt(target.point, target.alt);
            let solution = Solver::new()
                .with_k_factor(k_factor.unwrap_or(settings.k_factor))
                .solve(&pose, Some(&target));
            let guidance = Guidance::from_solution(&solution, DEFAULT_DEADBAND_DEG);
            if json {
                print_solution_json(&pose, &target, &solution, &guidance)?;
            } else {
                print_solution(&solution, &guidance, units)?;
            }
        }

        CliCmd::Los {
            start,
            dest,
            samples,
            k_factor,
            freq,
            output,
        } => {
            let mut builder = LineOfSight::builder()
                .start(start.point)
                .start_alt(start.height_above_ground("start")?)
                .end(dest.point)
                .end_alt(dest.height_above_ground("dest")?)
                .k_factor(k_factor.unwrap_or(settings.k_factor))
                .samples(samples.unwrap_or(settings.samples));
            if let Some(freq_hz) = freq {
                builder = builder.freq(freq_hz);
            }
            let los = builder.build(&aggregator).await?;
            match output {
                Output::Json => print_json(&los)?,
                Output::Csv => print_csv(&los)?,
                Output::Plot => plot_ascii(&los, units),
            }
        }

        CliCmd::Elevation { at } => {
            let sample = aggregator.lookup(&at.point).await;
            if json {
                print_json(&sample)?;
            } else {
                print_sample(&sample, units)?;
            }
        }
    };
    Ok(())
}

/// Fills in a missing altitude with the ground elevation.
async fn resolve_altitude(aggregator: &Aggregator, lla: LatLonAlt) -> LatLonAlt {
    if lla.alt.is_some() {
        return lla;
    }
    let sample = aggregator.lookup(&lla.point).await;
    match sample.status() {
        SampleStatus::Ok => (),
        SampleStatus::Unreliable => warn!(
            "providers disagree at {:.5},{:.5}; pass the altitude explicitly",
            lla.point.lat_deg, lla.point.lon_deg
        ),
        SampleStatus::AllProvidersFailed => warn!(
            "no elevation for {:.5},{:.5}; pass the altitude explicitly",
            lla.point.lat_deg, lla.point.lon_deg
        ),
    }
    LatLonAlt {
        alt: sample.aggregate,
        ..lla
    }
}

fn with_alt(point: GeoPoint, alt_m: Option<f64>) -> GeoPoint {
    match alt_m {
        Some(alt_m) => point.with_alt(alt_m),
        None => point,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AnyError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

fn print_solution_json(
    pose: &ObserverPose,
    target: &GeoPoint,
    solution: &SteeringSolution,
    guidance: &Guidance,
) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct Report<'a> {
        observer: &'a ObserverPose,
        target: &'a GeoPoint,
        solution: &'a SteeringSolution,
        guidance: &'a Guidance,
        cue: String,
    }

    print_json(&Report {
        observer: pose,
        target,
        solution,
        guidance,
        cue: guidance.to_string(),
    })
}

fn print_solution(
    solution: &SteeringSolution,
    guidance: &Guidance,
    units: Units,
) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    let pitch = match (solution.required_pitch_deg, solution.refracted_pitch_deg) {
        (Some(pitch), Some(refracted)) => {
            format!("{} (refracted {})", angle(pitch), angle(refracted))
        }
        (pitch, _) => or_dash(pitch, angle),
    };
    writeln!(stdout, "bearing:       {}", or_dash(solution.bearing_deg, angle))?;
    writeln!(
        stdout,
        "distance:      {}",
        or_dash(solution.horizontal_distance_m, |m| units.distance(m))
    )?;
    writeln!(
        stdout,
        "vertical:      {}",
        or_dash(solution.vertical_delta_m, |m| units.height(m))
    )?;
    writeln!(stdout, "pitch:         {pitch}")?;
    writeln!(
        stdout,
        "slant range:   {}",
        or_dash(solution.line_of_sight_distance_m, |m| units.distance(m))
    )?;
    writeln!(stdout, "heading error: {}", or_dash(solution.heading_error_deg, angle))?;
    writeln!(stdout, "pitch error:   {}", or_dash(solution.pitch_error_deg, angle))?;
    writeln!(stdout, "guidance:      {guidance}")?;
    Ok(())
}

fn print_sample(sample: &ElevationSample, units: Units) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    for (id, outcome) in &sample.per_provider {
        match outcome {
            ProviderOutcome::Meters(m) => writeln!(stdout, "{id}: {}", units.height(*m))?,
            ProviderOutcome::Failed(e) => writeln!(stdout, "{id}: failed ({e})")?,
        }
    }
    let status = match sample.status() {
        SampleStatus::Ok => "ok",
        SampleStatus::Unreliable => "unreliable, providers disagree",
        SampleStatus::AllProvidersFailed => "all providers failed",
    };
    writeln!(
        stdout,
        "{:?}: {} ({status})",
        sample.method,
        or_dash(sample.aggregate, |m| units.height(m))
    )?;
    Ok(())
}

/// # Example with gnuplot
///
/// ```sh
/// cargo run -- los --start=44.2706,-71.3033,2 --dest=44.2572,-71.2972,2 csv | tr ',' ' ' > ~/.tmp/plot && gnuplot -p -e "plot for [col=5:6] '~/.tmp/plot' using 2:col with lines"
/// ```
fn print_csv(los: &LineOfSight) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(
        stdout,
        "Fraction,Distance,Latitude,Longitude,Elevation,Ray,Clearance"
    )?;
    for ((((fraction, elevation), point), ray), clearance) in los
        .profile
        .samples
        .iter()
        .copied()
        .zip(los.profile.great_circle.iter())
        .zip(los.result.ray_m.iter())
        .zip(los.result.clearance_m.iter())
    {
        let distance = fraction * los.profile.distance_m;
        writeln!(
            stdout,
            "{fraction},{distance},{},{},{elevation},{ray},{clearance}",
            point.lat_deg, point.lon_deg
        )?;
    }
    Ok(())
}

fn plot_ascii(los: &LineOfSight, units: Units) {
    let series = |values: &mut dyn Iterator<Item = f64>| -> Vec<(f32, f32)> {
        los.profile
            .samples
            .iter()
            .zip(values)
            .map(|(&(f, _), v)| ((f * los.profile.distance_m) as f32, v as f32))
            .collect()
    };
    let terrain = series(&mut los.profile.elevations());
    let ray = series(&mut los.result.ray_m.iter().copied());
    Chart::new(300, 150, 0.0, los.profile.distance_m as f32)
        .lineplot(&Shape::Lines(&terrain))
        .lineplot(&Shape::Lines(&ray))
        .display();

    let verdict = if los.result.blocked { "blocked" } else { "clear" };
    println!(
        "{verdict} over {}, min clearance {}",
        units.distance(los.profile.distance_m),
        units.height(los.result.min_clearance_m)
    );
    if let Some(fresnel_m) = los.result.fresnel_clearance_m {
        println!("first Fresnel zone clearance {}", units.height(fresnel_m));
    }
}
