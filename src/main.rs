use anyhow::{bail, Context, Result};
use lyricus::{
    get_readable_duration,
    player::RodioClock,
    waveform::{PixelSurface, RodioBackend, ThreadedExtractor},
    Config, DurationStyle, Studio, REFRESH_RATE,
};
use std::{io::Write, thread, time::Duration};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const STRIP_WIDTH: usize = 64;
const BLOCKS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: lyricus <audio-file>");
    };

    let config = Config::load().unwrap_or_else(|e| {
        warn!("could not read config, using defaults: {e}");
        Config::default()
    });

    let studio = Studio::new(
        Box::new(RodioClock::new()?),
        Box::new(PixelSurface::new(STRIP_WIDTH as f64, 16.0, 1.0)),
        Box::new(ThreadedExtractor::new(Box::new(RodioBackend))),
        config.wave_style.clone(),
    )?;

    let controller = studio.controller();
    controller.borrow_mut().set_rate(config.default_rate);

    let source = studio
        .load_file(&path)
        .with_context(|| format!("could not load {path}"))?;
    if let Some(title) = &source.title {
        println!("{title}");
    }

    loop {
        studio.tick();
        draw_status(&studio);

        if controller.borrow().is_finished() {
            break;
        }
        thread::sleep(Duration::from_millis(REFRESH_RATE));
    }
    println!();

    Ok(())
}

fn draw_status(studio: &Studio) {
    let state = studio.controller().borrow().state().clone();
    let renderer = studio.renderer();

    let progress = state
        .duration
        .filter(|d| *d > 0.0)
        .map(|d| state.position / d);

    let strip = match renderer.envelope() {
        Some(env) => envelope_strip(env.values(), progress),
        None if renderer.is_loading() => format!("{:^width$}", "analysing audio...", width = STRIP_WIDTH),
        None => " ".repeat(STRIP_WIDTH),
    };

    let elapsed = get_readable_duration(
        Duration::from_secs_f64(state.position.max(0.0)),
        DurationStyle::Compact,
    );
    let total = match state.duration {
        Some(d) => get_readable_duration(Duration::from_secs_f64(d), DurationStyle::Compact),
        None => "?:??".to_string(),
    };

    print!("\r{elapsed} {strip} {total}");
    let _ = std::io::stdout().flush();
}

/// Reduces the 320-point envelope to a block-character strip with a playback
/// marker, for terminals rather than canvases.
fn envelope_strip(values: &[f32], progress: Option<f64>) -> String {
    let per_column = values.len().div_ceil(STRIP_WIDTH).max(1);
    let marker = progress.map(|p| (p.clamp(0.0, 1.0) * (STRIP_WIDTH - 1) as f64).round() as usize);

    let mut out = String::with_capacity(STRIP_WIDTH * 3);
    for (i, chunk) in values.chunks(per_column).enumerate() {
        if Some(i) == marker {
            out.push('┃');
            continue;
        }
        let peak = chunk.iter().fold(0.0f32, |max, v| max.max(*v));
        let idx = ((peak * 8.0).round() as usize).min(8);
        out.push(BLOCKS[idx]);
    }
    out
}
