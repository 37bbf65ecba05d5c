//! Keyframe sequence preview command

use anyhow::{Context, Result};
use ember_animation::{KeyFrames, PlayMode};

pub struct FramesArgs {
    pub count: usize,
    pub frame_duration: f32,
    pub mode: String,
    pub time: f32,
    pub step: Option<f32>,
}

pub fn run(args: FramesArgs) -> Result<()> {
    let mode: PlayMode = args.mode.parse()?;
    let frames = KeyFrames::new(args.frame_duration, (0..args.count).collect::<Vec<_>>())
        .context("building keyframe sequence")?
        .with_mode(mode);
    let step = args.step.unwrap_or(args.frame_duration);

    println!(
        "{} frame(s) x {}s in {mode} mode ({}s per pass)",
        args.count,
        args.frame_duration,
        frames.animation_duration()
    );
    println!("{}", timeline(&frames, args.time, step).join(" "));
    if frames.is_finished(args.time) {
        println!("(a single pass finishes before {}s)", args.time);
    }
    Ok(())
}

/// Frame index sampled every `step` seconds from 0 through `until`
fn timeline(frames: &KeyFrames<usize>, until: f32, step: f32) -> Vec<String> {
    if !(step.is_finite() && step > 0.0) {
        return Vec::new();
    }
    let samples = (until.max(0.0) / step).floor() as usize;
    (0..=samples)
        .map(|i| frames.key_frame(i as f32 * step).to_string())
        .collect()
}
