//! Effect inspection command

use anyhow::{Context, Result};
use ember_particles::{Effect, EmitterConfig};

pub fn run(path: &str) -> Result<()> {
    let effect = Effect::load_file(path).with_context(|| format!("loading {path}"))?;

    println!("{path}: {} emitter(s)", effect.emitters().len());
    for emitter in effect.emitters() {
        describe(emitter.config());
    }
    Ok(())
}

fn describe(config: &EmitterConfig) {
    println!();
    println!("  {}", config.name);
    println!(
        "    particles: {}..{}   duration: {}-{} ms   delay: {}",
        config.min_particles,
        config.max_particles,
        config.duration.low_min,
        config.duration.low_max,
        if config.delay.active { "yes" } else { "no" },
    );
    println!(
        "    emission: {}-{} /s   life: {}-{} ms",
        config.emission.high_min, config.emission.high_max, config.life.high_min, config.life.high_max,
    );

    let mut flags = Vec::new();
    for (on, name) in [
        (config.continuous, "continuous"),
        (config.attached, "attached"),
        (config.aligned, "aligned"),
        (config.additive, "additive"),
        (config.behind, "behind"),
        (config.premultiplied_alpha, "premultiplied"),
    ] {
        if on {
            flags.push(name);
        }
    }
    if !flags.is_empty() {
        println!("    options: {}", flags.join(", "));
    }
    println!("    sprite mode: {}", config.sprite_mode);

    let active: Vec<&str> = config
        .curves()
        .into_iter()
        .filter(|(_, curve)| curve.active)
        .map(|(name, _)| name)
        .collect();
    println!("    active curves: {}", active.join(", "));

    if config.image_paths.is_empty() {
        println!("    images: none");
    } else {
        for path in &config.image_paths {
            println!("    image: {path}");
        }
    }
}
