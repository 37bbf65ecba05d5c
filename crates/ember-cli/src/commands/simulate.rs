//! Headless effect simulation command

use crate::config::SimulationConfig;
use anyhow::{Context, Result};
use ember_particles::{Effect, Emitter};

pub struct SimulateArgs {
    pub file: String,
    pub config: SimulationConfig,
    /// Keep emitting instead of finishing at the first completion
    pub loop_effect: bool,
}

/// Totals gathered over a run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub peak_particles: usize,
    pub completed_at: Option<f32>,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let mut effect =
        Effect::load_file(&args.file).with_context(|| format!("loading {}", args.file))?;
    if let Some(seed) = args.config.seed {
        effect.reseed(seed);
    }
    if args.loop_effect {
        for emitter in effect.emitters_mut() {
            emitter.config_mut().continuous = true;
        }
    }

    println!(
        "Simulating {} for {}s at dt={} ({} emitter(s))",
        args.file,
        args.config.seconds,
        args.config.dt,
        effect.emitters().len()
    );
    let summary = simulate(&mut effect, &args.config, |step, time, effect| {
        print_status(step, time, effect);
    });

    println!(
        "Done after {} step(s); peak {} particle(s)",
        summary.steps, summary.peak_particles
    );
    match summary.completed_at {
        Some(time) => println!("Effect completed at {time:.3}s"),
        None => println!("Effect still running"),
    }
    Ok(())
}

/// Step `effect` per `config`, calling `report` every `report_every` steps.
///
/// Stops early once the effect completes.
pub fn simulate(
    effect: &mut Effect,
    config: &SimulationConfig,
    mut report: impl FnMut(usize, f32, &Effect),
) -> RunSummary {
    let mut summary = RunSummary::default();
    effect.start();
    for step in 1..=config.steps() {
        effect.update(config.dt);
        summary.steps = step;
        summary.peak_particles = summary.peak_particles.max(live_particles(effect));
        let time = step as f32 * config.dt;
        if config.report_every > 0 && step % config.report_every == 0 {
            report(step, time, effect);
        }
        if effect.is_complete() {
            summary.completed_at = Some(time);
            log::debug!("effect complete after {step} step(s)");
            break;
        }
    }
    summary
}

fn live_particles(effect: &Effect) -> usize {
    effect.emitters().iter().map(Emitter::active_count).sum()
}

fn print_status(step: usize, time: f32, effect: &Effect) {
    let bounds = effect.bounding_box();
    let extent = if bounds.is_empty() {
        "empty".to_string()
    } else {
        format!("{:.1} x {:.1}", bounds.width(), bounds.height())
    };
    println!(
        "[{step:>5}] t={time:>7.3}s  particles={:<5} bounds={extent}",
        live_particles(effect)
    );
    for emitter in effect.emitters() {
        log::debug!(
            "  {}: {:?} {}/{} ({:.0}%)",
            emitter.name(),
            emitter.state(),
            emitter.active_count(),
            emitter.max_particles(),
            emitter.percent_complete() * 100.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_particles::EmitterBuilder;

    fn burst() -> Effect {
        let emitter = EmitterBuilder::new("burst")
            .count(0, 20)
            .duration(200.0, 200.0)
            .emission_high(50.0, 50.0)
            .life_high(300.0, 300.0)
            .build_seeded(9);
        Effect::from_emitters(vec![emitter])
    }

    #[test]
    fn finite_effect_completes_early() {
        let config = SimulationConfig {
            dt: 0.05,
            seconds: 5.0,
            seed: Some(1),
            report_every: 4,
        };
        let mut effect = burst();
        let mut reports = 0;
        let summary = simulate(&mut effect, &config, |_, _, _| reports += 1);
        assert!(summary.peak_particles > 0);
        assert!(summary.completed_at.is_some());
        assert!(summary.steps < config.steps());
        assert_eq!(reports, summary.steps / 4);
    }

    #[test]
    fn reports_can_be_disabled() {
        let config = SimulationConfig {
            dt: 0.125,
            seconds: 0.25,
            seed: None,
            report_every: 0,
        };
        let mut effect = burst();
        let summary = simulate(&mut effect, &config, |_, _, _| panic!("no reports expected"));
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.completed_at, None);
    }
}
