//! Effect format conversion command

use anyhow::{Context, Result};
use ember_particles::Effect;

/// Re-save `input` as `output`; the output extension picks the format
pub fn run(input: &str, output: &str) -> Result<()> {
    let effect = Effect::load_file(input).with_context(|| format!("loading {input}"))?;
    effect
        .save_file(output)
        .with_context(|| format!("writing {output}"))?;
    println!(
        "Converted {} emitter(s): {input} -> {output}",
        effect.emitters().len()
    );
    Ok(())
}
