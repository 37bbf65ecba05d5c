//! Effect persistence
//!
//! Two representations of the same [`EmitterConfig`] data:
//! - the line-oriented text format used by existing particle editors, with
//!   field order and header spelling preserved byte for byte;
//! - a TOML document (`[[emitters]]` tables) for hand-edited effects.
//!
//! [`Effect::load_file`] and [`Effect::save_file`] pick the format from the
//! file extension: `.toml` is TOML, anything else is text.

use crate::curves::{GradientColor, RangedValue, ScaledValue};
use crate::effect::Effect;
use crate::emitter::{Emitter, EmitterConfig, SpriteMode};
use crate::spawn::{EllipseSide, SpawnShape, SpawnShapeValue};
use ember_core::{EmberError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::fs;
use std::io::{Read, Write};
use std::iter::Peekable;
use std::path::Path;
use std::str::{FromStr, Lines};

/// Root structure of a TOML effect file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectDocument {
    #[serde(default)]
    pub emitters: Vec<EmitterConfig>,
}

// ---------------------------------------------------------------------------
// Text reader
// ---------------------------------------------------------------------------

struct LineReader<'a> {
    lines: Peekable<Lines<'a>>,
    line_no: usize,
    emitter: Option<String>,
}

impl<'a> LineReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().peekable(),
            line_no: 0,
            emitter: None,
        }
    }

    fn error(&self, message: impl Display) -> EmberError {
        let message = match &self.emitter {
            Some(name) => format!("emitter '{name}': {message}"),
            None => message.to_string(),
        };
        EmberError::Format {
            source_name: String::new(),
            line: self.line_no,
            message,
        }
    }

    fn peek(&mut self) -> Option<&'a str> {
        self.lines.peek().copied()
    }

    fn next_line(&mut self, what: &str) -> Result<&'a str> {
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                Ok(line)
            }
            None => {
                self.line_no += 1;
                Err(self.error(format_args!("missing value: {what}")))
            }
        }
    }

    fn skip_blank(&mut self) {
        while self.peek().is_some_and(|l| l.trim().is_empty()) {
            self.lines.next();
            self.line_no += 1;
        }
    }

    fn header(&mut self, expected: &str) -> Result<()> {
        let line = self.next_line(expected)?;
        if line.trim() != expected.trim() {
            return Err(self.error(format_args!(
                "expected '{}', found '{}'",
                expected.trim(),
                line.trim()
            )));
        }
        Ok(())
    }

    fn string(&mut self, what: &str) -> Result<&'a str> {
        self.next_line(what).map(value_of)
    }

    fn parsed<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let value = self.string(what)?;
        value
            .parse()
            .map_err(|_| self.error(format_args!("invalid value for {what}: '{value}'")))
    }

    fn float(&mut self, what: &str) -> Result<f32> {
        self.parsed(what)
    }

    fn count(&mut self, what: &str) -> Result<usize> {
        self.parsed(what)
    }

    fn boolean(&mut self, what: &str) -> Result<bool> {
        self.string(what).map(parse_bool)
    }
}

/// Text after the first ':' (or the whole line), trimmed
fn value_of(line: &str) -> &str {
    match line.find(':') {
        Some(i) => line[i + 1..].trim(),
        None => line.trim(),
    }
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn read_ranged(r: &mut LineReader<'_>, always_active: bool) -> Result<RangedValue> {
    let mut value = RangedValue {
        active: always_active || r.boolean("active")?,
        ..Default::default()
    };
    if value.active {
        value.low_min = r.float("lowMin")?;
        value.low_max = r.float("lowMax")?;
    }
    Ok(value)
}

fn read_floats(r: &mut LineReader<'_>, name: &str) -> Result<Vec<f32>> {
    let count = r.count(&format!("{name}Count"))?;
    (0..count).map(|i| r.float(&format!("{name}{i}"))).collect()
}

fn read_scaled(
    r: &mut LineReader<'_>,
    always_active: bool,
    has_independent: bool,
) -> Result<ScaledValue> {
    let mut value = ScaledValue::with_active(always_active || r.boolean("active")?);
    if value.active {
        value.low_min = r.float("lowMin")?;
        value.low_max = r.float("lowMax")?;
        value.high_min = r.float("highMin")?;
        value.high_max = r.float("highMax")?;
        value.relative = r.boolean("relative")?;
        let scaling = read_floats(r, "scaling")?;
        let timeline = read_floats(r, "timeline")?;
        value
            .set_envelope(scaling, timeline)
            .map_err(|e| r.error(e))?;
    }
    if has_independent {
        match r.peek() {
            Some(line) if line.contains("independent") => {
                value.independent = r.boolean("independent")?;
            }
            _ => log::warn!(
                "line {}: no 'independent' entry, reading legacy layout",
                r.line_no
            ),
        }
    }
    Ok(value)
}

fn read_gradient(r: &mut LineReader<'_>) -> Result<GradientColor> {
    let colors = read_floats(r, "colors")?;
    let timeline = read_floats(r, "timeline")?;
    let mut gradient = GradientColor::default();
    gradient
        .set_colors(colors, timeline)
        .map_err(|e| r.error(e))?;
    Ok(gradient)
}

fn read_spawn_shape(r: &mut LineReader<'_>) -> Result<SpawnShapeValue> {
    let shape: SpawnShape = r.parsed("shape")?;
    let mut value = SpawnShapeValue::new(shape);
    if shape == SpawnShape::Ellipse {
        value.edges = r.boolean("edges")?;
        value.side = r.parsed::<EllipseSide>("side")?;
    }
    Ok(value)
}

fn read_emitter(r: &mut LineReader<'_>) -> Result<EmitterConfig> {
    r.emitter = None;
    let name = r.string("name")?.to_string();
    r.emitter = Some(name.clone());
    let mut c = EmitterConfig::new(name);

    r.header("- Delay -")?;
    c.delay = read_ranged(r, false)?;
    r.header("- Duration - ")?;
    c.duration = read_ranged(r, true)?;
    r.header("- Count - ")?;
    c.min_particles = r.count("min")?;
    c.max_particles = r.count("max")?;
    r.header("- Emission - ")?;
    c.emission = read_scaled(r, true, false)?;
    r.header("- Life - ")?;
    c.life = read_scaled(r, true, true)?;
    r.header("- Life Offset - ")?;
    c.life_offset = read_scaled(r, false, true)?;
    r.header("- X Offset - ")?;
    c.x_offset = read_scaled(r, false, false)?;
    r.header("- Y Offset - ")?;
    c.y_offset = read_scaled(r, false, false)?;
    r.header("- Spawn Shape - ")?;
    c.spawn_shape = read_spawn_shape(r)?;
    r.header("- Spawn Width - ")?;
    c.spawn_width = read_scaled(r, true, false)?;
    r.header("- Spawn Height - ")?;
    c.spawn_height = read_scaled(r, true, false)?;

    let scale_header = r.next_line("- X Scale - ")?;
    match scale_header.trim() {
        "- Scale -" => {
            log::warn!("emitter '{}' uses a single scale block", c.name);
            c.x_scale = read_scaled(r, true, false)?;
            c.y_scale.active = false;
        }
        "- X Scale -" => {
            c.x_scale = read_scaled(r, true, false)?;
            r.header("- Y Scale - ")?;
            c.y_scale = read_scaled(r, false, false)?;
        }
        other => {
            return Err(r.error(format_args!("expected '- X Scale -', found '{other}'")));
        }
    }

    r.header("- Velocity - ")?;
    c.velocity = read_scaled(r, false, false)?;
    r.header("- Angle - ")?;
    c.angle = read_scaled(r, false, false)?;
    r.header("- Rotation - ")?;
    c.rotation = read_scaled(r, false, false)?;
    r.header("- Wind - ")?;
    c.wind = read_scaled(r, false, false)?;
    r.header("- Gravity - ")?;
    c.gravity = read_scaled(r, false, false)?;
    r.header("- Tint - ")?;
    c.tint = read_gradient(r)?;
    r.header("- Transparency - ")?;
    c.transparency = read_scaled(r, true, false)?;

    r.header("- Options - ")?;
    c.attached = r.boolean("attached")?;
    c.continuous = r.boolean("continuous")?;
    c.aligned = r.boolean("aligned")?;
    c.additive = r.boolean("additive")?;
    c.behind = r.boolean("behind")?;
    if r.peek().is_some_and(|l| l.starts_with("premultipliedAlpha")) {
        c.premultiplied_alpha = r.boolean("premultipliedAlpha")?;
    }
    if r.peek().is_some_and(|l| l.starts_with("spriteMode")) {
        c.sprite_mode = r.parsed::<SpriteMode>("spriteMode")?;
    }

    r.header("- Image Paths -")?;
    while let Some(line) = r.peek() {
        if line.is_empty() {
            break;
        }
        c.image_paths.push(r.next_line("image path")?.to_string());
    }

    c.validate().map_err(|e| r.error(e))?;
    Ok(c)
}

/// Parse every emitter block in `text`
pub fn parse_emitters(text: &str) -> Result<Vec<EmitterConfig>> {
    let mut reader = LineReader::new(text);
    let mut configs = Vec::new();
    loop {
        reader.skip_blank();
        if reader.peek().is_none() {
            break;
        }
        configs.push(read_emitter(&mut reader)?);
    }
    Ok(configs)
}

// ---------------------------------------------------------------------------
// Text writer
// ---------------------------------------------------------------------------

/// Shortest float text that parses back to the same value
struct Float(f32);

impl Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

fn entry(out: &mut String, key: &str, value: impl Display) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(&value.to_string());
    out.push('\n');
}

fn header(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

fn write_ranged(out: &mut String, value: &RangedValue, always_active: bool) {
    if !always_active {
        entry(out, "active", value.active);
    }
    if always_active || value.active {
        entry(out, "lowMin", Float(value.low_min));
        entry(out, "lowMax", Float(value.low_max));
    }
}

fn write_floats(out: &mut String, name: &str, values: &[f32]) {
    entry(out, &format!("{name}Count"), values.len());
    for (i, v) in values.iter().enumerate() {
        entry(out, &format!("{name}{i}"), Float(*v));
    }
}

fn write_scaled(out: &mut String, value: &ScaledValue, always_active: bool, has_independent: bool) {
    if !always_active {
        entry(out, "active", value.active);
    }
    if always_active || value.active {
        entry(out, "lowMin", Float(value.low_min));
        entry(out, "lowMax", Float(value.low_max));
        entry(out, "highMin", Float(value.high_min));
        entry(out, "highMax", Float(value.high_max));
        entry(out, "relative", value.relative);
        write_floats(out, "scaling", value.scaling());
        write_floats(out, "timeline", value.timeline());
    }
    if has_independent {
        entry(out, "independent", value.independent);
    }
}

fn write_emitter(out: &mut String, c: &EmitterConfig) {
    header(out, &c.name);
    header(out, "- Delay -");
    write_ranged(out, &c.delay, false);
    header(out, "- Duration - ");
    write_ranged(out, &c.duration, true);
    header(out, "- Count - ");
    entry(out, "min", c.min_particles);
    entry(out, "max", c.max_particles);
    header(out, "- Emission - ");
    write_scaled(out, &c.emission, true, false);
    header(out, "- Life - ");
    write_scaled(out, &c.life, true, true);
    header(out, "- Life Offset - ");
    write_scaled(out, &c.life_offset, false, true);
    header(out, "- X Offset - ");
    write_scaled(out, &c.x_offset, false, false);
    header(out, "- Y Offset - ");
    write_scaled(out, &c.y_offset, false, false);

    header(out, "- Spawn Shape - ");
    entry(out, "shape", c.spawn_shape.shape);
    if c.spawn_shape.shape == SpawnShape::Ellipse {
        entry(out, "edges", c.spawn_shape.edges);
        entry(out, "side", c.spawn_shape.side);
    }
    header(out, "- Spawn Width - ");
    write_scaled(out, &c.spawn_width, true, false);
    header(out, "- Spawn Height - ");
    write_scaled(out, &c.spawn_height, true, false);
    header(out, "- X Scale - ");
    write_scaled(out, &c.x_scale, true, false);
    header(out, "- Y Scale - ");
    write_scaled(out, &c.y_scale, false, false);
    header(out, "- Velocity - ");
    write_scaled(out, &c.velocity, false, false);
    header(out, "- Angle - ");
    write_scaled(out, &c.angle, false, false);
    header(out, "- Rotation - ");
    write_scaled(out, &c.rotation, false, false);
    header(out, "- Wind - ");
    write_scaled(out, &c.wind, false, false);
    header(out, "- Gravity - ");
    write_scaled(out, &c.gravity, false, false);

    header(out, "- Tint - ");
    write_floats(out, "colors", c.tint.colors());
    write_floats(out, "timeline", c.tint.timeline());
    header(out, "- Transparency - ");
    write_scaled(out, &c.transparency, true, false);

    header(out, "- Options - ");
    entry(out, "attached", c.attached);
    entry(out, "continuous", c.continuous);
    entry(out, "aligned", c.aligned);
    entry(out, "additive", c.additive);
    entry(out, "behind", c.behind);
    entry(out, "premultipliedAlpha", c.premultiplied_alpha);
    entry(out, "spriteMode", c.sprite_mode);
    header(out, "- Image Paths -");
    for path in &c.image_paths {
        header(out, path);
    }
    out.push('\n');
}

/// Render emitter configs in the text format, separated by a blank line
pub fn write_emitters<'a>(configs: impl IntoIterator<Item = &'a EmitterConfig>) -> String {
    let mut out = String::new();
    for (i, config) in configs.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_emitter(&mut out, config);
    }
    out
}

// ---------------------------------------------------------------------------
// Effect entry points
// ---------------------------------------------------------------------------

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

impl Effect {
    /// Build an effect with one fresh emitter per config
    pub fn from_configs(configs: Vec<EmitterConfig>) -> Self {
        Effect::from_emitters(configs.into_iter().map(Emitter::new).collect())
    }

    /// Parse text-format data; `source_name` identifies it in errors
    pub fn parse_text(text: &str, source_name: &str) -> Result<Self> {
        let configs = parse_emitters(text).map_err(|e| e.with_source(source_name))?;
        log::debug!("loaded {} emitter(s) from {source_name}", configs.len());
        Ok(Effect::from_configs(configs))
    }

    /// Read text-format data from any reader
    pub fn load<R: Read>(mut reader: R, source_name: &str) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Effect::parse_text(&text, source_name)
    }

    pub fn to_text_string(&self) -> String {
        write_emitters(self.emitters().iter().map(Emitter::config))
    }

    pub fn write_text<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.to_text_string().as_bytes())?;
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let document: EffectDocument = toml::from_str(content)?;
        for config in &document.emitters {
            config.validate()?;
        }
        Ok(Effect::from_configs(document.emitters))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let document = EffectDocument {
            emitters: self.emitters().iter().map(|e| e.config().clone()).collect(),
        };
        Ok(toml::to_string_pretty(&document)?)
    }

    /// Load an effect file, TOML for `.toml` and text otherwise
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let content = fs::read_to_string(path)?;
        if is_toml(path) {
            let effect = Effect::from_toml_str(&content).map_err(|e| e.with_source(&source_name))?;
            log::debug!(
                "loaded {} emitter(s) from {source_name}",
                effect.emitters().len()
            );
            Ok(effect)
        } else {
            Effect::parse_text(&content, &source_name)
        }
    }

    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_toml(path) {
            self.to_toml_string()?
        } else {
            self.to_text_string()
        };
        fs::write(path, content)?;
        log::debug!("saved {} emitter(s) to {}", self.emitters().len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EmitterBuilder;

    fn rich_config() -> EmitterConfig {
        EmitterBuilder::new("flame")
            .count(2, 120)
            .delay(10.0, 20.0)
            .duration(800.0, 1200.0)
            .emission(&[1.0, 0.25], &[0.0, 0.75], 0.0, 0.0, 40.0, 60.0)
            .unwrap()
            .life_low(300.0, 450.5)
            .life_high(900.0, 1100.0)
            .life_independent(true)
            .velocity_high(30.0, 70.0)
            .velocity_relative(true)
            .angle_high(80.0, 100.0)
            .gravity(&[0.0, 1.0], &[0.0, 1.0], 0.0, 0.0, -10.0, -30.0)
            .unwrap()
            .shape(SpawnShape::Ellipse)
            .ellipse_edges(true, EllipseSide::Top)
            .spawn_width_high(12.0, 12.0)
            .x_scale_high(8.0, 16.0)
            .y_scale_high(4.0, 6.0)
            .tint(&[1.0, 0.5, 0.0, 0.2, 0.1, 0.1], &[0.0, 1.0])
            .unwrap()
            .transparency(&[0.0, 1.0, 0.0], &[0.0, 0.2, 1.0], 0.0, 0.0, 1.0, 1.0)
            .unwrap()
            .continuous(true)
            .aligned(true)
            .premultiplied_alpha(true)
            .sprite_mode(SpriteMode::Animated)
            .image_paths(["fire0.png", "fire1.png"])
            .into_config()
    }

    fn flat_block(high: f32) -> String {
        format!(
            "lowMin: 0.0\nlowMax: 0.0\nhighMin: {high:?}\nhighMax: {high:?}\nrelative: false\n\
             scalingCount: 1\nscaling0: 1.0\ntimelineCount: 1\ntimeline0: 0.0\n"
        )
    }

    #[test]
    fn text_round_trip_preserves_configs() {
        let mut smoke = EmitterConfig::new("smoke");
        smoke.additive = false;
        let configs = vec![rich_config(), smoke];
        let text = write_emitters(&configs);
        let parsed = parse_emitters(&text).unwrap();
        assert_eq!(parsed, configs);
        // Writing again is byte-identical
        assert_eq!(write_emitters(&parsed), text);
    }

    #[test]
    fn text_layout_matches_editor_files() {
        let text = write_emitters([&EmitterConfig::new("plain")]);
        assert!(text.starts_with(
            "plain\n- Delay -\nactive: false\n- Duration - \nlowMin: 1000.0\nlowMax: 1000.0\n\
             - Count - \nmin: 0\nmax: 4\n- Emission - \nlowMin: 0.0\n"
        ));
        // Inactive curves write only their flag; life offset keeps its independent line
        assert!(text.contains("- Life Offset - \nactive: false\nindependent: false\n- X Offset - \n"));
        assert!(text.contains("- Spawn Shape - \nshape: point\n- Spawn Width - \n"));
        assert!(text.contains(
            "- Tint - \ncolorsCount: 3\ncolors0: 1.0\ncolors1: 1.0\ncolors2: 1.0\ntimelineCount: 1\ntimeline0: 0.0\n"
        ));
        assert!(text.ends_with(
            "premultipliedAlpha: false\nspriteMode: single\n- Image Paths -\n\n"
        ));
    }

    #[test]
    fn inactive_curves_read_back_with_flat_envelope() {
        let text = write_emitters([&EmitterConfig::new("plain")]);
        let parsed = parse_emitters(&text).unwrap();
        let x_offset = &parsed[0].x_offset;
        assert!(!x_offset.active);
        assert_eq!(x_offset.scaling(), [1.0]);
        assert_eq!(x_offset.timeline(), [0.0]);
        assert_eq!(*x_offset, ScaledValue::with_active(false));
        assert!(parsed[0].emission.active);
    }

    #[test]
    fn emitters_are_separated_by_a_blank_line() {
        let a = EmitterConfig::new("a");
        let b = EmitterConfig::new("b");
        let text = write_emitters([&a, &b]);
        assert!(text.contains("- Image Paths -\n\n\nb\n- Delay -\n"));
    }

    #[test]
    fn legacy_layout_is_accepted() {
        let text = format!(
            "legacy\n- Delay -\nactive: false\n- Duration - \nlowMin: 500.0\nlowMax: 500.0\n\
             - Count - \nmin: 0\nmax: 10\n- Emission - \n{emission}- Life - \n{life}\
             - Life Offset - \nactive: false\n- X Offset - \nactive: false\n\
             - Y Offset - \nactive: false\n- Spawn Shape - \nshape: point\n\
             - Spawn Width - \n{zero}- Spawn Height - \n{zero}- Scale -\n{scale}\
             - Velocity - \nactive: false\n- Angle - \nactive: false\n\
             - Rotation - \nactive: false\n- Wind - \nactive: false\n\
             - Gravity - \nactive: false\n- Tint - \ncolorsCount: 3\ncolors0: 1.0\n\
             colors1: 0.5\ncolors2: 0.0\ntimelineCount: 1\ntimeline0: 0.0\n\
             - Transparency - \n{alpha}- Options - \nattached: false\ncontinuous: TRUE\n\
             aligned: false\nadditive: true\nbehind: false\n- Image Paths -\nparticle.png\n",
            emission = flat_block(20.0),
            life = flat_block(400.0),
            zero = flat_block(0.0),
            scale = flat_block(32.0),
            alpha = flat_block(1.0),
        );
        let configs = parse_emitters(&text).unwrap();
        assert_eq!(configs.len(), 1);
        let c = &configs[0];
        assert_eq!(c.name, "legacy");
        assert_eq!(c.max_particles, 10);
        assert!(!c.life.independent);
        assert_eq!(c.x_scale.high_max, 32.0);
        assert!(!c.y_scale.active);
        assert!(c.continuous);
        assert!(!c.premultiplied_alpha);
        assert_eq!(c.sprite_mode, SpriteMode::Single);
        assert_eq!(c.tint.color_at(0.0), [1.0, 0.5, 0.0]);
        assert_eq!(c.image_paths, vec!["particle.png".to_string()]);
    }

    #[test]
    fn malformed_value_reports_emitter_line_and_source() {
        let mut text = write_emitters([&EmitterConfig::new("spark")]);
        text = text.replacen("max: 4", "max: lots", 1);
        let err = Effect::parse_text(&text, "spark.p").unwrap_err();
        match err {
            EmberError::Format {
                source_name,
                line,
                message,
            } => {
                assert_eq!(source_name, "spark.p");
                assert_eq!(line, 9);
                assert!(message.contains("emitter 'spark'"), "{message}");
                assert!(message.contains("max"), "{message}");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn truncated_file_is_a_format_error() {
        let text = write_emitters([&EmitterConfig::new("cut")]);
        let truncated: String = text.lines().take(12).map(|l| format!("{l}\n")).collect();
        let err = parse_emitters(&truncated).unwrap_err();
        assert!(matches!(err, EmberError::Format { .. }));
    }

    #[test]
    fn mismatched_envelope_in_file_is_rejected() {
        let text = write_emitters([&EmitterConfig::new("bad")]).replacen(
            "- Emission - \nlowMin: 0.0\nlowMax: 0.0\nhighMin: 0.0\nhighMax: 0.0\nrelative: false\nscalingCount: 1\nscaling0: 1.0\n",
            "- Emission - \nlowMin: 0.0\nlowMax: 0.0\nhighMin: 0.0\nhighMax: 0.0\nrelative: false\nscalingCount: 2\nscaling0: 1.0\nscaling1: 1.0\n",
            1,
        );
        assert!(parse_emitters(&text).is_err());
    }

    #[test]
    fn toml_round_trip() {
        let effect = Effect::from_configs(vec![rich_config(), EmitterConfig::new("second")]);
        let toml_text = effect.to_toml_string().unwrap();
        assert!(toml_text.contains("[[emitters]]"));
        let loaded = Effect::from_toml_str(&toml_text).unwrap();
        let configs: Vec<_> = loaded.emitters().iter().map(|e| e.config().clone()).collect();
        assert_eq!(configs, vec![rich_config(), EmitterConfig::new("second")]);
    }

    #[test]
    fn sparse_toml_uses_defaults() {
        let effect = Effect::from_toml_str(
            r#"
            [[emitters]]
            name = "puff"
            max_particles = 12
            continuous = true

            [emitters.velocity]
            active = true
            high_min = 5.0
            high_max = 10.0
            "#,
        )
        .unwrap();
        let config = effect.emitters()[0].config();
        assert_eq!(config.name, "puff");
        assert_eq!(config.max_particles, 12);
        assert!(config.continuous);
        assert!(config.velocity.active);
        assert_eq!(config.velocity.scaling(), &[1.0]);
        assert!(config.emission.active);
    }

    #[test]
    fn files_dispatch_on_extension() {
        let dir = std::env::temp_dir().join(format!("ember-format-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let effect = Effect::from_configs(vec![rich_config()]);

        for name in ["fire.p", "fire.toml"] {
            let path = dir.join(name);
            effect.save_file(&path).unwrap();
            let loaded = Effect::load_file(&path).unwrap();
            assert_eq!(loaded.emitters()[0].config(), &rich_config());
        }
        let text = fs::read_to_string(dir.join("fire.p")).unwrap();
        assert!(text.starts_with("flame\n- Delay -\n"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_reads_from_any_reader() {
        let text = write_emitters([&EmitterConfig::new("io")]);
        let effect = Effect::load(text.as_bytes(), "memory").unwrap();
        assert_eq!(effect.emitters()[0].name(), "io");
    }
}
