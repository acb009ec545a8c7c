//! Parsing of raw modifier tokens into typed commands.
//!
//! The chat syntax `spin-fast.rainbow.rain-glitter` tokenizes into
//! `[name, value]` pairs; `parse_commands` resolves those pairs into the
//! `Command` enum consumed by the pipeline. Unknown names are dropped so an
//! unsupported modifier never fails the whole request.

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Spin { step: u32 },
    SpinRev { step: u32 },
    Shake { step: u32 },
    Rainbow { step: u32 },
    Wiggle { step: u32 },
    Infinite { step: u32 },
    Slide { step: u32 },
    SlideRev { step: u32 },
    Rain { glitter: bool },
    Flip { vertical: bool },
    Reverse,
    Speed { delay_cs: f32 },
    Hyperspeed,
    Resize { spec: String },
    Rotate { degrees: f32 },
}

impl Command {
    /// Commands that depend on the full animation timeline and therefore run
    /// as their own decode-transform-encode pass, before the plain ones.
    pub fn is_gif_context(&self) -> bool {
        matches!(
            self,
            Command::Spin { .. }
                | Command::SpinRev { .. }
                | Command::Shake { .. }
                | Command::Rainbow { .. }
                | Command::Wiggle { .. }
                | Command::Infinite { .. }
                | Command::Slide { .. }
                | Command::SlideRev { .. }
                | Command::Rain { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Spin { .. } => "spin",
            Command::SpinRev { .. } => "spinrev",
            Command::Shake { .. } => "shake",
            Command::Rainbow { .. } => "rainbow",
            Command::Wiggle { .. } => "wiggle",
            Command::Infinite { .. } => "infinite",
            Command::Slide { .. } => "slide",
            Command::SlideRev { .. } => "sliderev",
            Command::Rain { .. } => "rain",
            Command::Flip { .. } => "flip",
            Command::Reverse => "reverse",
            Command::Speed { .. } => "speed",
            Command::Hyperspeed => "hyperspeed",
            Command::Resize { .. } => "resize",
            Command::Rotate { .. } => "rotate",
        }
    }
}

/// Named speed presets shared by the timeline commands. Lower is faster.
fn speed_step(value: &str) -> u32 {
    match value {
        "fast" => 6,
        "faster" => 4,
        "hyper" => 2,
        _ => 8,
    }
}

/// Wiggle also understands the amplitude vocabulary; both feed the same step.
fn wiggle_step(value: &str) -> u32 {
    match value {
        "big" => 4,
        "bigger" => 6,
        "huge" => 10,
        _ => speed_step(value),
    }
}

pub fn parse_commands(pairs: &[(String, String)]) -> Vec<Command> {
    let mut commands = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        let value = value.trim();
        let command = match name.trim() {
            "spin" => Command::Spin { step: speed_step(value) },
            "spinrev" => Command::SpinRev { step: speed_step(value) },
            "shake" => Command::Shake { step: speed_step(value) },
            "rainbow" => Command::Rainbow { step: speed_step(value) },
            "wiggle" => Command::Wiggle { step: wiggle_step(value) },
            "infinite" => Command::Infinite { step: speed_step(value) },
            "slide" => Command::Slide { step: speed_step(value) },
            "sliderev" => Command::SlideRev { step: speed_step(value) },
            "rain" => Command::Rain { glitter: value == "glitter" },
            "flip" => Command::Flip { vertical: false },
            "flap" => Command::Flip { vertical: true },
            "reverse" => Command::Reverse,
            "speed" => Command::Speed {
                delay_cs: value.parse::<f32>().unwrap_or(2.0).max(2.0),
            },
            "hyperspeed" => Command::Hyperspeed,
            "resize" => Command::Resize { spec: value.to_string() },
            "rotate" => Command::Rotate {
                degrees: value.parse::<f32>().unwrap_or(90.0),
            },
            "" => continue,
            other => {
                log::debug!("Dropping unknown command '{}'", other);
                continue;
            }
        };
        commands.push(command);
    }
    commands
}

/// Splits the `name-arg.name-arg` chat syntax into raw `[name, value]` pairs.
pub fn tokenize_commands(input: &str) -> Vec<(String, String)> {
    input
        .split('.')
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once('-') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (token.to_string(), String::new()),
        })
        .collect()
}
