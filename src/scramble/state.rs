use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrambleConfig {
    pub continuous_tick_ms: u64,
    pub reveal_tick_ms: u64,
    /// Reveal pointer advance per tick when unrevealed positions are frozen.
    pub frozen_advance: f64,
    /// Reveal pointer advance per tick when unrevealed positions are random.
    pub random_advance: f64,
    pub placeholder: char,
}

impl Default for ScrambleConfig {
    fn default() -> Self {
        Self {
            continuous_tick_ms: 30,
            reveal_tick_ms: 50,
            frozen_advance: 1.0,
            random_advance: 1.0 / 3.0,
            placeholder: 'X',
        }
    }
}

impl ScrambleConfig {
    pub fn continuous_tick(&self) -> Duration {
        Duration::from_millis(self.continuous_tick_ms.max(1))
    }

    pub fn reveal_tick(&self) -> Duration {
        Duration::from_millis(self.reveal_tick_ms.max(1))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Scrambled text settles on the mask template.
    ToMask,
    /// Mask template resolves into the original text.
    ToOriginal,
}

/// Progress of one reveal phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Reveal {
    target: Vec<char>,
    freeze: Option<Vec<char>>,
    ticks: u32,
    advance: f64,
}

impl Reveal {
    fn new(target: Vec<char>, freeze: Option<Vec<char>>, config: &ScrambleConfig) -> Self {
        let defaults = ScrambleConfig::default();
        let advance = if freeze.is_some() {
            usable_advance(config.frozen_advance, defaults.frozen_advance)
        } else {
            usable_advance(config.random_advance, defaults.random_advance)
        };

        Self {
            target,
            freeze,
            ticks: 0,
            advance,
        }
    }

    pub fn pointer(&self) -> f64 {
        f64::from(self.ticks) * self.advance
    }

    pub fn is_complete(&self) -> bool {
        self.pointer() >= self.target.len() as f64
    }

    fn frame<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let pointer = self.pointer();
        self.target
            .iter()
            .enumerate()
            .map(|(index, &target)| {
                if (index as f64) < pointer {
                    return target;
                }
                match self.freeze.as_ref().and_then(|freeze| freeze.get(index)) {
                    Some(&frozen) => frozen,
                    None => random_letter(rng),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrambleMode {
    Idle,
    Continuous,
    Converging { phase: Phase, reveal: Reveal },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The named phase emitted its last frame; the next phase starts on the
    /// following tick.
    PhaseFinished(Phase),
    /// Both phases are done and the session is idle again.
    Converged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub display: String,
    pub outcome: TickOutcome,
}

/// Everything an animation needs between ticks. It never touches a timer:
/// whoever drives it calls [`ScrambleSession::step`] once per tick and hands
/// the frame to the display.
#[derive(Debug, Clone)]
pub struct ScrambleSession {
    original: Vec<char>,
    original_text: String,
    mask_template: String,
    current_display: String,
    last_scramble: Option<Vec<char>>,
    mode: ScrambleMode,
    config: ScrambleConfig,
}

impl ScrambleSession {
    pub fn new(original_text: impl Into<String>, config: ScrambleConfig) -> Self {
        let original_text = original_text.into();
        let mask_template = mask_text(&original_text, config.placeholder);

        Self {
            original: original_text.chars().collect(),
            current_display: mask_template.clone(),
            original_text,
            mask_template,
            last_scramble: None,
            mode: ScrambleMode::Idle,
            config,
        }
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn mask_template(&self) -> &str {
        &self.mask_template
    }

    pub fn current_display(&self) -> &str {
        &self.current_display
    }

    pub fn mode(&self) -> &ScrambleMode {
        &self.mode
    }

    pub fn config(&self) -> &ScrambleConfig {
        &self.config
    }

    pub fn is_idle(&self) -> bool {
        self.mode == ScrambleMode::Idle
    }

    pub fn start_continuous(&mut self) {
        self.mode = ScrambleMode::Continuous;
    }

    /// Phase one freezes unrevealed positions on the last scrambled frame, if
    /// there has been one since the previous convergence. Without one it shows
    /// random letters and reveals at `random_advance`; it does not fall back to
    /// freezing on the mask itself, which would make the phase a no-op.
    pub fn begin_convergence(&mut self) {
        let freeze = self.last_scramble.clone();
        self.mode = ScrambleMode::Converging {
            phase: Phase::ToMask,
            reveal: Reveal::new(self.mask_template.chars().collect(), freeze, &self.config),
        };
    }

    pub fn stop(&mut self) {
        self.mode = ScrambleMode::Idle;
    }

    /// Advances one tick. Returns `None` while idle.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Frame> {
        let (display, outcome) = match &mut self.mode {
            ScrambleMode::Idle => return None,
            ScrambleMode::Continuous => {
                let scrambled: Vec<char> =
                    self.original.iter().map(|_| random_letter(rng)).collect();
                let display = scrambled.iter().collect::<String>();
                self.last_scramble = Some(scrambled);
                (display, TickOutcome::Continue)
            }
            ScrambleMode::Converging { phase, reveal } => {
                let display = reveal.frame(rng);
                if reveal.is_complete() {
                    (display, TickOutcome::PhaseFinished(*phase))
                } else {
                    reveal.ticks += 1;
                    (display, TickOutcome::Continue)
                }
            }
        };

        let outcome = match outcome {
            TickOutcome::PhaseFinished(Phase::ToMask) => {
                let mask: Vec<char> = self.mask_template.chars().collect();
                self.mode = ScrambleMode::Converging {
                    phase: Phase::ToOriginal,
                    reveal: Reveal::new(self.original.clone(), Some(mask), &self.config),
                };
                outcome
            }
            TickOutcome::PhaseFinished(Phase::ToOriginal) => {
                self.mode = ScrambleMode::Idle;
                // a later convergence must not freeze on a frame from before this one
                self.last_scramble = None;
                TickOutcome::Converged
            }
            other => other,
        };

        self.current_display.clone_from(&display);
        Some(Frame { display, outcome })
    }
}

/// A rate that never moves the pointer forward would keep a phase ticking
/// forever, so such values fall back to the default rate.
fn usable_advance(configured: f64, default: f64) -> f64 {
    if configured.is_finite() && configured > 0.0 {
        configured
    } else {
        default
    }
}

/// Same length as `text`, spaces kept, every other character replaced.
pub fn mask_text(text: &str, placeholder: char) -> String {
    text.chars()
        .map(|c| if c == ' ' { ' ' } else { placeholder })
        .collect()
}

fn random_letter<R: Rng + ?Sized>(rng: &mut R) -> char {
    char::from(LETTERS[rng.gen_range(0..LETTERS.len())])
}
