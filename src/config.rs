use std::path::PathBuf;
use tracing::{info, warn};

use crate::options::*;
use crate::types::{GameMode, Tier};

pub const DEFAULT_DATA_DIR: &str = "math_monster_data";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub mode: GameMode,
    pub tier: Tier,
    pub questions_per_stage: u32,
    pub run_length: usize,
    pub addition_bias: f64,
    pub correct_delay_ms: u64,
    pub incorrect_delay_ms: u64,
}

impl EngineConfig {
    pub fn for_mode(mode: GameMode) -> Self {
        let (correct_delay_ms, incorrect_delay_ms) = match mode {
            GameMode::Stage => (STAGE_CORRECT_DELAY_MS, STAGE_INCORRECT_DELAY_MS),
            GameMode::Timed => (TIMED_CORRECT_DELAY_MS, TIMED_INCORRECT_DELAY_MS),
        };
        Self {
            mode,
            tier: Tier::default(),
            questions_per_stage: QUESTIONS_PER_STAGE,
            run_length: RUN_LENGTH,
            addition_bias: ADDITION_BIAS,
            correct_delay_ms,
            incorrect_delay_ms,
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_mode(GameMode::Stage)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    pub engine: EngineConfig,
    pub data_dir: PathBuf,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

pub fn parse_game_mode(arg: &str) -> Option<GameMode> {
    let arg = arg.trim_start_matches('-').to_lowercase();

    match arg.as_str() {
        "s" | "st" | "sta" | "stag" | "stage" => {
            info!("Selected stage mode from argument '{}'", arg);
            Some(GameMode::Stage)
        }
        "t" | "ti" | "tim" | "time" | "timed" => {
            info!("Selected timed mode from argument '{}'", arg);
            Some(GameMode::Timed)
        }
        _ => None,
    }
}

pub fn parse_tier(value: &str) -> Option<Tier> {
    match value.trim() {
        "10" => Some(Tier::UpToTen),
        "20" => Some(Tier::UpToTwenty),
        _ => None,
    }
}

/// Builds launch options from command-line arguments (program name excluded).
/// Anything unrecognised is logged and ignored.
pub fn parse_args<I, A>(args: I) -> LaunchOptions
where
    I: IntoIterator<Item = A>,
    A: AsRef<str>,
{
    let mut mode = GameMode::Stage;
    let mut tier = Tier::default();
    let mut data_dir = PathBuf::from(DEFAULT_DATA_DIR);

    for arg in args {
        let arg = arg.as_ref();
        if let Some(value) = arg.strip_prefix("--tier=") {
            match parse_tier(value) {
                Some(t) => tier = t,
                None => warn!("Invalid tier '{}', keeping {}", value, tier.max()),
            }
        } else if let Some(value) = arg.strip_prefix("--data-dir=") {
            data_dir = PathBuf::from(value);
        } else {
            match parse_game_mode(arg) {
                Some(m) => mode = m,
                None => warn!("Unrecognised argument '{}'", arg),
            }
        }
    }

    LaunchOptions {
        engine: EngineConfig::for_mode(mode).with_tier(tier),
        data_dir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_game_mode_prefixes() {
        assert_eq!(parse_game_mode("t"), Some(GameMode::Timed));
        assert_eq!(parse_game_mode("--TIMED"), Some(GameMode::Timed));
        assert_eq!(parse_game_mode("stage"), Some(GameMode::Stage));
        assert_eq!(parse_game_mode("x"), None);
    }

    #[test]
    fn test_parse_args_defaults() {
        let options = parse_args(Vec::<String>::new());
        assert_eq!(options, LaunchOptions::default());
        assert_eq!(options.engine.correct_delay_ms, STAGE_CORRECT_DELAY_MS);
    }

    #[test]
    fn test_parse_args_full() {
        let options = parse_args(["timed", "--tier=20", "--data-dir=/tmp/mm"]);
        assert_eq!(options.engine.mode, GameMode::Timed);
        assert_eq!(options.engine.tier, Tier::UpToTwenty);
        assert_eq!(options.engine.correct_delay_ms, TIMED_CORRECT_DELAY_MS);
        assert_eq!(options.engine.incorrect_delay_ms, TIMED_INCORRECT_DELAY_MS);
        assert_eq!(options.data_dir, PathBuf::from("/tmp/mm"));
    }

    #[test]
    fn test_parse_args_bad_tier_ignored() {
        let options = parse_args(["--tier=15"]);
        assert_eq!(options.engine.tier, Tier::UpToTen);
    }
}
