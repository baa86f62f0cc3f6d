use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::options::{DEFAULT_ACCESSORY, DEFAULT_COLOR, DEFAULT_HAT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
}

impl Operator {
    pub fn apply(self, lhs: u32, rhs: u32) -> Option<u32> {
        match self {
            Operator::Add => lhs.checked_add(rhs),
            Operator::Subtract => lhs.checked_sub(rhs),
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One arithmetic problem. Built once by the generator and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub num1: u32,
    pub num2: u32,
    pub operator: Operator,
    pub answer: u32,
    pub options: [u32; 4],
}

impl Question {
    pub fn text(&self) -> String {
        format!("{} {} {} = ?", self.num1, self.operator, self.num2)
    }

    pub fn is_correct(&self, value: u32) -> bool {
        value == self.answer
    }
}

/// Upper bound on every answer and every displayed option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tier {
    #[default]
    UpToTen,
    UpToTwenty,
}

impl Tier {
    pub fn max(self) -> u32 {
        match self {
            Tier::UpToTen => 10,
            Tier::UpToTwenty => 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    #[default]
    Stage, // 20 questions per stage, unlocks cosmetics
    Timed, // fixed-length run against the clock
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Start,           // timed mode only, waiting for the first run
    Playing,         // accepting answers
    CorrectFeedback, // answer confirmed, next question pending
    StageCleared,
    Finished,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::StageCleared | GameStatus::Finished)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    Ignored, // not accepting answers right now
}

/// Durable player profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub stages_cleared: u32,
    pub cleared_dates: BTreeSet<NaiveDate>,
    pub color: String,
    pub hat: String,
    pub accessory: String,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            stages_cleared: 0,
            cleared_dates: BTreeSet::new(),
            color: DEFAULT_COLOR.to_string(),
            hat: DEFAULT_HAT.to_string(),
            accessory: DEFAULT_ACCESSORY.to_string(),
        }
    }
}

/// Partial cosmetic update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customization {
    pub color: Option<String>,
    pub hat: Option<String>,
    pub accessory: Option<String>,
}

impl Customization {
    pub fn color(value: impl Into<String>) -> Self {
        Self { color: Some(value.into()), ..Self::default() }
    }

    pub fn hat(value: impl Into<String>) -> Self {
        Self { hat: Some(value.into()), ..Self::default() }
    }

    pub fn accessory(value: impl Into<String>) -> Self {
        Self { accessory: Some(value.into()), ..Self::default() }
    }
}

/// Best and previous run durations in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingRecord {
    pub best_time: Option<u64>,
    pub previous_time: Option<u64>,
}

impl TimingRecord {
    /// Folds a finished run into the record and reports what the results screen shows.
    pub fn record_run(&mut self, duration_ms: u64) -> RunResult {
        let prior_previous = self.previous_time;
        let is_new_best = match self.best_time {
            Some(best) => duration_ms < best,
            None => true,
        };
        if is_new_best {
            self.best_time = Some(duration_ms);
        }
        self.previous_time = Some(duration_ms);

        RunResult {
            current_time: duration_ms,
            previous_time: prior_previous,
            best_time: self.best_time,
            is_new_best,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    pub current_time: u64,
    pub previous_time: Option<u64>,
    pub best_time: Option<u64>,
    pub is_new_best: bool,
}

/// Formats milliseconds as `m:ss.cc`.
pub fn format_time(ms: Option<u64>) -> String {
    match ms {
        None => "-:--.--".to_string(),
        Some(ms) => {
            let minutes = ms / 60_000;
            let seconds = (ms % 60_000) / 1000;
            let centis = (ms % 1000) / 10;
            format!("{}:{:02}.{:02}", minutes, seconds, centis)
        }
    }
}
