use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use crate::calendar::CalendarMonth;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::progression::CharacterStore;
use crate::question::QuestionGenerator;
use crate::scheduler::{Deferred, Scheduler};
use crate::storage::{KeyValueStore, Persistence};
use crate::types::*;

/// Per-stage (or per-run) counters. Replaced wholesale on every restart.
#[derive(Debug)]
struct Progress {
    status: GameStatus,
    question_number: u32,
    current: Option<Question>,
    upcoming: VecDeque<Question>,
    incorrect: Option<u32>,
    incorrect_seq: u64,
    started_ms: u64,
    stopped_ms: Option<u64>,
}

impl Progress {
    fn idle() -> Self {
        Self {
            status: GameStatus::Start,
            question_number: 1,
            current: None,
            upcoming: VecDeque::new(),
            incorrect: None,
            incorrect_seq: 0,
            started_ms: 0,
            stopped_ms: None,
        }
    }
}

/// The game-state and progression engine.
///
/// Front-ends issue commands (`submit_answer`, `start_next_stage`, `play_again`,
/// `apply_customization`), call [`GameEngine::update`] regularly so feedback
/// windows can expire, and read state back through the accessors.
pub struct GameEngine<S: KeyValueStore> {
    config: EngineConfig,
    generator: QuestionGenerator,
    rng: StdRng,
    clock: Box<dyn Clock>,
    persistence: Persistence<S>,
    scheduler: Scheduler,
    characters: CharacterStore,
    timings: TimingRecord,
    last_result: Option<RunResult>,
    progress: Progress,
}

impl<S: KeyValueStore> GameEngine<S> {
    pub fn new(config: EngineConfig, store: S, clock: Box<dyn Clock>, rng: StdRng) -> Self {
        let persistence = Persistence::new(store);

        let character = persistence.load_character().unwrap_or_else(|| {
            info!("No saved character, starting fresh");
            Character::default()
        });
        let timings = persistence.load_timings();

        let mut engine = Self {
            generator: QuestionGenerator::new(config.tier, config.addition_bias),
            config,
            rng,
            clock,
            persistence,
            scheduler: Scheduler::new(),
            characters: CharacterStore::new(character),
            timings,
            last_result: None,
            progress: Progress::idle(),
        };

        if engine.config.mode == GameMode::Stage {
            let resume_at = engine
                .persistence
                .load_question_progress(engine.config.questions_per_stage)
                .unwrap_or(1);
            engine.restart();
            engine.progress.question_number = resume_at;
            engine.persist_question_progress(resume_at);
            info!(question_number = resume_at, "Resuming stage");
        }

        info!(
            mode = ?engine.config.mode,
            stages_cleared = engine.characters.character().stages_cleared,
            best_time = ?engine.timings.best_time,
            "Engine initialized"
        );
        engine
    }

    /// Engine on the wall clock with an entropy-seeded generator.
    pub fn with_system_clock(config: EngineConfig, store: S) -> Self {
        Self::new(
            config,
            store,
            Box::new(SystemClock::new()),
            StdRng::from_entropy(),
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> GameMode {
        self.config.mode
    }

    pub fn status(&self) -> GameStatus {
        self.progress.status
    }

    pub fn question(&self) -> Option<&Question> {
        self.progress.current.as_ref()
    }

    pub fn choices(&self) -> Option<&[u32; 4]> {
        self.progress.current.as_ref().map(|q| &q.options)
    }

    /// 1-based position within the current stage or run.
    pub fn question_number(&self) -> u32 {
        self.progress.question_number
    }

    pub fn total_questions(&self) -> u32 {
        match self.config.mode {
            GameMode::Stage => self.config.questions_per_stage,
            GameMode::Timed => self.config.run_length as u32,
        }
    }

    /// Most recent wrong guess, while its highlight window is open.
    pub fn incorrect_guess(&self) -> Option<u32> {
        self.progress.incorrect
    }

    pub fn character(&self) -> &Character {
        self.characters.character()
    }

    pub fn characters(&self) -> &CharacterStore {
        &self.characters
    }

    pub fn timings(&self) -> TimingRecord {
        self.timings
    }

    pub fn last_result(&self) -> Option<RunResult> {
        self.last_result
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Milliseconds since the stage or run began; frozen once the last answer lands.
    pub fn elapsed_ms(&self) -> u64 {
        if self.progress.status == GameStatus::Start {
            return 0;
        }
        let end = self
            .progress
            .stopped_ms
            .unwrap_or_else(|| self.clock.now_ms());
        end.saturating_sub(self.progress.started_ms)
    }

    pub fn calendar_month(&self, year: i32, month: u32) -> Option<CalendarMonth> {
        CalendarMonth::build(
            year,
            month,
            &self.characters.character().cleared_dates,
            self.clock.today(),
        )
    }

    pub fn submit_answer(&mut self, value: u32) -> AnswerOutcome {
        self.update();

        if self.progress.status != GameStatus::Playing {
            debug!(value = value, status = ?self.progress.status, "Answer ignored");
            return AnswerOutcome::Ignored;
        }
        let Some(expected) = self.progress.current.as_ref().map(|q| q.answer) else {
            return AnswerOutcome::Ignored;
        };

        let now = self.clock.now_ms();

        if value == expected {
            self.progress.status = GameStatus::CorrectFeedback;
            self.progress.incorrect = None;
            if self.progress.question_number >= self.total_questions() {
                self.progress.stopped_ms = Some(now);
            }
            self.scheduler
                .schedule(now, self.config.correct_delay_ms, Deferred::AdvanceQuestion);

            info!(
                question_number = self.progress.question_number,
                answer = value,
                "Correct answer"
            );
            AnswerOutcome::Correct
        } else {
            self.progress.incorrect = Some(value);
            self.progress.incorrect_seq += 1;
            self.scheduler.schedule(
                now,
                self.config.incorrect_delay_ms,
                Deferred::ClearIncorrect(self.progress.incorrect_seq),
            );

            info!(
                question_number = self.progress.question_number,
                guess = value,
                expected = expected,
                "Incorrect answer"
            );
            AnswerOutcome::Incorrect
        }
    }

    /// Runs every deferred transition that has come due.
    pub fn update(&mut self) {
        let now = self.clock.now_ms();
        for task in self.scheduler.take_due(now) {
            match task {
                Deferred::AdvanceQuestion => self.advance(),
                Deferred::ClearIncorrect(seq) => {
                    if self.progress.incorrect_seq == seq {
                        self.progress.incorrect = None;
                    }
                }
            }
        }
    }

    fn advance(&mut self) {
        if self.progress.status != GameStatus::CorrectFeedback {
            warn!(status = ?self.progress.status, "Advance fired outside feedback");
            return;
        }

        if self.progress.question_number >= self.total_questions() {
            self.complete();
            return;
        }

        self.progress.question_number += 1;
        self.progress.current = Some(self.next_question());
        self.progress.status = GameStatus::Playing;

        if self.config.mode == GameMode::Stage {
            self.persist_question_progress(self.progress.question_number);
        }
        debug!(question_number = self.progress.question_number, "Next question");
    }

    fn next_question(&mut self) -> Question {
        match self.progress.upcoming.pop_front() {
            Some(q) => q,
            None => self.generator.generate(&mut self.rng),
        }
    }

    fn complete(&mut self) {
        match self.config.mode {
            GameMode::Stage => {
                let today = self.clock.today();
                self.characters.record_stage_cleared(today);
                self.persist_character();
                self.persist_question_progress(1);
                self.progress.status = GameStatus::StageCleared;
            }
            GameMode::Timed => {
                let duration = self.elapsed_ms();
                let result = self.timings.record_run(duration);
                if let Err(e) = self.persistence.save_timings(&self.timings) {
                    error!(error = %e, "Failed to save timings");
                }
                self.last_result = Some(result);
                self.progress.status = GameStatus::Finished;

                info!(
                    duration_ms = duration,
                    best_time = ?result.best_time,
                    new_best = result.is_new_best,
                    "Run finished"
                );
            }
        }
    }

    /// Leaves `StageCleared` for a fresh stage. Ignored in any other status.
    pub fn start_next_stage(&mut self) -> bool {
        self.update();
        if self.config.mode != GameMode::Stage || self.progress.status != GameStatus::StageCleared {
            warn!(status = ?self.progress.status, "start_next_stage ignored");
            return false;
        }
        self.restart();
        true
    }

    /// Begins a timed run from `Start` or `Finished`. Ignored otherwise.
    pub fn play_again(&mut self) -> bool {
        self.update();
        let ready = matches!(self.progress.status, GameStatus::Start | GameStatus::Finished);
        if self.config.mode != GameMode::Timed || !ready {
            warn!(status = ?self.progress.status, "play_again ignored");
            return false;
        }
        self.restart();
        true
    }

    /// Unconditionally begins a new stage or run, abandoning the current one.
    /// Pending feedback timers from before the restart never fire.
    pub fn restart(&mut self) {
        self.scheduler.advance_epoch();

        let mut progress = Progress::idle();
        progress.status = GameStatus::Playing;
        progress.started_ms = self.clock.now_ms();

        if self.config.mode == GameMode::Timed {
            progress.upcoming = self
                .generator
                .generate_set(self.config.run_length, &mut self.rng)
                .into();
            self.last_result = None;
        }
        self.progress = progress;
        self.progress.current = Some(self.next_question());

        if self.config.mode == GameMode::Stage {
            self.persist_question_progress(1);
        }
        info!(mode = ?self.config.mode, epoch = self.scheduler.epoch(), "Started");
    }

    pub fn apply_customization(&mut self, customization: Customization) {
        self.characters.apply_customization(customization);
        self.persist_character();
    }

    fn persist_character(&mut self) {
        if let Err(e) = self.persistence.save_character(self.characters.character()) {
            error!(error = %e, "Failed to save character");
        }
    }

    fn persist_question_progress(&mut self, index: u32) {
        if let Err(e) = self.persistence.save_question_progress(index) {
            error!(error = %e, "Failed to save question progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{MemoryStore, QUESTION_PROGRESS_KEY};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn engine(mode: GameMode, store: MemoryStore) -> (GameEngine<MemoryStore>, ManualClock) {
        let clock = ManualClock::new(today());
        let engine = GameEngine::new(
            EngineConfig::for_mode(mode),
            store,
            Box::new(clock.clone()),
            StdRng::seed_from_u64(42),
        );
        (engine, clock)
    }

    fn wrong_choice(engine: &GameEngine<MemoryStore>) -> u32 {
        let q = engine.question().unwrap();
        *q.options.iter().find(|o| **o != q.answer).unwrap()
    }

    #[test]
    fn test_stage_starts_playing() {
        let (engine, _) = engine(GameMode::Stage, MemoryStore::new());
        assert_eq!(engine.status(), GameStatus::Playing);
        assert_eq!(engine.question_number(), 1);
        assert!(engine.question().is_some());
        assert_eq!(engine.total_questions(), 20);
    }

    #[test]
    fn test_timed_starts_idle() {
        let (engine, _) = engine(GameMode::Timed, MemoryStore::new());
        assert_eq!(engine.status(), GameStatus::Start);
        assert!(engine.question().is_none());
        assert_eq!(engine.elapsed_ms(), 0);
    }

    #[test]
    fn test_correct_answer_waits_for_feedback_window() {
        let (mut engine, clock) = engine(GameMode::Stage, MemoryStore::new());
        let answer = engine.question().unwrap().answer;

        assert_eq!(engine.submit_answer(answer), AnswerOutcome::Correct);
        assert_eq!(engine.status(), GameStatus::CorrectFeedback);

        // Repeating the confirmed answer during feedback does nothing
        assert_eq!(engine.submit_answer(answer), AnswerOutcome::Ignored);

        clock.advance(999);
        engine.update();
        assert_eq!(engine.question_number(), 1);

        clock.advance(1);
        engine.update();
        assert_eq!(engine.status(), GameStatus::Playing);
        assert_eq!(engine.question_number(), 2);
    }

    #[test]
    fn test_incorrect_guess_clears_after_delay() {
        let (mut engine, clock) = engine(GameMode::Stage, MemoryStore::new());
        let wrong = wrong_choice(&engine);

        assert_eq!(engine.submit_answer(wrong), AnswerOutcome::Incorrect);
        assert_eq!(engine.incorrect_guess(), Some(wrong));
        assert_eq!(engine.status(), GameStatus::Playing);

        clock.advance(500);
        engine.update();
        assert_eq!(engine.incorrect_guess(), None);
        assert_eq!(engine.question_number(), 1);
    }

    #[test]
    fn test_second_guess_keeps_its_own_window() {
        let (mut engine, clock) = engine(GameMode::Stage, MemoryStore::new());
        let wrong = wrong_choice(&engine);

        engine.submit_answer(wrong);
        clock.advance(400);
        engine.submit_answer(wrong);
        clock.advance(100);
        engine.update();
        // First window expired, second still open
        assert_eq!(engine.incorrect_guess(), Some(wrong));
        clock.advance(400);
        engine.update();
        assert_eq!(engine.incorrect_guess(), None);
    }

    #[test]
    fn test_value_outside_options_is_incorrect() {
        let (mut engine, _) = engine(GameMode::Stage, MemoryStore::new());
        assert_eq!(engine.submit_answer(999), AnswerOutcome::Incorrect);
    }

    #[test]
    fn test_restart_suppresses_pending_advance() {
        let (mut engine, clock) = engine(GameMode::Stage, MemoryStore::new());
        let answer = engine.question().unwrap().answer;
        engine.submit_answer(answer);

        engine.restart();
        clock.advance(5000);
        engine.update();

        assert_eq!(engine.status(), GameStatus::Playing);
        assert_eq!(engine.question_number(), 1);
    }

    #[test]
    fn test_resume_question_progress() {
        let store = MemoryStore::new().with_entry(QUESTION_PROGRESS_KEY, "12");
        let (engine, _) = engine(GameMode::Stage, store);
        assert_eq!(engine.question_number(), 12);
    }

    #[test]
    fn test_commands_rejected_in_wrong_mode_or_status() {
        let (mut stage, _) = engine(GameMode::Stage, MemoryStore::new());
        assert!(!stage.start_next_stage());
        assert!(!stage.play_again());

        let (mut timed, _) = engine(GameMode::Timed, MemoryStore::new());
        assert!(!timed.start_next_stage());
        assert!(timed.play_again());
        assert!(!timed.play_again());
    }

    #[test]
    fn test_customization_persists() {
        let (mut engine, _) = engine(GameMode::Stage, MemoryStore::new());
        engine.apply_customization(Customization::accessory("Scarf"));
        assert_eq!(engine.character().accessory, "Scarf");
        let saved = engine.persistence().load_character().unwrap();
        assert_eq!(saved.accessory, "Scarf");
    }
}
