use chrono::{NaiveDate, Utc};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of time for the engine: a monotonic millisecond counter for
/// feedback windows and run timing, plus the calendar day for cleared dates.
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Hand-driven clock. Clones share the same time, so a test can keep one
/// handle while the engine owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
    today: Rc<Cell<NaiveDate>>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(0)),
            today: Rc::new(Cell::new(today)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    pub fn set_today(&self, today: NaiveDate) {
        self.today.set(today);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn today(&self) -> NaiveDate {
        self.today.get()
    }
}
