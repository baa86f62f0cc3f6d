use tracing::debug;

/// Deferred state transitions the engine schedules for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// End of the correct-answer feedback window.
    AdvanceQuestion,
    /// End of the incorrect-guess highlight for the guess with this sequence number.
    ClearIncorrect(u64),
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due_ms: u64,
    epoch: u64,
    task: Deferred,
}

/// Cooperative timer queue. Every task is tagged with the epoch current when
/// it was scheduled; advancing the epoch invalidates everything still pending.
#[derive(Debug, Default)]
pub struct Scheduler {
    epoch: u64,
    pending: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, task: Deferred) {
        self.pending.push(Scheduled {
            due_ms: now_ms.saturating_add(delay_ms),
            epoch: self.epoch,
            task,
        });
    }

    /// Starts a new epoch. Tasks scheduled before this call never fire.
    pub fn advance_epoch(&mut self) {
        self.epoch += 1;
        let dropped = self.pending.len();
        self.pending.clear();
        if dropped > 0 {
            debug!(epoch = self.epoch, dropped = dropped, "Discarded stale timers");
        }
    }

    /// Removes and returns the tasks due at `now_ms`, earliest first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<Deferred> {
        let epoch = self.epoch;
        let mut due: Vec<Scheduled> = Vec::new();
        self.pending.retain(|s| {
            if s.due_ms <= now_ms {
                if s.epoch == epoch {
                    due.push(*s);
                }
                false
            } else {
                true
            }
        });
        due.sort_by_key(|s| s.due_ms);
        due.into_iter().map(|s| s.task).collect()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.iter().any(|s| s.epoch == self.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_fire_when_due() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0, 1000, Deferred::AdvanceQuestion);
        scheduler.schedule(0, 500, Deferred::ClearIncorrect(1));

        assert!(scheduler.take_due(499).is_empty());
        assert_eq!(scheduler.take_due(500), vec![Deferred::ClearIncorrect(1)]);
        assert!(scheduler.has_pending());
        assert_eq!(scheduler.take_due(5000), vec![Deferred::AdvanceQuestion]);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_due_tasks_ordered() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0, 800, Deferred::AdvanceQuestion);
        scheduler.schedule(0, 300, Deferred::ClearIncorrect(2));
        assert_eq!(
            scheduler.take_due(1000),
            vec![Deferred::ClearIncorrect(2), Deferred::AdvanceQuestion]
        );
    }

    #[test]
    fn test_new_epoch_suppresses_stale_tasks() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0, 1000, Deferred::AdvanceQuestion);
        scheduler.advance_epoch();

        assert_eq!(scheduler.epoch(), 1);
        assert!(!scheduler.has_pending());
        assert!(scheduler.take_due(10_000).is_empty());

        scheduler.schedule(10_000, 10, Deferred::AdvanceQuestion);
        assert_eq!(scheduler.take_due(10_010), vec![Deferred::AdvanceQuestion]);
    }
}
