use crate::types::ParticipantId;

/// Identifies a scheduled timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Work the orchestrator knows how to run
#[derive(Clone, Debug, PartialEq)]
pub enum Task {
    ExpirySweep,
    MatchmakingSweep,
    Countdown { match_id: u64 },
    ClearEffects { participants: Vec<ParticipantId> },
    Celebration { winner: ParticipantId, bursts_left: u32 },
    Rejoin { participant: ParticipantId },
}

#[derive(Debug)]
struct Timer {
    handle: TimerHandle,
    due: u64,
    period: Option<u64>,
    task: Task,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    timers: Vec<Timer>,
    next_handle: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, due: u64, period: Option<u64>, task: Task) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.timers.push(Timer {
            handle,
            due,
            period,
            task,
        });
        handle
    }

    /// Run `task` once, `delay` ticks after `now`
    pub fn schedule_once(&mut self, now: u64, delay: u64, task: Task) -> TimerHandle {
        self.push(now + delay.max(1), None, task)
    }

    /// Run `task` every `period` ticks, first run one period after `now`
    pub fn schedule_repeating(&mut self, now: u64, period: u64, task: Task) -> TimerHandle {
        let period = period.max(1);
        self.push(now + period, Some(period), task)
    }

    /// Cancelling a fired or unknown handle does nothing
    pub fn cancel(&mut self, handle: TimerHandle) {
        self.timers.retain(|t| t.handle != handle);
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Collect tasks due at `now` in registration order.
    /// One-shot timers are dropped, repeating ones re-armed.
    pub fn advance(&mut self, now: u64) -> Vec<(TimerHandle, Task)> {
        let mut due = Vec::new();
        self.timers.retain_mut(|timer| {
            if timer.due > now {
                return true;
            }
            due.push((timer.handle, timer.task.clone()));
            match timer.period {
                Some(period) => {
                    timer.due = now + period;
                    true
                }
                None => false,
            }
        });
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeating_fires_every_period_in_registration_order() {
        let mut sched = Scheduler::new();
        sched.schedule_repeating(0, 20, Task::ExpirySweep);
        sched.schedule_repeating(0, 20, Task::MatchmakingSweep);

        for now in 1..20 {
            assert!(sched.advance(now).is_empty());
        }
        let fired: Vec<Task> = sched.advance(20).into_iter().map(|(_, t)| t).collect();
        assert_eq!(fired, vec![Task::ExpirySweep, Task::MatchmakingSweep]);
        assert!(sched.advance(39).is_empty());
        assert_eq!(sched.advance(40).len(), 2);
    }

    #[test]
    fn test_once_fires_once() {
        let mut sched = Scheduler::new();
        sched.schedule_once(5, 1, Task::Countdown { match_id: 3 });
        assert_eq!(sched.advance(6).len(), 1);
        assert!(sched.advance(7).is_empty());
    }

    #[test]
    fn test_cancel_twice_is_noop() {
        let mut sched = Scheduler::new();
        let h = sched.schedule_repeating(0, 20, Task::Countdown { match_id: 1 });
        sched.cancel(h);
        sched.cancel(h);
        assert!(sched.is_empty());
        assert!(sched.advance(20).is_empty());
    }
}
