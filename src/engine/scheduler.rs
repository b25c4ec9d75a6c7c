use tracing::warn;

/*
Look-Ahead Scheduling
=====================

A timer that fires "every 125 ms" drifts: each callback is a little late and
the lateness accumulates. Instead, step times are computed on the AUDIO clock
and the timer only has to wake up often enough to stay ahead of them:

  now                    now + lookahead
   │◄────── window ──────►│
   ├──────┬──────┬──────┬─┼────┬──────→ audio time
        step n  n+1    n+2    n+3 (next tick)

Every tick schedules all steps whose start falls inside the window; the
audio engine then starts them sample-accurately. Step k starts exactly at
`origin + k · interval` (accumulated step by step, so tempo changes take
effect from the next unscheduled step), however irregular the ticks are.

If the control thread stalls for longer than a step, the steps it missed are
skipped rather than fired in a burst.
*/

pub const DEFAULT_LOOKAHEAD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledStep {
    pub index: usize,
    pub time: f64,
}

pub struct LookaheadScheduler {
    lookahead: f64,
    steps: usize,
    cursor: usize,
    next_time: f64,
    running: bool,
}

impl LookaheadScheduler {
    pub fn new(steps: usize, lookahead: f64) -> Self {
        Self {
            lookahead: lookahead.max(0.0),
            steps: steps.max(1),
            cursor: 0,
            next_time: 0.0,
            running: false,
        }
    }

    /// Begin with step `from` at time `at`.
    pub fn start(&mut self, at: f64, from: usize) {
        self.cursor = from % self.steps;
        self.next_time = at;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Index of the next step to be scheduled.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn next_time(&self) -> f64 {
        self.next_time
    }

    pub fn lookahead(&self) -> f64 {
        self.lookahead
    }

    /// Take the next step starting inside `[now, now + lookahead)`, if any.
    pub fn next_due(&mut self, now: f64, interval: f64) -> Option<ScheduledStep> {
        if !self.running || interval <= 0.0 {
            return None;
        }

        if self.next_time + interval <= now {
            let missed = ((now - self.next_time) / interval).floor() as usize;
            warn!(missed, "scheduler fell behind, skipping steps");
            self.cursor = (self.cursor + missed) % self.steps;
            self.next_time += missed as f64 * interval;
        }

        if self.next_time >= now + self.lookahead {
            return None;
        }

        let step = ScheduledStep {
            index: self.cursor,
            time: self.next_time.max(now),
        };
        self.cursor = (self.cursor + 1) % self.steps;
        self.next_time += interval;
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut LookaheadScheduler, now: f64, interval: f64) -> Vec<ScheduledStep> {
        std::iter::from_fn(|| scheduler.next_due(now, interval)).collect()
    }

    #[test]
    fn schedules_only_inside_window() {
        let mut scheduler = LookaheadScheduler::new(16, 0.1);
        scheduler.start(0.0, 0);

        let due = drain(&mut scheduler, 0.0, 0.04);
        let indices: Vec<usize> = due.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!((due[2].time - 0.08).abs() < 1e-12);

        assert!(drain(&mut scheduler, 0.01, 0.04).is_empty());
        assert_eq!(drain(&mut scheduler, 0.03, 0.04).len(), 1);
    }

    #[test]
    fn step_times_do_not_drift_with_irregular_ticks() {
        let mut scheduler = LookaheadScheduler::new(16, 0.1);
        scheduler.start(1.0, 0);

        let mut all = Vec::new();
        let mut now = 1.0;
        for jitter in [0.013, 0.029, 0.007, 0.041, 0.022].iter().cycle().take(100) {
            all.extend(drain(&mut scheduler, now, 0.125));
            now += jitter;
        }

        for (k, step) in all.iter().enumerate() {
            assert_eq!(step.index, k % 16);
            assert!((step.time - (1.0 + k as f64 * 0.125)).abs() < 1e-9);
        }
    }

    #[test]
    fn wraps_modulo_step_count() {
        let mut scheduler = LookaheadScheduler::new(16, 1.0);
        scheduler.start(0.0, 15);

        let due = drain(&mut scheduler, 0.0, 0.4);
        assert_eq!(due[0].index, 15);
        assert_eq!(due[1].index, 0);
    }

    #[test]
    fn stalled_ticks_skip_missed_steps() {
        let mut scheduler = LookaheadScheduler::new(16, 0.05);
        scheduler.start(0.0, 0);
        assert_eq!(drain(&mut scheduler, 0.0, 0.1).len(), 1);

        // Nothing ran for a full second
        let due = drain(&mut scheduler, 1.02, 0.1);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].index, 10);
    }

    #[test]
    fn stopped_scheduler_is_idle() {
        let mut scheduler = LookaheadScheduler::new(16, 0.1);
        assert!(scheduler.next_due(0.0, 0.1).is_none());

        scheduler.start(0.0, 3);
        scheduler.stop();
        assert!(scheduler.next_due(0.0, 0.1).is_none());
        assert_eq!(scheduler.cursor(), 3);
    }
}
