use crate::graph::node::RenderCtx;

/*
Parameter Automation
====================

Every continuously variable control in a voice (gain, cutoff, oscillator
frequency, LFO rate) is an `AutomationParam`: a base value plus a time-ordered
list of scheduled events. The control thread schedules events against the audio
clock; the render path evaluates the timeline once per sample. Nothing ever
waits - an envelope is just a handful of events placed in the future.

Vocabulary
----------

  event         One scheduled change: jump, linear ramp, exponential ramp,
                or exponential approach toward a target.

  event time    The time an event is keyed on. For jumps and target approaches
                it's the moment they start; for ramps it's the moment they END.

  anchor        The (time, value) pair a ramp starts from: the end of the
                previous event, or the base value when nothing precedes it.

  time constant How quickly a target approach converges. After one time
                constant the value has covered ~63% of the distance.


Event Shapes
------------

  SetValue(v, t)          value jumps to v at t

  LinearRamp(v, t1)       from anchor (t0, v0):
                            v(t) = v0 + (v - v0) * (t - t0) / (t1 - t0)

  ExponentialRamp(v, t1)  from anchor (t0, v0):
                            v(t) = v0 * (v / v0) ^ ((t - t0) / (t1 - t0))
                          undefined through zero, so a zero anchor or a sign
                          change holds v0 until t1. Targets are clamped to
                          EXP_FLOOR instead of rejected.

  SetTarget(v, t, tau)    from the value reached at t:
                            v(x) = v + (from - v) * e^(-(x - t) / tau)
                          never completes; a later event takes over.


Cancellation
------------

Releasing a note must not fight the decay ramp still scheduled from note-on.
`cancel_and_hold_at_time` evaluates the timeline at the cancel time, drops every
event keyed at or after it, and pins the evaluated value there. A release ramp
scheduled afterwards starts exactly where the sound was.


Pruning
-------

Long-lived voices accumulate smoothing events from parameter edits. `prune`
folds every event that completed before a given time into the base value so
evaluation stays cheap.
*/

/// Smallest magnitude an exponential ramp may target.
pub const EXP_FLOOR: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    SetValue {
        value: f32,
        time: f64,
    },
    LinearRamp {
        value: f32,
        end_time: f64,
    },
    ExponentialRamp {
        value: f32,
        end_time: f64,
    },
    SetTarget {
        target: f32,
        start_time: f64,
        time_constant: f64,
    },
}

impl ParamEvent {
    /// The time this event is ordered by.
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. } => time,
            ParamEvent::LinearRamp { end_time, .. } => end_time,
            ParamEvent::ExponentialRamp { end_time, .. } => end_time,
            ParamEvent::SetTarget { start_time, .. } => start_time,
        }
    }
}

/// What the parameter is doing between events.
#[derive(Debug, Clone, Copy)]
enum Segment {
    Hold(f32),
    Approach {
        start: f64,
        from: f32,
        target: f32,
        time_constant: f64,
    },
}

impl Segment {
    fn eval(&self, t: f64) -> f32 {
        match *self {
            Segment::Hold(value) => value,
            Segment::Approach {
                start,
                from,
                target,
                time_constant,
            } => {
                if t <= start {
                    return from;
                }
                let decay = (-(t - start) / time_constant).exp() as f32;
                target + (from - target) * decay
            }
        }
    }
}

pub struct AutomationParam {
    value: f32,       // value before the first event
    anchor_time: f64, // time the base value was established
    min: f32,
    max: f32,
    events: Vec<ParamEvent>,
}

impl AutomationParam {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            anchor_time: 0.0,
            min: f32::MIN,
            max: f32::MAX,
            events: Vec::with_capacity(8),
        }
    }

    /// Clamp every evaluated value into `[min, max]`.
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn events(&self) -> &[ParamEvent] {
        &self.events
    }

    /// Insert keeping time order; equal times keep insertion order.
    fn insert(&mut self, event: ParamEvent) {
        let time = event.time();
        let index = self.events.partition_point(|e| e.time() <= time);
        self.events.insert(index, event);
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(ParamEvent::SetValue { value, time });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.insert(ParamEvent::LinearRamp { value, end_time });
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        let value = if value.abs() < EXP_FLOOR {
            EXP_FLOOR.copysign(if value == 0.0 { 1.0 } else { value })
        } else {
            value
        };
        self.insert(ParamEvent::ExponentialRamp { value, end_time });
    }

    pub fn set_target_at_time(&mut self, target: f32, start_time: f64, time_constant: f64) {
        if time_constant <= 0.0 {
            self.set_value_at_time(target, start_time);
            return;
        }
        self.insert(ParamEvent::SetTarget {
            target,
            start_time,
            time_constant,
        });
    }

    /// Drop every event keyed at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        let keep = self.events.partition_point(|e| e.time() < time);
        self.events.truncate(keep);
    }

    /// Freeze the parameter at whatever value it has at `time` and drop
    /// everything scheduled from then on.
    pub fn cancel_and_hold_at_time(&mut self, time: f64) {
        let held = self.value_at(time);
        self.cancel_scheduled_values(time);
        self.set_value_at_time(held, time);
    }

    /// Evaluate the timeline at `t` seconds.
    pub fn value_at(&self, t: f64) -> f32 {
        self.evaluate(&self.events, t).clamp(self.min, self.max)
    }

    fn evaluate(&self, events: &[ParamEvent], t: f64) -> f32 {
        let mut segment = Segment::Hold(self.value);
        let mut anchor_time = self.anchor_time;

        for event in events {
            match *event {
                ParamEvent::SetValue { value, time } => {
                    if t < time {
                        return segment.eval(t);
                    }
                    segment = Segment::Hold(value);
                    anchor_time = time;
                }
                ParamEvent::LinearRamp { value, end_time } => {
                    if t < end_time {
                        let start = segment.eval(anchor_time);
                        if t <= anchor_time || end_time <= anchor_time {
                            return segment.eval(t);
                        }
                        let progress = ((t - anchor_time) / (end_time - anchor_time)) as f32;
                        return start + (value - start) * progress;
                    }
                    segment = Segment::Hold(value);
                    anchor_time = end_time;
                }
                ParamEvent::ExponentialRamp { value, end_time } => {
                    if t < end_time {
                        let start = segment.eval(anchor_time);
                        if t <= anchor_time || end_time <= anchor_time {
                            return segment.eval(t);
                        }
                        if start == 0.0 || start.signum() != value.signum() {
                            return start;
                        }
                        let progress = (t - anchor_time) / (end_time - anchor_time);
                        return start * (value / start).powf(progress as f32);
                    }
                    segment = Segment::Hold(value);
                    anchor_time = end_time;
                }
                ParamEvent::SetTarget {
                    target,
                    start_time,
                    time_constant,
                } => {
                    if t < start_time {
                        return segment.eval(t);
                    }
                    let from = segment.eval(start_time);
                    segment = Segment::Approach {
                        start: start_time,
                        from,
                        target,
                        time_constant,
                    };
                    anchor_time = start_time;
                }
            }
        }

        segment.eval(t)
    }

    /// Fold events that finished before `before` into the base value.
    pub fn prune(&mut self, before: f64) {
        let completed = self.events.partition_point(|e| e.time() <= before);
        if completed == 0 {
            return;
        }

        let last = self.events[completed - 1];
        match last {
            ParamEvent::SetTarget { start_time, .. } => {
                // An approach is still in progress; keep it, but start it from
                // the value it would have inherited.
                let from = self.evaluate(&self.events[..completed - 1], start_time);
                self.value = from;
                self.anchor_time = start_time;
                self.events.drain(..completed - 1);
            }
            ParamEvent::SetValue { value, time }
            | ParamEvent::LinearRamp {
                value,
                end_time: time,
            }
            | ParamEvent::ExponentialRamp {
                value,
                end_time: time,
            } => {
                self.value = value;
                self.anchor_time = time;
                self.events.drain(..completed);
            }
        }
    }

    /// Render one value per sample starting at `ctx.time`.
    pub fn render(&self, out: &mut [f32], ctx: &RenderCtx) {
        if self.events.is_empty() {
            out.fill(self.value.clamp(self.min, self.max));
            return;
        }
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.value_at(ctx.sample_time(i));
        }
    }
}
