use crate::{ClipEvent, StateRef};

/// Upper bound on loops scanned for one tick; only reachable with extreme speeds.
const MAX_LOOPS_PER_TICK: i64 = 16;

/// A clip-authored marker crossed during a tick.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct AnimationEvent {
    pub layer: usize,
    pub state: StateRef,
    pub clip: usize,
    pub name: String,
    /// Normalized time of the marker within its clip.
    pub time: f32,
    pub int_value: i32,
    pub float_value: f32,
    pub string: String,
}

impl AnimationEvent {
    pub(crate) fn new(layer: usize, state: StateRef, clip: usize, event: &ClipEvent) -> Self {
        Self {
            layer,
            state,
            clip,
            name: event.name.clone(),
            time: event.time,
            int_value: event.int_value,
            float_value: event.float_value,
            string: event.string.clone(),
        }
    }
}

/// Calls `emit` for every marker in `events` crossed while accumulated normalized time moved from
/// `last_time` to `time`.
///
/// The window is `(last_time, time]`, or `[last_time, time]` right after a state starts so a
/// marker sitting exactly on the start time fires once. Looping playback reports a marker once
/// per loop it is crossed in.
pub(crate) fn collect_events(
    events: &[ClipEvent],
    last_time: f32,
    time: f32,
    looped: bool,
    include_start: bool,
    mut emit: impl FnMut(&ClipEvent),
) {
    if events.is_empty() || time.is_nan() || last_time.is_nan() || time < last_time {
        return;
    }

    let in_window = |t: f32| {
        let after_start = if include_start {
            t >= last_time
        } else {
            t > last_time
        };
        after_start && t <= time
    };

    if !looped {
        for event in events {
            let t = event.time.clamp(0.0, 1.0);
            if in_window(t) {
                emit(event);
            }
        }
        return;
    }

    let first_loop = last_time.floor() as i64;
    let last_loop = (time.floor() as i64).min(first_loop + MAX_LOOPS_PER_TICK);
    for cycle in first_loop..=last_loop {
        for event in events {
            // Markers are authored in [0, 1]; 1.0 coincides with the next loop's start.
            let local = event.time.clamp(0.0, 1.0);
            if in_window(cycle as f32 + local) {
                emit(event);
            }
        }
    }
}

#[cfg(test)]
pub(super) fn collect_events_for_tests(
    events: &[ClipEvent],
    last_time: f32,
    time: f32,
    looped: bool,
    include_start: bool,
) -> Vec<String> {
    let mut out = Vec::new();
    collect_events(events, last_time, time, looped, include_start, |e| {
        out.push(e.name.clone())
    });
    out
}
