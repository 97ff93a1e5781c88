//! Periodic tick counters.
//!
//! The backend drives each running timer from its own execution context.
//! The count is the only state shared with that context and is always read
//! and written under the timer's mutex.

use crate::backend::TimerId;
use crate::context::with_context;
use crate::events::EventSource;
use crate::handle::Arena;
use log::{debug, trace, warn};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

handle!(Timer);

/// Counter shared between a timer and the backend callback that advances it.
#[derive(Debug)]
pub struct TimerTicks {
    count: Mutex<i64>,
    interval_ms: AtomicU32,
}

impl TimerTicks {
    pub fn new(interval_ms: u32) -> TimerTicks {
        TimerTicks {
            count: Mutex::new(0),
            interval_ms: AtomicU32::new(interval_ms),
        }
    }

    fn counter(&self) -> MutexGuard<'_, i64> {
        // A panicking tick cannot leave the count half-written.
        match self.count.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Advances the count by one and returns the delay until the next tick.
    pub fn tick(&self) -> u32 {
        let mut count = self.counter();
        *count += 1;
        trace!("Timer tick {}", *count);
        self.interval_ms()
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms.load(Ordering::SeqCst)
    }

    fn set_interval_ms(&self, interval_ms: u32) {
        self.interval_ms.store(interval_ms, Ordering::SeqCst)
    }

    pub fn count(&self) -> i64 {
        *self.counter()
    }

    fn set_count(&self, count: i64) {
        *self.counter() = count;
    }

    fn add_count(&self, diff: i64) {
        *self.counter() += diff;
    }
}

/// One backend registration of a timer's counter. Stopping a timer cancels
/// its registration; starting it again registers the same counter anew, so a
/// late callback from the old registration never ticks the new one.
#[derive(Debug)]
pub struct TimerRegistration {
    ticks: Arc<TimerTicks>,
    cancelled: AtomicBool,
}

impl TimerRegistration {
    pub fn new(ticks: Arc<TimerTicks>) -> TimerRegistration {
        TimerRegistration {
            ticks,
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.ticks.interval_ms()
    }

    /// Ticks the counter and returns the next delay, or `None` once cancelled.
    pub fn tick(&self) -> Option<u32> {
        if self.is_cancelled() {
            None
        } else {
            Some(self.ticks.tick())
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

fn interval_ms(speed_secs: f64) -> u32 {
    ((speed_secs * 1000.0) as u32).max(1)
}

pub struct TimerData {
    speed: f64,
    ticks: Arc<TimerTicks>,
    native: Option<TimerId>,
    event_source: EventSource,
}

impl TimerData {
    fn started(&self) -> bool {
        self.native.is_some()
    }
}

#[derive(Default)]
pub struct TimerContext {
    pub installed: bool,
    pub timers: Arena<TimerData>,
}

pub fn al_install_timer() -> bool {
    with_context(|ctx| {
        if ctx.timer.installed {
            return true;
        }
        let backend = match ctx.backend.as_mut() {
            Some(backend) => backend,
            None => return false,
        };
        match backend.init_timers() {
            Ok(()) => {
                ctx.timer.installed = true;
                true
            }
            Err(err) => {
                warn!("Could not initialise timers: {}", err);
                false
            }
        }
    })
}

/// Stops and destroys every timer.
pub fn al_uninstall_timer() {
    with_context(|ctx| {
        if !ctx.timer.installed {
            return;
        }
        let keys = ctx.timer.timers.keys();
        for key in keys {
            if let Some(data) = ctx.timer.timers.remove(key) {
                if let (Some(native), Some(backend)) = (data.native, ctx.backend.as_mut()) {
                    backend.remove_timer(native);
                }
            }
        }
        ctx.timer.installed = false;
        debug!("Timers uninstalled");
    })
}

pub fn al_is_timer_installed() -> bool {
    with_context(|ctx| ctx.timer.installed)
}

pub fn al_create_timer(speed_secs: f64) -> Option<Timer> {
    if speed_secs <= 0.0 {
        return None;
    }
    with_context(|ctx| {
        let key = ctx.timer.timers.insert(TimerData {
            speed: speed_secs,
            ticks: Arc::new(TimerTicks::new(interval_ms(speed_secs))),
            native: None,
            event_source: EventSource::default(),
        });
        debug!("Created timer with a {}s period", speed_secs);
        Some(Timer(key))
    })
}

pub fn al_destroy_timer(timer: Option<Timer>) {
    with_context(|ctx| {
        let data = match timer.and_then(|t| ctx.timer.timers.remove(t.0)) {
            Some(data) => data,
            None => return,
        };
        if let (Some(native), Some(backend)) = (data.native, ctx.backend.as_mut()) {
            backend.remove_timer(native);
        }
    })
}

pub fn al_start_timer(timer: Option<Timer>) {
    with_context(|ctx| {
        let data = match timer.and_then(|t| ctx.timer.timers.get_mut(t.0)) {
            Some(data) if !data.started() => data,
            _ => return,
        };
        let backend = match ctx.backend.as_mut() {
            Some(backend) => backend,
            None => return,
        };
        data.ticks.set_interval_ms(interval_ms(data.speed));
        match backend.add_timer(Arc::clone(&data.ticks)) {
            Ok(native) => data.native = Some(native),
            Err(err) => warn!("Could not start timer: {}", err),
        }
    })
}

pub fn al_stop_timer(timer: Option<Timer>) {
    with_context(|ctx| {
        let data = match timer.and_then(|t| ctx.timer.timers.get_mut(t.0)) {
            Some(data) => data,
            None => return,
        };
        if let Some(native) = data.native.take() {
            if let Some(backend) = ctx.backend.as_mut() {
                backend.remove_timer(native);
            }
        }
    })
}

/// Starts a stopped timer, keeping its count.
pub fn al_resume_timer(timer: Option<Timer>) {
    al_start_timer(timer)
}

pub fn al_get_timer_started(timer: Option<Timer>) -> bool {
    with_context(|ctx| {
        timer
            .and_then(|t| ctx.timer.timers.get(t.0))
            .map_or(false, TimerData::started)
    })
}

pub fn al_get_timer_speed(timer: Option<Timer>) -> f64 {
    with_context(|ctx| timer.and_then(|t| ctx.timer.timers.get(t.0)).map_or(0.0, |d| d.speed))
}

/// A running timer is stopped and restarted with the new period.
pub fn al_set_timer_speed(timer: Option<Timer>, speed_secs: f64) {
    if speed_secs <= 0.0 {
        return;
    }
    let was_started = al_get_timer_started(timer);
    if was_started {
        al_stop_timer(timer);
    }
    with_context(|ctx| {
        if let Some(data) = timer.and_then(|t| ctx.timer.timers.get_mut(t.0)) {
            data.speed = speed_secs;
        }
    });
    if was_started {
        al_start_timer(timer);
    }
}

fn with_ticks<R>(timer: Option<Timer>, default: R, f: impl FnOnce(&TimerTicks) -> R) -> R {
    let ticks = with_context(|ctx| {
        timer
            .and_then(|t| ctx.timer.timers.get(t.0))
            .map(|data| Arc::clone(&data.ticks))
    });
    match ticks {
        Some(ticks) => f(&ticks),
        None => default,
    }
}

pub fn al_get_timer_count(timer: Option<Timer>) -> i64 {
    with_ticks(timer, 0, TimerTicks::count)
}

pub fn al_set_timer_count(timer: Option<Timer>, count: i64) {
    with_ticks(timer, (), |ticks| ticks.set_count(count))
}

pub fn al_add_timer_count(timer: Option<Timer>, diff: i64) {
    with_ticks(timer, (), |ticks| ticks.add_count(diff))
}

/// Timers never post events; the returned source is inert.
pub fn al_get_timer_event_source(timer: Option<Timer>) -> Option<EventSource> {
    with_context(|ctx| {
        timer
            .and_then(|t| ctx.timer.timers.get(t.0))
            .map(|data| data.event_source)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn ticks_count_and_report_interval() {
        let ticks = TimerTicks::new(16);
        assert_eq!(ticks.tick(), 16);
        assert_eq!(ticks.tick(), 16);
        assert_eq!(ticks.count(), 2);
        ticks.add_count(-5);
        assert_eq!(ticks.count(), -3);
    }

    #[test]
    fn cancelled_registration_stops_ticking() {
        let ticks = Arc::new(TimerTicks::new(10));
        let first = TimerRegistration::new(Arc::clone(&ticks));
        assert_eq!(first.tick(), Some(10));
        first.cancel();
        assert!(first.is_cancelled());
        assert_eq!(first.tick(), None);
        assert_eq!(ticks.count(), 1);

        let second = TimerRegistration::new(Arc::clone(&ticks));
        assert_eq!(second.tick(), Some(10));
        assert_eq!(first.tick(), None);
        assert_eq!(ticks.count(), 2);
    }

    #[test]
    fn interval_is_at_least_one_millisecond() {
        assert_eq!(interval_ms(0.0001), 1);
        assert_eq!(interval_ms(0.25), 250);
    }

    #[test]
    fn creation_rejects_non_positive_speed() {
        assert_eq!(al_create_timer(0.0), None);
        assert_eq!(al_create_timer(-1.0), None);
        let timer = al_create_timer(0.5);
        assert!(timer.is_some());
        assert_eq!(al_get_timer_speed(timer), 0.5);
        assert!(!al_get_timer_started(timer));
        assert!(al_get_timer_event_source(timer).is_some());
    }

    #[test]
    fn count_setters_are_exact() {
        let timer = al_create_timer(1.0);
        al_set_timer_count(timer, 41);
        assert_eq!(al_get_timer_count(timer), 41);
        al_add_timer_count(timer, 1);
        assert_eq!(al_get_timer_count(timer), 42);

        al_destroy_timer(timer);
        assert_eq!(al_get_timer_count(timer), 0);
        assert_eq!(al_get_timer_event_source(timer), None);
    }

    #[test]
    fn running_timer_counts_wall_clock() {
        let _fake = fake::install();
        assert!(al_install_timer());
        let timer = al_create_timer(0.01);
        al_start_timer(timer);
        assert!(al_get_timer_started(timer));

        thread::sleep(Duration::from_millis(500));
        al_stop_timer(timer);
        let count = al_get_timer_count(timer);
        assert!(count >= 20 && count <= 60, "count was {}", count);

        // Stopped timers hold their count.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(al_get_timer_count(timer), count);
    }

    #[test]
    fn speed_change_restarts_a_running_timer() {
        let fake = fake::install();
        let timer = al_create_timer(1.0);
        al_start_timer(timer);
        al_set_timer_count(timer, 7);
        al_set_timer_speed(timer, 2.0);

        assert!(al_get_timer_started(timer));
        assert_eq!(al_get_timer_speed(timer), 2.0);
        assert_eq!(al_get_timer_count(timer), 7);
        assert_eq!(fake.borrow().running_timers(), 1);

        al_set_timer_speed(timer, 0.0);
        assert_eq!(al_get_timer_speed(timer), 2.0);
    }

    #[test]
    fn uninstall_destroys_every_timer() {
        let fake = fake::install();
        assert!(al_install_timer());
        let first = al_create_timer(1.0);
        let second = al_create_timer(1.0);
        al_start_timer(first);
        al_resume_timer(second);
        assert_eq!(fake.borrow().running_timers(), 2);

        al_uninstall_timer();
        assert!(!al_is_timer_installed());
        assert_eq!(fake.borrow().running_timers(), 0);
        assert_eq!(al_get_timer_speed(first), 0.0);
        assert_eq!(al_get_timer_speed(second), 0.0);
    }
}
