//! Delayed, cancelable side effects.
//!
//! [`schedule`] runs an effect once after a delay unless it is canceled
//! first. [`Debouncer`] keeps at most one such effect pending: scheduling
//! a new one cancels the previous one, so only the effect scheduled last
//! can ever run once the caller stops rescheduling for a full delay.
//!
//! Both require a running tokio runtime.

use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::trace;

/// Handle to an effect started with [`schedule`].
///
/// Dropping the handle does not cancel the effect.
#[derive(Debug)]
pub struct ScheduledEffect {
    handle: AbortHandle,
}

impl ScheduledEffect {
    /// Prevent the effect from running if it has not run yet.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the effect ran or was canceled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Run `effect` once, `delay` from now.
pub fn schedule<F>(effect: F, delay: Duration) -> ScheduledEffect
where
    F: FnOnce() + Send + 'static,
{
    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        effect();
    });

    ScheduledEffect {
        handle: task.abort_handle(),
    }
}

/// Keeps at most one scheduled effect pending.
///
/// Any pending effect is canceled when the debouncer is dropped.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<ScheduledEffect>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Cancel the pending effect, if any, and schedule `effect` instead.
    pub fn schedule<F>(&mut self, effect: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.cancel() {
            trace!("rescheduled pending effect");
        }
        self.pending = Some(schedule(effect, self.delay));
    }

    /// Cancel the pending effect.
    ///
    /// Returns whether there was an effect that had not run yet.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) if !pending.is_finished() => {
                pending.cancel();
                true
            },
            _ => false,
        }
    }

    /// Whether an effect is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;
    use tokio::time::sleep;

    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let make_effect = {
            let count = count.clone();
            move || {
                let count = count.clone();
                Box::new(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                }) as Box<dyn FnOnce() + Send>
            }
        };
        (count, make_effect)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_after_delay() {
        let (count, effect) = counter();
        let scheduled = schedule(effect(), DELAY);

        sleep(DELAY - Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(scheduled.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn canceled_effect_never_runs() {
        let (count, effect) = counter();
        let scheduled = schedule(effect(), DELAY);

        sleep(Duration::from_millis(100)).await;
        scheduled.cancel();

        sleep(DELAY * 2).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_runs_only_the_last_effect() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(DELAY);

        for term in ["a", "ab", "abc"] {
            let seen = seen.clone();
            debouncer.schedule(move || seen.lock().unwrap().push(term));
            sleep(Duration::from_millis(100)).await;
        }
        assert!(debouncer.is_pending());

        sleep(DELAY).await;
        assert_eq!(*seen.lock().unwrap(), vec!["abc"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn settles_once_per_quiet_period() {
        let (count, effect) = counter();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.schedule(effect());
        sleep(DELAY + Duration::from_millis(1)).await;
        debouncer.schedule(effect());
        sleep(DELAY + Duration::from_millis(1)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_debouncer_cancels_pending_effect() {
        let (count, effect) = counter();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(effect());

        drop(debouncer);

        sleep(DELAY * 2).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_reports_pending_state() {
        let (_count, effect) = counter();
        let mut debouncer = Debouncer::new(DELAY);
        assert!(!debouncer.cancel());

        debouncer.schedule(effect());
        assert!(debouncer.cancel());
        assert!(!debouncer.is_pending());
    }
}
