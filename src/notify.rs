use std::time::{Duration, Instant};

/// Rate-limiting policy around the editor's change callback.
///
/// Two stages, both driven by [`pump`](Self::pump) from the host loop:
/// the first [`trigger`](Self::trigger) of a burst arms a fire point one
/// throttle window later and further triggers merge into it; once the fire
/// point passes, delivery waits a further grace delay so in-flight visual
/// mutation settles before downstream consumers re-read the composite.
///
/// Reassigning the editor's callback swaps the whole notifier, never the
/// inner callback of a live one.
pub struct ChangeNotifier {
    throttle: Duration,
    grace: Duration,
    callback: Box<dyn FnMut()>,
    fire_at: Option<Instant>,
    deliver_at: Option<Instant>,
}

impl ChangeNotifier {
    /// At most one delivery per window.
    pub const THROTTLE: Duration = Duration::from_millis(15);
    /// Settle time between the throttled fire and the caller's callback.
    pub const GRACE: Duration = Duration::from_millis(25);

    pub fn new(callback: Box<dyn FnMut()>) -> Self {
        Self::with_windows(Self::THROTTLE, Self::GRACE, callback)
    }

    pub fn with_windows(throttle: Duration, grace: Duration, callback: Box<dyn FnMut()>) -> Self {
        Self {
            throttle,
            grace,
            callback,
            fire_at: None,
            deliver_at: None,
        }
    }

    pub fn trigger(&mut self, now: Instant) {
        if self.fire_at.is_none() {
            self.fire_at = Some(now + self.throttle);
        }
    }

    /// Advance the two stages. Returns whether the callback was invoked.
    pub fn pump(&mut self, now: Instant) -> bool {
        if let Some(fire) = self.fire_at
            && fire <= now
        {
            self.fire_at = None;
            if self.deliver_at.is_none() {
                self.deliver_at = Some(fire + self.grace);
            }
        }

        if let Some(deliver) = self.deliver_at
            && deliver <= now
        {
            self.deliver_at = None;
            tracing::debug!("change notifier delivering");
            (self.callback)();
            return true;
        }
        false
    }

    pub fn is_pending(&self) -> bool {
        self.fire_at.is_some() || self.deliver_at.is_some()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("throttle", &self.throttle)
            .field("grace", &self.grace)
            .field("fire_at", &self.fire_at)
            .field("deliver_at", &self.deliver_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn counting_notifier() -> (ChangeNotifier, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0u32));
        let calls2 = Rc::clone(&calls);
        let notifier = ChangeNotifier::new(Box::new(move || calls2.set(calls2.get() + 1)));
        (notifier, calls)
    }

    #[test]
    fn burst_collapses_to_one_delivery() {
        let (mut n, calls) = counting_notifier();
        let t0 = Instant::now();
        for i in 0..10 {
            n.trigger(t0 + Duration::from_millis(i));
        }
        // Not yet: throttle window still open.
        assert!(!n.pump(t0 + Duration::from_millis(14)));
        // Fire point passed, grace not yet elapsed.
        assert!(!n.pump(t0 + Duration::from_millis(20)));
        assert_eq!(calls.get(), 0);

        assert!(n.pump(t0 + ChangeNotifier::THROTTLE + ChangeNotifier::GRACE));
        assert_eq!(calls.get(), 1);
        assert!(!n.is_pending());
    }

    #[test]
    fn delivery_is_not_early() {
        let (mut n, calls) = counting_notifier();
        let t0 = Instant::now();
        n.trigger(t0);
        let earliest = t0 + ChangeNotifier::THROTTLE + ChangeNotifier::GRACE;
        assert!(!n.pump(earliest - Duration::from_millis(1)));
        assert_eq!(calls.get(), 0);
        assert!(n.pump(earliest));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn separate_bursts_deliver_separately() {
        let (mut n, calls) = counting_notifier();
        let t0 = Instant::now();
        n.trigger(t0);
        assert!(n.pump(t0 + Duration::from_millis(40)));

        let t1 = t0 + Duration::from_millis(100);
        n.trigger(t1);
        assert!(n.pump(t1 + Duration::from_millis(40)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn pump_without_trigger_is_silent() {
        let (mut n, calls) = counting_notifier();
        assert!(!n.pump(Instant::now() + Duration::from_secs(1)));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn late_pump_crosses_both_stages_at_once() {
        let (mut n, calls) = counting_notifier();
        let t0 = Instant::now();
        n.trigger(t0);
        assert!(n.pump(t0 + Duration::from_secs(5)));
        assert_eq!(calls.get(), 1);
    }
}
