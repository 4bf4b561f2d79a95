use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Move,
    Down,
    Up,
    Enter,
    Leave,
}

/// Raw pointer event in surface-space coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub pos: kurbo::Point,
    pub primary_down: bool,
    pub secondary_down: bool,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            pos: kurbo::Point::new(x, y),
            primary_down: false,
            secondary_down: false,
        }
    }

    pub fn with_primary_down(mut self) -> Self {
        self.primary_down = true;
        self
    }

    pub fn with_secondary_down(mut self) -> Self {
        self.secondary_down = true;
        self
    }
}

/// Leading-edge rate limit: the first event passes, later ones are dropped
/// until `min_interval` has elapsed. A throttle rather than a debounce:
/// admitted events are handled immediately, excess ones are discarded.
#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    last_admitted: Option<Instant>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_admitted: None,
        }
    }

    pub fn admit(&mut self, now: Instant) -> bool {
        match self.last_admitted {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_admitted = Some(now);
                true
            }
        }
    }
}
