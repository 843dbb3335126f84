use chrono::{DateTime, Utc};

/// Source of the current instant.
///
/// The token manager never reads the ambient system clock directly; it
/// asks its `Clock`. Production wiring supplies [`SystemClock`], tests
/// supply a pinned implementation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
