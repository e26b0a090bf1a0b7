use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Spaces successive requests by a fixed delay.
///
/// `acquire` waits for the next free slot and reserves it; `release` pushes the
/// next slot to `delay` after the request finished. With one request in
/// flight at a time the gap between the end of one request and the start of
/// the next is therefore at least `delay`; with several in flight, starts are
/// still at least `delay` apart.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn acquire(&self) {
        let start = {
            let mut next = self.next_slot.lock().unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            let start = next.map_or(now, |slot| slot.max(now));
            *next = Some(start + self.delay);
            start
        };
        sleep_until(start).await;
    }

    pub fn release(&self) {
        let mut next = self.next_slot.lock().unwrap_or_else(|e| e.into_inner());
        let after_finish = Instant::now() + self.delay;
        *next = Some(next.map_or(after_finish, |slot| slot.max(after_finish)));
    }
}
