//! 防抖定时器
//!
//! 时间由调用方传入，便于测试。每次 `rearm` 都把截止时间推迟到
//! `now + delay`，因此一串密集事件只会在最后一次之后触发一次。

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 重新计时
    pub fn rearm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// 到期时返回 `true` 并解除计时
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// 立即触发，未计时则返回 `false`
    pub fn fire_now(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn burst_collapses_into_one_fire() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.rearm(start);
        debouncer.rearm(start + Duration::from_millis(100));
        debouncer.rearm(start + Duration::from_millis(200));

        assert!(!debouncer.poll(start + Duration::from_millis(600)));
        assert!(debouncer.poll(start + Duration::from_millis(700)));
        assert!(!debouncer.poll(start + Duration::from_millis(1400)));
    }

    #[test]
    fn fire_now_only_fires_when_armed() {
        let mut debouncer = Debouncer::new(DELAY);
        assert!(!debouncer.fire_now());

        debouncer.rearm(Instant::now());
        assert!(debouncer.is_armed());
        assert!(debouncer.fire_now());
        assert!(!debouncer.is_armed());
    }

    #[test]
    fn cancel_disarms() {
        let now = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.rearm(now);
        debouncer.cancel();
        assert!(!debouncer.poll(now + DELAY * 2));
    }
}
