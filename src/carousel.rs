//! Hero image carousel

use crate::page::Page;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::trace;

/// Time each slide stays visible
pub const CAROUSEL_INTERVAL: Duration = Duration::from_millis(5000);

/// Opacity change produced by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideChange {
    pub hide: usize,
    pub show: usize,
}

impl SlideChange {
    pub fn apply<P: Page + ?Sized>(&self, page: &mut P) {
        page.set_slide_opacity(self.hide, 0.0);
        page.set_slide_opacity(self.show, 1.0);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carousel {
    count: usize,
    index: usize,
}

impl Carousel {
    pub fn new(count: usize) -> Self {
        Self { count, index: 0 }
    }

    pub fn current(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Advance to the next slide, wrapping around. `None` when there are no slides.
    pub fn tick(&mut self) -> Option<SlideChange> {
        if self.count == 0 {
            return None;
        }
        let hide = self.index;
        self.index = (self.index + 1) % self.count;
        trace!(hide, show = self.index, "Carousel tick");
        Some(SlideChange {
            hide,
            show: self.index,
        })
    }

    /// Tick every `period` forever, handing each change to `on_change`.
    /// The first change happens one full period after the call.
    pub async fn run<F>(mut self, period: Duration, mut on_change: F)
    where
        F: FnMut(SlideChange),
    {
        if self.is_empty() {
            return;
        }
        let mut ticker = slide_ticker(period);
        loop {
            ticker.tick().await;
            if let Some(change) = self.tick() {
                on_change(change);
            }
        }
    }
}

/// Interval whose first tick completes one full `period` from now.
///
/// Panics if `period` is zero; `Config::validate` rejects that.
pub fn slide_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MemoryPage;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_index_after_k_ticks_is_k_mod_count() {
        for count in 1..=6 {
            let mut carousel = Carousel::new(count);
            for k in 1..=20 {
                carousel.tick();
                assert_eq!(carousel.current(), k % count, "count={} k={}", count, k);
            }
        }
    }

    #[test]
    fn test_empty_carousel_is_noop() {
        let mut carousel = Carousel::new(0);
        assert_eq!(carousel.tick(), None);
        assert_eq!(carousel.current(), 0);
    }

    #[test]
    fn test_single_slide_stays_visible() {
        let mut page = MemoryPage::new(1);
        let mut carousel = Carousel::new(1);
        carousel.tick().unwrap().apply(&mut page);
        assert_eq!(page.visible_slide(), Some(0));
    }

    #[test]
    fn test_apply_moves_visibility() {
        let mut page = MemoryPage::new(3);
        let mut carousel = Carousel::new(3);

        for expected in [1, 2, 0, 1] {
            carousel.tick().unwrap().apply(&mut page);
            assert_eq!(page.visible_slide(), Some(expected));
            assert_eq!(page.slide_opacity((expected + 2) % 3), Some(0.0));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_on_interval() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = tokio::spawn(Carousel::new(2).run(CAROUSEL_INTERVAL, move |change| {
            sink.lock().unwrap().push(change.show);
        }));

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert!(seen.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(10_002)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 0, 1]);

        handle.abort();
    }
}
