//! Sentinel visibility: when the element after the last card scrolls into
//! view, the next page is requested.
//!
//! Geometry is in pixels along the scroll axis. The viewport is grown by
//! [`DEFAULT_ROOT_MARGIN`] on both ends before testing, so the signal fires
//! slightly before the sentinel is actually on screen. Any overlap counts.

/// Pre-trigger distance, in pixels.
pub const DEFAULT_ROOT_MARGIN: f64 = 100.0;

/// A vertical span, `top` inclusive, `top + height` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub top: f64,
    pub height: f64,
}

impl Span {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn expand(&self, margin: f64) -> Self {
        Self {
            top: self.top - margin,
            height: self.height + 2.0 * margin,
        }
    }

    /// Overlap test. A zero-height span overlaps when it lies inside.
    pub fn intersects(&self, other: &Span) -> bool {
        let lo = self.top.max(other.top);
        let hi = self.bottom().min(other.bottom());
        hi > lo || (hi == lo && (self.height == 0.0 || other.height == 0.0))
    }
}

/// Reports when the sentinel goes from hidden to visible.
#[derive(Debug, Clone)]
pub struct SentinelObserver {
    root_margin: f64,
    visible: bool,
}

impl Default for SentinelObserver {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_MARGIN)
    }
}

impl SentinelObserver {
    pub fn new(root_margin: f64) -> Self {
        Self {
            root_margin,
            visible: false,
        }
    }

    /// Feed the current layout. Returns true on a hidden→visible edge.
    ///
    /// `sentinel` is `None` when no sentinel is rendered.
    pub fn update(&mut self, sentinel: Option<Span>, viewport: Span) -> bool {
        let now = sentinel.is_some_and(|s| s.intersects(&viewport.expand(self.root_margin)));
        let fired = now && !self.visible;
        self.visible = now;
        fired
    }

    /// Forget the last observation, so a sentinel that is still visible
    /// fires again on the next update.
    pub fn rearm(&mut self) {
        self.visible = false;
    }
}
