//! Confirmation flash drawn around a window after navigation.
//!
//! Each flash is a tokio task: fade in, hold, fade out, dismiss. Starting a
//! new flash aborts the running task and hides its overlay first, so at most
//! one overlay is ever visible.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use devmux_core::Rect;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Distance the overlay extends past the window on every side.
pub const OVERLAY_OUTSET: f64 = 8.0;

/// Drawing backend for the overlay. Implementations must be click-through.
pub trait OverlaySurface: Send + Sync {
    /// Place a fully transparent overlay over `frame`.
    fn show(&self, frame: Rect);

    /// Animate the overlay's opacity to `alpha` over `duration`.
    fn fade_to(&self, alpha: f64, duration: Duration);

    /// Remove the overlay.
    fn hide(&self);
}

/// Surface that only logs; used off macOS and when no main thread is
/// available to draw on.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSurface;

impl OverlaySurface for TracingSurface {
    fn show(&self, frame: Rect) {
        tracing::info!(
            "highlight at {:.0},{:.0} {:.0}x{:.0}",
            frame.x,
            frame.y,
            frame.width,
            frame.height
        );
    }

    fn fade_to(&self, alpha: f64, duration: Duration) {
        tracing::trace!("highlight fade to {alpha} over {duration:?}");
    }

    fn hide(&self) {
        tracing::trace!("highlight dismissed");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightTiming {
    pub fade_in: Duration,
    pub hold: Duration,
    pub fade_out: Duration,
}

impl Default for HighlightTiming {
    fn default() -> Self {
        Self {
            fade_in: Duration::from_millis(150),
            hold: Duration::from_millis(1_200),
            fade_out: Duration::from_millis(300),
        }
    }
}

impl HighlightTiming {
    pub fn with_hold(hold: Duration) -> Self {
        Self {
            hold,
            ..Self::default()
        }
    }

    pub fn total(&self) -> Duration {
        self.fade_in + self.hold + self.fade_out
    }
}

pub struct Highlighter {
    surface: Arc<dyn OverlaySurface>,
    timing: HighlightTiming,
    runtime: Handle,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl Highlighter {
    pub fn new(surface: Arc<dyn OverlaySurface>, timing: HighlightTiming, runtime: Handle) -> Self {
        Self {
            surface,
            timing,
            runtime,
            current: Mutex::new(None),
        }
    }

    /// Flash an overlay around `window_frame`, replacing any flash in progress.
    pub fn flash(&self, window_frame: Rect) {
        let frame = window_frame.outset(OVERLAY_OUTSET);
        let surface = Arc::clone(&self.surface);
        let timing = self.timing;

        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = current.take() {
            if !previous.is_finished() {
                previous.abort();
                self.surface.hide();
            }
        }

        *current = Some(self.runtime.spawn(async move {
            surface.show(frame);
            surface.fade_to(1.0, timing.fade_in);
            tokio::time::sleep(timing.fade_in + timing.hold).await;
            surface.fade_to(0.0, timing.fade_out);
            tokio::time::sleep(timing.fade_out).await;
            surface.hide();
        }));
    }

    /// Whether a flash is still running.
    pub fn is_flashing(&self) -> bool {
        let current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        current.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait for the current flash, if any, to finish.
    pub async fn settled(&self) {
        let handle = match self.current.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!("highlight task failed: {e}");
                }
            }
        }
    }
}
