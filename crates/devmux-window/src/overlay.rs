//! Overlay commands handed from the highlight task to the thread that owns
//! the overlay window.
//!
//! Window servers only accept drawing from one thread, while [`Highlighter`]
//! runs its timeline on the tokio runtime. [`ChannelSurface`] turns surface
//! calls into [`OverlayCommand`]s; the owning thread drains them into an
//! [`OverlayState`] and renders whatever alpha the state reports each frame.
//!
//! [`Highlighter`]: crate::highlight::Highlighter

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use devmux_core::Rect;

use crate::highlight::OverlaySurface;

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand {
    Show(Rect),
    Fade { alpha: f64, duration: Duration },
    Hide,
}

/// [`OverlaySurface`] that forwards every call down a channel.
#[derive(Debug)]
pub struct ChannelSurface {
    tx: Sender<OverlayCommand>,
}

pub fn channel_surface() -> (ChannelSurface, Receiver<OverlayCommand>) {
    let (tx, rx) = mpsc::channel();
    (ChannelSurface { tx }, rx)
}

impl ChannelSurface {
    fn send(&self, cmd: OverlayCommand) {
        if let Err(e) = self.tx.send(cmd) {
            tracing::debug!("overlay receiver gone, dropping {:?}", e.0);
        }
    }
}

impl OverlaySurface for ChannelSurface {
    fn show(&self, frame: Rect) {
        self.send(OverlayCommand::Show(frame));
    }

    fn fade_to(&self, alpha: f64, duration: Duration) {
        self.send(OverlayCommand::Fade { alpha, duration });
    }

    fn hide(&self) {
        self.send(OverlayCommand::Hide);
    }
}

/// What the owning thread must do to its window after a command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowChange {
    /// Move the window to this frame and order it front.
    Place(Rect),
    /// Take the window off screen.
    Remove,
    /// Only the alpha animation changed.
    Animate,
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f64,
    to: f64,
    start: Instant,
    duration: Duration,
}

/// Frame and alpha animation of the single overlay window.
#[derive(Debug, Default)]
pub struct OverlayState {
    frame: Option<Rect>,
    fade: Option<Fade>,
}

impl OverlayState {
    pub fn apply(&mut self, cmd: OverlayCommand, now: Instant) -> WindowChange {
        match cmd {
            OverlayCommand::Show(frame) => {
                self.frame = Some(frame);
                self.fade = None;
                WindowChange::Place(frame)
            }
            OverlayCommand::Fade { alpha, duration } => {
                self.fade = Some(Fade {
                    from: self.alpha_at(now),
                    to: alpha.clamp(0.0, 1.0),
                    start: now,
                    duration,
                });
                WindowChange::Animate
            }
            OverlayCommand::Hide => {
                self.frame = None;
                self.fade = None;
                WindowChange::Remove
            }
        }
    }

    /// Frame of the overlay while one is placed.
    pub fn frame(&self) -> Option<Rect> {
        self.frame
    }

    /// Linear alpha at `now`; a placed overlay starts fully transparent.
    pub fn alpha_at(&self, now: Instant) -> f64 {
        if self.frame.is_none() {
            return 0.0;
        }
        let Some(fade) = self.fade else {
            return 0.0;
        };
        if fade.duration.is_zero() {
            return fade.to;
        }
        let t = (now.saturating_duration_since(fade.start).as_secs_f64()
            / fade.duration.as_secs_f64())
        .min(1.0);
        fade.from + (fade.to - fade.from) * t
    }
}
