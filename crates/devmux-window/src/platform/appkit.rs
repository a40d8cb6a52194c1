//! AppKit overlay window for the highlight flash.
//!
//! A borderless, clear, click-through window at the maximum window level
//! that joins every desktop, with a rounded green border drawn by its
//! content view's layer. AppKit only works from the main thread, so the
//! window lives in [`AppKitOverlay`], which is pinned there; the highlight
//! task reaches it through [`OverlayCommand`]s.

use std::ffi::c_void;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use core_foundation::base::TCFType;
use core_graphics::color::CGColor;
use core_graphics::display::CGDisplay;
use devmux_core::Rect;
use objc2::encode::{Encode, Encoding};
use objc2::msg_send;
use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2_app_kit::{
    NSApplication, NSApplicationActivationPolicy, NSBackingStoreType, NSColor, NSEventMask,
    NSWindow, NSWindowCollectionBehavior, NSWindowStyleMask,
};
use objc2_foundation::{
    MainThreadMarker, NSDate, NSDefaultRunLoopMode, NSPoint, NSRect, NSSize,
};

use crate::overlay::{OverlayCommand, OverlayState, WindowChange};

/// Event-loop slice between alpha updates.
const FRAME: Duration = Duration::from_millis(16);

const BORDER_WIDTH: f64 = 4.0;
const CORNER_RADIUS: f64 = 12.0;

/// `kCGMaximumWindowLevelKey`
const MAXIMUM_WINDOW_LEVEL_KEY: i32 = 14;

#[link(name = "CoreGraphics", kind = "framework")]
unsafe extern "C" {
    fn CGWindowLevelForKey(key: i32) -> i32;
}

/// `CGColorRef` as an Objective-C argument.
#[repr(transparent)]
struct CgColorRef(*const c_void);

unsafe impl Encode for CgColorRef {
    const ENCODING: Encoding = Encoding::Pointer(&Encoding::Struct("CGColor", &[]));
}

pub struct AppKitOverlay {
    mtm: MainThreadMarker,
    commands: Receiver<OverlayCommand>,
    state: OverlayState,
    app: Option<Retained<NSApplication>>,
    window: Option<Retained<NSWindow>>,
}

impl AppKitOverlay {
    /// `None` off the main thread.
    pub fn new(commands: Receiver<OverlayCommand>) -> Option<Self> {
        let mtm = MainThreadMarker::new()?;
        Some(Self {
            mtm,
            commands,
            state: OverlayState::default(),
            app: None,
            window: None,
        })
    }

    /// Apply queued commands and run the event loop in frame-sized slices
    /// until `active` turns false. Commands queued before it turned false
    /// are still applied, so the final dismissal is never lost.
    pub fn run_while(&mut self, active: &dyn Fn() -> bool) {
        loop {
            let still_active = active();
            self.drain();
            self.render(Instant::now());
            if !still_active {
                break;
            }
            self.pump(FRAME);
        }
        self.remove();
    }

    fn remove(&self) {
        if let Some(window) = &self.window {
            #[allow(unused_unsafe)]
            unsafe {
                window.orderOut(None)
            };
        }
    }

    fn drain(&mut self) {
        while let Ok(cmd) = self.commands.try_recv() {
            match self.state.apply(cmd, Instant::now()) {
                WindowChange::Place(frame) => self.place(frame),
                WindowChange::Remove => self.remove(),
                WindowChange::Animate => {}
            }
        }
    }

    fn render(&self, now: Instant) {
        if let (Some(window), Some(_)) = (&self.window, self.state.frame()) {
            #[allow(unused_unsafe)]
            unsafe {
                window.setAlphaValue(self.state.alpha_at(now))
            };
        }
    }

    fn place(&mut self, frame: Rect) {
        let rect = to_appkit(frame);
        if self.window.is_none() {
            self.window = Some(self.create_window(rect));
        }
        if let Some(window) = &self.window {
            #[allow(unused_unsafe)]
            unsafe {
                window.setAlphaValue(0.0);
                window.setFrame_display(rect, true);
                window.orderFrontRegardless();
            }
        }
    }

    fn create_window(&mut self, rect: NSRect) -> Retained<NSWindow> {
        let app = NSApplication::sharedApplication(self.mtm);
        // no Dock icon, no menu bar
        let _ = app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);
        #[allow(unused_unsafe)]
        unsafe {
            app.finishLaunching()
        };
        self.app = Some(app);

        let window = unsafe {
            NSWindow::initWithContentRect_styleMask_backing_defer(
                self.mtm.alloc(),
                rect,
                NSWindowStyleMask::Borderless,
                NSBackingStoreType::NSBackingStoreBuffered,
                false,
            )
        };
        let level = unsafe { CGWindowLevelForKey(MAXIMUM_WINDOW_LEVEL_KEY) } as isize;
        #[allow(unused_unsafe)]
        unsafe {
            window.setReleasedWhenClosed(false);
            window.setOpaque(false);
            window.setBackgroundColor(Some(&NSColor::clearColor()));
            window.setHasShadow(false);
            window.setIgnoresMouseEvents(true);
            window.setLevel(level);
            window.setCollectionBehavior(
                NSWindowCollectionBehavior::CanJoinAllSpaces
                    | NSWindowCollectionBehavior::Stationary,
            );
        }

        #[allow(unused_unsafe)]
        let content = unsafe { window.contentView() };
        if let Some(view) = content {
            let color = CGColor::rgb(0.2, 0.9, 0.4, 0.9);
            #[allow(unused_unsafe)]
            unsafe {
                view.setWantsLayer(true);
                let layer: *mut AnyObject = msg_send![&*view, layer];
                if !layer.is_null() {
                    let _: () = msg_send![layer, setBorderWidth: BORDER_WIDTH];
                    let _: () = msg_send![layer, setCornerRadius: CORNER_RADIUS];
                    let _: () = msg_send![
                        layer,
                        setBorderColor: CgColorRef(color.as_concrete_TypeRef() as *const c_void)
                    ];
                }
            }
        }
        window
    }

    /// Dispatch window-server events for up to `slice`.
    fn pump(&self, slice: Duration) {
        let Some(app) = &self.app else {
            std::thread::sleep(slice);
            return;
        };
        #[allow(unused_unsafe)]
        let until = unsafe { NSDate::dateWithTimeIntervalSinceNow(slice.as_secs_f64()) };
        loop {
            #[allow(unused_unsafe)]
            let event = unsafe {
                app.nextEventMatchingMask_untilDate_inMode_dequeue(
                    NSEventMask::Any,
                    Some(&until),
                    NSDefaultRunLoopMode,
                    true,
                )
            };
            let Some(event) = event else { break };
            #[allow(unused_unsafe)]
            unsafe {
                app.sendEvent(&event)
            };
        }
    }
}

/// Global top-left coordinates to AppKit's bottom-left ones, relative to the
/// primary display.
fn to_appkit(frame: Rect) -> NSRect {
    let primary_height = CGDisplay::main().bounds().size.height;
    let r = frame.flipped(primary_height);
    NSRect::new(NSPoint::new(r.x, r.y), NSSize::new(r.width, r.height))
}
