use std::time::Duration;

use objc2::rc::Retained;
use objc2::{define_class, msg_send, ClassType, MainThreadMarker, MainThreadOnly};
use objc2_app_kit::{
    NSAnimationContext, NSBackingStoreType, NSColor, NSView, NSWindow,
    NSWindowCollectionBehavior, NSWindowStyleMask,
};
use objc2_foundation::{NSPoint, NSRect, NSSize, NSString};

use crate::geometry::Rect;
use crate::island::FrameSink;

/// NSStatusWindowLevel: above regular windows and the menu bar contents,
/// so the island sits over the notch.
const ISLAND_WINDOW_LEVEL: isize = 25;

// Borderless window that never becomes main, so clicking the island does not
// pull focus from the frontmost app.
define_class!(
    #[unsafe(super(NSWindow))]
    #[thread_kind = MainThreadOnly]
    #[name = "IsletWindow"]
    struct IsletWindow;

    impl IsletWindow {
        #[unsafe(method(canBecomeKeyWindow))]
        fn can_become_key_window(&self) -> bool {
            false
        }

        #[unsafe(method(canBecomeMainWindow))]
        fn can_become_main_window(&self) -> bool {
            false
        }
    }
);

impl IsletWindow {
    fn new(mtm: MainThreadMarker, frame: NSRect) -> Retained<Self> {
        unsafe {
            msg_send![
                Self::alloc(mtm),
                initWithContentRect: frame,
                styleMask: NSWindowStyleMask::Borderless,
                backing: NSBackingStoreType::Buffered,
                defer: false
            ]
        }
    }
}

pub fn to_ns_rect(rect: Rect) -> NSRect {
    NSRect::new(
        NSPoint::new(rect.x, rect.y),
        NSSize::new(rect.width, rect.height),
    )
}

pub struct IslandWindow {
    window: Retained<NSWindow>,
}

impl IslandWindow {
    pub fn new(mtm: MainThreadMarker, frame: Rect) -> Self {
        log::debug!(
            "Creating island window at ({}, {}) size {}x{}",
            frame.x,
            frame.y,
            frame.width,
            frame.height
        );

        let custom_window = IsletWindow::new(mtm, to_ns_rect(frame));
        let window: Retained<NSWindow> = unsafe { Retained::cast_unchecked(custom_window) };

        window.setLevel(ISLAND_WINDOW_LEVEL);
        window.setCollectionBehavior(
            NSWindowCollectionBehavior::CanJoinAllSpaces
                | NSWindowCollectionBehavior::Stationary
                | NSWindowCollectionBehavior::IgnoresCycle,
        );

        // The view paints the island shape itself
        window.setOpaque(false);
        window.setHasShadow(false);
        let clear_color = NSColor::clearColor();
        window.setBackgroundColor(Some(&clear_color));

        window.setExcludedFromWindowsMenu(true);
        window.setIgnoresMouseEvents(false);
        window.setAcceptsMouseMovedEvents(true);
        window.setTitle(&NSString::from_str("Islet"));

        Self { window }
    }

    pub fn set_content_view(&self, view: &NSView) {
        self.window.setContentView(Some(view));
    }

    pub fn show(&self) {
        self.window.orderFrontRegardless();
        log::debug!("Island window visible={}", self.window.isVisible());
    }

    /// Handle the expansion controller uses to move this window.
    pub fn frame_sink(&self) -> WindowFrameSink {
        WindowFrameSink {
            window: self.window.clone(),
        }
    }
}

pub struct WindowFrameSink {
    window: Retained<NSWindow>,
}

impl FrameSink for WindowFrameSink {
    fn animate_frame(&mut self, frame: Rect, duration: Duration) {
        log::debug!(
            "Animating island to ({:.1}, {:.1}) {:.0}x{:.0} over {:?}",
            frame.x,
            frame.y,
            frame.width,
            frame.height,
            duration
        );

        let target = to_ns_rect(frame);
        if duration.is_zero() {
            self.window.setFrame_display(target, true);
            return;
        }

        unsafe {
            let _: () = msg_send![NSAnimationContext::class(), beginGrouping];
            let context: Retained<NSAnimationContext> =
                msg_send![NSAnimationContext::class(), currentContext];
            let _: () = msg_send![&*context, setDuration: duration.as_secs_f64()];

            let animator: Retained<NSWindow> = msg_send![&*self.window, animator];
            animator.setFrame_display(target, true);

            let _: () = msg_send![NSAnimationContext::class(), endGrouping];
        }
    }
}
