use objc2::MainThreadMarker;
use objc2_app_kit::NSScreen;

use super::{DisplayMetrics, DisplaySource, Rect};

/// The screen AppKit considers "main", falling back to the first attached one.
#[derive(Clone, Copy)]
pub struct MainScreen {
    mtm: MainThreadMarker,
}

impl MainScreen {
    pub fn new(mtm: MainThreadMarker) -> Self {
        Self { mtm }
    }
}

impl DisplaySource for MainScreen {
    fn active_display(&self) -> Option<DisplayMetrics> {
        let screen =
            NSScreen::mainScreen(self.mtm).or_else(|| NSScreen::screens(self.mtm).firstObject())?;

        let frame = screen.frame();
        // safeAreaInsets is only non-zero on built-in panels with a camera housing.
        let insets = screen.safeAreaInsets();
        let backing_scale = screen.backingScaleFactor();

        log::trace!(
            "Main screen: {}x{} @{}x, safe_area_top={}",
            frame.size.width,
            frame.size.height,
            backing_scale,
            insets.top
        );

        Some(DisplayMetrics {
            frame: Rect::new(
                frame.origin.x,
                frame.origin.y,
                frame.size.width,
                frame.size.height,
            ),
            safe_area_top: insets.top,
            backing_scale,
        })
    }
}
