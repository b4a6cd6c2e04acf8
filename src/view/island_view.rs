use std::cell::RefCell;

use objc2::rc::Retained;
use objc2::{define_class, msg_send, MainThreadMarker, MainThreadOnly};
use objc2_app_kit::{NSEvent, NSGraphicsContext, NSTrackingArea, NSTrackingAreaOptions, NSView};
use objc2_foundation::NSRect;

use crate::input::{push_input, IslandInput};
use crate::render::IslandPainter;

thread_local! {
    static VIEW_STATE: RefCell<Option<ViewState>> = const { RefCell::new(None) };
}

struct ViewState {
    painter: IslandPainter,
    expanded: bool,
    /// Corner radius for the collapsed and expanded shapes.
    radii: (f64, f64),
    summary: Option<String>,
}

define_class!(
    #[unsafe(super(NSView))]
    #[thread_kind = MainThreadOnly]
    #[name = "IslandView"]
    pub struct IslandView;

    impl IslandView {
        #[unsafe(method(drawRect:))]
        fn draw_rect(&self, _dirty_rect: NSRect) {
            VIEW_STATE.with(|state| {
                if let Some(state) = state.borrow().as_ref() {
                    self.draw_content(state);
                }
            });
        }

        #[unsafe(method(isOpaque))]
        fn is_opaque(&self) -> bool {
            false
        }

        #[unsafe(method(acceptsFirstMouse:))]
        fn accepts_first_mouse(&self, _event: Option<&NSEvent>) -> bool {
            true
        }

        #[unsafe(method(acceptsFirstResponder))]
        fn accepts_first_responder(&self) -> bool {
            false
        }

        #[unsafe(method(mouseDown:))]
        fn mouse_down(&self, _event: &NSEvent) {
            // Swallowed; the tap fires on release
        }

        #[unsafe(method(mouseUp:))]
        fn mouse_up(&self, _event: &NSEvent) {
            push_input(IslandInput::Tap);
        }

        #[unsafe(method(mouseEntered:))]
        fn mouse_entered(&self, _event: &NSEvent) {
            push_input(IslandInput::Pointer(true));
        }

        #[unsafe(method(mouseExited:))]
        fn mouse_exited(&self, _event: &NSEvent) {
            push_input(IslandInput::Pointer(false));
        }

        #[unsafe(method(updateTrackingAreas))]
        fn update_tracking_areas(&self) {
            for area in self.trackingAreas().iter() {
                self.removeTrackingArea(&area);
            }

            // InVisibleRect keeps the area in step with the animated frame
            let options = NSTrackingAreaOptions::MouseEnteredAndExited
                | NSTrackingAreaOptions::ActiveAlways
                | NSTrackingAreaOptions::InVisibleRect;

            let tracking_area = unsafe {
                use objc2::AllocAnyThread;
                NSTrackingArea::initWithRect_options_owner_userInfo(
                    NSTrackingArea::alloc(),
                    self.bounds(),
                    options,
                    Some(self),
                    None,
                )
            };

            self.addTrackingArea(&tracking_area);
        }
    }
);

impl IslandView {
    pub fn new(mtm: MainThreadMarker, painter: IslandPainter, radii: (f64, f64)) -> Retained<Self> {
        let view: Retained<Self> = unsafe { msg_send![Self::alloc(mtm), init] };

        VIEW_STATE.with(|state| {
            *state.borrow_mut() = Some(ViewState {
                painter,
                expanded: false,
                radii,
                summary: None,
            });
        });

        view.updateTrackingAreas();
        view
    }

    /// Switches between the collapsed pill and the expanded battery card.
    pub fn set_expanded(&self, expanded: bool) {
        self.update_state(|state| state.expanded = expanded);
    }

    pub fn set_corner_radii(&self, collapsed: f64, expanded: f64) {
        self.update_state(|state| state.radii = (collapsed, expanded));
    }

    pub fn set_summary(&self, summary: Option<String>) {
        self.update_state(|state| state.summary = summary);
    }

    pub fn set_painter(&self, painter: IslandPainter) {
        self.update_state(|state| state.painter = painter);
    }

    fn update_state(&self, f: impl FnOnce(&mut ViewState)) {
        VIEW_STATE.with(|state| {
            if let Some(state) = state.borrow_mut().as_mut() {
                f(state);
            }
        });
        self.setNeedsDisplay(true);
    }

    fn draw_content(&self, state: &ViewState) {
        let Some(ns_context) = NSGraphicsContext::currentContext() else {
            return;
        };

        let bounds = self.bounds();
        let width = bounds.size.width;
        let height = bounds.size.height;

        let cg_context = ns_context.CGContext();
        let cg_context_ptr: *mut core_graphics::sys::CGContext =
            Retained::as_ptr(&cg_context) as *const _ as *mut _;

        let mut ctx =
            unsafe { core_graphics::context::CGContext::from_existing_context_ptr(cg_context_ptr) };

        let radius = if state.expanded {
            state.radii.1
        } else {
            state.radii.0
        };

        state.painter.clear(&mut ctx, width, height);
        state.painter.fill_island(&mut ctx, width, height, radius);

        // Text only fits once the island has grown past the notch
        if state.expanded {
            if let Some(summary) = &state.summary {
                state.painter.draw_centered_text(&mut ctx, summary, width, height);
            }
        }

        std::mem::forget(ctx);
    }
}
