use std::time::{Duration, Instant};

use objc2::rc::Retained;
use objc2::MainThreadMarker;
use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy};
use objc2_foundation::NSDate;

use crate::config::{load_config, Config, ConfigWatcher};
use crate::geometry::{GeometryResolver, MainScreen, Rect};
use crate::input::{drain_inputs, IslandInput};
use crate::ipc::{publish_status, IpcCommand, IslandStatus};
use crate::island::ExpansionController;
use crate::power::{BatteryMonitor, PmsetSource};
use crate::render::IslandPainter;
use crate::timer::PollTimer;
use crate::view::IslandView;
use crate::window::{start_screen_monitor, IslandWindow};

/// Upper bound on how long one pass waits for AppKit events.
const MAX_WAIT: Duration = Duration::from_millis(50);

pub struct App {
    _app: Retained<NSApplication>,
    _window: IslandWindow,
    view: Retained<IslandView>,
    controller: ExpansionController<MainScreen>,
    battery: BatteryMonitor<PmsetSource>,
    battery_timer: PollTimer,
    config_watcher: Option<ConfigWatcher>,
    last_status: Option<IslandStatus>,
}

impl App {
    pub fn new(mtm: MainThreadMarker) -> Self {
        let app = NSApplication::sharedApplication(mtm);
        // Accessory policy: no dock icon, no menu bar, doesn't activate
        app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);

        let config = load_config();

        let config_watcher = match ConfigWatcher::new() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                log::error!("Failed to set up config watcher: {}", e);
                None
            }
        };

        let geometry = GeometryResolver::new(MainScreen::new(mtm));
        match geometry.display_geometry() {
            Some(display) => log::info!(
                "Display: has_notch={}, notch {:.0}x{:.0} at ({:.0}, {:.0})",
                display.has_notch,
                display.notch_rect.width,
                display.notch_rect.height,
                display.notch_rect.x,
                display.notch_rect.y
            ),
            None => log::warn!("No display found; island stays hidden until one appears"),
        }

        // Before the first display query succeeds, park a collapsed-size
        // window at the origin; reposition() moves it once a screen exists.
        let initial_frame = geometry
            .island_frame(false)
            .unwrap_or(Rect::new(0.0, 0.0, 160.0, 32.0));
        let radii = (geometry.corner_radius(false), geometry.corner_radius(true));

        let window = IslandWindow::new(mtm, initial_frame);
        let view = IslandView::new(mtm, IslandPainter::new(&config.island), radii);
        window.set_content_view(&view);
        window.show();

        let mut controller = ExpansionController::new(geometry, Box::new(window.frame_sink()));
        apply_config(&mut controller, &config);

        let callback_view = view.clone();
        controller.on_expansion_change(move |expanded| {
            log::debug!("Island expanded={}", expanded);
            callback_view.set_expanded(expanded);
        });

        start_screen_monitor();

        Self {
            _app: app,
            _window: window,
            view,
            controller,
            battery: BatteryMonitor::new(PmsetSource),
            battery_timer: PollTimer::new(config.poll_interval()),
            config_watcher,
            last_status: None,
        }
    }

    pub fn run(mut self, mtm: MainThreadMarker) {
        let app = NSApplication::sharedApplication(mtm);

        loop {
            // Sleep in AppKit until an event arrives or the next timer is due
            let now = Instant::now();
            let wait = self
                .controller
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(now))
                .unwrap_or(MAX_WAIT)
                .min(MAX_WAIT)
                .min(self.battery_timer.time_until_next(now));

            let date = NSDate::dateWithTimeIntervalSinceNow(wait.as_secs_f64());
            while let Some(event) = unsafe {
                app.nextEventMatchingMask_untilDate_inMode_dequeue(
                    objc2_app_kit::NSEventMask::Any,
                    Some(&date),
                    objc2_foundation::NSDefaultRunLoopMode,
                    true,
                )
            } {
                log::trace!("Event type: {:?}", event.r#type());
                app.sendEvent(&event);
                app.updateWindows();
            }

            let now = Instant::now();
            for input in drain_inputs() {
                self.handle_input(input, now);
            }

            self.controller.tick(now);
            self.poll_battery(now);
            self.check_config();
            self.publish();
        }
    }

    fn handle_input(&mut self, input: IslandInput, now: Instant) {
        log::trace!("Input: {:?}", input);
        match input {
            IslandInput::Pointer(hovering) => self.controller.hover_changed(hovering, now),
            IslandInput::Tap => self.controller.tap(now),
            IslandInput::DisplayChanged => {
                self.controller.display_changed();
                self.refresh_radii();
            }
            IslandInput::Command(command) => match command {
                IpcCommand::Reposition => {
                    self.controller.reposition();
                    self.refresh_radii();
                }
                IpcCommand::Expand => self.controller.expand(now),
                IpcCommand::Collapse => self.controller.collapse(now),
                IpcCommand::Toggle => self.controller.tap(now),
                IpcCommand::Reload => self.reload(load_config()),
            },
        }
    }

    fn refresh_radii(&self) {
        let geometry = self.controller.geometry();
        self.view
            .set_corner_radii(geometry.corner_radius(false), geometry.corner_radius(true));
    }

    fn poll_battery(&mut self, now: Instant) {
        if !self.battery_timer.should_run(now) {
            return;
        }
        if let Some(snapshot) = self.battery.poll() {
            self.view.set_summary(Some(snapshot.summary()));
            self.controller.charge_changed(snapshot, now);
        }
    }

    fn check_config(&mut self) {
        let reloaded = self
            .config_watcher
            .as_mut()
            .and_then(|watcher| watcher.check_and_reload());
        if let Some(config) = reloaded {
            self.reload(config);
        }
    }

    fn reload(&mut self, config: Config) {
        apply_config(&mut self.controller, &config);
        self.battery_timer.set_interval(config.poll_interval());
        self.view.set_painter(IslandPainter::new(&config.island));
        log::info!("Config reloaded");
    }

    fn publish(&mut self) {
        let model = self.controller.model();
        let charge = self.battery.last();
        let status = IslandStatus {
            state: model.state.as_str().to_string(),
            expanded: model.state.is_expanded(),
            hovering: model.hovering,
            suppressed_charge: model.suppressed_charge,
            has_notch: self.controller.geometry().has_notch(),
            battery_level: charge.map(|c| c.level),
            charging_state: charge.map(|c| c.state.as_str().to_string()),
        };

        if self.last_status.as_ref() != Some(&status) {
            publish_status(status.clone());
            self.last_status = Some(status);
        }
    }
}

fn apply_config(controller: &mut ExpansionController<MainScreen>, config: &Config) {
    controller.set_timings(config.timings());
    controller.set_animation_duration(config.animation_duration());
    controller.set_expand_on_plug(config.charging.expand_on_plug);
}
