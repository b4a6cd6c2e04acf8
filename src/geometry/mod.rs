//! Notch detection and island placement.
//!
//! Everything here works in AppKit screen coordinates (bottom-left origin,
//! points). The display itself is behind [`DisplaySource`] so the resolver can
//! be driven by a fake screen in tests.

#[cfg(target_os = "macos")]
mod display;

#[cfg(target_os = "macos")]
pub use display::MainScreen;

use std::cell::Cell;

/// Safe-area insets at or below this are treated as "no notch".
const NOTCH_INSET_THRESHOLD: f64 = 5.0;

/// Island drawn on displays without a notch.
const FALLBACK_SIZE: Size = Size::new(160.0, 32.0);
/// Gap between the top of the screen and the fallback island.
const FALLBACK_TOP_MARGIN: f64 = 8.0;

const EXPANDED_SIZE: Size = Size::new(380.0, 64.0);
const EXPANDED_CORNER_RADIUS: f64 = 22.0;
const MAX_COLLAPSED_CORNER_RADIUS: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Y coordinate of the top edge (bottom-left origin).
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }
}

/// What the display collaborator reports about the active screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    pub frame: Rect,
    /// Top safe-area inset in points. Non-zero on notched MacBooks.
    pub safe_area_top: f64,
    /// Pixels per point.
    pub backing_scale: f64,
}

impl DisplayMetrics {
    /// Horizontal resolution in pixels, used to pick a notch size tier.
    pub fn pixel_width(&self) -> f64 {
        self.frame.width * self.backing_scale
    }
}

/// Source of the active display's metrics.
pub trait DisplaySource {
    /// Returns `None` when no display is attached.
    fn active_display(&self) -> Option<DisplayMetrics>;
}

impl<T: DisplaySource + ?Sized> DisplaySource for Box<T> {
    fn active_display(&self) -> Option<DisplayMetrics> {
        (**self).active_display()
    }
}

/// Notch rectangle plus whether it is a real notch or the fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    pub notch_rect: Rect,
    pub has_notch: bool,
}

/// Notch size for a display of the given pixel width.
///
/// The fixed tiers are the measured notch sizes of the 16", 14" and 13"/15"
/// panels; anything smaller gets a proportional estimate.
pub fn notch_dimensions(screen_width: f64, safe_area_top: f64) -> Size {
    if screen_width >= 3456.0 {
        Size::new(216.0, 32.0)
    } else if screen_width >= 3024.0 {
        Size::new(200.0, 30.0)
    } else if screen_width >= 2560.0 {
        Size::new(190.0, 28.0)
    } else {
        Size::new(
            (screen_width * 0.08).clamp(160.0, 220.0),
            (safe_area_top * 0.9).clamp(24.0, 35.0),
        )
    }
}

/// Resolves notch geometry and island placement for the active display.
///
/// Results are cached until [`GeometryResolver::invalidate_cache`] is called,
/// which must happen on every display-configuration change.
pub struct GeometryResolver<D> {
    display: D,
    cache: Cell<Option<DisplayGeometry>>,
}

impl<D: DisplaySource> GeometryResolver<D> {
    pub fn new(display: D) -> Self {
        Self {
            display,
            cache: Cell::new(None),
        }
    }

    /// Cached geometry, computing it on the first query of a cache epoch.
    ///
    /// A missing display is not cached so the next query tries again.
    pub fn display_geometry(&self) -> Option<DisplayGeometry> {
        if let Some(cached) = self.cache.get() {
            return Some(cached);
        }

        let Some(metrics) = self.display.active_display() else {
            log::debug!("No active display; geometry unavailable");
            return None;
        };

        let geometry = compute_geometry(&metrics);
        log::debug!(
            "Resolved notch geometry: has_notch={}, rect=({:.1}, {:.1}) {:.1}x{:.1}",
            geometry.has_notch,
            geometry.notch_rect.x,
            geometry.notch_rect.y,
            geometry.notch_rect.width,
            geometry.notch_rect.height
        );
        self.cache.set(Some(geometry));
        Some(geometry)
    }

    pub fn has_notch(&self) -> bool {
        self.display_geometry().is_some_and(|g| g.has_notch)
    }

    /// The notch rectangle, or the centered fallback on notchless displays.
    /// `None` only when there is no display at all.
    pub fn notch_rect(&self) -> Option<Rect> {
        self.display_geometry().map(|g| g.notch_rect)
    }

    pub fn optimal_island_size(&self, expanded: bool) -> Size {
        if expanded {
            return EXPANDED_SIZE;
        }
        self.notch_rect()
            .map(|rect| rect.size())
            .unwrap_or(FALLBACK_SIZE)
    }

    /// Origin that centers the island on the notch rectangle.
    pub fn island_position(&self, expanded: bool) -> Option<Point> {
        let notch = self.notch_rect()?;
        let size = self.optimal_island_size(expanded);
        Some(Point::new(
            notch.mid_x() - size.width / 2.0,
            notch.mid_y() - size.height / 2.0,
        ))
    }

    pub fn island_frame(&self, expanded: bool) -> Option<Rect> {
        let origin = self.island_position(expanded)?;
        Some(Rect::from_origin_size(
            origin,
            self.optimal_island_size(expanded),
        ))
    }

    pub fn corner_radius(&self, expanded: bool) -> f64 {
        if expanded {
            return EXPANDED_CORNER_RADIUS;
        }
        let height = self
            .notch_rect()
            .map(|rect| rect.height)
            .unwrap_or(FALLBACK_SIZE.height);
        (height / 2.0).min(MAX_COLLAPSED_CORNER_RADIUS)
    }

    pub fn invalidate_cache(&self) {
        log::debug!("Invalidating notch geometry cache");
        self.cache.set(None);
    }
}

fn compute_geometry(metrics: &DisplayMetrics) -> DisplayGeometry {
    let frame = metrics.frame;

    if metrics.safe_area_top > NOTCH_INSET_THRESHOLD {
        let size = notch_dimensions(metrics.pixel_width(), metrics.safe_area_top);
        let notch_rect = Rect::new(
            frame.x + (frame.width - size.width) / 2.0,
            frame.max_y() - size.height,
            size.width,
            size.height,
        );
        return DisplayGeometry {
            notch_rect,
            has_notch: true,
        };
    }

    let notch_rect = Rect::new(
        frame.x + (frame.width - FALLBACK_SIZE.width) / 2.0,
        frame.max_y() - FALLBACK_SIZE.height - FALLBACK_TOP_MARGIN,
        FALLBACK_SIZE.width,
        FALLBACK_SIZE.height,
    );
    DisplayGeometry {
        notch_rect,
        has_notch: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    /// Fake display whose metrics can be swapped and whose queries are counted.
    #[derive(Clone, Default)]
    struct FakeDisplay {
        metrics: Rc<Cell<Option<DisplayMetrics>>>,
        queries: Rc<Cell<usize>>,
    }

    impl FakeDisplay {
        fn with(width: f64, height: f64, safe_area_top: f64) -> Self {
            let display = Self::default();
            display.set(width, height, safe_area_top);
            display
        }

        fn set(&self, width: f64, height: f64, safe_area_top: f64) {
            self.metrics.set(Some(DisplayMetrics {
                frame: Rect::new(0.0, 0.0, width, height),
                safe_area_top,
                backing_scale: 1.0,
            }));
        }
    }

    impl DisplaySource for FakeDisplay {
        fn active_display(&self) -> Option<DisplayMetrics> {
            self.queries.set(self.queries.get() + 1);
            self.metrics.get()
        }
    }

    #[test]
    fn test_small_inset_uses_fallback_rect() {
        for inset in [0.0, 2.5, 5.0] {
            let resolver = GeometryResolver::new(FakeDisplay::with(1920.0, 1080.0, inset));
            assert!(!resolver.has_notch());
            assert_eq!(
                resolver.notch_rect(),
                Some(Rect::new(880.0, 1040.0, 160.0, 32.0))
            );
        }
    }

    #[test]
    fn test_notch_tiers() {
        let cases = [
            (3456.0, Size::new(216.0, 32.0)),
            (3024.0, Size::new(200.0, 30.0)),
            (2560.0, Size::new(190.0, 28.0)),
            (4000.0, Size::new(216.0, 32.0)),
        ];
        for (width, expected) in cases {
            let resolver = GeometryResolver::new(FakeDisplay::with(width, 2000.0, 32.0));
            assert!(resolver.has_notch());
            let rect = resolver.notch_rect().unwrap();
            assert_eq!(rect.size(), expected, "width {}", width);
            assert_eq!(rect.max_y(), 2000.0);
            assert_eq!(rect.mid_x(), width / 2.0);
        }
    }

    #[test]
    fn test_proportional_estimate_below_tiers() {
        assert_eq!(notch_dimensions(1920.0, 32.0), Size::new(160.0, 32.0 * 0.9));
        assert_eq!(notch_dimensions(2500.0, 50.0), Size::new(200.0, 35.0));
        assert_eq!(notch_dimensions(1000.0, 10.0), Size::new(160.0, 24.0));
    }

    #[test]
    fn test_tier_uses_pixel_width() {
        let display = FakeDisplay::default();
        display.metrics.set(Some(DisplayMetrics {
            frame: Rect::new(0.0, 0.0, 1728.0, 1117.0),
            safe_area_top: 32.0,
            backing_scale: 2.0,
        }));
        let resolver = GeometryResolver::new(display);
        assert_eq!(
            resolver.notch_rect().map(|r| r.size()),
            Some(Size::new(216.0, 32.0))
        );
    }

    #[test]
    fn test_expanded_size_is_fixed() {
        let notched = GeometryResolver::new(FakeDisplay::with(3024.0, 1964.0, 38.0));
        let plain = GeometryResolver::new(FakeDisplay::with(1920.0, 1080.0, 0.0));
        let missing = GeometryResolver::new(FakeDisplay::default());
        for resolver in [&notched, &plain, &missing] {
            assert_eq!(resolver.optimal_island_size(true), Size::new(380.0, 64.0));
        }
    }

    #[test]
    fn test_collapsed_size_matches_notch() {
        let resolver = GeometryResolver::new(FakeDisplay::with(3024.0, 1964.0, 38.0));
        assert_eq!(resolver.optimal_island_size(false), Size::new(200.0, 30.0));
    }

    #[test]
    fn test_island_position_centers_over_notch() {
        let resolver = GeometryResolver::new(FakeDisplay::with(3456.0, 2234.0, 38.0));
        let notch = resolver.notch_rect().unwrap();
        for expanded in [false, true] {
            let size = resolver.optimal_island_size(expanded);
            let pos = resolver.island_position(expanded).unwrap();
            assert_eq!(pos.x + size.width / 2.0, notch.x + notch.width / 2.0);
            assert_eq!(pos.y + size.height / 2.0, notch.y + notch.height / 2.0);
        }
    }

    #[test]
    fn test_no_display_degrades() {
        let resolver = GeometryResolver::new(FakeDisplay::default());
        assert!(!resolver.has_notch());
        assert_eq!(resolver.notch_rect(), None);
        assert_eq!(resolver.island_position(false), None);
        assert_eq!(resolver.island_frame(true), None);
        assert_eq!(resolver.optimal_island_size(false), Size::new(160.0, 32.0));
        assert_eq!(resolver.corner_radius(false), 16.0);
    }

    #[test]
    fn test_notch_rect_is_cached() {
        let display = FakeDisplay::with(3024.0, 1964.0, 38.0);
        let resolver = GeometryResolver::new(display.clone());

        let first = resolver.notch_rect();
        display.set(1920.0, 1080.0, 0.0);
        let second = resolver.notch_rect();

        assert_eq!(first, second);
        assert!(resolver.has_notch());
        assert_eq!(display.queries.get(), 1);

        resolver.invalidate_cache();
        assert!(!resolver.has_notch());
        assert_eq!(
            resolver.notch_rect().map(|r| r.size()),
            Some(Size::new(160.0, 32.0))
        );
        assert_eq!(display.queries.get(), 2);
    }

    #[test]
    fn test_missing_display_is_not_cached() {
        let display = FakeDisplay::default();
        let resolver = GeometryResolver::new(display.clone());
        assert_eq!(resolver.notch_rect(), None);

        display.set(3456.0, 2234.0, 38.0);
        assert!(resolver.has_notch());
    }

    #[test]
    fn test_corner_radius() {
        let resolver = GeometryResolver::new(FakeDisplay::with(2560.0, 1600.0, 32.0));
        assert_eq!(resolver.corner_radius(false), 14.0);
        assert_eq!(resolver.corner_radius(true), 22.0);

        let tall = GeometryResolver::new(FakeDisplay::with(2500.0, 1600.0, 50.0));
        assert_eq!(resolver.corner_radius(true), tall.corner_radius(true));
        assert_eq!(tall.corner_radius(false), 17.5);
    }
}
