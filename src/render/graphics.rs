use core_foundation::base::TCFType;
use core_foundation::string::CFString;
use core_graphics::context::CGContext;
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_text::font::CTFont;
use foreign_types::ForeignType;

use crate::config::{parse_hex_color, IslandConfig};

/// Draws the island shape and its battery line into a CoreGraphics context.
pub struct IslandPainter {
    fill_color: (f64, f64, f64, f64),
    text_color: (f64, f64, f64, f64),
    font: CTFont,
}

impl IslandPainter {
    pub fn new(config: &IslandConfig) -> Self {
        let fill_color = parse_hex_color(&config.background_color).unwrap_or((0.0, 0.0, 0.0, 1.0));
        let text_color = parse_hex_color(&config.text_color).unwrap_or((1.0, 1.0, 1.0, 1.0));

        let font = core_text::font::new_from_name(&config.font_family, config.font_size)
            .unwrap_or_else(|_| {
                log::warn!(
                    "Failed to load font '{}', using Helvetica",
                    config.font_family
                );
                core_text::font::new_from_name("Helvetica", config.font_size)
                    .expect("Failed to load fallback font")
            });

        Self {
            fill_color,
            text_color,
            font,
        }
    }

    pub fn clear(&self, ctx: &mut CGContext, width: f64, height: f64) {
        ctx.clear_rect(CGRect::new(
            &CGPoint::new(0.0, 0.0),
            &CGSize::new(width, height),
        ));
    }

    /// Fills the island shape: a rectangle with rounded corners of `radius`.
    pub fn fill_island(&self, ctx: &mut CGContext, width: f64, height: f64, radius: f64) {
        let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
        let (red, green, blue, alpha) = self.fill_color;
        ctx.set_rgb_fill_color(red, green, blue, alpha);

        ctx.move_to_point(r, 0.0);
        ctx.add_line_to_point(width - r, 0.0);
        ctx.add_quad_curve_to_point(width, 0.0, width, r);
        ctx.add_line_to_point(width, height - r);
        ctx.add_quad_curve_to_point(width, height, width - r, height);
        ctx.add_line_to_point(r, height);
        ctx.add_quad_curve_to_point(0.0, height, 0.0, height - r);
        ctx.add_line_to_point(0.0, r);
        ctx.add_quad_curve_to_point(0.0, 0.0, r, 0.0);
        ctx.close_path();
        ctx.fill_path();
    }

    /// Draws `text` centered in a `width` x `height` box.
    pub fn draw_centered_text(&self, ctx: &mut CGContext, text: &str, width: f64, height: f64) {
        let text_width = self.measure_text(text);
        let x = (width - text_width) / 2.0;
        let y = (height - self.font_height()) / 2.0 + self.font.descent();
        self.draw_text(ctx, text, x, y);
    }

    fn attributed_line(&self, text: &str) -> core_text::line::CTLine {
        use core_foundation::attributed_string::CFMutableAttributedString;
        use core_foundation::base::CFRange;
        use core_text::line::CTLine;
        use core_text::string_attributes::kCTFontAttributeName;

        let cf_string = CFString::new(text);
        let mut attr_string = CFMutableAttributedString::new();
        attr_string.replace_str(&cf_string, CFRange::init(0, 0));

        // CFRange counts UTF-16 units, not bytes
        let range = CFRange::init(0, cf_string.char_len());

        unsafe {
            attr_string.set_attribute(range, kCTFontAttributeName, &self.font);
        }

        CTLine::new_with_attributed_string(attr_string.as_concrete_TypeRef())
    }

    pub fn draw_text(&self, ctx: &mut CGContext, text: &str, x: f64, y: f64) {
        let line = self.attributed_line(text);

        let (r, g, b, a) = self.text_color;
        let color = core_graphics::color::CGColor::rgb(r, g, b, a);
        ctx.set_fill_color(&color);

        let identity = core_graphics::geometry::CGAffineTransform {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        };
        ctx.set_text_matrix(&identity);
        ctx.set_text_position(x, y);

        unsafe {
            use core_text::line::CTLineRef;
            unsafe extern "C" {
                fn CTLineDraw(line: CTLineRef, context: core_graphics::sys::CGContextRef);
            }
            CTLineDraw(line.as_concrete_TypeRef(), ctx.as_ptr());
        }
    }

    pub fn measure_text(&self, text: &str) -> f64 {
        self.attributed_line(text).get_typographic_bounds().width
    }

    pub fn font_height(&self) -> f64 {
        self.font.ascent() + self.font.descent()
    }
}
