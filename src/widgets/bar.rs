use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::warn;

use crate::draw;
use crate::glyphs;
use crate::values::Value;

/// Outlined progress bar scaling a numeric value between `min` and `max`.
#[derive(Debug, Clone)]
pub struct BarWidget {
    pub min: f64,
    pub max: f64,
}

impl Default for BarWidget {
    fn default() -> Self {
        Self { min: 0.0, max: 100.0 }
    }
}

impl BarWidget {
    /// Raw fill fraction; clamping happens at draw time.
    pub fn fraction(&self, value: Option<&Value>) -> Option<f64> {
        let n = value?.as_f64()?;
        let span = self.max - self.min;
        if span <= 0.0 {
            return None;
        }
        Some((n - self.min) / span)
    }

    pub fn render<D>(
        &self,
        target: &mut D,
        region: Rectangle,
        value: Option<&Value>,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        match self.fraction(value) {
            Some(frac) => draw::draw_bar(target, region, frac),
            None => {
                if let Some(v) = value {
                    warn!("progress bar expected a number, got '{v}'");
                }
                draw::draw_glyph(target, region, &glyphs::NO_DATA)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn rendered(widget: &BarWidget, value: Option<&Value>) -> Frame {
        let mut frame = Frame::new(64, 20, BinaryColor::Off);
        let region = Rectangle::new(Point::new(4, 4), Size::new(56, 12));
        widget.render(&mut frame, region, value).unwrap();
        frame
    }

    #[test]
    fn scales_between_min_and_max() {
        let w = BarWidget { min: 10.0, max: 20.0 };
        assert_eq!(w.fraction(Some(&Value::Number(15.0))), Some(0.5));
        assert_eq!(w.fraction(Some(&Value::Number(10.0))), Some(0.0));
        assert_eq!(w.fraction(Some(&Value::Number(25.0))), Some(1.5));
    }

    #[test]
    fn half_full_matches_direct_bar_draw() {
        let w = BarWidget::default();
        let got = rendered(&w, Some(&Value::Number(50.0)));

        let mut want = Frame::new(64, 20, BinaryColor::Off);
        let region = Rectangle::new(Point::new(4, 4), Size::new(56, 12));
        draw::draw_bar(&mut want, region, 0.5).unwrap();

        assert_eq!(got.as_slice(), want.as_slice());
    }

    #[test]
    fn non_numeric_renders_no_data_glyph() {
        let w = BarWidget::default();
        let got = rendered(&w, Some(&Value::Text("offline".into())));

        let mut want = Frame::new(64, 20, BinaryColor::Off);
        let region = Rectangle::new(Point::new(4, 4), Size::new(56, 12));
        draw::draw_glyph(&mut want, region, &glyphs::NO_DATA).unwrap();

        assert_eq!(got.as_slice(), want.as_slice());
        assert_eq!(rendered(&w, None).as_slice(), want.as_slice());
    }
}
