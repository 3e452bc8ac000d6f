use embedded_graphics::{
    image::{Image, ImageRaw},
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle},
};

use embedded_text::{
    alignment::{HorizontalAlignment, VerticalAlignment},
    style::TextBoxStyleBuilder,
    TextBox,
};

use crate::glyphs::Glyph;

/// Clears a rectangular region of the target buffer to background color (BinaryColor::Off).
pub fn clear_region<D>(target: &mut D, region: Rectangle) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    region
        .into_styled(
            PrimitiveStyleBuilder::new()
                .fill_color(BinaryColor::Off)
                .build(),
        )
        .draw(target)?;
    Ok(())
}

/// Draws text inside a region, clipped to it, vertically centered.
pub fn draw_text_region<D>(
    target: &mut D,
    text: &str,
    region: Rectangle,
    halign: HorizontalAlignment,
    font: &MonoFont,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let character_style = MonoTextStyle::new(font, BinaryColor::On);
    let textbox_style = TextBoxStyleBuilder::new()
        .alignment(halign)
        .vertical_alignment(VerticalAlignment::Middle)
        .build();
    let label_box = TextBox::with_textbox_style(text, region, character_style, textbox_style);
    label_box.draw(target)?;
    Ok(())
}

/// Draws an outlined bar whose fill width is proportional to `fraction`.
/// Out-of-range fractions are clamped to [0,1], never an error.
pub fn draw_bar<D>(target: &mut D, region: Rectangle, fraction: f64) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let frac = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };

    region
        .into_styled(
            PrimitiveStyleBuilder::new()
                .stroke_color(BinaryColor::On)
                .stroke_width(1)
                .fill_color(BinaryColor::Off)
                .build(),
        )
        .draw(target)?;

    let inner_w = region.size.width.saturating_sub(2);
    let inner_h = region.size.height.saturating_sub(2);
    let fill = (frac * f64::from(inner_w)).round() as u32;
    if fill > 0 && inner_h > 0 {
        Rectangle::new(region.top_left + Point::new(1, 1), Size::new(fill, inner_h))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(target)?;
    }
    Ok(())
}

/// Blits a 1bpp glyph centered in the region.
pub fn draw_glyph<D>(target: &mut D, region: Rectangle, glyph: &Glyph) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let raw = ImageRaw::<BinaryColor>::new(glyph.data, glyph.width);
    let dx = region.size.width.saturating_sub(glyph.width) / 2;
    let dy = region.size.height.saturating_sub(glyph.height) / 2;
    Image::new(&raw, region.top_left + Point::new(dx as i32, dy as i32)).draw(target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::glyphs;

    fn bar_frame(fraction: f64) -> Frame {
        let mut frame = Frame::new(60, 16, BinaryColor::Off);
        let region = Rectangle::new(Point::new(2, 3), Size::new(52, 10));
        draw_bar(&mut frame, region, fraction).unwrap();
        frame
    }

    /// Lit pixels on the bar's middle row: 2 border pixels plus the fill run.
    fn lit_mid_row(frame: &Frame) -> u32 {
        let y = 3 + 5;
        (0..60)
            .filter(|&x| frame.get(Point::new(x, y)) == Some(BinaryColor::On))
            .count() as u32
    }

    #[test]
    fn bar_fill_is_proportional() {
        let inner = 50.0;
        for v in [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0] {
            let frame = bar_frame(v);
            let expected = (v * inner).round() as u32 + 2;
            assert_eq!(lit_mid_row(&frame), expected, "fraction {v}");
        }
    }

    #[test]
    fn bar_out_of_range_equals_clamped() {
        assert_eq!(bar_frame(1.37).as_slice(), bar_frame(1.0).as_slice());
        assert_eq!(bar_frame(-0.5).as_slice(), bar_frame(0.0).as_slice());
        assert_eq!(bar_frame(f64::NAN).as_slice(), bar_frame(0.0).as_slice());
    }

    #[test]
    fn glyph_lands_centered_inside_region() {
        let mut frame = Frame::new(64, 64, BinaryColor::Off);
        let region = Rectangle::new(Point::new(10, 10), Size::new(40, 40));
        draw_glyph(&mut frame, region, &glyphs::SOLAR).unwrap();

        // 24x24 glyph centered in 40x40 -> offset (18,18)
        for x in 0..64 {
            for y in 0..64 {
                if frame.get(Point::new(x, y)) == Some(BinaryColor::On) {
                    assert!((18..42).contains(&x) && (18..42).contains(&y));
                }
            }
        }
        assert!(frame.as_slice().iter().any(|c| c.is_on()));
    }

    #[test]
    fn text_stays_inside_its_region() {
        use embedded_graphics::mono_font::iso_8859_1::FONT_6X10;

        let mut frame = Frame::new(120, 40, BinaryColor::Off);
        let region = Rectangle::new(Point::new(20, 8), Size::new(80, 16));
        draw_text_region(
            &mut frame,
            "21.4°C",
            region,
            HorizontalAlignment::Right,
            &FONT_6X10,
        )
        .unwrap();

        let mut lit = 0;
        for x in 0..120 {
            for y in 0..40 {
                if frame.get(Point::new(x, y)) == Some(BinaryColor::On) {
                    lit += 1;
                    assert!((20..100).contains(&x) && (8..24).contains(&y));
                }
            }
        }
        assert!(lit > 0);
    }
}
