use embedded_graphics::mono_font::iso_8859_1::{FONT_6X10, FONT_9X15, FONT_10X20};
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_text::alignment::HorizontalAlignment;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::draw;
use crate::values::Value;

/// Horizontal alignment of text inside its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl HAlign {
    pub(crate) fn horizontal(self) -> HorizontalAlignment {
        match self {
            HAlign::Left => HorizontalAlignment::Left,
            HAlign::Center => HorizontalAlignment::Center,
            HAlign::Right => HorizontalAlignment::Right,
        }
    }
}

/// Built-in font sizes; the panel is too coarse for anything fancier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontChoice {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontChoice {
    pub(crate) fn font(self) -> &'static MonoFont<'static> {
        match self {
            FontChoice::Small => &FONT_6X10,
            FontChoice::Medium => &FONT_9X15,
            FontChoice::Large => &FONT_10X20,
        }
    }
}

/// A single line of text, optionally formatted as a fixed-decimal number
/// with a unit suffix.
#[derive(Debug, Clone, Default)]
pub struct TextWidget {
    pub font: FontChoice,
    pub halign: HAlign,
    /// When set, the value is formatted numerically with this many decimals.
    pub decimals: Option<u32>,
    /// Appended verbatim; include a leading space for `21.4 V` style units.
    pub suffix: String,
    /// Shown while the key has no reading, or a numeric widget gets text.
    pub fallback: String,
}

impl TextWidget {
    pub fn format(&self, value: Option<&Value>) -> String {
        let body = match value {
            None => self.fallback.clone(),
            Some(v) => match self.decimals {
                Some(dec) => match v.as_f64() {
                    Some(n) => format!("{:.*}", dec as usize, n),
                    None => {
                        warn!("text widget expected a number, got '{v}'");
                        self.fallback.clone()
                    }
                },
                None => v.to_string(),
            },
        };

        if body.is_empty() {
            return body;
        }
        format!("{}{}", body, self.suffix)
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
        let text = self.format(value);
        if text.is_empty() {
            return Ok(());
        }
        draw::draw_text_region(target, &text, region, self.halign.horizontal(), self.font.font())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_formatting_with_suffix() {
        let w = TextWidget {
            decimals: Some(1),
            suffix: "°C".into(),
            ..Default::default()
        };
        assert_eq!(w.format(Some(&Value::Number(21.37))), "21.4°C");
        assert_eq!(w.format(Some(&Value::Number(-0.04))), "-0.0°C");
    }

    #[test]
    fn spaced_suffix_keeps_its_space() {
        let w = TextWidget {
            decimals: Some(0),
            suffix: " V".into(),
            ..Default::default()
        };
        assert_eq!(w.format(Some(&Value::Number(12.6))), "13 V");
    }

    #[test]
    fn missing_or_malformed_values_fall_back() {
        let w = TextWidget {
            decimals: Some(1),
            suffix: "%".into(),
            fallback: "--".into(),
            ..Default::default()
        };
        assert_eq!(w.format(None), "--%");
        assert_eq!(w.format(Some(&Value::Text("soon".into()))), "--%");
    }

    #[test]
    fn plain_text_passes_through() {
        let w = TextWidget::default();
        assert_eq!(w.format(Some(&Value::Text("charging".into()))), "charging");
        assert_eq!(w.format(None), "");
    }
}
