use std::collections::HashMap;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::warn;

use crate::draw;
use crate::glyphs::{self, Glyph};
use crate::values::Value;

/// Maps a discrete state value to a pre-loaded glyph. With no data-key the
/// widget is a static decoration and always draws its one glyph.
#[derive(Debug, Clone, Default)]
pub struct IconWidget {
    pub fixed: Option<&'static Glyph>,
    pub map: HashMap<String, &'static Glyph>,
}

impl IconWidget {
    /// An unmapped value is a reported condition, not an error: it gets the
    /// placeholder glyph and a log line.
    pub fn pick(&self, value: Option<&Value>) -> &'static Glyph {
        if let Some(glyph) = self.fixed {
            return glyph;
        }
        match value {
            None => &glyphs::PLACEHOLDER,
            Some(v) => {
                let state = v.to_string();
                match self.map.get(&state) {
                    Some(glyph) => glyph,
                    None => {
                        warn!("no icon mapped for state '{state}', showing placeholder");
                        &glyphs::PLACEHOLDER
                    }
                }
            }
        }
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
        draw::draw_glyph(target, region, self.pick(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapped() -> IconWidget {
        let mut map = HashMap::new();
        map.insert("charging".to_string(), &glyphs::PLUG);
        map.insert("solar".to_string(), &glyphs::SOLAR);
        IconWidget { fixed: None, map }
    }

    #[test]
    fn mapped_states_resolve() {
        let w = mapped();
        assert!(std::ptr::eq(
            w.pick(Some(&Value::Text("charging".into()))),
            &glyphs::PLUG
        ));
    }

    #[test]
    fn unmapped_states_get_the_placeholder() {
        let w = mapped();
        assert!(std::ptr::eq(
            w.pick(Some(&Value::Text("discharging".into()))),
            &glyphs::PLACEHOLDER
        ));
        assert!(std::ptr::eq(w.pick(None), &glyphs::PLACEHOLDER));
    }

    #[test]
    fn fixed_icon_ignores_the_value() {
        let w = IconWidget { fixed: Some(&glyphs::BATTERY), map: HashMap::new() };
        assert!(std::ptr::eq(
            w.pick(Some(&Value::Text("whatever".into()))),
            &glyphs::BATTERY
        ));
    }
}
