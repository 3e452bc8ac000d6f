/*
 *  layout.rs
 *
 *  InkMonS - data on slow glass
 *	(c) 2023-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use std::collections::HashMap;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use log::info;

use crate::config::{Config, ConfigError, WidgetConfig, WidgetKind};
use crate::frame::Frame;
use crate::glyphs;
use crate::values::ValueStore;
use crate::widgets::{BarWidget, IconWidget, TextWidget, Widget};

/// One widget bound to a screen region and (usually) a data-key.
/// Key-less bindings are static decorations.
#[derive(Debug, Clone)]
pub struct Binding {
    pub widget: Widget,
    pub region: Rectangle,
    pub key: Option<String>,
}

/// The whole screen: an ordered set of bindings composed into one frame.
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct Dashboard {
    width: u32,
    height: u32,
    border: u32,
    bindings: Vec<Binding>,
}

impl Dashboard {
    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        let display = cfg.display_or_default();
        let bindings = if cfg.widgets.is_empty() {
            info!("no widgets configured, using the built-in battery/solar demo");
            demo_bindings()
        } else {
            cfg.widgets.iter().map(build_binding).collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            width: display.width(),
            height: display.height(),
            border: display.border(),
            bindings,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Data-keys to subscribe to, deduplicated, in binding order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for binding in &self.bindings {
            if let Some(key) = &binding.key {
                if !keys.iter().any(|k| k == key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Compose a full frame from a value snapshot. Always returns a frame
    /// at the declared panel dimensions.
    pub fn render(&self, values: &ValueStore) -> Frame {
        let mut frame = Frame::new(self.width, self.height, BinaryColor::Off);

        if self.border > 0 {
            // screen outline, a panel-edge aid for the preview window
            Rectangle::new(Point::zero(), Size::new(self.width, self.height))
                .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
                .draw(&mut frame)
                .ok();
        }

        for binding in &self.bindings {
            let value = binding.key.as_deref().and_then(|k| values.get(k));
            binding.widget.render(&mut frame, binding.region, value).ok();
        }
        frame
    }
}

fn build_binding(cfg: &WidgetConfig) -> Result<Binding, ConfigError> {
    let region = Rectangle::new(Point::new(cfg.x, cfg.y), Size::new(cfg.w, cfg.h));

    let widget = match cfg.kind {
        WidgetKind::Text => Widget::Text(TextWidget {
            font: cfg.font.unwrap_or_default(),
            halign: cfg.halign.unwrap_or_default(),
            decimals: cfg.decimals,
            suffix: cfg.suffix.clone().unwrap_or_default(),
            fallback: cfg.fallback.clone().unwrap_or_default(),
        }),
        WidgetKind::Bar => Widget::Bar(BarWidget {
            min: cfg.min.unwrap_or(0.0),
            max: cfg.max.unwrap_or(100.0),
        }),
        WidgetKind::Icon => {
            if let Some(name) = &cfg.icon {
                let glyph = glyphs::lookup(name).ok_or_else(|| {
                    ConfigError::Validation(format!("unknown icon '{name}'"))
                })?;
                Widget::Icon(IconWidget { fixed: Some(glyph), map: HashMap::new() })
            } else {
                let mut map = HashMap::new();
                for (state, name) in &cfg.map {
                    let glyph = glyphs::lookup(name).ok_or_else(|| {
                        ConfigError::Validation(format!("unknown icon '{name}' for state '{state}'"))
                    })?;
                    map.insert(state.clone(), glyph);
                }
                Widget::Icon(IconWidget { fixed: None, map })
            }
        }
    };

    Ok(Binding { widget, region, key: cfg.key.clone() })
}

/// The classic battery/solar demo screen for a 296x128 landscape panel.
fn demo_bindings() -> Vec<Binding> {
    let m = 10; // demo margin

    let reading = |dec: u32, suffix: &str| TextWidget {
        font: crate::widgets::FontChoice::Large,
        halign: crate::widgets::HAlign::Right,
        decimals: Some(dec),
        suffix: suffix.into(),
        fallback: "--".into(),
    };

    vec![
        Binding {
            widget: Widget::Icon(IconWidget { fixed: Some(&glyphs::BATTERY), map: HashMap::new() }),
            region: Rectangle::new(Point::new(m, m + 4), Size::new(24, 24)),
            key: None,
        },
        Binding {
            widget: Widget::Text(reading(0, "%")),
            region: Rectangle::new(Point::new(m + 34, m + 4), Size::new(64, 24)),
            key: Some("battery/load".into()),
        },
        Binding {
            widget: Widget::Text(reading(1, " V")),
            region: Rectangle::new(Point::new(m + 108, m + 4), Size::new(78, 24)),
            key: Some("battery/voltage".into()),
        },
        Binding {
            widget: Widget::Text(reading(1, " A")),
            region: Rectangle::new(Point::new(m + 196, m + 4), Size::new(80, 24)),
            key: Some("battery/current".into()),
        },
        Binding {
            widget: Widget::Bar(BarWidget { min: 0.0, max: 100.0 }),
            region: Rectangle::new(Point::new(m + 34, m + 36), Size::new(242, 14)),
            key: Some("battery/load".into()),
        },
        Binding {
            widget: Widget::Icon(IconWidget { fixed: Some(&glyphs::SOLAR), map: HashMap::new() }),
            region: Rectangle::new(Point::new(m, m + 64), Size::new(24, 24)),
            key: None,
        },
        Binding {
            widget: Widget::Text(reading(0, " W")),
            region: Rectangle::new(Point::new(m + 34, m + 64), Size::new(64, 24)),
            key: Some("solar/power".into()),
        },
        Binding {
            widget: Widget::Text(reading(1, " V")),
            region: Rectangle::new(Point::new(m + 108, m + 64), Size::new(78, 24)),
            key: Some("solar/voltage".into()),
        },
        Binding {
            widget: Widget::Text(reading(1, " A")),
            region: Rectangle::new(Point::new(m + 196, m + 64), Size::new(80, 24)),
            key: Some("solar/current".into()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Value;

    fn demo_config() -> Config {
        Config::default()
    }

    #[test]
    fn frame_always_has_panel_dimensions() {
        let dash = Dashboard::from_config(&demo_config()).unwrap();
        let empty = ValueStore::new();
        let frame = dash.render(&empty);
        assert_eq!((frame.width(), frame.height()), (dash.width(), dash.height()));
    }

    #[test]
    fn keys_are_deduplicated_in_order() {
        let dash = Dashboard::from_config(&demo_config()).unwrap();
        let keys = dash.keys();
        assert_eq!(keys[0], "battery/load");
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), keys.len());
        assert!(keys.contains(&"solar/power".to_string()));
    }

    #[test]
    fn new_values_change_the_frame() {
        let dash = Dashboard::from_config(&demo_config()).unwrap();

        let empty = ValueStore::new();
        let mut loaded = ValueStore::new();
        loaded.insert("battery/load", Value::Number(75.0));
        loaded.insert("battery/voltage", Value::Number(12.8));

        let a = dash.render(&empty);
        let b = dash.render(&loaded);
        assert_ne!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn unknown_icon_name_is_rejected() {
        let mut cfg = demo_config();
        cfg.widgets.push(WidgetConfig {
            kind: WidgetKind::Icon,
            icon: Some("teapot".into()),
            x: 0,
            y: 0,
            w: 24,
            h: 24,
            ..Default::default()
        });
        assert!(Dashboard::from_config(&cfg).is_err());
    }
}
