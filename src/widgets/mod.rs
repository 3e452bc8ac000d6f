/*
 *  widgets/mod.rs
 *
 *  InkMonS - data on slow glass
 *  (c) 2023-26 Stuart Hunter
 *
 *  Widget variants that paint a bound value into a screen region
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

pub mod bar;
pub mod icon;
pub mod text;

pub use bar::BarWidget;
pub use icon::IconWidget;
pub use text::{FontChoice, HAlign, TextWidget};

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::draw;
use crate::values::Value;

/// Enum dispatch over the three widget shapes. Each variant paints itself
/// into its region from the current value of its bound data-key.
#[derive(Debug, Clone)]
pub enum Widget {
    Text(TextWidget),
    Bar(BarWidget),
    Icon(IconWidget),
}

impl Widget {
    /// Repaint the widget's region. Drawing is clipped to the region, so a
    /// widget can never scribble over its neighbours.
    pub fn render<D>(
        &self,
        target: &mut D,
        region: Rectangle,
        value: Option<&Value>,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        draw::clear_region(target, region)?;
        let mut clipped = target.clipped(&region);
        match self {
            Widget::Text(w) => w.render(&mut clipped, region, value),
            Widget::Bar(w) => w.render(&mut clipped, region, value),
            Widget::Icon(w) => w.render(&mut clipped, region, value),
        }
    }
}
