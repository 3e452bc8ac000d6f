/*
 *  display/traits.rs
 *
 *  InkMonS - data on slow glass
 *  (c) 2023-26 Stuart Hunter
 *
 *  Core trait definitions for display sink abstraction
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

use crate::display::error::DisplayError;
use crate::frame::Frame;

/// How the panel applies a finished frame.
///
/// Partial refresh is fast but leaves ghosting on e-paper; a periodic full
/// refresh clears it. The render loop decides the cadence, the sink only
/// executes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// Complete waveform cycle, slow, cleans ghosting
    Full,

    /// Fast sub-cycle update, may leave artifacts
    Partial,
}

/// Fixed properties of the attached panel (or preview surface).
#[derive(Debug, Clone)]
pub struct PanelSpec {
    /// Frame width in pixels, as the layout sees it
    pub width: u32,

    /// Frame height in pixels, as the layout sees it
    pub height: u32,

    /// Whether the sink distinguishes partial from full refresh
    pub supports_partial: bool,
}

/// A place finished frames go - the physical panel or a preview window.
///
/// Sinks receive only complete frames at the declared resolution; nothing
/// partially rendered ever crosses this boundary.
pub trait DisplaySink {
    /// Returns the fixed properties of this sink
    fn spec(&self) -> &PanelSpec;

    /// Push one finished frame to the device
    ///
    /// Sinks that cannot do partial refresh treat every kind as Full.
    fn present(&mut self, frame: &Frame, refresh: RefreshKind) -> Result<(), DisplayError>;

    /// Blank the device
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Release the device at shutdown (deep sleep for e-paper)
    fn sleep(&mut self) -> Result<(), DisplayError>;
}
