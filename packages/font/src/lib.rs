//! The font object model over a fontstore session.
//!
//! A [`Font`] holds font-wide data and an ordered list of [`Layer`]s.
//! Loaded layers share the [`UfoReaderWriter`] they came from and read a
//! glyph only when it is first asked for.
//!
//! ```
//! use fontstore_font::Font;
//!
//! let mut font = Font::new();
//! let layer = font.new_layer("public.default").unwrap();
//! layer.new_glyph("space");
//! assert!(layer.contains("space"));
//! assert!(font.new_layer("public.default").is_err());
//! ```

mod font;
mod info;
mod layer;
mod reader_writer;

pub use fontstore_glif::{
    Anchor, Component, Contour, Glyph, Guideline, Image, Number, Point, PointPen, SegmentType,
    Transform,
};

pub use crate::font::{Font, MAX_FORMAT_VERSION};
pub use crate::info::{is_font_info_attribute, FontInfo, FONT_INFO_ATTRIBUTES};
pub use crate::layer::{GlyphSource, Layer, SharedSource};
pub use crate::reader_writer::{Groups, Kerning, UfoReaderWriter};
