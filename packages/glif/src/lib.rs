//! Glyph files for fontstore.
//!
//! A glyph travels between the storage layer and the font model as an
//! [`Element`](fontstore_core_store::Element) tree. This crate turns those
//! trees into [`Glyph`] values and back, validating outlines on the way in.
//!
//! ```rust
//! use fontstore_core_store::xml;
//! use fontstore_glif::{read_glyph, write_glyph, ReadOptions};
//!
//! let tree = xml::parse(br#"<glyph name="period" format="2">
//!     <advance width="250"/>
//!     <outline>
//!         <contour>
//!             <point x="100" y="0" type="line"/>
//!             <point x="150" y="0" type="line"/>
//!             <point x="150" y="50" type="line"/>
//!             <point x="100" y="50" type="line"/>
//!         </contour>
//!     </outline>
//! </glyph>"#).unwrap();
//!
//! let glyph = read_glyph(&tree, &ReadOptions::default()).unwrap();
//! assert_eq!(glyph.contours().count(), 1);
//! assert_eq!(write_glyph(&glyph), tree);
//! ```

mod glyph;
mod number;
mod read;
mod write;

pub use glyph::{
    Anchor, Component, Contour, Glyph, Guideline, Image, OutlineItem, Point, PointPen,
    SegmentType, Transform,
};
pub use number::Number;
pub use read::{draw_glyph, read_glyph, ReadOptions};
pub use write::write_glyph;
