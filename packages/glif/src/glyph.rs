//! The glyph model and the point pen that builds it.

use fontstore_core_store::{Dict, Error};

use crate::Number;

/// How a point ends the segment leading up to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SegmentType {
    Move,
    Line,
    Curve,
    QCurve,
    #[default]
    OffCurve,
}

impl SegmentType {
    /// Parse a `type` attribute. An absent attribute means off-curve.
    pub fn parse(text: Option<&str>) -> Result<SegmentType, Error> {
        match text {
            None | Some("offcurve") => Ok(SegmentType::OffCurve),
            Some("move") => Ok(SegmentType::Move),
            Some("line") => Ok(SegmentType::Line),
            Some("curve") => Ok(SegmentType::Curve),
            Some("qcurve") => Ok(SegmentType::QCurve),
            Some(other) => Err(Error::malformed(format!("unknown point type {:?}", other))),
        }
    }

    /// Attribute value for on-curve points.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            SegmentType::Move => Some("move"),
            SegmentType::Line => Some("line"),
            SegmentType::Curve => Some("curve"),
            SegmentType::QCurve => Some("qcurve"),
            SegmentType::OffCurve => None,
        }
    }

    pub fn is_on_curve(self) -> bool {
        self != SegmentType::OffCurve
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: Number,
    pub y: Number,
    pub segment_type: SegmentType,
    pub smooth: bool,
    pub name: Option<String>,
    pub identifier: Option<String>,
}

impl Point {
    pub fn new(x: impl Into<Number>, y: impl Into<Number>, segment_type: SegmentType) -> Self {
        Point {
            x: x.into(),
            y: y.into(),
            segment_type,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn smooth(mut self) -> Self {
        self.smooth = true;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    pub identifier: Option<String>,
    pub points: Vec<Point>,
}

impl Contour {
    /// An open contour starts with a `move` point.
    pub fn is_open(&self) -> bool {
        self.points
            .first()
            .is_some_and(|p| p.segment_type == SegmentType::Move)
    }
}

/// Affine transformation of a component or image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub x_scale: Number,
    pub xy_scale: Number,
    pub yx_scale: Number,
    pub y_scale: Number,
    pub x_offset: Number,
    pub y_offset: Number,
}

impl Transform {
    /// Attribute names in matrix order.
    pub const ATTRIBUTES: [&'static str; 6] =
        ["xScale", "xyScale", "yxScale", "yScale", "xOffset", "yOffset"];

    pub const IDENTITY: Transform = Transform {
        x_scale: Number::ONE,
        xy_scale: Number::ZERO,
        yx_scale: Number::ZERO,
        y_scale: Number::ONE,
        x_offset: Number::ZERO,
        y_offset: Number::ZERO,
    };

    pub fn values(&self) -> [Number; 6] {
        [
            self.x_scale,
            self.xy_scale,
            self.yx_scale,
            self.y_scale,
            self.x_offset,
            self.y_offset,
        ]
    }

    pub fn from_values(values: [Number; 6]) -> Self {
        let [x_scale, xy_scale, yx_scale, y_scale, x_offset, y_offset] = values;
        Transform {
            x_scale,
            xy_scale,
            yx_scale,
            y_scale,
            x_offset,
            y_offset,
        }
    }

    pub fn offset(x: impl Into<Number>, y: impl Into<Number>) -> Self {
        Transform {
            x_offset: x.into(),
            y_offset: y.into(),
            ..Transform::IDENTITY
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    /// Not checked against the font when read.
    pub base: String,
    pub transform: Transform,
    pub identifier: Option<String>,
}

impl Component {
    pub fn new(base: impl Into<String>) -> Self {
        Component {
            base: base.into(),
            transform: Transform::IDENTITY,
            identifier: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum OutlineItem {
    Contour(Contour),
    Component(Component),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Image {
    pub file_name: String,
    pub transform: Transform,
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Guideline {
    pub x: Option<Number>,
    pub y: Option<Number>,
    pub angle: Option<Number>,
    pub name: Option<String>,
    pub color: Option<String>,
    pub identifier: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Anchor {
    pub x: Number,
    pub y: Number,
    pub name: Option<String>,
    pub color: Option<String>,
    pub identifier: Option<String>,
}

/// Receives an outline one point at a time.
///
/// Paths are bracketed by `begin_path` and `end_path`; components only
/// appear between paths.
pub trait PointPen {
    fn begin_path(&mut self, identifier: Option<String>) -> Result<(), Error>;
    fn add_point(&mut self, point: Point) -> Result<(), Error>;
    fn end_path(&mut self) -> Result<(), Error>;
    fn add_component(&mut self, component: Component) -> Result<(), Error>;
}

impl<P: PointPen + ?Sized> PointPen for &mut P {
    fn begin_path(&mut self, identifier: Option<String>) -> Result<(), Error> {
        (**self).begin_path(identifier)
    }

    fn add_point(&mut self, point: Point) -> Result<(), Error> {
        (**self).add_point(point)
    }

    fn end_path(&mut self) -> Result<(), Error> {
        (**self).end_path()
    }

    fn add_component(&mut self, component: Component) -> Result<(), Error> {
        (**self).add_component(component)
    }
}

/// A glyph and everything stored with it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Glyph {
    pub name: String,
    pub width: Number,
    pub height: Number,
    unicodes: Vec<u32>,
    note: String,
    pub image: Option<Image>,
    pub guidelines: Vec<Guideline>,
    pub anchors: Vec<Anchor>,
    outline: Vec<OutlineItem>,
    pub lib: Dict,
    open_path: Option<Contour>,
}

impl Glyph {
    pub fn new(name: impl Into<String>) -> Self {
        Glyph {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn unicodes(&self) -> &[u32] {
        &self.unicodes
    }

    /// Add a code point unless it is already present.
    pub fn add_unicode(&mut self, code_point: u32) {
        if !self.unicodes.contains(&code_point) {
            self.unicodes.push(code_point);
        }
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    /// Set the note with each line trimmed and `\n` line endings.
    pub fn set_note(&mut self, note: &str) {
        self.note = normalize_note(note);
    }

    pub fn outline(&self) -> &[OutlineItem] {
        &self.outline
    }

    pub fn contours(&self) -> impl Iterator<Item = &Contour> {
        self.outline.iter().filter_map(|item| match item {
            OutlineItem::Contour(c) => Some(c),
            OutlineItem::Component(_) => None,
        })
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.outline.iter().filter_map(|item| match item {
            OutlineItem::Component(c) => Some(c),
            OutlineItem::Contour(_) => None,
        })
    }

    /// Drop the outline, keeping everything else.
    pub fn clear_outline(&mut self) {
        self.outline.clear();
        self.open_path = None;
    }

    /// Replay the outline into another pen.
    pub fn draw_points(&self, pen: &mut impl PointPen) -> Result<(), Error> {
        for item in &self.outline {
            match item {
                OutlineItem::Contour(contour) => {
                    pen.begin_path(contour.identifier.clone())?;
                    for point in &contour.points {
                        pen.add_point(point.clone())?;
                    }
                    pen.end_path()?;
                }
                OutlineItem::Component(component) => pen.add_component(component.clone())?,
            }
        }
        Ok(())
    }
}

impl PointPen for Glyph {
    fn begin_path(&mut self, identifier: Option<String>) -> Result<(), Error> {
        if self.open_path.is_some() {
            return Err(Error::UnclosedPath);
        }
        self.open_path = Some(Contour {
            identifier,
            points: Vec::new(),
        });
        Ok(())
    }

    fn add_point(&mut self, point: Point) -> Result<(), Error> {
        match &mut self.open_path {
            Some(contour) => {
                contour.points.push(point);
                Ok(())
            }
            None => Err(Error::NoOpenPath),
        }
    }

    fn end_path(&mut self) -> Result<(), Error> {
        let contour = self.open_path.take().ok_or(Error::NoOpenPath)?;
        self.outline.push(OutlineItem::Contour(contour));
        Ok(())
    }

    fn add_component(&mut self, component: Component) -> Result<(), Error> {
        if self.open_path.is_some() {
            return Err(Error::UnclosedPath);
        }
        self.outline.push(OutlineItem::Component(component));
        Ok(())
    }
}

fn normalize_note(note: &str) -> String {
    note.lines().map(str::trim).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(pen: &mut impl PointPen) -> Result<(), Error> {
        pen.begin_path(Some("outer".to_string()))?;
        for (x, y) in [(0, 0), (0, 100), (100, 100), (100, 0)] {
            pen.add_point(Point::new(x, y, SegmentType::Line))?;
        }
        pen.end_path()
    }

    #[test]
    fn pen_appends_in_order() {
        let mut glyph = Glyph::new("A");
        square(&mut glyph).unwrap();
        glyph.add_component(Component::new("acute")).unwrap();
        square(&mut glyph).unwrap();

        assert_eq!(glyph.outline().len(), 3);
        assert!(matches!(glyph.outline()[1], OutlineItem::Component(_)));
        assert_eq!(glyph.contours().count(), 2);
        assert_eq!(glyph.components().next().unwrap().base, "acute");
    }

    #[test]
    fn points_need_an_open_path() {
        let mut glyph = Glyph::new("A");
        assert!(matches!(
            glyph.add_point(Point::new(0, 0, SegmentType::Line)),
            Err(Error::NoOpenPath)
        ));
        assert!(matches!(glyph.end_path(), Err(Error::NoOpenPath)));
    }

    #[test]
    fn open_path_blocks_new_paths_and_components() {
        let mut glyph = Glyph::new("A");
        glyph.begin_path(None).unwrap();
        assert!(matches!(glyph.begin_path(None), Err(Error::UnclosedPath)));
        assert!(matches!(
            glyph.add_component(Component::new("B")),
            Err(Error::UnclosedPath)
        ));
        glyph.end_path().unwrap();
        assert_eq!(glyph.contours().count(), 1);
    }

    #[test]
    fn draw_points_replays_outline() {
        let mut source = Glyph::new("A");
        square(&mut source).unwrap();
        source
            .add_component(Component {
                base: "B".to_string(),
                transform: Transform::offset(10, 20),
                identifier: Some("c1".to_string()),
            })
            .unwrap();

        let mut copy = Glyph::new("A");
        source.draw_points(&mut copy).unwrap();
        assert_eq!(copy, source);
    }

    #[test]
    fn unicodes_are_deduplicated() {
        let mut glyph = Glyph::new("A");
        glyph.add_unicode(0x41);
        glyph.add_unicode(0x61);
        glyph.add_unicode(0x41);
        assert_eq!(glyph.unicodes(), &[0x41, 0x61]);
    }

    #[test]
    fn notes_are_normalized() {
        let mut glyph = Glyph::new("A");
        glyph.set_note("  first line  \r\n\tsecond\n");
        assert_eq!(glyph.note(), "first line\nsecond");
    }

    #[test]
    fn open_contours_start_with_move() {
        let contour = Contour {
            identifier: None,
            points: vec![
                Point::new(0, 0, SegmentType::Move),
                Point::new(10, 0, SegmentType::Line),
            ],
        };
        assert!(contour.is_open());
        assert!(!Contour::default().is_open());
    }
}
