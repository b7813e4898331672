//! Glyph trees to glyphs.

use std::collections::HashSet;

use log::warn;

use fontstore_core_store::xml::Element;
use fontstore_core_store::{plist, Error, PropertyValue};

use crate::glyph::{Anchor, Component, Contour, Glyph, Guideline, Image, Point, PointPen};
use crate::glyph::{SegmentType, Transform};
use crate::Number;

/// Elements that may appear at most once under `<glyph>`.
const SINGLE_ELEMENTS: [&str; 5] = ["outline", "advance", "image", "note", "lib"];

/// Every element allowed directly under `<glyph>`.
const GLYPH_ELEMENTS: [&str; 8] = [
    "outline", "advance", "unicode", "guideline", "anchor", "image", "note", "lib",
];

/// Leniency switches for reading.
#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    /// Drop off-curve points that end an open contour instead of failing.
    pub drop_trailing_offcurves: bool,
}

impl ReadOptions {
    #[must_use]
    pub fn with_drop_trailing_offcurves(mut self, drop: bool) -> Self {
        self.drop_trailing_offcurves = drop;
        self
    }
}

/// Identifiers already used in the glyph being read.
#[derive(Default)]
struct Identifiers(HashSet<String>);

impl Identifiers {
    fn claim(&mut self, identifier: Option<&str>) -> Result<(), Error> {
        match identifier {
            Some(id) if !self.0.insert(id.to_string()) => Err(Error::DuplicateIdentifier {
                identifier: id.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Read a whole glyph from its tree.
pub fn read_glyph(tree: &Element, options: &ReadOptions) -> Result<Glyph, Error> {
    let children = glyph_children(tree)?;
    let mut glyph = Glyph::new(tree.attr("name").unwrap_or_default());
    let mut identifiers = Identifiers::default();

    for element in children {
        match element.tag.as_str() {
            "outline" => read_outline(element, &mut glyph, &mut identifiers, options)?,
            "advance" => {
                glyph.width = optional_number(element, "width")?.unwrap_or_default();
                glyph.height = optional_number(element, "height")?.unwrap_or_default();
            }
            "unicode" => glyph.add_unicode(read_unicode(element)?),
            "guideline" => {
                let guideline = read_guideline(element)?;
                identifiers.claim(guideline.identifier.as_deref())?;
                glyph.guidelines.push(guideline);
            }
            "anchor" => {
                let anchor = read_anchor(element)?;
                identifiers.claim(anchor.identifier.as_deref())?;
                glyph.anchors.push(anchor);
            }
            "image" => glyph.image = Some(read_image(element)?),
            "note" => glyph.set_note(&element.text),
            "lib" => glyph.lib = read_lib(element)?,
            other => return Err(unknown(other, "glyph")),
        }
    }
    Ok(glyph)
}

/// Send only the outline of a glyph tree to a pen.
///
/// The tree is checked the same way [`read_glyph`] checks it, so a glyph
/// that fails to read also fails to draw.
pub fn draw_glyph(tree: &Element, pen: &mut impl PointPen, options: &ReadOptions) -> Result<(), Error> {
    let mut identifiers = Identifiers::default();
    for element in glyph_children(tree)? {
        if element.tag == "outline" {
            read_outline(element, pen, &mut identifiers, options)?;
        }
    }
    Ok(())
}

/// The children of a `<glyph>` root, once the root, the element names and
/// the single-occurrence elements check out.
fn glyph_children(tree: &Element) -> Result<&[Element], Error> {
    check_root(tree)?;
    let mut seen = HashSet::new();
    for element in &tree.children {
        let tag = element.tag.as_str();
        if !GLYPH_ELEMENTS.contains(&tag) {
            return Err(unknown(tag, "glyph"));
        }
        if SINGLE_ELEMENTS.contains(&tag) && !seen.insert(tag) {
            return Err(Error::DuplicateElement {
                tag: tag.to_string(),
            });
        }
    }
    Ok(&tree.children)
}

fn check_root(tree: &Element) -> Result<(), Error> {
    if tree.tag != "glyph" {
        return Err(Error::malformed(format!(
            "expected <glyph> root, found <{}>",
            tree.tag
        )));
    }
    match tree.attr("format") {
        None | Some("1") | Some("2") => Ok(()),
        Some(other) => Err(Error::malformed(format!(
            "unsupported glyph format {:?}",
            other
        ))),
    }
}

fn unknown(tag: &str, parent: &str) -> Error {
    Error::UnknownElement {
        tag: tag.to_string(),
        parent: parent.to_string(),
    }
}

fn number(element: &Element, attribute: &str) -> Result<Number, Error> {
    optional_number(element, attribute)?.ok_or_else(|| {
        Error::malformed(format!(
            "<{}> is missing its {} attribute",
            element.tag, attribute
        ))
    })
}

fn optional_number(element: &Element, attribute: &str) -> Result<Option<Number>, Error> {
    element.attr(attribute).map(Number::parse).transpose()
}

fn optional_string(element: &Element, attribute: &str) -> Option<String> {
    element.attr(attribute).map(str::to_string)
}

fn read_transform(element: &Element) -> Result<Transform, Error> {
    let mut values = Transform::IDENTITY.values();
    for (value, attribute) in values.iter_mut().zip(Transform::ATTRIBUTES) {
        if let Some(n) = optional_number(element, attribute)? {
            *value = n;
        }
    }
    Ok(Transform::from_values(values))
}

fn read_unicode(element: &Element) -> Result<u32, Error> {
    let hex = element.attr("hex").unwrap_or_default();
    u32::from_str_radix(hex, 16)
        .map_err(|_| Error::malformed(format!("illegal unicode hex value {:?}", hex)))
}

fn read_guideline(element: &Element) -> Result<Guideline, Error> {
    Ok(Guideline {
        x: optional_number(element, "x")?,
        y: optional_number(element, "y")?,
        angle: optional_number(element, "angle")?,
        name: optional_string(element, "name"),
        color: optional_string(element, "color"),
        identifier: optional_string(element, "identifier"),
    })
}

fn read_anchor(element: &Element) -> Result<Anchor, Error> {
    Ok(Anchor {
        x: optional_number(element, "x")?.unwrap_or_default(),
        y: optional_number(element, "y")?.unwrap_or_default(),
        name: optional_string(element, "name"),
        color: optional_string(element, "color"),
        identifier: optional_string(element, "identifier"),
    })
}

fn read_image(element: &Element) -> Result<Image, Error> {
    let file_name = element
        .attr("fileName")
        .ok_or_else(|| Error::malformed("<image> is missing its fileName attribute"))?;
    Ok(Image {
        file_name: file_name.to_string(),
        transform: read_transform(element)?,
        color: optional_string(element, "color"),
    })
}

fn read_lib(element: &Element) -> Result<fontstore_core_store::Dict, Error> {
    match element.children.as_slice() {
        [] => Ok(Default::default()),
        [dict] => plist::decode_value(dict)?.into_dict(),
        _ => Err(Error::malformed("<lib> must hold a single dict")),
    }
}

fn read_outline(
    outline: &Element,
    pen: &mut impl PointPen,
    identifiers: &mut Identifiers,
    options: &ReadOptions,
) -> Result<(), Error> {
    for element in &outline.children {
        match element.tag.as_str() {
            "contour" => {
                let contour = read_contour(element, identifiers, options)?;
                pen.begin_path(contour.identifier)?;
                for point in contour.points {
                    pen.add_point(point)?;
                }
                pen.end_path()?;
            }
            "component" => pen.add_component(read_component(element, identifiers)?)?,
            other => return Err(unknown(other, "outline")),
        }
    }
    Ok(())
}

fn read_contour(
    element: &Element,
    identifiers: &mut Identifiers,
    options: &ReadOptions,
) -> Result<Contour, Error> {
    let identifier = optional_string(element, "identifier");
    identifiers.claim(identifier.as_deref())?;

    let mut points = Vec::with_capacity(element.children.len());
    for child in &element.children {
        if child.tag != "point" {
            return Err(unknown(&child.tag, "contour"));
        }
        let point = read_point(child)?;
        identifiers.claim(point.identifier.as_deref())?;
        points.push(point);
    }

    let mut contour = Contour { identifier, points };
    validate_contour(&mut contour, options)?;
    Ok(contour)
}

fn read_point(element: &Element) -> Result<Point, Error> {
    let smooth = match element.attr("smooth") {
        None | Some("no") => false,
        Some("yes") => true,
        Some(other) => {
            return Err(Error::malformed(format!(
                "smooth must be yes or no, not {:?}",
                other
            )))
        }
    };
    Ok(Point {
        x: number(element, "x")?,
        y: number(element, "y")?,
        segment_type: SegmentType::parse(element.attr("type"))?,
        smooth,
        name: optional_string(element, "name"),
        identifier: optional_string(element, "identifier"),
    })
}

fn read_component(element: &Element, identifiers: &mut Identifiers) -> Result<Component, Error> {
    if let Some(child) = element.children.first() {
        return Err(unknown(&child.tag, "component"));
    }
    let base = element.attr("base").ok_or(Error::MissingBaseGlyph)?;
    let identifier = optional_string(element, "identifier");
    identifiers.claim(identifier.as_deref())?;
    Ok(Component {
        base: base.to_string(),
        transform: read_transform(element)?,
        identifier,
    })
}

/// Check the point sequence of one contour, trimming dangling off-curves
/// from open contours when the options allow it.
fn validate_contour(contour: &mut Contour, options: &ReadOptions) -> Result<(), Error> {
    let open = contour.is_open();

    if open
        && contour
            .points
            .last()
            .is_some_and(|p| !p.segment_type.is_on_curve())
    {
        if !options.drop_trailing_offcurves {
            return Err(Error::invalid_contour("open contour ends with off-curve points"));
        }
        let before = contour.points.len();
        while contour
            .points
            .last()
            .is_some_and(|p| !p.segment_type.is_on_curve())
        {
            contour.points.pop();
        }
        warn!(
            "dropped {} trailing off-curve points from open contour",
            before - contour.points.len()
        );
    }

    let points = &contour.points;
    let count = points.len();
    for (index, point) in points.iter().enumerate() {
        match point.segment_type {
            SegmentType::Move if index > 0 => {
                return Err(Error::invalid_contour("move point after the start of a contour"))
            }
            SegmentType::OffCurve if point.smooth => {
                return Err(Error::invalid_contour("smooth off-curve point"))
            }
            SegmentType::Line => {
                let previous = if index > 0 {
                    Some(index - 1)
                } else if !open && count > 1 {
                    Some(count - 1)
                } else {
                    None
                };
                if previous.is_some_and(|p| points[p].segment_type == SegmentType::OffCurve) {
                    return Err(Error::invalid_contour("line point after an off-curve point"));
                }
            }
            SegmentType::Curve => {
                if preceding_offcurves(points, index, open) > 2 {
                    return Err(Error::invalid_contour(
                        "more than two off-curve points before a curve point",
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Off-curve points directly before `index`, wrapping around for closed
/// contours.
fn preceding_offcurves(points: &[Point], index: usize, open: bool) -> usize {
    let count = points.len();
    let mut found = 0;
    for step in 1..count {
        let position = if open {
            match index.checked_sub(step) {
                Some(p) => p,
                None => break,
            }
        } else {
            (index + count - step) % count
        };
        if points[position].segment_type != SegmentType::OffCurve {
            break;
        }
        found += 1;
    }
    found
}
