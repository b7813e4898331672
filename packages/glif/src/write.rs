//! Glyphs to glyph trees.

use fontstore_core_store::xml::Element;
use fontstore_core_store::{plist, PropertyValue};

use crate::glyph::{Anchor, Component, Contour, Glyph, Guideline, Image, OutlineItem, Transform};
use crate::Number;

/// Build the format 2 tree for a glyph.
pub fn write_glyph(glyph: &Glyph) -> Element {
    let mut tree = Element::new("glyph")
        .with_attr("name", glyph.name.as_str())
        .with_attr("format", "2");

    if !glyph.width.is_zero() || !glyph.height.is_zero() {
        let mut advance = Element::new("advance");
        if !glyph.width.is_zero() {
            advance.set_attr("width", glyph.width.to_string());
        }
        if !glyph.height.is_zero() {
            advance.set_attr("height", glyph.height.to_string());
        }
        tree.push(advance);
    }

    for code_point in glyph.unicodes() {
        tree.push(Element::new("unicode").with_attr("hex", format!("{:04X}", code_point)));
    }

    if !glyph.note().is_empty() {
        tree.push(Element::new("note").with_text(glyph.note()));
    }

    if let Some(image) = &glyph.image {
        tree.push(write_image(image));
    }
    for guideline in &glyph.guidelines {
        tree.push(write_guideline(guideline));
    }
    for anchor in &glyph.anchors {
        tree.push(write_anchor(anchor));
    }

    let mut outline = Element::new("outline");
    for item in glyph.outline() {
        outline.push(match item {
            OutlineItem::Contour(contour) => write_contour(contour),
            OutlineItem::Component(component) => write_component(component),
        });
    }
    tree.push(outline);

    if !glyph.lib.is_empty() {
        tree.push(
            Element::new("lib").with_child(plist::encode_value(&PropertyValue::Dict(
                glyph.lib.clone(),
            ))),
        );
    }
    tree
}

fn set_optional(element: &mut Element, attribute: &str, value: Option<&str>) {
    if let Some(value) = value {
        element.set_attr(attribute, value);
    }
}

/// Only attributes that differ from the identity are written. The check is
/// numeric, so `Float(1.0)` for a scale or `Float(0.0)` for an offset is
/// dropped too and reads back as the integer default.
fn set_transform(element: &mut Element, transform: &Transform) {
    let defaults = Transform::IDENTITY.values();
    for ((value, default), attribute) in transform
        .values()
        .into_iter()
        .zip(defaults)
        .zip(Transform::ATTRIBUTES)
    {
        if !value.same_value(default) {
            element.set_attr(attribute, value.to_string());
        }
    }
}

fn write_image(image: &Image) -> Element {
    let mut element = Element::new("image").with_attr("fileName", image.file_name.as_str());
    set_transform(&mut element, &image.transform);
    set_optional(&mut element, "color", image.color.as_deref());
    element
}

fn write_guideline(guideline: &Guideline) -> Element {
    let mut element = Element::new("guideline");
    let numbers: [(&str, Option<Number>); 3] =
        [("x", guideline.x), ("y", guideline.y), ("angle", guideline.angle)];
    for (attribute, value) in numbers {
        if let Some(value) = value {
            element.set_attr(attribute, value.to_string());
        }
    }
    set_optional(&mut element, "name", guideline.name.as_deref());
    set_optional(&mut element, "color", guideline.color.as_deref());
    set_optional(&mut element, "identifier", guideline.identifier.as_deref());
    element
}

fn write_anchor(anchor: &Anchor) -> Element {
    let mut element = Element::new("anchor")
        .with_attr("x", anchor.x.to_string())
        .with_attr("y", anchor.y.to_string());
    set_optional(&mut element, "name", anchor.name.as_deref());
    set_optional(&mut element, "color", anchor.color.as_deref());
    set_optional(&mut element, "identifier", anchor.identifier.as_deref());
    element
}

fn write_contour(contour: &Contour) -> Element {
    let mut element = Element::new("contour");
    set_optional(&mut element, "identifier", contour.identifier.as_deref());
    for point in &contour.points {
        let mut child = Element::new("point")
            .with_attr("x", point.x.to_string())
            .with_attr("y", point.y.to_string());
        set_optional(&mut child, "type", point.segment_type.as_str());
        if point.smooth {
            child.set_attr("smooth", "yes");
        }
        set_optional(&mut child, "name", point.name.as_deref());
        set_optional(&mut child, "identifier", point.identifier.as_deref());
        element.push(child);
    }
    element
}

fn write_component(component: &Component) -> Element {
    let mut element = Element::new("component").with_attr("base", component.base.as_str());
    set_transform(&mut element, &component.transform);
    set_optional(&mut element, "identifier", component.identifier.as_deref());
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{Point, PointPen, SegmentType};
    use crate::read::{read_glyph, ReadOptions};
    use fontstore_core_store::xml;

    fn sample() -> Glyph {
        let mut glyph = Glyph::new("Aacute");
        glyph.width = Number::Integer(520);
        glyph.add_unicode(0xC1);
        glyph.set_note("accented\ncapital");
        glyph.image = Some(Image {
            file_name: "Aacute.png".to_string(),
            transform: Transform::offset(0, -20),
            color: Some("1,0,0,0.5".to_string()),
        });
        glyph.guidelines.push(Guideline {
            x: Some(Number::Integer(260)),
            angle: Some(Number::Float(90.0)),
            ..Default::default()
        });
        glyph.anchors.push(Anchor {
            x: Number::Integer(260),
            y: Number::Float(700.5),
            name: Some("top".to_string()),
            ..Default::default()
        });

        glyph.begin_path(Some("outer".to_string())).unwrap();
        glyph.add_point(Point::new(0, 0, SegmentType::Line)).unwrap();
        glyph.add_point(Point::new(100, 0, SegmentType::OffCurve)).unwrap();
        glyph.add_point(Point::new(200, 50, SegmentType::OffCurve)).unwrap();
        let mut apex = Point::new(260, 700, SegmentType::Curve).smooth();
        apex.name = Some("apex".to_string());
        glyph.add_point(apex).unwrap();
        glyph.end_path().unwrap();
        glyph
            .add_component(Component {
                base: "acutecomb".to_string(),
                transform: Transform::offset(160, 0),
                identifier: Some("accent".to_string()),
            })
            .unwrap();

        glyph
            .lib
            .insert("public.markColor".to_string(), "1,0,0,1".into());
        glyph
    }

    #[test]
    fn element_order_and_attributes() {
        let tree = write_glyph(&sample());
        let tags: Vec<&str> = tree.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(
            tags,
            vec!["advance", "unicode", "note", "image", "guideline", "anchor", "outline", "lib"]
        );

        assert_eq!(tree.attr("format"), Some("2"));
        let advance = tree.child("advance").unwrap();
        assert_eq!(advance.attr("width"), Some("520"));
        assert_eq!(advance.attr("height"), None);
        assert_eq!(tree.child("unicode").unwrap().attr("hex"), Some("00C1"));

        let outline = tree.child("outline").unwrap();
        let points = &outline.children[0].children;
        assert_eq!(points[0].attr("type"), Some("line"));
        assert_eq!(points[1].attr("type"), None);
        assert_eq!(points[3].attr("smooth"), Some("yes"));
        assert_eq!(points[0].attr("smooth"), None);

        let component = &outline.children[1];
        assert_eq!(component.attr("xOffset"), Some("160"));
        assert_eq!(component.attr("xScale"), None);
        assert_eq!(component.attr("identifier"), Some("accent"));
    }

    #[test]
    fn empty_parts_are_omitted() {
        let tree = write_glyph(&Glyph::new("space"));
        let tags: Vec<&str> = tree.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["outline"]);
    }

    #[test]
    fn written_glyphs_read_back_unchanged() {
        let glyph = sample();
        let bytes = xml::write(&write_glyph(&glyph), xml::XML_DECLARATION);
        let tree = xml::parse(&bytes).unwrap();
        assert_eq!(read_glyph(&tree, &ReadOptions::default()).unwrap(), glyph);
    }

    #[test]
    fn float_coordinates_keep_their_kind() {
        let mut glyph = Glyph::new("dot");
        glyph.begin_path(None).unwrap();
        glyph
            .add_point(Point::new(Number::Float(1.0), 2.5, SegmentType::Line))
            .unwrap();
        glyph.end_path().unwrap();

        let tree = write_glyph(&glyph);
        let point = &tree.child("outline").unwrap().children[0].children[0];
        assert_eq!(point.attr("x"), Some("1.0"));
        assert_eq!(read_glyph(&tree, &ReadOptions::default()).unwrap(), glyph);
    }

    #[test]
    fn float_transform_defaults_read_back_as_integers() {
        let mut glyph = Glyph::new("Aring");
        let transform = Transform {
            x_scale: Number::Float(1.0),
            x_offset: Number::Float(0.0),
            y_offset: Number::Integer(40),
            ..Transform::IDENTITY
        };
        glyph
            .add_component(Component {
                base: "ring".to_string(),
                transform,
                identifier: None,
            })
            .unwrap();

        let tree = write_glyph(&glyph);
        let component = &tree.child("outline").unwrap().children[0];
        assert_eq!(component.attr("xScale"), None);
        assert_eq!(component.attr("xOffset"), None);
        assert_eq!(component.attr("yOffset"), Some("40"));

        let read = read_glyph(&tree, &ReadOptions::default()).unwrap();
        let read_transform = read.components().next().unwrap().transform;
        assert_eq!(read_transform.x_scale, Number::Integer(1));
        assert_eq!(read_transform.x_offset, Number::Integer(0));
        assert_eq!(read_transform.y_offset, Number::Integer(40));
    }
}
