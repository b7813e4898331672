//! Save a font through every backend, reopen it and check what comes back.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use fontstore::{
    load_font, open, Font, Groups, Kerning, Number, Point, PointPen, SegmentType, Session,
    StoreConfig, UfoReaderWriter,
};

const PACKAGES: [&str; 4] = ["Test.ufo", "Test.ufoz", "Test.xml", "Test.ufodb"];

fn sample_font() -> Font {
    let mut font = Font::new();
    let glyph = font
        .new_layer("public.default")
        .unwrap()
        .new_glyph("A");
    glyph.begin_path(None).unwrap();
    for (x, y) in [(0i64, 0i64), (0, 700), (500, 700), (500, 0)] {
        glyph
            .add_point(Point::new(x, y, SegmentType::Line))
            .unwrap();
    }
    glyph.end_path().unwrap();
    font
}

fn save(font: &mut Font, config: &StoreConfig) {
    let mut writer = UfoReaderWriter::new(open(config).unwrap());
    font.save(&mut writer).unwrap();
    writer.close().unwrap();
}

fn close(session: Rc<RefCell<Session>>, font: Font) {
    drop(font);
    let session = Rc::try_unwrap(session).ok().unwrap().into_inner();
    session.close().unwrap();
}

fn config_in(dir: &Path, name: &str) -> StoreConfig {
    StoreConfig::from_path(dir.join(name)).unwrap()
}

#[test]
fn outline_survives_every_backend() {
    for name in PACKAGES {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), name);
        save(&mut sample_font(), &config);

        let (_session, mut font) = load_font(&config).unwrap();
        assert_eq!(font.layer_names(), vec!["public.default"], "{}", name);

        let layer = font.layer_mut("public.default").unwrap();
        assert_eq!(layer.glyph_names().collect::<Vec<_>>(), vec!["A"], "{}", name);
        let glyph = layer.get("A").unwrap();
        let contours: Vec<_> = glyph.contours().collect();
        assert_eq!(contours.len(), 1, "{}", name);
        assert_eq!(contours[0].points.len(), 4, "{}", name);
        assert!(
            contours[0]
                .points
                .iter()
                .all(|p| p.segment_type == SegmentType::Line),
            "{}",
            name
        );
    }
}

#[test]
fn groups_and_kerning_survive_every_backend() {
    let mut groups = Groups::new();
    groups.insert("group1".to_string(), vec!["A".to_string(), "B".to_string()]);
    let mut kerning = Kerning::new();
    kerning.insert(("A".to_string(), "B".to_string()), -20.0);

    for name in PACKAGES {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), name);
        let mut font = sample_font();
        font.groups = groups.clone();
        font.kerning = kerning.clone();
        save(&mut font, &config);

        let (_session, font) = load_font(&config).unwrap();
        assert_eq!(font.groups, groups, "{}", name);
        assert_eq!(font.kerning, kerning, "{}", name);
    }
}

#[test]
fn info_features_and_extra_layers() {
    for name in PACKAGES {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), name);
        let mut font = sample_font();
        font.info.set("familyName", "End To End").unwrap();
        font.info.set("unitsPerEm", 1000i64).unwrap();
        font.lib
            .insert("public.glyphOrder".to_string(), vec!["A", "a"].into());
        font.new_layer("Sketch").unwrap().new_glyph("a");
        font.features = Some("languagesystem DFLT dflt;\n".to_string());
        save(&mut font, &config);

        let (_session, mut loaded) = load_font(&config).unwrap();
        assert_eq!(loaded.layer_names(), vec!["public.default", "Sketch"], "{}", name);
        assert_eq!(loaded.default_layer_name(), "public.default", "{}", name);
        assert_eq!(loaded.info, font.info, "{}", name);
        assert_eq!(loaded.lib, font.lib, "{}", name);
        assert_eq!(loaded.features, font.features, "{}", name);
        assert!(loaded.layer_mut("Sketch").unwrap().get("a").is_ok(), "{}", name);
    }
}

#[test]
fn unmodified_packages_are_left_alone() {
    for name in ["Test.ufoz", "Test.xml"] {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), name);
        save(&mut sample_font(), &config);
        let before = std::fs::read(config.path()).unwrap();

        let (session, mut font) = load_font(&config).unwrap();
        font.layer_mut("public.default").unwrap().get("A").unwrap();
        drop(font);
        let session = std::rc::Rc::try_unwrap(session).ok().unwrap().into_inner();
        session.close().unwrap();

        assert_eq!(std::fs::read(config.path()).unwrap(), before, "{}", name);
    }
}

#[test]
fn resave_into_the_loading_session() {
    for name in PACKAGES {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), name);
        save(&mut sample_font(), &config);

        let (session, mut font) = load_font(&config).unwrap();
        font.layer_mut("public.default")
            .unwrap()
            .new_glyph("B")
            .width = Number::Integer(250);
        font.save(&mut *session.borrow_mut()).unwrap();
        close(session, font);

        let (session, mut font) = load_font(&config).unwrap();
        let layer = font.layer_mut("public.default").unwrap();
        let mut names: Vec<_> = layer.glyph_names().collect();
        names.sort();
        assert_eq!(names, vec!["A", "B"], "{}", name);
        assert_eq!(layer.get("A").unwrap().contours().count(), 1, "{}", name);
        assert_eq!(layer.get("B").unwrap().width, Number::Integer(250), "{}", name);
        close(session, font);
    }
}

#[test]
fn cleared_data_replaces_what_was_stored() {
    for name in PACKAGES {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), name);
        let mut font = sample_font();
        font.info.set("familyName", "Cleared").unwrap();
        font.groups
            .insert("group1".to_string(), vec!["A".to_string()]);
        font.kerning
            .insert(("A".to_string(), "A".to_string()), -5.0);
        font.lib
            .insert("public.glyphOrder".to_string(), vec!["A"].into());
        font.features = Some("languagesystem DFLT dflt;\n".to_string());
        save(&mut font, &config);

        let (session, mut font) = load_font(&config).unwrap();
        assert!(!font.groups.is_empty(), "{}", name);
        font.info = Default::default();
        font.groups.clear();
        font.kerning.clear();
        font.lib.clear();
        font.features = None;
        font.save(&mut *session.borrow_mut()).unwrap();
        close(session, font);

        let (session, font) = load_font(&config).unwrap();
        assert!(font.info.is_empty(), "{}", name);
        assert!(font.groups.is_empty(), "{}", name);
        assert!(font.kerning.is_empty(), "{}", name);
        assert!(font.lib.is_empty(), "{}", name);
        assert_eq!(font.features, None, "{}", name);
        close(session, font);
    }
}
