//! Shared contract tests for storage backends.
//!
//! Store crates call these from their own test modules. The byte-level
//! checks take an open store; the reopen and backend-level checks take an
//! `open` function that is handed a fresh, not yet existing location inside
//! a scratch directory and is called again on the same location after
//! `close`.

use std::path::Path;

use bytes::Bytes;
use fontstore_ll_store::LLStore;

use crate::backend::{Backend, GlyphSetContents, LayerAddress, LayerContents, MetaInfo};
use crate::filesystem::FileSystem;
use crate::xml::Element;
use crate::{Dict, PropertyValue, TopLevelFile};

fn scratch_location() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let location = dir.path().join("font");
    (dir, location)
}

pub fn write_then_read_works(store: &mut impl LLStore) {
    let data = Bytes::from_static(b"<glyph name=\"A\" format=\"2\"/>");
    store.ll_write(&["glyphs", "A_.glif"], data.clone()).unwrap();
    assert_eq!(store.ll_read(&["glyphs", "A_.glif"]).unwrap(), Some(data));

    store
        .ll_write(&["fontinfo.plist"], Bytes::from_static(b"info"))
        .unwrap();
    assert_eq!(
        store.ll_read(&["fontinfo.plist"]).unwrap(),
        Some(Bytes::from_static(b"info"))
    );
}

pub fn missing_reads_none(store: &mut impl LLStore) {
    assert_eq!(store.ll_read(&["lib.plist"]).unwrap(), None);
    assert_eq!(store.ll_read(&["glyphs", "missing.glif"]).unwrap(), None);
}

pub fn overwrite_replaces(store: &mut impl LLStore) {
    store
        .ll_write(&["features.fea"], Bytes::from_static(b"first, and longer"))
        .unwrap();
    store
        .ll_write(&["features.fea"], Bytes::from_static(b"second"))
        .unwrap();
    assert_eq!(
        store.ll_read(&["features.fea"]).unwrap(),
        Some(Bytes::from_static(b"second"))
    );
    let matching = store
        .ll_list()
        .unwrap()
        .into_iter()
        .filter(|p| p == &["features.fea"])
        .count();
    assert_eq!(matching, 1);
}

pub fn list_reports_writes(store: &mut impl LLStore) {
    store
        .ll_write(&["metainfo.plist"], Bytes::from_static(b"m"))
        .unwrap();
    store
        .ll_write(&["glyphs", "contents.plist"], Bytes::from_static(b"c"))
        .unwrap();

    let mut listed = store.ll_list().unwrap();
    listed.sort();
    assert_eq!(
        listed,
        vec![
            vec!["glyphs".to_string(), "contents.plist".to_string()],
            vec!["metainfo.plist".to_string()],
        ]
    );
}

/// Byte writes survive `ll_close` and a fresh session on the same location.
pub fn reopen_keeps_writes<S: LLStore>(mut open: impl FnMut(&Path) -> S) {
    let (_dir, location) = scratch_location();

    let mut store = open(&location);
    store
        .ll_write(&["lib.plist"], Bytes::from_static(b"one"))
        .unwrap();
    store
        .ll_write(&["glyphs", "a.glif"], Bytes::from_static(b"a"))
        .unwrap();
    store
        .ll_write(&["lib.plist"], Bytes::from_static(b"two"))
        .unwrap();
    store.ll_close().unwrap();
    drop(store);

    let mut store = open(&location);
    assert_eq!(
        store.ll_read(&["lib.plist"]).unwrap(),
        Some(Bytes::from_static(b"two"))
    );
    assert_eq!(
        store.ll_read(&["glyphs", "a.glif"]).unwrap(),
        Some(Bytes::from_static(b"a"))
    );
    assert_eq!(store.ll_list().unwrap().len(), 2);
    store.ll_close().unwrap();
}

fn sample_info() -> PropertyValue {
    let mut dict = Dict::new();
    dict.insert("familyName".to_string(), "Contract Sans".into());
    dict.insert("unitsPerEm".to_string(), 1000i64.into());
    dict.insert("italicAngle".to_string(), PropertyValue::Real(-12.5));
    PropertyValue::Dict(dict)
}

fn sample_glyph(name: &str) -> Element {
    Element::new("glyph")
        .with_attr("name", name)
        .with_attr("format", "2")
        .with_child(Element::new("advance").with_attr("width", "500"))
        .with_child(
            Element::new("outline").with_child(
                Element::new("contour")
                    .with_child(
                        Element::new("point")
                            .with_attr("x", "0")
                            .with_attr("y", "0")
                            .with_attr("type", "line"),
                    )
                    .with_child(
                        Element::new("point")
                            .with_attr("x", "100")
                            .with_attr("y", "700")
                            .with_attr("type", "line"),
                    ),
            ),
        )
}

/// Every routed unit survives close and reopen.
pub fn backend_round_trip<S: Backend>(mut open: impl FnMut(&Path) -> S) {
    let (_dir, location) = scratch_location();

    let mut backend = open(&location);
    let layer = LayerAddress::new("public.default", "glyphs");
    let mut glyphs = GlyphSetContents::new();
    glyphs.insert("A".to_string(), "A_.glif".to_string());
    let glyph = crate::backend::GlyphAddress {
        layer: layer.clone(),
        glyph_name: "A".to_string(),
        key: "A_.glif".to_string(),
    };
    let mut layers = LayerContents::new();
    layers.insert("public.default".to_string(), "glyphs".to_string());

    backend.write_meta_info(&MetaInfo::default()).unwrap();
    backend
        .write_file_tree(TopLevelFile::FontInfo, &crate::plist::encode(&sample_info()).unwrap())
        .unwrap();
    backend.write_features("languagesystem DFLT dflt;\n").unwrap();
    backend.write_glyph_tree(&glyph, &sample_glyph("A")).unwrap();
    backend.write_glyph_set_contents(&layer, &glyphs).unwrap();
    backend.write_layer_contents(&layers).unwrap();
    backend.close().unwrap();
    drop(backend);

    let mut backend = open(&location);
    assert_eq!(backend.read_meta_info().unwrap(), Some(MetaInfo::default()));
    let info = backend.read_file_tree(TopLevelFile::FontInfo).unwrap().unwrap();
    assert_eq!(crate::plist::decode(&info).unwrap(), sample_info());
    assert_eq!(
        backend.read_features().unwrap().as_deref(),
        Some("languagesystem DFLT dflt;\n")
    );
    assert_eq!(backend.read_layer_contents().unwrap(), Some(layers));
    // Document-shaped backends address glyphs by name and may not keep keys
    let stored = backend.read_glyph_set_contents(&layer).unwrap().unwrap();
    assert_eq!(stored.keys().collect::<Vec<_>>(), glyphs.keys().collect::<Vec<_>>());
    assert_eq!(
        backend.read_glyph_tree(&glyph).unwrap(),
        Some(sample_glyph("A"))
    );
    assert_eq!(backend.read_file_tree(TopLevelFile::Kerning).unwrap(), None);
    backend.close().unwrap();
}

/// A session that only reads leaves the package readable and unchanged.
pub fn read_only_session_changes_nothing<S: Backend>(mut open: impl FnMut(&Path) -> S) {
    let (_dir, location) = scratch_location();

    let mut backend = open(&location);
    backend.write_features("feature kern {} kern;").unwrap();
    backend.close().unwrap();
    drop(backend);

    let before = snapshot(&location);
    let mut backend = open(&location);
    assert!(backend.read_features().unwrap().is_some());
    assert_eq!(backend.read_meta_info().unwrap(), None);
    backend.close().unwrap();
    drop(backend);
    assert_eq!(snapshot(&location), before);
}

/// Names that need escaping map to stable keys across sessions.
pub fn session_names_survive_reopen<S: Backend>(mut open: impl FnMut(&Path) -> S) {
    let (_dir, location) = scratch_location();
    let names = ["A", "a", ".notdef", "a/b", "con", "é"];

    let mut fs = FileSystem::new(open(&location));
    for name in names {
        fs.write_glyph("public.default", name, &sample_glyph(name))
            .unwrap();
        fs.write_glyph("Sketch Layer", name, &sample_glyph(name))
            .unwrap();
    }
    fs.write_glyph_set_contents("public.default").unwrap();
    fs.write_glyph_set_contents("Sketch Layer").unwrap();
    fs.write_layer_contents().unwrap();
    fs.close().unwrap();

    let mut fs = FileSystem::new(open(&location));
    assert_eq!(
        fs.layer_names().unwrap(),
        vec!["public.default", "Sketch Layer"]
    );
    assert_eq!(fs.default_layer_name().unwrap(), "public.default");
    for name in names {
        assert_eq!(
            fs.read_glyph("Sketch Layer", name).unwrap(),
            Some(sample_glyph(name)),
            "glyph {:?}",
            name
        );
    }
    assert_eq!(fs.read_glyph("public.default", "missing").unwrap(), None);
    fs.close().unwrap();
}

/// Modification-independent fingerprint of everything at `location`.
fn snapshot(location: &Path) -> Vec<(std::path::PathBuf, Vec<u8>)> {
    if !location.exists() {
        return Vec::new();
    }
    walkdir::WalkDir::new(location)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let bytes = std::fs::read(entry.path()).unwrap();
            (entry.into_path(), bytes)
        })
        .collect()
}
