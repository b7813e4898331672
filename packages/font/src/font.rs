use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use fontstore_core_store::{Backend, Dict, Error, DEFAULT_LAYER_NAME};

use crate::{FontInfo, GlyphSource, Groups, Kerning, Layer, UfoReaderWriter};

/// Highest package format version this crate reads.
pub const MAX_FORMAT_VERSION: i64 = 3;

/// A font: font-wide data plus an ordered list of layers.
pub struct Font {
    pub info: FontInfo,
    pub groups: Groups,
    pub kerning: Kerning,
    pub lib: Dict,
    pub features: Option<String>,
    layers: Vec<Layer>,
    default_layer_name: String,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            info: FontInfo::default(),
            groups: Groups::new(),
            kerning: Kerning::new(),
            lib: Dict::new(),
            features: None,
            layers: Vec::new(),
            default_layer_name: DEFAULT_LAYER_NAME.to_string(),
        }
    }
}

impl Font {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty in-memory layer at the end of the layer order.
    pub fn new_layer(&mut self, name: &str) -> Result<&mut Layer, Error> {
        if self.has_layer(name) {
            return Err(Error::DuplicateLayer {
                name: name.to_string(),
            });
        }
        self.layers.push(Layer::new(name));
        let index = self.layers.len() - 1;
        Ok(&mut self.layers[index])
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.iter().any(|layer| layer.name() == name)
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name() == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.name() == name)
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(Layer::name).collect()
    }

    pub fn default_layer_name(&self) -> &str {
        &self.default_layer_name
    }

    pub fn set_default_layer_name(&mut self, name: impl Into<String>) {
        self.default_layer_name = name.into();
    }

    /// The default layer, if it exists yet.
    pub fn default_layer_mut(&mut self) -> Option<&mut Layer> {
        let name = self.default_layer_name.clone();
        self.layer_mut(&name)
    }

    /// Append one lazy layer per stored layer, in stored order.
    ///
    /// Layers that already exist in the font are left alone.
    pub fn load_layers<B: Backend + 'static>(
        &mut self,
        reader: &Rc<RefCell<UfoReaderWriter<B>>>,
    ) -> Result<(), Error> {
        let source: Rc<RefCell<dyn GlyphSource>> = reader.clone();
        let names = reader.borrow_mut().layer_names()?;
        for name in names {
            if self.has_layer(&name) {
                debug!("keeping existing layer {:?}", name);
                continue;
            }
            self.layers.push(Layer::load(name, Rc::clone(&source))?);
        }
        Ok(())
    }

    /// Read a whole font from a session. Glyphs stay lazy.
    pub fn load<B: Backend + 'static>(
        reader: &Rc<RefCell<UfoReaderWriter<B>>>,
    ) -> Result<Font, Error> {
        let mut font = Font::new();
        {
            let mut rw = reader.borrow_mut();
            if let Some(meta) = rw.read_meta_info()? {
                if meta.format_version > MAX_FORMAT_VERSION {
                    return Err(Error::not_supported(format!(
                        "format version {}",
                        meta.format_version
                    )));
                }
            }
            font.info = rw.read_info()?.unwrap_or_default();
            font.groups = rw.read_groups()?.unwrap_or_default();
            font.kerning = rw.read_kerning()?.unwrap_or_default();
            font.lib = rw.read_lib()?.unwrap_or_default();
            font.features = rw.read_features()?.filter(|text| !text.is_empty());
            font.default_layer_name = rw.default_layer_name()?;
        }
        font.load_layers(reader)?;
        Ok(font)
    }

    /// Read every glyph that is still lazy.
    pub fn materialize(&mut self) -> Result<(), Error> {
        self.layers.iter_mut().try_for_each(Layer::materialize)
    }

    /// Write the whole font through `writer`. The session is not closed.
    ///
    /// Every font-wide unit is written, so cleared data replaces what the
    /// package held. Glyphs still lazy in a layer loaded from `writer`
    /// itself are already stored there and are kept as they are; lazy
    /// glyphs from any other session are read first.
    pub fn save<B: Backend>(&mut self, writer: &mut UfoReaderWriter<B>) -> Result<(), Error> {
        let target = writer as *const UfoReaderWriter<B> as *const ();
        for layer in self.layers.iter_mut() {
            if !layer.is_backed_by(target) {
                layer.materialize()?;
            }
        }
        writer.set_default_layer_name(&self.default_layer_name);

        writer.write_meta_info()?;
        writer.write_info(&self.info)?;
        writer.write_groups(&self.groups)?;
        writer.write_kerning(&self.kerning)?;
        writer.write_lib(&self.lib)?;
        match &self.features {
            Some(features) => writer.write_features(features)?,
            None => {
                if writer.read_features()?.is_some() {
                    writer.write_features("")?;
                }
            }
        }

        for layer in &self.layers {
            let mut glyphs: Vec<_> = layer.loaded_glyphs().collect();
            glyphs.sort_by(|a, b| a.name.cmp(&b.name));
            debug!("saving {} glyphs in layer {:?}", glyphs.len(), layer.name());
            for glyph in glyphs {
                writer.write_glyph(layer.name(), glyph)?;
            }
            writer.write_glyph_set_contents(layer.name())?;
        }
        writer.write_layer_contents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontstore_core_store::{TopLevelFile, PropertyValue};
    use fontstore_glif::{Number, Point, PointPen, SegmentType};
    use fontstore_stores::{DirectoryStore, MemoryStore};

    fn square(layer: &mut Layer) {
        let glyph = layer.new_glyph("A");
        glyph.width = Number::Integer(600);
        glyph.begin_path(None).unwrap();
        for (x, y) in [(0i64, 0i64), (0, 700), (500, 700), (500, 0)] {
            glyph
                .add_point(Point::new(x, y, SegmentType::Line))
                .unwrap();
        }
        glyph.end_path().unwrap();
    }

    #[test]
    fn duplicate_layers_are_rejected() {
        let mut font = Font::new();
        font.new_layer("public.default").unwrap();
        assert!(matches!(
            font.new_layer("public.default"),
            Err(Error::DuplicateLayer { .. })
        ));
        assert_eq!(font.layer_names(), vec!["public.default"]);
    }

    #[test]
    fn save_then_load() {
        let mut font = Font::new();
        font.info.set("familyName", "Save Test").unwrap();
        font.groups
            .insert("group1".to_string(), vec!["A".to_string(), "B".to_string()]);
        font.kerning
            .insert(("A".to_string(), "B".to_string()), -20.0);
        font.features = Some("languagesystem DFLT dflt;\n".to_string());
        square(font.new_layer("public.default").unwrap());
        font.new_layer("Sketch").unwrap().new_glyph("B");

        let mut writer = UfoReaderWriter::new(MemoryStore::new());
        font.save(&mut writer).unwrap();

        let reader = Rc::new(RefCell::new(writer));
        let mut loaded = Font::load(&reader).unwrap();
        assert_eq!(loaded.layer_names(), vec!["public.default", "Sketch"]);
        assert_eq!(loaded.default_layer_name(), "public.default");
        assert_eq!(loaded.info, font.info);
        assert_eq!(loaded.groups, font.groups);
        assert_eq!(loaded.kerning, font.kerning);
        assert_eq!(loaded.features, font.features);

        let layer = loaded.default_layer_mut().unwrap();
        assert!(!layer.is_loaded("A"));
        let glyph = layer.get("A").unwrap();
        assert_eq!(glyph.contours().count(), 1);
        assert_eq!(glyph.width, Number::Integer(600));
    }

    #[test]
    fn default_layer_gets_the_default_container() {
        let mut font = Font::new();
        font.set_default_layer_name("foreground");
        font.new_layer("background").unwrap();
        font.new_layer("foreground").unwrap();

        let mut writer = UfoReaderWriter::new(MemoryStore::new());
        font.save(&mut writer).unwrap();
        let stored = writer
            .file_system()
            .read_property_file(TopLevelFile::LayerContents)
            .unwrap()
            .unwrap();
        let pairs = stored.as_list().unwrap();
        assert_eq!(
            pairs[1],
            PropertyValue::from(vec!["foreground", "glyphs"])
        );

        let reader = Rc::new(RefCell::new(writer));
        let loaded = Font::load(&reader).unwrap();
        assert_eq!(loaded.default_layer_name(), "foreground");
        assert_eq!(loaded.layer_names(), vec!["background", "foreground"]);
    }

    #[test]
    fn newer_formats_are_not_supported() {
        let mut writer = UfoReaderWriter::new(MemoryStore::new());
        writer
            .file_system()
            .write_meta_info(&fontstore_core_store::MetaInfo {
                creator: "future".to_string(),
                format_version: 4,
            })
            .unwrap();
        let reader = Rc::new(RefCell::new(writer));
        assert!(matches!(
            Font::load(&reader),
            Err(Error::NotSupported { .. })
        ));
    }

    #[test]
    fn resave_into_the_same_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Test.ufo");

        let mut font = Font::new();
        square(font.new_layer("public.default").unwrap());
        let mut writer = UfoReaderWriter::new(DirectoryStore::new(&path).unwrap());
        font.save(&mut writer).unwrap();
        writer.close().unwrap();

        let reader = Rc::new(RefCell::new(UfoReaderWriter::new(
            DirectoryStore::new(&path).unwrap(),
        )));
        let mut loaded = Font::load(&reader).unwrap();
        loaded.new_layer("Sketch").unwrap().new_glyph("A").width = Number::Integer(10);
        {
            let mut session = reader.borrow_mut();
            loaded.save(&mut *session).unwrap();
        }
        assert!(!loaded.default_layer_mut().unwrap().is_loaded("A"));
        drop(loaded);

        let reader = Rc::try_unwrap(reader).ok().unwrap().into_inner();
        reader.close().unwrap();

        let reader = Rc::new(RefCell::new(UfoReaderWriter::new(
            DirectoryStore::new(&path).unwrap(),
        )));
        let mut again = Font::load(&reader).unwrap();
        assert_eq!(again.layer_names(), vec!["public.default", "Sketch"]);
        let glyph = again.layer_mut("public.default").unwrap().get("A").unwrap();
        assert_eq!(glyph.contours().count(), 1);
        assert_eq!(
            again.layer_mut("Sketch").unwrap().get("A").unwrap().width,
            Number::Integer(10)
        );
    }
}
