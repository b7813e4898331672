//! The semantic backend contract.
//!
//! Every unit of a font package is routed through the default methods of
//! [`Backend`] down to the byte layer. A backend whose native form is not a
//! set of byte blobs overrides the routing points it represents natively.

use bytes::Bytes;
use indexmap::IndexMap;
use log::debug;

use fontstore_ll_store::LLStore;

use crate::plist::{self, PLIST_HEADER};
use crate::xml::{self, Element, XML_DECLARATION};
use crate::{Dict, Error, PropertyValue, StorageKey};

/// Layer name to container key, in layer order.
pub type LayerContents = IndexMap<String, String>;

/// Glyph name to glyph key within a layer container.
pub type GlyphSetContents = IndexMap<String, String>;

/// Container reserved for the default layer.
pub const DEFAULT_LAYER_CONTAINER: &str = "glyphs";

/// Layer name used when no stored layer sits in the default container.
pub const DEFAULT_LAYER_NAME: &str = "public.default";

/// Name of the per-layer glyph mapping file.
pub const GLYPH_SET_CONTENTS: &str = "contents.plist";

/// The well-known top-level units of a font package.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TopLevelFile {
    MetaInfo,
    FontInfo,
    Groups,
    Kerning,
    Lib,
    Features,
    LayerContents,
}

impl TopLevelFile {
    pub const ALL: [TopLevelFile; 7] = [
        TopLevelFile::MetaInfo,
        TopLevelFile::FontInfo,
        TopLevelFile::Groups,
        TopLevelFile::Kerning,
        TopLevelFile::Lib,
        TopLevelFile::Features,
        TopLevelFile::LayerContents,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            TopLevelFile::MetaInfo => "metainfo.plist",
            TopLevelFile::FontInfo => "fontinfo.plist",
            TopLevelFile::Groups => "groups.plist",
            TopLevelFile::Kerning => "kerning.plist",
            TopLevelFile::Lib => "lib.plist",
            TopLevelFile::Features => "features.fea",
            TopLevelFile::LayerContents => "layercontents.plist",
        }
    }

    /// Short name, used as the element tag by document-shaped backends.
    pub fn tag(self) -> &'static str {
        match self {
            TopLevelFile::MetaInfo => "metainfo",
            TopLevelFile::FontInfo => "fontinfo",
            TopLevelFile::Groups => "groups",
            TopLevelFile::Kerning => "kerning",
            TopLevelFile::Lib => "lib",
            TopLevelFile::Features => "features",
            TopLevelFile::LayerContents => "layercontents",
        }
    }

    pub fn key(self) -> StorageKey {
        StorageKey::well_known(self.file_name())
    }
}

/// Package format metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaInfo {
    pub creator: String,
    pub format_version: i64,
}

impl Default for MetaInfo {
    fn default() -> Self {
        MetaInfo {
            creator: "org.fontstore".to_string(),
            format_version: 3,
        }
    }
}

impl MetaInfo {
    pub fn to_property(&self) -> PropertyValue {
        let mut dict = Dict::new();
        dict.insert("creator".to_string(), self.creator.as_str().into());
        dict.insert("formatVersion".to_string(), self.format_version.into());
        PropertyValue::Dict(dict)
    }

    pub fn from_property(value: &PropertyValue) -> Result<Self, Error> {
        let creator = value
            .get("creator")
            .and_then(PropertyValue::as_str)
            .ok_or_else(|| Error::malformed("metainfo has no creator string"))?;
        let format_version = value
            .get("formatVersion")
            .and_then(PropertyValue::as_i64)
            .ok_or_else(|| Error::malformed("metainfo has no integer formatVersion"))?;
        Ok(MetaInfo {
            creator: creator.to_string(),
            format_version,
        })
    }
}

/// A layer with its resolved container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerAddress {
    pub layer_name: String,
    pub container: String,
}

impl LayerAddress {
    pub fn new(layer_name: impl Into<String>, container: impl Into<String>) -> Self {
        LayerAddress {
            layer_name: layer_name.into(),
            container: container.into(),
        }
    }

    /// Key of the layer's glyph mapping file.
    pub fn contents_key(&self) -> Result<StorageKey, Error> {
        StorageKey::parse(&self.container)?.join(GLYPH_SET_CONTENTS)
    }
}

/// A glyph with its layer and resolved key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphAddress {
    pub layer: LayerAddress,
    pub glyph_name: String,
    /// Key within the layer container.
    pub key: String,
}

impl GlyphAddress {
    pub fn storage_key(&self) -> Result<StorageKey, Error> {
        StorageKey::parse(&self.layer.container)?.join(&self.key)
    }
}

/// A storage backend for one physical font package.
///
/// All methods have defaults that route through [`LLStore`]. Backends
/// override the points they store natively.
pub trait Backend: LLStore {
    fn read_bytes(&mut self, key: &StorageKey) -> Result<Option<Bytes>, Error> {
        debug!("reading {}", key);
        Ok(self.ll_read(&key.as_ll())?)
    }

    fn write_bytes(&mut self, key: &StorageKey, data: Bytes) -> Result<(), Error> {
        debug!("writing {} ({} bytes)", key, data.len());
        Ok(self.ll_write(&key.as_ll(), data)?)
    }

    fn read_tree(&mut self, key: &StorageKey) -> Result<Option<Element>, Error> {
        match self.read_bytes(key)? {
            Some(bytes) => xml::parse(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn write_tree(&mut self, key: &StorageKey, tree: &Element, header: &str) -> Result<(), Error> {
        self.write_bytes(key, Bytes::from(xml::write(tree, header)))
    }

    /// Read a plist-shaped top-level unit as its `<plist>` tree.
    fn read_file_tree(&mut self, file: TopLevelFile) -> Result<Option<Element>, Error> {
        self.read_tree(&file.key())
    }

    fn write_file_tree(&mut self, file: TopLevelFile, tree: &Element) -> Result<(), Error> {
        self.write_tree(&file.key(), tree, PLIST_HEADER)
    }

    fn read_meta_info(&mut self) -> Result<Option<MetaInfo>, Error> {
        match self.read_file_tree(TopLevelFile::MetaInfo)? {
            Some(tree) => MetaInfo::from_property(&plist::decode(&tree)?).map(Some),
            None => Ok(None),
        }
    }

    fn write_meta_info(&mut self, meta: &MetaInfo) -> Result<(), Error> {
        let tree = plist::encode(&meta.to_property())?;
        self.write_file_tree(TopLevelFile::MetaInfo, &tree)
    }

    fn read_features(&mut self) -> Result<Option<String>, Error> {
        match self.read_bytes(&TopLevelFile::Features.key())? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| Error::malformed(format!("features are not UTF-8: {}", e))),
            None => Ok(None),
        }
    }

    fn write_features(&mut self, text: &str) -> Result<(), Error> {
        self.write_bytes(
            &TopLevelFile::Features.key(),
            Bytes::copy_from_slice(text.as_bytes()),
        )
    }

    fn read_layer_contents(&mut self) -> Result<Option<LayerContents>, Error> {
        match self.read_file_tree(TopLevelFile::LayerContents)? {
            Some(tree) => layer_contents_from_property(&plist::decode(&tree)?).map(Some),
            None => Ok(None),
        }
    }

    fn write_layer_contents(&mut self, contents: &LayerContents) -> Result<(), Error> {
        let tree = plist::encode_list(&layer_contents_to_property(contents));
        self.write_file_tree(TopLevelFile::LayerContents, &tree)
    }

    fn read_glyph_set_contents(
        &mut self,
        layer: &LayerAddress,
    ) -> Result<Option<GlyphSetContents>, Error> {
        match self.read_tree(&layer.contents_key()?)? {
            Some(tree) => glyph_set_contents_from_property(plist::decode(&tree)?).map(Some),
            None => Ok(None),
        }
    }

    fn write_glyph_set_contents(
        &mut self,
        layer: &LayerAddress,
        contents: &GlyphSetContents,
    ) -> Result<(), Error> {
        let dict: Dict = contents
            .iter()
            .map(|(name, key)| (name.clone(), PropertyValue::from(key.as_str())))
            .collect();
        let tree = plist::encode(&PropertyValue::Dict(dict))?;
        self.write_tree(&layer.contents_key()?, &tree, PLIST_HEADER)
    }

    fn read_glyph_tree(&mut self, glyph: &GlyphAddress) -> Result<Option<Element>, Error> {
        self.read_tree(&glyph.storage_key()?)
    }

    fn write_glyph_tree(&mut self, glyph: &GlyphAddress, tree: &Element) -> Result<(), Error> {
        self.write_tree(&glyph.storage_key()?, tree, XML_DECLARATION)
    }

    /// Finish the session. Writes are durable once this returns `Ok`.
    fn close(&mut self) -> Result<(), Error> {
        Ok(self.ll_close()?)
    }
}

/// Convert the `[[name, container], ...]` plist form.
pub fn layer_contents_from_property(value: &PropertyValue) -> Result<LayerContents, Error> {
    let pairs = value
        .as_list()
        .ok_or_else(|| Error::malformed("layer contents must be an array"))?;

    let mut contents = LayerContents::with_capacity(pairs.len());
    for pair in pairs {
        match pair.as_list() {
            Some([PropertyValue::String(name), PropertyValue::String(container)]) => {
                if contents.insert(name.clone(), container.clone()).is_some() {
                    return Err(Error::malformed(format!("layer {:?} listed twice", name)));
                }
            }
            _ => {
                return Err(Error::malformed(
                    "layer contents entries must be [name, container] string pairs",
                ))
            }
        }
    }
    Ok(contents)
}

pub fn layer_contents_to_property(contents: &LayerContents) -> Vec<PropertyValue> {
    contents
        .iter()
        .map(|(name, container)| PropertyValue::from(vec![name.as_str(), container.as_str()]))
        .collect()
}

fn glyph_set_contents_from_property(value: PropertyValue) -> Result<GlyphSetContents, Error> {
    value
        .into_dict()?
        .into_iter()
        .map(|(name, key)| match key {
            PropertyValue::String(key) => Ok((name, key)),
            other => Err(Error::malformed(format!(
                "glyph {:?} maps to a {} instead of a key",
                name,
                other.type_name()
            ))),
        })
        .collect()
}

// Forwarding so `Box<dyn Backend>` and `&mut B` are backends too.

macro_rules! forward_backend {
    ($($ty:ty),*) => {$(
        impl<T: Backend + ?Sized> Backend for $ty {
            fn read_bytes(&mut self, key: &StorageKey) -> Result<Option<Bytes>, Error> {
                (**self).read_bytes(key)
            }

            fn write_bytes(&mut self, key: &StorageKey, data: Bytes) -> Result<(), Error> {
                (**self).write_bytes(key, data)
            }

            fn read_tree(&mut self, key: &StorageKey) -> Result<Option<Element>, Error> {
                (**self).read_tree(key)
            }

            fn write_tree(&mut self, key: &StorageKey, tree: &Element, header: &str) -> Result<(), Error> {
                (**self).write_tree(key, tree, header)
            }

            fn read_file_tree(&mut self, file: TopLevelFile) -> Result<Option<Element>, Error> {
                (**self).read_file_tree(file)
            }

            fn write_file_tree(&mut self, file: TopLevelFile, tree: &Element) -> Result<(), Error> {
                (**self).write_file_tree(file, tree)
            }

            fn read_meta_info(&mut self) -> Result<Option<MetaInfo>, Error> {
                (**self).read_meta_info()
            }

            fn write_meta_info(&mut self, meta: &MetaInfo) -> Result<(), Error> {
                (**self).write_meta_info(meta)
            }

            fn read_features(&mut self) -> Result<Option<String>, Error> {
                (**self).read_features()
            }

            fn write_features(&mut self, text: &str) -> Result<(), Error> {
                (**self).write_features(text)
            }

            fn read_layer_contents(&mut self) -> Result<Option<LayerContents>, Error> {
                (**self).read_layer_contents()
            }

            fn write_layer_contents(&mut self, contents: &LayerContents) -> Result<(), Error> {
                (**self).write_layer_contents(contents)
            }

            fn read_glyph_set_contents(
                &mut self,
                layer: &LayerAddress,
            ) -> Result<Option<GlyphSetContents>, Error> {
                (**self).read_glyph_set_contents(layer)
            }

            fn write_glyph_set_contents(
                &mut self,
                layer: &LayerAddress,
                contents: &GlyphSetContents,
            ) -> Result<(), Error> {
                (**self).write_glyph_set_contents(layer, contents)
            }

            fn read_glyph_tree(&mut self, glyph: &GlyphAddress) -> Result<Option<Element>, Error> {
                (**self).read_glyph_tree(glyph)
            }

            fn write_glyph_tree(&mut self, glyph: &GlyphAddress, tree: &Element) -> Result<(), Error> {
                (**self).write_glyph_tree(glyph, tree)
            }

            fn close(&mut self) -> Result<(), Error> {
                (**self).close()
            }
        }
    )*};
}

forward_backend!(Box<T>, &mut T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MapBackend;

    fn text(backend: &MapBackend, key: &str) -> String {
        String::from_utf8(backend.data[key].to_vec()).unwrap()
    }

    #[test]
    fn well_known_file_names() {
        let names: Vec<&str> = TopLevelFile::ALL.iter().map(|f| f.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "metainfo.plist",
                "fontinfo.plist",
                "groups.plist",
                "kerning.plist",
                "lib.plist",
                "features.fea",
                "layercontents.plist",
            ]
        );
    }

    #[test]
    fn meta_info_routes_to_metainfo_plist() {
        let mut backend = MapBackend::default();
        backend.write_meta_info(&MetaInfo::default()).unwrap();

        let written = text(&backend, "metainfo.plist");
        assert!(written.starts_with(PLIST_HEADER));
        assert!(written.contains("<key>creator</key>"));
        assert!(written.contains("<string>org.fontstore</string>"));
        assert!(written.contains("<integer>3</integer>"));

        assert_eq!(backend.read_meta_info().unwrap(), Some(MetaInfo::default()));
    }

    #[test]
    fn missing_units_read_as_none() {
        let mut backend = MapBackend::default();
        assert_eq!(backend.read_meta_info().unwrap(), None);
        assert_eq!(backend.read_features().unwrap(), None);
        assert_eq!(backend.read_layer_contents().unwrap(), None);
        assert_eq!(backend.read_file_tree(TopLevelFile::Lib).unwrap(), None);
        let layer = LayerAddress::new("public.default", "glyphs");
        assert_eq!(backend.read_glyph_set_contents(&layer).unwrap(), None);
    }

    #[test]
    fn features_are_raw_text() {
        let mut backend = MapBackend::default();
        backend.write_features("feature liga {\n} liga;\n").unwrap();
        assert_eq!(text(&backend, "features.fea"), "feature liga {\n} liga;\n");
        assert_eq!(
            backend.read_features().unwrap().as_deref(),
            Some("feature liga {\n} liga;\n")
        );
    }

    #[test]
    fn layer_contents_keep_order() {
        let mut backend = MapBackend::default();
        let mut contents = LayerContents::new();
        contents.insert("public.default".to_string(), "glyphs".to_string());
        contents.insert("Sketch".to_string(), "glyphs.S_ketch".to_string());
        backend.write_layer_contents(&contents).unwrap();

        let read = backend.read_layer_contents().unwrap().unwrap();
        let names: Vec<&str> = read.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["public.default", "Sketch"]);
        assert_eq!(read["Sketch"], "glyphs.S_ketch");
    }

    #[test]
    fn malformed_layer_contents_are_rejected() {
        let bad = PropertyValue::from(vec![PropertyValue::from(vec!["only-one"])]);
        assert!(layer_contents_from_property(&bad).is_err());
        assert!(layer_contents_from_property(&PropertyValue::dict()).is_err());
    }

    #[test]
    fn glyph_units_live_in_the_layer_container() {
        let mut backend = MapBackend::default();
        let layer = LayerAddress::new("Sketch", "glyphs.S_ketch");
        let mut contents = GlyphSetContents::new();
        contents.insert("A".to_string(), "A_.glif".to_string());
        backend.write_glyph_set_contents(&layer, &contents).unwrap();

        let glyph = GlyphAddress {
            layer: layer.clone(),
            glyph_name: "A".to_string(),
            key: "A_.glif".to_string(),
        };
        let tree = Element::new("glyph").with_attr("name", "A");
        backend.write_glyph_tree(&glyph, &tree).unwrap();

        assert!(backend.data.contains_key("glyphs.S_ketch/contents.plist"));
        assert!(text(&backend, "glyphs.S_ketch/A_.glif").starts_with(XML_DECLARATION));
        assert_eq!(
            backend.read_glyph_set_contents(&layer).unwrap(),
            Some(contents)
        );
        assert_eq!(backend.read_glyph_tree(&glyph).unwrap(), Some(tree));
    }

    #[test]
    fn boxed_backends_forward() {
        let mut boxed: Box<dyn Backend> = Box::new(MapBackend::default());
        boxed.write_features("x").unwrap();
        assert_eq!(boxed.read_features().unwrap().as_deref(), Some("x"));
        boxed.close().unwrap();
    }

    #[test]
    fn meta_info_requires_fields() {
        assert!(MetaInfo::from_property(&PropertyValue::dict()).is_err());
    }
}
