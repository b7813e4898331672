//! The storage session.
//!
//! A [`FileSystem`] wraps one backend and owns the name-to-key mappings for
//! the session: the layer mapping (read once, lazily) and one glyph mapping
//! per layer (read on first use). New names get keys from `keynames`; reads
//! of unmapped names return `None` and never mint a key.

use std::collections::HashMap;

use log::debug;

use keynames::KeyOptions;

use crate::backend::{
    Backend, GlyphAddress, GlyphSetContents, LayerAddress, LayerContents, MetaInfo, TopLevelFile,
    DEFAULT_LAYER_CONTAINER, DEFAULT_LAYER_NAME,
};
use crate::plist;
use crate::xml::Element;
use crate::{Error, PropertyValue};

/// Prefix of every non-default layer container.
pub const LAYER_CONTAINER_PREFIX: &str = "glyphs.";

/// Suffix of every glyph key.
pub const GLYPH_KEY_SUFFIX: &str = ".glif";

/// One open font package.
pub struct FileSystem<B: Backend> {
    backend: B,
    layers: Option<LayerContents>,
    glyphs: HashMap<String, GlyphSetContents>,
    default_layer_name: Option<String>,
}

impl<B: Backend> FileSystem<B> {
    pub fn new(backend: B) -> Self {
        FileSystem {
            backend,
            layers: None,
            glyphs: HashMap::new(),
            default_layer_name: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // Top-level units

    pub fn read_meta_info(&mut self) -> Result<Option<MetaInfo>, Error> {
        self.backend.read_meta_info()
    }

    pub fn write_meta_info(&mut self, meta: &MetaInfo) -> Result<(), Error> {
        self.backend.write_meta_info(meta)
    }

    /// Read a plist-shaped top-level unit.
    pub fn read_property_file(
        &mut self,
        file: TopLevelFile,
    ) -> Result<Option<PropertyValue>, Error> {
        match self.backend.read_file_tree(file)? {
            Some(tree) => plist::decode(&tree).map(Some),
            None => Ok(None),
        }
    }

    /// Write a dictionary-rooted top-level unit.
    pub fn write_property_file(
        &mut self,
        file: TopLevelFile,
        value: &PropertyValue,
    ) -> Result<(), Error> {
        let tree = plist::encode(value)?;
        self.backend.write_file_tree(file, &tree)
    }

    pub fn read_features(&mut self) -> Result<Option<String>, Error> {
        self.backend.read_features()
    }

    pub fn write_features(&mut self, text: &str) -> Result<(), Error> {
        self.backend.write_features(text)
    }

    // Layers

    fn layers(&mut self) -> Result<&mut LayerContents, Error> {
        if self.layers.is_none() {
            let contents = self.backend.read_layer_contents()?.unwrap_or_default();
            debug!("loaded layer mapping with {} layers", contents.len());
            self.layers = Some(contents);
        }
        Ok(self.layers.get_or_insert_with(LayerContents::new))
    }

    /// The layer mapping, in layer order.
    pub fn layer_mapping(&mut self) -> Result<&LayerContents, Error> {
        Ok(self.layers()?)
    }

    pub fn layer_names(&mut self) -> Result<Vec<String>, Error> {
        Ok(self.layers()?.keys().cloned().collect())
    }

    /// The layer stored in the default container, else `public.default`.
    pub fn default_layer_name(&mut self) -> Result<String, Error> {
        if let Some(name) = &self.default_layer_name {
            return Ok(name.clone());
        }
        let name = self
            .layers()?
            .iter()
            .find(|(_, container)| container.as_str() == DEFAULT_LAYER_CONTAINER)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| DEFAULT_LAYER_NAME.to_string());
        self.default_layer_name = Some(name.clone());
        Ok(name)
    }

    pub fn set_default_layer_name(&mut self, name: impl Into<String>) {
        self.default_layer_name = Some(name.into());
    }

    /// Container of a layer, assigning one if the layer is new.
    pub fn layer_container(&mut self, layer_name: &str) -> Result<String, Error> {
        if let Some(container) = self.layers()?.get(layer_name) {
            return Ok(container.clone());
        }

        let default_name = self.default_layer_name()?;
        let layers = self.layers()?;
        let default_free = !layers
            .values()
            .any(|c| c.as_str() == DEFAULT_LAYER_CONTAINER);

        let container = if layer_name == default_name && default_free {
            DEFAULT_LAYER_CONTAINER.to_string()
        } else {
            let options = KeyOptions::default().with_prefix(LAYER_CONTAINER_PREFIX);
            keynames::assign(layer_name, layers.values().map(String::as_str), &options)
                .map_err(|e| Error::invalid_name(layer_name, e))?
        };

        debug!("assigned container {} to layer {:?}", container, layer_name);
        layers.insert(layer_name.to_string(), container.clone());
        Ok(container)
    }

    /// Address of a layer, assigning a container if the layer is new.
    pub fn layer_address(&mut self, layer_name: &str) -> Result<LayerAddress, Error> {
        let container = self.layer_container(layer_name)?;
        Ok(LayerAddress::new(layer_name, container))
    }

    fn existing_layer_address(&mut self, layer_name: &str) -> Result<Option<LayerAddress>, Error> {
        Ok(self
            .layers()?
            .get(layer_name)
            .map(|container| LayerAddress::new(layer_name, container.as_str())))
    }

    pub fn write_layer_contents(&mut self) -> Result<(), Error> {
        let contents = self.layers()?.clone();
        self.backend.write_layer_contents(&contents)
    }

    // Glyphs

    fn glyphs(&mut self, layer_name: &str) -> Result<&mut GlyphSetContents, Error> {
        if !self.glyphs.contains_key(layer_name) {
            let contents = match self.existing_layer_address(layer_name)? {
                Some(layer) => self
                    .backend
                    .read_glyph_set_contents(&layer)?
                    .unwrap_or_default(),
                None => GlyphSetContents::new(),
            };
            debug!(
                "loaded glyph mapping for layer {:?} with {} glyphs",
                layer_name,
                contents.len()
            );
            self.glyphs.insert(layer_name.to_string(), contents);
        }
        Ok(self.glyphs.entry(layer_name.to_string()).or_default())
    }

    /// The glyph mapping of a layer. Unknown layers have an empty mapping.
    pub fn glyph_mapping(&mut self, layer_name: &str) -> Result<&GlyphSetContents, Error> {
        Ok(self.glyphs(layer_name)?)
    }

    pub fn glyph_names(&mut self, layer_name: &str) -> Result<Vec<String>, Error> {
        Ok(self.glyphs(layer_name)?.keys().cloned().collect())
    }

    /// Key of a glyph within its layer, assigning one if the glyph is new.
    pub fn glyph_key(&mut self, layer_name: &str, glyph_name: &str) -> Result<String, Error> {
        let glyphs = self.glyphs(layer_name)?;
        if let Some(key) = glyphs.get(glyph_name) {
            return Ok(key.clone());
        }

        let options = KeyOptions::default().with_suffix(GLYPH_KEY_SUFFIX);
        let key = keynames::assign(glyph_name, glyphs.values().map(String::as_str), &options)
            .map_err(|e| Error::invalid_name(glyph_name, e))?;
        glyphs.insert(glyph_name.to_string(), key.clone());
        Ok(key)
    }

    /// Read a glyph tree. Unmapped glyphs read as `None`; a layer the
    /// package does not have is `LayerNotFound`.
    pub fn read_glyph(
        &mut self,
        layer_name: &str,
        glyph_name: &str,
    ) -> Result<Option<Element>, Error> {
        let layer = self
            .existing_layer_address(layer_name)?
            .ok_or_else(|| Error::LayerNotFound {
                name: layer_name.to_string(),
            })?;
        let Some(key) = self.glyphs(layer_name)?.get(glyph_name).cloned() else {
            return Ok(None);
        };
        let address = GlyphAddress {
            layer,
            glyph_name: glyph_name.to_string(),
            key,
        };
        self.backend.read_glyph_tree(&address)
    }

    /// Write a glyph tree, assigning layer and glyph keys as needed.
    pub fn write_glyph(
        &mut self,
        layer_name: &str,
        glyph_name: &str,
        tree: &Element,
    ) -> Result<(), Error> {
        let layer = self.layer_address(layer_name)?;
        let key = self.glyph_key(layer_name, glyph_name)?;
        let address = GlyphAddress {
            layer,
            glyph_name: glyph_name.to_string(),
            key,
        };
        self.backend.write_glyph_tree(&address, tree)
    }

    pub fn write_glyph_set_contents(&mut self, layer_name: &str) -> Result<(), Error> {
        let layer = self.layer_address(layer_name)?;
        let contents = self.glyphs(layer_name)?.clone();
        self.backend.write_glyph_set_contents(&layer, &contents)
    }

    /// Finish the session and release the backend.
    pub fn close(mut self) -> Result<(), Error> {
        self.backend.close()
    }
}
