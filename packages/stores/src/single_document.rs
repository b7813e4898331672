//! Font packages as one XML document.
//!
//! ```text
//! <font creator="org.fontstore" formatVersion="3">
//!     <fontinfo><dict>...</dict></fontinfo>
//!     <groups>...</groups>
//!     <kerning>...</kerning>
//!     <lib>...</lib>
//!     <features>...</features>
//!     <glyphs name="public.default" container="glyphs">
//!         <glyph name="A" format="2">...</glyph>
//!     </glyphs>
//! </font>
//! ```
//!
//! The document is the only native unit, so raw byte access is not
//! supported. Every routing point of [`Backend`] is overridden instead.

use std::path;

use log::{debug, info};

use fontstore_core_store::xml::{self, Element, XML_DECLARATION};
use fontstore_core_store::{
    layer_contents_from_property, layer_contents_to_property, plist, Backend, Bytes, Error,
    GlyphAddress, GlyphSetContents, LLError, LLPath, LLReader, LLWriter, LayerAddress,
    LayerContents, MetaInfo, TopLevelFile,
};

const ROOT_TAG: &str = "font";
const LAYER_TAG: &str = "glyphs";
const GLYPH_TAG: &str = "glyph";

/// Position of a top-level element in a freshly written document.
fn rank(tag: &str) -> usize {
    match tag {
        "fontinfo" => 0,
        "groups" => 1,
        "kerning" => 2,
        "lib" => 3,
        "features" => 4,
        _ => 5,
    }
}

/// A whole font package in a single XML file.
///
/// The document is loaded when the store is opened and written back by
/// `close`, through a temporary file renamed into place, if anything changed.
pub struct SingleDocumentStore {
    path: path::PathBuf,
    document: Element,
    dirty: bool,
}

impl SingleDocumentStore {
    /// Open the document at `path`. A missing file is an empty package.
    pub fn new(path: impl Into<path::PathBuf>) -> Result<SingleDocumentStore, Error> {
        let path = path.into();
        let document = match std::fs::read(&path) {
            Ok(data) => {
                debug!("Loading document {}...", path.display());
                let document = xml::parse(&data)?;
                if document.tag != ROOT_TAG {
                    return Err(Error::malformed(format!(
                        "expected <{}> root, found <{}>",
                        ROOT_TAG, document.tag
                    )));
                }
                document
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Element::new(ROOT_TAG),
            Err(error) => return Err(error.into()),
        };
        Ok(SingleDocumentStore {
            path,
            document,
            dirty: false,
        })
    }

    pub fn path(&self) -> &path::Path {
        &self.path
    }

    /// The document as it would be saved.
    pub fn document(&self) -> &Element {
        &self.document
    }

    fn save(&mut self) -> Result<(), LLError> {
        use std::io::Write;

        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => path::PathBuf::from("."),
        };
        let data = xml::write(&self.document, XML_DECLARATION);
        let mut temp = tempfile::NamedTempFile::new_in(directory)?;
        temp.write_all(&data)?;
        temp.persist(&self.path).map_err(|e| LLError::from(e.error))?;
        info!("Saved {} ({} bytes)", self.path.display(), data.len());
        self.dirty = false;
        Ok(())
    }

    /// Insert or replace a top-level element, keeping the canonical order.
    fn place(&mut self, element: Element) {
        self.dirty = true;
        let children = &mut self.document.children;
        if let Some(existing) = children.iter_mut().find(|c| c.tag == element.tag) {
            *existing = element;
            return;
        }
        let position = children
            .iter()
            .position(|c| rank(&c.tag) > rank(&element.tag))
            .unwrap_or(children.len());
        children.insert(position, element);
    }

    fn layer(&self, layer_name: &str) -> Option<&Element> {
        self.document
            .children
            .iter()
            .find(|c| c.tag == LAYER_TAG && c.attr("name") == Some(layer_name))
    }

    /// The element of a layer, appended if the layer is new.
    fn layer_mut(&mut self, layer: &LayerAddress) -> &mut Element {
        self.dirty = true;
        let children = &mut self.document.children;
        let index = match children
            .iter()
            .position(|c| c.tag == LAYER_TAG && c.attr("name") == Some(layer.layer_name.as_str()))
        {
            Some(index) => index,
            None => {
                children.push(
                    Element::new(LAYER_TAG)
                        .with_attr("name", layer.layer_name.as_str())
                        .with_attr("container", layer.container.as_str()),
                );
                children.len() - 1
            }
        };
        let element = &mut children[index];
        element.set_attr("container", layer.container.as_str());
        element
    }
}

impl LLReader for SingleDocumentStore {
    fn ll_read(&mut self, _key: &[&str]) -> Result<Option<Bytes>, LLError> {
        Err(LLError::NotSupported)
    }

    fn ll_list(&mut self) -> Result<Vec<LLPath>, LLError> {
        Err(LLError::NotSupported)
    }
}

impl LLWriter for SingleDocumentStore {
    fn ll_write(&mut self, _key: &[&str], _data: Bytes) -> Result<(), LLError> {
        Err(LLError::NotSupported)
    }

    fn ll_close(&mut self) -> Result<(), LLError> {
        if self.dirty {
            self.save()?;
        }
        Ok(())
    }
}

impl Backend for SingleDocumentStore {
    fn read_file_tree(&mut self, file: TopLevelFile) -> Result<Option<Element>, Error> {
        match file {
            TopLevelFile::MetaInfo => match self.read_meta_info()? {
                Some(meta) => plist::encode(&meta.to_property()).map(Some),
                None => Ok(None),
            },
            TopLevelFile::LayerContents => Ok(self
                .read_layer_contents()?
                .map(|contents| plist::encode_list(&layer_contents_to_property(&contents)))),
            TopLevelFile::Features => Err(Error::not_supported("features as a property tree")),
            _ => Ok(self.document.child(file.tag()).map(|element| Element {
                tag: "plist".to_string(),
                attributes: [("version".to_string(), "1.0".to_string())]
                    .into_iter()
                    .collect(),
                children: element.children.clone(),
                text: String::new(),
            })),
        }
    }

    fn write_file_tree(&mut self, file: TopLevelFile, tree: &Element) -> Result<(), Error> {
        match file {
            TopLevelFile::MetaInfo => {
                self.write_meta_info(&MetaInfo::from_property(&plist::decode(tree)?)?)
            }
            TopLevelFile::LayerContents => {
                self.write_layer_contents(&layer_contents_from_property(&plist::decode(tree)?)?)
            }
            TopLevelFile::Features => Err(Error::not_supported("features as a property tree")),
            _ => {
                if tree.tag != "plist" {
                    return Err(Error::malformed("top-level units must be <plist> trees"));
                }
                debug!("Setting <{}> in {}", file.tag(), self.path.display());
                self.place(Element {
                    tag: file.tag().to_string(),
                    children: tree.children.clone(),
                    ..Default::default()
                });
                Ok(())
            }
        }
    }

    fn read_meta_info(&mut self) -> Result<Option<MetaInfo>, Error> {
        let creator = self.document.attr("creator");
        let version = self.document.attr("formatVersion");
        match (creator, version) {
            (None, None) => Ok(None),
            (Some(creator), Some(version)) => {
                let format_version = version.trim().parse().map_err(|_| {
                    Error::malformed(format!("formatVersion {:?} is not an integer", version))
                })?;
                Ok(Some(MetaInfo {
                    creator: creator.to_string(),
                    format_version,
                }))
            }
            _ => Err(Error::malformed(
                "document needs both creator and formatVersion",
            )),
        }
    }

    fn write_meta_info(&mut self, meta: &MetaInfo) -> Result<(), Error> {
        self.dirty = true;
        self.document.set_attr("creator", meta.creator.as_str());
        self.document
            .set_attr("formatVersion", meta.format_version.to_string());
        Ok(())
    }

    fn read_features(&mut self) -> Result<Option<String>, Error> {
        Ok(self
            .document
            .child(TopLevelFile::Features.tag())
            .map(|element| element.text.clone()))
    }

    fn write_features(&mut self, text: &str) -> Result<(), Error> {
        self.place(Element::new(TopLevelFile::Features.tag()).with_text(text));
        Ok(())
    }

    fn read_layer_contents(&mut self) -> Result<Option<LayerContents>, Error> {
        let mut contents = LayerContents::new();
        for element in self.document.children.iter().filter(|c| c.tag == LAYER_TAG) {
            let name = element
                .attr("name")
                .ok_or_else(|| Error::malformed("<glyphs> without a name"))?;
            let container = element.attr("container").unwrap_or(name);
            contents.insert(name.to_string(), container.to_string());
        }
        Ok((!contents.is_empty()).then_some(contents))
    }

    fn write_layer_contents(&mut self, contents: &LayerContents) -> Result<(), Error> {
        for (name, container) in contents {
            self.layer_mut(&LayerAddress::new(name.as_str(), container.as_str()));
        }

        // Listed layers in order, anything else after them
        let children = std::mem::take(&mut self.document.children);
        let (layers, mut others): (Vec<Element>, Vec<Element>) =
            children.into_iter().partition(|c| c.tag == LAYER_TAG);
        let (mut listed, unlisted): (Vec<Element>, Vec<Element>) = layers
            .into_iter()
            .partition(|c| c.attr("name").is_some_and(|n| contents.contains_key(n)));
        listed.sort_by_key(|c| c.attr("name").and_then(|n| contents.get_index_of(n)));
        others.extend(listed);
        others.extend(unlisted);
        self.document.children = others;
        Ok(())
    }

    fn read_glyph_set_contents(
        &mut self,
        layer: &LayerAddress,
    ) -> Result<Option<GlyphSetContents>, Error> {
        let Some(element) = self.layer(&layer.layer_name) else {
            return Ok(None);
        };
        let mut contents = GlyphSetContents::new();
        for glyph in element.children.iter().filter(|c| c.tag == GLYPH_TAG) {
            let name = glyph
                .attr("name")
                .ok_or_else(|| Error::malformed("<glyph> without a name"))?;
            contents.insert(name.to_string(), name.to_string());
        }
        Ok(Some(contents))
    }

    fn write_glyph_set_contents(
        &mut self,
        layer: &LayerAddress,
        contents: &GlyphSetContents,
    ) -> Result<(), Error> {
        // Glyph membership is implied by the glyph elements; drop the rest
        let element = self.layer_mut(layer);
        element.children.retain(|c| {
            c.tag != GLYPH_TAG || c.attr("name").is_some_and(|n| contents.contains_key(n))
        });
        element
            .children
            .sort_by_key(|c| c.attr("name").and_then(|n| contents.get_index_of(n)));
        Ok(())
    }

    fn read_glyph_tree(&mut self, glyph: &GlyphAddress) -> Result<Option<Element>, Error> {
        Ok(self.layer(&glyph.layer.layer_name).and_then(|layer| {
            layer
                .children
                .iter()
                .find(|c| c.tag == GLYPH_TAG && c.attr("name") == Some(glyph.glyph_name.as_str()))
                .cloned()
        }))
    }

    fn write_glyph_tree(&mut self, glyph: &GlyphAddress, tree: &Element) -> Result<(), Error> {
        if tree.tag != GLYPH_TAG {
            return Err(Error::malformed(format!(
                "expected a <glyph> tree, found <{}>",
                tree.tag
            )));
        }
        let mut tree = tree.clone();
        tree.set_attr("name", glyph.glyph_name.as_str());

        let layer = self.layer_mut(&glyph.layer);
        match layer
            .children
            .iter_mut()
            .find(|c| c.tag == GLYPH_TAG && c.attr("name") == Some(glyph.glyph_name.as_str()))
        {
            Some(existing) => *existing = tree,
            None => layer.children.push(tree),
        }
        Ok(())
    }
}
