use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use fontstore_core_store::{Backend, Error};
use fontstore_glif::Glyph;

use crate::UfoReaderWriter;

/// Where a lazily loaded layer gets its glyphs from.
pub trait GlyphSource {
    fn glyph_names(&mut self, layer_name: &str) -> Result<Vec<String>, Error>;
    fn load_glyph(&mut self, layer_name: &str, glyph_name: &str) -> Result<Option<Glyph>, Error>;
}

impl<B: Backend> GlyphSource for UfoReaderWriter<B> {
    fn glyph_names(&mut self, layer_name: &str) -> Result<Vec<String>, Error> {
        UfoReaderWriter::glyph_names(self, layer_name)
    }

    fn load_glyph(&mut self, layer_name: &str, glyph_name: &str) -> Result<Option<Glyph>, Error> {
        self.read_glyph(layer_name, glyph_name)
    }
}

/// Shared handle to the session a font was loaded from.
pub type SharedSource = Rc<RefCell<dyn GlyphSource>>;

/// An ordered set of glyphs.
///
/// Layers loaded from a package start with names only. A glyph is read the
/// first time it is asked for and kept for the life of the layer.
pub struct Layer {
    name: String,
    source: Option<SharedSource>,
    glyphs: IndexMap<String, Option<Glyph>>,
}

impl Layer {
    /// An empty in-memory layer.
    pub fn new(name: impl Into<String>) -> Self {
        Layer {
            name: name.into(),
            source: None,
            glyphs: IndexMap::new(),
        }
    }

    /// A layer whose glyphs are loaded from `source` on demand.
    pub fn load(name: impl Into<String>, source: SharedSource) -> Result<Self, Error> {
        let name = name.into();
        let names = source.borrow_mut().glyph_names(&name)?;
        debug!("layer {:?} has {} stored glyphs", name, names.len());
        Ok(Layer {
            name,
            source: Some(source),
            glyphs: names.into_iter().map(|n| (n, None)).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn glyph_names(&self) -> impl Iterator<Item = &str> {
        self.glyphs.keys().map(String::as_str)
    }

    pub fn contains(&self, glyph_name: &str) -> bool {
        self.glyphs.contains_key(glyph_name)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Whether a glyph has been materialized yet.
    pub fn is_loaded(&self, glyph_name: &str) -> bool {
        matches!(self.glyphs.get(glyph_name), Some(Some(_)))
    }

    /// Create an empty glyph, replacing any glyph of the same name.
    pub fn new_glyph(&mut self, glyph_name: &str) -> &mut Glyph {
        let slot = self
            .glyphs
            .entry(glyph_name.to_string())
            .or_insert(None);
        slot.insert(Glyph::new(glyph_name))
    }

    pub fn get(&mut self, glyph_name: &str) -> Result<&Glyph, Error> {
        self.get_mut(glyph_name).map(|glyph| &*glyph)
    }

    pub fn get_mut(&mut self, glyph_name: &str) -> Result<&mut Glyph, Error> {
        let not_found = || Error::GlyphNotFound {
            name: glyph_name.to_string(),
        };
        let slot = self.glyphs.get_mut(glyph_name).ok_or_else(not_found)?;
        if slot.is_none() {
            let source = self.source.as_ref().ok_or_else(not_found)?;
            debug!("loading glyph {:?} from layer {:?}", glyph_name, self.name);
            let mut source = source.try_borrow_mut().map_err(|_| {
                Error::not_supported("loading a glyph while its session is borrowed")
            })?;
            let glyph = source
                .load_glyph(&self.name, glyph_name)?
                .ok_or_else(not_found)?;
            *slot = Some(glyph);
        }
        slot.as_mut().ok_or_else(not_found)
    }

    /// Load every glyph that has not been read yet.
    pub fn materialize(&mut self) -> Result<(), Error> {
        let pending: Vec<String> = self
            .glyphs
            .iter()
            .filter(|(_, glyph)| glyph.is_none())
            .map(|(name, _)| name.clone())
            .collect();
        for name in pending {
            self.get_mut(&name)?;
        }
        Ok(())
    }

    /// Whether this layer loads its glyphs from the session at `session`.
    pub(crate) fn is_backed_by(&self, session: *const ()) -> bool {
        self.source
            .as_ref()
            .map_or(false, |source| source.as_ptr() as *const () == session)
    }

    /// Materialized glyphs in layer order.
    pub fn loaded_glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.values().flatten()
    }
}
