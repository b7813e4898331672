//! Typed access to the units of one font package.

use std::collections::BTreeMap;

use fontstore_core_store::{
    Backend, Dict, Error, FileSystem, MetaInfo, PropertyValue, TopLevelFile,
};
use fontstore_glif::{read_glyph, write_glyph, Glyph, ReadOptions};

use crate::FontInfo;

/// Group name to member glyph names.
pub type Groups = BTreeMap<String, Vec<String>>;

/// Kerning value per `(first, second)` pair.
pub type Kerning = BTreeMap<(String, String), f64>;

/// Reads and writes font units through a [`FileSystem`] session.
pub struct UfoReaderWriter<B: Backend> {
    fs: FileSystem<B>,
    read_options: ReadOptions,
}

impl<B: Backend> UfoReaderWriter<B> {
    pub fn new(backend: B) -> Self {
        UfoReaderWriter {
            fs: FileSystem::new(backend),
            read_options: ReadOptions::default(),
        }
    }

    #[must_use]
    pub fn with_read_options(mut self, options: ReadOptions) -> Self {
        self.read_options = options;
        self
    }

    pub fn file_system(&mut self) -> &mut FileSystem<B> {
        &mut self.fs
    }

    pub fn read_meta_info(&mut self) -> Result<Option<MetaInfo>, Error> {
        self.fs.read_meta_info()
    }

    pub fn write_meta_info(&mut self) -> Result<(), Error> {
        self.fs.write_meta_info(&MetaInfo::default())
    }

    pub fn read_info(&mut self) -> Result<Option<FontInfo>, Error> {
        match self.fs.read_property_file(TopLevelFile::FontInfo)? {
            Some(value) => FontInfo::from_property(value).map(Some),
            None => Ok(None),
        }
    }

    pub fn write_info(&mut self, info: &FontInfo) -> Result<(), Error> {
        self.fs
            .write_property_file(TopLevelFile::FontInfo, &info.to_property())
    }

    pub fn read_groups(&mut self) -> Result<Option<Groups>, Error> {
        let Some(value) = self.fs.read_property_file(TopLevelFile::Groups)? else {
            return Ok(None);
        };
        let mut groups = Groups::new();
        for (name, members) in value.into_dict()? {
            let members = members
                .as_list()
                .and_then(|items| {
                    items
                        .iter()
                        .map(|m| m.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                })
                .ok_or_else(|| {
                    Error::malformed(format!("group {:?} is not a list of glyph names", name))
                })?;
            groups.insert(name, members);
        }
        Ok(Some(groups))
    }

    pub fn write_groups(&mut self, groups: &Groups) -> Result<(), Error> {
        let dict: Dict = groups
            .iter()
            .map(|(name, members)| (name.clone(), PropertyValue::from(members.clone())))
            .collect();
        self.fs
            .write_property_file(TopLevelFile::Groups, &PropertyValue::Dict(dict))
    }

    /// Read the nested `first -> second -> value` form as flat pairs.
    pub fn read_kerning(&mut self) -> Result<Option<Kerning>, Error> {
        let Some(value) = self.fs.read_property_file(TopLevelFile::Kerning)? else {
            return Ok(None);
        };
        let mut kerning = Kerning::new();
        for (first, seconds) in value.into_dict()? {
            for (second, amount) in seconds.into_dict()? {
                let amount = amount.as_f64().ok_or_else(|| {
                    Error::malformed(format!(
                        "kerning value for {:?} {:?} is a {}",
                        first,
                        second,
                        amount.type_name()
                    ))
                })?;
                kerning.insert((first.clone(), second), amount);
            }
        }
        Ok(Some(kerning))
    }

    pub fn write_kerning(&mut self, kerning: &Kerning) -> Result<(), Error> {
        let mut nested = Dict::new();
        for ((first, second), amount) in kerning {
            let row = nested
                .entry(first.clone())
                .or_insert_with(PropertyValue::dict);
            if let PropertyValue::Dict(row) = row {
                row.insert(second.clone(), kerning_value(*amount));
            }
        }
        self.fs
            .write_property_file(TopLevelFile::Kerning, &PropertyValue::Dict(nested))
    }

    pub fn read_lib(&mut self) -> Result<Option<Dict>, Error> {
        self.fs
            .read_property_file(TopLevelFile::Lib)?
            .map(PropertyValue::into_dict)
            .transpose()
    }

    pub fn write_lib(&mut self, lib: &Dict) -> Result<(), Error> {
        self.fs
            .write_property_file(TopLevelFile::Lib, &PropertyValue::Dict(lib.clone()))
    }

    pub fn read_features(&mut self) -> Result<Option<String>, Error> {
        self.fs.read_features()
    }

    pub fn write_features(&mut self, text: &str) -> Result<(), Error> {
        self.fs.write_features(text)
    }

    pub fn layer_names(&mut self) -> Result<Vec<String>, Error> {
        self.fs.layer_names()
    }

    pub fn default_layer_name(&mut self) -> Result<String, Error> {
        self.fs.default_layer_name()
    }

    /// Choose which layer gets the default container when layers are
    /// written to an empty package.
    pub fn set_default_layer_name(&mut self, name: &str) {
        self.fs.set_default_layer_name(name);
    }

    pub fn glyph_names(&mut self, layer_name: &str) -> Result<Vec<String>, Error> {
        self.fs.glyph_names(layer_name)
    }

    pub fn read_glyph(&mut self, layer_name: &str, glyph_name: &str) -> Result<Option<Glyph>, Error> {
        match self.fs.read_glyph(layer_name, glyph_name)? {
            Some(tree) => read_glyph(&tree, &self.read_options).map(Some),
            None => Ok(None),
        }
    }

    pub fn write_glyph(&mut self, layer_name: &str, glyph: &Glyph) -> Result<(), Error> {
        self.fs
            .write_glyph(layer_name, &glyph.name, &write_glyph(glyph))
    }

    pub fn write_glyph_set_contents(&mut self, layer_name: &str) -> Result<(), Error> {
        self.fs.write_glyph_set_contents(layer_name)
    }

    pub fn write_layer_contents(&mut self) -> Result<(), Error> {
        self.fs.write_layer_contents()
    }

    pub fn close(self) -> Result<(), Error> {
        self.fs.close()
    }
}

/// Integral amounts are stored as integers.
fn kerning_value(amount: f64) -> PropertyValue {
    if amount.fract() == 0.0 && amount.abs() < i64::MAX as f64 {
        PropertyValue::Integer(amount as i64)
    } else {
        PropertyValue::Real(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontstore_stores::MemoryStore;

    #[test]
    fn groups_round_trip() {
        let mut rw = UfoReaderWriter::new(MemoryStore::new());
        assert_eq!(rw.read_groups().unwrap(), None);

        let mut groups = Groups::new();
        groups.insert("group1".to_string(), vec!["A".to_string(), "B".to_string()]);
        rw.write_groups(&groups).unwrap();
        assert_eq!(rw.read_groups().unwrap(), Some(groups));
    }

    #[test]
    fn kerning_is_nested_on_disk() {
        let mut rw = UfoReaderWriter::new(MemoryStore::new());
        let mut kerning = Kerning::new();
        kerning.insert(("A".to_string(), "B".to_string()), -20.0);
        kerning.insert(("A".to_string(), "C".to_string()), 12.5);
        kerning.insert(("T".to_string(), "o".to_string()), -80.0);
        rw.write_kerning(&kerning).unwrap();

        let stored = rw
            .file_system()
            .read_property_file(TopLevelFile::Kerning)
            .unwrap()
            .unwrap();
        let row = stored.get("A").unwrap();
        assert_eq!(row.get("B"), Some(&PropertyValue::Integer(-20)));
        assert_eq!(row.get("C"), Some(&PropertyValue::Real(12.5)));

        assert_eq!(rw.read_kerning().unwrap(), Some(kerning));
    }

    #[test]
    fn malformed_groups_are_rejected() {
        let mut rw = UfoReaderWriter::new(MemoryStore::new());
        let mut groups = Dict::new();
        groups.insert("bad".to_string(), PropertyValue::Integer(1));
        rw.file_system()
            .write_property_file(TopLevelFile::Groups, &PropertyValue::Dict(groups))
            .unwrap();
        assert!(matches!(
            rw.read_groups(),
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[test]
    fn glyphs_go_through_the_codec() {
        let mut rw = UfoReaderWriter::new(MemoryStore::new());
        let mut glyph = Glyph::new("A");
        glyph.add_unicode(0x41);
        rw.write_glyph("public.default", &glyph).unwrap();

        assert_eq!(rw.glyph_names("public.default").unwrap(), vec!["A"]);
        assert_eq!(rw.read_glyph("public.default", "A").unwrap(), Some(glyph));
        assert_eq!(rw.read_glyph("public.default", "B").unwrap(), None);
    }

    #[test]
    fn info_and_lib() {
        let mut rw = UfoReaderWriter::new(MemoryStore::new());
        let mut info = FontInfo::new();
        info.set("familyName", "Test Family").unwrap();
        rw.write_info(&info).unwrap();
        assert_eq!(rw.read_info().unwrap(), Some(info));

        let mut lib = Dict::new();
        lib.insert("public.glyphOrder".to_string(), vec!["A", "B"].into());
        rw.write_lib(&lib).unwrap();
        assert_eq!(rw.read_lib().unwrap(), Some(lib));
    }
}
