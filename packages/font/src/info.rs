//! Font-wide naming and metrics.

use indexmap::IndexMap;
use log::warn;

use fontstore_core_store::{Dict, Error, PropertyValue};

/// Every attribute a fontinfo unit may carry.
pub const FONT_INFO_ATTRIBUTES: &[&str] = &[
    "familyName",
    "styleName",
    "styleMapFamilyName",
    "styleMapStyleName",
    "versionMajor",
    "versionMinor",
    "year",
    "copyright",
    "trademark",
    "unitsPerEm",
    "descender",
    "xHeight",
    "capHeight",
    "ascender",
    "italicAngle",
    "note",
    "guidelines",
    "openTypeGaspRangeRecords",
    "openTypeHeadCreated",
    "openTypeHeadLowestRecPPEM",
    "openTypeHeadFlags",
    "openTypeHheaAscender",
    "openTypeHheaDescender",
    "openTypeHheaLineGap",
    "openTypeHheaCaretSlopeRise",
    "openTypeHheaCaretSlopeRun",
    "openTypeHheaCaretOffset",
    "openTypeNameDesigner",
    "openTypeNameDesignerURL",
    "openTypeNameManufacturer",
    "openTypeNameManufacturerURL",
    "openTypeNameLicense",
    "openTypeNameLicenseURL",
    "openTypeNameVersion",
    "openTypeNameUniqueID",
    "openTypeNameDescription",
    "openTypeNamePreferredFamilyName",
    "openTypeNamePreferredSubfamilyName",
    "openTypeNameCompatibleFullName",
    "openTypeNameSampleText",
    "openTypeNameWWSFamilyName",
    "openTypeNameWWSSubfamilyName",
    "openTypeNameRecords",
    "openTypeOS2WidthClass",
    "openTypeOS2WeightClass",
    "openTypeOS2Selection",
    "openTypeOS2VendorID",
    "openTypeOS2Panose",
    "openTypeOS2FamilyClass",
    "openTypeOS2UnicodeRanges",
    "openTypeOS2CodePageRanges",
    "openTypeOS2TypoAscender",
    "openTypeOS2TypoDescender",
    "openTypeOS2TypoLineGap",
    "openTypeOS2WinAscent",
    "openTypeOS2WinDescent",
    "openTypeOS2Type",
    "openTypeOS2SubscriptXSize",
    "openTypeOS2SubscriptYSize",
    "openTypeOS2SubscriptXOffset",
    "openTypeOS2SubscriptYOffset",
    "openTypeOS2SuperscriptXSize",
    "openTypeOS2SuperscriptYSize",
    "openTypeOS2SuperscriptXOffset",
    "openTypeOS2SuperscriptYOffset",
    "openTypeOS2StrikeoutSize",
    "openTypeOS2StrikeoutPosition",
    "openTypeVheaVertTypoAscender",
    "openTypeVheaVertTypoDescender",
    "openTypeVheaVertTypoLineGap",
    "openTypeVheaCaretSlopeRise",
    "openTypeVheaCaretSlopeRun",
    "openTypeVheaCaretOffset",
    "postscriptFontName",
    "postscriptFullName",
    "postscriptSlantAngle",
    "postscriptUniqueID",
    "postscriptUnderlineThickness",
    "postscriptUnderlinePosition",
    "postscriptIsFixedPitch",
    "postscriptBlueValues",
    "postscriptOtherBlues",
    "postscriptFamilyBlues",
    "postscriptFamilyOtherBlues",
    "postscriptStemSnapH",
    "postscriptStemSnapV",
    "postscriptBlueFuzz",
    "postscriptBlueShift",
    "postscriptBlueScale",
    "postscriptForceBold",
    "postscriptDefaultWidthX",
    "postscriptNominalWidthX",
    "postscriptWeightName",
    "postscriptDefaultCharacter",
    "postscriptWindowsCharacterSet",
    "macintoshFONDFamilyID",
    "macintoshFONDName",
    "woffMajorVersion",
    "woffMinorVersion",
    "woffMetadataUniqueID",
    "woffMetadataVendor",
    "woffMetadataCredits",
    "woffMetadataDescription",
    "woffMetadataLicense",
    "woffMetadataCopyright",
    "woffMetadataTrademark",
    "woffMetadataLicensee",
    "woffMetadataExtensions",
];

pub fn is_font_info_attribute(name: &str) -> bool {
    FONT_INFO_ATTRIBUTES.contains(&name)
}

/// A flat bag of fontinfo attributes.
///
/// Only names from [`FONT_INFO_ATTRIBUTES`] can be set. Values are not
/// type checked.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontInfo {
    values: IndexMap<String, PropertyValue>,
}

impl FontInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<PropertyValue>) -> Result<(), Error> {
        if !is_font_info_attribute(name) {
            return Err(Error::UnknownInfoAttribute {
                name: name.to_string(),
            });
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.values.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build from a stored dictionary, skipping unknown attributes.
    pub fn from_property(value: PropertyValue) -> Result<FontInfo, Error> {
        let mut info = FontInfo::new();
        for (name, value) in value.into_dict()? {
            if is_font_info_attribute(&name) {
                info.values.insert(name, value);
            } else {
                warn!("skipping unknown fontinfo attribute {:?}", name);
            }
        }
        Ok(info)
    }

    pub fn to_property(&self) -> PropertyValue {
        PropertyValue::Dict(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Dict>(),
        )
    }
}
