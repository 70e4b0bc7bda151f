//! Fixed knowledge of the QGIS project schema.
//!
//! None of this is configurable: the set of volatile attributes and the
//! collections treated as unordered are properties of the file format.

use qgs_canonical::Element;

/// Root attributes naming the last user who saved the project.
pub const VOLATILE_ROOT_ATTRIBUTES: [&str; 2] = ["saveUserFull", "saveUser"];

/// Per-layer snapping settings, relative to the project root.
pub const LAYER_SETTINGS_PATH: &str = "snapping-settings/individual-layer-settings";

/// Data-defined property records, relative to an embedded symbol's root.
pub const SYMBOL_PROPERTIES_PATH: &str = "data_defined_properties/Option";

/// Stand-in for a missing or empty `type` in symbol property keys.
pub const MISSING_TYPE_SENTINEL: &str = "zzz";

/// Which rule set a document gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// A whole `.qgs` project.
    Project,
    /// A symbol serialized into an `Option` attribute value.
    EmbeddedSymbol,
}

impl Profile {
    /// Path of the collection whose children are sorted under this profile.
    pub fn unordered_collection(self) -> &'static str {
        match self {
            Profile::Project => LAYER_SETTINGS_PATH,
            Profile::EmbeddedSymbol => SYMBOL_PROPERTIES_PATH,
        }
    }
}

/// `Option[name=lineSymbol][type=QString]` whose value holds serialized XML.
pub fn is_embedded_symbol(element: &Element) -> bool {
    element.name == "Option"
        && element.attribute("name") == Some("lineSymbol")
        && element.attribute("type") == Some("QString")
        && element
            .attribute("value")
            .is_some_and(|value| value.starts_with('<'))
}

/// Sort key for layer settings records.
///
/// Records with an `id` come first in string order; records without one
/// follow them all.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LayerSettingsKey {
    /// The record's `id`.
    Id(String),
    /// No `id` attribute.
    Missing,
}

/// Key for children of [`LAYER_SETTINGS_PATH`].
pub fn layer_settings_key(element: &Element) -> LayerSettingsKey {
    match element.attribute("id") {
        Some(id) => LayerSettingsKey::Id(id.to_string()),
        None => LayerSettingsKey::Missing,
    }
}

/// Key for children of [`SYMBOL_PROPERTIES_PATH`]: `type` (or
/// [`MISSING_TYPE_SENTINEL`]) followed by `id` (or nothing).
pub fn symbol_property_key(element: &Element) -> String {
    let kind = element
        .attribute("type")
        .filter(|kind| !kind.is_empty())
        .unwrap_or(MISSING_TYPE_SENTINEL);
    let id = element.attribute("id").unwrap_or("");
    format!("{kind}{id}")
}
