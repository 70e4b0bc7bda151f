//! The normalization pipeline: parse, apply the schema rules, canonicalize.
//!
//! Embedded symbols are not special-cased as strings. Each one is parsed as
//! a document of its own, run through [`normalize_document`] with
//! [`Profile::EmbeddedSymbol`], canonicalized, and written back into the
//! attribute it came from.

use qgs_canonical::{parse_bytes, parse_document, Canonicalizer, Digest, Document, Element};
use tracing::debug;

use crate::errors::NormalizeError;
use crate::report::NormalizationReport;
use crate::rules::{
    is_embedded_symbol, layer_settings_key, symbol_property_key, Profile,
    VOLATILE_ROOT_ATTRIBUTES,
};

/// Canonical bytes plus the report of what changed.
#[derive(Debug, Clone)]
pub struct Normalized {
    /// Canonical UTF-8 bytes of the normalized project.
    pub bytes: Vec<u8>,
    /// Details of the pass.
    pub report: NormalizationReport,
}

/// Normalizes project XML held in memory.
pub fn normalize_str(source: &str) -> Result<Normalized, NormalizeError> {
    let document = parse_document(source)?;
    finish(document, source.as_bytes())
}

/// Normalizes project XML bytes (UTF-8, optional BOM).
pub fn normalize_bytes(source: &[u8]) -> Result<Normalized, NormalizeError> {
    let document = parse_bytes(source)?;
    finish(document, source)
}

fn finish(mut document: Document, source: &[u8]) -> Result<Normalized, NormalizeError> {
    let mut report = NormalizationReport::default();
    normalize_document(&mut document, Profile::Project, &mut report)?;
    let bytes = Canonicalizer::new().canonicalize(&document)?;
    report.changed = bytes != source;
    report.digest = Some(Digest::sha256(&bytes));
    Ok(Normalized { bytes, report })
}

/// Applies the rules of `profile` to `document` in place.
pub fn normalize_document(
    document: &mut Document,
    profile: Profile,
    report: &mut NormalizationReport,
) -> Result<(), NormalizeError> {
    let root = &mut document.root;

    if profile == Profile::Project {
        strip_volatile_attributes(root, report);
    }

    let mut path = Vec::new();
    rewrite_embedded_symbols(root, &mut path, report)?;

    let collection = profile.unordered_collection();
    let moved = match (profile, root.find_mut(collection)) {
        (_, None) => {
            debug!(collection, "unordered collection not present");
            false
        }
        (Profile::Project, Some(parent)) => parent.sort_child_elements_by_key(layer_settings_key),
        (Profile::EmbeddedSymbol, Some(parent)) => {
            parent.sort_child_elements_by_key(symbol_property_key)
        }
    };
    if moved {
        debug!(collection, "reordered unordered collection");
        report.collections_reordered += 1;
    }
    Ok(())
}

fn strip_volatile_attributes(root: &mut Element, report: &mut NormalizationReport) {
    for name in VOLATILE_ROOT_ATTRIBUTES {
        if root.remove_attribute(name).is_some() {
            debug!(attribute = name, "removed volatile root attribute");
            report.removed_attributes.push(name.to_string());
        }
    }
}

/// Walks the tree in document order and replaces every embedded symbol
/// value with its normalized canonical form.
fn rewrite_embedded_symbols(
    element: &mut Element,
    path: &mut Vec<String>,
    report: &mut NormalizationReport,
) -> Result<(), NormalizeError> {
    path.push(element.name.clone());
    if is_embedded_symbol(element) {
        let value = element.attribute("value").unwrap_or_default();
        let canonical = normalize_fragment(value, path, report)?;
        element.set_attribute("value", canonical);
        report.fragments_rewritten += 1;
    }
    for child in element.child_elements_mut() {
        rewrite_embedded_symbols(child, path, report)?;
    }
    path.pop();
    Ok(())
}

fn normalize_fragment(
    value: &str,
    path: &[String],
    report: &mut NormalizationReport,
) -> Result<String, NormalizeError> {
    let mut fragment = parse_document(value).map_err(|source| NormalizeError::Fragment {
        element: path.join("/"),
        source,
    })?;
    normalize_document(&mut fragment, Profile::EmbeddedSymbol, report)?;
    debug!(element = %path.join("/"), "normalized embedded symbol");
    Ok(Canonicalizer::new().canonicalize_to_string(&fragment)?)
}
