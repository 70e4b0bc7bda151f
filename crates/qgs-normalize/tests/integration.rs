use qgs_canonical::parse_bytes;
use qgs_normalize::{normalize_str, NormalizeError};

const SYMBOL_VALUE: &str = "&lt;symbol name=&quot;&quot; type=&quot;line&quot;&gt;\
&lt;data_defined_properties&gt;&lt;Option type=&quot;Map&quot;&gt;\
&lt;Option type=&quot;QString&quot; id=&quot;b&quot;/&gt;\
&lt;Option type=&quot;QString&quot; id=&quot;a&quot;/&gt;\
&lt;/Option&gt;&lt;/data_defined_properties&gt;&lt;/symbol&gt;";

fn project(layer_order: &[&str], root_attrs: &str) -> String {
    let layers: String = layer_order
        .iter()
        .map(|id| format!("\n      <layer-setting id=\"{id}\" enabled=\"1\" type=\"1\"/>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE qgis PUBLIC 'http://mrcc.com/qgis.dtd' 'SYSTEM'>
<qgis projectname="test" version="3.34.0-Prizren"{root_attrs}>
  <title>test</title>
  <snapping-settings enabled="0" mode="2">
    <individual-layer-settings>{layers}
    </individual-layer-settings>
  </snapping-settings>
  <renderer-v2>
    <Option type="Map">
      <Option name="lineSymbol" type="QString" value="{SYMBOL_VALUE}"/>
      <Option name="other" type="QString" value="plain"/>
    </Option>
  </renderer-v2>
</qgis>
"#
    )
}

fn canonical(source: &str) -> String {
    String::from_utf8(normalize_str(source).unwrap().bytes).unwrap()
}

#[test]
fn volatile_root_attributes_are_removed() {
    let source = project(&["layer1"], r#" saveUser="alice" saveUserFull="Alice A.""#);
    let normalized = normalize_str(&source).unwrap();
    let text = String::from_utf8(normalized.bytes).unwrap();

    assert!(text.starts_with(r#"<qgis projectname="test" version="3.34.0-Prizren">"#));
    assert!(!text.contains("saveUser"));
    assert_eq!(
        normalized.report.removed_attributes,
        vec!["saveUserFull".to_string(), "saveUser".to_string()]
    );
}

#[test]
fn missing_volatile_attributes_are_not_an_error() {
    let with = canonical(&project(&["layer1"], r#" saveUser="alice" saveUserFull="Alice A.""#));
    let without = canonical(&project(&["layer1"], ""));
    assert_eq!(with, without);
}

#[test]
fn layer_settings_are_sorted_by_id() {
    let text = canonical(&project(&["layer2", "layer1"], ""));
    let first = text.find(r#"id="layer1""#).unwrap();
    let second = text.find(r#"id="layer2""#).unwrap();
    assert!(first < second);
}

#[test]
fn layer_setting_order_does_not_matter() {
    let ids = ["b", "c", "a", "d"];
    let reference = canonical(&project(&ids, ""));
    for order in [["a", "b", "c", "d"], ["d", "c", "b", "a"], ["c", "a", "d", "b"]] {
        assert_eq!(canonical(&project(&order, "")), reference);
    }
}

#[test]
fn layer_settings_without_id_go_last() {
    let source = r#"<qgis><snapping-settings><individual-layer-settings><s name="anon"/><s id="b"/><s id="a"/></individual-layer-settings></snapping-settings></qgis>"#;
    let text = canonical(source);
    assert!(text.contains(r#"<s id="a"></s><s id="b"></s><s name="anon"></s>"#));
}

#[test]
fn embedded_symbol_properties_are_sorted() {
    let normalized = normalize_str(&project(&["layer1"], "")).unwrap();
    assert_eq!(normalized.report.fragments_rewritten, 1);

    let document = parse_bytes(&normalized.bytes).unwrap();
    let option = document
        .root
        .find("renderer-v2/Option/Option")
        .unwrap();
    assert_eq!(option.attribute("name"), Some("lineSymbol"));
    assert_eq!(
        option.attribute("value"),
        Some(
            r#"<symbol name="" type="line"><data_defined_properties><Option type="Map"><Option id="a" type="QString"></Option><Option id="b" type="QString"></Option></Option></data_defined_properties></symbol>"#
        )
    );
}

#[test]
fn untyped_symbol_properties_follow_typed_ones() {
    let value = "&lt;symbol&gt;&lt;data_defined_properties&gt;&lt;Option&gt;\
                 &lt;Option id=&quot;a&quot;/&gt;\
                 &lt;Option type=&quot;QString&quot; id=&quot;z&quot;/&gt;\
                 &lt;Option type=&quot;QString&quot;/&gt;\
                 &lt;/Option&gt;&lt;/data_defined_properties&gt;&lt;/symbol&gt;";
    let source = format!(r#"<qgis><Option name="lineSymbol" type="QString" value="{value}"/></qgis>"#);
    let document = parse_bytes(&normalize_str(&source).unwrap().bytes).unwrap();
    let value = document.root.find("Option").unwrap().attribute("value").unwrap();
    assert_eq!(
        value,
        r#"<symbol><data_defined_properties><Option><Option type="QString"></Option><Option id="z" type="QString"></Option><Option id="a"></Option></Option></data_defined_properties></symbol>"#
    );
}

#[test]
fn plain_option_values_are_left_alone() {
    let text = canonical(&project(&["layer1"], ""));
    assert!(text.contains(r#"<Option name="other" type="QString" value="plain"></Option>"#));
}

#[test]
fn embedded_symbol_without_properties_is_only_canonicalized() {
    let source = r#"<qgis><Option name="lineSymbol" type="QString" value="&lt;symbol b='2' a='1'/&gt;"/></qgis>"#;
    let document = parse_bytes(&normalize_str(source).unwrap().bytes).unwrap();
    assert_eq!(
        document.root.find("Option").unwrap().attribute("value"),
        Some(r#"<symbol a="1" b="2"></symbol>"#)
    );
}

#[test]
fn normalization_is_idempotent() {
    let source = project(&["layer3", "layer1", "layer2"], r#" saveUser="bob""#);
    let once = normalize_str(&source).unwrap();
    assert!(once.report.changed);

    let twice = normalize_str(std::str::from_utf8(&once.bytes).unwrap()).unwrap();
    assert_eq!(twice.bytes, once.bytes);
    assert!(!twice.report.changed);
    assert!(twice.report.removed_attributes.is_empty());
    assert_eq!(twice.report.collections_reordered, 0);
    assert_eq!(twice.report.digest, once.report.digest);
}

#[test]
fn content_outside_the_rules_is_preserved() {
    let source = r#"<qgis><title>A &amp; B</title><!-- keep --><layer z="1" a="2">text<x/>tail</layer></qgis>"#;
    assert_eq!(
        canonical(source),
        r#"<qgis><title>A &amp; B</title><!-- keep --><layer a="2" z="1">text<x></x>tail</layer></qgis>"#
    );
}

#[test]
fn missing_collections_are_tolerated() {
    assert_eq!(canonical("<qgis/>"), "<qgis></qgis>");
}

#[test]
fn malformed_project_is_a_parse_error() {
    let err = normalize_str("<qgis><title></qgis>").unwrap_err();
    assert!(matches!(err, NormalizeError::Parse(_)));
}

#[test]
fn malformed_embedded_symbol_fails_the_whole_document() {
    let source = r#"<qgis><renderer-v2><Option name="lineSymbol" type="QString" value="&lt;symbol&gt;"/></renderer-v2></qgis>"#;
    match normalize_str(source).unwrap_err() {
        NormalizeError::Fragment { element, .. } => {
            assert_eq!(element, "qgis/renderer-v2/Option");
        }
        other => panic!("expected Fragment error, got {other:?}"),
    }
}

#[test]
fn deeply_nested_embedded_symbol_is_a_fragment_error() {
    let depth = qgs_canonical::MAX_DEPTH + 1;
    let value = format!("{}{}", "&lt;a&gt;".repeat(depth), "&lt;/a&gt;".repeat(depth));
    let source = format!(
        r#"<qgis><renderer-v2><Option name="lineSymbol" type="QString" value="{value}"/></renderer-v2></qgis>"#
    );
    match normalize_str(&source).unwrap_err() {
        NormalizeError::Fragment { source, .. } => {
            assert!(matches!(source, qgs_canonical::ParseError::TooDeep { .. }));
        }
        other => panic!("expected Fragment error, got {other:?}"),
    }
}
