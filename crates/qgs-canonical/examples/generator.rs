use qgs_canonical::{parse_document, Canonicalizer};

fn main() {
    let source = r#"<?xml version="1.0" encoding="UTF-8"?>
<qgis version="3.34.0" projectname="">
  <title/>
  <layer-tree-group expanded="1" checked="Qt::Checked" name=""/>
</qgis>
"#;

    let document = match parse_document(source) {
        Ok(document) => document,
        Err(err) => {
            eprintln!("parse failed: {}", err);
            std::process::exit(1);
        }
    };

    match Canonicalizer::new().canonicalize(&document) {
        Ok(bytes) => {
            println!("{}", String::from_utf8_lossy(&bytes));
        }
        Err(err) => {
            eprintln!("canonicalization failed: {}", err);
            std::process::exit(1);
        }
    }
}
