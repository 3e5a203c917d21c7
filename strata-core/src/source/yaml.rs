use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// Flattens a YAML (or JSON) document into dotted keys.
///
/// Sequences of scalars become both `key` (comma-joined, commas escaped) and `key[i]`.
/// Null leaves are dropped.
pub fn parse(source_name: &str, content: &str) -> Result<BTreeMap<String, String>> {
    let mut flattened = BTreeMap::new();
    if content.trim().is_empty() {
        return Ok(flattened);
    }

    let document: Value = serde_yaml::from_str(content).map_err(|err| Error::SourceLoadError {
        source_name: source_name.to_owned(),
        reason: err.to_string(),
    })?;

    match document {
        Value::Null => {}
        Value::Mapping(mapping) => flatten_mapping(source_name, "", &mapping, &mut flattened)?,
        _ => {
            return Err(Error::SourceLoadError {
                source_name: source_name.to_owned(),
                reason: "document root must be a mapping".to_owned(),
            })
        }
    }

    Ok(flattened)
}

fn flatten_mapping(
    source_name: &str,
    prefix: &str,
    mapping: &Mapping,
    out: &mut BTreeMap<String, String>,
) -> Result<()> {
    for (key, value) in mapping {
        let segment = scalar_to_string(key).ok_or_else(|| Error::SourceLoadError {
            source_name: source_name.to_owned(),
            reason: format!("unsupported non-scalar key under '{prefix}'"),
        })?;
        let path = if prefix.is_empty() {
            segment
        } else {
            format!("{prefix}.{segment}")
        };
        flatten_value(source_name, path, value, out)?;
    }
    Ok(())
}

fn flatten_value(
    source_name: &str,
    path: String,
    value: &Value,
    out: &mut BTreeMap<String, String>,
) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Mapping(mapping) => flatten_mapping(source_name, &path, mapping, out)?,
        Value::Sequence(items) => {
            let mut joined = Vec::with_capacity(items.len());
            let mut all_scalars = true;
            for (index, item) in items.iter().enumerate() {
                let indexed = format!("{path}[{index}]");
                match scalar_to_string(item) {
                    Some(text) => {
                        joined.push(text.replace(',', "\\,"));
                        out.insert(indexed, text);
                    }
                    None => {
                        all_scalars = false;
                        flatten_value(source_name, indexed, item, out)?;
                    }
                }
            }
            if all_scalars {
                out.insert(path, joined.join(","));
            }
        }
        Value::Tagged(tagged) => flatten_value(source_name, path, &tagged.value, out)?,
        scalar => {
            if let Some(text) = scalar_to_string(scalar) {
                out.insert(path, text);
            }
        }
    }
    Ok(())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse;

    #[test]
    fn flattens_nested_mappings_with_dots() {
        let yaml = "vaadin:\n  launch-browser: true\nyaml:\n  here: true\nserver:\n  port: 8080\n  name: demo\n";
        let flat = parse("test", yaml).expect("yaml should parse");

        assert_eq!(flat.get("vaadin.launch-browser").map(String::as_str), Some("true"));
        assert_eq!(flat.get("yaml.here").map(String::as_str), Some("true"));
        assert_eq!(flat.get("server.port").map(String::as_str), Some("8080"));
        assert_eq!(flat.get("server.name").map(String::as_str), Some("demo"));
    }

    #[test]
    fn sequences_produce_joined_and_indexed_keys() {
        let yaml = "hosts:\n  - a\n  - b,c\nusers:\n  - name: x\n  - name: y\n";
        let flat = parse("test", yaml).expect("yaml should parse");

        assert_eq!(flat.get("hosts").map(String::as_str), Some("a,b\\,c"));
        assert_eq!(flat.get("hosts[1]").map(String::as_str), Some("b,c"));
        assert_eq!(flat.get("users[0].name").map(String::as_str), Some("x"));
        assert!(!flat.contains_key("users"));
    }

    #[test]
    fn json_documents_are_accepted() {
        let flat = parse("test", r#"{"example": {"key1": 123, "flag": false}}"#)
            .expect("json is valid yaml");
        assert_eq!(flat.get("example.key1").map(String::as_str), Some("123"));
        assert_eq!(flat.get("example.flag").map(String::as_str), Some("false"));
    }

    #[test]
    fn empty_document_yields_no_properties() {
        assert!(parse("test", "  \n").expect("empty is fine").is_empty());
        assert!(parse("test", "~").expect("null root is fine").is_empty());
    }

    #[test]
    fn malformed_yaml_is_a_source_load_error() {
        let error = parse("broken.yaml", "a: [1, 2\nb: c").expect_err("should fail");
        assert!(error.to_string().contains("broken.yaml"));
        assert!(error.is_fatal());
    }

    #[test]
    fn scalar_root_is_rejected() {
        let error = parse("scalar.yaml", "just text").expect_err("should fail");
        assert!(error.to_string().contains("root must be a mapping"));
    }
}
