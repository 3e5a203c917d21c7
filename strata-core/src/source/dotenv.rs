use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Parses `KEY=value` lines with dotenv conventions.
///
/// Values are kept verbatim: `${...}` expressions reach the resolver untouched and
/// the process environment is neither read nor modified. An optional `export `
/// prefix is dropped, matching surrounding quotes are stripped and unquoted
/// values end at a ` #` comment.
pub fn parse(source_name: &str, content: &str) -> Result<BTreeMap<String, String>> {
    let mut properties = BTreeMap::new();

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line_number = index + 1;
        let entry = trimmed
            .strip_prefix("export ")
            .map(str::trim_start)
            .unwrap_or(trimmed);

        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| load_error(source_name, line_number, "expected KEY=value"))?;
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(load_error(source_name, line_number, "invalid key"));
        }

        let value = parse_value(value.trim())
            .map_err(|reason| load_error(source_name, line_number, reason))?;
        properties.insert(key.to_owned(), value);
    }

    Ok(properties)
}

fn load_error(source_name: &str, line_number: usize, reason: &str) -> Error {
    Error::SourceLoadError {
        source_name: source_name.to_owned(),
        reason: format!("line {line_number}: {reason}"),
    }
}

fn parse_value(raw: &str) -> std::result::Result<String, &'static str> {
    match raw.chars().next() {
        Some('\'') => raw[1..]
            .split_once('\'')
            .map(|(inner, _)| inner.to_owned())
            .ok_or("unterminated single quote"),
        Some('"') => unquote_double(&raw[1..]),
        _ => Ok(match raw.find(" #") {
            Some(comment) => raw[..comment].trim_end().to_owned(),
            None => raw.to_owned(),
        }),
    }
}

fn unquote_double(rest: &str) -> std::result::Result<String, &'static str> {
    let mut out = String::with_capacity(rest.len());
    let mut chars = rest.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => return Ok(out),
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => break,
            },
            _ => out.push(ch),
        }
    }
    Err("unterminated double quote")
}

#[cfg(test)]
mod tests {
    use super::parse;

    #[test]
    fn parses_plain_quoted_and_exported_lines() {
        let content = "# demo\nDEMO_MODE_ENABLED=12345\nexport GREETING=\"hello world\"\nTEMPLATE='${other.key}'\n";
        let props = parse(".env", content).expect("should parse");

        assert_eq!(props.get("DEMO_MODE_ENABLED").map(String::as_str), Some("12345"));
        assert_eq!(props.get("GREETING").map(String::as_str), Some("hello world"));
        assert_eq!(props.get("TEMPLATE").map(String::as_str), Some("${other.key}"));
    }

    #[test]
    fn expressions_and_spaces_are_kept_verbatim() {
        let content = "LINE=${greeting.target}\nQUOTED=\"hello ${greeting.target}\"\nSPACED=hello ${greeting.target} # note\nESCAPED=\"say \\\"hi\\\"\"\n";
        let props = parse(".env", content).expect("should parse");

        assert_eq!(props.get("LINE").map(String::as_str), Some("${greeting.target}"));
        assert_eq!(props.get("QUOTED").map(String::as_str), Some("hello ${greeting.target}"));
        assert_eq!(props.get("SPACED").map(String::as_str), Some("hello ${greeting.target}"));
        assert_eq!(props.get("ESCAPED").map(String::as_str), Some("say \"hi\""));
    }

    #[test]
    fn malformed_line_is_a_source_load_error() {
        let error = parse(".env", "GOOD=1\nBAD LINE WITHOUT EQUALS\n").expect_err("should fail");
        assert!(error.is_fatal());
        assert!(error.to_string().contains(".env"));

        let error = parse(".env", "OPEN=\"never closed\n").expect_err("should fail");
        assert!(error.to_string().contains("line 1"));
    }
}
