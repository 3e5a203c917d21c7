use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use serde::Serialize;

/// A validated `yyyy-MM-dd`-style date/time pattern, carried with its strftime translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DateTimePattern {
    pattern: String,
    strftime: String,
}

impl DateTimePattern {
    pub fn of_pattern(pattern: &str) -> Result<Self, String> {
        let strftime = translate(pattern)?;
        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(format!("pattern '{pattern}' produced invalid format '{strftime}'"));
        }
        Ok(Self {
            pattern: pattern.to_owned(),
            strftime,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    pub fn format_naive(&self, value: &NaiveDateTime) -> String {
        value.format(&self.strftime).to_string()
    }

    pub fn parse_naive(&self, value: &str) -> Result<NaiveDateTime, String> {
        NaiveDateTime::parse_from_str(value, &self.strftime)
            .map_err(|err| format!("'{value}' does not match '{}': {err}", self.pattern))
    }
}

fn translate(pattern: &str) -> Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];

        if ch == '\'' {
            index += 1;
            if chars.get(index) == Some(&'\'') {
                out.push('\'');
                index += 1;
                continue;
            }
            loop {
                match chars.get(index) {
                    None => return Err(format!("unterminated quote in pattern '{pattern}'")),
                    Some('\'') if chars.get(index + 1) == Some(&'\'') => {
                        out.push('\'');
                        index += 2;
                    }
                    Some('\'') => {
                        index += 1;
                        break;
                    }
                    Some(literal) => {
                        push_literal(&mut out, *literal);
                        index += 1;
                    }
                }
            }
            continue;
        }

        if !ch.is_ascii_alphabetic() {
            push_literal(&mut out, ch);
            index += 1;
            continue;
        }

        let run = chars[index..].iter().take_while(|next| **next == ch).count();
        out.push_str(letter_run(ch, run).ok_or_else(|| {
            format!(
                "unsupported pattern letters '{}' in '{pattern}'",
                ch.to_string().repeat(run)
            )
        })?);
        index += run;
    }

    Ok(out)
}

fn push_literal(out: &mut String, ch: char) {
    if ch == '%' {
        out.push_str("%%");
    } else {
        out.push(ch);
    }
}

fn letter_run(letter: char, run: usize) -> Option<&'static str> {
    let spec = match (letter, run) {
        ('y' | 'u', 2) => "%y",
        ('y' | 'u', _) => "%Y",
        ('M' | 'L', 1) => "%-m",
        ('M' | 'L', 2) => "%m",
        ('M' | 'L', 3) => "%b",
        ('M' | 'L', _) => "%B",
        ('d', 1) => "%-d",
        ('d', 2) => "%d",
        ('D', 1..=3) => "%j",
        ('H', 1) => "%-H",
        ('H', 2) => "%H",
        ('h', 1) => "%-I",
        ('h', 2) => "%I",
        ('m', 1) => "%-M",
        ('m', 2) => "%M",
        ('s', 1) => "%-S",
        ('s', 2) => "%S",
        ('S', 1..=3) => "%3f",
        ('S', 4..=6) => "%6f",
        ('S', 7..=9) => "%9f",
        ('a', 1) => "%p",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('Z', 1..=3) | ('X' | 'x', 1 | 2) => "%z",
        ('X' | 'x', 3) => "%:z",
        ('z', 1..=3) => "%Z",
        _ => return None,
    };
    Some(spec)
}
