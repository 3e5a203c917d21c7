use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ConfigValue;
use crate::error::{Error, Result};
use crate::interceptor::{
    Interceptor, InterceptorContext, SecretKeysHandler, EXPRESSION_INTERCEPTOR_PRIORITY,
};

/// Deepest chain of nested references a single lookup may follow.
pub const MAX_EXPANSION_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Reference {
        key: Vec<Segment>,
        default: Option<Vec<Segment>>,
    },
    Secret {
        handler: String,
        payload: Vec<Segment>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    End,
    /// Inside `${`, before the key/default separator.
    Key,
    /// Inside `${`, after the separator. `:` is plain text here.
    Tail,
}

struct Parser {
    chars: Vec<char>,
    index: usize,
    depth: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn starts_expression(&self) -> bool {
        self.peek() == Some('$') && self.peek_at(1) == Some('{')
    }

    fn parse(mut self) -> std::result::Result<Vec<Segment>, String> {
        self.parse_segments(Stop::End)
    }

    fn parse_segments(&mut self, stop: Stop) -> std::result::Result<Vec<Segment>, String> {
        let mut segments = Vec::new();
        let mut literal = String::new();

        while let Some(ch) = self.peek() {
            if ch == '\\' && self.peek_at(1) == Some('$') && self.peek_at(2) == Some('{') {
                literal.push_str("${");
                self.index += 3;
                continue;
            }
            if self.starts_expression() {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(self.parse_expression()?);
                continue;
            }
            match (ch, stop) {
                ('}', Stop::Key | Stop::Tail) | (':', Stop::Key) => break,
                _ => {
                    literal.push(ch);
                    self.index += 1;
                }
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(segments)
    }

    fn parse_expression(&mut self) -> std::result::Result<Segment, String> {
        let start = self.index;
        if self.depth >= MAX_EXPANSION_DEPTH {
            return Err(format!(
                "expression starting at offset {start} nests deeper than {MAX_EXPANSION_DEPTH} levels"
            ));
        }
        self.depth += 1;
        let segment = self.parse_expression_body(start);
        self.depth -= 1;
        segment
    }

    fn parse_expression_body(&mut self, start: usize) -> std::result::Result<Segment, String> {
        self.index += 2;

        let key = self.parse_segments(Stop::Key)?;
        if key.is_empty() {
            return Err(format!("empty reference at offset {start}"));
        }

        let segment = match self.peek() {
            Some(':') if self.peek_at(1) == Some(':') => {
                self.index += 2;
                let handler = match key.as_slice() {
                    [Segment::Literal(name)] => name.clone(),
                    _ => return Err(format!("secret handler name at offset {start} must be literal")),
                };
                let payload = self.parse_segments(Stop::Tail)?;
                Segment::Secret { handler, payload }
            }
            Some(':') => {
                self.index += 1;
                let default = self.parse_segments(Stop::Tail)?;
                Segment::Reference {
                    key,
                    default: Some(default),
                }
            }
            _ => Segment::Reference { key, default: None },
        };

        if self.peek() != Some('}') {
            return Err(format!("unterminated expression starting at offset {start}"));
        }
        self.index += 1;
        Ok(segment)
    }
}

/// Expands `${...}` references in every value it sees. Always part of the chain.
#[derive(Clone, Default)]
pub struct ExpressionInterceptor {
    handlers: BTreeMap<String, Arc<dyn SecretKeysHandler>>,
}

impl ExpressionInterceptor {
    pub fn new(handlers: BTreeMap<String, Arc<dyn SecretKeysHandler>>) -> Self {
        Self { handlers }
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    fn expand(&self, context: &InterceptorContext<'_>, name: &str, value: &str) -> Result<String> {
        if !value.contains("${") {
            return Ok(value.to_owned());
        }
        let segments = Parser::new(value)
            .parse()
            .map_err(|reason| Error::MalformedExpression {
                key: name.to_owned(),
                value: value.to_owned(),
                reason,
            })?;
        let mut out = String::with_capacity(value.len());
        self.render(context, name, value, &segments, &mut out)?;
        Ok(out)
    }

    fn render(
        &self,
        context: &InterceptorContext<'_>,
        name: &str,
        value: &str,
        segments: &[Segment],
        out: &mut String,
    ) -> Result<()> {
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Reference { key, default } => {
                    let mut reference = String::new();
                    self.render(context, name, value, key, &mut reference)?;

                    let resolved = context
                        .resolve(&reference)?
                        .map(|resolved| resolved.value().to_owned())
                        .filter(|resolved| !resolved.is_empty());
                    match (resolved, default) {
                        (Some(resolved), _) => out.push_str(&resolved),
                        (None, Some(default)) => self.render(context, name, value, default, out)?,
                        (None, None) => return Err(Error::MissingKey { key: reference }),
                    }
                }
                Segment::Secret { handler, payload } => {
                    let secret_handler =
                        self.handlers
                            .get(handler)
                            .ok_or_else(|| Error::MalformedExpression {
                                key: name.to_owned(),
                                value: value.to_owned(),
                                reason: format!("unknown secret handler '{handler}'"),
                            })?;
                    let mut secret = String::new();
                    self.render(context, name, value, payload, &mut secret)?;
                    let decoded =
                        secret_handler
                            .decode(&secret)
                            .map_err(|reason| Error::MalformedExpression {
                                key: name.to_owned(),
                                value: value.to_owned(),
                                reason: format!("secret handler '{handler}' failed: {reason}"),
                            })?;
                    out.push_str(&decoded);
                }
            }
        }
        Ok(())
    }
}

impl Interceptor for ExpressionInterceptor {
    fn name(&self) -> &str {
        "expression"
    }

    fn priority(&self) -> i32 {
        EXPRESSION_INTERCEPTOR_PRIORITY
    }

    fn intercept(
        &self,
        context: &InterceptorContext<'_>,
        name: &str,
    ) -> Result<Option<ConfigValue>> {
        let Some(value) = context.proceed(name)? else {
            return Ok(None);
        };
        let expanded = self.expand(context, name, value.value())?;
        Ok(Some(value.with_value(expanded)))
    }
}
