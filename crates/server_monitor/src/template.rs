//! Advertisement templates
//!
//! A template is a format string with named placeholders, e.g.
//! `{address} : {map} {players}/{max_players} {name}`. Literal braces are
//! written `{{` and `}}`. Templates are parsed and validated once, when the
//! configuration is loaded, so rendering itself cannot fail.

use crate::error::{ConfigError, ConfigResult};
use crate::fields::{self, NormalizedFields};
use std::fmt;
use std::str::FromStr;

/// Used whenever the configured format is missing or rejected
pub const DEFAULT_ADVERTISEMENT_FORMAT: &str =
    "^7{address} ^0: ^4{map} ^5{players}^7/^5{max_players} ^4{name}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A validated advertisement template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses and validates `format`.
    ///
    /// # Arguments
    ///
    /// * `format` - The advertisement pattern as written in the configuration
    ///
    /// # Returns
    ///
    /// The parsed template, or a [`ConfigError`] when `format` is empty, lacks
    /// `{address}`, references a placeholder no source can supply, carries a
    /// format spec, or has unbalanced braces.
    ///
    /// # Examples
    ///
    /// ```
    /// use server_monitor::fields::NormalizedFields;
    /// use server_monitor::Template;
    ///
    /// let template = Template::parse("{address} : {players}/{max_players}").unwrap();
    /// let fields: NormalizedFields = [("address", "1.2.3.4:27960"), ("players", "3")].into_iter().collect();
    /// assert_eq!(template.render(&fields), "1.2.3.4:27960 : 3/?");
    ///
    /// assert!(Template::parse("{players}").is_err());
    /// ```
    pub fn parse(format: &str) -> ConfigResult<Self> {
        if format.is_empty() {
            return Err(ConfigError::EmptyTemplate);
        }

        let segments = tokenize(format)?;

        for segment in &segments {
            if let Segment::Placeholder(name) = segment {
                if !fields::known_placeholders().any(|known| known == name) {
                    return Err(ConfigError::UnknownPlaceholder(name.clone()));
                }
            }
        }

        let has_address = segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(name) if name == fields::ADDRESS));
        if !has_address {
            return Err(ConfigError::MissingAddress);
        }

        Ok(Self {
            source: format.to_string(),
            segments,
        })
    }

    /// The format string this template was parsed from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the placeholders in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitutes every placeholder, using `?` for fields `data` lacks
    pub fn render(&self, data: &NormalizedFields) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => out.push_str(data.get_or_missing(name)),
            }
        }
        out
    }
}

impl Default for Template {
    fn default() -> Self {
        Self {
            source: DEFAULT_ADVERTISEMENT_FORMAT.to_string(),
            segments: tokenize(DEFAULT_ADVERTISEMENT_FORMAT).unwrap_or_default(),
        }
    }
}

impl FromStr for Template {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn tokenize(format: &str) -> ConfigResult<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = format.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(ConfigError::Malformed(pos)),
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    if c == '{' {
                        return Err(ConfigError::Malformed(pos));
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(ConfigError::Malformed(pos));
                }
                if name.contains(':') || name.contains('!') {
                    return Err(ConfigError::UnsupportedFormatSpec(name));
                }
                if !is_identifier(&name) {
                    return Err(ConfigError::UnknownPlaceholder(name));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(name));
            }
            c => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> NormalizedFields {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_default_template_is_valid() {
        let parsed = Template::parse(DEFAULT_ADVERTISEMENT_FORMAT).expect("default must validate");
        assert_eq!(parsed, Template::default());
    }

    #[test]
    fn test_missing_address_rejected() {
        assert_eq!(
            Template::parse("{map} {players}/{max_players} {name}"),
            Err(ConfigError::MissingAddress)
        );
        assert_eq!(Template::parse("address"), Err(ConfigError::MissingAddress));
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        assert_eq!(
            Template::parse("{address} {foo}"),
            Err(ConfigError::UnknownPlaceholder("foo".to_string()))
        );
        assert_eq!(
            Template::parse("{address} {0}"),
            Err(ConfigError::UnknownPlaceholder("0".to_string()))
        );
    }

    #[test]
    fn test_malformed_and_format_specs_rejected() {
        assert_eq!(Template::parse(""), Err(ConfigError::EmptyTemplate));
        assert!(matches!(Template::parse("{address"), Err(ConfigError::Malformed(0))));
        assert!(matches!(Template::parse("{address} }"), Err(ConfigError::Malformed(_))));
        assert_eq!(
            Template::parse("{address} {players:>3}"),
            Err(ConfigError::UnsupportedFormatSpec("players:>3".to_string()))
        );
    }

    #[test]
    fn test_core_and_extra_placeholders_accepted() {
        assert!(Template::parse("{address} {map} {players} {max_players} {name}").is_ok());
        assert!(Template::parse("{address} : {map} [{gamemode}] {country}").is_ok());
    }

    #[test]
    fn test_render_substitutes_and_escapes() {
        let template = Template::parse("{{{address}}} : {players}/{max_players} {name}").unwrap();
        let data = fields(&[
            ("address", "1.2.3.4:27960"),
            ("players", "15"),
            ("max_players", "20"),
            ("name", "X"),
        ]);
        assert_eq!(template.render(&data), "{1.2.3.4:27960} : 15/20 X");
    }

    #[test]
    fn test_render_missing_fields_as_question_mark() {
        let template = Template::parse("{address} : {map} {players}/{max_players}").unwrap();
        let data = fields(&[("address", "1.2.3.4:27960"), ("players", "3")]);
        assert_eq!(template.render(&data), "1.2.3.4:27960 : ? 3/?");
    }

    #[test]
    fn test_placeholders_in_order() {
        let template = Template::parse("{name} @ {address} {name}").unwrap();
        let names: Vec<&str> = template.placeholders().collect();
        assert_eq!(names, vec!["name", "address", "name"]);
    }
}
