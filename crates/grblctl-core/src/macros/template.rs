//! Typed G-code templates
//!
//! A template is parsed once into lines of literal and placeholder
//! segments. Placeholders are written `{name}` in the source text and are
//! resolved by exact name lookup, so a parameter name that happens to
//! appear inside another word is never substituted.

use crate::error::MacroError;

/// One piece of a template line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied verbatim
    Literal(String),
    /// A named numeric parameter
    Param(String),
}

/// A single template line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateLine {
    segments: Vec<Segment>,
}

impl TemplateLine {
    /// Parse one line of template source
    pub fn parse(source: &str) -> Result<Self, MacroError> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| MacroError::UnterminatedPlaceholder {
                    line: source.to_string(),
                })?;
            let name = after[..close].trim();
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(MacroError::EmptyPlaceholder {
                    line: source.to_string(),
                });
            }
            segments.push(Segment::Param(name.to_string()));
            rest = &after[close + 1..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names referenced by this line
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render the line, resolving each placeholder through `lookup`
    pub fn render<F>(&self, mut lookup: F) -> Result<String, String>
    where
        F: FnMut(&str) -> Option<f64>,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param(name) => {
                    let value = lookup(name.as_str()).ok_or_else(|| name.clone())?;
                    out.push_str(&format_number(value));
                }
            }
        }
        Ok(out)
    }
}

/// An ordered multi-line template
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    lines: Vec<TemplateLine>,
}

impl Template {
    /// Parse template source, one G-code block per line
    pub fn parse(source: &str) -> Result<Self, MacroError> {
        let lines = source
            .lines()
            .map(TemplateLine::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { lines })
    }

    /// Template lines in order
    pub fn lines(&self) -> &[TemplateLine] {
        &self.lines
    }

    /// All placeholder names, in order of first appearance
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.lines.iter().flat_map(|l| l.placeholders()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Format a parameter value as a plain decimal (`10`, `19.25`, never `1e1`)
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments() {
        let line = TemplateLine::parse("G38.2 Z-{maxdepth} F{speed}").unwrap();
        assert_eq!(
            line.segments(),
            &[
                Segment::Literal("G38.2 Z-".to_string()),
                Segment::Param("maxdepth".to_string()),
                Segment::Literal(" F".to_string()),
                Segment::Param("speed".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            TemplateLine::parse("G0 Z{depth"),
            Err(MacroError::UnterminatedPlaceholder { .. })
        ));
        assert!(matches!(
            TemplateLine::parse("G0 Z{}"),
            Err(MacroError::EmptyPlaceholder { .. })
        ));
        assert!(matches!(
            TemplateLine::parse("G0 Z{a b}"),
            Err(MacroError::EmptyPlaceholder { .. })
        ));
    }

    #[test]
    fn test_render_does_not_touch_literal_text() {
        // "speed" appears as literal text and must survive untouched
        let line = TemplateLine::parse("(speed) F{speed}").unwrap();
        let rendered = line
            .render(|name| (name == "speed").then_some(30.0))
            .unwrap();
        assert_eq!(rendered, "(speed) F30");
    }

    #[test]
    fn test_render_reports_missing_name() {
        let line = TemplateLine::parse("G92 Z{thickness}").unwrap();
        assert_eq!(line.render(|_| None), Err("thickness".to_string()));
    }

    #[test]
    fn test_placeholders_deduplicated() {
        let template = Template::parse("G0 Z{a}\nG1 Z{b} F{a}").unwrap();
        assert_eq!(template.placeholders(), vec!["a", "b"]);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(19.25), "19.25");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.001), "0.001");
        assert_eq!(format_number(1e7), "10000000");
    }
}
