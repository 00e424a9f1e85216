// src/core/templater.rs

//! Renders command templates such as `vim {{.File}}` against a `CommandContext`.
//!
//! The syntax is flat substitution only: `{{.File}}`, `{{.Dir}}`, `{{.Base}}`,
//! `{{.Name}}` and `{{.Ext}}`, with optional whitespace inside the braces.
//! Anything else between `{{` and `}}` is rejected.

use crate::core::context::CommandContext;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    // Lazy so that `{{.A}} {{.B}}` yields two actions, not one.
    static ref ACTION_RE: Regex = Regex::new(r"\{\{(.*?)\}\}").expect("static regex is valid");
}

/// Errors raised while parsing a command template.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unclosed action in template '{template}' (starting at byte {position}).")]
    Unclosed { template: String, position: usize },
    #[error("Empty action '{{{{}}}}' in template '{template}'.")]
    EmptyAction { template: String },
    #[error("Unknown field '{field}' in template '{template}'. Available: .File, .Dir, .Base, .Name, .Ext")]
    UnknownField { template: String, field: String },
    #[error("Unsupported action '{action}' in template '{template}'. Only field references like {{{{.File}}}} are allowed.")]
    UnsupportedAction { template: String, action: String },
}

/// A context value a template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    File,
    Dir,
    Base,
    Name,
    Ext,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "File" => Some(Self::File),
            "Dir" => Some(Self::Dir),
            "Base" => Some(Self::Base),
            "Name" => Some(Self::Name),
            "Ext" => Some(Self::Ext),
            _ => None,
        }
    }

    fn value<'c>(&self, ctx: &'c CommandContext) -> &'c str {
        match self {
            Self::File => &ctx.file,
            Self::Dir => &ctx.dir,
            Self::Base => &ctx.base,
            Self::Name => &ctx.name,
            Self::Ext => &ctx.ext,
        }
    }
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Field(Field),
}

/// Parses a template into literal and field segments. Adjacent literals are merged.
pub fn parse(template: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut cursor = 0;

    for captures in ACTION_RE.captures_iter(template) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        push_literal(&mut segments, template.get(cursor..whole.start()).unwrap_or(""));
        segments.push(Segment::Field(parse_action(template, inner.as_str())?));
        cursor = whole.end();
    }

    let tail = template.get(cursor..).unwrap_or("");
    if let Some(offset) = tail.find("{{") {
        return Err(TemplateError::Unclosed {
            template: template.to_string(),
            position: cursor + offset,
        });
    }
    push_literal(&mut segments, tail);

    Ok(segments)
}

/// Checks a template for syntax errors without rendering it.
pub fn validate(template: &str) -> Result<(), TemplateError> {
    parse(template).map(|_| ())
}

/// Renders a template against the given context.
pub fn render(template: &str, ctx: &CommandContext) -> Result<String, TemplateError> {
    let segments = parse(template)?;
    let mut rendered = String::with_capacity(template.len() + ctx.abs_file.len());
    for segment in &segments {
        match segment {
            Segment::Literal(s) => rendered.push_str(s),
            Segment::Field(field) => rendered.push_str(field.value(ctx)),
        }
    }
    log::trace!("Rendered template '{}' -> '{}'", template, rendered);
    Ok(rendered)
}

fn parse_action(template: &str, inner: &str) -> Result<Field, TemplateError> {
    let action = inner.trim();
    if action.is_empty() {
        return Err(TemplateError::EmptyAction {
            template: template.to_string(),
        });
    }
    let Some(field_name) = action.strip_prefix('.') else {
        return Err(TemplateError::UnsupportedAction {
            template: template.to_string(),
            action: action.to_string(),
        });
    };
    Field::from_name(field_name).ok_or_else(|| TemplateError::UnknownField {
        template: template.to_string(),
        field: action.to_string(),
    })
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Literal(last)) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(Segment::Literal(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> CommandContext {
        CommandContext::from_target("/tmp/foo.bar.txt")
    }

    #[test]
    fn test_render_all_fields() {
        let rendered = render(
            "{{.File}}|{{.Dir}}|{{.Base}}|{{.Name}}|{{.Ext}}",
            &sample_context(),
        )
        .unwrap();
        assert_eq!(rendered, "/tmp/foo.bar.txt|/tmp|foo.bar.txt|foo.bar|.txt");
    }

    #[test]
    fn test_render_tolerates_whitespace_in_actions() {
        let rendered = render("cat {{ .File }}", &sample_context()).unwrap();
        assert_eq!(rendered, "cat /tmp/foo.bar.txt");
    }

    #[test]
    fn test_render_plain_text_is_unchanged() {
        let rendered = render("echo '}} not an action'", &sample_context()).unwrap();
        assert_eq!(rendered, "echo '}} not an action'");
    }

    #[test]
    fn test_parse_merges_literals_and_keeps_fields() {
        let segments = parse("vim {{.File}} +1").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Literal("vim ".to_string()),
                Segment::Field(Field::File),
                Segment::Literal(" +1".to_string()),
            ]
        );
    }

    #[test]
    fn test_unclosed_action_is_an_error() {
        let err = parse("vim {{.File").unwrap_err();
        assert_eq!(
            err,
            TemplateError::Unclosed {
                template: "vim {{.File".to_string(),
                position: 4,
            }
        );
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let err = render("vim {{.Path}}", &sample_context()).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownField { ref field, .. } if field == ".Path"));
    }

    #[test]
    fn test_field_names_are_case_sensitive() {
        assert!(matches!(
            validate("{{.file}}"),
            Err(TemplateError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_function_calls_are_rejected() {
        assert!(matches!(
            validate("{{printf \"%s\" .File}}"),
            Err(TemplateError::UnsupportedAction { .. })
        ));
        assert!(matches!(
            validate("{{ }}"),
            Err(TemplateError::EmptyAction { .. })
        ));
    }
}
