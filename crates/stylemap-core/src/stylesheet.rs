//! Parsed stylesheet rules and declarations.
//!
//! The grammar is deliberately restricted: a rule is a selector followed by
//! a flat `{ property: value; ... }` body. At-rules, nesting, combinator
//! semantics and pseudo-elements are not modelled; a selector is kept as the
//! raw text between blocks.

use serde::Serialize;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// One `property: value [!important]` pair. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDeclaration {
    property: String,
    value: String,
    important: bool,
    source_line: usize,
}

impl StyleDeclaration {
    pub fn new(
        property: impl Into<String>,
        value: impl Into<String>,
        important: bool,
        source_line: usize,
    ) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important,
            source_line,
        }
    }

    /// Lowercased property name.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Value with `!important` stripped.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn important(&self) -> bool {
        self.important
    }

    /// 1-based line of the property name in the original text.
    pub fn source_line(&self) -> usize {
        self.source_line
    }
}

/// A selector and its declarations, in source order. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRule {
    selector: String,
    declarations: Vec<StyleDeclaration>,
    specificity: u32,
    source_line: usize,
    source_column: usize,
}

impl StyleRule {
    pub fn new(
        selector: impl Into<String>,
        declarations: Vec<StyleDeclaration>,
        source_line: usize,
        source_column: usize,
    ) -> Self {
        let selector = selector.into();
        let specificity = specificity(&selector);
        Self {
            selector,
            declarations,
            specificity,
            source_line,
            source_column,
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn declarations(&self) -> &[StyleDeclaration] {
        &self.declarations
    }

    pub fn specificity(&self) -> u32 {
        self.specificity
    }

    pub fn source_line(&self) -> usize {
        self.source_line
    }

    pub fn source_column(&self) -> usize {
        self.source_column
    }

    /// Last declaration for `property` (later declarations win, as in CSS).
    pub fn get(&self, property: &str) -> Option<&StyleDeclaration> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.property == property)
    }

    /// Whether any declaration's property satisfies `pred`.
    pub fn declares(&self, pred: impl Fn(&str) -> bool) -> bool {
        self.declarations.iter().any(|d| pred(&d.property))
    }

    /// `.class` names in the selector, in order of appearance.
    pub fn class_names(&self) -> Vec<&str> {
        prefixed_identifiers(&self.selector, '.')
    }

    /// `#id` names in the selector, in order of appearance.
    pub fn id_names(&self) -> Vec<&str> {
        prefixed_identifiers(&self.selector, '#')
    }

    /// Whether the selector is a bare generic element name.
    pub fn is_generic_tag(&self) -> bool {
        const GENERIC_TAGS: &[&str] = &["div", "span", "p", "h1", "h2", "h3"];
        let sel = self.selector.trim();
        GENERIC_TAGS.iter().any(|t| sel.eq_ignore_ascii_case(t))
    }
}

/// Selector weight: 100 per `#`, 10 per `.`, `:` or `[`, plus 1 per ASCII
/// letter anywhere in the selector (identifier letters included).
pub fn specificity(selector: &str) -> u32 {
    selector.chars().fold(0, |acc, c| {
        acc + match c {
            '#' => 100,
            '.' | ':' | '[' => 10,
            c if c.is_ascii_alphabetic() => 1,
            _ => 0,
        }
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Collect identifiers that directly follow `prefix` in `selector`.
fn prefixed_identifiers(selector: &str, prefix: char) -> Vec<&str> {
    let mut rest = selector;
    let mut names = Vec::new();
    loop {
        let _ = take_till::<_, _, ContextError>(0.., prefix).parse_next(&mut rest);
        if rest.is_empty() {
            break;
        }
        rest = &rest[prefix.len_utf8()..];
        if let Ok(name) = take_while::<_, _, ContextError>(1.., is_ident_char).parse_next(&mut rest)
        {
            names.push(name);
        }
    }
    names
}
