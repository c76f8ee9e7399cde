//! Stylesheet parser: raw CSS text → ordered `StyleRule`s.
//!
//! Built on `winnow` 0.7 scanning primitives. The scanner is best-effort:
//! it looks for `selector { declarations }` shapes and skips everything
//! else with a warning. Malformed input never fails the parse; `is_valid`
//! only turns false when the scanner itself errors.
//!
//! Recognized: block comments, flat rule bodies, `!important`.
//! Skipped with a warning: at-rules, nested blocks, stray `}`, unterminated
//! blocks, empty selectors, empty bodies.

use crate::stylesheet::{StyleDeclaration, StyleRule};
use serde::Serialize;
use std::fmt;
use winnow::ascii::multispace0;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{rest, take_till, take_until, take_while};

// ─── Outcome types ───────────────────────────────────────────────────────

/// A parse warning or error tied to a source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    /// 1-based line in the original text.
    pub line: usize,
    /// Human-readable message.
    pub message: String,
}

impl ParseDiagnostic {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStatistics {
    pub rule_count: usize,
    pub declaration_count: usize,
    pub comment_count: usize,
    pub line_count: usize,
    pub warning_count: usize,
}

/// Everything the parser learned about a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutcome {
    /// Rules in source order.
    pub rules: Vec<StyleRule>,
    /// Internal scanner failures. Non-empty only when `is_valid` is false.
    pub errors: Vec<ParseDiagnostic>,
    /// Skipped or unrecognized fragments.
    pub warnings: Vec<ParseDiagnostic>,
    pub statistics: ParseStatistics,
    pub is_valid: bool,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Parse stylesheet text into rules. Never fails on malformed CSS.
#[must_use = "parsing result should be used"]
pub fn parse_stylesheet(text: &str) -> ParseOutcome {
    let (clean, comment_count, unterminated_comment) = blank_comments(text);
    let mut scanner = Scanner::new(text, &clean);

    if let Some(offset) = unterminated_comment {
        scanner.warn(offset, "Unterminated comment; ignored to end of stylesheet");
    }

    let mut input = clean.as_str();
    let mut errors = Vec::new();
    if let Err(e) = scanner.scan_rules(&mut input) {
        let offset = clean.len() - input.len();
        errors.push(ParseDiagnostic::new(
            scanner.line_of(offset),
            format!("Stylesheet scanner failed: {e}"),
        ));
    }

    let statistics = ParseStatistics {
        rule_count: scanner.rules.len(),
        declaration_count: scanner.declaration_count,
        comment_count,
        line_count: text.lines().count(),
        warning_count: scanner.warnings.len(),
    };
    log::debug!(
        "parsed stylesheet: {} rules, {} declarations, {} warnings",
        statistics.rule_count,
        statistics.declaration_count,
        statistics.warning_count
    );

    ParseOutcome {
        is_valid: errors.is_empty(),
        rules: scanner.rules,
        errors,
        warnings: scanner.warnings,
        statistics,
    }
}

// ─── Comments ────────────────────────────────────────────────────────────

/// Replace every `/* ... */` with spaces of the same byte length, keeping
/// newlines, so offsets and line numbers still point into the original text.
///
/// Returns the blanked text, the comment count, and the offset of an
/// unterminated comment if one runs to the end of input.
fn blank_comments(text: &str) -> (String, usize, Option<usize>) {
    let mut out = String::with_capacity(text.len());
    let mut input = text;
    let mut count = 0;
    let mut unterminated = None;

    loop {
        match take_until::<_, _, ContextError>(0.., "/*").parse_next(&mut input) {
            Ok(before) => out.push_str(before),
            Err(_) => {
                out.push_str(input);
                break;
            }
        }

        count += 1;
        let start = text.len() - input.len();
        let comment = match input[2..].find("*/") {
            Some(pos) => &input[..pos + 4],
            None => {
                unterminated = Some(start);
                input
            }
        };
        for c in comment.chars() {
            if c == '\n' {
                out.push('\n');
            } else {
                out.extend(std::iter::repeat_n(' ', c.len_utf8()));
            }
        }
        input = &input[comment.len()..];
    }

    (out, count, unterminated)
}

// ─── Scanner ─────────────────────────────────────────────────────────────

struct Scanner<'s> {
    /// Original text, used for column counting.
    original: &'s str,
    /// Comment-blanked text being scanned (same byte offsets as `original`).
    text: &'s str,
    /// Byte offset of each line start.
    line_starts: Vec<usize>,
    rules: Vec<StyleRule>,
    warnings: Vec<ParseDiagnostic>,
    declaration_count: usize,
}

impl<'s> Scanner<'s> {
    fn new(original: &'s str, text: &'s str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            original,
            text,
            line_starts,
            rules: Vec::new(),
            warnings: Vec::new(),
            declaration_count: 0,
        }
    }

    fn offset(&self, input: &str) -> usize {
        self.text.len() - input.len()
    }

    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    fn column_of(&self, offset: usize) -> usize {
        let start = self.line_starts[self.line_of(offset) - 1];
        self.original
            .get(start..offset)
            .map_or(offset - start, |s| s.chars().count())
            + 1
    }

    fn warn(&mut self, offset: usize, message: impl Into<String>) {
        let diag = ParseDiagnostic::new(self.line_of(offset), message);
        log::trace!("stylesheet warning: {diag}");
        self.warnings.push(diag);
    }

    /// Main scanning loop over `prelude { body }` shapes.
    fn scan_rules(&mut self, input: &mut &'s str) -> ModalResult<()> {
        // Blocks opened by an unsupported prelude whose `}` is still pending.
        let mut open_nested = 0usize;

        loop {
            let prelude_start = self.offset(input);
            let prelude: &'s str = take_till(0.., ['{', '}']).parse_next(input)?;
            let prelude_at = prelude_start + leading_ws(prelude);

            match input.chars().next() {
                None => {
                    if !prelude.trim().is_empty() {
                        self.warn(
                            prelude_at,
                            format!("Unrecognized text `{}` outside any rule", excerpt(prelude)),
                        );
                    }
                    return Ok(());
                }
                Some('}') => {
                    let brace_at = self.offset(input);
                    let _ = '}'.parse_next(input)?;
                    if open_nested > 0 && prelude.trim().is_empty() {
                        open_nested -= 1;
                    } else {
                        self.warn(brace_at, "Unmatched `}`; fragment skipped");
                    }
                }
                Some(_) => {
                    let _ = '{'.parse_next(input)?;
                    let body_start = self.offset(input);
                    let body: &'s str = take_till(0.., ['{', '}']).parse_next(input)?;

                    match input.chars().next() {
                        Some('}') => {
                            let _ = '}'.parse_next(input)?;
                            self.push_rule(prelude_start, prelude, body_start, body)?;
                        }
                        Some(_) => {
                            // Nested block: the outer prelude is not a rule;
                            // rescan its body as the next rule's selector.
                            self.warn(
                                prelude_at,
                                format!(
                                    "Skipped unsupported block `{}`; nested blocks are not parsed",
                                    excerpt(prelude)
                                ),
                            );
                            open_nested += 1;
                            *input = &self.text[body_start..];
                        }
                        None => {
                            self.warn(
                                prelude_at,
                                format!("Unterminated rule block `{}`", excerpt(prelude)),
                            );
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    fn push_rule(
        &mut self,
        prelude_start: usize,
        prelude: &'s str,
        body_start: usize,
        body: &'s str,
    ) -> ModalResult<()> {
        // Statement at-rules (`@import ...;`) end up in front of the next selector.
        let (selector_start, selector_text) = match prelude.rfind(';') {
            Some(pos) => {
                let skipped = &prelude[..pos];
                self.warn(
                    prelude_start + leading_ws(skipped),
                    format!("Skipped statement `{}`", excerpt(skipped)),
                );
                (prelude_start + pos + 1, &prelude[pos + 1..])
            }
            None => (prelude_start, prelude),
        };
        let selector_at = selector_start + leading_ws(selector_text);
        let selector = collapse_ws(selector_text);

        if selector.is_empty() {
            self.warn(selector_at, "Rule block with an empty selector skipped");
            return Ok(());
        }
        if selector.starts_with('@') {
            self.warn(
                selector_at,
                format!("Skipped unsupported at-rule `{}`", excerpt(&selector)),
            );
            return Ok(());
        }
        if body.trim().is_empty() {
            self.warn(
                selector_at,
                format!("Rule `{selector}` has an empty declaration block"),
            );
            return Ok(());
        }

        let declarations = self.parse_declarations(body_start, body)?;
        self.declaration_count += declarations.len();
        let rule = StyleRule::new(
            selector,
            declarations,
            self.line_of(selector_at),
            self.column_of(selector_at),
        );
        self.rules.push(rule);
        Ok(())
    }

    /// Split a rule body on `;` and keep the `property: value` pairs.
    /// Anything else is dropped without a diagnostic.
    fn parse_declarations(
        &self,
        body_start: usize,
        body: &'s str,
    ) -> ModalResult<Vec<StyleDeclaration>> {
        let mut declarations = Vec::new();
        let mut input = body;

        while !input.is_empty() {
            let segment_start = body_start + (body.len() - input.len());
            let segment: &str = take_till(0.., ';').parse_next(&mut input)?;
            if input.starts_with(';') {
                let _ = ';'.parse_next(&mut input)?;
            }

            let decl_at = segment_start + leading_ws(segment);
            match declaration.parse(segment.trim()) {
                Ok((property, value, important)) => declarations.push(StyleDeclaration::new(
                    property.to_ascii_lowercase(),
                    value,
                    important,
                    self.line_of(decl_at),
                )),
                Err(_) if segment.trim().is_empty() => {}
                Err(_) => log::trace!("dropped declaration `{}`", excerpt(segment)),
            }
        }

        Ok(declarations)
    }
}

// ─── Declaration parser ──────────────────────────────────────────────────

fn property_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .verify(|p: &str| p.starts_with(|c: char| c.is_ascii_alphabetic() || c == '-'))
        .parse_next(input)
}

/// `property : value [!important]` → (property, value, important).
fn declaration<'a>(input: &mut &'a str) -> ModalResult<(&'a str, String, bool)> {
    let property = property_name.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let _ = ':'.parse_next(input)?;
    let raw: &str = rest.parse_next(input)?;

    let (value, important) = split_important(raw.trim());
    if value.is_empty() {
        return Err(winnow::error::ErrMode::Backtrack(ContextError::new()));
    }
    Ok((property, collapse_ws(value), important))
}

fn split_important(value: &str) -> (&str, bool) {
    if let Some(pos) = value.rfind('!')
        && value[pos + 1..].trim().eq_ignore_ascii_case("important")
    {
        return (value[..pos].trim_end(), true);
    }
    (value, false)
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn leading_ws(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Short single-line preview of a fragment for diagnostics.
fn excerpt(s: &str) -> String {
    let flat = collapse_ws(s);
    if flat.chars().count() > 40 {
        let cut: String = flat.chars().take(40).collect();
        format!("{cut}…")
    } else {
        flat
    }
}
