//! Constant-redefinition diagnostics.
//!
//! The validator scans a document for `set: const ...;` declarations, reduces
//! each one to a whitespace-tolerant name-and-type pattern, then reports every
//! textual re-occurrence of a declared constant as an error. The whole raw
//! text is re-scanned on every validation pass; nothing is persisted between
//! passes.
//!
//! Two long-standing quirks are part of the contract:
//!
//! - the declaring line contains its own name-and-type fragment, so a
//!   declaration is reported as the first "redefinition" of itself;
//! - matching is purely textual, so a declared name also matches inside
//!   unrelated tokens (`e` matches the `e` in `end:`).

use std::fmt;

use itertools::Itertools;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticRelatedInformation, DiagnosticSeverity, Location, Range, Url,
};

use crate::config::EffectiveSettings;
use crate::documents::Document;

/// Source tag attached to every published diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "mbdls";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A declared constant, reduced to the whitespace-delimited segments of its
/// name-and-type fragment. `set: const integer n = 10;` becomes the segments
/// `["integer", "n"]`; re-matching tolerates any amount of whitespace
/// (including none) between segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPattern {
    segments: Vec<String>,
}

impl ConstantPattern {
    /// Build a pattern from a source line, if the line declares a constant.
    ///
    /// A declaration carries all three literal markers: the `set:` statement
    /// marker, the `const` modifier and the `;` terminator. The fragment is
    /// everything before the first `=`, with the first `set:` and the first
    /// `const` removed. A fragment that collapses to nothing yields no
    /// pattern — the matcher admits no zero-width matches.
    pub fn from_declaration(line: &str) -> Option<ConstantPattern> {
        if !(line.contains("set:") && line.contains("const") && line.contains(';')) {
            return None;
        }

        let fragment = match line.split_once('=') {
            Some((fragment, _)) => fragment,
            None => line,
        };
        let fragment = fragment.replacen("set:", "", 1).replacen("const", "", 1);

        let segments = WHITESPACE
            .split(&fragment)
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect::<Vec<String>>();

        if segments.is_empty() {
            return None;
        }
        Some(ConstantPattern { segments })
    }

    /// Match this pattern against `chars` starting exactly at `offset`.
    /// Segments must appear in order, separated by runs of whitespace of any
    /// length including zero. Returns the end offset of the match.
    fn match_at(&self, chars: &[char], offset: usize) -> Option<usize> {
        let mut cursor = offset;
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                while chars.get(cursor).is_some_and(|c| c.is_whitespace()) {
                    cursor += 1;
                }
            }
            for expected in segment.chars() {
                if chars.get(cursor).copied() != Some(expected) {
                    return None;
                }
                cursor += 1;
            }
        }
        Some(cursor)
    }
}

impl fmt::Display for ConstantPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.iter().join(" "))
    }
}

/// A constant declaration found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredConstant {
    /// Zero-based line index of the declaring line.
    pub line: usize,
    pub pattern: ConstantPattern,
}

/// Extract every constant declaration, in line order. Handles both `\n` and
/// `\r\n` line endings.
pub fn declared_constants(text: &str) -> Vec<DeclaredConstant> {
    text.lines()
        .enumerate()
        .collect::<Vec<_>>()
        .into_par_iter()
        .filter_map(|(line, text)| {
            ConstantPattern::from_declaration(text).map(|pattern| DeclaredConstant { line, pattern })
        })
        .collect()
}

/// One textual occurrence of a declared constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redefinition {
    /// Char offset of the first matched char.
    pub start: usize,
    /// Char offset one past the last matched char.
    pub end: usize,
    /// The text the match spans, whitespace as in the document.
    pub text: String,
    /// Index into the declared-constant list of the pattern that matched.
    pub declaration: usize,
}

/// Scan the raw text for all non-overlapping occurrences of the declared
/// constants, in left-to-right order. At each offset the patterns are tried
/// in declaration order and the first match wins; scanning resumes at the end
/// of each match.
pub fn find_redefinitions(text: &str, declared: &[DeclaredConstant]) -> Vec<Redefinition> {
    let chars = text.chars().collect::<Vec<char>>();
    let mut redefinitions = Vec::new();

    let mut offset = 0;
    while offset < chars.len() {
        let hit = declared.iter().enumerate().find_map(|(declaration, constant)| {
            constant
                .pattern
                .match_at(&chars, offset)
                .map(|end| (declaration, end))
        });
        match hit {
            Some((declaration, end)) => {
                redefinitions.push(Redefinition {
                    start: offset,
                    end,
                    text: chars[offset..end].iter().collect(),
                    declaration,
                });
                offset = end;
            }
            None => offset += 1,
        }
    }

    redefinitions
}

/// Validate a document: one error diagnostic per redefinition, capped at
/// `max_number_of_problems`. Matches beyond the cap are dropped silently.
pub fn check(document: &Document, settings: &EffectiveSettings) -> Vec<Diagnostic> {
    run_check(document, settings, None)
}

/// Like [`check`], additionally linking every diagnostic back to the line
/// that declared the constant, for clients that render related information.
pub fn check_with_origin(
    document: &Document,
    settings: &EffectiveSettings,
    origin: &Url,
) -> Vec<Diagnostic> {
    run_check(document, settings, Some(origin))
}

fn run_check(
    document: &Document,
    settings: &EffectiveSettings,
    origin: Option<&Url>,
) -> Vec<Diagnostic> {
    let text = document.contents();

    let declared = declared_constants(&text);
    if declared.is_empty() {
        return Vec::new();
    }

    find_redefinitions(&text, &declared)
        .into_iter()
        .take(settings.max_number_of_problems as usize)
        .map(|redefinition| {
            let constant = &declared[redefinition.declaration];
            let related_information = origin.map(|uri| {
                let (start, end) = document.line_range(constant.line);
                vec![DiagnosticRelatedInformation {
                    location: Location {
                        uri: uri.clone(),
                        range: Range::new(start, end),
                    },
                    message: format!("`{}` is declared as a constant here", constant.pattern),
                }]
            });
            Diagnostic {
                range: Range::new(
                    document.position_at(redefinition.start),
                    document.position_at(redefinition.end),
                ),
                severity: Some(DiagnosticSeverity::ERROR),
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                message: format!(
                    "{} is a const variable, it cannot be redefined.",
                    redefinition.text
                ),
                related_information,
                ..Default::default()
            }
        })
        .collect()
}
