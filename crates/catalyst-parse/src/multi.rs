//! Multi-composition extraction over indexed assignments
//! (`composition_<N> = {...}`).

use crate::literal;
use catalyst_core::{validate, Composition};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

lazy_static! {
    static ref SECTION_HEADER: Regex = Regex::new(r"(?i)\*\*COMPOSITIONS:\*\*\s*\n").unwrap();
    static ref INDEXED_ASSIGNMENT: Regex =
        Regex::new(r"(?i)composition_\d+\s*=\s*(\{[^}]*\})").unwrap();
}

/// Markers that close the `**COMPOSITIONS:**` section
const SECTION_BOUNDARIES: [&str; 2] = ["\n\n", "\n["];

/// Body of the `**COMPOSITIONS:**` section, trimmed.
///
/// The section runs from the line after the label to the first blank line,
/// the first line opening with `[`, or the end of the text.
pub fn compositions_section(text: &str) -> Option<&str> {
    let header = SECTION_HEADER.find(text)?;
    let body = &text[header.end()..];
    let end = SECTION_BOUNDARIES
        .iter()
        .filter_map(|marker| body.find(marker))
        .min()
        .unwrap_or(body.len());
    Some(body[..end].trim())
}

/// Validated compositions from every indexed assignment in `text`, in order
fn indexed_compositions(text: &str) -> Vec<Composition> {
    INDEXED_ASSIGNMENT
        .captures_iter(text)
        .filter_map(|caps| {
            let candidate = caps.get(1)?.as_str();
            let raw = match literal::parse_mapping(candidate) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(candidate, error = %e, "indexed assignment skipped");
                    return None;
                }
            };
            match validate(&raw) {
                Ok(composition) => Some(composition),
                Err(rejection) => {
                    debug!(candidate, reason = %rejection, "indexed composition rejected");
                    None
                }
            }
        })
        .collect()
}

/// Extract every validated composition in a reply.
///
/// Section matches come first, then matches anywhere in the text. Exact
/// duplicates are dropped, keeping the first occurrence.
pub fn extract_many(text: &str) -> Vec<Composition> {
    let from_section = compositions_section(text)
        .map(indexed_compositions)
        .unwrap_or_default();
    let from_text = indexed_compositions(text);

    let mut unique: Vec<Composition> = Vec::with_capacity(from_section.len());
    for composition in from_section.into_iter().chain(from_text) {
        if !unique.contains(&composition) {
            unique.push(composition);
        }
    }

    info!(count = unique.len(), "parsed unique compositions");
    unique
}

/// Render compositions back into the indexed form, numbered from 1
pub fn to_indexed_assignments(compositions: &[Composition]) -> String {
    compositions
        .iter()
        .enumerate()
        .map(|(i, c)| c.to_assignment(i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
