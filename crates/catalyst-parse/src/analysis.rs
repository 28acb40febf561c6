//! Analysis extraction: labeled narrative sections plus every composition
//! in the reply.

use crate::multi::extract_many;
use catalyst_core::AnalysisResult;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ANALYSIS_HEADER: Regex = Regex::new(r"(?i)\*\*ANALYSIS:\*\*\s*\n").unwrap();
    static ref RECOMMENDATIONS_HEADER: Regex =
        Regex::new(r"(?i)\*\*RECOMMENDATIONS?:\*\*\s*\n").unwrap();
    static ref RECOMMENDATIONS_LABEL: Regex = Regex::new(r"(?i)\*\*RECOMMENDATIONS?:\*\*").unwrap();
    static ref COMPOSITIONS_LABEL: Regex = Regex::new(r"(?i)\*\*COMPOSITIONS?:\*\*").unwrap();
}

/// Text after the first `header` match up to the first `stop` match (or
/// the end), trimmed. A labeled but empty section is `Some("")`; only a
/// missing label gives `None`.
fn slice_section(text: &str, header: &Regex, stop: &Regex) -> Option<String> {
    let start = header.find(text)?.end();
    let rest = &text[start..];
    let end = stop.find(rest).map_or(rest.len(), |m| m.start());
    Some(rest[..end].trim().to_string())
}

pub fn extract_analysis_text(text: &str) -> Option<String> {
    slice_section(text, &ANALYSIS_HEADER, &RECOMMENDATIONS_LABEL)
}

pub fn extract_recommendations(text: &str) -> Option<String> {
    slice_section(text, &RECOMMENDATIONS_HEADER, &COMPOSITIONS_LABEL)
}

/// Parse the full structured reply.
///
/// Compositions come from the whole text, not from the sliced sections.
pub fn extract_analysis(text: &str) -> AnalysisResult {
    AnalysisResult {
        analysis: extract_analysis_text(text),
        recommendations: extract_recommendations(text),
        compositions: extract_many(text),
    }
}
