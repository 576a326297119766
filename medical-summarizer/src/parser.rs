//! Best-effort parsing of model output into summary, critical findings and
//! source mapping.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::models::SourceMapping;
use crate::prompt::paragraphs;

// Headings count only at the start of a line, followed by a colon or by
// nothing but decoration.
static SUMMARY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:#+[ \t]*)?\**[ \t]*summary[ \t]*\**[ \t]*(?::[ \t]*\**|\r?$)")
        .expect("valid regex")
});

static FINDINGS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:#+[ \t]*)?\**[ \t]*critical[ \t]+findings[ \t]*\**[ \t]*(?::[ \t]*\**|\r?$)",
    )
    .expect("valid regex")
});

// Run-on form: a capitalised heading right after a sentence ends, as in
// `Stable. Critical Findings Hypotension`.
static INLINE_FINDINGS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[.!?])\s*(\**[ \t]*(?:Critical Findings|CRITICAL FINDINGS)\b[ \t]*\**[ \t]*:?[ \t]*\**)")
        .expect("valid regex")
});

static MAPPING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:#+[ \t]*)?\**[ \t]*source[ \t]+mappings?[ \t]*\**[ \t]*(?::[ \t]*\**|\r?$)",
    )
    .expect("valid regex")
});

static MAPPING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bS(\d+)\s*(?::|->|=>|=|-)\s*(P\d+(?:\s*,\s*P\d+)*)").expect("valid regex")
});

static PASSAGE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)P(\d+)").expect("valid regex"));

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]+|\d+[.)])\s*").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredSummary {
    pub summary: String,
    pub critical_findings: Vec<String>,
    /// Only set when the model produced a mapping section.
    pub source_mapping: Option<SourceMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParsedCompletion {
    Structured(StructuredSummary),
    /// No recognised markers; the whole completion is the summary.
    Unstructured(String),
}

impl ParsedCompletion {
    pub fn summary_text(&self) -> &str {
        match self {
            ParsedCompletion::Structured(s) => &s.summary,
            ParsedCompletion::Unstructured(raw) => raw,
        }
    }
}

/// Split a completion into its sections.
///
/// Critical findings and mapping sections are only looked for when
/// `expect_findings` is set; otherwise they stay part of the summary text.
/// Mapped passages at or past `passage_count` do not exist in the note and
/// are dropped.
pub fn parse_completion(
    raw: &str,
    expect_findings: bool,
    passage_count: usize,
) -> ParsedCompletion {
    let raw = raw.trim();
    let mut found_marker = false;

    let (mut body, mapping_section) = match MAPPING_MARKER.find(raw).filter(|_| expect_findings) {
        Some(m) => {
            found_marker = true;
            (&raw[..m.start()], Some(&raw[m.end()..]))
        }
        None => (raw, None),
    };

    let findings_marker = FINDINGS_MARKER.find(body).or_else(|| {
        INLINE_FINDINGS_MARKER
            .captures(body)
            .and_then(|caps| caps.get(1))
    });
    let findings_section = match findings_marker.filter(|_| expect_findings) {
        Some(m) => {
            found_marker = true;
            let section = &body[m.end()..];
            body = &body[..m.start()];
            Some(section)
        }
        None => None,
    };

    let summary = match SUMMARY_MARKER.find(body) {
        Some(m) => {
            found_marker = true;
            body[m.end()..].trim()
        }
        None => body.trim(),
    };

    if !found_marker || summary.is_empty() {
        return ParsedCompletion::Unstructured(raw.to_string());
    }

    ParsedCompletion::Structured(StructuredSummary {
        summary: summary.to_string(),
        critical_findings: findings_section.map(parse_findings).unwrap_or_default(),
        source_mapping: mapping_section
            .map(|section| parse_mapping(section, passage_count))
            .filter(|mapping| !mapping.is_empty()),
    })
}

fn parse_findings(section: &str) -> Vec<String> {
    section
        .lines()
        .map(|line| {
            let line = BULLET.replace(line.trim(), "");
            line.trim()
                .trim_matches('*')
                .trim_matches(':')
                .trim()
                .to_string()
        })
        .filter(|finding| !finding.is_empty() && !finding.eq_ignore_ascii_case("none"))
        .collect()
}

/// `S1: P2, P3` becomes `sentence_0 -> [1, 2]`.
fn parse_mapping(section: &str, passage_count: usize) -> SourceMapping {
    let mut mapping = SourceMapping::new();
    for caps in MAPPING_LINE.captures_iter(section) {
        let Some(sentence) = caps[1].parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
            continue;
        };
        let passages: Vec<usize> = PASSAGE_REF
            .captures_iter(&caps[2])
            .filter_map(|p| p[1].parse::<usize>().ok()?.checked_sub(1))
            .filter(|&index| index < passage_count)
            .collect();
        if !passages.is_empty() {
            mapping.insert(format!("sentence_{}", sentence), passages);
        }
    }
    mapping
}

/// Map summary sentences to note paragraphs by shared long words.
///
/// Each sentence contributes up to three words longer than five characters;
/// a paragraph matches when it contains any of them, ignoring case.
pub fn lexical_source_mapping(source_text: &str, summary: &str) -> SourceMapping {
    let source: Vec<String> = paragraphs(source_text)
        .into_iter()
        .map(str::to_lowercase)
        .collect();

    let mut mapping = SourceMapping::new();
    let sentences = summary.split('.').map(str::trim).filter(|s| !s.is_empty());

    for (i, sentence) in sentences.enumerate() {
        let key_terms: Vec<String> = sentence
            .split_whitespace()
            .filter(|word| word.chars().count() > 5)
            .take(3)
            .map(str::to_lowercase)
            .collect();

        let matched: Vec<usize> = source
            .iter()
            .enumerate()
            .filter(|(_, paragraph)| key_terms.iter().any(|term| paragraph.contains(term.as_str())))
            .map(|(j, _)| j)
            .collect();

        if !matched.is_empty() {
            mapping.insert(format!("sentence_{}", i), matched);
        }
    }
    mapping
}
