//! Prompt construction for a single note.
//!
//! The response layout requested here is what [`crate::parser`] looks for:
//! a `SUMMARY:` section, and when critical findings are highlighted, a
//! `CRITICAL FINDINGS:` list and a `SOURCE MAPPING:` section whose lines
//! look like `S1: P2, P3`.

use crate::models::{ClinicalRole, SummaryFormat};

pub const SUMMARY_HEADING: &str = "SUMMARY:";
pub const FINDINGS_HEADING: &str = "CRITICAL FINDINGS:";
pub const MAPPING_HEADING: &str = "SOURCE MAPPING:";

/// Non-empty, trimmed lines of a note. Source mapping indices refer to
/// positions in this list.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn role_instruction(role: ClinicalRole) -> &'static str {
    match role {
        ClinicalRole::Physician => {
            "Write for a physician. Use precise clinical terminology and focus on \
             diagnoses, relevant history, investigations and the management plan."
        }
        ClinicalRole::Nurse => {
            "Write for a nurse. Focus on observations, medications and their timing, \
             care needs and anything that requires monitoring or escalation."
        }
        ClinicalRole::Pharmacist => {
            "Write for a pharmacist. Focus on medications, doses, allergies, \
             interactions and renal or hepatic function."
        }
        ClinicalRole::Patient => {
            "Write for the patient. Use plain language, avoid abbreviations and \
             explain any medical terms that must be kept."
        }
        ClinicalRole::General => {
            "Write for a general clinical audience using standard medical terminology."
        }
    }
}

fn format_instruction(format: SummaryFormat) -> &'static str {
    match format {
        SummaryFormat::Brief => "Keep the summary brief: no more than three sentences.",
        SummaryFormat::Standard => "Keep the summary to a single concise paragraph.",
        SummaryFormat::Detailed => {
            "Provide a detailed summary covering history, findings, assessment and plan \
             in full sentences."
        }
        SummaryFormat::Bullets => {
            "Present the summary as short bullet points, one fact per bullet, each \
             ending with a full stop."
        }
    }
}

/// Build the full prompt for one note.
pub fn build_prompt(
    raw_text: &str,
    role: ClinicalRole,
    format: SummaryFormat,
    highlight_critical: bool,
) -> String {
    let mut prompt = String::from(
        "You are a medical summarization assistant. Provide a concise summary of the \
         following medical text.\n",
    );
    prompt.push_str(role_instruction(role));
    prompt.push('\n');
    prompt.push_str(format_instruction(format));
    prompt.push('\n');

    if highlight_critical {
        prompt.push_str(&format!(
            "\nRespond with exactly these sections:\n\
             {SUMMARY_HEADING} the summary.\n\
             {FINDINGS_HEADING} each clinically urgent finding on its own line starting \
             with \"- \", or \"None\" if there are none.\n\
             {MAPPING_HEADING} one line per summary sentence in the form \"S<n>: P<a>, P<b>\", \
             where S<n> is the n-th sentence of the summary and P<a> are the numbered \
             passages of the note it is based on.\n\
             \nThe note passages are numbered [P1], [P2], ...\n\
             \nMedical text:\n"
        ));
        for (i, paragraph) in paragraphs(raw_text).iter().enumerate() {
            prompt.push_str(&format!("[P{}] {}\n", i + 1, paragraph));
        }
    } else {
        prompt.push_str(&format!(
            "\nStart your answer with \"{SUMMARY_HEADING}\" followed by the summary and \
             nothing else.\n\
             \nMedical text:\n"
        ));
        prompt.push_str(raw_text);
        prompt.push('\n');
    }

    prompt
}
