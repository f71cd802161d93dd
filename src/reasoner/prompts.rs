//! Prompt builders
//!
//! Each builder takes every value it interpolates as an argument; there is no
//! shared template state.

use crate::io::submission::IdentityForm;

/// Field-matching prompt for the document analyzer
pub fn ocr_prompt(form: &IdentityForm) -> String {
    format!(
        r#"You are a document verification specialist. You receive a photograph of an identity document and four values typed by the applicant. Use the typed values as anchors: search the document for each of them and judge whether it is present. Do not transcribe everything on the card.

The image must show an identity document. If it does not, stop and put exactly "no id card recognized" in the message field.

Typed values:
- full_name: {full_name}
- dob: {dob}
- nationality: {nationality}
- id_number: {id_number}

Matching rules:
1. full_name: fuzzy match. Tolerate small typos, transliteration and script differences (for example Arabic and Latin renderings of the same name).
2. dob: the card may use another date layout (MM/DD/YYYY, DD/MM/YYYY, YYYY-MM-DD, two-digit years). Compare the dates, not the strings.
3. nationality: it may appear as text, a country name, an emblem or a title. Adjective and noun forms are equivalent ("Algerian" and "Algeria"). If nothing on the card identifies a nationality, report "not found", leave it out of the score and do not mention it in the message.
4. id_number: ignore spaces when reading the number. If no number is visible, say so in founded_value; this alone is not a failure.

Answer with this JSON object and nothing else:

{{
  "status": "success | fail | flag for review",
  "Similarity Score": <0-100>,
  "detailed_result": {{
    "full_name": {{ "form_value": "{full_name}", "founded_value": "<value>", "match": true | false }},
    "dob": {{ "form_value": "{dob}", "founded_value": "<value>", "match": true | false }},
    "nationality": {{ "form_value": "{nationality}", "founded_value": "<value> | not found", "match": true | false }},
    "id_number": {{ "form_value": "{id_number}", "founded_value": "<value>", "match": true | false }}
  }},
  "message": "<short note when something did not match>"
}}"#,
        full_name = form.full_name,
        dob = form.date_of_birth,
        nationality = form.nationality,
        id_number = form.id_number,
    )
}

/// Tamper-analysis prompt for the metadata analyzer
///
/// # Arguments
///
/// * `metadata_json` - Every readable EXIF field, pretty-printed
/// * `missing_required` - Required tags that are absent
/// * `editing_software` - Editor recognized in the `Software` tag, if any
pub fn tampering_prompt(
    metadata_json: &str,
    missing_required: &[String],
    editing_software: Option<&str>,
) -> String {
    let missing = if missing_required.is_empty() {
        "none".to_string()
    } else {
        missing_required.join(", ")
    };
    let editor = editing_software.unwrap_or("none detected");

    format!(
        r#"You are a digital forensics examiner reviewing the EXIF metadata of a photographed identity document. Look for signs that the file was edited or assembled.

Check:
1. Software: editing tools such as Photoshop, GIMP or Snapseed.
2. Compression and resolution values that suggest the file was re-saved.
3. Make and Model: present and mutually consistent.
4. ImageUniqueID and ExifVersion: present as in an untouched camera file.
5. GPS data, when present: internally consistent.
6. Gaps: key fields missing in a way that suggests stripping.

If a required field is missing, the analysis fails.

Pre-computed findings:
- Missing required fields: {missing}
- Editing software: {editor}

Answer with this JSON object and nothing else:

{{
  "status": "success" or "fail",
  "message": "<explanation of the findings>"
}}

Metadata:
{metadata_json}"#
    )
}

/// Final judgment prompt
///
/// `summary` lists each analyzer's name, priority, status and message.
pub fn decision_prompt(summary: &str) -> String {
    format!(
        r#"You decide the outcome of an identity verification. Several checks ran on the submission; each reports a status and optionally a message.

Rules:
1. Base the decision only on each check's status and message.
2. Checks are listed from highest to lowest priority: OCR, Metadata, ImageArtifact, Forensics.
3. OCR dominates when it produced a result. A check with status "error" did not run; rely on the others.
4. Answer with this JSON object and nothing else:

{{
  "decision": "accept" | "deny" | "flag for review",
  "reason": "<brief, data-driven explanation>"
}}

Checks:
{summary}"#
    )
}
