//! Prompt construction and reply parsing

use mafe_core::{
    strip_code_fence, CapabilityError, Candidate, Disambiguation, DisambiguationRequest, FileId,
    TransformRequest,
};
use std::fmt::Write as _;

/// Replies meaning "no file"
const NO_TARGET: &[&str] = &["NONE", "DONE"];

/// Prompt asking the model to rewrite one file
#[must_use]
pub fn transform_prompt(request: &TransformRequest) -> String {
    let mut prompt = format!(
        "You are a file agent responsible for editing the file '{}'.\n\n\
         Current content of the file:\n```\n{}\n```\n\n",
        request.file_name, request.content
    );

    if !request.history.is_empty() {
        prompt.push_str("Earlier edits to this file, oldest first:\n");
        for entry in &request.history {
            let _ = writeln!(prompt, "- v{}: {}", entry.version, entry.directive);
        }
        prompt.push('\n');
    }

    let _ = write!(
        prompt,
        "Instruction: {}\n\n\
         Apply the instruction and return ONLY the complete updated file content, \
         without any commentary.",
        request.directive
    );
    prompt
}

/// Prompt asking the model which files an instruction targets
#[must_use]
pub fn disambiguation_prompt(request: &DisambiguationRequest) -> String {
    let mut prompt = format!(
        "You route instructions to file agents in a multi-file editor.\n\n\
         User instruction: {}\n\nAvailable files:\n",
        request.instruction
    );
    for candidate in &request.candidates {
        if candidate.name == candidate.id.as_str() {
            let _ = writeln!(prompt, "- {}", candidate.id);
        } else {
            let _ = writeln!(prompt, "- {} ({})", candidate.id, candidate.name);
        }
    }
    prompt.push_str(
        "\nReply with the ids of the files the instruction applies to, one per line. \
         If no file clearly matches, reply with NONE. Reply with nothing else.",
    );
    prompt
}

/// Interpret a disambiguation reply against the offered candidates
///
/// Ids and names are both accepted, case-insensitively. Anything that is
/// neither a candidate nor a "no file" marker makes the reply malformed.
pub fn parse_selection(
    reply: &str,
    candidates: &[Candidate],
) -> Result<Disambiguation, CapabilityError> {
    let body = strip_code_fence(reply).trim();
    if body.is_empty() {
        return Err(CapabilityError::Malformed("empty selection".to_string()));
    }
    if NO_TARGET.iter().any(|m| body.eq_ignore_ascii_case(m)) {
        return Ok(Disambiguation::Undetermined);
    }

    let mut selected: Vec<FileId> = Vec::new();
    for token in body
        .split(|c| c == '\n' || c == ',')
        .map(|t| t.trim().trim_start_matches(['-', '*']).trim())
        .map(|t| t.trim_matches(|c| c == '"' || c == '\'' || c == '`'))
        .filter(|t| !t.is_empty())
    {
        let Some(found) = candidates.iter().find(|c| {
            c.id.as_str().eq_ignore_ascii_case(token) || c.name.eq_ignore_ascii_case(token)
        }) else {
            return Err(CapabilityError::Malformed(format!(
                "unknown file in selection: {token}"
            )));
        };
        if !selected.contains(&found.id) {
            selected.push(found.id.clone());
        }
    }

    Ok(Disambiguation::Selected(selected))
}
