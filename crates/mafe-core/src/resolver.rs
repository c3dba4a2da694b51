//! Intent resolution
//!
//! Maps an instruction onto a subset of the working set. Stages, first hit
//! wins:
//! 1. Broadcast phrase ("all files", "every file", ...) targets every file
//! 2. Exact, token-bounded mention of a file id or name; a name several
//!    files share needs their id or the disambiguator
//! 3. Partial-name match (file stem as a word, then word inside a name)
//! 4. Disambiguator over the remaining candidates
//!
//! Anything left ambiguous fails closed. The resolver never guesses.

use crate::capability::{Candidate, Disambiguation, DisambiguationRequest, TargetDisambiguator};
use crate::error::ResolutionError;
use crate::types::{FileId, FileRecord, Instruction, ResolutionMethod, ResolvedSet, ResolvedTask};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

static BROADCAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:all|every|each)\s+(?:of\s+)?(?:the\s+|my\s+|these\s+)?(?:files?|documents?)\b|\bвсе\s+файлы|\bвсех\s+файлах|\bкаждый\s+файл|\bкаждом\s+файле",
    )
    .expect("broadcast pattern is valid")
});

static CLAUSE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:;|\n|,\s|\.\s)\s*").expect("separator pattern is valid"));

/// Words that carry no instruction content on their own
const CONNECTORS: &[&str] = &[
    "and", "or", "also", "then", "in", "to", "for", "of", "the", "a", "an", "file", "files",
    "please", "и", "в", "файл", "файле",
];

/// Words too generic to count as a partial file-name match
const GENERIC_WORDS: &[&str] = &[
    "file", "files", "document", "documents", "text", "this", "that", "with", "from", "into",
    "please", "every", "each", "content", "contents",
];

const MIN_PARTIAL_WORD: usize = 4;

/// Per-file matching vocabulary
#[derive(Debug)]
struct Vocabulary {
    id: FileId,
    /// Lowercased display name; not unique across files
    name: String,
    /// Lowercased id and name, deduplicated
    terms: Vec<String>,
    /// Lowercased names without extension
    stems: Vec<String>,
}

impl Vocabulary {
    fn new(record: &FileRecord) -> Self {
        let mut terms = vec![record.id.as_str().to_lowercase()];
        let name = record.name.to_lowercase();
        if !name.is_empty() && !terms.contains(&name) {
            terms.push(name.clone());
        }
        let mut stems: Vec<String> = terms
            .iter()
            .filter_map(|t| t.rsplit_once('.').map(|(stem, _)| stem.to_string()))
            .filter(|s| s.chars().count() >= 2)
            .collect();
        stems.dedup();
        Self {
            id: record.id.clone(),
            name,
            terms,
            stems,
        }
    }
}

/// Resolves instructions to target files
pub struct IntentResolver {
    disambiguator: Option<Arc<dyn TargetDisambiguator>>,
    disambiguation_timeout: Duration,
}

impl IntentResolver {
    /// Create resolver without a disambiguator; unclear instructions fail closed
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            disambiguator: None,
            disambiguation_timeout: Duration::from_secs(30),
        }
    }

    /// With disambiguator for instructions that names cannot settle
    #[inline]
    #[must_use]
    pub fn with_disambiguator(mut self, disambiguator: Arc<dyn TargetDisambiguator>) -> Self {
        self.disambiguator = Some(disambiguator);
        self
    }

    /// With bound on a single disambiguation call
    #[inline]
    #[must_use]
    pub fn with_disambiguation_timeout(mut self, timeout: Duration) -> Self {
        self.disambiguation_timeout = timeout;
        self
    }

    /// Resolve `instruction` against `files` (a registry snapshot)
    ///
    /// # Errors
    /// - `ResolutionError::EmptyInstruction` for blank text
    /// - `ResolutionError::NoTargetResolved` if nothing can be targeted
    /// - `ResolutionError::AmbiguousTarget` if several files remain equally likely
    pub async fn resolve(
        &self,
        instruction: &Instruction,
        files: &[FileRecord],
    ) -> Result<ResolvedSet, ResolutionError> {
        let text = instruction.raw_text.trim();
        if text.is_empty() {
            return Err(ResolutionError::EmptyInstruction);
        }
        if files.is_empty() {
            return Err(ResolutionError::NoTargetResolved);
        }

        if is_broadcast(text) {
            tracing::debug!(files = files.len(), "broadcast instruction");
            return Ok(ResolvedSet {
                tasks: files
                    .iter()
                    .map(|f| ResolvedTask::new(f.id.clone(), text))
                    .collect(),
                broadcast: true,
                method: ResolutionMethod::Broadcast,
            });
        }

        let vocab: Vec<Vocabulary> = files.iter().map(Vocabulary::new).collect();

        let lower = text.to_lowercase();
        let mut mentioned = exact_mentions(&lower, &vocab);
        let (shadowed, unsettled) = shared_name_mentions(&lower, &vocab, &mentioned);
        mentioned.retain(|i| !shadowed.contains(i));

        if !unsettled.is_empty() {
            let subset: Vec<&FileRecord> = unsettled.iter().map(|&i| &files[i]).collect();
            let Some(picked) = self.disambiguate(text, &subset).await else {
                return Err(ResolutionError::AmbiguousTarget {
                    candidates: subset.iter().map(|f| f.id.clone()).collect(),
                });
            };
            mentioned.retain(|i| {
                !unsettled.contains(i) || picked.tasks.iter().any(|t| t.file_id == vocab[*i].id)
            });
            return Ok(ResolvedSet {
                tasks: mentioned
                    .iter()
                    .map(|&i| ResolvedTask::new(vocab[i].id.clone(), text))
                    .collect(),
                broadcast: false,
                method: ResolutionMethod::Disambiguated,
            });
        }

        if !mentioned.is_empty() {
            if mentioned.len() > 1 {
                if let Some(tasks) = segment(text, &vocab, &mentioned) {
                    tracing::debug!(tasks = tasks.len(), "segmented instruction");
                    return Ok(ResolvedSet {
                        tasks,
                        broadcast: false,
                        method: ResolutionMethod::Segmented,
                    });
                }
            }
            tracing::debug!(tasks = mentioned.len(), "exact file mentions");
            return Ok(ResolvedSet {
                tasks: mentioned
                    .iter()
                    .map(|&i| ResolvedTask::new(vocab[i].id.clone(), text))
                    .collect(),
                broadcast: false,
                method: ResolutionMethod::Exact,
            });
        }

        let (strong, weak) = partial_matches(&lower, &vocab);
        let candidates = if strong.is_empty() { weak } else { strong };

        match candidates.len() {
            1 => {
                tracing::debug!(file_id = %vocab[candidates[0]].id, "partial name match");
                Ok(ResolvedSet {
                    tasks: vec![ResolvedTask::new(vocab[candidates[0]].id.clone(), text)],
                    broadcast: false,
                    method: ResolutionMethod::Fuzzy,
                })
            }
            0 => {
                let everyone: Vec<&FileRecord> = files.iter().collect();
                self.disambiguate(text, &everyone)
                    .await
                    .ok_or(ResolutionError::NoTargetResolved)
            }
            _ => {
                let subset: Vec<&FileRecord> = candidates.iter().map(|&i| &files[i]).collect();
                self.disambiguate(text, &subset).await.ok_or_else(|| {
                    ResolutionError::AmbiguousTarget {
                        candidates: subset.iter().map(|f| f.id.clone()).collect(),
                    }
                })
            }
        }
    }

    /// Ask the disambiguator; `None` on any answer that is not a clean subset
    async fn disambiguate(&self, text: &str, candidates: &[&FileRecord]) -> Option<ResolvedSet> {
        let disambiguator = self.disambiguator.as_ref()?;
        let request = DisambiguationRequest {
            instruction: text.to_string(),
            candidates: candidates.iter().map(|f| Candidate::from(*f)).collect(),
        };

        let answer =
            match tokio::time::timeout(self.disambiguation_timeout, disambiguator.disambiguate(request))
                .await
            {
                Ok(Ok(answer)) => answer,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "disambiguation failed");
                    return None;
                }
                Err(_) => {
                    tracing::warn!("disambiguation timed out");
                    return None;
                }
            };

        let selected = match answer {
            Disambiguation::Selected(ids) if !ids.is_empty() => ids,
            _ => {
                tracing::debug!("disambiguator could not determine a target");
                return None;
            }
        };

        if let Some(stray) = selected
            .iter()
            .find(|id| !candidates.iter().any(|f| &f.id == *id))
        {
            tracing::warn!(file_id = %stray, "disambiguator picked a file outside the candidates");
            return None;
        }

        Some(ResolvedSet {
            tasks: candidates
                .iter()
                .filter(|f| selected.contains(&f.id))
                .map(|f| ResolvedTask::new(f.id.clone(), text))
                .collect(),
            broadcast: false,
            method: ResolutionMethod::Disambiguated,
        })
    }
}

impl Default for IntentResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IntentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentResolver")
            .field("disambiguator", &self.disambiguator.is_some())
            .field("disambiguation_timeout", &self.disambiguation_timeout)
            .finish()
    }
}

/// Whether the instruction explicitly addresses every file
#[must_use]
pub fn is_broadcast(text: &str) -> bool {
    BROADCAST.is_match(text)
}

/// Vocabulary indices mentioned in `lower`, ordered by first mention
fn exact_mentions(lower: &str, vocab: &[Vocabulary]) -> Vec<usize> {
    let mut hits: Vec<(usize, usize)> = vocab
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            v.terms
                .iter()
                .filter_map(|term| find_bounded(lower, term))
                .min()
                .map(|pos| (pos, i))
        })
        .collect();
    hits.sort_unstable();
    hits.into_iter().map(|(_, i)| i).collect()
}

/// Mentions that only matched a display name another mentioned file shares
///
/// Returns `(shadowed, unsettled)`. In a group sharing a name, files whose
/// own id is mentioned win and the rest are shadowed. A group where no id is
/// mentioned is unsettled.
fn shared_name_mentions(
    lower: &str,
    vocab: &[Vocabulary],
    mentioned: &[usize],
) -> (Vec<usize>, Vec<usize>) {
    let by_id: Vec<bool> = mentioned
        .iter()
        .map(|&i| find_bounded(lower, &vocab[i].terms[0]).is_some())
        .collect();

    let mut shadowed = Vec::new();
    let mut unsettled = Vec::new();
    for (k, &i) in mentioned.iter().enumerate() {
        if by_id[k] {
            continue;
        }
        let peers: Vec<usize> = (0..mentioned.len())
            .filter(|&m| m != k && vocab[mentioned[m]].name == vocab[i].name)
            .collect();
        if peers.is_empty() {
            continue;
        }
        if peers.iter().any(|&m| by_id[m]) {
            shadowed.push(i);
        } else {
            unsettled.push(i);
        }
    }
    (shadowed, unsettled)
}

/// Stem hits and partial-word hits, each in registry order
fn partial_matches(lower: &str, vocab: &[Vocabulary]) -> (Vec<usize>, Vec<usize>) {
    let strong: Vec<usize> = vocab
        .iter()
        .enumerate()
        .filter(|(_, v)| v.stems.iter().any(|s| find_bounded(lower, s).is_some()))
        .map(|(i, _)| i)
        .collect();

    let words: Vec<&str> = words(lower)
        .filter(|w| w.chars().count() >= MIN_PARTIAL_WORD && !GENERIC_WORDS.contains(w))
        .collect();
    let weak: Vec<usize> = vocab
        .iter()
        .enumerate()
        .filter(|(_, v)| {
            v.terms
                .iter()
                .any(|term| words.iter().any(|w| term.contains(w)))
        })
        .map(|(i, _)| i)
        .collect();

    (strong, weak)
}

/// Split into per-file directives, or `None` if the instruction does not
/// cleanly separate into one clause group per file
fn segment(text: &str, vocab: &[Vocabulary], mentioned: &[usize]) -> Option<Vec<ResolvedTask>> {
    let clauses: Vec<&str> = CLAUSE_SEPARATOR
        .split(text)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    if clauses.len() < 2 {
        return None;
    }

    let mut owners: Vec<Option<usize>> = Vec::with_capacity(clauses.len());
    for clause in &clauses {
        let lower = clause.to_lowercase();
        let hits = exact_mentions(&lower, vocab);
        match hits.as_slice() {
            [] => owners.push(None),
            [only] => {
                if !has_instruction_words(&lower, &vocab[*only]) {
                    return None;
                }
                owners.push(Some(*only));
            }
            _ => return None,
        }
    }

    let distinct: BTreeSet<usize> = owners.iter().flatten().copied().collect();
    if distinct.len() < 2 || mentioned.iter().any(|i| !distinct.contains(i)) {
        return None;
    }

    Some(
        mentioned
            .iter()
            .map(|&file| {
                let directive = clauses
                    .iter()
                    .zip(&owners)
                    .filter(|(_, owner)| owner.map_or(true, |o| o == file))
                    .map(|(clause, _)| clause.trim_end_matches('.'))
                    .collect::<Vec<_>>()
                    .join("; ");
                ResolvedTask::new(vocab[file].id.clone(), directive)
            })
            .collect(),
    )
}

/// Whether a clause says something beyond naming its file
fn has_instruction_words(lower_clause: &str, file: &Vocabulary) -> bool {
    lower_clause
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|w| !w.is_empty())
        .any(|w| {
            !CONNECTORS.contains(&w)
                && !file
                    .terms
                    .iter()
                    .any(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '_') == w)
        })
}

fn words(lower: &str) -> impl Iterator<Item = &str> {
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Byte offset of the first occurrence of `term` not embedded in a longer name
fn find_bounded(haystack: &str, term: &str) -> Option<usize> {
    if term.is_empty() {
        return None;
    }
    haystack.match_indices(term).map(|(pos, _)| pos).find(|&pos| {
        let before = haystack[..pos].chars().next_back();
        let mut after = haystack[pos + term.len()..].chars();
        let before_ok = before.map_or(true, |c| !is_name_char(c) && c != '.');
        let after_ok = match after.next() {
            None => true,
            // "file_1." at the end of a sentence, but not "file_1.txt"
            Some('.') => after.next().map_or(true, |c| !is_name_char(c)),
            Some(c) => !is_name_char(c),
        };
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct FixedAnswer(Result<Disambiguation, CapabilityError>);

    #[async_trait]
    impl TargetDisambiguator for FixedAnswer {
        async fn disambiguate(
            &self,
            _request: DisambiguationRequest,
        ) -> Result<Disambiguation, CapabilityError> {
            self.0.clone()
        }
    }

    fn files(names: &[&str]) -> Vec<FileRecord> {
        names
            .iter()
            .map(|n| FileRecord::new(FileId::from(*n), *n, "content"))
            .collect()
    }

    fn ids(set: &ResolvedSet) -> Vec<&str> {
        set.tasks.iter().map(|t| t.file_id.as_str()).collect()
    }

    async fn resolve(text: &str, names: &[&str]) -> Result<ResolvedSet, ResolutionError> {
        IntentResolver::new()
            .resolve(&Instruction::new(text), &files(names))
            .await
    }

    #[tokio::test]
    async fn exact_mention_passes_instruction_through() {
        let set = resolve("add a period to file_1", &["file_1", "file_2"]).await.unwrap();
        assert_eq!(ids(&set), vec!["file_1"]);
        assert_eq!(set.tasks[0].directive, "add a period to file_1");
        assert_eq!(set.method, ResolutionMethod::Exact);
        assert!(!set.broadcast);
    }

    #[tokio::test]
    async fn mention_does_not_match_inside_longer_name() {
        let set = resolve("shorten file_10.", &["file_1", "file_10"]).await.unwrap();
        assert_eq!(ids(&set), vec!["file_10"]);
    }

    #[tokio::test]
    async fn name_with_extension_is_not_matched_by_bare_id_prefix() {
        let set = resolve("fix notes.md.bak", &["notes.md", "notes.md.bak"]).await.unwrap();
        assert_eq!(ids(&set), vec!["notes.md.bak"]);
    }

    #[tokio::test]
    async fn mentions_follow_instruction_order() {
        let set = resolve("compare b.txt against a.txt and fix both", &["a.txt", "b.txt"])
            .await
            .unwrap();
        assert_eq!(ids(&set), vec!["b.txt", "a.txt"]);
        assert_eq!(set.method, ResolutionMethod::Exact);
    }

    #[tokio::test]
    async fn broadcast_targets_every_file_in_registry_order() {
        let set = resolve("translate all files to French", &["file_1", "file_2"]).await.unwrap();
        assert!(set.broadcast);
        assert_eq!(set.method, ResolutionMethod::Broadcast);
        assert_eq!(ids(&set), vec!["file_1", "file_2"]);
    }

    #[test]
    fn broadcast_phrases() {
        assert!(is_broadcast("Fix typos in every file"));
        assert!(is_broadcast("add a header to each of the files"));
        assert!(is_broadcast("переведи все файлы на английский"));
        assert!(!is_broadcast("fix the file called all.txt"));
        assert!(!is_broadcast("add allfiles support"));
    }

    #[tokio::test]
    async fn per_file_clauses_become_separate_directives() {
        let set = resolve(
            "rename variable x in main.py, fix typo in README.md",
            &["README.md", "main.py"],
        )
        .await
        .unwrap();
        assert_eq!(set.method, ResolutionMethod::Segmented);
        assert_eq!(ids(&set), vec!["main.py", "README.md"]);
        assert_eq!(set.tasks[0].directive, "rename variable x in main.py");
        assert_eq!(set.tasks[1].directive, "fix typo in README.md");
    }

    #[tokio::test]
    async fn shared_clauses_are_attached_to_every_segment() {
        let set = resolve(
            "Keep the tone formal; shorten a.txt; expand b.txt",
            &["a.txt", "b.txt"],
        )
        .await
        .unwrap();
        assert_eq!(set.tasks[0].directive, "Keep the tone formal; shorten a.txt");
        assert_eq!(set.tasks[1].directive, "Keep the tone formal; expand b.txt");
    }

    #[tokio::test]
    async fn name_lists_are_not_segmented() {
        let set = resolve("fix typos in a.txt, b.txt", &["a.txt", "b.txt"]).await.unwrap();
        assert_eq!(set.method, ResolutionMethod::Exact);
        assert!(set.tasks.iter().all(|t| t.directive == "fix typos in a.txt, b.txt"));
    }

    #[tokio::test]
    async fn stem_match_resolves_single_file() {
        let set = resolve("fix the typo in the readme", &["README.md", "main.py"]).await.unwrap();
        assert_eq!(ids(&set), vec!["README.md"]);
        assert_eq!(set.method, ResolutionMethod::Fuzzy);
    }

    #[tokio::test]
    async fn equally_likely_partials_fail_closed() {
        let err = resolve("tidy up the notes", &["notes_a.md", "notes_b.md", "main.py"])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::AmbiguousTarget {
                candidates: vec![FileId::from("notes_a.md"), FileId::from("notes_b.md")],
            }
        );
    }

    #[tokio::test]
    async fn no_mention_without_disambiguator_is_no_target() {
        let err = resolve("make it sound friendlier", &["file_1", "file_2"]).await.unwrap_err();
        assert_eq!(err, ResolutionError::NoTargetResolved);
    }

    #[tokio::test]
    async fn blank_instruction_is_rejected() {
        let err = resolve("   ", &["file_1"]).await.unwrap_err();
        assert_eq!(err, ResolutionError::EmptyInstruction);
    }

    #[tokio::test]
    async fn disambiguator_settles_ambiguity() {
        let resolver = IntentResolver::new().with_disambiguator(Arc::new(FixedAnswer(Ok(
            Disambiguation::Selected(vec![FileId::from("notes_b.md")]),
        ))));
        let set = resolver
            .resolve(&Instruction::new("tidy up the notes"), &files(&["notes_a.md", "notes_b.md"]))
            .await
            .unwrap();
        assert_eq!(ids(&set), vec!["notes_b.md"]);
        assert_eq!(set.method, ResolutionMethod::Disambiguated);
    }

    #[tokio::test]
    async fn disambiguator_answer_outside_candidates_is_rejected() {
        let resolver = IntentResolver::new().with_disambiguator(Arc::new(FixedAnswer(Ok(
            Disambiguation::Selected(vec![FileId::from("main.py")]),
        ))));
        let err = resolver
            .resolve(
                &Instruction::new("tidy up the notes"),
                &files(&["notes_a.md", "notes_b.md", "main.py"]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::AmbiguousTarget { .. }));
    }

    #[tokio::test]
    async fn disambiguator_failure_fails_closed() {
        let resolver = IntentResolver::new().with_disambiguator(Arc::new(FixedAnswer(Err(
            CapabilityError::Unavailable("down".into()),
        ))));
        let err = resolver
            .resolve(&Instruction::new("make it friendlier"), &files(&["file_1", "file_2"]))
            .await
            .unwrap_err();
        assert_eq!(err, ResolutionError::NoTargetResolved);
    }

    #[tokio::test]
    async fn undetermined_answer_is_no_target() {
        let resolver = IntentResolver::new()
            .with_disambiguator(Arc::new(FixedAnswer(Ok(Disambiguation::Undetermined))));
        let err = resolver
            .resolve(&Instruction::new("make it friendlier"), &files(&["file_1"]))
            .await
            .unwrap_err();
        assert_eq!(err, ResolutionError::NoTargetResolved);
    }

    fn same_name(ids: &[&str], name: &str) -> Vec<FileRecord> {
        ids.iter()
            .map(|id| FileRecord::new(FileId::from(*id), name, "content"))
            .collect()
    }

    #[tokio::test]
    async fn shared_display_name_fails_closed() {
        let err = IntentResolver::new()
            .resolve(
                &Instruction::new("fix typos in notes.md"),
                &same_name(&["u1/notes.md", "u2/notes.md"], "notes.md"),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::AmbiguousTarget {
                candidates: vec![FileId::from("u1/notes.md"), FileId::from("u2/notes.md")],
            }
        );
    }

    #[tokio::test]
    async fn shared_display_name_goes_to_disambiguator() {
        let resolver = IntentResolver::new().with_disambiguator(Arc::new(FixedAnswer(Ok(
            Disambiguation::Selected(vec![FileId::from("u2/notes.md")]),
        ))));
        let mut records = same_name(&["u1/notes.md", "u2/notes.md"], "notes.md");
        records.push(FileRecord::new(FileId::from("main.py"), "main.py", "content"));

        let set = resolver
            .resolve(&Instruction::new("sync notes.md with main.py"), &records)
            .await
            .unwrap();

        assert_eq!(ids(&set), vec!["u2/notes.md", "main.py"]);
        assert_eq!(set.method, ResolutionMethod::Disambiguated);
    }

    #[tokio::test]
    async fn mentioned_id_wins_over_shared_name() {
        let set = IntentResolver::new()
            .resolve(
                &Instruction::new("fix typos in u2/notes.md"),
                &same_name(&["u1/notes.md", "u2/notes.md"], "notes.md"),
            )
            .await
            .unwrap();
        assert_eq!(ids(&set), vec!["u2/notes.md"]);
        assert_eq!(set.method, ResolutionMethod::Exact);
    }

    #[test]
    fn bounded_search_handles_sentence_punctuation() {
        assert_eq!(find_bounded("edit file_1.", "file_1"), Some(5));
        assert_eq!(find_bounded("edit (file_1)", "file_1"), Some(6));
        assert_eq!(find_bounded("edit file_1.txt", "file_1"), None);
        assert_eq!(find_bounded("edit my_file_1", "file_1"), None);
    }
}
