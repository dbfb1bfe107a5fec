//! Turning scored candidates into citations and grounding text

use crate::domain::knowledge::{KnowledgeChunk, RetrievedChunk, Source, SourceType};
use crate::domain::query::SupplementaryDocument;

/// Grounding context used when no passage cleared the threshold
pub const NO_RELEVANT_CONTEXT: &str = "NO RELEVANT PASSAGES FOUND";

/// Similarity assigned to a caller-attached document so it always ranks first
pub const SUPPLEMENTARY_SIMILARITY: f32 = 1.0;

/// Ordered citations plus the text the answer must be grounded in
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub sources: Vec<Source>,
    pub grounding_context: String,
    /// Number of candidates before de-duplication
    pub candidate_count: usize,
    /// Whether the widened fallback threshold produced the candidates
    pub fallback_used: bool,
}

impl RetrievalOutcome {
    /// True when nothing relevant was found
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Synthesize a candidate from a caller-attached document
pub fn supplementary_chunk(document: &SupplementaryDocument) -> RetrievedChunk {
    let chunk = KnowledgeChunk::new(
        format!("supplementary:{}", document.name),
        document.content.clone(),
        SourceType::AdHoc,
        document.name.clone(),
    );

    RetrievedChunk::new(chunk, SUPPLEMENTARY_SIMILARITY)
}

/// Candidates that collapsed into one citation
#[derive(Debug)]
struct SourceGroup {
    chunk: KnowledgeChunk,
    contents: Vec<String>,
    similarity: f32,
}

impl SourceGroup {
    fn pinned(&self) -> bool {
        self.chunk.source_type == SourceType::AdHoc
    }

    fn matches(&self, chunk: &KnowledgeChunk) -> bool {
        // Attached documents never merge with corpus passages
        (self.chunk.source_type == SourceType::AdHoc) == (chunk.source_type == SourceType::AdHoc)
            && self.chunk.source_title == chunk.source_title
            && self.chunk.source_section == chunk.source_section
    }
}

/// De-duplicate, rank and number candidates
///
/// Candidates sharing (title, section) collapse into one source keeping the
/// highest similarity and all content. Attached documents rank first, then
/// descending similarity; ties keep first-seen order.
pub fn assemble(candidates: Vec<RetrievedChunk>, max_chars_per_chunk: usize) -> RetrievalOutcome {
    let candidate_count = candidates.len();
    let mut groups: Vec<SourceGroup> = Vec::new();

    for candidate in candidates {
        let similarity = candidate.similarity();
        let chunk = candidate.into_chunk();

        match groups.iter_mut().find(|g| g.matches(&chunk)) {
            Some(group) => {
                group.similarity = group.similarity.max(similarity);
                group.contents.push(chunk.content);
            }
            None => groups.push(SourceGroup {
                contents: vec![chunk.content.clone()],
                chunk,
                similarity,
            }),
        }
    }

    groups.sort_by(|a, b| {
        b.pinned()
            .cmp(&a.pinned())
            .then_with(|| b.similarity.total_cmp(&a.similarity))
    });

    let sources: Vec<Source> = groups
        .iter()
        .enumerate()
        .map(|(idx, group)| Source::from_chunk(&group.chunk, idx + 1))
        .collect();

    let grounding_context = if groups.is_empty() {
        NO_RELEVANT_CONTEXT.to_string()
    } else {
        sources
            .iter()
            .zip(groups.iter())
            .map(|(source, group)| grounding_block(source, &group.contents, max_chars_per_chunk))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    RetrievalOutcome {
        sources,
        grounding_context,
        candidate_count,
        fallback_used: false,
    }
}

fn grounding_block(source: &Source, contents: &[String], max_chars: usize) -> String {
    let header = match &source.section {
        Some(section) => format!("[{}] {} (section {})", source.ordinal, source.title, section),
        None => format!("[{}] {}", source.ordinal, source.title),
    };

    let body = contents
        .iter()
        .map(|content| truncate_chars(content.trim(), max_chars))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{}\n{}", header, body)
}

/// Cut text to at most `max_chars` characters, marking the cut with an ellipsis
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}…", &text[..byte_idx]),
        None => text.to_string(),
    }
}
