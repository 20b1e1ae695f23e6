//! Structural document chunking
//!
//! Documents are split at structural boundaries so each chunk holds one
//! topic: second-level `## ` headers first, bullet items when a document has
//! no headers, and the whole document otherwise. Text before the first
//! header (usually the `# Title` line) is treated as a preamble and
//! prefixed to every section, so a chunk still names its document.
//!
//! Sections longer than the size limit are split greedily at paragraph
//! breaks; a single paragraph still over the limit is hard-split on
//! character boundaries. Every piece of a split section repeats the preamble
//! and the section header. A chunk's offset is the byte position in the
//! source document where its own text (everything after that prefix) starts.

use super::chunk::Chunk;

pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1200;

/// Which structural boundary a document was split on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingStrategy {
    Headers,
    Bullets,
    Whole,
}

#[derive(Debug, Clone, Copy)]
pub struct StructuralChunker {
    max_chars: usize,
}

impl Default for StructuralChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_CHARS)
    }
}

/// A section as slices of the source document
struct Section<'a> {
    /// Header line, empty for bullet and whole-document sections
    header: &'a str,
    header_offset: usize,
    body: &'a str,
    body_offset: usize,
}

impl<'a> Section<'a> {
    fn from_range(doc: &'a str, start: usize, end: usize, has_header: bool) -> Self {
        let raw = &doc[start..end];
        let (header, header_offset, rest, rest_offset) = if has_header {
            let line_end = raw.find('\n').unwrap_or(raw.len());
            let line = &raw[..line_end];
            let lead = line.len() - line.trim_start().len();
            (line.trim(), start + lead, &raw[line_end..], start + line_end)
        } else {
            ("", start, raw, start)
        };
        let lead = rest.len() - rest.trim_start().len();
        Self {
            header,
            header_offset,
            body: rest.trim(),
            body_offset: rest_offset + lead,
        }
    }

    fn is_empty(&self) -> bool {
        self.header.is_empty() && self.body.is_empty()
    }
}

/// One chunk before indexing
struct Piece {
    offset: usize,
    text: String,
}

impl StructuralChunker {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Pick the boundary the document will be split on
    pub fn strategy_for(text: &str) -> ChunkingStrategy {
        if text.lines().any(is_section_header) {
            ChunkingStrategy::Headers
        } else if text.lines().any(is_bullet) {
            ChunkingStrategy::Bullets
        } else {
            ChunkingStrategy::Whole
        }
    }

    /// Split one document into chunks with ids `<source>::chunk0..N`.
    ///
    /// Blank documents produce no chunks.
    pub fn chunk(&self, source: &str, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let (preamble, sections) = match Self::strategy_for(text) {
            ChunkingStrategy::Headers => split_on(text, is_section_header, true),
            ChunkingStrategy::Bullets => split_on(text, is_bullet, false),
            ChunkingStrategy::Whole => {
                let whole = Section::from_range(text, 0, text.len(), false);
                ("", vec![whole])
            }
        };

        sections
            .iter()
            .filter(|s| !s.is_empty())
            .flat_map(|s| self.pieces(preamble, s))
            .enumerate()
            .map(|(idx, p)| Chunk::new(source, idx, p.text, p.offset))
            .collect()
    }

    fn pieces(&self, preamble: &str, section: &Section<'_>) -> Vec<Piece> {
        let whole = compose(&[preamble, section.header, section.body]);
        if whole.chars().count() <= self.max_chars || section.body.is_empty() {
            let offset = if section.header.is_empty() {
                section.body_offset
            } else {
                section.header_offset
            };
            return vec![Piece {
                offset,
                text: whole,
            }];
        }

        let prefix = compose(&[preamble, section.header]);
        let prefix_chars = if prefix.is_empty() {
            0
        } else {
            prefix.chars().count() + 1
        };
        // a very long heading may push pieces past the limit rather than
        // starving the body
        let budget = self
            .max_chars
            .saturating_sub(prefix_chars)
            .max(self.max_chars / 2)
            .max(1);

        split_body(section.body, section.body_offset, budget)
            .into_iter()
            .map(|(offset, body)| Piece {
                offset,
                text: compose(&[&prefix, body]),
            })
            .collect()
    }
}

/// Greedy paragraph packing within `budget` characters. Returns document
/// offsets with slices of `body`.
fn split_body(body: &str, base: usize, budget: usize) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut cursor = 0;

    for paragraph in body.split("\n\n") {
        let start = cursor + (paragraph.len() - paragraph.trim_start().len());
        let end = cursor + paragraph.trim_end().len();
        cursor += paragraph.len() + 2;
        if start >= end {
            continue;
        }

        if let Some((s, e)) = current
            && body[s..end].chars().count() > budget
        {
            out.push((base + s, &body[s..e]));
            current = None;
        }

        if body[start..end].chars().count() > budget {
            out.extend(hard_split(&body[start..end], base + start, budget));
            continue;
        }

        current = Some(match current {
            Some((s, _)) => (s, end),
            None => (start, end),
        });
    }

    if let Some((s, e)) = current {
        out.push((base + s, &body[s..e]));
    }
    out
}

fn hard_split(text: &str, base: usize, budget: usize) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == budget {
            out.push((base + start, &text[start..idx]));
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push((base + start, &text[start..]));
    }
    out
}

fn compose(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_section_header(line: &str) -> bool {
    line.trim_start().starts_with("## ")
}

fn is_bullet(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("- ") || t.starts_with("* ")
}

/// Split at lines matching `boundary`. Returns the trimmed preamble (text
/// before the first boundary) and the sections.
fn split_on<'a>(
    text: &'a str,
    boundary: fn(&str) -> bool,
    has_header: bool,
) -> (&'a str, Vec<Section<'a>>) {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if boundary(line) {
            starts.push(offset);
        }
        offset += line.len();
    }

    let preamble = starts.first().map_or(text, |&first| &text[..first]).trim();
    let sections = starts
        .iter()
        .enumerate()
        .map(|(idx, &start)| {
            let end = starts.get(idx + 1).copied().unwrap_or(text.len());
            Section::from_range(text, start, end, has_header)
        })
        .collect();
    (preamble, sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "# Returns & Policy\n\
## Returns\n\
- Perishables (Produce, Seafood, Dairy): 3-7 days.\n\
- Beverages unopened: 14 days; opened: no returns.\n\
\n\
## Exceptions\n\
Damaged items can be returned at any time.\n";

    #[test]
    fn test_header_split_prefixes_title() {
        let chunks = StructuralChunker::default().chunk("product_policy", POLICY);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id.as_str(), "product_policy::chunk0");
        assert!(chunks[0].content.starts_with("# Returns & Policy\n## Returns"));
        assert!(chunks[0].content.contains("Beverages unopened: 14 days"));
        assert!(chunks[1].content.contains("## Exceptions"));
        assert!(!chunks[1].content.contains("Beverages"));
        assert_eq!(&POLICY[chunks[1].offset..chunks[1].offset + 13], "## Exceptions");
    }

    #[test]
    fn test_bullet_split_without_headers() {
        let text = "# KPI Definitions\n- AOV: revenue / orders\n- Gross Margin: revenue - cost\n";
        assert_eq!(StructuralChunker::strategy_for(text), ChunkingStrategy::Bullets);
        let chunks = StructuralChunker::default().chunk("kpi", text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.contains("AOV"));
        assert!(chunks[1].content.starts_with("# KPI Definitions\n- Gross Margin"));
    }

    #[test]
    fn test_plain_document_is_one_chunk() {
        let chunks =
            StructuralChunker::default().chunk("notes", "Just a paragraph.\nAnother line.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].offset, 0);
    }

    #[test]
    fn test_blank_document_has_no_chunks() {
        assert!(StructuralChunker::default().chunk("empty", "  \n\n").is_empty());
    }

    #[test]
    fn test_oversized_section_is_split_by_paragraph() {
        let para = "word ".repeat(10);
        let text = format!("{p}\n\n{p}\n\n{p}", p = para.trim());
        let chunks = StructuralChunker::new(60).chunk("big", &text);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 60));
        assert_eq!(chunks[2].id.as_str(), "big::chunk2");
    }

    #[test]
    fn test_split_pieces_keep_heading_and_point_at_their_text() {
        let doc = format!("# Title\n## A\n{}\n\n{}", "x".repeat(20), "y".repeat(20));
        let chunks = StructuralChunker::new(40).chunk("doc", &doc);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            let body = chunk
                .content
                .strip_prefix("# Title\n## A\n")
                .expect("heading repeated on every piece");
            assert!(!body.is_empty());
            assert!(doc[chunk.offset..].starts_with(body));
            assert!(chunk.content.chars().count() <= 40);
        }
        assert_eq!(chunks[0].offset, 13);
        assert_eq!(chunks[1].offset, 35);
    }

    #[test]
    fn test_hard_split_offsets_follow_the_document() {
        let doc = format!("# T\n## S\n{}", "z".repeat(50));
        let chunks = StructuralChunker::new(30).chunk("doc", &doc);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            let body = chunk.content.strip_prefix("# T\n## S\n").unwrap();
            assert!(doc[chunk.offset..].starts_with(body));
        }
    }

    #[test]
    fn test_single_long_paragraph_is_hard_split() {
        let text = "é".repeat(25);
        let chunks = StructuralChunker::new(10).chunk("long", &text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].content.chars().count(), 5);
    }
}
