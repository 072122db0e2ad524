//! Text Chunking Module
//!
//! Character splitter used for every source: text is split on a separator
//! (newline by default) and the pieces are greedily packed into chunks of at
//! most `chunk_size` characters, with trailing pieces carried over as overlap.

use std::collections::VecDeque;

// ============================================================================
// Chunk Configuration
// ============================================================================

/// Chunking settings (lengths in chars)
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separator: String,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separator: "\n".to_string(),
        }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Default::default()
        }
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// Text chunking strategy
pub trait Chunker: Send + Sync {
    /// Split text into chunks
    fn chunk(&self, text: &str) -> Vec<String>;

    fn name(&self) -> &'static str;
}

// ============================================================================
// CharacterChunker
// ============================================================================

/// Separator-based character splitter
///
/// - pieces are joined with the separator while the chunk stays within `chunk_size`
/// - when a chunk is emitted, trailing pieces totalling at most `chunk_overlap`
///   start the next chunk
/// - a single piece longer than `chunk_size` becomes its own (oversized) chunk
pub struct CharacterChunker {
    config: ChunkConfig,
}

impl CharacterChunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    fn split_pieces<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if self.config.separator.is_empty() {
            return vec![text];
        }
        text.split(self.config.separator.as_str())
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Join pieces and push the trimmed result if non-empty
    fn emit(&self, pieces: &VecDeque<&str>, out: &mut Vec<String>) {
        let joined = pieces
            .iter()
            .copied()
            .collect::<Vec<_>>()
            .join(&self.config.separator);
        let trimmed = joined.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let sep_len = self.config.separator.chars().count();
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = piece.chars().count();
            let joiner = if current.is_empty() { 0 } else { sep_len };

            if total + len + joiner > size {
                if total > size {
                    tracing::debug!("Created a chunk of size {}, larger than {}", total, size);
                }

                if !current.is_empty() {
                    self.emit(&current, &mut chunks);

                    // Drop leading pieces until what remains fits as overlap
                    // and leaves room for the incoming piece
                    while total > overlap
                        || (total > 0
                            && total + len + if current.is_empty() { 0 } else { sep_len } > size)
                    {
                        let Some(first) = current.pop_front() else {
                            break;
                        };
                        let first_len = first.chars().count();
                        let removed_sep = if current.is_empty() { 0 } else { sep_len };
                        total = total.saturating_sub(first_len + removed_sep);
                    }
                }
            }

            let joiner = if current.is_empty() { 0 } else { sep_len };
            current.push_back(piece);
            total += len + joiner;
        }

        if !current.is_empty() {
            self.emit(&current, &mut chunks);
        }

        chunks
    }
}

impl Chunker for CharacterChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![];
        }

        let pieces = self.split_pieces(text);
        self.merge_pieces(&pieces)
    }

    fn name(&self) -> &'static str {
        "CharacterChunker"
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(CharacterChunker::with_defaults())
}

pub fn character_chunker(config: ChunkConfig) -> Box<dyn Chunker> {
    Box::new(CharacterChunker::new(config))
}

/// Chunk every non-blank text and flatten the result
pub fn chunk_texts(chunker: &dyn Chunker, texts: &[String]) -> Vec<String> {
    texts
        .iter()
        .filter(|t| !t.trim().is_empty())
        .flat_map(|t| chunker.chunk(t))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> CharacterChunker {
        CharacterChunker::new(ChunkConfig::new(size, overlap))
    }

    #[test]
    fn test_chunker_empty() {
        assert!(CharacterChunker::with_defaults().chunk("").is_empty());
        assert!(CharacterChunker::with_defaults().chunk(" \n \n").is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let text = "Title: The Indian Penal Code\nAct Year: 1860";
        let chunks = CharacterChunker::with_defaults().chunk(text);
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_packs_lines_without_overlap() {
        let text = "aaaa\nbbbb\ncccc\ndddd";
        let chunks = chunker(9, 0).chunk(text);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc\ndddd"]);
    }

    #[test]
    fn test_overlap_carries_trailing_pieces() {
        let text = "aaaa\nbbbb\ncccc\ndddd";
        let chunks = chunker(9, 4).chunk(text);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "bbbb\ncccc", "cccc\ndddd"]);
    }

    #[test]
    fn test_oversized_piece_kept_whole() {
        let long = "x".repeat(30);
        let text = format!("ab\n{}\ncd", long);
        let chunks = chunker(10, 0).chunk(&text);
        assert_eq!(chunks, vec!["ab".to_string(), long, "cd".to_string()]);
    }

    #[test]
    fn test_empty_lines_dropped() {
        let chunks = chunker(100, 0).chunk("a\n\n\nb");
        assert_eq!(chunks, vec!["a\nb"]);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // 4 chars each, 12 bytes each
        let text = "धारा\nधारा";
        let chunks = chunker(9, 0).chunk(text);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_chunks_respect_size() {
        let text: String = (0..200)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunker(100, 20).chunk(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
    }

    #[test]
    fn test_chunk_texts_skips_blank() {
        let chunker = CharacterChunker::with_defaults();
        let texts = vec!["first".to_string(), "   ".to_string(), "second".to_string()];
        assert_eq!(chunk_texts(&chunker, &texts), vec!["first", "second"]);
    }
}
