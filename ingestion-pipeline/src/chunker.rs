use common::error::AppError;

/// Splits document text into fixed-size chunks where each chunk after the
/// first starts `overlap` characters before the end of the previous one.
///
/// Sizes are measured in characters, not bytes, so multi-byte UTF-8 input
/// never splits inside a code point.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, AppError> {
        if chunk_size == 0 {
            return Err(AppError::Validation(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(AppError::Validation(format!(
                "chunk overlap ({overlap}) must be smaller than the chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Produces the ordered chunk sequence covering `text` with no gaps.
    /// Empty input yields no chunks; input shorter than the chunk size
    /// yields exactly one.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let stride = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = usize::min(start + self.chunk_size, chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += stride;
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(chunks: &[String], overlap: usize) -> String {
        let mut text = String::new();
        for (index, chunk) in chunks.iter().enumerate() {
            if index == 0 {
                text.push_str(chunk);
            } else {
                text.extend(chunk.chars().skip(overlap));
            }
        }
        text
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = TextChunker::new(800, 160).expect("valid parameters");
        assert!(chunker.split("").is_empty());
    }

    #[test]
    fn short_input_yields_a_single_chunk() {
        let chunker = TextChunker::new(800, 160).expect("valid parameters");
        let text = "a".repeat(500);
        let chunks = chunker.split(&text);
        assert_eq!(chunks, vec![text]);
    }

    #[test]
    fn chunks_cover_the_input_without_gaps() {
        let chunker = TextChunker::new(100, 20).expect("valid parameters");
        let text: String = (0..937).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunker.split(&text);

        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 100));
        assert_eq!(reassemble(&chunks, 20), text);
    }

    #[test]
    fn consecutive_chunks_share_the_overlap() {
        let chunker = TextChunker::new(10, 4).expect("valid parameters");
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker.split(text);

        for pair in chunks.windows(2) {
            let len = pair[0].chars().count();
            let tail: String = pair[0].chars().skip(len - 4).collect();
            let head: String = pair[1].chars().take(4).collect();
            assert_eq!(tail, head, "overlap mismatch between consecutive chunks");
        }
    }

    #[test]
    fn exact_multiple_of_stride_has_no_empty_tail() {
        let chunker = TextChunker::new(10, 5).expect("valid parameters");
        // 15 chars: chunk 0 covers 0..10, chunk 1 covers 5..15, done.
        let text = "012345678901234";
        let chunks = chunker.split(text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|chunk| !chunk.is_empty()));
    }

    #[test]
    fn multibyte_input_splits_on_character_boundaries() {
        let chunker = TextChunker::new(4, 1).expect("valid parameters");
        let text = "åäöüßéñ漢字かな";
        let chunks = chunker.split(text);

        assert_eq!(reassemble(&chunks, 1), text);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 4));
    }

    #[test]
    fn splitting_is_deterministic() {
        let chunker = TextChunker::new(50, 10).expect("valid parameters");
        let text = "the quick brown fox jumps over the lazy dog ".repeat(20);
        assert_eq!(chunker.split(&text), chunker.split(&text));
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        assert!(TextChunker::new(100, 100).is_err());
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(100, 99).is_ok());
    }
}
