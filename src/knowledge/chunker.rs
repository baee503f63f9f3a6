//! Text Chunking Module
//!
//! 재귀적 경계 인식 텍스트 분할을 제공합니다.
//! 문단(`\n\n`) → 줄(`\n`) → 단어(` `) → 문자 순으로 경계를 낮춰가며
//! `chunk_size` 이하의 청크를 만들고, 인접 청크 사이에 `chunk_overlap` 만큼 겹칩니다.
//!
//! 길이는 바이트가 아닌 문자(char) 수 기준입니다.

use std::collections::VecDeque;

use anyhow::Result;

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// 최대 청크 크기 (문자 수)
    pub chunk_size: usize,
    /// 오버랩 크기 (문자 수)
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::for_chat()
    }
}

impl ChunkConfig {
    /// 검증 후 생성
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than 0");
        }
        if chunk_overlap >= chunk_size {
            anyhow::bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap,
                chunk_size
            );
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// 대화형 채팅용 설정
    pub fn for_chat() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }

    /// REST API용 설정
    pub fn for_api() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 80,
        }
    }

    /// CLI 인자로 덮어쓰기
    pub fn with_overrides(self, chunk_size: Option<usize>, chunk_overlap: Option<usize>) -> Result<Self> {
        Self::new(
            chunk_size.unwrap_or(self.chunk_size),
            chunk_overlap.unwrap_or(self.chunk_overlap),
        )
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// RecursiveSplitter
// ============================================================================

/// 기본 구분자 (우선순위 순)
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// 재귀 경계 인식 청커
///
/// 텍스트에 존재하는 가장 큰 구분자로 나눈 뒤, `chunk_size` 이상인 조각만
/// 다음 구분자로 다시 나눕니다. 구분자는 뒤 조각의 앞에 유지됩니다.
pub struct RecursiveSplitter {
    config: ChunkConfig,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// 설정으로 생성
    pub fn new(config: ChunkConfig) -> Self {
        Self {
            config,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// 기본 설정으로 생성
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// 현재 설정
    pub fn config(&self) -> ChunkConfig {
        self.config
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        // 텍스트에 존재하는 첫 구분자 선택 ("" 는 항상 매치)
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];

        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let pieces = split_keep_separator(text, separator);

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in pieces {
            if char_len(&piece) < self.config.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge_splits(&pending));
                pending.clear();
            }

            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge_splits(&pending));
        }

        chunks
    }

    /// 작은 조각들을 chunk_size 이하로 병합 (오버랩 유지)
    fn merge_splits(&self, splits: &[String]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let len = char_len(split);

            if total + len > size && !current.is_empty() {
                if let Some(doc) = join_trimmed(&current) {
                    docs.push(doc);
                }

                // 오버랩 크기 이하가 될 때까지 앞에서 제거
                while total > overlap || (total + len > size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            current.push_back(split);
            total += len;
        }

        if let Some(doc) = join_trimmed(&current) {
            docs.push(doc);
        }

        docs
    }
}

impl Chunker for RecursiveSplitter {
    fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![];
        }

        self.split_recursive(text, &self.separators)
    }

    fn name(&self) -> &'static str {
        "RecursiveSplitter"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 구분자로 분할하되 구분자를 다음 조각의 앞에 유지
fn split_keep_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(|c| c.to_string()).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();

    if let Some(first) = parts.next() {
        pieces.push(first.to_string());
    }
    for rest in parts {
        pieces.push(format!("{}{}", separator, rest));
    }

    pieces.retain(|p| !p.is_empty());
    pieces
}

fn join_trimmed(parts: &VecDeque<&str>) -> Option<String> {
    let joined: String = parts.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(RecursiveSplitter::with_defaults())
}

/// 설정 지정 청커 생성
pub fn recursive_chunker(config: ChunkConfig) -> Box<dyn Chunker> {
    Box::new(RecursiveSplitter::new(config))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> RecursiveSplitter {
        RecursiveSplitter::new(ChunkConfig::new(chunk_size, chunk_overlap).unwrap())
    }

    #[test]
    fn test_chunker_empty() {
        let chunker = RecursiveSplitter::with_defaults();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\n  ").is_empty());
    }

    #[test]
    fn test_chunker_small_text() {
        let chunker = RecursiveSplitter::with_defaults();
        let chunks = chunker.chunk("Short paragraph.");
        assert_eq!(chunks, vec!["Short paragraph.".to_string()]);
    }

    #[test]
    fn test_paragraph_boundaries_preferred() {
        let chunker = splitter(12, 0);
        let chunks = chunker.chunk("para one.\n\npara two.");
        assert_eq!(chunks, vec!["para one.", "para two."]);
    }

    #[test]
    fn test_word_overlap() {
        let chunker = splitter(10, 5);
        let chunks = chunker.chunk("aaaa bbbb cccc dddd");
        assert_eq!(chunks, vec!["aaaa bbbb", "bbbb cccc", "cccc dddd"]);
    }

    #[test]
    fn test_no_overlap() {
        let chunker = splitter(10, 4);
        let chunks = chunker.chunk("aaaa bbbb cccc dddd");
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn test_chunks_never_exceed_size() {
        let chunker = splitter(50, 10);
        let text = "lorem ipsum dolor sit amet ".repeat(40)
            + "\n\n"
            + &"x".repeat(120)
            + "\nfinal line";
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {}", chunk);
        }
    }

    #[test]
    fn test_unicode_counts_chars() {
        let chunker = splitter(5, 0);
        let chunks = chunker.chunk("안녕하세요세계");
        assert_eq!(chunks, vec!["안녕하세요", "세계"]);
    }

    #[test]
    fn test_config_presets() {
        assert_eq!(ChunkConfig::for_chat(), ChunkConfig::new(1000, 200).unwrap());
        assert_eq!(ChunkConfig::for_api(), ChunkConfig::new(800, 80).unwrap());
        assert_eq!(ChunkConfig::default(), ChunkConfig::for_chat());
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkConfig::new(0, 0).is_err());
        assert!(ChunkConfig::new(100, 100).is_err());
        assert!(ChunkConfig::new(100, 99).is_ok());
    }

    #[test]
    fn test_config_overrides() {
        let config = ChunkConfig::for_chat()
            .with_overrides(Some(500), None)
            .unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 200);

        assert!(ChunkConfig::for_api().with_overrides(Some(50), None).is_err());
    }

    #[test]
    fn test_split_keep_separator() {
        assert_eq!(split_keep_separator("a b", " "), vec!["a", " b"]);
        assert_eq!(split_keep_separator("ab", ""), vec!["a", "b"]);
    }
}
