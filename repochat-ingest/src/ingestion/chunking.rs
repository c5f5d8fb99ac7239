use serde::{Deserialize, Serialize};

/// Configuration for line-window chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Lines per chunk
    pub chunk_size_lines: usize,
    /// Lines between the starts of consecutive chunks; smaller than
    /// `chunk_size_lines` means chunks overlap
    pub chunk_step_lines: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size_lines: 40,
            chunk_step_lines: 30,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size_lines: usize, chunk_step_lines: usize) -> Self {
        Self {
            chunk_size_lines: chunk_size_lines.max(1),
            chunk_step_lines: chunk_step_lines.max(1),
        }
    }
}

/// A window of lines from one file. Line numbers are 1-based and inclusive,
/// the same convention citations use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub path: String,
    pub line_start: usize,
    pub line_end: usize,
    pub content: String,
}

/// Split files into overlapping line windows
#[derive(Debug, Clone, Default)]
pub struct ChunkingStrategy {
    config: ChunkingConfig,
}

impl ChunkingStrategy {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn chunk_content(&self, path: &str, content: &str) -> Vec<Chunk> {
        let lines: Vec<&str> = content.lines().collect();
        let size = self.config.chunk_size_lines.max(1);
        let step = self.config.chunk_step_lines.max(1);

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < lines.len() {
            let end = (start + size).min(lines.len());
            chunks.push(Chunk {
                path: path.to_string(),
                line_start: start + 1,
                line_end: end,
                content: lines[start..end].join("\n"),
            });
            if end == lines.len() {
                break;
            }
            start += step;
        }

        tracing::debug!("Chunked {} into {} chunks", path, chunks.len());
        chunks
    }

    /// Number of chunks `content` would produce, without building them
    pub fn count_chunks(&self, content: &str) -> usize {
        let line_count = content.lines().count();
        let size = self.config.chunk_size_lines.max(1);
        let step = self.config.chunk_step_lines.max(1);

        let mut count = 0;
        let mut start = 0;
        while start < line_count {
            count += 1;
            if start + size >= line_count {
                break;
            }
            start += step;
        }
        count
    }
}
