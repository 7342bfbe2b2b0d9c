//! Document discovery and chunking
//!
//! Walks the configured documentation root, filters files with a glob
//! pattern, and splits each file into bounded, overlapping chunks. The
//! output is deterministic for a fixed input set.

use std::path::{Path, PathBuf};

use globset::Glob;
use walkdir::WalkDir;

use crate::error::{DocqError, DocqResult};

/// A bounded slice of a source document, the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    pub content: String,
    /// Path of the file this chunk was cut from
    pub source: PathBuf,
    /// Position of the chunk within its source file
    pub ordinal: usize,
}

/// Load documents under `path` matching `glob` and split them into chunks.
///
/// Files are visited in sorted order so repeated runs over the same tree
/// produce the same chunk sequence.
pub fn load_and_split(
    path: &Path,
    glob: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> DocqResult<Vec<DocumentChunk>> {
    if !path.exists() {
        return Err(DocqError::NotFound(format!(
            "document folder not found: {}",
            path.display()
        )));
    }

    let matcher = Glob::new(glob)
        .map_err(|e| DocqError::Configuration(format!("invalid docs glob '{}': {}", glob, e)))?
        .compile_matcher();

    let mut chunks = Vec::new();
    let mut files = 0usize;
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| DocqError::Index(format!("cannot walk documents: {}", e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(path).unwrap_or(entry.path());
        if !matcher.is_match(relative) {
            continue;
        }

        let text = std::fs::read_to_string(entry.path())?;
        files += 1;
        for (ordinal, piece) in split_text(&text, chunk_size, chunk_overlap)
            .into_iter()
            .enumerate()
        {
            chunks.push(DocumentChunk {
                content: piece,
                source: entry.path().to_path_buf(),
                ordinal,
            });
        }
    }

    tracing::info!(files, chunks = chunks.len(), "loaded and split documents");
    Ok(chunks)
}

/// Split text into chunks of at most `chunk_size` characters with
/// `chunk_overlap` characters carried over between consecutive chunks.
/// Breaks prefer paragraph, then line, then word boundaries in the back
/// half of the window.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= chunk_size {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let mut pieces = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let hard_end = (start + chunk_size).min(chars.len());
        let end = if hard_end < chars.len() {
            find_break(&chars, start, hard_end)
        } else {
            hard_end
        };

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }

        if end == chars.len() {
            break;
        }
        // Overlap with the previous chunk, always making forward progress.
        start = end.saturating_sub(chunk_overlap).max(start + 1);
    }

    pieces
}

fn find_break(chars: &[char], start: usize, hard_end: usize) -> usize {
    let floor = start + (hard_end - start) / 2;
    let patterns: [&[char]; 3] = [&['\n', '\n'], &['\n'], &[' ']];
    for pattern in patterns {
        let mut i = hard_end;
        while i >= floor + pattern.len() {
            if &chars[i - pattern.len()..i] == pattern {
                return i;
            }
            i -= 1;
        }
    }
    hard_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_short_text_is_a_single_chunk() {
        let pieces = split_text("hello world", 1000, 200);
        assert_eq!(pieces, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(split_text("   \n\n ", 1000, 200).is_empty());
    }

    #[test]
    fn test_chunks_respect_size_bound() {
        let text = "word ".repeat(500);
        let pieces = split_text(&text, 100, 20);
        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.chars().count() <= 100);
        }
    }

    #[test]
    fn test_split_prefers_paragraph_breaks() {
        let text = format!("{}\n\n{}", "a".repeat(80), "b".repeat(80));
        let pieces = split_text(&text, 100, 10);
        assert_eq!(pieces[0], "a".repeat(80));
    }

    #[test]
    fn test_split_is_deterministic() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(100);
        let first = split_text(&text, 120, 30);
        let second = split_text(&text, 120, 30);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_folder_is_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            load_and_split(&missing, "**/*.md", 1000, 200),
            Err(DocqError::NotFound(_))
        ));
    }

    #[test]
    fn test_glob_filters_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("keep.md"), "kept content").unwrap();
        std::fs::write(dir.path().join("skip.txt"), "skipped content").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/also.md"), "nested content").unwrap();

        let chunks = load_and_split(dir.path(), "**/*.md", 1000, 200).unwrap();
        let sources: Vec<String> = chunks
            .iter()
            .map(|c| c.source.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(sources.contains(&"keep.md".to_string()));
        assert!(sources.contains(&"also.md".to_string()));
        assert!(!sources.contains(&"skip.txt".to_string()));
    }

    #[test]
    fn test_load_is_deterministic() {
        let dir = TempDir::new().unwrap();
        for name in ["b.md", "a.md", "c.md"] {
            std::fs::write(dir.path().join(name), "content ".repeat(300)).unwrap();
        }

        let first = load_and_split(dir.path(), "**/*.md", 200, 50).unwrap();
        let second = load_and_split(dir.path(), "**/*.md", 200, 50).unwrap();
        assert_eq!(first, second);
        // Sorted walk: a.md chunks come before b.md chunks
        assert!(first[0].source.ends_with("a.md"));
    }
}
