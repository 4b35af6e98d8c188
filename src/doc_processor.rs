use crate::docx_writer;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::info;

pub const MARKDOWN_EXTENSION: &str = ".md";
pub const DOCX_EXTENSION: &str = ".docx";

/// Default source directory, relative to the working directory.
pub const GUIDES_DIR: &str = "docs/guides";

const FENCE: &str = "```";

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\. ").expect("numbered list pattern is valid"));

/// One output paragraph, as recognized from a Markdown line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Levels 1 to 4.
    Heading { level: u8, text: String },
    Bullet(String),
    Numbered(String),
    /// A line inside a fenced code block, verbatim.
    Code(String),
    Paragraph(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {}: {message}", path.display())]
    Pack { path: PathBuf, message: String },
}

impl ConvertError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Interpret a Markdown document line by line.
///
/// Fences toggle code mode; inside code every line is kept as-is. Outside,
/// the first matching rule wins: `#`..`####` headings, `-`/`*` bullets,
/// `N. ` numbered items, blank lines (dropped), then plain paragraphs.
/// Emphasis, links, tables and nesting are not interpreted.
pub fn parse_markdown(source: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut in_code_block = false;

    for line in source.lines() {
        let line = line.trim_end();

        if line.starts_with(FENCE) {
            in_code_block = !in_code_block;
            continue;
        }

        if in_code_block {
            blocks.push(Block::Code(line.to_string()));
            continue;
        }

        if let Some(heading) = parse_heading(line) {
            blocks.push(heading);
            continue;
        }

        let trimmed = line.trim();
        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            blocks.push(Block::Bullet(item.to_string()));
        } else if NUMBERED_ITEM.is_match(trimmed) {
            let item = trimmed.split_once(". ").map_or("", |(_, rest)| rest);
            blocks.push(Block::Numbered(item.to_string()));
        } else if !trimmed.is_empty() {
            blocks.push(Block::Paragraph(line.to_string()));
        }
    }

    blocks
}

// Only these four prefixes count; `##### ` and deeper fall through.
fn parse_heading(line: &str) -> Option<Block> {
    const PREFIXES: [&str; 4] = ["# ", "## ", "### ", "#### "];

    PREFIXES.iter().zip(1u8..).find_map(|(prefix, level)| {
        line.strip_prefix(prefix).map(|text| Block::Heading {
            level,
            text: text.to_string(),
        })
    })
}

/// One Markdown source mapped to the document written next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source: PathBuf,
    pub output: PathBuf,
}

impl ConversionJob {
    /// `None` unless the file name ends in `.md`.
    pub fn for_source(source: &Path) -> Option<Self> {
        let name = source.file_name()?.to_str()?;
        let stem = name.strip_suffix(MARKDOWN_EXTENSION)?;
        Some(Self {
            source: source.to_path_buf(),
            output: source.with_file_name(format!("{}{}", stem, DOCX_EXTENSION)),
        })
    }

    /// Read, parse and write the document. Returns the paragraph count.
    pub fn run(&self) -> Result<usize, ConvertError> {
        let markdown =
            fs::read_to_string(&self.source).map_err(|e| ConvertError::io(&self.source, e))?;
        let blocks = parse_markdown(&markdown);
        docx_writer::write_docx(&blocks, &self.output)?;
        Ok(blocks.len())
    }
}

/// Markdown files directly inside `dir`, in directory listing order.
pub fn discover_jobs(dir: &Path) -> Result<Vec<ConversionJob>, ConvertError> {
    let entries = fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))?;

    let mut jobs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConvertError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(job) = ConversionJob::for_source(&path) {
            jobs.push(job);
        }
    }
    Ok(jobs)
}

/// Convert every `.md` file in `dir` into a `.docx` beside it.
///
/// Files are processed one after another; the first failure stops the run.
pub fn convert_directory(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    if !dir.is_dir() {
        return Err(ConvertError::MissingDirectory(dir.to_path_buf()));
    }

    let mut written = Vec::new();
    for job in discover_jobs(dir)? {
        let name = job
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Converting {} to DOCX...", name);

        let paragraphs = job.run()?;
        info!(paragraphs, "Saved {}", job.output.display());
        written.push(job.output);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: u8, text: &str) -> Block {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    #[test]
    fn test_heading_levels() {
        let blocks = parse_markdown("# Title\n## Two\n### Three\n#### Four");
        assert_eq!(
            blocks,
            vec![
                heading(1, "Title"),
                heading(2, "Two"),
                heading(3, "Three"),
                heading(4, "Four"),
            ]
        );
    }

    #[test]
    fn test_deep_and_unspaced_headings_are_paragraphs() {
        let blocks = parse_markdown("##### Five\n#NoSpace");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("##### Five".into()),
                Block::Paragraph("#NoSpace".into()),
            ]
        );
    }

    #[test]
    fn test_indented_heading_is_not_a_heading() {
        assert_eq!(
            parse_markdown("  # Title"),
            vec![Block::Paragraph("  # Title".into())]
        );
    }

    #[test]
    fn test_numbered_items() {
        let blocks = parse_markdown("1. First\n2. Second\n10. Tenth. With dot");
        assert_eq!(
            blocks,
            vec![
                Block::Numbered("First".into()),
                Block::Numbered("Second".into()),
                Block::Numbered("Tenth. With dot".into()),
            ]
        );
    }

    #[test]
    fn test_numbered_needs_dot_space() {
        let blocks = parse_markdown("1.First\n1) First\nv1. no");
        assert!(blocks.iter().all(|b| matches!(b, Block::Paragraph(_))));
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn test_bullets_strip_marker_and_indent() {
        let blocks = parse_markdown("- item\n* item\n    - nested");
        assert_eq!(
            blocks,
            vec![
                Block::Bullet("item".into()),
                Block::Bullet("item".into()),
                Block::Bullet("nested".into()),
            ]
        );
    }

    #[test]
    fn test_code_block_is_verbatim() {
        let blocks = parse_markdown("```\ncode line\n# not a heading\n  - not a list\n```");
        assert_eq!(
            blocks,
            vec![
                Block::Code("code line".into()),
                Block::Code("# not a heading".into()),
                Block::Code("  - not a list".into()),
            ]
        );
    }

    #[test]
    fn test_fence_with_language_and_blank_code_lines() {
        let blocks = parse_markdown("```rust\nfn main() {}\n\n}\n````\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::Code("fn main() {}".into()),
                Block::Code(String::new()),
                Block::Code("}".into()),
                Block::Paragraph("after".into()),
            ]
        );
    }

    #[test]
    fn test_unbalanced_fence_runs_to_end() {
        let blocks = parse_markdown("intro\n```\n# still code\n- also code");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("intro".into()),
                Block::Code("# still code".into()),
                Block::Code("- also code".into()),
            ]
        );
    }

    #[test]
    fn test_blank_lines_emit_nothing() {
        let blocks = parse_markdown("first\n\n   \nsecond\r\n");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("first".into()),
                Block::Paragraph("second".into()),
            ]
        );
    }

    #[test]
    fn test_paragraph_keeps_inline_markup_and_leading_space() {
        let blocks = parse_markdown("  **bold** and [link](x)   ");
        assert_eq!(
            blocks,
            vec![Block::Paragraph("  **bold** and [link](x)".into())]
        );
    }

    #[test]
    fn test_each_parse_starts_outside_code() {
        let _ = parse_markdown("```\nunterminated");
        assert_eq!(parse_markdown("# Title"), vec![heading(1, "Title")]);
    }

    #[test]
    fn test_job_output_path() {
        let job = ConversionJob::for_source(Path::new("docs/guides/setup.md")).unwrap();
        assert_eq!(job.output, PathBuf::from("docs/guides/setup.docx"));

        let job = ConversionJob::for_source(Path::new("notes.md.md")).unwrap();
        assert_eq!(job.output, PathBuf::from("notes.md.docx"));

        assert!(ConversionJob::for_source(Path::new("readme.txt")).is_none());
        assert!(ConversionJob::for_source(Path::new("readme.MD")).is_none());
    }
}
