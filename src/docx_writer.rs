//! Word document rendering for parsed Markdown blocks.

use crate::doc_processor::{Block, ConvertError};
use docx_rs::{
    AbstractNumbering, Docx, IndentLevel, Level, LevelJc, LevelText, LineSpacing, NumberFormat,
    Numbering, NumberingId, Paragraph, Run, RunFonts, Start, Style, StyleType,
};
use std::fs::File;
use std::path::Path;

const LIST_BULLET: &str = "ListBullet";
const LIST_NUMBER: &str = "ListNumber";
const NO_SPACING: &str = "NoSpacing";

const BULLET_NUMBERING: usize = 1;
const DECIMAL_NUMBERING: usize = 2;

const CODE_FONT: &str = "Courier New";
/// Half-points: 10pt.
const CODE_SIZE: usize = 20;

/// Heading sizes in half-points, levels 1 to 4.
const HEADING_SIZES: [usize; 4] = [32, 28, 26, 24];

fn heading_style(level: u8) -> String {
    format!("Heading{}", level)
}

fn with_styles(docx: Docx) -> Docx {
    let docx = HEADING_SIZES
        .iter()
        .zip(1u8..)
        .fold(docx, |docx, (size, level)| {
            docx.add_style(
                Style::new(&heading_style(level), StyleType::Paragraph)
                    .name(&format!("Heading {}", level))
                    .size(*size)
                    .bold(),
            )
        });

    docx.add_style(Style::new(LIST_BULLET, StyleType::Paragraph).name("List Bullet"))
        .add_style(Style::new(LIST_NUMBER, StyleType::Paragraph).name("List Number"))
        .add_style(Style::new(NO_SPACING, StyleType::Paragraph).name("No Spacing"))
        .add_abstract_numbering(AbstractNumbering::new(BULLET_NUMBERING).add_level(Level::new(
            0,
            Start::new(1),
            NumberFormat::new("bullet"),
            LevelText::new("•"),
            LevelJc::new("left"),
        )))
        .add_abstract_numbering(AbstractNumbering::new(DECIMAL_NUMBERING).add_level(Level::new(
            0,
            Start::new(1),
            NumberFormat::new("decimal"),
            LevelText::new("%1."),
            LevelJc::new("left"),
        )))
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
        .add_numbering(Numbering::new(DECIMAL_NUMBERING, DECIMAL_NUMBERING))
}

fn paragraph(block: &Block) -> Paragraph {
    match block {
        Block::Heading { level, text } => Paragraph::new()
            .add_run(Run::new().add_text(text.as_str()))
            .style(&heading_style(*level)),
        Block::Bullet(text) => Paragraph::new()
            .add_run(Run::new().add_text(text.as_str()))
            .style(LIST_BULLET)
            .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0)),
        Block::Numbered(text) => Paragraph::new()
            .add_run(Run::new().add_text(text.as_str()))
            .style(LIST_NUMBER)
            .numbering(NumberingId::new(DECIMAL_NUMBERING), IndentLevel::new(0)),
        Block::Code(text) => Paragraph::new()
            .add_run(
                Run::new()
                    .add_text(text.as_str())
                    .fonts(RunFonts::new().ascii(CODE_FONT).hi_ansi(CODE_FONT))
                    .size(CODE_SIZE),
            )
            .style(NO_SPACING)
            .line_spacing(LineSpacing::new().before(0).after(0)),
        Block::Paragraph(text) => Paragraph::new().add_run(Run::new().add_text(text.as_str())),
    }
}

/// Build a document with one paragraph per block.
pub fn render(blocks: &[Block]) -> Docx {
    blocks
        .iter()
        .fold(with_styles(Docx::new()), |docx, block| {
            docx.add_paragraph(paragraph(block))
        })
}

pub fn write_docx(blocks: &[Block], path: &Path) -> Result<(), ConvertError> {
    let file = File::create(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    render(blocks)
        .build()
        .pack(file)
        .map_err(|e| ConvertError::Pack {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
