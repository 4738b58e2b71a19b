//! @ai:module:intent Serialize a ReportDocument into a Word package
//! @ai:module:layer infrastructure
//! @ai:module:public_api DocxWriter
//! @ai:module:stateless true

use crate::report::document::{Alignment, Block, ReportDocument, TableBlock, TextRun};
use crate::report::ReportError;
use docx_rs::{
    AbstractNumbering, AlignmentType, BreakType, Docx, IndentLevel, Level, LevelJc, LevelText,
    NumberFormat, Numbering, NumberingId, Paragraph, Pic, Run, Start, Style, StyleType, Table,
    TableCell, TableRow,
};
use std::io::Cursor;

const BULLET_NUMBERING: usize = 1;
const DECIMAL_NUMBERING: usize = 2;

/// Six inches, the usable width of a portrait page with default margins.
const IMAGE_WIDTH_EMU: u32 = 5_486_400;

/// @ai:intent Writes report blocks with docx-rs
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxWriter;

impl DocxWriter {
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Serialize all blocks into DOCX bytes
    /// @ai:effects pure
    pub fn write(&self, document: &ReportDocument) -> Result<Vec<u8>, ReportError> {
        let mut docx = Self::styled_document();

        for block in &document.blocks {
            docx = match block {
                Block::Table(table) => docx.add_table(Self::table(table)),
                other => docx.add_paragraph(Self::paragraph(other)),
            };
        }

        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(|e| ReportError::Package(e.to_string()))?;

        let bytes = cursor.into_inner();
        tracing::debug!("Packaged {} blocks into {} bytes", document.blocks.len(), bytes.len());
        Ok(bytes)
    }

    fn styled_document() -> Docx {
        let bullet = Level::new(
            0,
            Start::new(1),
            NumberFormat::new("bullet"),
            LevelText::new("•"),
            LevelJc::new("left"),
        );
        let decimal = Level::new(
            0,
            Start::new(1),
            NumberFormat::new("decimal"),
            LevelText::new("%1."),
            LevelJc::new("left"),
        );

        Docx::new()
            .add_style(
                Style::new("Title", StyleType::Paragraph)
                    .name("Title")
                    .size(48)
                    .bold()
                    .color("1F3864"),
            )
            .add_style(
                Style::new("Heading1", StyleType::Paragraph)
                    .name("Heading 1")
                    .size(32)
                    .bold()
                    .color("2E74B5"),
            )
            .add_style(
                Style::new("Heading2", StyleType::Paragraph)
                    .name("Heading 2")
                    .size(28)
                    .bold(),
            )
            .add_style(
                Style::new("Heading3", StyleType::Paragraph)
                    .name("Heading 3")
                    .size(24)
                    .bold(),
            )
            .add_abstract_numbering(AbstractNumbering::new(BULLET_NUMBERING).add_level(bullet))
            .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
            .add_abstract_numbering(AbstractNumbering::new(DECIMAL_NUMBERING).add_level(decimal))
            .add_numbering(Numbering::new(DECIMAL_NUMBERING, DECIMAL_NUMBERING))
    }

    fn run(text_run: &TextRun) -> Run {
        let mut run = Run::new().add_text(text_run.text.as_str());
        if text_run.bold {
            run = run.bold();
        }
        if text_run.italic {
            run = run.italic();
        }
        if let Some(color) = text_run.color {
            run = run.color(color);
        }
        run
    }

    fn with_runs(runs: &[TextRun]) -> Paragraph {
        runs.iter()
            .fold(Paragraph::new(), |paragraph, r| paragraph.add_run(Self::run(r)))
    }

    fn paragraph(block: &Block) -> Paragraph {
        match block {
            Block::Heading { level, text } => {
                let style = match level {
                    0 => "Title",
                    1 => "Heading1",
                    2 => "Heading2",
                    _ => "Heading3",
                };
                let paragraph = Paragraph::new()
                    .add_run(Run::new().add_text(text.as_str()))
                    .style(style);
                if *level == 0 {
                    paragraph.align(AlignmentType::Center)
                } else {
                    paragraph
                }
            }
            Block::Paragraph { runs, align } => {
                let paragraph = Self::with_runs(runs);
                match align {
                    Alignment::Center => paragraph.align(AlignmentType::Center),
                    Alignment::Left => paragraph,
                }
            }
            Block::Bullet(runs) => Self::with_runs(runs)
                .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0)),
            Block::Numbered(runs) => Self::with_runs(runs)
                .numbering(NumberingId::new(DECIMAL_NUMBERING), IndentLevel::new(0)),
            Block::Image {
                bytes,
                width_px,
                height_px,
                ..
            } => {
                let height_emu = if *width_px == 0 {
                    IMAGE_WIDTH_EMU / 2
                } else {
                    (u64::from(IMAGE_WIDTH_EMU) * u64::from(*height_px) / u64::from(*width_px))
                        as u32
                };
                Paragraph::new()
                    .add_run(Run::new().add_image(Pic::new(bytes).size(IMAGE_WIDTH_EMU, height_emu)))
                    .align(AlignmentType::Center)
            }
            Block::Placeholder(text) => Paragraph::new()
                .add_run(Run::new().add_text(text.as_str()).italic().color("808080"))
                .align(AlignmentType::Center),
            Block::PageBreak => Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
            Block::Table(_) => Paragraph::new(),
        }
    }

    fn table(table: &TableBlock) -> Table {
        let header = TableRow::new(
            table
                .header
                .iter()
                .map(|h| {
                    TableCell::new()
                        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(h.as_str()).bold()))
                })
                .collect(),
        );

        let rows = table.rows.iter().map(|row| {
            TableRow::new(
                row.iter()
                    .map(|cell| {
                        let mut run = Run::new().add_text(cell.text.as_str());
                        if let Some(color) = cell.color {
                            run = run.bold().color(color);
                        }
                        TableCell::new().add_paragraph(Paragraph::new().add_run(run))
                    })
                    .collect(),
            )
        });

        Table::new(std::iter::once(header).chain(rows).collect())
    }
}
