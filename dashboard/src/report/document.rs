//! @ai:module:intent Format-neutral block model of a report
//! @ai:module:layer domain
//! @ai:module:public_api ReportDocument, Block, TextRun, TableBlock, TableCellText, Alignment
//! @ai:module:stateless true

use crate::metrics::Severity;

/// Hex colour for critical percentages.
pub const CRITICAL_COLOR: &str = "DC143C";
/// Hex colour for concerning percentages.
pub const CONCERNING_COLOR: &str = "FF8C00";

/// @ai:intent Highlight colour for a severity tier, if any
/// @ai:effects pure
pub fn severity_color(severity: Severity) -> Option<&'static str> {
    match severity {
        Severity::Critical => Some(CRITICAL_COLOR),
        Severity::Concerning => Some(CONCERNING_COLOR),
        Severity::Monitor | Severity::Acceptable => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

/// @ai:intent A span of text sharing one style
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<&'static str>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Self::default()
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: true,
            ..Self::default()
        }
    }
}

/// @ai:intent One table cell; colour applies to the whole cell text
#[derive(Debug, Clone, PartialEq)]
pub struct TableCellText {
    pub text: String,
    pub color: Option<&'static str>,
}

impl TableCellText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Option<&'static str>) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub header: Vec<String>,
    pub rows: Vec<Vec<TableCellText>>,
}

/// @ai:intent A single renderable element, in reading order
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Level 0 is the document title.
    Heading { level: u8, text: String },
    Paragraph { runs: Vec<TextRun>, align: Alignment },
    Bullet(Vec<TextRun>),
    Numbered(Vec<TextRun>),
    Table(TableBlock),
    Image {
        bytes: Vec<u8>,
        width_px: u32,
        height_px: u32,
        caption: String,
    },
    /// Stands in for content that could not be produced.
    Placeholder(String),
    PageBreak,
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            runs: vec![TextRun::plain(text)],
            align: Alignment::Left,
        }
    }

    pub fn centered(runs: Vec<TextRun>) -> Self {
        Block::Paragraph {
            runs,
            align: Alignment::Center,
        }
    }

    pub fn bullet(text: impl Into<String>) -> Self {
        Block::Bullet(vec![TextRun::plain(text)])
    }

    pub fn numbered(text: impl Into<String>) -> Self {
        Block::Numbered(vec![TextRun::plain(text)])
    }

    /// @ai:intent Visible text of the block, without styling
    /// @ai:effects pure
    pub fn text(&self) -> String {
        match self {
            Block::Heading { text, .. } | Block::Placeholder(text) => text.clone(),
            Block::Paragraph { runs, .. } | Block::Bullet(runs) | Block::Numbered(runs) => {
                runs.iter().map(|r| r.text.as_str()).collect()
            }
            Block::Table(table) => {
                let mut lines = vec![table.header.join(" | ")];
                lines.extend(table.rows.iter().map(|row| {
                    row.iter()
                        .map(|c| c.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" | ")
                }));
                lines.join("\n")
            }
            Block::Image { caption, .. } => caption.clone(),
            Block::PageBreak => String::new(),
        }
    }
}

/// @ai:intent Ordered blocks making up a report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDocument {
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn extend(&mut self, blocks: impl IntoIterator<Item = Block>) {
        self.blocks.extend(blocks);
    }

    /// @ai:intent Heading texts at the given level, in order
    /// @ai:effects pure
    pub fn headings(&self, level: u8) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading { level: l, text } if *l == level => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }

    pub fn placeholders(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Placeholder(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_image(&self) -> bool {
        self.blocks.iter().any(|b| matches!(b, Block::Image { .. }))
    }

    /// @ai:intent Entire document as plain text, one block per line
    /// @ai:effects pure
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
