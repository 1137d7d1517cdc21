use std::{mem, path::Path};

use anyhow::anyhow;
use once_cell::sync::Lazy;
use pdf_extract::{Document, MediaBox, OutputDev, OutputError, Transform};
use regex::Regex;
use tracing::warn;

static COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+|\s{2,}").unwrap());

pub type Row = Vec<Option<String>>;
pub type Table = Vec<Row>;

/// One rendered PDF page: its plain text and whatever tables could be recovered from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub text: String,
    pub tables: Vec<Table>,
}

pub trait PdfDocument {
    fn page_count(&self) -> usize;
    fn page(&self, index: usize) -> anyhow::Result<Page>;
}

pub trait DocumentLoader {
    fn open(&self, path: &Path) -> anyhow::Result<Box<dyn PdfDocument>>;
}

/// Pages held in memory, already split into text and tables.
pub struct LoadedDocument {
    pages: Vec<Page>,
}

impl LoadedDocument {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }
}

impl PdfDocument for LoadedDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> anyhow::Result<Page> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("Page {} out of range", index + 1))
    }
}

// Gaps measured in multiples of the rendered font size.
const WORD_GAP: f64 = 0.1;
const CELL_GAP: f64 = 1.0;
const LINE_SHIFT: f64 = 0.5;

/// Rebuilds one page as lines of cells from glyph positions. Glyphs further apart than
/// `CELL_GAP` start a new cell, a baseline shift starts a new line.
#[derive(Default)]
struct LayoutOutput {
    lines: Vec<Vec<String>>,
    cells: Vec<String>,
    cell: String,
    last_end: f64,
    last_y: f64,
    started: bool,
}

impl LayoutOutput {
    fn end_cell(&mut self) {
        let cell = mem::take(&mut self.cell);
        let cell = cell.trim();
        if !cell.is_empty() {
            self.cells.push(cell.to_string());
        }
    }

    fn end_row(&mut self) {
        self.end_cell();
        if !self.cells.is_empty() {
            self.lines.push(mem::take(&mut self.cells));
        }
    }

    /// Page text has single spaces between cells, the layout text used for table detection
    /// keeps them tab separated.
    fn into_page(mut self) -> Page {
        self.end_row();
        let join_lines = |separator: &str| {
            self.lines
                .iter()
                .map(|cells| cells.join(separator))
                .collect::<Vec<_>>()
                .join("\n")
        };
        Page {
            tables: detect_tables(&join_lines("\t")),
            text: join_lines(" "),
        }
    }
}

impl OutputDev for LayoutOutput {
    fn begin_page(
        &mut self,
        _page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.end_row();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        let scale = (trm.m11 * trm.m22 - trm.m12 * trm.m21).abs().sqrt();
        let size = if scale > 0.0 { font_size * scale } else { font_size };
        let (x, y) = (trm.m31, trm.m32);

        if self.started {
            if (y - self.last_y).abs() > size * LINE_SHIFT {
                self.end_row();
            } else if x > self.last_end + size * CELL_GAP {
                self.end_cell();
            } else if x > self.last_end + size * WORD_GAP && !self.cell.ends_with(' ') {
                self.cell.push(' ');
            }
        }
        self.cell.push_str(&char.replace('\0', ""));
        self.started = true;
        self.last_y = y;
        self.last_end = x + width * size;
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// A parsed PDF whose pages were laid out up front. A page that failed to render keeps its
/// error so that callers see it when they reach that page.
struct RenderedDocument {
    pages: Vec<Result<Page, String>>,
}

impl PdfDocument for RenderedDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> anyhow::Result<Page> {
        match self.pages.get(index) {
            Some(Ok(page)) => Ok(page.clone()),
            Some(Err(e)) => Err(anyhow!("Page {}: {}", index + 1, e)),
            None => Err(anyhow!("Page {} out of range", index + 1)),
        }
    }
}

fn render_page(document: &Document, page_num: u32) -> Result<Page, OutputError> {
    let mut output = LayoutOutput::default();
    pdf_extract::output_doc_page(document, &mut output, page_num)?;
    Ok(output.into_page())
}

/// Reads PDFs from disk with `pdf-extract`, rebuilding text lines and table cells from glyph
/// positions.
pub struct PdfExtractLoader;

impl DocumentLoader for PdfExtractLoader {
    fn open(&self, path: &Path) -> anyhow::Result<Box<dyn PdfDocument>> {
        let buffer = std::fs::read(path)?;
        if !buffer.starts_with(b"%PDF") {
            return Err(anyhow!("{} is not a PDF file", path.display()));
        }
        let mut document = Document::load_mem(&buffer)?;
        if document.is_encrypted() {
            document.decrypt("")?;
        }

        let pages = document
            .get_pages()
            .into_keys()
            .map(|page_num| {
                render_page(&document, page_num).map_err(|e| {
                    warn!("Could not render page {} of {}: {}", page_num, path.display(), e);
                    e.to_string()
                })
            })
            .collect();
        Ok(Box::new(RenderedDocument { pages }))
    }
}

pub fn split_columns(line: &str) -> Row {
    COLUMN_GAP
        .split(line.trim())
        .map(|cell| {
            let cell = cell.trim();
            if cell.is_empty() {
                None
            } else {
                Some(cell.to_string())
            }
        })
        .collect()
}

/// Recovers tables from layout text: a line with at least two columns separated by wide
/// gaps is a row, consecutive rows form a table.
pub fn detect_tables(text: &str) -> Vec<Table> {
    let mut tables = vec![];
    let mut current: Table = vec![];

    for line in text.lines() {
        let row = split_columns(line);
        if row.len() >= 2 {
            current.push(row);
        } else if !current.is_empty() {
            tables.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tables.push(current);
    }
    tables
}
