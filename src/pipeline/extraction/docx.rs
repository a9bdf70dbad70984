//! DOCX decoding: body paragraphs as text plus every table as one row grid.
//!
//! Merged cells are expanded the way Word's own object model reports them:
//! a cell spanning N grid columns appears N times, and a vertically merged
//! continuation repeats the text of the cell that started the merge. The
//! section parser relies on this and de-duplicates adjacent repeats.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::types::{RawDocument, TableGrid};
use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Word tables hold at most 63 columns.
const MAX_GRID_SPAN: usize = 63;

/// Decode a DOCX container held in memory.
pub fn read_docx(bytes: &[u8]) -> Result<RawDocument, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(format!("not a DOCX container: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::Docx(format!("{DOCUMENT_PART} missing: {e}")))?
        .read_to_string(&mut xml)?;
    parse_document_xml(&xml)
}

/// Whether `bytes` start like a ZIP container (DOCX renamed to .doc included).
pub fn is_zip_container(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK\x03\x04")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VMerge {
    Restart,
    Continue,
}

#[derive(Debug, Default)]
struct CellInfo {
    text: String,
    grid_span: usize,
    v_merge: Option<VMerge>,
}

/// Walk state for `word/document.xml`.
#[derive(Default)]
struct BodyWalker {
    paragraphs: Vec<String>,
    grid: TableGrid,
    table_depth: usize,
    in_text_run: bool,
    paragraph: String,
    row: Vec<CellInfo>,
    cell: Option<CellInfo>,
    /// Column index -> text of the cell that opened a vertical merge.
    v_merge_origins: HashMap<usize, String>,
}

impl BodyWalker {
    fn in_outer_cell(&self) -> bool {
        self.table_depth == 1 && self.cell.is_some()
    }

    fn start(&mut self, e: &BytesStart) {
        match e.local_name().as_ref() {
            b"tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.v_merge_origins.clear();
                }
            }
            b"tr" if self.table_depth == 1 => self.row.clear(),
            b"tc" if self.table_depth == 1 => {
                self.cell = Some(CellInfo {
                    grid_span: 1,
                    ..Default::default()
                })
            }
            b"p" => self.paragraph.clear(),
            b"t" => self.in_text_run = true,
            _ => self.property(e),
        }
    }

    /// Self-closing elements and cell properties.
    fn property(&mut self, e: &BytesStart) {
        match e.local_name().as_ref() {
            b"tab" => self.paragraph.push('\t'),
            b"br" | b"cr" => self.paragraph.push('\n'),
            b"gridSpan" if self.in_outer_cell() => {
                let span = val_attr(e).and_then(|v| v.parse().ok()).unwrap_or(1);
                if let Some(cell) = self.cell.as_mut() {
                    cell.grid_span = span.clamp(1, MAX_GRID_SPAN);
                }
            }
            b"vMerge" if self.in_outer_cell() => {
                let merge = match val_attr(e).as_deref() {
                    Some("restart") => VMerge::Restart,
                    _ => VMerge::Continue,
                };
                if let Some(cell) = self.cell.as_mut() {
                    cell.v_merge = Some(merge);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_text_run {
            self.paragraph.push_str(text);
        }
    }

    fn end(&mut self, local_name: &[u8]) {
        match local_name {
            b"t" => self.in_text_run = false,
            b"p" => {
                let paragraph = std::mem::take(&mut self.paragraph);
                match self.cell.as_mut() {
                    Some(cell) if self.table_depth >= 1 => {
                        if !cell.text.is_empty() {
                            cell.text.push('\n');
                        }
                        cell.text.push_str(&paragraph);
                    }
                    _ => self.paragraphs.push(paragraph),
                }
            }
            b"tc" if self.table_depth == 1 => {
                if let Some(cell) = self.cell.take() {
                    self.row.push(cell);
                }
            }
            b"tr" if self.table_depth == 1 => {
                let cells = std::mem::take(&mut self.row);
                let expanded = self.expand_row(cells);
                self.grid.push(expanded);
            }
            b"tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            _ => {}
        }
    }

    /// Repeat spanned and vertically merged text into every grid column it covers.
    fn expand_row(&mut self, cells: Vec<CellInfo>) -> Vec<String> {
        let mut out = Vec::new();
        for cell in cells {
            let col = out.len();
            let text = cell.text.trim().to_string();
            let text = match cell.v_merge {
                Some(VMerge::Restart) => {
                    self.v_merge_origins.insert(col, text.clone());
                    text
                }
                Some(VMerge::Continue) => self.v_merge_origins.get(&col).cloned().unwrap_or_default(),
                None => {
                    self.v_merge_origins.remove(&col);
                    text
                }
            };
            for _ in 0..cell.grid_span {
                out.push(text.clone());
            }
        }
        out
    }

    fn finish(self) -> RawDocument {
        let mut lines: Vec<String> = self
            .paragraphs
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        // One text line per table row keeps "Label value" pairs on the same line.
        for row in &self.grid {
            let line = row
                .iter()
                .map(|c| c.replace('\n', " "))
                .filter(|c| !c.trim().is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !line.is_empty() {
                lines.push(line);
            }
        }
        RawDocument {
            text: lines.join("\n"),
            table: if self.grid.is_empty() { None } else { Some(self.grid) },
        }
    }
}

fn val_attr(e: &BytesStart) -> Option<String> {
    e.attributes()
        .filter_map(Result::ok)
        .find(|a| a.key.local_name().as_ref() == b"val")
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Parse the main document part into text and a table grid.
pub fn parse_document_xml(xml: &str) -> Result<RawDocument, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut walker = BodyWalker::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => walker.start(&e),
            Ok(Event::Empty(e)) => walker.property(&e),
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default();
                walker.text(&text);
            }
            Ok(Event::End(e)) => walker.end(e.local_name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Docx(format!(
                    "Error parsing document.xml at {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(walker.finish())
}
