//! PDF table reader.
//!
//! Only the first page is examined and only the first table found on it is
//! used. The page content stream is replayed to place every shown string at
//! its text-space origin. Fragments sharing a baseline form a line, and a run
//! of at least two consecutive lines that each yield two or more cells forms
//! one table. Cells come from the x positions of separate fragments, or, for a
//! line drawn as a single string, from tabs, runs of two or more spaces and
//! `|` rules inside it.

use std::path::Path;

use anyhow::{Context, Result, anyhow, ensure};
use encoding_rs::{UTF_16BE, WINDOWS_1252};
use lopdf::{
    Document, Object,
    content::{Content, Operation},
};
use log::{debug, info};
use regex::Regex;

use crate::{data::Cell, table::UniformTable};

const CELL_SEPARATOR_PATTERN: &str = r"\s*\|\s*|\t+|\s{2,}";
const MIN_TABLE_LINES: usize = 2;
/// Baselines closer than this (in points) belong to one line.
const LINE_TOLERANCE: f64 = 3.0;
/// Fragment starts closer than this (in points) belong to one column.
const COLUMN_TOLERANCE: f64 = 5.0;
/// `TJ` adjustments below this (thousandths of an em) read as a word gap.
const TJ_SPACE_THRESHOLD: f64 = -200.0;

/// Cells as detected on the page. `None` marks a cell with no text object.
pub type RawTable = Vec<Vec<Option<String>>>;

/// A string shown on the page, positioned at its origin in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

impl TextFragment {
    pub fn new(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
        }
    }
}

pub fn read_pdf_table(path: &Path) -> Result<UniformTable> {
    let tables = extract_first_page_tables(path)?;
    let first = tables
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No tables found on the first page"))?;
    let table = build_table(first)?;
    info!(
        "Extracted {} row(s) x {} column(s) from {:?}",
        table.row_count(),
        table.column_count(),
        path
    );
    Ok(table)
}

pub fn extract_first_page_tables(path: &Path) -> Result<Vec<RawTable>> {
    let document = Document::load(path).with_context(|| format!("Opening PDF {path:?}"))?;
    let pages = document.get_pages();
    let (page_number, page_id) = pages
        .iter()
        .next()
        .map(|(number, id)| (*number, *id))
        .ok_or_else(|| anyhow!("PDF contains no pages"))?;
    debug!("{:?} has {} page(s); reading page {}", path, pages.len(), page_number);

    let bytes = document
        .get_page_content(page_id)
        .with_context(|| format!("Reading content of page {page_number}"))?;
    let content = Content::decode(&bytes)
        .with_context(|| format!("Decoding content of page {page_number}"))?;
    let fragments = layout_fragments(&content.operations);
    debug!("Page {} shows {} text fragment(s)", page_number, fragments.len());

    let tables = detect_positioned_tables(&fragments)?;
    if !tables.is_empty() || fragments.is_empty() {
        return Ok(tables);
    }
    // strings in font encodings we cannot decode; let lopdf try the text layer
    let text = document
        .extract_text(&[page_number])
        .with_context(|| format!("Extracting text from page {page_number}"))?;
    detect_tables(&text)
}

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(lhs: &Matrix, rhs: &Matrix) -> Matrix {
    [
        lhs[0] * rhs[0] + lhs[1] * rhs[2],
        lhs[0] * rhs[1] + lhs[1] * rhs[3],
        lhs[2] * rhs[0] + lhs[3] * rhs[2],
        lhs[2] * rhs[1] + lhs[3] * rhs[3],
        lhs[4] * rhs[0] + lhs[5] * rhs[2] + rhs[4],
        lhs[4] * rhs[1] + lhs[5] * rhs[3] + rhs[5],
    ]
}

fn translation(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Text state tracked while replaying a content stream.
struct TextCursor {
    ctm: Matrix,
    saved: Vec<Matrix>,
    line_matrix: Matrix,
    text_matrix: Matrix,
    leading: f64,
    /// Set when the cursor moved since the last shown string.
    moved: bool,
}

impl TextCursor {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            saved: Vec::new(),
            line_matrix: IDENTITY,
            text_matrix: IDENTITY,
            leading: 0.0,
            moved: true,
        }
    }

    fn set_line(&mut self, matrix: Matrix) {
        self.line_matrix = matrix;
        self.text_matrix = matrix;
        self.moved = true;
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.set_line(multiply(&translation(tx, ty), &self.line_matrix));
    }

    fn origin(&self) -> (f64, f64) {
        let placed = multiply(&self.text_matrix, &self.ctm);
        (placed[4], placed[5])
    }

    fn show(&mut self, text: String, fragments: &mut Vec<TextFragment>) {
        if text.is_empty() {
            return;
        }
        match fragments.last_mut() {
            Some(last) if !self.moved => last.text.push_str(&text),
            _ => {
                let (x, y) = self.origin();
                fragments.push(TextFragment::new(x, y, text));
            }
        }
        self.moved = false;
    }
}

/// Replays text-positioning and text-showing operators, returning every shown
/// string at its page-space origin. Strings shown back to back without any
/// repositioning are merged into one fragment.
pub fn layout_fragments(operations: &[Operation]) -> Vec<TextFragment> {
    let mut cursor = TextCursor::new();
    let mut fragments = Vec::new();

    for operation in operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "q" => cursor.saved.push(cursor.ctm),
            "Q" => cursor.ctm = cursor.saved.pop().unwrap_or(IDENTITY),
            "cm" => {
                if let Some(matrix) = matrix_operand(operands) {
                    cursor.ctm = multiply(&matrix, &cursor.ctm);
                }
            }
            "BT" => cursor.set_line(IDENTITY),
            "Tm" => {
                if let Some(matrix) = matrix_operand(operands) {
                    cursor.set_line(matrix);
                }
            }
            "Td" => {
                if let [tx, ty] = numbers(operands)[..] {
                    cursor.next_line(tx, ty);
                }
            }
            "TD" => {
                if let [tx, ty] = numbers(operands)[..] {
                    cursor.leading = -ty;
                    cursor.next_line(tx, ty);
                }
            }
            "TL" => {
                if let [leading] = numbers(operands)[..] {
                    cursor.leading = leading;
                }
            }
            "T*" => cursor.next_line(0.0, -cursor.leading),
            "Tj" => {
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    cursor.show(decode_pdf_string(bytes), &mut fragments);
                }
            }
            "'" => {
                cursor.next_line(0.0, -cursor.leading);
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    cursor.show(decode_pdf_string(bytes), &mut fragments);
                }
            }
            "\"" => {
                cursor.next_line(0.0, -cursor.leading);
                if let Some(bytes) = operands.get(2).and_then(string_bytes) {
                    cursor.show(decode_pdf_string(bytes), &mut fragments);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    cursor.show(join_tj_array(items), &mut fragments);
                }
            }
            _ => {}
        }
    }
    fragments
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

fn numbers(operands: &[Object]) -> Vec<f64> {
    operands.iter().filter_map(number).collect()
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    match numbers(operands)[..] {
        [a, b, c, d, e, f] => Some([a, b, c, d, e, f]),
        _ => None,
    }
}

fn string_bytes(object: &Object) -> Option<&[u8]> {
    match object {
        Object::String(bytes, _) => Some(bytes),
        _ => None,
    }
}

fn join_tj_array(items: &[Object]) -> String {
    let mut text = String::new();
    for item in items {
        if let Some(bytes) = string_bytes(item) {
            text.push_str(&decode_pdf_string(bytes));
        } else if number(item).is_some_and(|gap| gap < TJ_SPACE_THRESHOLD) && !text.ends_with(' ')
        {
            text.push(' ');
        }
    }
    text
}

/// Decodes a shown string: UTF-16BE when it carries a byte order mark,
/// otherwise the single-byte standard encoding.
fn decode_pdf_string(bytes: &[u8]) -> String {
    let (text, _) = match bytes {
        [0xFE, 0xFF, rest @ ..] => UTF_16BE.decode_without_bom_handling(rest),
        _ => WINDOWS_1252.decode_without_bom_handling(bytes),
    };
    text.into_owned()
}

/// Groups fragments into lines, top to bottom, each line ordered left to
/// right.
pub fn group_lines(fragments: &[TextFragment]) -> Vec<Vec<&TextFragment>> {
    let mut ordered: Vec<&TextFragment> = fragments
        .iter()
        .filter(|fragment| !fragment.text.trim().is_empty())
        .collect();
    ordered.sort_by(|a, b| b.y.total_cmp(&a.y));

    let mut lines: Vec<Vec<&TextFragment>> = Vec::new();
    for fragment in ordered {
        match lines.last_mut() {
            Some(line) if (line[0].y - fragment.y).abs() <= LINE_TOLERANCE => line.push(fragment),
            _ => lines.push(vec![fragment]),
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    lines
}

/// Finds tables in positioned page text.
///
/// Lines drawn as one string are split like plain text. Lines made of several
/// fragments are aligned on column anchors shared by the whole table, so a
/// cell with no text object comes out as `None`.
pub fn detect_positioned_tables(fragments: &[TextFragment]) -> Result<Vec<RawTable>> {
    let separator = Regex::new(CELL_SEPARATOR_PATTERN)?;
    let mut tables = Vec::new();
    let mut current: Vec<Vec<&TextFragment>> = Vec::new();

    for line in group_lines(fragments) {
        let is_row = match line.as_slice() {
            [single] => split_row(&single.text, &separator).len() >= 2,
            cells => cells.len() >= 2,
        };
        if is_row {
            current.push(line);
            continue;
        }
        if current.len() >= MIN_TABLE_LINES {
            tables.push(align_rows(&std::mem::take(&mut current), &separator));
        } else {
            current.clear();
        }
    }
    if current.len() >= MIN_TABLE_LINES {
        tables.push(align_rows(&current, &separator));
    }
    debug!("Detected {} positioned table(s)", tables.len());
    Ok(tables)
}

fn align_rows(lines: &[Vec<&TextFragment>], separator: &Regex) -> RawTable {
    let anchors = column_anchors(
        lines
            .iter()
            .filter(|line| line.len() >= 2)
            .flatten()
            .map(|fragment| fragment.x)
            .collect(),
    );
    lines
        .iter()
        .map(|line| match line.as_slice() {
            [single] => split_row(&single.text, separator),
            fragments => {
                let mut cells: Vec<Option<String>> = vec![None; anchors.len()];
                for fragment in fragments {
                    let slot = anchors
                        .iter()
                        .rposition(|start| *start <= fragment.x + COLUMN_TOLERANCE)
                        .unwrap_or(0);
                    let text = fragment.text.trim();
                    match &mut cells[slot] {
                        Some(existing) => {
                            existing.push(' ');
                            existing.push_str(text);
                        }
                        empty => *empty = Some(text.to_string()),
                    }
                }
                cells
            }
        })
        .collect()
}

/// Left edges of the columns, one per cluster of fragment starts.
fn column_anchors(mut starts: Vec<f64>) -> Vec<f64> {
    starts.sort_by(f64::total_cmp);
    let mut anchors: Vec<f64> = Vec::new();
    let mut previous: Option<f64> = None;
    for x in starts {
        if previous.is_none_or(|last| x - last > COLUMN_TOLERANCE) {
            anchors.push(x);
        }
        previous = Some(x);
    }
    anchors
}

/// Finds tables in extracted plain text, one page line per text line.
pub fn detect_tables(text: &str) -> Result<Vec<RawTable>> {
    let separator = Regex::new(CELL_SEPARATOR_PATTERN)?;
    let mut tables = Vec::new();
    let mut current: RawTable = Vec::new();

    for line in text.lines() {
        let cells = split_row(line, &separator);
        if cells.len() >= 2 {
            current.push(cells);
            continue;
        }
        if current.len() >= MIN_TABLE_LINES {
            tables.push(std::mem::take(&mut current));
        } else {
            current.clear();
        }
    }
    if current.len() >= MIN_TABLE_LINES {
        tables.push(current);
    }
    debug!("Detected {} table(s) in page text", tables.len());
    Ok(tables)
}

fn split_row(line: &str, separator: &Regex) -> Vec<Option<String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    separator
        .split(trimmed)
        .map(|cell| Some(cell.trim().to_string()))
        .collect()
}

/// Normalizes one detected table:
///
/// 1. rows whose cells are all missing or blank are dropped;
/// 2. at least a header and one data row must remain;
/// 3. the first row becomes the header, missing header cells named `Column_<i>`;
/// 4. data rows are padded or truncated to the header width;
/// 5. blank-header columns, then all-empty rows and columns, are dropped.
pub fn build_table(raw: RawTable) -> Result<UniformTable> {
    ensure!(!raw.is_empty(), "The first table is empty");
    let mut rows: RawTable = raw
        .into_iter()
        .filter(|row| row.iter().any(|cell| cell.as_deref().is_some_and(|c| !c.trim().is_empty())))
        .collect();
    ensure!(
        rows.len() >= 2,
        "The table has too little data (a header and at least one row are required)"
    );

    let data_rows = rows.split_off(1);
    let headers: Vec<String> = rows
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(idx, cell)| match cell {
            Some(text) => text.trim().to_string(),
            None => format!("Column_{idx}"),
        })
        .collect();

    let mut table = UniformTable::new(headers);
    for row in data_rows {
        table.push_row(
            row.into_iter()
                .map(|cell| match cell {
                    Some(text) if !text.trim().is_empty() => Cell::Text(text.trim().to_string()),
                    _ => Cell::Empty,
                })
                .collect(),
        );
    }

    table.retain_columns(|_, name| !name.trim().is_empty());
    table.retain_rows(|row| row.iter().any(|cell| !cell.is_missing()));
    let populated: Vec<bool> = (0..table.column_count())
        .map(|idx| table.non_missing(idx).next().is_some())
        .collect();
    table.retain_columns(|idx, _| populated[idx]);

    ensure!(!table.is_empty(), "The table is empty after cleanup");
    Ok(table)
}
