//! Sparse worksheet model and its OOXML rendering.
//!
//! Sheets are assembled cell-by-cell (value, formula, or styled blank)
//! and rendered into a complete worksheet part. Element order follows
//! the CT_Worksheet schema: dimension, sheetViews, cols, sheetData,
//! mergeCells, conditionalFormatting, dataValidations.

use std::collections::BTreeMap;

use crate::formula::{CellRange, CellRef};
use crate::styles::CellStyle;
use crate::types::CellContent;
use crate::xml::{write_cell_ref, xml_escape};

/// List-constrained input range with the prompt and error text shown by
/// the host application.
#[derive(Debug, Clone)]
pub struct ListValidation {
    pub range: CellRange,
    pub options: Vec<String>,
    pub prompt_title: String,
    pub prompt: String,
    pub error_title: String,
    pub error: String,
}

/// Expression-rule conditional format. The style becomes a dxf entry in
/// styles.xml; the formula re-evaluates per cell as the user edits.
#[derive(Debug, Clone)]
pub struct ConditionalFormat {
    pub range: CellRange,
    pub formula: String,
    pub style: CellStyle,
    pub priority: u32,
}

#[derive(Debug, Clone)]
struct Cell {
    content: CellContent,
    style: u32,
}

/// One worksheet under construction. Rows are 1-based, columns 0-based,
/// matching [`CellRef`].
pub struct Worksheet {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    column_widths: Vec<(u16, f64)>,
    merges: Vec<CellRange>,
    validations: Vec<ListValidation>,
    conditional_formats: Vec<ConditionalFormat>,
    /// Top-left cell of the scrollable pane when panes are frozen.
    freeze: Option<CellRef>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Worksheet {
            name: name.into(),
            cells: BTreeMap::new(),
            column_widths: Vec::new(),
            merges: Vec::new(),
            validations: Vec::new(),
            conditional_formats: Vec::new(),
            freeze: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_str(&mut self, at: CellRef, text: impl Into<String>, style: u32) {
        self.put(at, CellContent::Str(text.into()), style);
    }

    pub fn set_number(&mut self, at: CellRef, value: f64, style: u32) {
        self.put(at, CellContent::Number(value), style);
    }

    /// Formula text without a leading `=`.
    pub fn set_formula(&mut self, at: CellRef, formula: String, style: u32) {
        self.put(at, CellContent::Formula(formula), style);
    }

    /// Styled empty cell - keeps borders and fills visible on blank
    /// input rows.
    pub fn set_blank(&mut self, at: CellRef, style: u32) {
        self.put(at, CellContent::Empty, style);
    }

    fn put(&mut self, at: CellRef, content: CellContent, style: u32) {
        self.cells.insert((at.row, at.col), Cell { content, style });
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.push((col, width));
    }

    pub fn merge(&mut self, range: CellRange) {
        self.merges.push(range);
    }

    pub fn add_list_validation(&mut self, validation: ListValidation) {
        self.validations.push(validation);
    }

    pub fn add_conditional_format(&mut self, format: ConditionalFormat) {
        self.conditional_formats.push(format);
    }

    pub fn freeze_at(&mut self, top_left: CellRef) {
        self.freeze = Some(top_left);
    }

    pub fn conditional_formats(&self) -> &[ConditionalFormat] {
        &self.conditional_formats
    }

    /// Test hook: formula text at a cell, if any.
    #[cfg(test)]
    pub(crate) fn formula_at(&self, at: CellRef) -> Option<&str> {
        match self.cells.get(&(at.row, at.col)) {
            Some(Cell {
                content: CellContent::Formula(f),
                ..
            }) => Some(f),
            _ => None,
        }
    }

    /// Render the worksheet part. `dxf_ids` holds one styles.xml dxf id
    /// per conditional format, in insertion order; `selected` marks the
    /// tab active on open.
    pub fn to_xml(&self, selected: bool, dxf_ids: &[u32]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1024 + self.cells.len() * 48);
        let mut int_buf = itoa::Buffer::new();
        let mut ryu_buf = ryu::Buffer::new();

        buf.extend_from_slice(
            b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
        );

        // dimension
        buf.extend_from_slice(b"<dimension ref=\"A1");
        if let Some(((max_row, _), _)) = self.cells.iter().next_back() {
            let max_col = self.cells.keys().map(|&(_, c)| c).max().unwrap_or(0);
            buf.push(b':');
            write_cell_ref(max_col, *max_row, &mut buf);
        }
        buf.extend_from_slice(b"\"/>");

        // sheetViews, with a frozen pane when requested
        buf.extend_from_slice(b"<sheetViews><sheetView workbookViewId=\"0\"");
        if selected {
            buf.extend_from_slice(b" tabSelected=\"1\"");
        }
        if let Some(freeze) = self.freeze {
            buf.push(b'>');
            buf.extend_from_slice(b"<pane ");
            if freeze.col > 0 {
                buf.extend_from_slice(b"xSplit=\"");
                buf.extend_from_slice(int_buf.format(freeze.col).as_bytes());
                buf.extend_from_slice(b"\" ");
            }
            if freeze.row > 1 {
                buf.extend_from_slice(b"ySplit=\"");
                buf.extend_from_slice(int_buf.format(freeze.row - 1).as_bytes());
                buf.extend_from_slice(b"\" ");
            }
            buf.extend_from_slice(b"topLeftCell=\"");
            write_cell_ref(freeze.col, freeze.row, &mut buf);
            buf.extend_from_slice(b"\" activePane=\"bottomRight\" state=\"frozen\"/>");
            buf.extend_from_slice(b"</sheetView></sheetViews>");
        } else {
            buf.extend_from_slice(b"/></sheetViews>");
        }

        // cols
        if !self.column_widths.is_empty() {
            let mut widths = self.column_widths.clone();
            widths.sort_by_key(|&(col, _)| col);

            buf.extend_from_slice(b"<cols>");
            for (col, width) in widths {
                buf.extend_from_slice(b"<col min=\"");
                buf.extend_from_slice(int_buf.format(col + 1).as_bytes());
                buf.extend_from_slice(b"\" max=\"");
                buf.extend_from_slice(int_buf.format(col + 1).as_bytes());
                buf.extend_from_slice(b"\" width=\"");
                buf.extend_from_slice(ryu_buf.format(width).as_bytes());
                buf.extend_from_slice(b"\" customWidth=\"1\"/>");
            }
            buf.extend_from_slice(b"</cols>");
        }

        // sheetData
        buf.extend_from_slice(b"<sheetData>");
        let mut current_row: Option<u32> = None;
        for (&(row, col), cell) in &self.cells {
            if current_row != Some(row) {
                if current_row.is_some() {
                    buf.extend_from_slice(b"</row>");
                }
                buf.extend_from_slice(b"<row r=\"");
                buf.extend_from_slice(int_buf.format(row).as_bytes());
                buf.extend_from_slice(b"\">");
                current_row = Some(row);
            }
            write_cell(&mut buf, col, row, cell, &mut int_buf, &mut ryu_buf);
        }
        if current_row.is_some() {
            buf.extend_from_slice(b"</row>");
        }
        buf.extend_from_slice(b"</sheetData>");

        // mergeCells
        if !self.merges.is_empty() {
            buf.extend_from_slice(b"<mergeCells count=\"");
            buf.extend_from_slice(int_buf.format(self.merges.len()).as_bytes());
            buf.extend_from_slice(b"\">");
            for merge in &self.merges {
                buf.extend_from_slice(b"<mergeCell ref=\"");
                buf.extend_from_slice(merge.a1().as_bytes());
                buf.extend_from_slice(b"\"/>");
            }
            buf.extend_from_slice(b"</mergeCells>");
        }

        // conditionalFormatting
        for (idx, format) in self.conditional_formats.iter().enumerate() {
            let dxf_id = dxf_ids.get(idx).copied().unwrap_or(0);
            buf.extend_from_slice(b"<conditionalFormatting sqref=\"");
            buf.extend_from_slice(format.range.a1().as_bytes());
            buf.extend_from_slice(b"\"><cfRule type=\"expression\" dxfId=\"");
            buf.extend_from_slice(int_buf.format(dxf_id).as_bytes());
            buf.extend_from_slice(b"\" priority=\"");
            buf.extend_from_slice(int_buf.format(format.priority).as_bytes());
            buf.extend_from_slice(b"\"><formula>");
            xml_escape(format.formula.as_bytes(), &mut buf);
            buf.extend_from_slice(b"</formula></cfRule></conditionalFormatting>");
        }

        // dataValidations
        if !self.validations.is_empty() {
            buf.extend_from_slice(b"<dataValidations count=\"");
            buf.extend_from_slice(int_buf.format(self.validations.len()).as_bytes());
            buf.extend_from_slice(b"\">");
            for validation in &self.validations {
                buf.extend_from_slice(
                    b"<dataValidation type=\"list\" allowBlank=\"1\" \
showInputMessage=\"1\" showErrorMessage=\"1\" errorTitle=\"",
                );
                xml_escape(validation.error_title.as_bytes(), &mut buf);
                buf.extend_from_slice(b"\" error=\"");
                xml_escape(validation.error.as_bytes(), &mut buf);
                buf.extend_from_slice(b"\" promptTitle=\"");
                xml_escape(validation.prompt_title.as_bytes(), &mut buf);
                buf.extend_from_slice(b"\" prompt=\"");
                xml_escape(validation.prompt.as_bytes(), &mut buf);
                buf.extend_from_slice(b"\" sqref=\"");
                buf.extend_from_slice(validation.range.a1().as_bytes());
                buf.extend_from_slice(b"\"><formula1>\"");
                for (i, option) in validation.options.iter().enumerate() {
                    if i > 0 {
                        buf.push(b',');
                    }
                    xml_escape(option.as_bytes(), &mut buf);
                }
                buf.extend_from_slice(b"\"</formula1></dataValidation>");
            }
            buf.extend_from_slice(b"</dataValidations>");
        }

        buf.extend_from_slice(b"</worksheet>");
        buf
    }
}

fn write_cell(
    buf: &mut Vec<u8>,
    col: u16,
    row: u32,
    cell: &Cell,
    int_buf: &mut itoa::Buffer,
    ryu_buf: &mut ryu::Buffer,
) {
    buf.extend_from_slice(b"<c r=\"");
    write_cell_ref(col, row, buf);
    if cell.style > 0 {
        buf.extend_from_slice(b"\" s=\"");
        buf.extend_from_slice(int_buf.format(cell.style).as_bytes());
    }

    match &cell.content {
        CellContent::Empty => {
            buf.extend_from_slice(b"\"/>");
        }
        CellContent::Str(s) => {
            buf.extend_from_slice(b"\" t=\"inlineStr\"><is><t>");
            xml_escape(s.as_bytes(), buf);
            buf.extend_from_slice(b"</t></is></c>");
        }
        CellContent::Number(n) => {
            buf.extend_from_slice(b"\"><v>");
            let abs = n.abs();
            if n.fract() == 0.0 && abs < 9007199254740992.0 {
                buf.extend_from_slice(int_buf.format(*n as i64).as_bytes());
            } else {
                buf.extend_from_slice(ryu_buf.format(*n).as_bytes());
            }
            buf.extend_from_slice(b"</v></c>");
        }
        CellContent::Formula(f) => {
            buf.extend_from_slice(b"\"><f>");
            xml_escape(f.as_bytes(), buf);
            buf.extend_from_slice(b"</f></c>");
        }
    }
}
