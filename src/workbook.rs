//! The three sheets of the market survey workbook and the public
//! generation entry point.
//!
//! Layout (columns 0-based internally, shown as letters here):
//! column A is a 3-wide spacer on every sheet. Entry grid: B property,
//! C floorplan, D bedrooms, E units, F prelease %, then the derived
//! G effective %, H total beds, I leased beds. The report mirrors the
//! same rows one row lower: B property, C floorplan, D beds/unit,
//! E total beds, F prelease %, G leased beds.

use std::path::Path;

use crate::formula::{self, CellRange, CellRef, MarketRefs};
use crate::sheet::{ConditionalFormat, ListValidation, Worksheet};
use crate::styles::{AlignmentStyle, CellStyle, NumberFormat, Palette, StyleRegistry};
use crate::types::{Bedroom, SampleRow, WorkbookError};
use crate::writer;

pub const MARKET_SHEET: &str = "Market Averages";
pub const ENTRY_SHEET: &str = "Property Data";
pub const REPORT_SHEET: &str = "Leased Beds Report";

/// Number of data-entry rows laid out on the entry sheet (and mirrored
/// on the report sheet).
pub const ENTRY_ROW_CAPACITY: u32 = 100;

const ENTRY_FIRST_ROW: u32 = 7;
const ENTRY_LAST_ROW: u32 = ENTRY_FIRST_ROW + ENTRY_ROW_CAPACITY - 1;

// Report rows sit one below their entry rows; totals leave a gap below
// the mirrored block.
const REPORT_FIRST_ROW: u32 = ENTRY_FIRST_ROW + 1;
const REPORT_LAST_ROW: u32 = ENTRY_LAST_ROW + 1;
const REPORT_TOTALS_ROW: u32 = 110;
const REPORT_OVERALL_ROW: u32 = REPORT_TOTALS_ROW + 2;

// Entry sheet columns.
const COL_PROPERTY: u16 = 1;
const COL_FLOORPLAN: u16 = 2;
const COL_BEDROOMS: u16 = 3;
const COL_UNITS: u16 = 4;
const COL_PRELEASE: u16 = 5;
const COL_EFFECTIVE: u16 = 6;
const COL_TOTAL_BEDS: u16 = 7;
const COL_LEASED_BEDS: u16 = 8;

// Report sheet columns.
const RCOL_PROPERTY: u16 = 1;
const RCOL_FLOORPLAN: u16 = 2;
const RCOL_BEDS_PER_UNIT: u16 = 3;
const RCOL_TOTAL_BEDS: u16 = 4;
const RCOL_PRELEASE: u16 = 5;
const RCOL_LEASED_BEDS: u16 = 6;

const SPACER_WIDTH: f64 = 3.0;

/// Generate the workbook at `path`, overwriting any existing file.
///
/// Progress is reported on stdout; suppressing it loses nothing but the
/// narration. `include_sample_data` seeds the entry sheet with the
/// bundled 15-row demonstration dataset.
pub fn generate_workbook(path: &Path, include_sample_data: bool) -> Result<(), WorkbookError> {
    println!("Creating Market Survey Analysis Tool...");

    let palette = Palette::new();
    let mut registry = StyleRegistry::new();

    println!("  Setting up Market Averages sheet...");
    let (market, market_refs) = build_market_sheet(&palette, &mut registry);

    println!("  Setting up Property Data sheet...");
    let sample = sample_rows();
    let entry = build_entry_sheet(
        &palette,
        &mut registry,
        &market_refs,
        include_sample_data.then_some(sample.as_slice()),
    );
    if include_sample_data {
        println!("  Adding sample data...");
    }

    println!("  Setting up Leased Beds Report sheet...");
    let report = build_report_sheet(&palette, &mut registry);

    println!("  Saving to {}...", path.display());
    // Sheet order is contractual: formulas cross-reference by name, and
    // the entry sheet (index 1) is the active tab on open.
    writer::write_workbook(&[market, entry, report], registry, 1, path)?;

    println!("\nSuccess! Created {}", path.display());
    println!("\nHow to use:");
    println!("  1. Open 'Market Averages' sheet to set your market default prelease %");
    println!("  2. Enter property/floorplan data in 'Property Data' sheet");
    println!("  3. View calculated results in 'Leased Beds Report' sheet");
    println!("\nTip: Rows highlighted in yellow are using market averages (no property-specific % entered)");

    Ok(())
}

/// The bundled demonstration dataset: three properties, fifteen
/// floorplans, exercising both the explicit-percentage and the
/// market-average-fallback paths.
pub fn sample_rows() -> Vec<SampleRow> {
    use Bedroom::*;

    let row = |property, floorplan, bedroom, units, prelease| SampleRow {
        property,
        floorplan,
        bedroom,
        units,
        prelease,
    };

    vec![
        row("The Heights", "Studio Deluxe", Studio, 24, Some(0.52)),
        row("The Heights", "A1", OneBr, 36, Some(0.52)),
        row("The Heights", "B1", TwoBr, 48, Some(0.52)),
        row("The Heights", "B2 Premium", TwoBr, 24, Some(0.52)),
        row("The Heights", "C1", ThreeBr, 32, Some(0.52)),
        row("University Village", "Efficiency", Studio, 20, None),
        row("University Village", "One Bed", OneBr, 40, None),
        row("University Village", "Two Bed A", TwoBr, 60, None),
        row("University Village", "Two Bed B", TwoBr, 30, None),
        row("University Village", "Three Bed", ThreeBr, 48, None),
        row("University Village", "Four Bed", FourBr, 24, None),
        row("Campus Edge", "Studio", Studio, 16, Some(0.48)),
        row("Campus Edge", "1BR Classic", OneBr, 32, Some(0.48)),
        row("Campus Edge", "2BR Standard", TwoBr, 40, Some(0.48)),
        row("Campus Edge", "3BR Townhome", ThreeBr, 20, Some(0.48)),
    ]
}

/// Register a style and its alternating-row variant (same style with
/// the banding fill). Indexed by `row_is_banded as usize`.
fn striped(registry: &mut StyleRegistry, palette: &Palette, style: &CellStyle) -> [u32; 2] {
    let banded = CellStyle {
        fill: Some(palette.alt_row_fill.clone()),
        ..style.clone()
    };
    [
        registry.register_cell_style(style),
        registry.register_cell_style(&banded),
    ]
}

fn title_style(registry: &mut StyleRegistry, palette: &Palette) -> u32 {
    registry.register_cell_style(&CellStyle {
        font: Some(palette.title_font.clone()),
        ..Default::default()
    })
}

fn note_style(registry: &mut StyleRegistry, palette: &Palette) -> u32 {
    registry.register_cell_style(&CellStyle {
        font: Some(palette.note_font.clone()),
        ..Default::default()
    })
}

fn header_style(registry: &mut StyleRegistry, palette: &Palette, wrap: bool) -> u32 {
    registry.register_cell_style(&CellStyle {
        font: Some(palette.header_font.clone()),
        fill: Some(palette.header_fill.clone()),
        border: Some(palette.thin_border.clone()),
        alignment: Some(AlignmentStyle {
            wrap_text: wrap,
            ..AlignmentStyle::center_center()
        }),
        ..Default::default()
    })
}

struct MarketStyles {
    title: u32,
    note: u32,
    header: u32,
    label: [u32; 2],
    percent: [u32; 2],
}

fn market_styles(palette: &Palette, registry: &mut StyleRegistry) -> MarketStyles {
    let base = CellStyle {
        font: Some(palette.body_font.clone()),
        border: Some(palette.thin_border.clone()),
        alignment: Some(AlignmentStyle::center_center()),
        ..Default::default()
    };
    let percent = CellStyle {
        number_format: Some(NumberFormat::PercentTenths),
        ..base.clone()
    };

    MarketStyles {
        title: title_style(registry, palette),
        note: note_style(registry, palette),
        header: header_style(registry, palette, false),
        label: striped(registry, palette, &base),
        percent: striped(registry, palette, &percent),
    }
}

/// Lay out the market-average table and hand back the coordinates of
/// its editable cells.
fn build_market_sheet(palette: &Palette, registry: &mut StyleRegistry) -> (Worksheet, MarketRefs) {
    let styles = market_styles(palette, registry);
    let mut ws = Worksheet::new(MARKET_SHEET);

    ws.set_str(
        CellRef::new(1, 2),
        "Market Average Prelease Percentages",
        styles.title,
    );
    ws.merge(CellRange::new(CellRef::new(1, 2), CellRef::new(2, 2)));

    ws.set_str(
        CellRef::new(1, 4),
        "Enter the market average prelease % for each bedroom type below.",
        styles.note,
    );
    ws.merge(CellRange::new(CellRef::new(1, 4), CellRef::new(3, 4)));

    ws.set_str(CellRef::new(1, 6), "Bedroom Type", styles.header);
    ws.set_str(CellRef::new(2, 6), "Prelease %", styles.header);

    let mut cells = [CellRef::new(0, 0); 6];
    for (i, bedroom) in Bedroom::ALL.into_iter().enumerate() {
        let row = 7 + i as u32;
        let alt = (row % 2 == 1) as usize;

        ws.set_str(CellRef::new(1, row), bedroom.label(), styles.label[alt]);

        let value_cell = CellRef::new(2, row);
        ws.set_number(value_cell, bedroom.default_market_average(), styles.percent[alt]);
        cells[bedroom.index()] = value_cell;
    }

    ws.set_column_width(0, SPACER_WIDTH);
    ws.set_column_width(1, 18.0);
    ws.set_column_width(2, 15.0);

    (ws, MarketRefs::new(MARKET_SHEET, cells))
}

struct EntryStyles {
    title: u32,
    note: u32,
    header: u32,
    text: [u32; 2],
    center: [u32; 2],
    percent: [u32; 2],
    bold_center: [u32; 2],
}

fn entry_styles(palette: &Palette, registry: &mut StyleRegistry) -> EntryStyles {
    let text = CellStyle {
        font: Some(palette.body_font.clone()),
        border: Some(palette.thin_border.clone()),
        ..Default::default()
    };
    let center = CellStyle {
        alignment: Some(AlignmentStyle::center()),
        ..text.clone()
    };
    let percent = CellStyle {
        number_format: Some(NumberFormat::PercentTenths),
        ..center.clone()
    };
    let bold_center = CellStyle {
        font: Some(palette.bold_font.clone()),
        ..center.clone()
    };

    EntryStyles {
        title: title_style(registry, palette),
        note: note_style(registry, palette),
        header: header_style(registry, palette, true),
        text: striped(registry, palette, &text),
        center: striped(registry, palette, &center),
        percent: striped(registry, palette, &percent),
        bold_center: striped(registry, palette, &bold_center),
    }
}

/// Lay out the data-entry grid: five input columns, three derived
/// formula columns, the bedroom dropdown, and the market-average
/// fallback highlight.
fn build_entry_sheet(
    palette: &Palette,
    registry: &mut StyleRegistry,
    market: &MarketRefs,
    sample: Option<&[SampleRow]>,
) -> Worksheet {
    let styles = entry_styles(palette, registry);
    let mut ws = Worksheet::new(ENTRY_SHEET);

    ws.set_str(
        CellRef::new(1, 2),
        "Property & Floorplan Data Entry",
        styles.title,
    );
    ws.merge(CellRange::new(CellRef::new(1, 2), CellRef::new(6, 2)));

    ws.set_str(
        CellRef::new(1, 4),
        "Enter property data below. Leave 'Prelease %' blank to use market averages.",
        styles.note,
    );
    ws.merge(CellRange::new(CellRef::new(1, 4), CellRef::new(6, 4)));

    let headers: [(&str, f64); 8] = [
        ("Property Name", 25.0),
        ("Floorplan Name", 20.0),
        ("Bedrooms", 12.0),
        ("Units", 10.0),
        ("Prelease %", 12.0),
        ("Effective %", 12.0),
        ("Total Beds", 12.0),
        ("Leased Beds", 12.0),
    ];
    for (i, (header, width)) in headers.into_iter().enumerate() {
        let col = COL_PROPERTY + i as u16;
        ws.set_str(CellRef::new(col, 6), header, styles.header);
        ws.set_column_width(col, width);
    }
    ws.set_column_width(0, SPACER_WIDTH);

    for row in ENTRY_FIRST_ROW..=ENTRY_LAST_ROW {
        let alt = (row % 2 == 1) as usize;
        let data = sample.and_then(|rows| rows.get((row - ENTRY_FIRST_ROW) as usize));

        match data {
            Some(sample_row) => {
                ws.set_str(CellRef::new(COL_PROPERTY, row), sample_row.property, styles.text[alt]);
                ws.set_str(
                    CellRef::new(COL_FLOORPLAN, row),
                    sample_row.floorplan,
                    styles.text[alt],
                );
                ws.set_str(
                    CellRef::new(COL_BEDROOMS, row),
                    sample_row.bedroom.label(),
                    styles.center[alt],
                );
                ws.set_number(
                    CellRef::new(COL_UNITS, row),
                    sample_row.units as f64,
                    styles.center[alt],
                );
                match sample_row.prelease {
                    Some(pct) => ws.set_number(CellRef::new(COL_PRELEASE, row), pct, styles.percent[alt]),
                    None => ws.set_blank(CellRef::new(COL_PRELEASE, row), styles.percent[alt]),
                }
            }
            None => {
                ws.set_blank(CellRef::new(COL_PROPERTY, row), styles.text[alt]);
                ws.set_blank(CellRef::new(COL_FLOORPLAN, row), styles.text[alt]);
                ws.set_blank(CellRef::new(COL_BEDROOMS, row), styles.center[alt]);
                ws.set_blank(CellRef::new(COL_UNITS, row), styles.center[alt]);
                ws.set_blank(CellRef::new(COL_PRELEASE, row), styles.percent[alt]);
            }
        }

        ws.set_formula(
            CellRef::new(COL_EFFECTIVE, row),
            formula::effective_percent(row, COL_BEDROOMS, COL_PRELEASE, market),
            styles.percent[alt],
        );
        ws.set_formula(
            CellRef::new(COL_TOTAL_BEDS, row),
            formula::total_beds(row, COL_BEDROOMS, COL_UNITS),
            styles.center[alt],
        );
        ws.set_formula(
            CellRef::new(COL_LEASED_BEDS, row),
            formula::leased_beds(row, COL_TOTAL_BEDS, COL_EFFECTIVE),
            styles.bold_center[alt],
        );
    }

    ws.add_list_validation(ListValidation {
        range: CellRange::new(
            CellRef::new(COL_BEDROOMS, ENTRY_FIRST_ROW),
            CellRef::new(COL_BEDROOMS, ENTRY_LAST_ROW),
        ),
        options: Bedroom::ALL.iter().map(|b| b.label().to_string()).collect(),
        prompt_title: "Bedrooms".to_string(),
        prompt: "Select bedroom type".to_string(),
        error_title: "Invalid Entry".to_string(),
        error: "Please select a valid bedroom type".to_string(),
    });

    ws.add_conditional_format(ConditionalFormat {
        range: CellRange::new(
            CellRef::new(COL_PROPERTY, ENTRY_FIRST_ROW),
            CellRef::new(COL_LEASED_BEDS, ENTRY_LAST_ROW),
        ),
        formula: formula::market_flag_rule(ENTRY_FIRST_ROW, COL_BEDROOMS, COL_PRELEASE),
        style: CellStyle {
            fill: Some(palette.market_flag_fill.clone()),
            ..Default::default()
        },
        priority: 1,
    });

    ws.freeze_at(CellRef::new(COL_PROPERTY, ENTRY_FIRST_ROW));
    ws
}

struct ReportStyles {
    title: u32,
    date: u32,
    note: u32,
    header: u32,
    text: [u32; 2],
    center: [u32; 2],
    percent: [u32; 2],
    bold_center: [u32; 2],
    totals_label: u32,
    totals_value: u32,
    overall_value: u32,
}

fn report_styles(palette: &Palette, registry: &mut StyleRegistry) -> ReportStyles {
    let text = CellStyle {
        font: Some(palette.body_font.clone()),
        border: Some(palette.thin_border.clone()),
        ..Default::default()
    };
    let center = CellStyle {
        alignment: Some(AlignmentStyle::center()),
        ..text.clone()
    };
    let percent = CellStyle {
        number_format: Some(NumberFormat::PercentTenths),
        ..center.clone()
    };
    let bold_center = CellStyle {
        font: Some(palette.bold_font.clone()),
        ..center.clone()
    };

    ReportStyles {
        title: title_style(registry, palette),
        date: registry.register_cell_style(&CellStyle {
            font: Some(palette.note_font.clone()),
            number_format: Some(NumberFormat::LongDate),
            ..Default::default()
        }),
        note: note_style(registry, palette),
        header: header_style(registry, palette, false),
        text: striped(registry, palette, &text),
        center: striped(registry, palette, &center),
        percent: striped(registry, palette, &percent),
        bold_center: striped(registry, palette, &bold_center),
        totals_label: registry.register_cell_style(&CellStyle {
            font: Some(palette.accent_label_font.clone()),
            ..Default::default()
        }),
        totals_value: registry.register_cell_style(&CellStyle {
            font: Some(palette.totals_font.clone()),
            fill: Some(palette.light_accent_fill.clone()),
            border: Some(palette.thin_border.clone()),
            alignment: Some(AlignmentStyle::center()),
            ..Default::default()
        }),
        overall_value: registry.register_cell_style(&CellStyle {
            font: Some(palette.overall_font.clone()),
            number_format: Some(NumberFormat::PercentTenths),
            ..Default::default()
        }),
    }
}

/// Lay out the read-only report: mirrors of the entry rows, a
/// recomputed beds-per-unit column, and the totals block.
fn build_report_sheet(palette: &Palette, registry: &mut StyleRegistry) -> Worksheet {
    let styles = report_styles(palette, registry);
    let mut ws = Worksheet::new(REPORT_SHEET);

    ws.set_str(CellRef::new(1, 2), "Leased Beds Summary Report", styles.title);
    ws.merge(CellRange::new(CellRef::new(1, 2), CellRef::new(5, 2)));

    ws.set_formula(CellRef::new(1, 3), "TODAY()".to_string(), styles.date);

    ws.set_str(
        CellRef::new(1, 5),
        "This report auto-updates from Property Data. Copy this table for your reports.",
        styles.note,
    );
    ws.merge(CellRange::new(CellRef::new(1, 5), CellRef::new(5, 5)));

    let headers: [(&str, f64); 6] = [
        ("Property Name", 25.0),
        ("Floorplan", 18.0),
        ("Beds/Unit", 12.0),
        ("Total Beds", 12.0),
        ("Prelease %", 12.0),
        ("Leased Beds", 12.0),
    ];
    for (i, (header, width)) in headers.into_iter().enumerate() {
        let col = RCOL_PROPERTY + i as u16;
        ws.set_str(CellRef::new(col, 7), header, styles.header);
        ws.set_column_width(col, width);
    }
    ws.set_column_width(0, SPACER_WIDTH);

    for row in REPORT_FIRST_ROW..=REPORT_LAST_ROW {
        let entry_row = row - 1;
        let alt = (row % 2 == 0) as usize;

        ws.set_formula(
            CellRef::new(RCOL_PROPERTY, row),
            formula::mirror(ENTRY_SHEET, CellRef::new(COL_PROPERTY, entry_row)),
            styles.text[alt],
        );
        ws.set_formula(
            CellRef::new(RCOL_FLOORPLAN, row),
            formula::mirror(ENTRY_SHEET, CellRef::new(COL_FLOORPLAN, entry_row)),
            styles.text[alt],
        );
        ws.set_formula(
            CellRef::new(RCOL_BEDS_PER_UNIT, row),
            formula::report_beds_per_unit(ENTRY_SHEET, CellRef::new(COL_BEDROOMS, entry_row)),
            styles.center[alt],
        );
        ws.set_formula(
            CellRef::new(RCOL_TOTAL_BEDS, row),
            formula::mirror(ENTRY_SHEET, CellRef::new(COL_TOTAL_BEDS, entry_row)),
            styles.center[alt],
        );
        ws.set_formula(
            CellRef::new(RCOL_PRELEASE, row),
            formula::mirror(ENTRY_SHEET, CellRef::new(COL_EFFECTIVE, entry_row)),
            styles.percent[alt],
        );
        ws.set_formula(
            CellRef::new(RCOL_LEASED_BEDS, row),
            formula::mirror(ENTRY_SHEET, CellRef::new(COL_LEASED_BEDS, entry_row)),
            styles.bold_center[alt],
        );
    }

    ws.set_str(CellRef::new(1, REPORT_TOTALS_ROW), "TOTALS", styles.totals_label);
    ws.set_formula(
        CellRef::new(RCOL_TOTAL_BEDS, REPORT_TOTALS_ROW),
        formula::sum_nonblank(CellRange::new(
            CellRef::new(RCOL_TOTAL_BEDS, REPORT_FIRST_ROW),
            CellRef::new(RCOL_TOTAL_BEDS, REPORT_LAST_ROW),
        )),
        styles.totals_value,
    );
    ws.set_formula(
        CellRef::new(RCOL_LEASED_BEDS, REPORT_TOTALS_ROW),
        formula::sum_nonblank(CellRange::new(
            CellRef::new(RCOL_LEASED_BEDS, REPORT_FIRST_ROW),
            CellRef::new(RCOL_LEASED_BEDS, REPORT_LAST_ROW),
        )),
        styles.totals_value,
    );

    ws.set_str(
        CellRef::new(1, REPORT_OVERALL_ROW),
        "Overall Prelease:",
        styles.totals_label,
    );
    ws.set_formula(
        CellRef::new(2, REPORT_OVERALL_ROW),
        formula::overall_percent(
            CellRef::new(RCOL_TOTAL_BEDS, REPORT_TOTALS_ROW),
            CellRef::new(RCOL_LEASED_BEDS, REPORT_TOTALS_ROW),
        ),
        styles.overall_value,
    );

    ws.freeze_at(CellRef::new(RCOL_PROPERTY, REPORT_FIRST_ROW));
    ws
}
