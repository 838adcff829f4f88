//! Formula construction for the workbook's derived cells.
//!
//! Everything here produces plain formula text (no leading `=`); the
//! worksheet renderer writes it into `<f>` elements verbatim. The
//! common thread is degrade-to-empty: every builder wraps its
//! computation so that missing inputs yield `""` rather than a formula
//! error in the host application.

use std::fmt;

use crate::types::Bedroom;
use crate::xml::col_letter;

/// 0-based column, 1-based row, displayed in A1 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub col: u16,
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u16, row: u32) -> Self {
        CellRef { col, row }
    }

    /// Relative reference, e.g. "C7".
    pub fn a1(&self) -> String {
        format!("{}{}", col_letter(self.col), self.row)
    }

    /// Absolute reference, e.g. "$C$7".
    pub fn absolute(&self) -> String {
        format!("${}${}", col_letter(self.col), self.row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_letter(self.col), self.row)
    }
}

/// Inclusive rectangular range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    pub fn new(start: CellRef, end: CellRef) -> Self {
        CellRange { start, end }
    }

    /// "B7:I106" style reference.
    pub fn a1(&self) -> String {
        format!("{}:{}", self.start.a1(), self.end.a1())
    }
}

/// Quote a sheet name for use inside a formula reference.
/// "Property Data" -> "'Property Data'", "Summary" -> "Summary".
pub fn quote_sheet_name(name: &str) -> String {
    let needs_quoting = name.chars().any(|c| !c.is_alphanumeric() && c != '_');
    if needs_quoting {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

/// Absolute coordinates of the editable market-average cells, keyed by
/// bedroom type. Returned by the Market Averages builder and consumed
/// by the entry-sheet builder; nothing else may spell out these
/// addresses.
#[derive(Debug, Clone)]
pub struct MarketRefs {
    sheet: String,
    cells: [CellRef; 6],
}

impl MarketRefs {
    pub fn new(sheet: impl Into<String>, cells: [CellRef; 6]) -> Self {
        MarketRefs {
            sheet: sheet.into(),
            cells,
        }
    }

    pub fn cell(&self, bedroom: Bedroom) -> CellRef {
        self.cells[bedroom.index()]
    }

    /// Fully qualified absolute reference, e.g. "'Market Averages'!$C$9".
    pub fn qualified(&self, bedroom: Bedroom) -> String {
        format!(
            "{}!{}",
            quote_sheet_name(&self.sheet),
            self.cell(bedroom).absolute()
        )
    }
}

/// Effective % for entry row `row`: an explicit prelease entry wins;
/// otherwise branch on bedroom type to the market-average cell; blank
/// when both inputs are blank.
pub fn effective_percent(row: u32, bedroom_col: u16, prelease_col: u16, market: &MarketRefs) -> String {
    let bedroom = CellRef::new(bedroom_col, row).a1();
    let prelease = CellRef::new(prelease_col, row).a1();

    let mut f = format!("IF({prelease}<>\"\",{prelease},");
    for b in Bedroom::ALL {
        f.push_str(&format!(
            "IF({bedroom}=\"{}\",{},",
            b.label(),
            market.qualified(b)
        ));
    }
    f.push_str("\"\"");
    f.push_str(&")".repeat(Bedroom::ALL.len() + 1));
    f
}

/// Nested-IF beds-per-unit lookup over the bedroom labels. `fallback`
/// is the innermost arm: "0" on the entry sheet (unreachable under the
/// dropdown constraint, kept anyway), `"\"\""` on the report sheet.
fn bedroom_lookup_chain(cell: &str, fallback: &str) -> String {
    let mut f = String::new();
    for b in Bedroom::ALL {
        f.push_str(&format!(
            "IF({cell}=\"{}\",{},",
            b.label(),
            b.beds_per_unit()
        ));
    }
    f.push_str(fallback);
    f.push_str(&")".repeat(Bedroom::ALL.len()));
    f
}

/// Total beds for entry row `row`: beds-per-unit(bedroom) * units,
/// blank when either input is blank.
pub fn total_beds(row: u32, bedroom_col: u16, units_col: u16) -> String {
    let bedroom = CellRef::new(bedroom_col, row).a1();
    let units = CellRef::new(units_col, row).a1();
    format!(
        "IF(OR({bedroom}=\"\",{units}=\"\"),\"\",{}*{units})",
        bedroom_lookup_chain(&bedroom, "0")
    )
}

/// Leased beds for entry row `row`: ROUND(total * effective), blank
/// when either derived input is blank.
pub fn leased_beds(row: u32, total_col: u16, effective_col: u16) -> String {
    let total = CellRef::new(total_col, row).a1();
    let effective = CellRef::new(effective_col, row).a1();
    format!("IF(OR({total}=\"\",{effective}=\"\"),\"\",ROUND({total}*{effective},0))")
}

/// Cross-sheet mirror that renders blank instead of 0 when the source
/// cell is unfilled.
pub fn mirror(sheet: &str, cell: CellRef) -> String {
    let source = format!("{}!{}", quote_sheet_name(sheet), cell.a1());
    format!("IF({source}=\"\",\"\",{source})")
}

/// Beds-per-unit recomputed on the report sheet straight from the entry
/// sheet's bedroom-type cell (the entry sheet exposes no intermediate
/// beds-per-unit column to mirror).
pub fn report_beds_per_unit(sheet: &str, bedroom_cell: CellRef) -> String {
    let source = format!("{}!{}", quote_sheet_name(sheet), bedroom_cell.a1());
    format!(
        "IF({source}=\"\",\"\",{})",
        bedroom_lookup_chain(&source, "\"\"")
    )
}

/// Sum of the non-blank values in a mirrored column.
pub fn sum_nonblank(range: CellRange) -> String {
    format!("SUMIF({},\"<>\"\"\")", range.a1())
}

/// Overall prelease percentage, blank (not #DIV/0!) when no beds exist.
pub fn overall_percent(beds_total: CellRef, leased_total: CellRef) -> String {
    let beds = beds_total.a1();
    let leased = leased_total.a1();
    format!("IF({beds}=0,\"\",{leased}/{beds})")
}

/// Conditional-format rule flagging rows that fall back to the market
/// average: bedroom type set, prelease blank. Column-absolute and
/// row-relative, anchored at the first data row, so the host
/// re-evaluates it per row as the user edits.
pub fn market_flag_rule(first_row: u32, bedroom_col: u16, prelease_col: u16) -> String {
    let bedroom = col_letter(bedroom_col);
    let prelease = col_letter(prelease_col);
    format!("AND(${prelease}{first_row}=\"\",${bedroom}{first_row}<>\"\")")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market_refs() -> MarketRefs {
        let cells = [7, 8, 9, 10, 11, 12].map(|row| CellRef::new(2, row));
        MarketRefs::new("Market Averages", cells)
    }

    #[test]
    fn quoting_sheet_names() {
        assert_eq!(quote_sheet_name("Summary"), "Summary");
        assert_eq!(quote_sheet_name("Market Averages"), "'Market Averages'");
        assert_eq!(quote_sheet_name("Quote's"), "'Quote''s'");
        assert_eq!(quote_sheet_name("Sheet!"), "'Sheet!'");
    }

    #[test]
    fn refs_render_relative_and_absolute() {
        let c = CellRef::new(2, 9);
        assert_eq!(c.a1(), "C9");
        assert_eq!(c.absolute(), "$C$9");
        assert_eq!(
            CellRange::new(CellRef::new(4, 8), CellRef::new(4, 107)).a1(),
            "E8:E107"
        );
    }

    #[test]
    fn market_refs_are_unique_per_bedroom() {
        let refs = market_refs();
        let mut seen = Vec::new();
        for b in Bedroom::ALL {
            let cell = refs.cell(b);
            assert!(!seen.contains(&cell));
            seen.push(cell);
        }
        assert_eq!(refs.qualified(Bedroom::TwoBr), "'Market Averages'!$C$9");
    }

    #[test]
    fn effective_percent_prefers_explicit_then_market() {
        let f = effective_percent(7, 3, 5, &market_refs());
        assert_eq!(
            f,
            "IF(F7<>\"\",F7,\
IF(D7=\"Studio\",'Market Averages'!$C$7,\
IF(D7=\"1 BR\",'Market Averages'!$C$8,\
IF(D7=\"2 BR\",'Market Averages'!$C$9,\
IF(D7=\"3 BR\",'Market Averages'!$C$10,\
IF(D7=\"4 BR\",'Market Averages'!$C$11,\
IF(D7=\"5 BR\",'Market Averages'!$C$12,\"\")))))))"
        );
    }

    #[test]
    fn total_beds_degrades_to_empty() {
        let f = total_beds(7, 3, 4);
        assert_eq!(
            f,
            "IF(OR(D7=\"\",E7=\"\"),\"\",\
IF(D7=\"Studio\",1,\
IF(D7=\"1 BR\",1,\
IF(D7=\"2 BR\",2,\
IF(D7=\"3 BR\",3,\
IF(D7=\"4 BR\",4,\
IF(D7=\"5 BR\",5,0))))))*E7)"
        );
    }

    #[test]
    fn leased_beds_rounds_to_whole_beds() {
        assert_eq!(
            leased_beds(42, 7, 6),
            "IF(OR(H42=\"\",G42=\"\"),\"\",ROUND(H42*G42,0))"
        );
    }

    #[test]
    fn mirror_renders_blank_for_unfilled_source() {
        assert_eq!(
            mirror("Property Data", CellRef::new(1, 7)),
            "IF('Property Data'!B7=\"\",\"\",'Property Data'!B7)"
        );
    }

    #[test]
    fn report_beds_per_unit_recomputes_with_blank_fallback() {
        let f = report_beds_per_unit("Property Data", CellRef::new(3, 7));
        assert_eq!(
            f,
            "IF('Property Data'!D7=\"\",\"\",\
IF('Property Data'!D7=\"Studio\",1,\
IF('Property Data'!D7=\"1 BR\",1,\
IF('Property Data'!D7=\"2 BR\",2,\
IF('Property Data'!D7=\"3 BR\",3,\
IF('Property Data'!D7=\"4 BR\",4,\
IF('Property Data'!D7=\"5 BR\",5,\"\")))))))"
        );
    }

    #[test]
    fn totals_and_overall() {
        assert_eq!(
            sum_nonblank(CellRange::new(CellRef::new(4, 8), CellRef::new(4, 107))),
            "SUMIF(E8:E107,\"<>\"\"\")"
        );
        assert_eq!(
            overall_percent(CellRef::new(4, 110), CellRef::new(6, 110)),
            "IF(E110=0,\"\",G110/E110)"
        );
    }

    #[test]
    fn market_flag_rule_is_column_absolute() {
        assert_eq!(market_flag_rule(7, 3, 5), "AND($F7=\"\",$D7<>\"\")");
    }
}
