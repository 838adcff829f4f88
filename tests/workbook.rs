//! End-to-end tests: generate a workbook into a temp directory, then
//! read the package parts back and check the contract that the host
//! spreadsheet application depends on.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

fn generate(dir: &Path, name: &str, sample: bool) -> PathBuf {
    let path = dir.join(name);
    msat::generate_workbook(&path, sample).expect("generation failed");
    path
}

fn read_part(path: &Path, part: &str) -> String {
    let file = File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut contents = String::new();
    archive
        .by_name(part)
        .unwrap_or_else(|_| panic!("missing part {part}"))
        .read_to_string(&mut contents)
        .unwrap();
    contents
}

/// Undo XML entity escaping so formula assertions can be written in
/// plain spreadsheet syntax.
fn unescape(xml: &str) -> String {
    xml.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// The full `<c .../>` element for a cell reference.
fn cell_element(sheet_xml: &str, cell_ref: &str) -> String {
    let needle = format!("<c r=\"{cell_ref}\"");
    let start = sheet_xml
        .find(&needle)
        .unwrap_or_else(|| panic!("no cell {cell_ref}"));
    let end = sheet_xml[start..].find("</c>").map(|i| start + i + 4);
    let self_close = sheet_xml[start..].find("/>").map(|i| start + i + 2);
    match (end, self_close) {
        (Some(e), Some(s)) => sheet_xml[start..e.min(s)].to_string(),
        (Some(e), None) => sheet_xml[start..e].to_string(),
        (None, Some(s)) => sheet_xml[start..s].to_string(),
        (None, None) => panic!("unterminated cell {cell_ref}"),
    }
}

#[test]
fn package_has_expected_parts() {
    let dir = tempfile::tempdir().unwrap();
    let path = generate(dir.path(), "survey.xlsx", true);

    let file = File::open(&path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();

    for part in [
        "[Content_Types].xml",
        "_rels/.rels",
        "docProps/core.xml",
        "docProps/app.xml",
        "xl/workbook.xml",
        "xl/_rels/workbook.xml.rels",
        "xl/styles.xml",
        "xl/worksheets/sheet1.xml",
        "xl/worksheets/sheet2.xml",
        "xl/worksheets/sheet3.xml",
    ] {
        assert!(names.iter().any(|n| n == part), "missing {part}");
    }
    assert!(!names.iter().any(|n| n == "xl/worksheets/sheet4.xml"));
}

#[test]
fn sheets_are_named_and_ordered_with_entry_active() {
    let dir = tempfile::tempdir().unwrap();
    let path = generate(dir.path(), "survey.xlsx", false);
    let workbook = read_part(&path, "xl/workbook.xml");

    assert!(workbook.contains("<sheet name=\"Market Averages\" sheetId=\"1\" r:id=\"rId1\"/>"));
    assert!(workbook.contains("<sheet name=\"Property Data\" sheetId=\"2\" r:id=\"rId2\"/>"));
    assert!(workbook.contains("<sheet name=\"Leased Beds Report\" sheetId=\"3\" r:id=\"rId3\"/>"));
    assert!(workbook.contains("activeTab=\"1\""));

    let entry = read_part(&path, "xl/worksheets/sheet2.xml");
    assert!(entry.contains("tabSelected=\"1\""));
}

#[test]
fn market_sheet_holds_default_percentages() {
    let dir = tempfile::tempdir().unwrap();
    let path = generate(dir.path(), "survey.xlsx", false);
    let market = read_part(&path, "xl/worksheets/sheet1.xml");

    // One editable default per bedroom type in C7:C12.
    for (row, value) in [
        (7, "0.45"),
        (8, "0.5"),
        (9, "0.55"),
        (10, "0.6"),
        (11, "0.55"),
        (12, "0.5"),
    ] {
        let cell = cell_element(&market, &format!("C{row}"));
        assert!(cell.contains(&format!("<v>{value}</v>")), "C{row}: {cell}");
    }

    for label in ["Studio", "1 BR", "2 BR", "3 BR", "4 BR", "5 BR"] {
        assert!(market.contains(&format!("<t>{label}</t>")));
    }
}

#[test]
fn entry_sheet_formulas_match_contract() {
    let dir = tempfile::tempdir().unwrap();
    let path = generate(dir.path(), "survey.xlsx", false);
    let entry = unescape(&read_part(&path, "xl/worksheets/sheet2.xml"));

    assert!(entry.contains(
        "IF(F7<>\"\",F7,\
IF(D7=\"Studio\",'Market Averages'!$C$7,\
IF(D7=\"1 BR\",'Market Averages'!$C$8,\
IF(D7=\"2 BR\",'Market Averages'!$C$9,\
IF(D7=\"3 BR\",'Market Averages'!$C$10,\
IF(D7=\"4 BR\",'Market Averages'!$C$11,\
IF(D7=\"5 BR\",'Market Averages'!$C$12,\"\")))))))"
    ));
    assert!(entry.contains(
        "IF(OR(D7=\"\",E7=\"\"),\"\",\
IF(D7=\"Studio\",1,\
IF(D7=\"1 BR\",1,\
IF(D7=\"2 BR\",2,\
IF(D7=\"3 BR\",3,\
IF(D7=\"4 BR\",4,\
IF(D7=\"5 BR\",5,0))))))*E7)"
    ));
    assert!(entry.contains("IF(OR(H7=\"\",G7=\"\"),\"\",ROUND(H7*G7,0))"));

    // The grid covers exactly the 100-row capacity.
    assert!(entry.contains("IF(OR(H106=\"\",G106=\"\"),\"\",ROUND(H106*G106,0))"));
    assert!(!entry.contains("<c r=\"I107\""));
    assert_eq!(msat::ENTRY_ROW_CAPACITY, 100);
}

#[test]
fn bedroom_dropdown_and_market_flag_are_wired() {
    let dir = tempfile::tempdir().unwrap();
    let path = generate(dir.path(), "survey.xlsx", false);
    let entry = read_part(&path, "xl/worksheets/sheet2.xml");
    let unescaped = unescape(&entry);

    assert!(entry.contains("sqref=\"D7:D106\""));
    assert!(unescaped.contains("<formula1>\"Studio,1 BR,2 BR,3 BR,4 BR,5 BR\"</formula1>"));
    assert!(entry.contains("error=\"Please select a valid bedroom type\""));
    assert!(entry.contains("errorTitle=\"Invalid Entry\""));
    assert!(entry.contains("prompt=\"Select bedroom type\""));
    assert!(entry.contains("allowBlank=\"1\""));

    assert!(entry.contains("<conditionalFormatting sqref=\"B7:I106\">"));
    assert!(unescaped.contains("<formula>AND($F7=\"\",$D7<>\"\")</formula>"));
    assert!(entry.contains("<cfRule type=\"expression\""));

    // The rule's dxf carries the highlight fill.
    let styles = read_part(&path, "xl/styles.xml");
    assert!(styles.contains("<fgColor rgb=\"FFFFF2CC\"/>"));
}

#[test]
fn sample_data_exercises_both_percentage_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = generate(dir.path(), "survey.xlsx", true);
    let entry = read_part(&path, "xl/worksheets/sheet2.xml");

    // Explicit-percentage row: The Heights / Studio Deluxe / 24 units / 0.52.
    assert!(cell_element(&entry, "B7").contains("<t>The Heights</t>"));
    assert!(cell_element(&entry, "C7").contains("<t>Studio Deluxe</t>"));
    assert!(cell_element(&entry, "D7").contains("<t>Studio</t>"));
    assert!(cell_element(&entry, "E7").contains("<v>24</v>"));
    assert!(cell_element(&entry, "F7").contains("<v>0.52</v>"));

    // Market-average row: University Village / Efficiency leaves F blank,
    // which is what trips the fallback formula and the highlight rule.
    assert!(cell_element(&entry, "B12").contains("<t>University Village</t>"));
    assert!(cell_element(&entry, "E12").contains("<v>20</v>"));
    let prelease = cell_element(&entry, "F12");
    assert!(prelease.ends_with("/>"), "F12 should be blank: {prelease}");

    // 15 sample rows, then blank capacity.
    assert!(cell_element(&entry, "B21").contains("<t>Campus Edge</t>"));
    assert!(cell_element(&entry, "B22").ends_with("/>"));
}

#[test]
fn omitting_sample_data_leaves_the_grid_blank() {
    let dir = tempfile::tempdir().unwrap();
    let path = generate(dir.path(), "survey.xlsx", false);
    let entry = read_part(&path, "xl/worksheets/sheet2.xml");

    assert!(!entry.contains("The Heights"));
    let first = cell_element(&entry, "B7");
    assert!(first.ends_with("/>"), "B7 should be blank: {first}");
}

#[test]
fn report_mirrors_and_totals_match_contract() {
    let dir = tempfile::tempdir().unwrap();
    let path = generate(dir.path(), "survey.xlsx", true);
    let report = unescape(&read_part(&path, "xl/worksheets/sheet3.xml"));

    assert!(report.contains("TODAY()"));
    assert!(report.contains("IF('Property Data'!B7=\"\",\"\",'Property Data'!B7)"));
    assert!(report.contains(
        "IF('Property Data'!D7=\"\",\"\",\
IF('Property Data'!D7=\"Studio\",1,\
IF('Property Data'!D7=\"1 BR\",1,\
IF('Property Data'!D7=\"2 BR\",2,\
IF('Property Data'!D7=\"3 BR\",3,\
IF('Property Data'!D7=\"4 BR\",4,\
IF('Property Data'!D7=\"5 BR\",5,\"\")))))))"
    ));
    assert!(report.contains("IF('Property Data'!I106=\"\",\"\",'Property Data'!I106)"));

    assert!(report.contains("SUMIF(E8:E107,\"<>\"\"\")"));
    assert!(report.contains("SUMIF(G8:G107,\"<>\"\"\")"));
    assert!(report.contains("IF(E110=0,\"\",G110/E110)"));
}

#[test]
fn regeneration_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let first = generate(dir.path(), "a.xlsx", true);
    let second = generate(dir.path(), "b.xlsx", true);

    for part in [
        "xl/worksheets/sheet1.xml",
        "xl/worksheets/sheet2.xml",
        "xl/worksheets/sheet3.xml",
        "xl/styles.xml",
        "xl/workbook.xml",
    ] {
        assert_eq!(
            read_part(&first, part),
            read_part(&second, part),
            "part {part} differs between runs"
        );
    }
}

#[test]
fn overwrites_an_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("survey.xlsx");
    std::fs::write(&path, b"not a workbook").unwrap();

    msat::generate_workbook(&path, false).expect("generation failed");
    let workbook = read_part(&path, "xl/workbook.xml");
    assert!(workbook.contains("Market Averages"));
}

#[test]
fn unwritable_path_surfaces_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("survey.xlsx");
    let err = msat::generate_workbook(&path, true).unwrap_err();
    assert!(matches!(err, msat::WorkbookError::Io(_)));
    assert!(!path.exists());
}
