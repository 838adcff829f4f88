//! OPC package assembly: static parts plus one worksheet part per
//! sheet, zipped with mtzip and written atomically.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use mtzip::{level::CompressionLevel, ZipArchive};

use crate::sheet::Worksheet;
use crate::styles::{generate_styles_xml, StyleRegistry};
use crate::types::WorkbookError;
use crate::xml;

const MAX_SHEET_NAME_LEN: usize = 31;
const INVALID_SHEET_CHARS: &str = "[]:*?/\\";

/// Write the workbook to `path`, overwriting any existing file.
/// `active` is the zero-based index of the tab shown on open.
pub fn write_workbook(
    sheets: &[Worksheet],
    mut registry: StyleRegistry,
    active: usize,
    path: &Path,
) -> Result<(), WorkbookError> {
    validate_sheet_names(sheets)?;

    // Conditional-format styles become dxf entries in styles.xml; the
    // assigned ids are handed to each sheet's renderer in insertion
    // order.
    let dxf_ids: Vec<Vec<u32>> = sheets
        .iter()
        .map(|sheet| {
            sheet
                .conditional_formats()
                .iter()
                .map(|cf| registry.register_dxf(&cf.style))
                .collect()
        })
        .collect();

    let sheet_names: Vec<&str> = sheets.iter().map(|s| s.name()).collect();

    let mut zipper = ZipArchive::new();
    add_static_files(&mut zipper, &sheet_names, &registry, active);

    for (idx, sheet) in sheets.iter().enumerate() {
        let xml_data = sheet.to_xml(idx == active, &dxf_ids[idx]);
        zipper
            .add_file_from_memory(xml_data, format!("xl/worksheets/sheet{}.xml", idx + 1))
            .compression_level(CompressionLevel::fast())
            .done();
    }

    write_zip_atomic(zipper, path)
}

fn add_static_files(
    zipper: &mut ZipArchive,
    sheet_names: &[&str],
    registry: &StyleRegistry,
    active: usize,
) {
    zipper
        .add_file_from_memory(
            xml::generate_content_types(sheet_names.len()).into_bytes(),
            "[Content_Types].xml".to_string(),
        )
        .compression_level(CompressionLevel::fast())
        .done();

    zipper
        .add_file_from_memory(
            xml::generate_rels().as_bytes().to_vec(),
            "_rels/.rels".to_string(),
        )
        .compression_level(CompressionLevel::fast())
        .done();

    zipper
        .add_file_from_memory(
            xml::generate_core_xml().into_bytes(),
            "docProps/core.xml".to_string(),
        )
        .compression_level(CompressionLevel::fast())
        .done();

    zipper
        .add_file_from_memory(
            xml::generate_app_xml(sheet_names).into_bytes(),
            "docProps/app.xml".to_string(),
        )
        .compression_level(CompressionLevel::fast())
        .done();

    zipper
        .add_file_from_memory(
            xml::generate_workbook(sheet_names, active).into_bytes(),
            "xl/workbook.xml".to_string(),
        )
        .compression_level(CompressionLevel::fast())
        .done();

    zipper
        .add_file_from_memory(
            xml::generate_workbook_rels(sheet_names.len()).into_bytes(),
            "xl/_rels/workbook.xml.rels".to_string(),
        )
        .compression_level(CompressionLevel::fast())
        .done();

    zipper
        .add_file_from_memory(
            generate_styles_xml(registry).into_bytes(),
            "xl/styles.xml".to_string(),
        )
        .compression_level(CompressionLevel::fast())
        .done();
}

/// Write through a temp file in the destination directory, then rename
/// over the target. A failed generation never leaves a partial file.
fn write_zip_atomic(mut zipper: ZipArchive, path: &Path) -> Result<(), WorkbookError> {
    let temp_path = path.with_extension(format!("tmp.{}", std::process::id()));

    let result = (|| -> Result<(), WorkbookError> {
        let mut file = fs::File::create(&temp_path)?;
        zipper
            .write(&mut file)
            .map_err(|e| WorkbookError::Archive(e.to_string()))?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            fs::rename(&temp_path, path)?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

fn validate_sheet_names(sheets: &[Worksheet]) -> Result<(), WorkbookError> {
    let mut seen = HashSet::new();
    for sheet in sheets {
        validate_sheet_name(sheet.name())?;
        // Sheet names are case-insensitive in Excel.
        if !seen.insert(sheet.name().to_lowercase()) {
            return Err(WorkbookError::InvalidSheetName(format!(
                "duplicate sheet name '{}'",
                sheet.name()
            )));
        }
    }
    Ok(())
}

fn validate_sheet_name(name: &str) -> Result<(), WorkbookError> {
    if name.is_empty() {
        return Err(WorkbookError::InvalidSheetName(
            "sheet name cannot be empty".to_string(),
        ));
    }
    if name.len() > MAX_SHEET_NAME_LEN {
        return Err(WorkbookError::InvalidSheetName(format!(
            "'{name}' exceeds {MAX_SHEET_NAME_LEN} characters"
        )));
    }
    for c in INVALID_SHEET_CHARS.chars() {
        if name.contains(c) {
            return Err(WorkbookError::InvalidSheetName(format!(
                "'{name}' contains invalid character '{c}'"
            )));
        }
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(WorkbookError::InvalidSheetName(format!(
            "'{name}' contains control characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_name_rules() {
        assert!(validate_sheet_name("Property Data").is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name(&"A".repeat(32)).is_err());
        assert!(validate_sheet_name("Invalid:Name").is_err());
        assert!(validate_sheet_name("Bad\\Name").is_err());
        assert!(validate_sheet_name("Tab\there").is_err());
    }

    #[test]
    fn duplicate_sheet_names_rejected_case_insensitively() {
        let sheets = vec![Worksheet::new("Report"), Worksheet::new("report")];
        assert!(matches!(
            validate_sheet_names(&sheets),
            Err(WorkbookError::InvalidSheetName(_))
        ));
    }
}
