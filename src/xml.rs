//! Shared OOXML plumbing: the static package parts, XML escaping, and
//! byte-level cell reference writing used by the worksheet renderer.

/// Zero-allocation column letter writing - returns length written.
#[inline(always)]
pub fn write_col_letter(col: u16, buf: &mut [u8; 4]) -> usize {
    let col = col as usize;
    if col < 26 {
        buf[0] = b'A' + col as u8;
        return 1;
    }

    let mut col = col;
    let mut len = 0;
    let mut stack = [0u8; 4];
    let mut stack_len = 0;

    while col >= 26 {
        stack[stack_len] = b'A' + (col % 26) as u8;
        stack_len += 1;
        col = col / 26 - 1;
    }
    stack[stack_len] = b'A' + col as u8;
    stack_len += 1;

    for i in 0..stack_len {
        buf[i] = stack[stack_len - 1 - i];
        len += 1;
    }

    len
}

/// Column letter as an owned string ("A", "AB", ...).
pub fn col_letter(col: u16) -> String {
    let mut buf = [0u8; 4];
    let len = write_col_letter(col, &mut buf);
    // write_col_letter only emits ASCII A-Z
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

/// Escape into an owned string, for the string-assembled parts.
fn escape_str(s: &str) -> String {
    let mut out = Vec::with_capacity(s.len());
    xml_escape(s.as_bytes(), &mut out);
    // escaping inserts only ASCII entities, never splits a char
    String::from_utf8_lossy(&out).into_owned()
}

/// Write a cell reference (e.g. "A1", "B2") to the buffer.
#[inline(always)]
pub fn write_cell_ref(col: u16, row: u32, buf: &mut Vec<u8>) {
    let mut col_buf = [0u8; 4];
    let col_len = write_col_letter(col, &mut col_buf);
    buf.extend_from_slice(&col_buf[..col_len]);
    buf.extend_from_slice(itoa::Buffer::new().format(row).as_bytes());
}

/// XML-escape `input` into `output`, with a memchr fast path for the
/// common no-escape case.
#[inline(always)]
pub fn xml_escape(input: &[u8], output: &mut Vec<u8>) {
    let needs_escape = memchr::memchr3(b'&', b'<', b'>', input).is_some()
        || memchr::memchr2(b'"', b'\'', input).is_some();

    if !needs_escape {
        output.extend_from_slice(input);
        return;
    }

    let mut last = 0;
    let mut pos = 0;

    while pos < input.len() {
        let byte = input[pos];
        let escape: &[u8] = match byte {
            b'&' => b"&amp;",
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            b'"' => b"&quot;",
            b'\'' => b"&apos;",
            _ => {
                pos += 1;
                continue;
            }
        };

        output.extend_from_slice(&input[last..pos]);
        output.extend_from_slice(escape);
        pos += 1;
        last = pos;
    }

    if last < input.len() {
        output.extend_from_slice(&input[last..]);
    }
}

pub fn generate_content_types(num_sheets: usize) -> String {
    let mut xml = String::with_capacity(800 + num_sheets * 150);
    xml.push_str(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>\
<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
<Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>",
    );

    for i in 1..=num_sheets {
        xml.push_str("<Override PartName=\"/xl/worksheets/sheet");
        xml.push_str(&i.to_string());
        xml.push_str(".xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>");
    }

    xml.push_str("</Types>");
    xml
}

pub fn generate_rels() -> &'static str {
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
<Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties\" Target=\"docProps/app.xml\"/>\
</Relationships>"
}

pub fn generate_core_xml() -> String {
    let stamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
xmlns:dcterms=\"http://purl.org/dc/terms/\" \
xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
<dc:creator>msat</dc:creator>\
<cp:lastModifiedBy>msat</cp:lastModifiedBy>\
<dcterms:created xsi:type=\"dcterms:W3CDTF\">{stamp}</dcterms:created>\
<dcterms:modified xsi:type=\"dcterms:W3CDTF\">{stamp}</dcterms:modified>\
</cp:coreProperties>"
    )
}

pub fn generate_app_xml(sheet_names: &[&str]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\" \
xmlns:vt=\"http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes\">\
<Application>Microsoft Excel</Application>\
<DocSecurity>0</DocSecurity>\
<ScaleCrop>false</ScaleCrop>\
<HeadingPairs><vt:vector size=\"2\" baseType=\"variant\">\
<vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant>\
<vt:variant><vt:i4>{}</vt:i4></vt:variant>\
</vt:vector></HeadingPairs>\
<TitlesOfParts><vt:vector size=\"{}\" baseType=\"lpstr\">{}</vt:vector></TitlesOfParts>\
<LinksUpToDate>false</LinksUpToDate>\
<SharedDoc>false</SharedDoc>\
<AppVersion>16.0300</AppVersion>\
</Properties>",
        sheet_names.len(),
        sheet_names.len(),
        sheet_names
            .iter()
            .map(|n| format!("<vt:lpstr>{}</vt:lpstr>", escape_str(n)))
            .collect::<Vec<_>>()
            .join("")
    )
}

/// Workbook part: sheet roster plus which tab is active on open.
/// `fullCalcOnLoad` forces the host to evaluate every formula cell on
/// first open, since no cached values are written.
pub fn generate_workbook(sheet_names: &[&str], active_tab: usize) -> String {
    let mut xml = String::with_capacity(500 + sheet_names.len() * 80);
    xml.push_str(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
<fileVersion appName=\"xl\" lastEdited=\"7\" lowestEdited=\"7\" rupBuild=\"22621\"/>\
<workbookPr defaultThemeVersion=\"166925\"/>\
<bookViews><workbookView xWindow=\"0\" yWindow=\"0\" windowWidth=\"28800\" windowHeight=\"12600\" activeTab=\"",
    );
    xml.push_str(&active_tab.to_string());
    xml.push_str("\"/></bookViews><sheets>");

    for (i, name) in sheet_names.iter().enumerate() {
        let id = i + 1;
        xml.push_str("<sheet name=\"");
        xml.push_str(&escape_str(name));
        xml.push_str("\" sheetId=\"");
        xml.push_str(&id.to_string());
        xml.push_str("\" r:id=\"rId");
        xml.push_str(&id.to_string());
        xml.push_str("\"/>");
    }

    xml.push_str("</sheets><calcPr calcId=\"191029\" fullCalcOnLoad=\"1\"/></workbook>");
    xml
}

pub fn generate_workbook_rels(num_sheets: usize) -> String {
    let mut xml = String::with_capacity(300 + num_sheets * 150);
    xml.push_str(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId100\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
    );

    for i in 1..=num_sheets {
        xml.push_str("<Relationship Id=\"rId");
        xml.push_str(&i.to_string());
        xml.push_str("\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet");
        xml.push_str(&i.to_string());
        xml.push_str(".xml\"/>");
    }

    xml.push_str("</Relationships>");
    xml
}
