//! Style model and registry: fonts, fills, borders and number formats are
//! deduplicated into the xf/dxf tables that styles.xml is rendered from.

/// Number formats the workbook uses. Custom codes get ids in the 164+
/// user range; everything else is General.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberFormat {
    General,
    /// "0.0%" - prelease percentages.
    PercentTenths,
    /// "mmmm d, yyyy" - the report date stamp.
    LongDate,
}

impl NumberFormat {
    pub fn num_fmt_id(self) -> u32 {
        match self {
            NumberFormat::General => 0,
            NumberFormat::PercentTenths => 164,
            NumberFormat::LongDate => 165,
        }
    }

    fn format_code(self) -> Option<&'static str> {
        match self {
            NumberFormat::General => None,
            NumberFormat::PercentTenths => Some("0.0%"),
            NumberFormat::LongDate => Some("mmmm d, yyyy"),
        }
    }

    const CUSTOM: [NumberFormat; 2] = [NumberFormat::PercentTenths, NumberFormat::LongDate];
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    pub size: f64,
    pub color: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternType {
    None,
    Gray125,
    Solid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillStyle {
    pub pattern_type: PatternType,
    pub fg_color: Option<String>,
}

impl FillStyle {
    pub fn solid(argb: &str) -> Self {
        FillStyle {
            pattern_type: PatternType::Solid,
            fg_color: Some(argb.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderLineStyle {
    Thin,
    Medium,
    Thick,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BorderSide {
    pub style: BorderLineStyle,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BorderStyle {
    pub left: Option<BorderSide>,
    pub right: Option<BorderSide>,
    pub top: Option<BorderSide>,
    pub bottom: Option<BorderSide>,
}

impl BorderStyle {
    /// Same thin line on all four sides.
    pub fn thin(argb: &str) -> Self {
        let side = BorderSide {
            style: BorderLineStyle::Thin,
            color: Some(argb.to_string()),
        };
        BorderStyle {
            left: Some(side.clone()),
            right: Some(side.clone()),
            top: Some(side.clone()),
            bottom: Some(side),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignmentStyle {
    pub horizontal: Option<HorizontalAlignment>,
    pub vertical: Option<VerticalAlignment>,
    pub wrap_text: bool,
}

impl AlignmentStyle {
    pub fn center() -> Self {
        AlignmentStyle {
            horizontal: Some(HorizontalAlignment::Center),
            ..Default::default()
        }
    }

    pub fn center_center() -> Self {
        AlignmentStyle {
            horizontal: Some(HorizontalAlignment::Center),
            vertical: Some(VerticalAlignment::Center),
            wrap_text: false,
        }
    }
}

/// A full cell format; `None` fields fall back to the workbook defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellStyle {
    pub font: Option<FontStyle>,
    pub fill: Option<FillStyle>,
    pub border: Option<BorderStyle>,
    pub alignment: Option<AlignmentStyle>,
    pub number_format: Option<NumberFormat>,
}

/// The fixed visual vocabulary of the generated workbook. Pure values;
/// applying them to cells is the sheet builders' job.
#[derive(Debug, Clone)]
pub struct Palette {
    pub header_fill: FillStyle,
    pub alt_row_fill: FillStyle,
    pub accent_fill: FillStyle,
    pub light_accent_fill: FillStyle,
    /// Conditional-format fill flagging rows that fall back to the
    /// market average.
    pub market_flag_fill: FillStyle,
    pub header_font: FontStyle,
    pub title_font: FontStyle,
    pub note_font: FontStyle,
    pub body_font: FontStyle,
    pub bold_font: FontStyle,
    pub totals_font: FontStyle,
    pub accent_label_font: FontStyle,
    pub overall_font: FontStyle,
    pub thin_border: BorderStyle,
}

const ACCENT_DARK: &str = "FF1F4E79";

impl Palette {
    pub fn new() -> Self {
        let segoe = |size: f64, bold: bool, italic: bool, color: Option<&str>| FontStyle {
            bold,
            italic,
            size,
            color: color.map(str::to_string),
            name: "Segoe UI".to_string(),
        };

        Palette {
            header_fill: FillStyle::solid(ACCENT_DARK),
            alt_row_fill: FillStyle::solid("FFD6E3F8"),
            accent_fill: FillStyle::solid("FF2E75B6"),
            light_accent_fill: FillStyle::solid("FFBDD7EE"),
            market_flag_fill: FillStyle::solid("FFFFF2CC"),
            header_font: segoe(11.0, true, false, Some("FFFFFFFF")),
            title_font: segoe(14.0, true, false, Some(ACCENT_DARK)),
            note_font: segoe(10.0, false, true, Some("FF666666")),
            body_font: segoe(10.0, false, false, None),
            bold_font: segoe(10.0, true, false, None),
            totals_font: segoe(11.0, true, false, None),
            accent_label_font: segoe(11.0, true, false, Some(ACCENT_DARK)),
            overall_font: segoe(12.0, true, false, Some(ACCENT_DARK)),
            thin_border: BorderStyle::thin("FFB4C6E7"),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CellXfEntry {
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    alignment: Option<AlignmentStyle>,
}

/// Deduplicating store behind styles.xml. Cell styles resolve to xf ids
/// referenced from worksheet cells; conditional-format styles resolve to
/// dxf ids referenced from cfRule elements.
pub struct StyleRegistry {
    fonts: Vec<FontStyle>,
    fills: Vec<FillStyle>,
    borders: Vec<BorderStyle>,
    cell_xfs: Vec<CellXfEntry>,
    dxfs: Vec<CellStyle>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        StyleRegistry {
            fonts: vec![FontStyle {
                bold: false,
                italic: false,
                size: 11.0,
                color: None,
                name: "Calibri".to_string(),
            }],
            // Excel expects fill 0 = none and fill 1 = gray125.
            fills: vec![
                FillStyle {
                    pattern_type: PatternType::None,
                    fg_color: None,
                },
                FillStyle {
                    pattern_type: PatternType::Gray125,
                    fg_color: None,
                },
            ],
            borders: vec![BorderStyle::default()],
            cell_xfs: vec![CellXfEntry {
                num_fmt_id: 0,
                font_id: 0,
                fill_id: 0,
                border_id: 0,
                alignment: None,
            }],
            dxfs: Vec::new(),
        }
    }

    /// Resolve a cell style to an xf id, reusing an identical entry when
    /// one exists.
    pub fn register_cell_style(&mut self, style: &CellStyle) -> u32 {
        let font_id = match &style.font {
            Some(font) => self.get_or_add_font(font),
            None => 0,
        };
        let fill_id = match &style.fill {
            Some(fill) => self.get_or_add_fill(fill),
            None => 0,
        };
        let border_id = match &style.border {
            Some(border) => self.get_or_add_border(border),
            None => 0,
        };
        let num_fmt_id = style.number_format.map_or(0, NumberFormat::num_fmt_id);

        let entry = CellXfEntry {
            num_fmt_id,
            font_id,
            fill_id,
            border_id,
            alignment: style.alignment.clone(),
        };

        for (idx, xf) in self.cell_xfs.iter().enumerate() {
            if *xf == entry {
                return idx as u32;
            }
        }

        self.cell_xfs.push(entry);
        (self.cell_xfs.len() - 1) as u32
    }

    pub fn register_dxf(&mut self, style: &CellStyle) -> u32 {
        for (idx, dxf) in self.dxfs.iter().enumerate() {
            if dxf == style {
                return idx as u32;
            }
        }
        self.dxfs.push(style.clone());
        (self.dxfs.len() - 1) as u32
    }

    fn get_or_add_font(&mut self, font: &FontStyle) -> u32 {
        for (idx, f) in self.fonts.iter().enumerate() {
            if f == font {
                return idx as u32;
            }
        }
        self.fonts.push(font.clone());
        (self.fonts.len() - 1) as u32
    }

    fn get_or_add_fill(&mut self, fill: &FillStyle) -> u32 {
        for (idx, f) in self.fills.iter().enumerate() {
            if f == fill {
                return idx as u32;
            }
        }
        self.fills.push(fill.clone());
        (self.fills.len() - 1) as u32
    }

    fn get_or_add_border(&mut self, border: &BorderStyle) -> u32 {
        for (idx, b) in self.borders.iter().enumerate() {
            if b == border {
                return idx as u32;
            }
        }
        self.borders.push(border.clone());
        (self.borders.len() - 1) as u32
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        StyleRegistry::new()
    }
}

pub fn generate_styles_xml(registry: &StyleRegistry) -> String {
    let mut xml = String::with_capacity(2000 + registry.fonts.len() * 200);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\n");

    xml.push_str(&format!(
        "<numFmts count=\"{}\">\n",
        NumberFormat::CUSTOM.len()
    ));
    for fmt in NumberFormat::CUSTOM {
        if let Some(code) = fmt.format_code() {
            xml.push_str(&format!(
                "  <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>\n",
                fmt.num_fmt_id(),
                code
            ));
        }
    }
    xml.push_str("</numFmts>\n");

    xml.push_str(&format!("<fonts count=\"{}\">\n", registry.fonts.len()));
    for font in &registry.fonts {
        xml.push_str("  <font>");
        write_font_body(&mut xml, font);
        xml.push_str("</font>\n");
    }
    xml.push_str("</fonts>\n");

    xml.push_str(&format!("<fills count=\"{}\">\n", registry.fills.len()));
    for fill in &registry.fills {
        xml.push_str("  <fill>");
        write_fill_body(&mut xml, fill);
        xml.push_str("</fill>\n");
    }
    xml.push_str("</fills>\n");

    xml.push_str(&format!("<borders count=\"{}\">\n", registry.borders.len()));
    for border in &registry.borders {
        xml.push_str("  <border>");
        write_border_side(&mut xml, "left", &border.left);
        write_border_side(&mut xml, "right", &border.right);
        write_border_side(&mut xml, "top", &border.top);
        write_border_side(&mut xml, "bottom", &border.bottom);
        xml.push_str("<diagonal/>");
        xml.push_str("</border>\n");
    }
    xml.push_str("</borders>\n");

    xml.push_str("<cellStyleXfs count=\"1\">\n");
    xml.push_str("  <xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/>\n");
    xml.push_str("</cellStyleXfs>\n");

    xml.push_str(&format!("<cellXfs count=\"{}\">\n", registry.cell_xfs.len()));
    for xf in &registry.cell_xfs {
        xml.push_str(&format!(
            "  <xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\"",
            xf.num_fmt_id, xf.font_id, xf.fill_id, xf.border_id
        ));

        if xf.font_id > 0 {
            xml.push_str(" applyFont=\"1\"");
        }
        if xf.fill_id > 0 {
            xml.push_str(" applyFill=\"1\"");
        }
        if xf.border_id > 0 {
            xml.push_str(" applyBorder=\"1\"");
        }
        if xf.num_fmt_id > 0 {
            xml.push_str(" applyNumberFormat=\"1\"");
        }

        if let Some(align) = &xf.alignment {
            xml.push_str(" applyAlignment=\"1\">");
            write_alignment(&mut xml, align);
            xml.push_str("</xf>\n");
        } else {
            xml.push_str("/>\n");
        }
    }
    xml.push_str("</cellXfs>\n");

    xml.push_str("<cellStyles count=\"1\">\n");
    xml.push_str("  <cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/>\n");
    xml.push_str("</cellStyles>\n");

    // Element order inside a dxf per the schema: font, numFmt, fill,
    // alignment, border.
    xml.push_str(&format!("<dxfs count=\"{}\">\n", registry.dxfs.len()));
    for dxf in &registry.dxfs {
        xml.push_str("  <dxf>");
        if let Some(font) = &dxf.font {
            xml.push_str("<font>");
            write_font_body(&mut xml, font);
            xml.push_str("</font>");
        }
        if let Some(fill) = &dxf.fill {
            xml.push_str("<fill>");
            write_fill_body(&mut xml, fill);
            xml.push_str("</fill>");
        }
        if let Some(align) = &dxf.alignment {
            write_alignment(&mut xml, align);
        }
        if let Some(border) = &dxf.border {
            xml.push_str("<border>");
            write_border_side(&mut xml, "left", &border.left);
            write_border_side(&mut xml, "right", &border.right);
            write_border_side(&mut xml, "top", &border.top);
            write_border_side(&mut xml, "bottom", &border.bottom);
            xml.push_str("</border>");
        }
        xml.push_str("</dxf>\n");
    }
    xml.push_str("</dxfs>\n");

    xml.push_str("</styleSheet>");
    xml
}

fn write_font_body(xml: &mut String, font: &FontStyle) {
    if font.bold {
        xml.push_str("<b/>");
    }
    if font.italic {
        xml.push_str("<i/>");
    }
    xml.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if let Some(color) = &font.color {
        xml.push_str(&format!("<color rgb=\"{}\"/>", color));
    }
    xml.push_str(&format!("<name val=\"{}\"/>", font.name));
}

fn write_fill_body(xml: &mut String, fill: &FillStyle) {
    match fill.pattern_type {
        PatternType::None => xml.push_str("<patternFill patternType=\"none\"/>"),
        PatternType::Gray125 => xml.push_str("<patternFill patternType=\"gray125\"/>"),
        PatternType::Solid => {
            xml.push_str("<patternFill patternType=\"solid\">");
            if let Some(fg) = &fill.fg_color {
                xml.push_str(&format!("<fgColor rgb=\"{}\"/>", fg));
            }
            xml.push_str("<bgColor rgb=\"FFFFFFFF\"/>");
            xml.push_str("</patternFill>");
        }
    }
}

fn write_alignment(xml: &mut String, align: &AlignmentStyle) {
    xml.push_str("<alignment");
    if let Some(h) = align.horizontal {
        xml.push_str(&format!(
            " horizontal=\"{}\"",
            match h {
                HorizontalAlignment::Left => "left",
                HorizontalAlignment::Center => "center",
                HorizontalAlignment::Right => "right",
            }
        ));
    }
    if let Some(v) = align.vertical {
        xml.push_str(&format!(
            " vertical=\"{}\"",
            match v {
                VerticalAlignment::Top => "top",
                VerticalAlignment::Center => "center",
                VerticalAlignment::Bottom => "bottom",
            }
        ));
    }
    if align.wrap_text {
        xml.push_str(" wrapText=\"1\"");
    }
    xml.push_str("/>");
}

fn write_border_side(xml: &mut String, side: &str, border: &Option<BorderSide>) {
    if let Some(b) = border {
        xml.push_str(&format!(
            "<{} style=\"{}\">",
            side,
            match b.style {
                BorderLineStyle::Thin => "thin",
                BorderLineStyle::Medium => "medium",
                BorderLineStyle::Thick => "thick",
            }
        ));
        if let Some(color) = &b.color {
            xml.push_str(&format!("<color rgb=\"{}\"/>", color));
        }
        xml.push_str(&format!("</{}>", side));
    } else {
        xml.push_str(&format!("<{}/>", side));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_styles_share_an_xf() {
        let palette = Palette::new();
        let mut registry = StyleRegistry::new();

        let style = CellStyle {
            font: Some(palette.body_font.clone()),
            border: Some(palette.thin_border.clone()),
            alignment: Some(AlignmentStyle::center()),
            ..Default::default()
        };

        let first = registry.register_cell_style(&style);
        let second = registry.register_cell_style(&style);
        assert_eq!(first, second);
        assert!(first > 0);
    }

    #[test]
    fn distinct_styles_get_distinct_xfs() {
        let palette = Palette::new();
        let mut registry = StyleRegistry::new();

        let plain = CellStyle {
            font: Some(palette.body_font.clone()),
            ..Default::default()
        };
        let filled = CellStyle {
            font: Some(palette.body_font.clone()),
            fill: Some(palette.alt_row_fill.clone()),
            ..Default::default()
        };

        assert_ne!(
            registry.register_cell_style(&plain),
            registry.register_cell_style(&filled)
        );
    }

    #[test]
    fn dxfs_are_deduplicated() {
        let palette = Palette::new();
        let mut registry = StyleRegistry::new();

        let flag = CellStyle {
            fill: Some(palette.market_flag_fill.clone()),
            ..Default::default()
        };
        assert_eq!(registry.register_dxf(&flag), registry.register_dxf(&flag));
    }

    #[test]
    fn styles_xml_carries_custom_number_formats() {
        let registry = StyleRegistry::new();
        let xml = generate_styles_xml(&registry);
        assert!(xml.contains("<numFmt numFmtId=\"164\" formatCode=\"0.0%\"/>"));
        assert!(xml.contains("<numFmt numFmtId=\"165\" formatCode=\"mmmm d, yyyy\"/>"));
    }

    #[test]
    fn styles_xml_renders_registered_dxf_fill() {
        let palette = Palette::new();
        let mut registry = StyleRegistry::new();
        registry.register_dxf(&CellStyle {
            fill: Some(palette.market_flag_fill.clone()),
            ..Default::default()
        });

        let xml = generate_styles_xml(&registry);
        assert!(xml.contains("<dxf><fill><patternFill patternType=\"solid\"><fgColor rgb=\"FFFFF2CC\"/>"));
    }
}
