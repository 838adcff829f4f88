use thiserror::Error;

/// The closed set of bedroom configurations tracked by the survey.
///
/// The labels are load-bearing: the same strings appear in the entry
/// sheet's dropdown list, in formula comparisons, and as row labels on
/// the Market Averages sheet, so all three must agree byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bedroom {
    Studio,
    OneBr,
    TwoBr,
    ThreeBr,
    FourBr,
    FiveBr,
}

impl Bedroom {
    /// All variants, in the order they appear on the Market Averages sheet.
    pub const ALL: [Bedroom; 6] = [
        Bedroom::Studio,
        Bedroom::OneBr,
        Bedroom::TwoBr,
        Bedroom::ThreeBr,
        Bedroom::FourBr,
        Bedroom::FiveBr,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Bedroom::Studio => "Studio",
            Bedroom::OneBr => "1 BR",
            Bedroom::TwoBr => "2 BR",
            Bedroom::ThreeBr => "3 BR",
            Bedroom::FourBr => "4 BR",
            Bedroom::FiveBr => "5 BR",
        }
    }

    /// Occupant capacity of a single unit of this type.
    pub fn beds_per_unit(self) -> u32 {
        match self {
            Bedroom::Studio | Bedroom::OneBr => 1,
            Bedroom::TwoBr => 2,
            Bedroom::ThreeBr => 3,
            Bedroom::FourBr => 4,
            Bedroom::FiveBr => 5,
        }
    }

    /// Market-average prelease fraction assumed when no property-specific
    /// rate is entered. Written to the Market Averages sheet where the end
    /// user can edit it.
    pub fn default_market_average(self) -> f64 {
        match self {
            Bedroom::Studio => 0.45,
            Bedroom::OneBr => 0.50,
            Bedroom::TwoBr => 0.55,
            Bedroom::ThreeBr => 0.60,
            Bedroom::FourBr => 0.55,
            Bedroom::FiveBr => 0.50,
        }
    }

    /// Position within [`Bedroom::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// What a single worksheet cell holds, before styling.
///
/// Formula text is stored without a leading `=`; it goes into the
/// worksheet part's `<f>` element verbatim.
#[derive(Debug, Clone)]
pub enum CellContent {
    Empty,
    Str(String),
    Number(f64),
    Formula(String),
}

/// One row of the bundled demonstration dataset.
#[derive(Debug, Clone)]
pub struct SampleRow {
    pub property: &'static str,
    pub floorplan: &'static str,
    pub bedroom: Bedroom,
    pub units: u32,
    /// `None` leaves the Prelease % cell blank so the row falls back to
    /// the market average.
    pub prelease: Option<f64>,
}

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid sheet name: {0}")]
    InvalidSheetName(String),
    #[error("archive error: {0}")]
    Archive(String),
}
