//! Award type codes and their coarse categories.
//!
//! USAspending classifies every transaction with a one- or two-character
//! award type code. The transaction search filter takes the full code list;
//! reporting rolls the codes up into five categories.

/// Every award type code the transaction pull requests.
///
/// A–D are contract vehicles, 02–05 grants, 06/10 direct payments,
/// 07/08 loans, 09/11 insurance and other.
pub const AWARD_TYPE_CODES: [&str; 14] = [
    "A", "B", "C", "D", "02", "03", "04", "05", "06", "10", "07", "08", "09", "11",
];

/// Coarse rollup of an award type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AwardCategory {
    Contracts,
    Grants,
    DirectPayments,
    Loans,
    Other,
}

impl AwardCategory {
    /// Map an award type code to its category. Unknown codes return `None`
    /// and are left out of category summaries.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" | "B" | "C" | "D" => Some(Self::Contracts),
            "02" | "03" | "04" | "05" => Some(Self::Grants),
            "06" | "10" => Some(Self::DirectPayments),
            "07" | "08" => Some(Self::Loans),
            "09" | "11" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Contracts => "Contracts",
            Self::Grants => "Grants",
            Self::DirectPayments => "Direct Payments",
            Self::Loans => "Loans",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for AwardCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
