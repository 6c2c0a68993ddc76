use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

const BYTES_PER_GIB: u128 = 1 << 30;
const THOUSANDTHS: u128 = 1000;

/// Separator used when several creator or owner names share one column
pub const NAME_SEPARATOR: &str = "; ";

/// Column headings, in output order
pub const COLUMNS: [&str; 6] = ["Total", "Public", "Private", "Project", "Creator", "Owner"];

/// A data volume in GiB, held as an exact count of thousandths.
///
/// Volumes are rounded once, when converted from bytes, so that
/// arithmetic between two volumes (e.g. private = total - public)
/// never drifts from what is displayed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gib(u64);

impl Gib {
    pub const ZERO: Gib = Gib(0);

    /// Convert a byte count, rounding half up to three decimal places
    pub fn from_bytes(bytes: u64) -> Self {
        let scaled = bytes as u128 * THOUSANDTHS + BYTES_PER_GIB / 2;
        Self((scaled / BYTES_PER_GIB) as u64)
    }

    pub fn from_thousandths(thousandths: u64) -> Self {
        Self(thousandths)
    }

    pub fn thousandths(self) -> u64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / THOUSANDTHS as f64
    }

    pub fn saturating_sub(self, other: Gib) -> Gib {
        Gib(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Gib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = format!("{}.{:03}", self.0 / 1000, self.0 % 1000);
        f.pad(&rendered)
    }
}

impl Serialize for Gib {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Gib {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() || value < 0.0 {
            return Err(de::Error::custom(format!(
                "volume must be a non-negative number, got {}",
                value
            )));
        }
        Ok(Self((value * THOUSANDTHS as f64).round() as u64))
    }
}

/// One line of the usage report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Total")]
    pub total: Gib,
    #[serde(rename = "Public")]
    pub public: Gib,
    #[serde(rename = "Private")]
    pub private: Gib,
    #[serde(rename = "Project")]
    pub project: String,
    #[serde(rename = "Creator", default)]
    pub creator: Option<String>,
    #[serde(rename = "Owner", default)]
    pub owner: Option<String>,
}

impl ReportRow {
    pub fn new(
        project: impl Into<String>,
        total_bytes: u64,
        public_bytes: u64,
        creator: Option<String>,
        owner: Option<String>,
    ) -> Self {
        let total = Gib::from_bytes(total_bytes);
        let public = Gib::from_bytes(public_bytes.min(total_bytes));
        Self {
            total,
            public,
            private: total.saturating_sub(public),
            project: project.into(),
            creator,
            owner,
        }
    }

    /// Individual owner names, in the order they appear in the row
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        split_names(self.owner.as_deref())
    }

    pub fn creators(&self) -> impl Iterator<Item = &str> {
        split_names(self.creator.as_deref())
    }
}

fn split_names(joined: Option<&str>) -> impl Iterator<Item = &str> {
    joined
        .into_iter()
        .flat_map(|names| names.split(NAME_SEPARATOR))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1 << 30;

    #[test]
    fn test_from_bytes_whole_gib() {
        assert_eq!(Gib::from_bytes(GIB).thousandths(), 1000);
        assert_eq!(Gib::from_bytes(0), Gib::ZERO);
        assert_eq!(Gib::from_bytes(5 * GIB).to_string(), "5.000");
    }

    #[test]
    fn test_from_bytes_rounds_half_up() {
        // half a thousandth of a GiB is 536870.912 bytes
        assert_eq!(Gib::from_bytes(536_871).thousandths(), 1);
        assert_eq!(Gib::from_bytes(536_870).thousandths(), 0);
        assert_eq!(Gib::from_bytes(GIB + GIB / 4).to_string(), "1.250");
    }

    #[test]
    fn test_display_pads() {
        assert_eq!(format!("{:>8}", Gib::from_thousandths(12)), "   0.012");
    }

    #[test]
    fn test_private_is_total_minus_public() {
        let row = ReportRow::new("proj", 3 * GIB, GIB + GIB / 3, None, None);
        assert_eq!(row.total.to_string(), "3.000");
        assert_eq!(row.public.to_string(), "1.333");
        assert_eq!(row.private.to_string(), "1.667");
        assert_eq!(
            row.private.thousandths(),
            row.total.thousandths() - row.public.thousandths()
        );
    }

    #[test]
    fn test_public_never_exceeds_total() {
        let row = ReportRow::new("proj", GIB, 2 * GIB, None, None);
        assert_eq!(row.public, row.total);
        assert_eq!(row.private, Gib::ZERO);
    }

    #[test]
    fn test_serializes_with_report_column_names() {
        let row = ReportRow::new(
            "proj1",
            GIB,
            GIB,
            Some("alice".to_string()),
            Some("alice; bob".to_string()),
        );
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Total"], serde_json::json!(1.0));
        assert_eq!(json["Public"], serde_json::json!(1.0));
        assert_eq!(json["Private"], serde_json::json!(0.0));
        assert_eq!(json["Project"], "proj1");
        assert_eq!(json["Owner"], "alice; bob");

        let back: ReportRow = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_deserializes_missing_names_as_none() {
        let json = r#"{"Total": 2.5, "Public": 0.0, "Private": 2.5, "Project": "p", "Creator": null}"#;
        let row: ReportRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.total.thousandths(), 2500);
        assert_eq!(row.creator, None);
        assert_eq!(row.owner, None);
    }

    #[test]
    fn test_rejects_negative_volume() {
        let json = r#"{"Total": -1.0, "Public": 0.0, "Private": 0.0, "Project": "p"}"#;
        assert!(serde_json::from_str::<ReportRow>(json).is_err());
    }

    #[test]
    fn test_owners_split() {
        let row = ReportRow::new("p", 0, 0, None, Some("alice; bob".to_string()));
        assert_eq!(row.owners().collect::<Vec<_>>(), vec!["alice", "bob"]);
        assert_eq!(row.creators().count(), 0);
    }
}
