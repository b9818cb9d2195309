//! Row-order catalogue: the fixed list of categories shown for each breakdown.
//!
//! Labels are kept byte-for-byte as published alongside the source data,
//! trailing whitespace included, because they are matched against the
//! `sector` / `sub-sector` values of the CSV.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::AggregateError;

/// Meta value in `sub-sector` marking sector-level aggregate rows.
pub const ALL_SUB_SECTORS: &str = "All";

const ALL_ROW_ORDER: &[&str] = &[
    "Civil Society (Non-market charities)",
    "Creative Industries",
    "Cultural Sector",
    "Digital Sector",
    "Gambling",
    "Sport",
    "Telecoms",
    "Tourism",
    "All DCMS sectors",
    "UK",
];

const CREATIVE_ROW_ORDER: &[&str] = &[
    "Advertising and marketing",
    "Architecture ",
    "Crafts ",
    "Design and designer fashion ",
    "Film, TV, video, radio and photography",
    "IT, software and computer services",
    "Publishing",
    "Museums, galleries and Libraries ",
    "Music, performing and visual arts",
];

const DIGITAL_ROW_ORDER: &[&str] = &[
    "Manufacturing of electronics and computers    ",
    "Wholesale of computers and electronics    ",
    "Publishing (excluding translation and interpretation activities)       ",
    "Software publishing       ",
    "Film, TV, video, radio and music   ",
    "Telecommunications        ",
    "Computer programming, consultancy and related activities        ",
    "Information service activities      ",
    "Repair of computers and communication equipment",
];

const CULTURE_ROW_ORDER: &[&str] = &[
    "Arts",
    "Film, TV and music",
    "Radio",
    "Photography",
    "Crafts",
    "Museums and galleries",
    "Library and archives",
    "Cultural education",
    "Heritage",
];

/// Breakdown selector: which rows are filtered and which column becomes the row label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Grouping {
    /// Sector-level aggregates (`sub-sector == "All"`), one row per sector.
    All,
    #[default]
    CreativeIndustries,
    DigitalSector,
    CulturalSector,
}

impl Grouping {
    /// Selector order.
    pub const ALL: [Self; 4] = [
        Self::All,
        Self::CreativeIndustries,
        Self::DigitalSector,
        Self::CulturalSector,
    ];

    /// Catalogue key, also the `sector` value filtered on for sector groupings.
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::CreativeIndustries => "Creative Industries",
            Self::DigitalSector => "Digital Sector",
            Self::CulturalSector => "Cultural Sector",
        }
    }

    /// Short lowercase name used in export file names.
    pub fn slug(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::CreativeIndustries => "creative-industries",
            Self::DigitalSector => "digital-sector",
            Self::CulturalSector => "cultural-sector",
        }
    }

    /// Ordered category labels for this grouping.
    pub fn row_order(self) -> &'static [&'static str] {
        match self {
            Self::All => ALL_ROW_ORDER,
            Self::CreativeIndustries => CREATIVE_ROW_ORDER,
            Self::DigitalSector => DIGITAL_ROW_ORDER,
            Self::CulturalSector => CULTURE_ROW_ORDER,
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|g| *g == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Grouping {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.label() == s)
            .ok_or_else(|| AggregateError::UnknownGrouping(s.to_string()))
    }
}

impl Serialize for Grouping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
