//! Marketplace sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A MercadoLibre country site. Catalog endpoints are scoped to one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteId {
    /// Argentina
    #[serde(rename = "MLA")]
    Mla,
    /// Brazil
    #[serde(rename = "MLB")]
    Mlb,
    /// Chile
    #[serde(rename = "MLC")]
    Mlc,
    /// Colombia
    #[serde(rename = "MCO")]
    Mco,
    /// Costa Rica
    #[serde(rename = "MCR")]
    Mcr,
    /// Ecuador
    #[serde(rename = "MEC")]
    Mec,
    /// Mexico
    #[serde(rename = "MLM")]
    Mlm,
    /// Uruguay
    #[serde(rename = "MLU")]
    Mlu,
    /// Venezuela
    #[serde(rename = "MLV")]
    Mlv,
}

impl SiteId {
    pub const ALL: [SiteId; 9] = [
        Self::Mla,
        Self::Mlb,
        Self::Mlc,
        Self::Mco,
        Self::Mcr,
        Self::Mec,
        Self::Mlm,
        Self::Mlu,
        Self::Mlv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mla => "MLA",
            Self::Mlb => "MLB",
            Self::Mlc => "MLC",
            Self::Mco => "MCO",
            Self::Mcr => "MCR",
            Self::Mec => "MEC",
            Self::Mlm => "MLM",
            Self::Mlu => "MLU",
            Self::Mlv => "MLV",
        }
    }

    pub fn country(&self) -> &'static str {
        match self {
            Self::Mla => "Argentina",
            Self::Mlb => "Brasil",
            Self::Mlc => "Chile",
            Self::Mco => "Colombia",
            Self::Mcr => "Costa Rica",
            Self::Mec => "Ecuador",
            Self::Mlm => "México",
            Self::Mlu => "Uruguay",
            Self::Mlv => "Venezuela",
        }
    }
}

impl Default for SiteId {
    fn default() -> Self {
        Self::Mlm
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|site| site.as_str() == upper)
            .ok_or_else(|| format!("unknown site '{}'", s))
    }
}
