use serde::{Deserialize, Serialize};
use std::fmt;

/// A license as declared in a package descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: Option<String>,
    pub url: Option<String>,
}

impl License {
    pub fn new(name: Option<String>, url: Option<String>) -> Self {
        Self { name, url }
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            url: None,
        }
    }
}

/// License category, declared from most restrictive to most permissive.
///
/// The derived `Ord` is the restrictiveness ranking: a smaller value is more
/// restrictive, so the dominant category of a set is its minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseCategory {
    NoLicense,
    Unknown,
    Sspl1,
    Cc0,
    Unlicense,
    Agpl3,
    Cddl1,
    Gpl2,
    Gpl3,
    Lgpl2,
    Lgpl3,
    Cpl1,
    Epl1,
    Epl2,
    Mpl1,
    Mpl2,
    Bsd1,
    Bsd3,
    Apache2,
    Bsd2,
    Icu,
    Zlib,
    Isc,
    Mit,
    Bsd0,
    Mit0,
}

impl LicenseCategory {
    /// Every category in restrictiveness order
    pub const ALL: [LicenseCategory; 26] = [
        LicenseCategory::NoLicense,
        LicenseCategory::Unknown,
        LicenseCategory::Sspl1,
        LicenseCategory::Cc0,
        LicenseCategory::Unlicense,
        LicenseCategory::Agpl3,
        LicenseCategory::Cddl1,
        LicenseCategory::Gpl2,
        LicenseCategory::Gpl3,
        LicenseCategory::Lgpl2,
        LicenseCategory::Lgpl3,
        LicenseCategory::Cpl1,
        LicenseCategory::Epl1,
        LicenseCategory::Epl2,
        LicenseCategory::Mpl1,
        LicenseCategory::Mpl2,
        LicenseCategory::Bsd1,
        LicenseCategory::Bsd3,
        LicenseCategory::Apache2,
        LicenseCategory::Bsd2,
        LicenseCategory::Icu,
        LicenseCategory::Zlib,
        LicenseCategory::Isc,
        LicenseCategory::Mit,
        LicenseCategory::Bsd0,
        LicenseCategory::Mit0,
    ];

    /// Returns the more restrictive of two categories
    pub fn most_restrictive(self, other: LicenseCategory) -> LicenseCategory {
        self.min(other)
    }

    /// Short display label
    pub fn label(&self) -> &'static str {
        match self {
            LicenseCategory::NoLicense => "No license",
            LicenseCategory::Unknown => "Unknown",
            LicenseCategory::Sspl1 => "SSPL-1.0",
            LicenseCategory::Cc0 => "CC0-1.0",
            LicenseCategory::Unlicense => "Unlicense",
            LicenseCategory::Agpl3 => "AGPL-3.0",
            LicenseCategory::Cddl1 => "CDDL-1.0",
            LicenseCategory::Gpl2 => "GPL-2.0",
            LicenseCategory::Gpl3 => "GPL-3.0",
            LicenseCategory::Lgpl2 => "LGPL-2.1",
            LicenseCategory::Lgpl3 => "LGPL-3.0",
            LicenseCategory::Cpl1 => "CPL-1.0",
            LicenseCategory::Epl1 => "EPL-1.0",
            LicenseCategory::Epl2 => "EPL-2.0",
            LicenseCategory::Mpl1 => "MPL-1.1",
            LicenseCategory::Mpl2 => "MPL-2.0",
            LicenseCategory::Bsd1 => "BSD-1-Clause",
            LicenseCategory::Bsd3 => "BSD-3-Clause",
            LicenseCategory::Apache2 => "Apache-2.0",
            LicenseCategory::Bsd2 => "BSD-2-Clause",
            LicenseCategory::Icu => "ICU",
            LicenseCategory::Zlib => "Zlib",
            LicenseCategory::Isc => "ISC",
            LicenseCategory::Mit => "MIT",
            LicenseCategory::Bsd0 => "0BSD",
            LicenseCategory::Mit0 => "MIT-0",
        }
    }
}

impl fmt::Display for LicenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
