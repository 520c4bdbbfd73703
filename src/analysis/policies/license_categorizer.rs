use crate::analysis::domain::{License, LicenseCategory};
use regex::Regex;
use std::sync::LazyLock;

/// Longest prefix of a license name or URL that takes part in matching
const MAX_MATCH_LENGTH: usize = 64;

static NAME_CLEANER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r",|\bthe\b|\bversion\b|\blicen[sc]e\b|\bv\b|\.$|\(.*\)")
        .expect("license name cleaner pattern is valid")
});

static VERSION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v(\d)").expect("version prefix pattern is valid"));

struct Aliases {
    category: LicenseCategory,
    names: &'static [&'static str],
    urls: &'static [&'static str],
}

/// Alias tables, consulted in order. The first table matching either the
/// normalised name or the normalised URL decides the category.
const ALIASES: &[Aliases] = &[
    Aliases {
        category: LicenseCategory::Apache2,
        names: &[
            "apache software 2.0",
            "apache software 2",
            "apache 2.0",
            "apache 2",
            "al 2.0",
            "al 2",
            "al2",
            "al2.0",
        ],
        urls: &[
            "https://apache.org/licenses/LICENSE-2.0",
            "https://apache.org/licenses/LICENSE-2.0.txt",
            "https://apache.org/licenses/LICENSE-2.0.html",
            "https://opensource.org/licenses/Apache-2.0",
            "https://opensource.org/licenses/Apache-2-0",
            "https://opensource.org/licenses/apache-2.0",
            "https://opensource.org/licenses/apache-2-0",
            "https://repository.jboss.org/licenses/apache-2.0.txt",
        ],
    },
    Aliases {
        category: LicenseCategory::Bsd0,
        names: &[
            "0bsd",
            "bsd0",
            "bsd 0",
            "zero clause bsd",
            "bsd zero clause",
            "0 clause bsd",
            "bsd 0 clause",
        ],
        urls: &["https://opensource.org/license/0bsd"],
    },
    Aliases {
        category: LicenseCategory::Bsd1,
        names: &["bsd1", "bsd 1", "1 clause bsd", "bsd 1 clause"],
        urls: &["https://opensource.org/license/bsd-1-clause"],
    },
    Aliases {
        category: LicenseCategory::Bsd2,
        names: &[
            "berkeley software distribution",
            "bsd",
            "bsd2",
            "bsd 2",
            "2 clause bsd",
            "bsd 2 clause",
            "simplified bsd",
            "freebsd",
            "free bsd",
        ],
        urls: &[
            "https://opensource.org/licenses/bsd-license.html",
            "https://opensource.org/licenses/bsd-license.php",
            "https://opensource.org/license/BSD-2-Clause",
        ],
    },
    Aliases {
        category: LicenseCategory::Bsd3,
        names: &[
            "bsd3",
            "bsd 3",
            "3 clause bsd",
            "bsd 3 clause",
            "bsdnew",
            "bsd new",
            "newbsd",
            "new bsd",
            "modified bsd",
            "revised bsd",
        ],
        urls: &["https://opensource.org/licenses/BSD-3-Clause"],
    },
    Aliases {
        category: LicenseCategory::Cc0,
        names: &[
            "cc0",
            "cc0 1",
            "cc0 1.0",
            "creative commons 1.0",
            "creative commons 1",
            "creative commons",
        ],
        urls: &["https://repository.jboss.org/licenses/cc0-1.0.txt"],
    },
    Aliases {
        category: LicenseCategory::Cddl1,
        names: &[
            "cddl",
            "cddl1",
            "cddl1.0",
            "cddl 1",
            "common development and distribution 1.0",
            "common development and distribution 1",
            "common development and distribution",
        ],
        urls: &[
            "https://opensource.org/license/cddl-1-0",
            "https://repository.jboss.org/licenses/cddl.txt",
        ],
    },
    Aliases {
        category: LicenseCategory::Cpl1,
        names: &[
            "cpl",
            "cpl1",
            "cpl1.0",
            "cpl 1",
            "common public 1.0",
            "common public 1",
            "common public",
        ],
        urls: &["https://opensource.org/license/cpl1.0.txt"],
    },
    Aliases {
        category: LicenseCategory::Gpl2,
        names: &[
            "gpl2",
            "gpl2.0",
            "gpl 2.0",
            "gpl 2",
            "gnu gpl 2.0",
            "gnu gpl 2",
            "gnu gpl2",
            "gnu general public 2.0",
            "gnu general public 2",
            "general public 2.0",
            "general public 2",
        ],
        urls: &[
            "https://opensource.org/license/gpl-2-0",
            "https://gnu.org/licenses/old-licenses/gpl-2.0.en.html",
        ],
    },
    Aliases {
        category: LicenseCategory::Gpl3,
        names: &[
            "gpl3",
            "gpl3.0",
            "gpl 3.0",
            "gpl 3",
            "gnu gpl 3.0",
            "gnu gpl 3",
            "gnu gpl3",
            "gnu general public 3.0",
            "gnu general public 3",
            "general public 3.0",
            "general public 3",
        ],
        urls: &[
            "https://opensource.org/license/gpl-3-0",
            "https://gnu.org/licenses/gpl-3.0.en.html",
        ],
    },
    Aliases {
        category: LicenseCategory::Agpl3,
        names: &[
            "agpl3",
            "agpl3.0",
            "agpl 3.0",
            "agpl 3",
            "agpl",
            "gnu agpl 3.0",
            "gnu agpl 3",
            "gnu agpl3",
            "gnu agpl",
            "affero gnu general public 3.0",
            "affero gnu general public 3",
            "affero gnu general public",
            "gnu affero general public 3.0",
            "gnu affero general public 3",
            "gnu affero general public",
        ],
        urls: &[
            "https://opensource.org/license/agpl-v3",
            "https://gnu.org/licenses/agpl-3.0.en.html",
        ],
    },
    Aliases {
        category: LicenseCategory::Lgpl2,
        names: &[
            "lgpl2",
            "lgpl2.1",
            "lgpl 2.1",
            "lgpl 2",
            "gnu lgpl 2.1",
            "gnu lgpl 2",
            "gnu lgpl2",
            "gnu lesser general public 2.1",
            "gnu lesser general public 2",
            "lesser general public 2.1",
            "lesser general public 2",
        ],
        urls: &[
            "https://opensource.org/license/lgpl-2-1",
            "https://gnu.org/licenses/old-licenses/lgpl-2.1.en.html",
        ],
    },
    Aliases {
        category: LicenseCategory::Lgpl3,
        names: &[
            "lgpl3",
            "lgpl3.0",
            "lgpl 3.0",
            "lgpl 3",
            "gnu lgpl 3.0",
            "gnu lgpl 3",
            "gnu lgpl3",
            "gnu lesser general public 3.0",
            "gnu lesser general public 3",
            "lesser general public 3.0",
            "lesser general public 3",
        ],
        urls: &[
            "https://opensource.org/license/lgpl-3-0",
            "https://gnu.org/licenses/lgpl-3.0.en.html",
        ],
    },
    Aliases {
        category: LicenseCategory::Mit,
        names: &["mit"],
        urls: &[
            "https://opensource.org/license/mit",
            "https://opensource.org/license/MIT",
        ],
    },
    Aliases {
        category: LicenseCategory::Mit0,
        names: &["mit0", "mit 0", "mit no attribution"],
        urls: &[
            "https://opensource.org/license/mit-0",
            "https://opensource.org/license/MIT-0",
        ],
    },
    Aliases {
        category: LicenseCategory::Mpl1,
        names: &[
            "mozilla public 1.1",
            "mozilla public 1",
            "mpl",
            "mpl1",
            "mpl1.1",
            "mpl 1",
            "mpl 1.1",
        ],
        urls: &[
            "https://opensource.org/license/mpl-1-1",
            "https://mozilla.org/en-US/MPL/1.1",
        ],
    },
    Aliases {
        category: LicenseCategory::Mpl2,
        names: &[
            "mozilla public 2.0",
            "mozilla public 2",
            "mpl2",
            "mpl2.0",
            "mpl 2",
            "mpl 2.0",
        ],
        urls: &[
            "https://opensource.org/license/mpl-2-0",
            "https://mozilla.org/en-US/MPL/2.0",
        ],
    },
    Aliases {
        category: LicenseCategory::Isc,
        names: &["isc"],
        urls: &["https://opensource.org/license/isc-license-txt"],
    },
    Aliases {
        category: LicenseCategory::Icu,
        names: &["icu"],
        urls: &["https://opensource.org/license/icu-license"],
    },
    Aliases {
        category: LicenseCategory::Epl1,
        names: &[
            "eclipse public",
            "eclipse public 1.0",
            "eclipse public 1",
            "epl",
            "epl1",
            "epl1.0",
            "epl 1.0",
            "epl 1",
        ],
        urls: &[
            "https://opensource.org/license/epl-1-0",
            "https://eclipse.org/legal/epl/epl-v10.html",
        ],
    },
    Aliases {
        category: LicenseCategory::Epl2,
        names: &[
            "eclipse public 2.0",
            "eclipse public 2",
            "epl2",
            "epl2.0",
            "epl 2.0",
            "epl 2",
        ],
        urls: &[
            "https://opensource.org/license/epl-2-0",
            "https://eclipse.org/legal/epl-2.0",
        ],
    },
    Aliases {
        category: LicenseCategory::Sspl1,
        names: &[
            "sspl",
            "sspl1",
            "sspl1.0",
            "sspl 1",
            "sspl 1.0",
            "server side public 1.0",
            "server side public 1",
            "server side public",
        ],
        urls: &["https://spdx.org/licenses/SSPL-1.0.html"],
    },
    Aliases {
        category: LicenseCategory::Unlicense,
        names: &["unlicense", "public domain", "pd"],
        urls: &["https://opensource.org/license/unlicense"],
    },
    Aliases {
        category: LicenseCategory::Zlib,
        names: &["zlib", "zlib/libpng", "libpng", "lib png"],
        urls: &[
            "https://opensource.org/license/zlib",
            "https://zlib.net/zlib_license.html",
        ],
    },
];

/// LicenseCategorizer policy mapping declared license strings to categories
///
/// Names and URLs found in descriptors are free text. Both are normalised
/// before lookup so that spelling variants such as "The Apache Software
/// License, Version 2.0" and "Apache-2.0" land in the same category.
pub struct LicenseCategorizer;

impl LicenseCategorizer {
    /// Categorises a single declared license. Unmatched input is `Unknown`.
    pub fn categorize(license: &License) -> LicenseCategory {
        let url = license.url.as_deref().map(Self::normalize_url);
        let name = license.name.as_deref().map(Self::normalize_name);

        ALIASES
            .iter()
            .find(|aliases| {
                url.as_deref().is_some_and(|u| aliases.urls.contains(&u))
                    || name.as_deref().is_some_and(|n| aliases.names.contains(&n))
            })
            .map(|aliases| aliases.category)
            .unwrap_or(LicenseCategory::Unknown)
    }

    /// Categorises every declared license; no licenses at all yields `NoLicense`
    pub fn categorize_all(licenses: &[License]) -> Vec<LicenseCategory> {
        if licenses.is_empty() {
            return vec![LicenseCategory::NoLicense];
        }
        licenses.iter().map(Self::categorize).collect()
    }

    fn normalize_name(name: &str) -> String {
        let lowered = truncate(name)
            .to_lowercase()
            .replace(['-', '_'], " ");
        let cleaned = NAME_CLEANER.replace_all(&lowered, "");
        let cleaned = VERSION_PREFIX.replace_all(&cleaned, "$1");
        cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn normalize_url(url: &str) -> String {
        let url = truncate(url.trim())
            .replace("http://", "https://")
            .replace("//www.", "//");
        url.strip_suffix('/').map(str::to_string).unwrap_or(url)
    }
}

fn truncate(value: &str) -> &str {
    match value.char_indices().nth(MAX_MATCH_LENGTH) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}
