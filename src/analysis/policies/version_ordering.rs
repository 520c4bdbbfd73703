use std::cmp::Ordering;

/// Rank of a release without qualifier; qualifiers below it are pre-releases
const RELEASE_RANK: u8 = 5;

/// Rank given to qualifiers that are not recognized
const UNKNOWN_RANK: u8 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Number(u64),
    Qualifier { rank: u8, text: String },
}

/// Version string ordered the way Maven repositories order versions
///
/// Numeric segments compare numerically, known qualifiers follow the
/// `alpha < beta < milestone < rc < snapshot < release < sp` ladder and
/// unknown qualifiers sort after them lexicographically. Trailing zero
/// segments are insignificant, so `1.0` and `1` only differ by spelling,
/// which is used as the final tie-breaker.
#[derive(Debug, Clone)]
pub struct ComparableVersion {
    original: String,
    items: Vec<Item>,
}

impl ComparableVersion {
    pub fn new(version: &str) -> Self {
        Self {
            original: version.to_string(),
            items: tokenize(version),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Sorts and de-duplicates version strings in ascending order
    pub fn sort_versions(versions: impl IntoIterator<Item = String>) -> Vec<String> {
        let mut parsed: Vec<ComparableVersion> =
            versions.into_iter().map(|v| ComparableVersion::new(&v)).collect();
        parsed.sort();
        parsed.dedup_by(|a, b| a.original == b.original);
        parsed.into_iter().map(|v| v.original).collect()
    }
}

impl PartialEq for ComparableVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ComparableVersion {}

impl PartialOrd for ComparableVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComparableVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let length = self.items.len().max(other.items.len());
        for index in 0..length {
            let ordering = match (self.items.get(index), other.items.get(index)) {
                (Some(a), Some(b)) => compare_items(a, b),
                (Some(a), None) => compare_to_padding(a),
                (None, Some(b)) => compare_to_padding(b).reverse(),
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        // Equal by value; keep the sort stable on spelling
        self.original.cmp(&other.original)
    }
}

fn compare_items(a: &Item, b: &Item) -> Ordering {
    match (a, b) {
        (Item::Number(a), Item::Number(b)) => a.cmp(b),
        (Item::Number(_), Item::Qualifier { .. }) => Ordering::Greater,
        (Item::Qualifier { .. }, Item::Number(_)) => Ordering::Less,
        (
            Item::Qualifier {
                rank: rank_a,
                text: text_a,
            },
            Item::Qualifier {
                rank: rank_b,
                text: text_b,
            },
        ) => rank_a.cmp(rank_b).then_with(|| {
            if *rank_a == UNKNOWN_RANK {
                text_a.cmp(text_b)
            } else {
                Ordering::Equal
            }
        }),
    }
}

/// Compares an item against the implicit padding of a shorter version
fn compare_to_padding(item: &Item) -> Ordering {
    match item {
        Item::Number(0) => Ordering::Equal,
        Item::Number(_) => Ordering::Greater,
        Item::Qualifier { rank, .. } => rank.cmp(&RELEASE_RANK),
    }
}

fn qualifier_rank(qualifier: &str) -> u8 {
    match qualifier {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => 6,
        _ => UNKNOWN_RANK,
    }
}

fn tokenize(version: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, items: &mut Vec<Item>| {
        if current.is_empty() {
            return;
        }
        let token = std::mem::take(current);
        let item = match token.parse::<u64>() {
            Ok(number) => Item::Number(number),
            Err(_) => Item::Qualifier {
                rank: qualifier_rank(&token),
                text: token,
            },
        };
        items.push(item);
    };

    for c in version.to_lowercase().chars() {
        if c == '.' || c == '-' || c == '_' {
            flush(&mut current, &mut items);
            continue;
        }
        if let Some(last) = current.chars().last() {
            if last.is_ascii_digit() != c.is_ascii_digit() {
                flush(&mut current, &mut items);
            }
        }
        current.push(c);
    }
    flush(&mut current, &mut items);

    // Release qualifiers carry no information once tokenized
    while let Some(Item::Qualifier { rank: RELEASE_RANK, .. }) | Some(Item::Number(0)) =
        items.last()
    {
        items.pop();
    }
    items
}
