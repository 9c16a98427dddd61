// ── Site selection ──
//
// The public API lists every site on an account. The user picks one by a
// 1-based ordinal, given as a number or a word ("first", "Second", ...).

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use redback_api::{SiteEntry, SiteList};

const ORDINALS: [&str; 10] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

/// 1-based position of the wanted site among `"Site"`-typed list entries.
///
/// Parsing never fails: anything unrecognised means the first site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteIndex(NonZeroU32);

impl SiteIndex {
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Build from a number; zero is treated as the first site.
    pub fn new(position: u32) -> Self {
        NonZeroU32::new(position).map_or(Self::FIRST, Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Lenient parse: integer, or an ordinal word "first".."tenth"
    /// (case-insensitive); anything else is 1.
    pub fn parse_lenient(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<u32>() {
            return Self::new(n);
        }
        ORDINALS
            .iter()
            .zip(1u32..)
            .find(|(word, _)| word.eq_ignore_ascii_case(raw))
            .map_or(Self::FIRST, |(_, n)| Self::new(n))
    }

    /// The ordinal word for this position, when there is one.
    pub fn ordinal(self) -> Option<&'static str> {
        usize::try_from(self.get() - 1)
            .ok()
            .and_then(|i| ORDINALS.get(i).copied())
    }
}

impl Default for SiteIndex {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for SiteIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SiteIndex {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl Serialize for SiteIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.get())
    }
}

impl<'de> Deserialize<'de> for SiteIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self::new(u32::try_from(n).unwrap_or(1)),
            Raw::Text(s) => Self::parse_lenient(&s),
        })
    }
}

/// Pick the site at `index` among `"Site"`-typed entries.
///
/// Walks the list counting sites and stops at the requested position. If
/// the list runs out first, the last site seen is returned instead, so a
/// single-site account answers every index with its one site.
pub fn select_site(list: &SiteList, index: SiteIndex) -> Option<&SiteEntry> {
    let mut found = None;
    let mut count = 0;
    for entry in list.data.iter().filter(|e| e.is_site()) {
        count += 1;
        found = Some(entry);
        if count == index.get() {
            break;
        }
    }
    found
}
