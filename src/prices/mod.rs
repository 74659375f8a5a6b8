//! Reference price index and listing matcher
//!
//! The index is built once at startup from a CSV export of the market
//! price report and stays read-only for the process lifetime. Matching
//! maps a listing's free text to a (model, memory) row: capacity is
//! extracted first, then models are tried longest-first so that a short
//! model token ("iphone 13") never shadows a more specific one
//! ("iphone 13 pro max") that is also present in the text.

use crate::types::PriceMatch;
use std::path::Path;


#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    /// Lowercased model token, e.g. "iphone 13 pro"
    pub model: String,
    /// Canonical capacity label: "64gb".."512gb" or "1tb"
    pub memory: String,
    /// Reference mean price, whole rubles
    pub mean: f64,
}

/// Read-only (model, memory) -> mean price table.
#[derive(Debug, Default)]
pub struct PriceBook {
    entries: Vec<ReferenceEntry>,
}

impl PriceBook {
    /// Build the index from a CSV file with `model`/`модель`,
    /// `memory`/`память` and `mean` columns.
    ///
    /// Sparse reference data is expected: rows missing any of the three
    /// fields are skipped silently. A missing or unreadable file degrades
    /// to an empty index; the monitor keeps running, narrow mode then
    /// excludes everything.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(book) => {
                tracing::info!("Price table loaded: {} entries", book.len());
                book
            }
            Err(e) => {
                tracing::error!(
                    "Failed to load price table {}: {}. Running without reference prices",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> crate::error::Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;

        let headers = reader.headers()?.clone();
        let column = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };
        let model_col = column(&["model", "модель"]);
        let memory_col = column(&["memory", "память"]);
        let mean_col = column(&["mean", "среднее"]);

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let field = |col: Option<usize>| {
                col.and_then(|i| record.get(i))
                    .map(|v| v.trim().to_lowercase())
                    .filter(|v| !v.is_empty())
            };

            let Some(model) = field(model_col) else { continue };
            let Some(memory) = field(memory_col).and_then(|m| extract_memory(&m)) else {
                continue;
            };
            let Some(mean) = field(mean_col).and_then(|m| m.parse::<f64>().ok()) else {
                continue;
            };
            if mean <= 0.0 {
                continue;
            }

            entries.push(ReferenceEntry {
                model,
                memory,
                mean,
            });
        }

        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(mut entries: Vec<ReferenceEntry>) -> Self {
        // Longest model first; ties keep source order
        entries.sort_by(|a, b| b.model.len().cmp(&a.model.len()));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    /// Match a listing's free text against the table.
    ///
    /// Capacity is mandatory: without a capacity token the listing is
    /// unmatchable and `PriceMatch::default()` is returned. When a
    /// capacity was found but no model row fits, the capacity is still
    /// reported for diagnostics.
    pub fn find_price(&self, title: &str, description: &str) -> PriceMatch {
        let text = format!("{} {}", title, description).to_lowercase();

        let Some(memory) = extract_memory(&text) else {
            return PriceMatch::default();
        };

        for entry in &self.entries {
            if entry.memory == memory && text.contains(&entry.model) {
                return PriceMatch {
                    mean: Some(entry.mean),
                    model: Some(entry.model.clone()),
                    memory: Some(memory),
                };
            }
        }

        PriceMatch {
            mean: None,
            model: None,
            memory: Some(memory),
        }
    }
}

/// Extract a canonical memory-capacity label from free text.
///
/// Recognizes a digit run followed (after optional whitespace) by a
/// `gb`/`гб`/`tb`/`тб` unit, or a bare value from {64, 128, 256, 512,
/// 1024}. 1024 and anything in terabytes normalize to "1tb"; everything
/// else to "<value>gb".
pub fn extract_memory(text: &str) -> Option<String> {
    const BARE_VALUES: [u64; 5] = [64, 128, 256, 512, 1024];

    let lower = text.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let Ok(value) = chars[start..i].iter().collect::<String>().parse::<u64>() else {
            continue;
        };

        let mut j = i;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }

        match unit_at(&chars, j) {
            Some(Unit::Tb) => return Some("1tb".to_string()),
            Some(Unit::Gb) => {
                return Some(if value == 1024 {
                    "1tb".to_string()
                } else {
                    format!("{}gb", value)
                });
            }
            None => {
                if BARE_VALUES.contains(&value) {
                    return Some(if value == 1024 {
                        "1tb".to_string()
                    } else {
                        format!("{}gb", value)
                    });
                }
            }
        }
    }

    None
}

enum Unit {
    Gb,
    Tb,
}

fn unit_at(chars: &[char], pos: usize) -> Option<Unit> {
    let pair = (chars.get(pos)?, chars.get(pos + 1)?);
    match pair {
        ('g', 'b') | ('г', 'б') => Some(Unit::Gb),
        ('t', 'b') | ('т', 'б') => Some(Unit::Tb),
        _ => None,
    }
}
