//! Column type classification for .pairs columns.
//!
//! The engine is told the type of every column up front instead of sniffing
//! the body. Chromosome, strand and pair-type columns get small enumerated
//! domains so comparisons and sorting follow the declared order.

use std::collections::BTreeSet;

use crate::core::types::ColumnType;

/// Chromosome value pairtools writes for unmapped sides
pub const UNKNOWN_CHROM: &str = "!";

/// Strand symbols, including the unmapped marker
pub const STRANDS: &[&str] = &["+", "-", "!"];

/// Per-side alignment codes of `pairtools parse`/`parse2`. Lowercase codes
/// mark sides of pairs rescued from walks (`uu`, `Uu`, `uU`).
pub const SIDE_CODES: &[char] = &[
    'N', 'U', 'M', 'R', 'W', 'D', 'X', 'n', 'u', 'm', 'r', 'w', 'd', 'x',
];

/// Required columns of a .pairs file
pub const COLUMNS_PAIRS: &[&str] = &[
    "readID", "chrom1", "pos1", "chrom2", "pos2", "strand1", "strand2", "pair_type",
];

/// Required columns of a .pairsam file (the .pairs columns plus these)
pub const COLUMNS_PAIRSAM_EXTRA: &[&str] = &["sam1", "sam2"];

/// Primitive type of a column as declared by the pairs format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Str,
}

/// Name → primitive type tables used for classification
#[derive(Debug, Clone)]
pub struct DtypeTables {
    /// Standard pairs/pairsam columns
    pub standard: Vec<(String, Primitive)>,
    /// Optional per-side columns added by `pairtools parse --add-columns`
    pub extra: Vec<(String, Primitive)>,
}

impl Default for DtypeTables {
    fn default() -> Self {
        use Primitive::{Int, Str};

        let standard = [
            ("readID", Str),
            ("chrom1", Str),
            ("pos1", Int),
            ("chrom2", Str),
            ("pos2", Int),
            ("strand1", Str),
            ("strand2", Str),
            ("pair_type", Str),
            ("sam1", Str),
            ("sam2", Str),
            ("walk_pair_type", Str),
            ("walk_pair_index", Int),
        ];
        let extra = [
            ("mapq", Int),
            ("pos5", Int),
            ("pos3", Int),
            ("cigar", Str),
            ("read_len", Int),
            ("matched_bp", Int),
            ("algn_ref_span", Int),
            ("algn_read_span", Int),
            ("dist_to_5", Int),
            ("dist_to_3", Int),
            ("seq", Str),
            ("mismatches", Str),
        ];

        Self {
            standard: standard.iter().map(|(n, t)| ((*n).to_string(), *t)).collect(),
            extra: extra.iter().map(|(n, t)| ((*n).to_string(), *t)).collect(),
        }
    }
}

impl DtypeTables {
    fn lookup(table: &[(String, Primitive)], name: &str) -> Option<Primitive> {
        table.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }
}

/// Classify every column name, keeping input order.
#[must_use]
pub fn classify(column_names: &[String], tables: &DtypeTables) -> Vec<(String, ColumnType)> {
    column_names
        .iter()
        .map(|name| (name.clone(), classify_one(name, tables)))
        .collect()
}

fn classify_one(name: &str, tables: &DtypeTables) -> ColumnType {
    if let Some(primitive) = DtypeTables::lookup(&tables.standard, name) {
        return domain_type(name, primitive);
    }
    if let Some(primitive) = DtypeTables::lookup(&tables.extra, name) {
        return domain_type(name, primitive);
    }
    // Per-side extra columns carry a trailing 1/2 (mapq1, cigar2, ...)
    if let Some(base) = name.strip_suffix(&['1', '2'][..]) {
        if let Some(primitive) = DtypeTables::lookup(&tables.extra, base) {
            return domain_type(name, primitive);
        }
    }
    side_column_type(name).unwrap_or(ColumnType::Text)
}

/// Name-only fallback for per-side columns missing from the tables
fn side_column_type(name: &str) -> Option<ColumnType> {
    if name == "pair_type" {
        return Some(ColumnType::PairType);
    }
    let base = name.strip_suffix(&['1', '2'][..])?;
    match base {
        "chrom" => Some(ColumnType::Chrom),
        "strand" => Some(ColumnType::Strand),
        _ => None,
    }
}

fn domain_type(name: &str, primitive: Primitive) -> ColumnType {
    match primitive {
        Primitive::Int => ColumnType::Integer,
        Primitive::Str if name.starts_with("chrom") => ColumnType::Chrom,
        Primitive::Str if name.starts_with("strand") => ColumnType::Strand,
        Primitive::Str if name == "pair_type" => ColumnType::PairType,
        Primitive::Str => ColumnType::Text,
    }
}

/// Chromosome enum domain: the unknown marker, then the sorted distinct
/// chromosome names.
#[must_use]
pub fn chromosome_domain(chromsizes: &[(String, u64)]) -> Vec<String> {
    let sorted: BTreeSet<&str> = chromsizes.iter().map(|(name, _)| name.as_str()).collect();

    std::iter::once(UNKNOWN_CHROM)
        .chain(sorted.into_iter().filter(|c| *c != UNKNOWN_CHROM))
        .map(str::to_string)
        .collect()
}

/// Pair-type enum domain: every two-side combination of [`SIDE_CODES`]
#[must_use]
pub fn pair_type_domain() -> Vec<String> {
    SIDE_CODES
        .iter()
        .flat_map(|first| SIDE_CODES.iter().map(move |second| format!("{first}{second}")))
        .collect()
}

/// Whether a column is required by the .pairs or .pairsam format
#[must_use]
pub fn required_by(column: &str) -> Option<&'static str> {
    if COLUMNS_PAIRS.contains(&column) {
        Some(".pairs")
    } else if COLUMNS_PAIRSAM_EXTRA.contains(&column) {
        Some(".pairsam")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_classify_known_and_unknown() {
        let tables = DtypeTables {
            standard: vec![
                ("pos1".to_string(), Primitive::Int),
                ("name1".to_string(), Primitive::Str),
            ],
            extra: vec![("custom".to_string(), Primitive::Int)],
        };

        let cols = names(&["chrom1", "strand2", "pair_type", "pos1", "custom", "unknown"]);
        let result = classify(&cols, &tables);

        assert_eq!(result[0].1, ColumnType::Chrom);
        assert_eq!(result[1].1, ColumnType::Strand);
        assert_eq!(result[2].1, ColumnType::PairType);
        assert_eq!(result[3].1, ColumnType::Integer);
        assert_eq!(result[4].1, ColumnType::Integer);
        assert_eq!(result[5].1, ColumnType::Text);
    }

    #[test]
    fn test_classify_default_tables() {
        let cols = names(&[
            "readID", "chrom1", "pos1", "chrom2", "pos2", "strand1", "strand2", "pair_type",
            "mapq1", "cigar2", "unknown",
        ]);
        let result = classify(&cols, &DtypeTables::default());
        let types: Vec<ColumnType> = result.iter().map(|(_, t)| *t).collect();

        assert_eq!(
            types,
            vec![
                ColumnType::Text,
                ColumnType::Chrom,
                ColumnType::Integer,
                ColumnType::Chrom,
                ColumnType::Integer,
                ColumnType::Strand,
                ColumnType::Strand,
                ColumnType::PairType,
                ColumnType::Integer,
                ColumnType::Text,
                ColumnType::Text,
            ]
        );
        assert_eq!(result[1].0, "chrom1");
    }

    #[test]
    fn test_chromosome_domain_sorted() {
        let chromsizes = vec![
            ("chr3".to_string(), 300),
            ("chr1".to_string(), 100),
            ("chr2".to_string(), 200),
        ];
        assert_eq!(
            chromosome_domain(&chromsizes),
            vec!["!", "chr1", "chr2", "chr3"]
        );
    }

    #[test]
    fn test_chromosome_domain_empty() {
        assert_eq!(chromosome_domain(&[]), vec!["!"]);
    }

    #[test]
    fn test_pair_type_domain() {
        let domain = pair_type_domain();
        assert_eq!(domain.len(), SIDE_CODES.len() * SIDE_CODES.len());
        assert_eq!(domain[0], "NN");
        for code in ["UU", "RU", "UR", "NN", "WW", "DD", "XX", "MU", "uu", "Uu", "uU"] {
            assert!(domain.iter().any(|d| d == code), "missing {code}");
        }
    }

    #[test]
    fn test_required_by() {
        assert_eq!(required_by("chrom1"), Some(".pairs"));
        assert_eq!(required_by("sam2"), Some(".pairsam"));
        assert_eq!(required_by("mapq1"), None);
    }
}
