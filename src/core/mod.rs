//! Core data types for pairs headers and their columnar representation.
//!
//! - [`PairsHeader`](header::PairsHeader): the `#`-prefixed header of a .pairs
//!   file and the pairtools-style operations on it (field extraction,
//!   provenance, column and chromosome subsetting)
//! - [`PairsMetadata`](metadata::PairsMetadata): the header as a typed record,
//!   convertible to and from Parquet key-value metadata
//! - [`columns`]: column name → engine type classification
//! - [`ColumnType`](types::ColumnType), [`FileKind`](types::FileKind)
//!
//! ## Header fields
//!
//! | Field | Example |
//! |-------|---------|
//! | format | `## pairs format v1.0.0` |
//! | sorted | `#sorted: chr1-chr2-pos1-pos2` |
//! | shape | `#shape: upper triangle` |
//! | genome_assembly | `#genome_assembly: hg38` |
//! | chromsize | `#chromsize: chr1 248956422` |
//! | samheader | `#samheader: @SQ	SN:chr1	LN:248956422` |
//! | columns | `#columns: readID chrom1 pos1 chrom2 pos2 strand1 strand2 pair_type` |

pub mod columns;
pub mod header;
pub mod metadata;
pub mod types;
