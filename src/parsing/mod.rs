//! Readers for the text inputs.
//!
//! - [`pairs`]: the `#`-prefixed header of a .pairs or .pairs.gz file. Only
//!   the header is read here; the body is scanned by the query engine.
//! - [`chroms`]: chromosome lists for `select --chrom-subset`
//!
//! ## Example
//!
//! ```rust
//! use pairs_to_parquet::parsing::chroms::parse_chrom_text;
//! use pairs_to_parquet::parsing::pairs::parse_header_text;
//!
//! let header = parse_header_text("## pairs format v1.0.0\n#columns: readID chrom1 pos1\n");
//! assert_eq!(header.column_names(), vec!["readID", "chrom1", "pos1"]);
//!
//! let chroms = parse_chrom_text("chr1\t1000\nchr2\t800\nchr1\t1000\n");
//! assert_eq!(chroms, vec!["chr1", "chr2"]);
//! ```

pub mod chroms;
pub mod pairs;
