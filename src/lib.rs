//! # pairs-to-parquet
//!
//! A library for storing [.pairs](https://github.com/4dn-dcic/pairix/blob/master/pairs_format_specification.md)
//! files as Parquet and querying them with DuckDB.
//!
//! A .pairs file is a `#`-prefixed header followed by tab-separated contact
//! pairs. Converting to Parquet keeps the header as JSON-valued key-value
//! metadata, so the text file can be rebuilt exactly, and declares
//! chromosome, strand and pair-type columns as enums so selections and
//! sorting run on typed data.
//!
//! ## Features
//!
//! - **Lossless conversion**: .pairs(.gz) ↔ Parquet, header included
//! - **Typed reads**: column types derived from pairtools column names
//! - **Selection**: pairtools-style conditions (`region_match`, `csv_match`,
//!   `wildcard_match`, `regex_match`, ...) translated to SQL
//! - **Provenance**: every output header gains a `@PG` record
//!
//! ## Example
//!
//! ```rust
//! use pairs_to_parquet::core::metadata::{header_to_metadata, PairsMetadata};
//! use pairs_to_parquet::parsing::pairs::parse_header_text;
//! use pairs_to_parquet::select::predicate::translate;
//!
//! let header = parse_header_text(
//!     "## pairs format v1.0.0\n#chromsize: chr1 100\n#columns: readID chrom1 pos1\n",
//! );
//! let kv = header_to_metadata(&header).unwrap();
//! assert_eq!(kv["chromsize"], r#"{"chr1":100}"#);
//! assert_eq!(PairsMetadata::from_kv(&kv).to_header(), header);
//!
//! let sql = translate(r#"region_match(chrom1, pos1, "chr1", 50)"#).unwrap();
//! assert_eq!(sql, "(chrom1 = 'chr1' AND pos1 >= 50)");
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Header, metadata and column types
//! - [`parsing`]: Reading pairs headers and chromosome lists
//! - [`select`]: Condition → SQL translation
//! - [`engine`]: DuckDB connection setup and SQL builders
//! - [`io`]: Compressed output and the streaming pairs writer
//! - [`pipeline`]: Convert, select and sort
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod engine;
pub mod io;
pub mod parsing;
pub mod pipeline;
pub mod select;
pub mod utils;

pub use crate::core::header::PairsHeader;
pub use crate::core::metadata::PairsMetadata;
pub use crate::pipeline::PipelineError;
