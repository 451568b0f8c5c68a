use std::path::Path;

/// Engine-level type of a pairs column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Chromosome name, from the chromosome enum
    Chrom,
    /// Strand symbol (+, -, !)
    Strand,
    /// Pair classification code (UU, RU, ...)
    PairType,
    Integer,
    /// Anything else, kept as opaque text
    Text,
}

impl ColumnType {
    /// Name of the type as declared to the query engine
    #[must_use]
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Chrom => "CHROM_TYPE",
            Self::Strand => "STRAND_TYPE",
            Self::PairType => "ALIGNMENT_TYPE",
            Self::Integer => "INTEGER",
            Self::Text => "STRING",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql_name())
    }
}

/// Kind of file a path refers to, decided by its suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Plain-text .pairs
    Pairs,
    /// gzip-compressed .pairs.gz
    PairsGz,
    /// Parquet with header metadata in its key-value store
    Parquet,
}

impl FileKind {
    /// Classify a path by suffix; `None` for anything unrecognized.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.to_string_lossy();

        if name.ends_with("pairs.gz") {
            Some(Self::PairsGz)
        } else if name.ends_with("pairs") {
            Some(Self::Pairs)
        } else if name.ends_with("parquet") {
            Some(Self::Parquet)
        } else {
            None
        }
    }

    /// Whether this is the row/column text format
    #[must_use]
    pub fn is_text(self) -> bool {
        matches!(self, Self::Pairs | Self::PairsGz)
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pairs => write!(f, ".pairs"),
            Self::PairsGz => write!(f, ".pairs.gz"),
            Self::Parquet => write!(f, ".parquet"),
        }
    }
}
