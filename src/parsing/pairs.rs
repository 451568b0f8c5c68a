use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::core::header::{HeaderError, PairsHeader, COMMENT_CHAR};

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Read the header of a .pairs or .pairs.gz file.
///
/// Only the header is read; the body is left to the query engine.
///
/// # Errors
///
/// Returns `HeaderError::Io` if the file cannot be opened or decompressed.
pub fn read_header_file(path: &Path) -> Result<PairsHeader, HeaderError> {
    let file = std::fs::File::open(path)?;

    if is_gzipped(path) {
        // bgzip output is a series of gzip members
        read_header(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        read_header(BufReader::new(file))
    }
}

/// Read leading `#` lines from a reader.
///
/// Stops at the first body line or at end of input. Line endings (`\n` or
/// `\r\n`) are stripped.
///
/// # Errors
///
/// Returns `HeaderError::Io` on read failure or invalid UTF-8.
pub fn read_header<R: BufRead>(mut reader: R) -> Result<PairsHeader, HeaderError> {
    let mut lines = Vec::new();

    loop {
        let starts_header = match reader.fill_buf()? {
            [] => break,
            buf => buf[0] == COMMENT_CHAR as u8,
        };
        if !starts_header {
            break;
        }

        let mut line = String::new();
        reader.read_line(&mut line)?;
        let trimmed = line.trim_end_matches(['\n', '\r']);
        lines.push(trimmed.to_string());
    }

    Ok(PairsHeader::new(lines))
}

/// Parse header from raw text
#[must_use]
pub fn parse_header_text(text: &str) -> PairsHeader {
    PairsHeader::new(
        text.lines()
            .take_while(|l| l.starts_with(COMMENT_CHAR))
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const PAIRS: &str = "## pairs format v1.0.0\n\
#shape: upper triangle\n\
#chromsize: chr1 100\n\
#columns: readID chrom1 pos1 chrom2 pos2 strand1 strand2 pair_type\n\
r1\tchr1\t10\tchr1\t20\t+\t-\tUU\n\
r2\tchr1\t30\tchr1\t40\t+\t+\tUU\n";

    #[test]
    fn test_read_header() {
        let header = read_header(PAIRS.as_bytes()).unwrap();
        assert_eq!(header.len(), 4);
        assert_eq!(header.lines[0], "## pairs format v1.0.0");
        assert_eq!(header.column_names()[7], "pair_type");
    }

    #[test]
    fn test_read_header_crlf() {
        let header = read_header("#shape: upper triangle\r\n#columns: a\r\nx\r\n".as_bytes()).unwrap();
        assert_eq!(header.lines, vec!["#shape: upper triangle", "#columns: a"]);
    }

    #[test]
    fn test_read_header_only() {
        let header = read_header("#columns: a b\n".as_bytes()).unwrap();
        assert_eq!(header.len(), 1);

        let empty = read_header("".as_bytes()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_parse_header_text() {
        let header = parse_header_text(PAIRS);
        assert_eq!(header, read_header(PAIRS.as_bytes()).unwrap());
    }

    #[test]
    fn test_read_header_file_gzipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mock.pairs.gz");

        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(PAIRS.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let header = read_header_file(&path).unwrap();
        assert_eq!(header.len(), 4);
        assert_eq!(header.chromsizes().unwrap(), vec![("chr1".to_string(), 100)]);
    }
}
