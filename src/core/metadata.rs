//! Translation between a pairs header and Parquet key-value metadata.
//!
//! Every header field is stored under its normalized name with a JSON value:
//!
//! | Key | JSON value |
//! |-----|------------|
//! | `format` | string, the non-field lines joined with `\n` |
//! | `sorted`, `shape`, `genome_assembly` | string |
//! | `chromsize` | object `{chrom: size}` in header order |
//! | `samheader` | array of SAM header records |
//! | `columns` | array of column names |
//! | anything else | string for one line, array for several |
//!
//! Reading back is lenient: a value that cannot be decoded turns into a
//! diagnostic string instead of failing the whole header.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::header::{parse_chromsize, HeaderError, PairsHeader};

/// Fields written back to a header, in this order, before `columns`
pub const BASIC_FIELDS: &[&str] = &[
    "format",
    "sorted",
    "shape",
    "genome_assembly",
    "chromsize",
    "samheader",
];

/// Header content as a typed record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairsMetadata {
    /// Lines that are not `#key:` fields, e.g. `## pairs format v1.0.0`
    pub format: Vec<String>,
    pub sorted: Option<String>,
    pub shape: Option<String>,
    pub genome_assembly: Option<String>,
    /// Chromosome sizes in header order
    pub chromsize: Vec<(String, u64)>,
    /// SAM header records without the `#samheader: ` prefix
    pub samheader: Vec<String>,
    pub columns: Vec<String>,
    /// Any other `#key:` field, e.g. `chromosomes`
    pub extensions: BTreeMap<String, Vec<String>>,
}

impl PairsMetadata {
    /// Collect every field of a header.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::InvalidChromsize` for a malformed `#chromsize:` line.
    pub fn from_header(header: &PairsHeader) -> Result<Self, HeaderError> {
        let mut metadata = Self::default();
        let mut rest = header.clone();

        for name in header.field_names() {
            let (values, remaining) = rest.extract_fields(&name);
            rest = PairsHeader::new(remaining);

            match normalize_field_name(&name).as_str() {
                "format" => metadata
                    .format
                    .extend(values.into_iter().map(|v| format!("#{name}: {v}"))),
                "sorted" => metadata.sorted = first_value(&name, values),
                "shape" => metadata.shape = first_value(&name, values),
                "genome_assembly" => metadata.genome_assembly = first_value(&name, values),
                "chromsize" => {
                    metadata.chromsize = values
                        .iter()
                        .map(|v| parse_chromsize(v))
                        .collect::<Result<_, _>>()?;
                }
                "samheader" => metadata.samheader = values,
                "columns" => {
                    metadata.columns = values
                        .first()
                        .map(|v| v.split_whitespace().map(str::to_string).collect())
                        .unwrap_or_default();
                }
                key if is_field_name(key) => {
                    metadata.extensions.insert(key.to_string(), values);
                }
                // Names that could not be read back as a key stay as text
                _ => metadata
                    .format
                    .extend(values.into_iter().map(|v| format!("#{name}: {v}"))),
            }
        }

        let mut format = rest.lines;
        format.append(&mut metadata.format);
        metadata.format = format;
        Ok(metadata)
    }

    /// Build the record from decoded metadata values, keyed by field name.
    ///
    /// Keys that are not valid pairs field names (e.g. `ARROW:schema` written
    /// by other Parquet producers) are skipped.
    #[must_use]
    pub fn from_values(values: &BTreeMap<String, Value>) -> Self {
        let mut metadata = Self::default();

        for (key, value) in values {
            match key.as_str() {
                "format" => {
                    metadata.format = value_to_lines(value)
                        .iter()
                        .flat_map(|v| v.split('\n'))
                        .map(str::to_string)
                        .collect();
                }
                "sorted" => metadata.sorted = Some(value_to_text(value)),
                "shape" => metadata.shape = Some(value_to_text(value)),
                "genome_assembly" => metadata.genome_assembly = Some(value_to_text(value)),
                "chromsize" => metadata.chromsize = value_to_chromsizes(value),
                "samheader" => metadata.samheader = value_to_lines(value),
                "columns" => {
                    metadata.columns = match value {
                        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
                        other => value_to_lines(other),
                    };
                }
                key if is_field_name(key) => {
                    metadata
                        .extensions
                        .insert(key.to_string(), value_to_lines(value));
                }
                key => debug!(key = %key, "Skipping foreign metadata key"),
            }
        }

        metadata
    }

    /// Decode raw key-value metadata as stored in a Parquet file
    #[must_use]
    pub fn from_kv(kv: &BTreeMap<String, String>) -> Self {
        let values: BTreeMap<String, Value> = kv
            .iter()
            .filter(|(key, _)| is_header_key(key))
            .map(|(key, value)| (normalize_field_name(key), decode_and_parse_json(value)))
            .collect();
        Self::from_values(&values)
    }

    /// Encode every present field as JSON text
    #[must_use]
    pub fn to_kv(&self) -> BTreeMap<String, String> {
        let mut kv = BTreeMap::new();

        if !self.format.is_empty() {
            kv.insert("format".to_string(), json_string(&self.format.join("\n")));
        }
        for (key, value) in [
            ("sorted", &self.sorted),
            ("shape", &self.shape),
            ("genome_assembly", &self.genome_assembly),
        ] {
            if let Some(value) = value {
                kv.insert(key.to_string(), json_string(value));
            }
        }
        if !self.chromsize.is_empty() {
            let sizes: Map<String, Value> = self
                .chromsize
                .iter()
                .map(|(chrom, size)| (chrom.clone(), Value::from(*size)))
                .collect();
            kv.insert("chromsize".to_string(), Value::Object(sizes).to_string());
        }
        if !self.samheader.is_empty() {
            kv.insert("samheader".to_string(), json_array(&self.samheader));
        }
        if !self.columns.is_empty() {
            kv.insert("columns".to_string(), json_array(&self.columns));
        }
        for (key, values) in self.extensions.iter().filter(|(key, _)| is_field_name(key)) {
            let encoded = match values.as_slice() {
                [single] => json_string(single),
                many => json_array(many),
            };
            kv.insert(key.clone(), encoded);
        }

        kv
    }

    /// Render header lines: basic fields in fixed order, extension fields,
    /// then exactly one `#columns:` line.
    #[must_use]
    pub fn to_header(&self) -> PairsHeader {
        let mut lines = Vec::new();

        for field in BASIC_FIELDS {
            match *field {
                "format" => lines.extend(self.format.iter().cloned()),
                "sorted" => lines.extend(self.sorted.iter().map(|v| format!("#sorted: {v}"))),
                "shape" => lines.extend(self.shape.iter().map(|v| format!("#shape: {v}"))),
                "genome_assembly" => lines.extend(
                    self.genome_assembly
                        .iter()
                        .map(|v| format!("#genome_assembly: {v}")),
                ),
                "chromsize" => lines.extend(
                    self.chromsize
                        .iter()
                        .map(|(chrom, size)| format!("#chromsize: {chrom} {size}")),
                ),
                "samheader" => {
                    lines.extend(self.samheader.iter().map(|r| format!("#samheader: {r}")));
                }
                _ => {}
            }
        }
        for (key, values) in &self.extensions {
            lines.extend(values.iter().map(|v| format!("#{key}: {v}")));
        }
        lines.push(format!("#columns: {}", self.columns.join(" ")));

        PairsHeader::new(lines)
    }
}

/// Header → JSON-valued key-value metadata
///
/// # Errors
///
/// Returns `HeaderError::InvalidChromsize` for a malformed `#chromsize:` line.
pub fn header_to_metadata(header: &PairsHeader) -> Result<BTreeMap<String, String>, HeaderError> {
    Ok(PairsMetadata::from_header(header)?.to_kv())
}

/// Decoded metadata values → header lines
#[must_use]
pub fn metadata_to_header(metadata: &BTreeMap<String, Value>) -> PairsHeader {
    PairsMetadata::from_values(metadata).to_header()
}

/// Strip comment markers, colons and whitespace from a field name:
/// `"# columns:"` → `"columns"`, `"sam header"` → `"samheader"`.
#[must_use]
pub fn normalize_field_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '#' && *c != ':' && !c.is_whitespace())
        .collect()
}

/// Decode `\xHH` escapes, then parse the result as JSON.
///
/// Never fails: an undecodable value yields a diagnostic string that starts
/// with `Unicode decode error` (bad escape or invalid UTF-8) or
/// `JSONDecodeError` (invalid JSON), so one bad entry does not abort the
/// remaining keys.
#[must_use]
pub fn decode_and_parse_json(value: &str) -> Value {
    let decoded = match decode_byte_escapes(value) {
        Ok(decoded) => decoded,
        Err(detail) => {
            let message = format!("Unicode decode error: {detail}; original value: {value}");
            warn!("{message}");
            return Value::String(message);
        }
    };

    match serde_json::from_str(&decoded) {
        Ok(parsed) => parsed,
        Err(e) => {
            let message = format!("JSONDecodeError: {e}; value: {decoded}");
            warn!("{message}");
            Value::String(message)
        }
    }
}

/// Turn `\xHH` sequences into raw bytes; any other backslash pair is kept
/// verbatim so JSON escapes (`\"`, `\\`, `\u0041`) survive for the JSON parser.
fn decode_byte_escapes(value: &str) -> Result<String, String> {
    let raw = value.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] == b'\\' && i + 1 < raw.len() {
            if raw[i + 1] == b'x' {
                let byte = raw
                    .get(i + 2..i + 4)
                    .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                    .ok_or_else(|| format!("truncated \\xXX escape at position {i}"))?;
                bytes.push(byte);
                i += 4;
            } else {
                bytes.extend_from_slice(&raw[i..i + 2]);
                i += 2;
            }
            continue;
        }
        bytes.push(raw[i]);
        i += 1;
    }

    String::from_utf8(bytes).map_err(|e| e.to_string())
}

fn first_value(name: &str, values: Vec<String>) -> Option<String> {
    if values.len() > 1 {
        warn!(field = name, count = values.len(), "Repeated header field, keeping the first");
    }
    values.into_iter().next()
}

/// Raw key that names a header field once normalized: `# columns:` yes,
/// `ARROW:schema` no.
fn is_header_key(key: &str) -> bool {
    let stripped = key
        .trim_start_matches(|c: char| c == '#' || c.is_whitespace())
        .trim_end_matches(|c: char| c == ':' || c.is_whitespace());
    let accepted = !stripped.contains(':');
    if !accepted {
        debug!(key = %key, "Skipping foreign metadata key");
    }
    accepted
}

fn is_field_name(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn json_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn json_array(values: &[String]) -> String {
    Value::Array(values.iter().cloned().map(Value::String).collect()).to_string()
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_to_lines(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(value_to_text).collect(),
        Value::Null => Vec::new(),
        other => vec![value_to_text(other)],
    }
}

fn value_to_chromsizes(value: &Value) -> Vec<(String, u64)> {
    let Value::Object(sizes) = value else {
        warn!(value = %value, "chromsize metadata is not a JSON object, ignoring");
        return Vec::new();
    };

    sizes
        .iter()
        .filter_map(|(chrom, size)| {
            let parsed = size
                .as_u64()
                .or_else(|| size.as_str().and_then(|s| s.parse().ok()));
            if parsed.is_none() {
                warn!(chrom = %chrom, size = %size, "Invalid chromosome size, ignoring");
            }
            parsed.map(|size| (chrom.clone(), size))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(list: &[&str]) -> PairsHeader {
        PairsHeader::new(list.iter().map(|s| (*s).to_string()).collect())
    }

    fn mock_header() -> PairsHeader {
        lines(&[
            "## pairs format v1.0.0",
            "#sorted: chr1-chr2-pos1-pos2",
            "#shape: upper triangle",
            "#genome_assembly: hg38",
            "#chromsize: chr1 1000",
            "#chromsize: chr2 2000",
            "#samheader: @SQ\tSN:chr1\tLN:1000",
            "#samheader: @SQ\tSN:chr2\tLN:2000",
            "#columns: readID chrom1 pos1 chrom2 pos2 strand1 strand2 pair_type",
        ])
    }

    #[test]
    fn test_header_to_metadata_basic() {
        let kv = header_to_metadata(&mock_header()).unwrap();

        let columns: Value = serde_json::from_str(&kv["columns"]).unwrap();
        assert_eq!(columns.as_array().unwrap().len(), 8);
        assert_eq!(columns[0], "readID");

        let chromsize: Value = serde_json::from_str(&kv["chromsize"]).unwrap();
        assert_eq!(chromsize["chr1"], 1000);
        assert_eq!(chromsize["chr2"], 2000);

        let samheader: Value = serde_json::from_str(&kv["samheader"]).unwrap();
        assert_eq!(samheader[1], "@SQ\tSN:chr2\tLN:2000");

        assert_eq!(kv["sorted"], "\"chr1-chr2-pos1-pos2\"");
        assert_eq!(kv["shape"], "\"upper triangle\"");
        assert_eq!(kv["genome_assembly"], "\"hg38\"");
        assert_eq!(kv["format"], "\"## pairs format v1.0.0\"");
    }

    #[test]
    fn test_chromsize_keeps_header_order() {
        let header = lines(&["#chromsize: chr2 20", "#chromsize: chr10 100", "#columns: a"]);
        let kv = header_to_metadata(&header).unwrap();
        assert_eq!(kv["chromsize"], r#"{"chr2":20,"chr10":100}"#);
    }

    #[test]
    fn test_invalid_chromsize_is_an_error() {
        let header = lines(&["#chromsize: chr1", "#columns: a"]);
        assert!(matches!(
            header_to_metadata(&header),
            Err(HeaderError::InvalidChromsize(_))
        ));
    }

    #[test]
    fn test_normalize_field_name() {
        assert_eq!(normalize_field_name("# columns:"), "columns");
        assert_eq!(normalize_field_name("sam header"), "samheader");
        assert_eq!(normalize_field_name("shape:"), "shape");
    }

    #[test]
    fn test_decode_and_parse_json_valid() {
        assert_eq!(decode_and_parse_json(r#""simple string""#), "simple string");
        assert_eq!(
            decode_and_parse_json(r#"["a", "b", "c"]"#),
            serde_json::json!(["a", "b", "c"])
        );
        assert_eq!(
            decode_and_parse_json(r#"{"key": "value"}"#),
            serde_json::json!({"key": "value"})
        );
    }

    #[test]
    fn test_decode_and_parse_json_escapes() {
        assert_eq!(decode_and_parse_json(r#""hello \u0041""#), "hello A");
        assert_eq!(decode_and_parse_json(r#""tab\x41""#), "tabA");
        assert_eq!(decode_and_parse_json(r#""a\tb""#), "a\tb");
        assert_eq!(decode_and_parse_json(r#""quote \" back \\x""#), "quote \" back \\x");
    }

    #[test]
    fn test_decode_and_parse_json_invalid_json() {
        let result = decode_and_parse_json(r#""unterminated string"#);
        let message = result.as_str().unwrap();
        assert!(message.starts_with("JSONDecodeError"));
        assert!(message.contains("unterminated string"));
    }

    #[test]
    fn test_decode_and_parse_json_bad_escape() {
        let result = decode_and_parse_json(r"\xZZ");
        let message = result.as_str().unwrap();
        assert!(message.contains("Unicode decode error"));
        assert!(message.contains("original value"));
        assert!(message.ends_with(r"\xZZ"));
    }

    #[test]
    fn test_decode_and_parse_json_invalid_utf8() {
        let result = decode_and_parse_json(r#""\xff""#);
        assert!(result.as_str().unwrap().starts_with("Unicode decode error"));
    }

    #[test]
    fn test_metadata_to_header_basic() {
        let metadata: BTreeMap<String, Value> = serde_json::from_value(serde_json::json!({
            "columns": ["readID", "pairID", "chrom1", "chrom2", "pos1", "pos2"],
            "samheader": ["@SQ SN:chr1 LN:1000", "@SQ SN:chr2 LN:2000"],
            "chromsize": {"chr1": 1000, "chr2": 2000},
            "genome_assembly": "hg38",
            "shape": "upper triangle",
            "sorted": "chr1-chr2-pos1-pos2",
            "format": "## pairs format v1.0",
        }))
        .unwrap();

        let header = metadata_to_header(&metadata);

        assert_eq!(
            header.lines,
            vec![
                "## pairs format v1.0",
                "#sorted: chr1-chr2-pos1-pos2",
                "#shape: upper triangle",
                "#genome_assembly: hg38",
                "#chromsize: chr1 1000",
                "#chromsize: chr2 2000",
                "#samheader: @SQ SN:chr1 LN:1000",
                "#samheader: @SQ SN:chr2 LN:2000",
                "#columns: readID pairID chrom1 chrom2 pos1 pos2",
            ]
        );
    }

    #[test]
    fn test_metadata_to_header_missing_optional_fields() {
        let metadata: BTreeMap<String, Value> = serde_json::from_value(serde_json::json!({
            "format": "## pairs format v1.0",
            "shape": "upper triangle",
            "genome_assembly": "mm10",
            "chromsize": {},
            "samheader": [],
            "columns": ["a", "b", "c"],
        }))
        .unwrap();

        let header = metadata_to_header(&metadata);
        assert!(header.lines.contains(&"#columns: a b c".to_string()));
        assert!(header.lines.contains(&"#shape: upper triangle".to_string()));
        assert!(header.lines.contains(&"#genome_assembly: mm10".to_string()));
        assert!(header.fields("sorted").is_empty());
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let original = mock_header();
        let kv = header_to_metadata(&original).unwrap();
        let restored = PairsMetadata::from_kv(&kv).to_header();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_round_trip_fixes_field_order() {
        let shuffled = lines(&[
            "## pairs format v1.0.0",
            "#columns: a b",
            "#chromsize: chr1 10",
            "#shape: upper triangle",
        ]);
        let restored = PairsMetadata::from_kv(&header_to_metadata(&shuffled).unwrap()).to_header();

        assert_eq!(
            restored.lines,
            vec![
                "## pairs format v1.0.0",
                "#shape: upper triangle",
                "#chromsize: chr1 10",
                "#columns: a b",
            ]
        );
    }

    #[test]
    fn test_extension_fields_survive() {
        let header = lines(&[
            "## pairs format v1.0.0",
            "#chromosomes: chr1 chr2",
            "#columns: a",
        ]);
        let kv = header_to_metadata(&header).unwrap();
        assert_eq!(kv["chromosomes"], "\"chr1 chr2\"");

        let restored = PairsMetadata::from_kv(&kv).to_header();
        assert_eq!(restored.fields("chromosomes"), vec!["chr1 chr2"]);
    }

    #[test]
    fn test_unusual_field_names_round_trip_as_text() {
        let header = lines(&[
            "## pairs format v1.0.0",
            "#foo-bar: baz",
            "#chromosomes: chr1 chr2",
            "#columns: readID chrom1 pos1",
        ]);

        let kv = header_to_metadata(&header).unwrap();
        assert!(!kv.contains_key("foo-bar"));
        assert_eq!(kv["chromosomes"], "\"chr1 chr2\"");

        let rebuilt = PairsMetadata::from_kv(&kv).to_header();
        assert!(rebuilt.lines.iter().any(|l| l == "#foo-bar: baz"));
        assert!(rebuilt.lines.iter().any(|l| l == "#chromosomes: chr1 chr2"));
        assert_eq!(header_to_metadata(&rebuilt).unwrap(), kv);
    }

    #[test]
    fn test_foreign_keys_are_skipped() {
        let mut kv = BTreeMap::new();
        kv.insert("ARROW:schema".to_string(), "\"/////\"".to_string());
        kv.insert("columns".to_string(), r#"["a","b"]"#.to_string());

        let metadata = PairsMetadata::from_kv(&kv);
        assert!(metadata.extensions.is_empty());
        assert_eq!(metadata.columns, vec!["a", "b"]);
    }

    #[test]
    fn test_corrupt_value_does_not_abort() {
        let mut kv = BTreeMap::new();
        kv.insert("shape".to_string(), "\"broken".to_string());
        kv.insert("columns".to_string(), r#"["a","b"]"#.to_string());

        let metadata = PairsMetadata::from_kv(&kv);
        assert!(metadata.shape.unwrap().starts_with("JSONDecodeError"));
        assert_eq!(metadata.columns, vec!["a", "b"]);
    }
}
