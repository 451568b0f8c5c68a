use std::collections::HashSet;

use thiserror::Error;

/// Marker that starts every header line
pub const COMMENT_CHAR: char = '#';

/// Separator between `#samheader:` and the SAM record
const SAMHEADER_PREFIX: &str = "#samheader: ";

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid chromsize line '{0}': expected '<name> <size>'")]
    InvalidChromsize(String),
}

/// The header of a .pairs file: every leading line that starts with `#`.
///
/// Lines are stored without their trailing newline. Field lines have the
/// shape `#key: value`, the single `#columns:` line declares the body
/// columns, and anything else (e.g. `## pairs format v1.0.0`) is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairsHeader {
    pub lines: Vec<String>,
}

impl PairsHeader {
    #[must_use]
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Split the header into the payloads of `#<field_name>:` lines and all
    /// remaining lines, both in their original order.
    #[must_use]
    pub fn extract_fields(&self, field_name: &str) -> (Vec<String>, Vec<String>) {
        let prefix = format!("{COMMENT_CHAR}{field_name}:");
        let mut values = Vec::new();
        let mut rest = Vec::new();

        for line in &self.lines {
            if let Some(value) = line.strip_prefix(&prefix) {
                values.push(value.trim().to_string());
            } else {
                rest.push(line.clone());
            }
        }

        (values, rest)
    }

    /// Payloads of all `#<field_name>:` lines
    #[must_use]
    pub fn fields(&self, field_name: &str) -> Vec<String> {
        self.extract_fields(field_name).0
    }

    /// Distinct field names in first-seen order.
    ///
    /// A line names a field when its first whitespace-separated token is
    /// `#name:` (any number of leading `#`). Format lines such as
    /// `## pairs format v1.0.0` do not name a field.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for line in &self.lines {
            let Some(token) = line.split_whitespace().next() else {
                continue;
            };
            let Some(name) = token
                .trim_start_matches(COMMENT_CHAR)
                .strip_suffix(':')
            else {
                continue;
            };
            if !name.is_empty() && seen.insert(name.to_string()) {
                names.push(name.to_string());
            }
        }

        names
    }

    /// Column names declared by the `#columns:` line, empty when absent
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.fields("columns")
            .first()
            .map(|cols| cols.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Ordered `(chromosome, size)` pairs from `#chromsize:` lines
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::InvalidChromsize` if a line does not hold a name
    /// followed by an integer size.
    pub fn chromsizes(&self) -> Result<Vec<(String, u64)>, HeaderError> {
        self.fields("chromsize")
            .iter()
            .map(|value| parse_chromsize(value))
            .collect()
    }

    /// Replace the payload of the `#columns:` line, appending one if missing.
    pub fn set_columns(&mut self, columns: &[String]) {
        self.set_field("columns", &columns.join(" "));
    }

    /// Replace the first `#<field_name>:` line (dropping any duplicates), or
    /// insert one just before the `#columns:` line.
    pub fn set_field(&mut self, field_name: &str, value: &str) {
        let prefix = format!("{COMMENT_CHAR}{field_name}:");
        let new_line = format!("{prefix} {value}");

        let mut replaced = false;
        let mut lines = Vec::with_capacity(self.lines.len() + 1);
        for line in self.lines.drain(..) {
            if line.starts_with(&prefix) {
                if !replaced {
                    lines.push(new_line.clone());
                    replaced = true;
                }
            } else {
                lines.push(line);
            }
        }

        if !replaced {
            let at = lines
                .iter()
                .position(|l| l.starts_with("#columns:"))
                .unwrap_or(lines.len());
            lines.insert(at, new_line);
        }

        self.lines = lines;
    }

    /// Record a program run in the SAM header part of the pairs header.
    ///
    /// A new `@PG` line is chained (via `PP`) onto every existing `@PG` chain
    /// tail. IDs already in use get a numeric suffix.
    pub fn append_pg(&mut self, id: &str, program: &str, version: &str, command_line: &str) {
        let (samheader, other) = self.extract_fields("samheader");

        let mut leading = Vec::new();
        let mut programs = Vec::new();
        let mut comments = Vec::new();
        let mut others = Vec::new();
        for record in samheader {
            match record.get(..3) {
                Some("@HD" | "@SQ" | "@RG") => leading.push(record),
                Some("@PG") => programs.push(record),
                Some("@CO") => comments.push(record),
                _ => others.push(record),
            }
        }

        let ids: Vec<String> = programs
            .iter()
            .filter_map(|pg| sam_tag(pg, "ID"))
            .map(str::to_string)
            .collect();
        let referenced: HashSet<&str> = programs.iter().filter_map(|pg| sam_tag(pg, "PP")).collect();
        let tails: Vec<&String> = ids.iter().filter(|id| !referenced.contains(id.as_str())).collect();

        let mut taken: HashSet<String> = ids.iter().cloned().collect();
        let mut new_programs = Vec::new();
        let parents: Vec<Option<&String>> = if tails.is_empty() {
            vec![None]
        } else {
            tails.into_iter().map(Some).collect()
        };
        for parent in parents {
            let unique_id = unique_pg_id(id, &taken);
            taken.insert(unique_id.clone());

            let record =
                format!("@PG\tID:{unique_id}\tPN:{program}\tVN:{version}\tCL:{command_line}");
            new_programs.push(match parent {
                Some(parent) => format!("{record}\tPP:{parent}"),
                None => record,
            });
        }

        let samheader: Vec<String> = leading
            .into_iter()
            .chain(programs)
            .chain(new_programs)
            .chain(comments)
            .chain(others)
            .collect();

        self.lines = insert_samheader(other, &samheader);
    }

    /// Keep only the chromosomes in `chroms` in the `#chromsize:`,
    /// `#samheader: @SQ` and `#chromosomes:` lines.
    pub fn subset_chroms(&mut self, chroms: &[String]) {
        let keep: HashSet<&str> = chroms.iter().map(String::as_str).collect();

        let lines = std::mem::take(&mut self.lines);
        self.lines = lines
            .into_iter()
            .filter_map(|line| {
                if let Some(value) = line.strip_prefix("#chromosomes:") {
                    let subset: Vec<&str> = value
                        .split_whitespace()
                        .filter(|c| keep.contains(c))
                        .collect();
                    return Some(format!("#chromosomes: {}", subset.join(" ")));
                }
                if let Some(value) = line.strip_prefix("#chromsize:") {
                    let chrom = value.split_whitespace().next().unwrap_or_default();
                    return keep.contains(chrom).then_some(line);
                }
                if let Some(record) = line.strip_prefix(SAMHEADER_PREFIX) {
                    if record.starts_with("@SQ") {
                        let chrom = sam_tag(record, "SN").unwrap_or_default();
                        return keep.contains(chrom).then_some(line);
                    }
                }
                Some(line)
            })
            .collect();
    }
}

/// Parse one `#chromsize:` payload (`<name> <size>`)
///
/// # Errors
///
/// Returns `HeaderError::InvalidChromsize` if the size is missing or not an
/// integer.
pub fn parse_chromsize(value: &str) -> Result<(String, u64), HeaderError> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next().map(str::parse::<u64>)) {
        (Some(name), Some(Ok(size))) => Ok((name.to_string(), size)),
        _ => Err(HeaderError::InvalidChromsize(value.to_string())),
    }
}

/// Value of a `TAG:value` field of a tab-separated SAM header record
fn sam_tag<'a>(record: &'a str, tag: &str) -> Option<&'a str> {
    record
        .split('\t')
        .skip(1)
        .find_map(|field| field.strip_prefix(tag)?.strip_prefix(':'))
}

fn unique_pg_id(id: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(id) {
        return id.to_string();
    }
    (1..)
        .map(|n| format!("{id}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| id.to_string())
}

/// Put samheader records back in front of the `#columns:` line
fn insert_samheader(lines: Vec<String>, samheader: &[String]) -> Vec<String> {
    let (columns, mut header): (Vec<String>, Vec<String>) =
        lines.into_iter().partition(|l| l.starts_with("#columns"));

    header.extend(samheader.iter().map(|r| format!("{SAMHEADER_PREFIX}{r}")));
    header.extend(columns);
    header
}
