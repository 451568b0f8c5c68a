use std::path::Path;

/// Read a chromosome list: the first tab-separated column of every line.
///
/// Accepts `.chrom.sizes` files as well as plain one-name-per-line lists.
/// Blank lines and `#` comments are skipped.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn read_chrom_file(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_chrom_text(&content))
}

/// Parse chromosome names from text, keeping order and dropping repeats
#[must_use]
pub fn parse_chrom_text(text: &str) -> Vec<String> {
    let mut chroms: Vec<String> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(name) = line.split('\t').next().map(str::trim) else {
            continue;
        };
        if !chroms.iter().any(|c| c == name) {
            chroms.push(name.to_string());
        }
    }

    chroms
}
