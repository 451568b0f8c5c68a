//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

pub const HEADER: &str = "## pairs format v1.0.0
#sorted: none
#shape: upper triangle
#genome_assembly: test
#chromsize: chr1 1000
#chromsize: chr2 800
#chromsize: chr3 500
#chromosomes: chr1 chr2 chr3
#samheader: @SQ\tSN:chr1\tLN:1000
#samheader: @SQ\tSN:chr2\tLN:800
#samheader: @SQ\tSN:chr3\tLN:500
#samheader: @PG\tID:bwa\tPN:bwa\tVN:0.7.17
#columns: readID chrom1 pos1 chrom2 pos2 strand1 strand2 pair_type mapq1 mapq2
";

pub const BODY: &str = "r01\tchr1\t10\tchr1\t200\t+\t-\tUU\t60\t60
r02\tchr1\t60\tchr2\t30\t+\t+\tUU\t60\t10
r03\tchr2\t5\tchr2\t90\t-\t+\tRU\t0\t60
r04\tchr1\t40\tchr3\t15\t-\t-\tUR\t30\t30
r05\t!\t0\t!\t0\t-\t-\tNN\t0\t0
r06\tchr3\t120\tchr3\t250\t+\t-\tUU\t60\t60
r07\tchr2\t50\tchr3\t60\t+\t+\tMU\t5\t60
r08\tchr1\t100\tchr1\t150\t-\t+\tUU\t60\t60
";

pub const ALL_IDS: &[&str] = &["r01", "r02", "r03", "r04", "r05", "r06", "r07", "r08"];

/// Write the fixture as plain .pairs
pub fn write_pairs(dir: &Path) -> PathBuf {
    let path = dir.join("input.pairs");
    std::fs::write(&path, format!("{HEADER}{BODY}")).unwrap();
    path
}

/// Write the fixture as gzip-compressed .pairs.gz
pub fn write_pairs_gz(dir: &Path) -> PathBuf {
    let path = dir.join("input.pairs.gz");
    let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
    encoder.write_all(HEADER.as_bytes()).unwrap();
    encoder.write_all(BODY.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

/// Read a text output: (header lines, body lines)
pub fn read_text(path: &Path) -> (Vec<String>, Vec<String>) {
    let text = if path.to_string_lossy().ends_with(".gz") {
        use std::io::Read;
        let mut text = String::new();
        flate2::read::MultiGzDecoder::new(std::fs::File::open(path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        text
    } else {
        std::fs::read_to_string(path).unwrap()
    };

    text.lines()
        .map(str::to_string)
        .partition(|line| line.starts_with('#'))
}

/// Sorted read IDs of a text output
pub fn read_ids(path: &Path) -> Vec<String> {
    let (_, body) = read_text(path);
    let mut ids: Vec<String> = body
        .iter()
        .map(|line| line.split('\t').next().unwrap_or_default().to_string())
        .collect();
    ids.sort();
    ids
}

pub fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}
