use super::convert::{run, ConvertRequest};
use super::PipelineError;

/// Value of the `#sorted:` field written by [`sort`]
pub const SORTED_MARKER: &str = "chr1-chr2-pos1-pos2";

/// Chromosomes compare by their position in the declared enum domain; pair
/// types compare as text whether they were read as enum or as VARCHAR
const SORT_ORDER: &str = "CAST(chrom1 AS CHROM_TYPE), CAST(chrom2 AS CHROM_TYPE), pos1, pos2, \
     CAST(pair_type AS VARCHAR)";

/// Sort a pairs or Parquet file by chrom1, chrom2, pos1, pos2 and pair type.
///
/// Input and output may each be text or Parquet. The output header records
/// the order in `#sorted: chr1-chr2-pos1-pos2`.
///
/// # Errors
///
/// Same as [`convert`](super::convert::convert); additionally an engine error
/// if a chromosome is missing from the header's chromosome sizes.
pub fn sort(request: &ConvertRequest) -> Result<Option<u64>, PipelineError> {
    run(request, Some(SORT_ORDER), |header| {
        header.set_field("sorted", SORTED_MARKER);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::convert::convert;
    use crate::pipeline::{Provenance, RunOptions};
    use std::path::PathBuf;

    #[test]
    fn test_sort_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pairs");
        let output = dir.path().join("out.pairs");
        std::fs::write(
            &input,
            "## pairs format v1.0.0\n\
#chromsize: chr2 200\n\
#chromsize: chr1 100\n\
#columns: readID chrom1 pos1 chrom2 pos2 strand1 strand2 pair_type\n\
r1\tchr2\t5\tchr2\t9\t+\t-\tUU\n\
r2\tchr1\t30\tchr2\t40\t+\t+\tUU\n\
r3\tchr1\t30\tchr1\t40\t-\t+\tRU\n\
r4\tchr1\t10\tchr1\t90\t+\t+\tUU\n\
r5\t!\t0\t!\t0\t-\t-\tNN\n",
        )
        .unwrap();

        let request = ConvertRequest {
            input,
            output: output.clone(),
            provenance: Provenance::from_env("pairs_to_parquet_sort"),
            options: RunOptions::default(),
        };
        assert_eq!(sort(&request).unwrap(), Some(5));

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("#sorted: chr1-chr2-pos1-pos2\n"));

        let order: Vec<&str> = text
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(|l| l.split('\t').next().unwrap())
            .collect();
        assert_eq!(order, vec!["r5", "r4", "r3", "r2", "r1"]);
    }

    fn body_order(path: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(|l| l.split('\t').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_pair_type_order_same_for_text_and_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ties.pairs");
        std::fs::write(
            &input,
            "## pairs format v1.0.0\n\
#chromsize: chr1 100\n\
#columns: readID chrom1 pos1 chrom2 pos2 strand1 strand2 pair_type\n\
r1\tchr1\t10\tchr1\t20\t+\t+\tNU\n\
r2\tchr1\t10\tchr1\t20\t+\t+\tMU\n\
r3\tchr1\t10\tchr1\t20\t+\t+\tUU\n",
        )
        .unwrap();
        let request = |input: PathBuf, output: PathBuf| ConvertRequest {
            input,
            output,
            provenance: Provenance::from_env("pairs_to_parquet_sort"),
            options: RunOptions::default(),
        };

        let from_text = dir.path().join("from_text.pairs");
        sort(&request(input.clone(), from_text.clone())).unwrap();

        let parquet = dir.path().join("ties.parquet");
        convert(&request(input, parquet.clone())).unwrap();
        let from_parquet = dir.path().join("from_parquet.pairs");
        sort(&request(parquet, from_parquet.clone())).unwrap();

        assert_eq!(body_order(&from_text), vec!["r2", "r1", "r3"]);
        assert_eq!(body_order(&from_parquet), body_order(&from_text));
    }

    #[test]
    fn test_sort_rejects_bad_output() {
        let request = ConvertRequest {
            input: PathBuf::from("in.pairs"),
            output: PathBuf::from("out.txt"),
            provenance: Provenance::from_env("pairs_to_parquet_sort"),
            options: RunOptions::default(),
        };
        assert!(matches!(sort(&request), Err(PipelineError::InvalidPath(_))));
    }
}
