use csv::ReaderBuilder;
use ndarray::Array2;
use ndarray_csv::Array2Reader;

use std::fs::File;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// One side of the corpus: aligned reviews and labels.
///
/// Reviews are variable-length sequences of frequency-ranked token
/// ids; labels are 0 (negative) or 1 (positive). Immutable once
/// loaded.
#[derive(Debug)]
pub struct Partition {
    pub sequences: Vec<Vec<u32>>,
    pub labels: Vec<u8>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// Load one partition from its CSV file.
///
/// Each row is `label,id id id ...` with the ids space-joined in the
/// second column. Rows with a label outside {0, 1} or a token id at
/// or above `num_words` are rejected: the corpus is supposed to come
/// pre-filtered to the vocabulary cutoff, so either means a corrupt
/// file. Any failure here aborts the whole run.
pub fn load_partition(path: &Path, num_words: u32) -> Result<Partition> {
    let file: File = File::open(path).map_err(|e| PipelineError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = ReaderBuilder::new().has_headers(false).from_reader(file);
    let table: Array2<String> =
        reader
            .deserialize_array2_dynamic()
            .map_err(|e| PipelineError::CorpusTable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

    if table.ncols() != 2 {
        return Err(PipelineError::CorpusTable {
            path: path.to_path_buf(),
            message: format!("expected 2 columns, found {}", table.ncols()),
        });
    }

    let bad_row = |row: usize, message: String| PipelineError::CorpusRow {
        path: path.to_path_buf(),
        row,
        message,
    };

    let mut sequences: Vec<Vec<u32>> = Vec::with_capacity(table.nrows());
    let mut labels: Vec<u8> = Vec::with_capacity(table.nrows());
    for (row, record) in table.rows().into_iter().enumerate() {
        let label: u8 = record[0]
            .trim()
            .parse()
            .map_err(|_| bad_row(row, format!("label {:?} is not an integer", record[0])))?;
        if label > 1 {
            return Err(bad_row(row, format!("label {} is not 0 or 1", label)));
        }

        let mut sequence: Vec<u32> = Vec::new();
        for token in record[1].split_whitespace() {
            let id: u32 = token
                .parse()
                .map_err(|_| bad_row(row, format!("token {:?} is not an id", token)))?;
            if id >= num_words {
                return Err(bad_row(
                    row,
                    format!("token id {} is outside the {}-word vocabulary", id, num_words),
                ));
            }
            sequence.push(id);
        }

        sequences.push(sequence);
        labels.push(label);
    }

    tracing::debug!(
        "loaded {} reviews from {}",
        sequences.len(),
        path.display()
    );
    Ok(Partition { sequences, labels })
}

/// Enforce the partition contract: the expected row count and an
/// exact 50/50 split between positive and negative labels.
pub fn validate_partition(partition: &Partition, expected_rows: usize) -> Result<()> {
    if partition.len() != expected_rows {
        return Err(PipelineError::Partition(format!(
            "expected {} rows, found {}",
            expected_rows,
            partition.len()
        )));
    }
    let positives = partition.labels.iter().filter(|&&label| label == 1).count();
    let negatives = partition.len() - positives;
    if positives != negatives {
        return Err(PipelineError::Partition(format!(
            "unbalanced labels: {} positive vs {} negative",
            positives, negatives
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_corpus(rows: &[(u8, &str)]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        for (label, tokens) in rows {
            writeln!(file, "{},{}", label, tokens).unwrap();
        }
        (dir, path)
    }

    #[test]
    fn it_loads_labels_and_sequences() {
        let (_dir, path) = write_corpus(&[(1, "1 14 22 16"), (0, "1 43 2 5 9")]);
        let partition = load_partition(&path, 10_000).unwrap();
        assert_eq!(partition.len(), 2);
        assert_eq!(partition.sequences[0], vec![1, 14, 22, 16]);
        assert_eq!(partition.sequences[1], vec![1, 43, 2, 5, 9]);
        assert_eq!(partition.labels, vec![1, 0]);
    }

    #[test]
    fn it_rejects_out_of_vocabulary_ids() {
        let (_dir, path) = write_corpus(&[(1, "1 9999"), (0, "1 2")]);
        let err = load_partition(&path, 100).unwrap_err();
        assert!(err.to_string().contains("outside the 100-word vocabulary"));
    }

    #[test]
    fn it_rejects_bad_labels() {
        let (_dir, path) = write_corpus(&[(7, "1 2 3")]);
        let err = load_partition(&path, 10_000).unwrap_err();
        assert!(err.to_string().contains("not 0 or 1"));
    }

    #[test]
    fn it_fails_on_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(load_partition(&missing, 10_000).is_err());
    }

    #[test]
    fn validation_checks_row_count_and_balance() {
        let balanced = Partition {
            sequences: vec![vec![1], vec![2], vec![3], vec![4]],
            labels: vec![1, 0, 0, 1],
        };
        assert!(validate_partition(&balanced, 4).is_ok());
        assert!(validate_partition(&balanced, 25_000).is_err());

        let skewed = Partition {
            sequences: vec![vec![1], vec![2]],
            labels: vec![1, 1],
        };
        assert!(validate_partition(&skewed, 2).is_err());
    }
}
