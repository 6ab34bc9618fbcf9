//! Binary sentiment classification over the pre-tokenized IMDB
//! review corpus: load the train/test partitions, normalize every
//! review to 256 tokens, train an embedding/average-pooling/dense
//! classifier with Adam, evaluate once on the test partition and
//! chart the loss/accuracy curves.

pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod preprocessing;
pub mod reporting;
pub mod vocab;

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    use crate::config::Config;
    use crate::pipeline;

    /// Write a balanced fixture corpus and word index, returning a
    /// config that points at them.
    fn fixture_config(dir: &std::path::Path) -> Config {
        let write_partition = |name: &str| -> PathBuf {
            let path = dir.join(name);
            let mut file = std::fs::File::create(&path).unwrap();
            for i in 0..8u32 {
                let label = i % 2;
                let token = if label == 1 { 10 } else { 20 };
                let row: Vec<String> = std::iter::repeat(token.to_string())
                    .take(30 + i as usize)
                    .collect();
                writeln!(file, "{},1 {}", label, row.join(" ")).unwrap();
            }
            path
        };
        let train_csv = write_partition("train.csv");
        let test_csv = write_partition("test.csv");

        let mut raw: HashMap<String, u32> = HashMap::new();
        raw.insert("good".to_string(), 7);
        raw.insert("bad".to_string(), 17);
        let word_index_path = dir.join("word_index.bin");
        let file = std::fs::File::create(&word_index_path).unwrap();
        bincode::serialize_into(file, &raw).unwrap();

        Config {
            train_csv,
            test_csv,
            word_index_path,
            partition_rows: 8,
            validation_size: 4,
            epochs: 2,
            batch_size: 4,
            seed: 3,
            ..Config::default()
        }
    }

    #[test]
    fn it_runs_the_whole_pipeline_on_a_fixture_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = fixture_config(dir.path());

        let outcome = pipeline::run(&cfg).unwrap();

        assert_eq!(outcome.history.epochs(), cfg.epochs);
        assert_eq!(outcome.history.val_loss.len(), cfg.epochs);
        assert_eq!(outcome.history.val_accuracy.len(), cfg.epochs);
        assert!(outcome.evaluation.loss.is_finite());
        assert!((0.0..=1.0).contains(&outcome.evaluation.accuracy));
    }

    #[test]
    fn it_aborts_when_the_corpus_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            train_csv: dir.path().join("absent.csv"),
            ..Config::default()
        };
        assert!(pipeline::run(&cfg).is_err());
    }
}
