use std::path::PathBuf;

use crate::model::{MAX_LEN, VOCAB_SIZE};

/// All hyperparameters and data locations for one training run.
///
/// The defaults reproduce the original tutorial setup exactly. The
/// embedding width, hidden width and sequence length are fixed at the
/// type level in [`crate::model`]; the fields here are the runtime
/// knobs.
#[derive(Debug, Clone)]
pub struct Config {
    /// CSV of pre-tokenized training reviews (`label,id id id ...`).
    pub train_csv: PathBuf,
    /// CSV of pre-tokenized test reviews, same format.
    pub test_csv: PathBuf,
    /// Bincode-encoded word -> raw-id map from the corpus collaborator.
    pub word_index_path: PathBuf,
    /// Vocabulary cutoff: every token id must be below this. The
    /// embedding table is sized at the type level, so this must stay
    /// equal to [`crate::model::VOCAB_SIZE`].
    pub num_words: u32,
    /// Normalized review length in tokens. The model input shape is
    /// fixed at the type level, so this must stay equal to
    /// [`crate::model::MAX_LEN`].
    pub max_len: usize,
    /// Rows expected in each of the train and test partitions.
    pub partition_rows: usize,
    /// Rows carved off the front of the training partition for validation.
    pub validation_size: usize,
    /// Full passes over the (post-split) training subset.
    pub epochs: usize,
    /// Mini-batch size; the last batch of an epoch may be smaller.
    pub batch_size: usize,
    /// Reshuffle training rows before each epoch.
    ///
    /// The original relied on its framework's implicit default here;
    /// this makes the behavior an explicit, seeded knob.
    pub shuffle: bool,
    /// Seed for the shuffle RNG, so runs are reproducible.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            train_csv: PathBuf::from("data/imdb_train.csv"),
            test_csv: PathBuf::from("data/imdb_test.csv"),
            word_index_path: PathBuf::from("data/imdb_word_index.bin"),
            num_words: VOCAB_SIZE as u32,
            max_len: MAX_LEN,
            partition_rows: 25_000,
            validation_size: 10_000,
            epochs: 40,
            batch_size: 512,
            shuffle: true,
            seed: 0,
        }
    }
}
