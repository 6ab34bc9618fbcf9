use crate::config::Config;
use crate::dataset;
use crate::error::Result;
use crate::model::{self, Evaluation, TrainingHistory};
use crate::preprocessing;
use crate::reporting;
use crate::vocab::{self, WordIndex};

/// Everything a run produces, returned explicitly instead of living
/// in ambient script state.
pub struct PipelineOutcome {
    pub history: TrainingHistory,
    pub evaluation: Evaluation,
}

/// The whole run, start to finish: acquire, map vocabulary,
/// normalize, train, evaluate, report. Strictly sequential; any
/// stage failure aborts the run.
pub fn run(cfg: &Config) -> Result<PipelineOutcome> {
    // the model fixes these two at the type level
    assert_eq!(cfg.num_words as usize, model::VOCAB_SIZE);
    assert_eq!(cfg.max_len, model::MAX_LEN);

    // 1. dataset acquisition
    let train = dataset::load_partition(&cfg.train_csv, cfg.num_words)?;
    let test = dataset::load_partition(&cfg.test_csv, cfg.num_words)?;
    dataset::validate_partition(&train, cfg.partition_rows)?;
    dataset::validate_partition(&test, cfg.partition_rows)?;
    println!(
        "Training entries: {}, labels: {}",
        train.len(),
        train.labels.len()
    );

    // 2. vocabulary mapping, for human inspection only
    let word_index = WordIndex::load(&cfg.word_index_path)?;
    tracing::debug!("word index entries: {}", word_index.len());
    if let Some(first) = train.sequences.first() {
        println!("{:?}", first);
        println!("{}", word_index.decode(first));
    }

    // 3. sequence normalization, identical parameters for both partitions
    let x_train = preprocessing::pad_sequences(&train.sequences, vocab::PAD_ID, cfg.max_len);
    let x_test = preprocessing::pad_sequences(&test.sequences, vocab::PAD_ID, cfg.max_len);

    let split = preprocessing::validation_split(x_train, train.labels, cfg.validation_size)?;
    tracing::info!(
        "validation carve: {} train rows, {} validation rows",
        split.train_sequences.len(),
        split.val_sequences.len()
    );

    // 4. model definition and training
    let (classifier, history) = model::train(
        &split.train_sequences,
        &split.train_labels,
        &split.val_sequences,
        &split.val_labels,
        cfg,
    )?;

    // 5. evaluation and reporting; the one and only read of the test
    // partition, after all training is done
    let evaluation = classifier.evaluate(&x_test, &test.labels, cfg.batch_size);
    tracing::info!(
        "test loss: {:.4}, test accuracy: {:.4}",
        evaluation.loss,
        evaluation.accuracy
    );
    reporting::print_history(&history)?;

    Ok(PipelineOutcome { history, evaluation })
}
