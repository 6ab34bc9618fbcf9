use crate::error::{PipelineError, Result};

/// Normalize every sequence to exactly `max_len` tokens.
///
/// Shorter sequences are extended with `pad_value` at the end; longer
/// ones keep their first `max_len` tokens and drop the rest. Both are
/// the "post" policy, which decides what the model sees for long
/// reviews, so it must be applied with the same parameters to every
/// partition.
pub fn pad_sequences(sequences: &[Vec<u32>], pad_value: u32, max_len: usize) -> Vec<Vec<u32>> {
    sequences
        .iter()
        .map(|sequence| {
            let mut normalized: Vec<u32> = sequence.iter().copied().take(max_len).collect();
            normalized.resize(max_len, pad_value);
            normalized
        })
        .collect()
}

/// The training partition after the validation carve.
pub struct ValidationSplit {
    pub train_sequences: Vec<Vec<u32>>,
    pub train_labels: Vec<u8>,
    pub val_sequences: Vec<Vec<u32>>,
    pub val_labels: Vec<u8>,
}

/// Carve a validation set off the front of the training partition.
///
/// The first `validation_size` rows become validation; everything
/// after them stays train. Deterministic and exhaustive: the two
/// halves always add back up to the input.
pub fn validation_split(
    mut sequences: Vec<Vec<u32>>,
    mut labels: Vec<u8>,
    validation_size: usize,
) -> Result<ValidationSplit> {
    assert_eq!(sequences.len(), labels.len());
    if validation_size >= sequences.len() {
        return Err(PipelineError::Partition(format!(
            "validation size {} leaves no training rows out of {}",
            validation_size,
            sequences.len()
        )));
    }

    let train_sequences = sequences.split_off(validation_size);
    let train_labels = labels.split_off(validation_size);

    Ok(ValidationSplit {
        train_sequences,
        train_labels,
        val_sequences: sequences,
        val_labels: labels,
    })
}
