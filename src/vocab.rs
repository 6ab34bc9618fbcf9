use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Reserved control token ids. Real words start at id 4.
pub const PAD_ID: u32 = 0;
pub const START_ID: u32 = 1;
pub const UNK_ID: u32 = 2;
pub const UNUSED_ID: u32 = 3;

/// How far every raw corpus id is shifted to make room for the
/// control tokens.
const RESERVED_SHIFT: u32 = 3;

/// Bidirectional word <-> id map over the review vocabulary.
///
/// Built once from the collaborator's frequency-ranked map and
/// read-only afterwards. Only used for human inspection of reviews,
/// never for modeling.
pub struct WordIndex {
    word_to_id: HashMap<String, u32>,
    id_to_word: HashMap<u32, String>,
}

impl WordIndex {
    /// Build the index from the raw frequency-ranked map: shift every
    /// existing id up by 3, then insert the four control tokens.
    pub fn from_raw(raw: HashMap<String, u32>) -> Self {
        let mut word_to_id: HashMap<String, u32> = raw
            .into_iter()
            .map(|(word, id)| (word, id + RESERVED_SHIFT))
            .collect();
        word_to_id.insert("<PAD>".to_string(), PAD_ID);
        word_to_id.insert("<START>".to_string(), START_ID);
        word_to_id.insert("<UNK>".to_string(), UNK_ID);
        word_to_id.insert("<UNUSED>".to_string(), UNUSED_ID);

        let id_to_word: HashMap<u32, String> = word_to_id
            .iter()
            .map(|(word, &id)| (id, word.clone()))
            .collect();

        Self { word_to_id, id_to_word }
    }

    /// Load the raw map from its bincode file and build the index.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PipelineError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let raw: HashMap<String, u32> =
            bincode::deserialize_from(file).map_err(|e| PipelineError::WordIndex {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self::from_raw(raw))
    }

    /// Number of entries, control tokens included.
    pub fn len(&self) -> usize {
        self.word_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_to_id.is_empty()
    }

    pub fn id(&self, word: &str) -> Option<u32> {
        self.word_to_id.get(word).copied()
    }

    pub fn word(&self, id: u32) -> Option<&str> {
        self.id_to_word.get(&id).map(String::as_str)
    }

    /// Render a token sequence as a space-joined string, with `?`
    /// standing in for any id the index does not know.
    pub fn decode(&self, sequence: &[u32]) -> String {
        sequence
            .iter()
            .map(|&id| self.word(id).unwrap_or("?"))
            .collect::<Vec<&str>>()
            .join(" ")
    }

    /// Map whitespace-separated words back to ids, `<UNK>` for words
    /// outside the vocabulary.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        text.split_whitespace()
            .map(|word| self.id(word).unwrap_or(UNK_ID))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_index() -> WordIndex {
        let mut raw: HashMap<String, u32> = HashMap::new();
        raw.insert("the".to_string(), 1);
        raw.insert("movie".to_string(), 2);
        raw.insert("great".to_string(), 11);
        raw.insert("awful".to_string(), 19);
        raw.insert("plot".to_string(), 40);
        WordIndex::from_raw(raw)
    }

    #[test]
    fn it_shifts_raw_ids_and_reserves_control_tokens() {
        let index = small_index();
        assert_eq!(index.id("<PAD>"), Some(PAD_ID));
        assert_eq!(index.id("<START>"), Some(START_ID));
        assert_eq!(index.id("<UNK>"), Some(UNK_ID));
        assert_eq!(index.id("<UNUSED>"), Some(UNUSED_ID));
        // "the" had raw id 1, shifted to 4
        assert_eq!(index.id("the"), Some(4));
        assert_eq!(index.word(4), Some("the"));
    }

    #[test]
    fn it_decodes_unknown_ids_as_placeholder() {
        let index = small_index();
        let decoded = index.decode(&[START_ID, 4, 5, 999]);
        assert_eq!(decoded, "<START> the movie ?");
    }

    #[test]
    fn it_decodes_a_raw_review_prefix() {
        // The first ids of a review as the corpus stores them: the
        // leading 1 is <START>, 2s are <UNK>, anything unmapped is ?.
        let index = small_index();
        let decoded = index.decode(&[1, 14, 22, 16, 43, 2, 2, 5]);
        assert_eq!(decoded, "<START> great awful ? plot <UNK> <UNK> movie");
    }

    #[test]
    fn decode_then_encode_is_identity_for_known_words() {
        let index = small_index();
        let original: Vec<u32> = vec![START_ID, 4, 14, 22, 43, 5];
        let decoded = index.decode(&original);
        assert_eq!(index.encode(&decoded), original);
    }

    #[test]
    fn it_encodes_unknown_words_as_unk() {
        let index = small_index();
        assert_eq!(index.encode("the zzzz movie"), vec![4, UNK_ID, 5]);
    }

    #[test]
    fn it_round_trips_through_bincode() {
        let mut raw: HashMap<String, u32> = HashMap::new();
        raw.insert("fine".to_string(), 7);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("word_index.bin");
        let file = std::fs::File::create(&path).unwrap();
        bincode::serialize_into(file, &raw).unwrap();

        let index = WordIndex::load(&path).unwrap();
        assert_eq!(index.id("fine"), Some(10));
        assert_eq!(index.len(), 5);
    }
}
