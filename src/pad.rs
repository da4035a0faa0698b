use itertools::Itertools;

use crate::data::TokenBatch;
use crate::error::ShapeError;

pub enum PaddingType {
    LongestSequence,
    Explicit(usize),
}

pub fn trim_sequence(mut sequence: Vec<usize>, len: usize) -> (Vec<usize>, usize) {
    sequence.truncate(len);

    (sequence, len)
}

pub fn pad_sequence(mut sequence: Vec<usize>, len: usize, padding_idx: usize) -> (Vec<usize>, usize) {
    let original_len = sequence.len();

    sequence.resize(len, padding_idx);

    (sequence, original_len)
}

fn pad_or_trim(sequences: Vec<Vec<usize>>, len: usize, padding_idx: usize) -> Vec<(Vec<usize>, usize)> {
    sequences
        .into_iter()
        .map(|sequence| match sequence.len() {
            original_len if len < original_len => trim_sequence(sequence, len),
            _ => pad_sequence(sequence, len, padding_idx),
        })
        .collect_vec()
}

/// Pads (or truncates) every sequence to a common length with `padding_idx`.
///
/// Returns the batch together with the number of real tokens kept from each sequence.
pub fn pad_sequences(
    sequences: Vec<Vec<usize>>,
    padding: PaddingType,
    padding_idx: usize,
) -> Result<(TokenBatch, Vec<usize>), ShapeError> {
    let len = match padding {
        PaddingType::Explicit(length) => length,
        PaddingType::LongestSequence => sequences.iter().map(Vec::len).max().unwrap_or(0),
    };

    let (sequences, lens): (Vec<_>, Vec<_>) = pad_or_trim(sequences, len, padding_idx).into_iter().unzip();

    Ok((TokenBatch::new(sequences)?, lens))
}
