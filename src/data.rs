use burn::prelude::{Backend, Int, Tensor};
use itertools::Itertools;

use crate::error::ShapeError;

/// Rectangular batch of token id sequences, already padded to a common length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBatch {
    tokens: Vec<Vec<usize>>,
    seq_len: usize,
}

impl TokenBatch {
    pub fn new(tokens: Vec<Vec<usize>>) -> Result<Self, ShapeError> {
        let seq_len = tokens.first().map(Vec::len).ok_or(ShapeError::EmptyBatch)?;

        if seq_len == 0 {
            return Err(ShapeError::EmptyBatch);
        }

        if let Some((row, sequence)) = tokens.iter().find_position(|sequence| sequence.len() != seq_len) {
            return Err(ShapeError::Ragged {
                row,
                expected: seq_len,
                found: sequence.len(),
            });
        }

        Ok(Self { tokens, seq_len })
    }

    pub fn batch_size(&self) -> usize {
        self.tokens.len()
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.tokens
    }

    /// Fails on the first id that is not below `vocab_size`.
    pub fn check_vocabulary(&self, vocab_size: usize) -> Result<(), ShapeError> {
        for (row, sequence) in self.tokens.iter().enumerate() {
            if let Some((position, &token)) = sequence.iter().find_position(|&&token| token >= vocab_size) {
                return Err(ShapeError::TokenOutOfRange {
                    row,
                    position,
                    token,
                    vocab_size,
                });
            }
        }

        Ok(())
    }

    /// batch x seq
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2, Int> {
        let flat = self
            .tokens
            .iter()
            .flatten()
            .map(|&token| token as i64)
            .collect_vec();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape([self.batch_size(), self.seq_len])
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;

    use super::*;

    #[test]
    fn rectangular_batch_is_accepted() {
        let batch = TokenBatch::new(vec![vec![5, 7, 0, 0], vec![1, 2, 3, 0]]).unwrap();

        assert_eq!(batch.batch_size(), 2);
        assert_eq!(batch.seq_len(), 4);
    }

    #[test]
    fn ragged_batch_reports_offending_row() {
        let err = TokenBatch::new(vec![vec![1, 2, 3], vec![1, 2, 3], vec![4, 5]]).unwrap_err();

        assert_eq!(
            err,
            ShapeError::Ragged {
                row: 2,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn empty_batches_are_rejected() {
        assert_eq!(TokenBatch::new(vec![]), Err(ShapeError::EmptyBatch));
        assert_eq!(TokenBatch::new(vec![vec![], vec![]]), Err(ShapeError::EmptyBatch));
    }

    #[test]
    fn out_of_vocabulary_token_is_located() {
        let batch = TokenBatch::new(vec![vec![1, 2], vec![3, 50]]).unwrap();

        assert_eq!(batch.check_vocabulary(51), Ok(()));
        assert_eq!(
            batch.check_vocabulary(50),
            Err(ShapeError::TokenOutOfRange {
                row: 1,
                position: 1,
                token: 50,
                vocab_size: 50
            })
        );
    }

    #[test]
    fn tensor_keeps_batch_major_order() {
        let batch = TokenBatch::new(vec![vec![5, 7, 0], vec![1, 2, 3]]).unwrap();

        let tensor = batch.to_tensor::<NdArray>(&NdArrayDevice::Cpu);

        assert_eq!(tensor.dims(), [2, 3]);
        assert_eq!(tensor.into_data().to_vec::<i64>().unwrap(), vec![5, 7, 0, 1, 2, 3]);
    }
}
