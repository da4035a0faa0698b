use burn::prelude::{Backend, Int};
use burn::tensor::{Bool, Tensor};

/// True wherever a token equals the padding index.
pub fn padding_mask<B: Backend>(tokens: Tensor<B, 2, Int>, padding_idx: usize) -> Tensor<B, 2, Bool> {
    tokens.equal_elem(padding_idx as i64)
}

// row index and column index of every cell in a seq x seq grid
fn grid<B: Backend>(seq: usize, device: &B::Device) -> (Tensor<B, 2, Int>, Tensor<B, 2, Int>) {
    let range = Tensor::<B, 1, Int>::arange(0..seq as i64, device);

    let rows = range.clone().unsqueeze_dim::<2>(1).expand([seq, seq]);
    let cols = range.unsqueeze_dim::<2>(0).expand([seq, seq]);

    (rows, cols)
}

/// query x key, true where the key lies after the query.
pub fn future_mask<B: Backend>(seq: usize, device: &B::Device) -> Tensor<B, 2, Bool> {
    let (rows, cols) = grid::<B>(seq, device);
    cols.greater(rows)
}

/// query x key, true where the key lies before the query.
pub fn past_mask<B: Backend>(seq: usize, device: &B::Device) -> Tensor<B, 2, Bool> {
    let (rows, cols) = grid::<B>(seq, device);
    cols.lower(rows)
}

/// Combines a batch x seq padding mask with an optional seq x seq directional mask into the
/// batch x query x key mask consumed by attention.
///
/// A query left without any visible key keeps its own position visible, so every softmax row
/// stays finite and never sees more than the query itself.
pub fn attention_ignore_mask<B: Backend>(
    padding_mask: Tensor<B, 2, Bool>,
    direction_mask: Option<Tensor<B, 2, Bool>>,
) -> Tensor<B, 3, Bool> {
    let [batch, seq] = padding_mask.dims();
    let device = padding_mask.device();

    let mut ignore = padding_mask
        .int()
        .unsqueeze_dim::<3>(1)
        .expand([batch, seq, seq]);

    if let Some(direction_mask) = direction_mask {
        let direction = direction_mask
            .int()
            .unsqueeze_dim::<3>(0)
            .expand([batch, seq, seq]);
        ignore = (ignore + direction).greater_elem(0).int();
    }

    let blocked_rows = ignore
        .clone()
        .sum_dim(2)
        .equal_elem(seq as i64)
        .int()
        .expand([batch, seq, seq]);

    let (rows, cols) = grid::<B>(seq, &device);
    let diagonal = rows.equal(cols).int().unsqueeze_dim::<3>(0).expand([batch, seq, seq]);

    (ignore - blocked_rows * diagonal).greater_elem(0)
}
