use burn::prelude::{Backend, Tensor};
use burn::tensor::Distribution;

/// batch x seq x hidden -> seq x batch x hidden
pub fn to_sequence_major<B: Backend>(hidden: Tensor<B, 3>) -> Tensor<B, 3> {
    hidden.swap_dims(0, 1)
}

/// seq x batch x hidden -> batch x seq x hidden
pub fn to_batch_major<B: Backend>(hidden: Tensor<B, 3>) -> Tensor<B, 3> {
    hidden.swap_dims(0, 1)
}

/// Fresh samples from N(0, std) with the shape and device of `tensor`.
pub fn normal_like<B: Backend, const D: usize>(tensor: &Tensor<B, D>, std: f64) -> Tensor<B, D> {
    Tensor::random(tensor.shape(), Distribution::Normal(0.0, std), &tensor.device())
}

pub fn zero_row<B: Backend>(tensor: Tensor<B, 2>, row: usize) -> Tensor<B, 2> {
    let [_, cols] = tensor.dims();
    let device = tensor.device();

    tensor.slice_assign([row..row + 1, 0..cols], Tensor::zeros([1, cols], &device))
}
