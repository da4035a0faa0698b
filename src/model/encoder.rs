use burn::config::Config;
use burn::module::{Ignored, Module};
use burn::prelude::Backend;
use burn::tensor::{Bool, Tensor};
use itertools::Itertools;

use crate::config::Directionality;
use crate::error::ConfigurationError;
use crate::init::{ParamVisitor, VisitParams};
use crate::mask::{attention_ignore_mask, future_mask, past_mask};
use crate::model::encoder::block::{EncoderBlock, EncoderBlockConfig};

pub mod attention;
pub mod block;

/// A stack of `num_layers` blocks built from one block prototype and wired for a direction.
#[derive(Config, Debug)]
pub struct DirectionalEncoderConfig {
    pub block: EncoderBlockConfig,
    pub num_layers: usize,
    #[config(default = "Directionality::Bidirectional")]
    pub direction: Directionality,
}

impl DirectionalEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<DirectionalEncoder<B>, ConfigurationError> {
        if self.num_layers < 1 {
            return Err(ConfigurationError::EmptyEncoder(self.num_layers));
        }

        Ok(DirectionalEncoder {
            layers: (0..self.num_layers)
                .map(|_| self.block.init(device))
                .collect_vec(),
            direction: Ignored(self.direction),
        })
    }
}

#[derive(Module, Debug)]
pub struct DirectionalEncoder<B: Backend> {
    layers: Vec<EncoderBlock<B>>,
    direction: Ignored<Directionality>,
}

impl<B: Backend> DirectionalEncoder<B> {
    pub fn direction(&self) -> Directionality {
        self.direction.0
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// query x key mask contributed by the direction alone, `None` when every key is visible.
    pub fn direction_mask(&self, seq: usize, device: &B::Device) -> Option<Tensor<B, 2, Bool>> {
        match self.direction.0 {
            Directionality::Bidirectional => None,
            Directionality::Forward => Some(future_mask(seq, device)),
            Directionality::Backward => Some(past_mask(seq, device)),
        }
    }

    /// `hidden` is seq x batch x hidden, `padding_mask` is batch x seq.
    pub fn forward(&self, hidden: Tensor<B, 3>, padding_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let [seq, _, _] = hidden.dims();

        let ignore_mask = attention_ignore_mask(padding_mask, self.direction_mask(seq, &hidden.device()));

        let mut hidden = hidden;
        for layer in &self.layers {
            hidden = layer.forward(hidden, ignore_mask.clone());
        }

        hidden
    }
}

impl<B: Backend> VisitParams<B> for DirectionalEncoder<B> {
    fn visit_params<V: ParamVisitor<B>>(mut self, visitor: &mut V) -> Self {
        self.layers = self
            .layers
            .into_iter()
            .map(|layer| layer.visit_params(visitor))
            .collect_vec();
        self
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;
    use burn::prelude::Int;
    use burn::tensor::Distribution;

    use super::*;

    fn encoder(direction: Directionality, num_layers: usize) -> Result<DirectionalEncoder<NdArray>, ConfigurationError> {
        DirectionalEncoderConfig::new(EncoderBlockConfig::new(16, 4, 32), num_layers)
            .with_direction(direction)
            .init(&NdArrayDevice::Cpu)
    }

    fn padding(rows: &[&[i64]]) -> Tensor<NdArray, 2, Bool> {
        let [batch, seq] = [rows.len(), rows[0].len()];
        let flat = rows.iter().flat_map(|row| row.iter().copied()).collect_vec();

        Tensor::<NdArray, 1, Int>::from_ints(flat.as_slice(), &NdArrayDevice::Cpu)
            .reshape([batch, seq])
            .bool()
    }

    // seq x 1 x hidden slice for one batch element
    fn batch_item(hidden: Tensor<NdArray, 3>, item: usize, positions: std::ops::Range<usize>) -> Vec<f32> {
        let [_, _, width] = hidden.dims();

        hidden
            .slice([positions, item..item + 1, 0..width])
            .into_data()
            .to_vec::<f32>()
            .unwrap()
    }

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-5, "{x} != {y}");
        }
    }

    #[test]
    fn zero_layers_is_a_configuration_error() {
        let err = encoder(Directionality::Forward, 0).unwrap_err();

        assert_eq!(err, ConfigurationError::EmptyEncoder(0));
    }

    #[test]
    fn stack_has_requested_depth_and_direction() {
        let encoder = encoder(Directionality::Backward, 3).unwrap();

        assert_eq!(encoder.num_layers(), 3);
        assert_eq!(encoder.direction(), Directionality::Backward);
        assert!(encoder.direction_mask(4, &NdArrayDevice::Cpu).is_some());
    }

    #[test]
    fn bidirectional_stack_has_no_direction_mask() {
        let encoder = encoder(Directionality::Bidirectional, 1).unwrap();

        assert!(encoder.direction_mask(4, &NdArrayDevice::Cpu).is_none());
    }

    #[test]
    fn padded_features_do_not_leak_into_real_positions() {
        let device = NdArrayDevice::Cpu;
        let encoder = encoder(Directionality::Bidirectional, 2).unwrap();

        let hidden = Tensor::<NdArray, 3>::random([5, 2, 16], Distribution::Default, &device);
        let noise = Tensor::<NdArray, 3>::random([2, 2, 16], Distribution::Default, &device);
        let perturbed = hidden.clone().slice_assign([3..5, 0..2, 0..16], noise);

        let mask = || padding(&[&[0, 0, 0, 1, 1], &[0, 0, 0, 1, 1]]);
        let output = encoder.forward(hidden, mask());
        let perturbed_output = encoder.forward(perturbed, mask());

        for item in 0..2 {
            assert_close(
                &batch_item(output.clone(), item, 0..3),
                &batch_item(perturbed_output.clone(), item, 0..3),
            );
        }
    }

    #[test]
    fn layers_have_independent_parameters() {
        let device = NdArrayDevice::Cpu;
        let encoder = encoder(Directionality::Bidirectional, 2).unwrap();

        let hidden = Tensor::<NdArray, 3>::random([3, 1, 16], Distribution::Default, &device);
        let mask = padding(&[&[0, 0, 0]]);
        let ignore = attention_ignore_mask(mask, None);

        let first = encoder.layers[0].forward(hidden.clone(), ignore.clone());
        let second = encoder.layers[1].forward(hidden, ignore);

        let first = first.into_data().to_vec::<f32>().unwrap();
        let second = second.into_data().to_vec::<f32>().unwrap();
        assert!(first.iter().zip(&second).any(|(a, b)| (a - b).abs() > 1e-6));
    }
}
