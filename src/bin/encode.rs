use std::fs;

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::NdArray;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_subscriber::EnvFilter;

use textstream::config::presets;
use textstream::pad::{pad_sequences, PaddingType};
use textstream::{StreamConfig, StreamError};

type B = NdArray;

const VOCAB_SIZE: usize = 50;

fn encode_sample(config: &StreamConfig, captions: Vec<Vec<usize>>) -> Result<[usize; 3], StreamError> {
    let device = NdArrayDevice::Cpu;
    let stream = config.init::<B>(&device)?;
    info!(
        direction = %stream.direction(),
        feature_size = stream.textual_feature_size(),
        "stream ready"
    );

    let (batch, lens) = pad_sequences(captions, PaddingType::LongestSequence, config.padding_idx)?;
    info!(?lens, seq_len = batch.seq_len(), "padded captions");

    Ok(stream.encode(&batch)?.dims())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = fs::read_to_string(&path).wrap_err_with(|| format!("reading config {path}"))?;
            StreamConfig::from_json(&json)?
        }
        None => presets::small(VOCAB_SIZE),
    };

    let shape = encode_sample(&config, vec![vec![5, 7], vec![1, 2, 3], vec![9]])?;
    info!(?shape, "encoded batch");

    Ok(())
}
