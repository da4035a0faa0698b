use std::fmt;
use std::str::FromStr;

use burn::config::Config;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

pub mod presets;

/// Where layer normalization sits relative to each sublayer of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormPlacement {
    #[serde(rename = "pre")]
    PreNorm,
    #[serde(rename = "post")]
    PostNorm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationKind {
    Gelu,
    Relu,
}

/// Which positions a query position is allowed to attend to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directionality {
    /// Every position sees every non-padding position.
    Bidirectional,
    /// Position `i` sees positions `<= i`.
    Forward,
    /// Position `i` sees positions `>= i`.
    Backward,
}

impl FromStr for NormPlacement {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre" | "prenorm" => Ok(NormPlacement::PreNorm),
            "post" | "postnorm" => Ok(NormPlacement::PostNorm),
            other => Err(ConfigurationError::UnknownTag {
                kind: "normalization placement",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for ActivationKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gelu" => Ok(ActivationKind::Gelu),
            "relu" => Ok(ActivationKind::Relu),
            other => Err(ConfigurationError::UnknownTag {
                kind: "activation",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Directionality {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bidirectional" => Ok(Directionality::Bidirectional),
            "forward" => Ok(Directionality::Forward),
            "backward" => Ok(Directionality::Backward),
            other => Err(ConfigurationError::UnknownTag {
                kind: "directionality",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for NormPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormPlacement::PreNorm => f.write_str("prenorm"),
            NormPlacement::PostNorm => f.write_str("postnorm"),
        }
    }
}

impl fmt::Display for ActivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationKind::Gelu => f.write_str("gelu"),
            ActivationKind::Relu => f.write_str("relu"),
        }
    }
}

impl fmt::Display for Directionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directionality::Bidirectional => f.write_str("bidirectional"),
            Directionality::Forward => f.write_str("forward"),
            Directionality::Backward => f.write_str("backward"),
        }
    }
}

#[derive(Config, Debug)]
pub struct StreamConfig {
    /// Number of distinct token ids.
    pub vocab_size: usize,
    /// Width of the features produced for every token.
    pub hidden_size: usize,
    /// Inner width of each block's feed-forward sublayer.
    pub feedforward_size: usize,
    pub attention_heads: usize,
    /// Number of stacked encoder blocks.
    pub num_layers: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
    #[config(default = "NormPlacement::PreNorm")]
    pub norm_type: NormPlacement,
    #[config(default = "ActivationKind::Gelu")]
    pub activation: ActivationKind,
    #[config(default = "Directionality::Bidirectional")]
    pub direction: Directionality,
    /// Token id used to pad sequences to a common length.
    #[config(default = 0)]
    pub padding_idx: usize,
    /// Size of the learned positional table.
    #[config(default = 30)]
    pub max_sequence_length: usize,
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let dimensions = [
            ("vocab_size", self.vocab_size),
            ("hidden_size", self.hidden_size),
            ("feedforward_size", self.feedforward_size),
            ("attention_heads", self.attention_heads),
            ("max_sequence_length", self.max_sequence_length),
        ];
        if let Some((name, _)) = dimensions.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigurationError::ZeroDimension(name));
        }

        if self.num_layers < 1 {
            return Err(ConfigurationError::EmptyEncoder(self.num_layers));
        }

        if self.hidden_size % self.attention_heads != 0 {
            return Err(ConfigurationError::IndivisibleHeads {
                hidden_size: self.hidden_size,
                attention_heads: self.attention_heads,
            });
        }

        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ConfigurationError::InvalidDropout(self.dropout));
        }

        if self.padding_idx >= self.vocab_size {
            return Err(ConfigurationError::PaddingOutOfRange {
                padding_idx: self.padding_idx,
                vocab_size: self.vocab_size,
            });
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: StreamConfig = serde_json::from_str(json)?;
        config.validate()?;

        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigurationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn textual_feature_size(&self) -> usize {
        self.hidden_size
    }
}
