use crate::config::{ActivationKind, Directionality, NormPlacement, StreamConfig};
use crate::error::ConfigurationError;

/// Width of a single attention head in architecture-name presets.
const HEAD_SIZE: usize = 64;

pub fn small(vocab_size: usize) -> StreamConfig {
    let hidden_size = 256;

    StreamConfig::new(vocab_size, hidden_size, 4 * hidden_size, hidden_size / HEAD_SIZE, 1)
}

pub fn base(vocab_size: usize) -> StreamConfig {
    let hidden_size = 512;

    StreamConfig::new(vocab_size, hidden_size, 4 * hidden_size, hidden_size / HEAD_SIZE, 1)
        .with_norm_type(NormPlacement::PostNorm)
}

/// Builds a config from a name like `transformer_postnorm_gelu_512_1`, optionally suffixed with
/// `_forward`, `_backward` or `_bidirectional`.
pub fn from_architecture(name: &str, vocab_size: usize) -> Result<StreamConfig, ConfigurationError> {
    let malformed = || {
        ConfigurationError::Malformed(format!(
            "expected transformer_<norm>_<activation>_<hidden>_<layers>[_<direction>], got '{name}'"
        ))
    };

    let parts = name.split('_').collect::<Vec<_>>();
    let (head, direction) = match parts.as_slice() {
        [head @ .., direction] if parts.len() == 6 => (head, direction.parse::<Directionality>()?),
        head if parts.len() == 5 => (head, Directionality::Bidirectional),
        _ => return Err(malformed()),
    };

    let [kind, norm, activation, hidden, layers] = head else {
        return Err(malformed());
    };

    if *kind != "transformer" {
        return Err(ConfigurationError::UnknownTag {
            kind: "architecture",
            value: kind.to_string(),
        });
    }

    let norm_type = norm.parse::<NormPlacement>()?;
    let activation = activation.parse::<ActivationKind>()?;
    let hidden_size = hidden.parse::<usize>().map_err(|_| malformed())?;
    let num_layers = layers.parse::<usize>().map_err(|_| malformed())?;
    let attention_heads = usize::max(hidden_size / HEAD_SIZE, 1);

    let config = StreamConfig::new(
        vocab_size,
        hidden_size,
        4 * hidden_size,
        attention_heads,
        num_layers,
    )
    .with_norm_type(norm_type)
    .with_activation(activation)
    .with_direction(direction);

    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(small(10_000).validate().is_ok());
        assert!(base(10_000).validate().is_ok());
        assert_eq!(base(10_000).attention_heads, 8);
    }

    #[test]
    fn architecture_name_sets_every_axis() {
        let config = from_architecture("transformer_postnorm_relu_512_2_backward", 1000).unwrap();

        assert_eq!(config.norm_type, NormPlacement::PostNorm);
        assert_eq!(config.activation, ActivationKind::Relu);
        assert_eq!(config.direction, Directionality::Backward);
        assert_eq!(config.hidden_size, 512);
        assert_eq!(config.num_layers, 2);
        assert_eq!(config.attention_heads, 8);
        assert_eq!(config.feedforward_size, 2048);
    }

    #[test]
    fn architecture_name_defaults_to_bidirectional() {
        let config = from_architecture("transformer_prenorm_gelu_128_1", 1000).unwrap();

        assert_eq!(config.direction, Directionality::Bidirectional);
        assert_eq!(config.attention_heads, 2);
    }

    #[test]
    fn unknown_tags_in_architecture_name_are_rejected() {
        let err = from_architecture("transformer_midnorm_gelu_512_1", 1000).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownTag { kind: "normalization placement", .. }));

        let err = from_architecture("transformer_prenorm_tanh_512_1", 1000).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownTag { kind: "activation", .. }));

        let err = from_architecture("transformer_prenorm_gelu_512_1_sideways", 1000).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownTag { kind: "directionality", .. }));

        let err = from_architecture("lstm_prenorm_gelu_512_1", 1000).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownTag { kind: "architecture", .. }));
    }

    #[test]
    fn architecture_name_with_zero_layers_fails_validation() {
        let err = from_architecture("transformer_prenorm_gelu_512_0", 1000).unwrap_err();

        assert_eq!(err, ConfigurationError::EmptyEncoder(0));
    }

    #[test]
    fn malformed_architecture_names_are_rejected() {
        for name in ["transformer", "transformer_prenorm_gelu_wide_1", "a_b_c_d_e_f_g"] {
            assert!(matches!(
                from_architecture(name, 1000),
                Err(ConfigurationError::Malformed(_))
            ));
        }
    }
}
