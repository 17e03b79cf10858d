pub mod architecture;
pub mod export;

use burn::prelude::*;

/// Model configuration
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Number of input features
    #[config(default = 5)]
    pub input_size: usize,

    /// Number of hidden units in the first layer
    #[config(default = 16)]
    pub hidden_size_1: usize,

    /// Number of hidden units in the second layer
    #[config(default = 8)]
    pub hidden_size_2: usize,

    /// Dropout rate applied after the first hidden layer
    #[config(default = 0.2)]
    pub dropout: f64,
}

impl ModelConfig {
    /// Create the configuration used for PCOS risk prediction
    pub fn pcos_default() -> Self {
        Self::new()
            .with_input_size(crate::data::NUM_FEATURES)
            .with_hidden_size_1(16)
            .with_hidden_size_2(8)
            .with_dropout(0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcos_default() {
        let config = ModelConfig::pcos_default();

        assert_eq!(config.input_size, 5);
        assert_eq!(config.hidden_size_1, 16);
        assert_eq!(config.hidden_size_2, 8);
        assert_eq!(config.dropout, 0.2);
    }
}
