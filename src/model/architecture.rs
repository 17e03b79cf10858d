use crate::model::ModelConfig;
use burn::module::Module;
use burn::nn::loss::BinaryCrossEntropyLossConfig;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::activation::{relu, sigmoid};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

/// PCOS risk prediction model.
///
/// Feed-forward binary classifier: dense(16, ReLU) -> dropout -> dense(8, ReLU)
/// -> dense(1). The sigmoid lives in [`PcosModel::predict`]; the loss is
/// computed from logits.
#[derive(Module, Debug)]
pub struct PcosModel<B: Backend> {
    /// First fully connected layer
    fc1: Linear<B>,
    /// Second fully connected layer
    fc2: Linear<B>,
    /// Output layer
    output: Linear<B>,
    /// Dropout after the first hidden layer
    dropout: Dropout,
}

/// Model inference output
#[derive(Debug, Clone)]
pub struct PcosOutput<B: Backend> {
    /// Predicted probabilities, shape [batch, 1]
    pub probabilities: Tensor<B, 2>,
    /// Binary predictions (0 or 1), shape [batch]
    pub predictions: Tensor<B, 1, Int>,
}

/// Training forward-pass output
#[derive(Debug)]
pub struct TrainingOutput<B: Backend> {
    pub loss: Tensor<B, 1>,
    pub logits: Tensor<B, 2>,
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> PcosModel<B> {
    /// Forward pass producing logits, shape [batch, 1]
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.fc1.forward(input);
        let x = relu(x);
        let x = self.dropout.forward(x);

        let x = self.fc2.forward(x);
        let x = relu(x);

        self.output.forward(x)
    }

    /// Forward pass with binary cross-entropy loss for training
    pub fn forward_training(
        &self,
        input: Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> TrainingOutput<B> {
        let logits = self.forward(input);

        let loss = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device())
            .forward(logits.clone().squeeze(1), targets.clone());

        TrainingOutput {
            loss,
            logits,
            targets,
        }
    }

    /// Predict probabilities and binary labels (threshold at 0.5)
    pub fn predict(&self, input: Tensor<B, 2>) -> PcosOutput<B> {
        let probabilities = sigmoid(self.forward(input));
        let predictions = probabilities.clone().greater_elem(0.5).int().squeeze(1);

        PcosOutput {
            probabilities,
            predictions,
        }
    }
}

/// Initialize the model from configuration
pub fn init_model<B: Backend>(config: &ModelConfig, device: &B::Device) -> PcosModel<B> {
    let fc1 = LinearConfig::new(config.input_size, config.hidden_size_1)
        .with_bias(true)
        .init(device);

    let fc2 = LinearConfig::new(config.hidden_size_1, config.hidden_size_2)
        .with_bias(true)
        .init(device);

    let output = LinearConfig::new(config.hidden_size_2, 1)
        .with_bias(true)
        .init(device);

    let dropout = DropoutConfig::new(config.dropout).init();

    PcosModel {
        fc1,
        fc2,
        output,
        dropout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NUM_FEATURES;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_model_forward() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ModelConfig::pcos_default();
        let model = init_model::<TestBackend>(&config, &device);

        let input = Tensor::<TestBackend, 2>::zeros([2, NUM_FEATURES], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 1]);
    }

    #[test]
    fn test_model_predict() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ModelConfig::pcos_default();
        let model = init_model::<TestBackend>(&config, &device);

        let input = Tensor::<TestBackend, 2>::zeros([3, NUM_FEATURES], &device);
        let prediction = model.predict(input);

        assert_eq!(prediction.probabilities.dims(), [3, 1]);
        assert_eq!(prediction.predictions.dims(), [3]);

        let probs: Vec<f32> = prediction.probabilities.into_data().to_vec().unwrap();
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_forward_training_loss_is_finite() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ModelConfig::pcos_default();
        let model = init_model::<TestBackend>(&config, &device);

        let input = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.5f32; 4 * NUM_FEATURES], [4, NUM_FEATURES]),
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_data(
            TensorData::new(vec![1i64, 0, 1, 0], [4]),
            &device,
        );

        let output = model.forward_training(input, targets);
        let loss: f32 = output.loss.into_scalar();

        assert!(loss.is_finite());
        assert!(loss > 0.0);
    }
}
