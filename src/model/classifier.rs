//! Classifier head and the full transfer-learning model

use burn::{
    module::Module,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig, Relu},
    tensor::{activation::log_softmax, backend::Backend, Tensor},
};

use super::backbone::Backbone;

/// Trainable head: `Linear → ReLU → Dropout → Linear → log-softmax`
#[derive(Module, Debug)]
pub struct ClassifierHead<B: Backend> {
    pub fc1: Linear<B>,
    relu: Relu,
    dropout: Dropout,
    pub fc2: Linear<B>,
}

impl<B: Backend> ClassifierHead<B> {
    pub fn new(
        input_units: usize,
        hidden_units: usize,
        output_units: usize,
        dropout: f64,
        device: &B::Device,
    ) -> Self {
        Self {
            fc1: LinearConfig::new(input_units, hidden_units).init(device),
            relu: Relu::new(),
            dropout: DropoutConfig::new(dropout).init(),
            fc2: LinearConfig::new(hidden_units, output_units).init(device),
        }
    }

    /// Log-probabilities of shape `[batch_size, output_units]`
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.fc1.forward(x);
        let x = self.relu.forward(x);
        let x = self.dropout.forward(x);
        let x = self.fc2.forward(x);
        log_softmax(x, 1)
    }
}

/// Frozen backbone followed by a trainable classifier head
#[derive(Module, Debug)]
pub struct ImageClassifier<B: Backend> {
    pub backbone: Backbone<B>,
    pub head: ClassifierHead<B>,
}

impl<B: Backend> ImageClassifier<B> {
    /// Forward pass through the network
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width]
    ///
    /// # Returns
    /// * Log-probabilities of shape [batch_size, output_units]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.backbone.forward(x);
        self.head.forward(features)
    }

    /// Class probabilities for inference
    pub fn forward_probabilities(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward(x).exp()
    }

    pub fn output_units(&self) -> usize {
        let [_, out] = self.head.fc2.weight.dims();
        out
    }

    pub fn hidden_units(&self) -> usize {
        let [_, hidden] = self.head.fc1.weight.dims();
        hidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_head_outputs_log_probabilities() {
        let device = Default::default();
        let head = ClassifierHead::<TestBackend>::new(16, 8, 5, 0.5, &device);
        let input = Tensor::<TestBackend, 2>::ones([3, 16], &device);

        let output = head.forward(input);
        assert_eq!(output.dims(), [3, 5]);

        let sums = output.exp().sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-4);
        }
    }
}
