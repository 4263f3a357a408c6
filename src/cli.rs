//! Command line arguments
//!
//! ```text
//! image_classifier train <DATA_DIR> [--arch alexnet|vgg13|vgg16] [--save-dir DIR]
//!                        [--learning-rate F] [--hidden-units N] [--epochs N] [--gpu]
//! image_classifier predict <IMAGE_PATH> <CHECKPOINT_PATH> [--top-k N]
//!                          [--category-names FILE] [--gpu]
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::dataset::DEFAULT_IMAGE_SIZE;
use crate::inference::{DEFAULT_CATEGORY_NAMES, DEFAULT_TOP_K};
use crate::model::{Architecture, DEFAULT_DROPOUT, DEFAULT_HIDDEN_UNITS};
use crate::training::{
    TrainingConfig, DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_EVAL_BATCH_SIZE,
    DEFAULT_LEARNING_RATE, DEFAULT_PRINT_EVERY, DEFAULT_STEP_TRACK_EVERY,
};

/// Transfer-learning image classifier
///
/// Trains a classifier head on a frozen AlexNet/VGG backbone and predicts
/// the most likely classes of an image.
#[derive(Parser, Debug)]
#[command(name = "image_classifier")]
#[command(version)]
#[command(about = "Train and run an image classifier with Burn", long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a new classifier head on a dataset
    Train(TrainArgs),

    /// Predict the top classes of an image with a trained checkpoint
    Predict(PredictArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Dataset directory with train/, valid/ and optionally test/ sub-folders
    pub data_dir: PathBuf,

    /// Backbone architecture
    #[arg(long, value_enum, default_value = "vgg13")]
    pub arch: Architecture,

    /// Directory to save checkpoints
    #[arg(long, alias = "save_dir", default_value = "checkpoints")]
    pub save_dir: PathBuf,

    /// Learning rate
    #[arg(long, alias = "learning_rate", default_value_t = DEFAULT_LEARNING_RATE)]
    pub learning_rate: f64,

    /// Hidden units of the classifier head
    #[arg(long, alias = "hidden_units", default_value_t = DEFAULT_HIDDEN_UNITS)]
    pub hidden_units: usize,

    /// Number of training epochs
    #[arg(long, default_value_t = DEFAULT_EPOCHS)]
    pub epochs: usize,

    /// Use the GPU backend when available
    #[arg(long, default_value = "false")]
    pub gpu: bool,

    /// Random seed for shuffling and augmentation
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Dropout rate of the classifier head
    #[arg(long, default_value_t = DEFAULT_DROPOUT)]
    pub dropout: f64,

    /// Batch size for training
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Output classes (defaults to the number of training classes)
    #[arg(long)]
    pub output_units: Option<usize>,

    /// Burn record with pretrained backbone weights
    #[arg(long)]
    pub pretrained: Option<PathBuf>,

    /// Side of the square network input
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE)]
    pub image_size: usize,
}

impl TrainArgs {
    pub fn into_config(self) -> TrainingConfig {
        TrainingConfig {
            data_dir: self.data_dir,
            save_dir: self.save_dir,
            arch: self.arch,
            learning_rate: self.learning_rate,
            hidden_units: self.hidden_units,
            output_units: self.output_units,
            dropout: self.dropout,
            epochs: self.epochs,
            batch_size: self.batch_size,
            eval_batch_size: DEFAULT_EVAL_BATCH_SIZE,
            print_every: DEFAULT_PRINT_EVERY,
            step_track_every: DEFAULT_STEP_TRACK_EVERY,
            seed: self.seed,
            image_size: self.image_size,
            gpu: self.gpu,
            pretrained: self.pretrained,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Image to classify
    pub image_path: PathBuf,

    /// Checkpoint file (or the directory it was saved to)
    pub checkpoint_path: PathBuf,

    /// Number of most likely classes to return
    #[arg(long, alias = "top_k", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// JSON file mapping class keys to names
    #[arg(long, alias = "category_names", default_value = DEFAULT_CATEGORY_NAMES)]
    pub category_names: PathBuf,

    /// Use the GPU backend when available
    #[arg(long, default_value = "false")]
    pub gpu: bool,

    /// Print the checkpoint contents after loading
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_train_defaults() {
        let cli = parse(&["image_classifier", "train", "flowers"]);
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };

        let config = args.into_config();
        assert_eq!(config.data_dir, PathBuf::from("flowers"));
        assert_eq!(config.arch, Architecture::Vgg13);
        assert_eq!(config.save_dir, PathBuf::from("checkpoints"));
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.hidden_units, 512);
        assert_eq!(config.epochs, 20);
        assert!(!config.gpu);
        assert_eq!(config, TrainingConfig {
            data_dir: PathBuf::from("flowers"),
            ..Default::default()
        });
    }

    #[test]
    fn test_train_flags() {
        let cli = parse(&[
            "image_classifier",
            "-v",
            "train",
            "data",
            "--arch",
            "alexnet",
            "--save-dir",
            "out",
            "--learning-rate",
            "0.003",
            "--hidden-units",
            "256",
            "--epochs",
            "3",
            "--gpu",
        ]);
        assert!(cli.verbose);
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.arch, Architecture::Alexnet);
        assert_eq!(args.save_dir, PathBuf::from("out"));
        assert_eq!(args.learning_rate, 0.003);
        assert_eq!(args.hidden_units, 256);
        assert_eq!(args.epochs, 3);
        assert!(args.gpu);
    }

    #[test]
    fn test_unknown_arch_rejected() {
        let result = Cli::try_parse_from(["image_classifier", "train", "data", "--arch", "resnet"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_predict_defaults() {
        let cli = parse(&["image_classifier", "predict", "flower.jpg", "checkpoints/checkpoint.mpk"]);
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.image_path, PathBuf::from("flower.jpg"));
        assert_eq!(args.checkpoint_path, PathBuf::from("checkpoints/checkpoint.mpk"));
        assert_eq!(args.top_k, 3);
        assert_eq!(args.category_names, PathBuf::from("cat_to_name.json"));
        assert!(!args.gpu);
        assert!(!args.debug);
    }

    #[test]
    fn test_underscore_flag_aliases() {
        let cli = parse(&[
            "image_classifier",
            "train",
            "data",
            "--save_dir",
            "out",
            "--learning_rate",
            "0.002",
            "--hidden_units",
            "128",
        ]);
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.save_dir, PathBuf::from("out"));
        assert_eq!(args.learning_rate, 0.002);
        assert_eq!(args.hidden_units, 128);

        let cli = parse(&[
            "image_classifier",
            "predict",
            "flower.jpg",
            "checkpoint.mpk",
            "--top_k",
            "5",
            "--category_names",
            "names.json",
        ]);
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.top_k, 5);
        assert_eq!(args.category_names, PathBuf::from("names.json"));
    }

    #[test]
    fn test_predict_requires_checkpoint() {
        assert!(Cli::try_parse_from(["image_classifier", "predict", "flower.jpg"]).is_err());
    }
}
