//! Image Classifier CLI
//!
//! Entry point for training a transfer-learning classifier and predicting
//! the classes of single images with the Burn framework.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use clap::Parser;
use colored::Colorize;
use tracing::info;

use image_classifier::backend::{select_device, CpuBackend, CpuTrainingBackend};
use image_classifier::cli::{Cli, Commands, PredictArgs, TrainArgs};
use image_classifier::inference::{load_names, CategoryMap, PredictionResult, Predictor};
use image_classifier::training::{train, TrainingReport};
use image_classifier::utils::format_duration;
use image_classifier::utils::logging::{init_logging, LogConfig};

#[cfg(feature = "wgpu")]
use image_classifier::backend::{DeviceChoice, GpuBackend, GpuTrainingBackend};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };

    let _ = init_logging(&log_config);

    print_banner();
    let start = Instant::now();

    match cli.command {
        Commands::Train(args) => cmd_train(args)?,
        Commands::Predict(args) => cmd_predict(&args)?,
    }

    println!();
    println!(
        "{} {}",
        "Total elapsed runtime:".cyan().bold(),
        format_duration(start.elapsed().as_secs_f64())
    );

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        format!(
            "\n  Image Classifier v{}\n  Transfer learning on AlexNet / VGG with Burn\n",
            image_classifier::VERSION
        )
        .green()
    );
}

fn cmd_train(args: TrainArgs) -> Result<()> {
    let config = args.into_config();
    info!("Training {} on {:?}", config.arch, config.data_dir);

    let report = match select_device(config.gpu) {
        #[cfg(feature = "wgpu")]
        DeviceChoice::Gpu => train::<GpuTrainingBackend>(&config, &Default::default()),
        _ => train::<CpuTrainingBackend>(&config, &Default::default()),
    }
    .context("Training failed")?;

    print_training_report(&report);
    Ok(())
}

fn print_training_report(report: &TrainingReport) {
    println!();
    println!("{}", "Training Complete!".green().bold());
    println!("  Steps:        {}", report.total_steps);
    println!("  Classes:      {}", report.class_names.len());
    if let Some(point) = report.history.last() {
        println!(
            "  Last valid:   loss {:.3}, accuracy {:.3}",
            point.valid_loss, point.valid_accuracy
        );
    }
    if let Some(test) = &report.test {
        println!(
            "  Test:         loss {:.3}, accuracy {:.3} ({} images)",
            test.loss, test.accuracy, test.samples
        );
    }
    println!("  Checkpoint:   {:?}", report.checkpoint_path);
    println!("  Time:         {}", format_duration(report.elapsed_secs));
}

fn cmd_predict(args: &PredictArgs) -> Result<()> {
    let categories = load_names(&args.category_names)
        .with_context(|| format!("Cannot load category names from {:?}", args.category_names))?;

    let result = match select_device(args.gpu) {
        #[cfg(feature = "wgpu")]
        DeviceChoice::Gpu => predict_with::<GpuBackend>(args, &categories),
        _ => predict_with::<CpuBackend>(args, &categories),
    }?;

    println!();
    println!("{}", "Prediction:".cyan().bold());
    print!("{}", result.display());
    if let Some(name) = result.top_name() {
        println!();
        println!("  {} {}", "Most likely:".green().bold(), name);
    }
    Ok(())
}

fn predict_with<B: Backend>(args: &PredictArgs, categories: &CategoryMap) -> Result<PredictionResult> {
    let device = B::Device::default();
    let predictor = Predictor::<B>::load(&args.checkpoint_path, &device)
        .with_context(|| format!("Cannot load checkpoint {:?}", args.checkpoint_path))?;

    if args.debug {
        println!("{}", "Checkpoint:".cyan().bold());
        println!("{}", serde_json::to_string_pretty(predictor.meta())?);
    }

    let image_path: &Path = &args.image_path;
    predictor
        .predict(image_path, args.top_k, categories)
        .with_context(|| format!("Prediction failed for {:?}", image_path))
}
