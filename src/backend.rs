//! Backend abstraction - Multi-backend support
//!
//! NdArray (CPU) is always compiled in. WebGPU is available behind the
//! `wgpu` feature; requesting the GPU without it falls back to the CPU.

use burn::backend::{Autodiff, NdArray};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// CPU backend used for inference and tests
pub type CpuBackend = NdArray;

/// CPU backend with autodiff for training
pub type CpuTrainingBackend = Autodiff<CpuBackend>;

#[cfg(feature = "wgpu")]
pub type GpuBackend = burn::backend::Wgpu;

#[cfg(feature = "wgpu")]
pub type GpuTrainingBackend = Autodiff<GpuBackend>;

/// Device the run will execute on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceChoice {
    Cpu,
    Gpu,
}

impl DeviceChoice {
    /// Label stored in checkpoints and configs
    pub fn label(&self) -> &'static str {
        match self {
            DeviceChoice::Cpu => "cpu",
            DeviceChoice::Gpu => "gpu",
        }
    }
}

impl std::fmt::Display for DeviceChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Whether this build can run on the GPU
pub fn gpu_available() -> bool {
    cfg!(feature = "wgpu")
}

/// Device a `--gpu` flag resolves to, without logging
pub fn resolve_device(gpu_requested: bool) -> DeviceChoice {
    if gpu_requested && gpu_available() {
        DeviceChoice::Gpu
    } else {
        DeviceChoice::Cpu
    }
}

/// Resolve the `--gpu` flag into a device, falling back to the CPU with a warning
pub fn select_device(gpu_requested: bool) -> DeviceChoice {
    let device = resolve_device(gpu_requested);
    if gpu_requested && device == DeviceChoice::Cpu {
        warn!("GPU requested but not available in this build - falling back to CPU");
    }

    info!("Using device: {} ({})", device, backend_name(device));
    device
}

/// Get a human-readable name for the backend behind a device
pub fn backend_name(device: DeviceChoice) -> &'static str {
    match device {
        DeviceChoice::Cpu => "NdArray (CPU)",
        DeviceChoice::Gpu => "WebGPU (GPU)",
    }
}
