// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Compute device selection for the ONNX sessions

use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProvider,
    ExecutionProviderDispatch,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// Use CUDA when the runtime reports it, otherwise CPU
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(DevicePreference::Auto),
            "cpu" => Ok(DevicePreference::Cpu),
            "cuda" | "gpu" => Ok(DevicePreference::Cuda),
            other => Err(format!(
                "unsupported device '{}', expected one of: auto, cpu, cuda",
                other
            )),
        }
    }
}

/// Device the models actually run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    Cpu,
    Cuda,
}

impl ComputeDevice {
    /// Resolve a preference against what the ONNX runtime can offer
    pub fn select(preference: DevicePreference) -> Self {
        match preference {
            DevicePreference::Cpu => ComputeDevice::Cpu,
            DevicePreference::Cuda | DevicePreference::Auto => {
                if cuda_available() {
                    ComputeDevice::Cuda
                } else {
                    if preference == DevicePreference::Cuda {
                        tracing::warn!("CUDA requested but not available, falling back to CPU");
                    }
                    ComputeDevice::Cpu
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeDevice::Cpu => "cpu",
            ComputeDevice::Cuda => "cuda",
        }
    }

    /// Execution providers to register on a session, in priority order
    pub fn execution_providers(&self) -> Vec<ExecutionProviderDispatch> {
        match self {
            ComputeDevice::Cpu => vec![CPUExecutionProvider::default().build()],
            ComputeDevice::Cuda => vec![
                CUDAExecutionProvider::default().build(),
                CPUExecutionProvider::default().build(),
            ],
        }
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn cuda_available() -> bool {
    match CUDAExecutionProvider::default().is_available() {
        Ok(available) => available,
        Err(e) => {
            tracing::debug!("CUDA availability check failed: {}", e);
            false
        }
    }
}
