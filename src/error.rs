//! Error types for ZenParticles.
//!
//! This module provides error types for point cloud construction, the shape
//! cache, shape generation, configuration, signal sources, GPU
//! initialization and the viewer.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::archetype::ShapeArchetype;

/// Errors that can occur when building a [`PointCloud`](crate::PointCloud).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    /// The flat coordinate list does not describe whole points.
    #[error("point cloud length {0} is not a multiple of 3")]
    Ragged(usize),
}

/// Errors that can occur when writing to the shape cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Only generated archetypes have a replaceable slot.
    #[error("'{0}' is a procedural shape and cannot hold generated points")]
    NotGenerated(ShapeArchetype),
}

/// Errors a shape service can report.
///
/// The generation worker never lets these cross the thread boundary: every
/// variant is logged and collapsed into "no result".
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No service was configured (the missing-credential case).
    #[error("no shape service is configured")]
    NotConfigured,
    /// Reading the response failed.
    #[error("shape service I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The response was not the expected JSON document.
    #[error("malformed shape response: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The response parsed but held no usable point.
    #[error("shape response contained no points")]
    Empty,
    /// The service did not answer in time.
    #[error("shape service timed out after {0:?}")]
    Timeout(Duration),
    /// An external generator exited unsuccessfully.
    #[error("shape service exited with {status}: {stderr}")]
    Service {
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid JSON for [`Config`](crate::Config).
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A value is outside its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors that can occur when starting a signal source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The landmark recording could not be opened.
    #[error("failed to open landmark recording {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The replay thread could not be started.
    #[error("failed to spawn landmark replay thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("Failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support.")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors that can occur when running the viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Failed to create event loop.
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}
