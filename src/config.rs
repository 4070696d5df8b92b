//! Configuration constants and settings for encoding and clustering.

use serde::{Deserialize, Serialize};

/// Default number of storage bins.
pub const DEFAULT_CLUSTERS: usize = 10;

/// Seed used when the caller does not supply one.
pub const DEFAULT_SEED: u64 = 0;

/// Largest seed accepted from text input.
pub const MAX_SEED: u64 = u32::MAX as u64;

/// Default K-Means iteration bound.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Weight multiplier applied per level of hierarchy depth.
pub const DEFAULT_DEPTH_DECAY: f64 = 0.5;

/// Weight of the color channels.
pub const DEFAULT_COLOR_WEIGHT: f64 = 0.05;

/// Weight of the stud-area signal.
pub const DEFAULT_SIZE_WEIGHT: f64 = 0.1;

/// Stud area that saturates the size signal (8 x 8).
pub const SIZE_SATURATION_STUDS: f64 = 64.0;

/// Label of the sentinel leaf for unresolved parts.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Label of a cluster with no shared category.
pub const OTHER_LABEL: &str = "Other";

/// Root labels carried by brickarchitect paths that add no information.
pub const ROOT_LABELS: [&str; 2] = ["Lego", "The LEGO Parts Guide"];

/// Squared-distance tolerance below which two vectors count as identical.
pub const EPS: f64 = 1e-12;

/// Feature encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Weight ratio between a hierarchy level and its parent.
    pub depth_decay: f64,
    /// Weight of the color channels.
    pub color_weight: f64,
    /// Weight of the stud-area signal.
    pub size_weight: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            depth_decay: DEFAULT_DEPTH_DECAY,
            color_weight: DEFAULT_COLOR_WEIGHT,
            size_weight: DEFAULT_SIZE_WEIGHT,
        }
    }
}

impl EncoderConfig {
    /// Weight of a path prefix at `depth` (0 = top-level category).
    pub fn level_weight(&self, depth: usize) -> f64 {
        self.depth_decay.powi(depth as i32)
    }

    /// Set the depth decay.
    pub fn with_depth_decay(mut self, depth_decay: f64) -> Self {
        self.depth_decay = depth_decay;
        self
    }

    /// Set the color weight.
    pub fn with_color_weight(mut self, color_weight: f64) -> Self {
        self.color_weight = color_weight;
        self
    }

    /// Set the size weight.
    pub fn with_size_weight(mut self, size_weight: f64) -> Self {
        self.size_weight = size_weight;
        self
    }
}

/// Cluster engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Maximum refinement iterations.
    pub max_iterations: usize,
    /// Compute the silhouette score after fitting.
    pub silhouette: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            silhouette: true,
        }
    }
}

impl ClusterConfig {
    /// Create a configuration with an explicit iteration bound.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..Default::default()
        }
    }

    /// Enable or disable the silhouette score.
    pub fn with_silhouette(mut self, silhouette: bool) -> Self {
        self.silhouette = silhouette;
        self
    }
}
