use std::path::Path;

use anyhow::Context as _;

use crate::{
    capture::{driver::CaptureResult, orchestrator::CaptureResultSet},
    channel::ChannelKind,
    config::{CaptureConfig, DepthRange},
};

/// Displacement settings that turn a stored depth image back into scene-unit offsets.
///
/// A stored value `s` maps to an offset of `(s - mid_level) * strength` along the surface's +Z.
/// Both calibrations put every captured point back at its captured depth below the surface.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DisplacementCalibration {
    /// Image value producing zero offset.
    pub mid_level: f64,
    /// Scene units per unit of image value.
    pub strength: f64,
}

impl DisplacementCalibration {
    /// Calibration matching depth images remapped through `range`.
    pub fn for_depth(range: DepthRange) -> Self {
        Self {
            mid_level: -range.near / range.span(),
            strength: -range.span(),
        }
    }

    /// Calibration matching the raw depth EXR, whose values are heights above the zero plane.
    pub fn for_raw_depth(range: DepthRange) -> Self {
        Self {
            mid_level: range.midpoint_depth(),
            strength: 1.0,
        }
    }
}

/// Per-channel status in the metadata file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Captured.
    Success,
    /// Not captured.
    Failed,
}

/// One channel entry of the metadata file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChannelRecord {
    /// Channel.
    pub channel: ChannelKind,
    /// Outcome.
    pub status: ChannelStatus,
    /// File name inside the output directory, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Failure reason, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&CaptureResult> for ChannelRecord {
    fn from(r: &CaptureResult) -> Self {
        Self {
            channel: r.kind,
            status: if r.is_success() {
                ChannelStatus::Success
            } else {
                ChannelStatus::Failed
            },
            file: r
                .path()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned()),
            error: r.failure().map(ToString::to_string),
        }
    }
}

/// Contents of `<surface>_metadata.json`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptureMetadata {
    /// Reference surface name.
    pub surface: String,
    /// Square output resolution in pixels.
    pub resolution: u32,
    /// Captured width in scene units.
    pub width: f64,
    /// Captured height in scene units.
    pub height: f64,
    /// Captured width in centimeters, assuming meters as scene units.
    pub width_cm: f64,
    /// Captured height in centimeters.
    pub height_cm: f64,
    /// Depth remap limits.
    pub depth: DepthRange,
    /// Total captured depth in centimeters.
    pub depth_cm: f64,
    /// Depth of the raw output's zero plane in centimeters.
    #[serde(default)]
    pub midpoint_depth_cm: f64,
    /// Displacement settings reproducing captured depth from the depth PNG.
    pub displacement: DisplacementCalibration,
    /// Displacement settings for the raw depth EXR, when one was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_displacement: Option<DisplacementCalibration>,
    /// Whether the run stopped early.
    pub cancelled: bool,
    /// Channels in capture order.
    pub channels: Vec<ChannelRecord>,
}

impl CaptureMetadata {
    /// Summarize a finished run.
    pub fn from_result_set(config: &CaptureConfig, set: &CaptureResultSet) -> Self {
        let size = set.surface.world_size();
        let raw_written = set
            .result(ChannelKind::Depth)
            .and_then(CaptureResult::image)
            .is_some_and(|img| img.raw_path.is_some());
        Self {
            surface: set.surface.name.clone(),
            resolution: config.resolution,
            width: size.width,
            height: size.height,
            width_cm: size.width * 100.0,
            height_cm: size.height * 100.0,
            depth: config.depth,
            depth_cm: config.depth.span() * 100.0,
            midpoint_depth_cm: config.depth.midpoint_depth() * 100.0,
            displacement: DisplacementCalibration::for_depth(config.depth),
            raw_displacement: raw_written
                .then(|| DisplacementCalibration::for_raw_depth(config.depth)),
            cancelled: set.cancelled,
            channels: set.results.iter().map(ChannelRecord::from).collect(),
        }
    }

    /// Write as pretty JSON, overwriting any previous file.
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(self).context("serialize capture metadata")?;
        std::fs::write(path, bytes)
            .with_context(|| format!("write metadata '{}'", path.display()))
    }

    /// Read a metadata file back.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read metadata '{}'", path.display()))?;
        serde_json::from_slice(&bytes).context("parse capture metadata")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/metadata.rs"]
mod tests;
