use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use crate::{
    channel::ChannelKind,
    foundation::error::{QuadgrabError, QuadgrabResult},
};

/// Name given to newly created reference surfaces unless configured otherwise.
pub const DEFAULT_SURFACE_NAME: &str = "QuadGrab_Reference";

/// Near clip used when none is configured. Effectively no clip buffer.
pub const DEFAULT_DEPTH_NEAR: f64 = 0.001;

/// Largest accepted square output resolution.
pub const MAX_RESOLUTION: u32 = 16_384;

/// Depth capture limits in scene units, measured along the reference surface's -Z.
///
/// `midpoint` places the zero plane of the signed raw depth output at
/// `near + midpoint * (far - near)`. With the default of 0 the zero plane is the near limit and
/// every captured point has a negative height; 0.5 splits the range evenly above and below.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DepthRange {
    /// Near limit; maps to 0 in the stored depth image.
    pub near: f64,
    /// Far limit; maps to 1 in the stored depth image.
    pub far: f64,
    /// Zero plane of the raw depth output as a fraction of the range, in `[0,1]`.
    #[serde(default)]
    pub midpoint: f64,
}

impl DepthRange {
    /// Build a validated range with the zero plane at `near`.
    pub fn new(near: f64, far: f64) -> QuadgrabResult<Self> {
        let r = Self {
            near,
            far,
            midpoint: 0.0,
        };
        r.validate()?;
        Ok(r)
    }

    /// Same range with the raw depth zero plane moved to `midpoint`.
    pub fn with_midpoint(self, midpoint: f64) -> QuadgrabResult<Self> {
        let r = Self { midpoint, ..self };
        r.validate()?;
        Ok(r)
    }

    /// Check `0 <= near < far`, both finite, and `0 <= midpoint <= 1`.
    pub fn validate(self) -> QuadgrabResult<()> {
        if !self.near.is_finite() || !self.far.is_finite() {
            return Err(QuadgrabError::configuration("depth limits must be finite"));
        }
        if !(0.0..=1.0).contains(&self.midpoint) {
            return Err(QuadgrabError::configuration(format!(
                "depth midpoint must be within [0, 1], got {}",
                self.midpoint
            )));
        }
        if self.near < 0.0 {
            return Err(QuadgrabError::configuration("depth near must be >= 0"));
        }
        if self.near >= self.far {
            return Err(QuadgrabError::configuration(format!(
                "depth near ({}) must be < far ({})",
                self.near, self.far
            )));
        }
        Ok(())
    }

    /// `far - near`.
    pub fn span(self) -> f64 {
        self.far - self.near
    }

    /// Linearly remap a scene-unit depth into `[0,1]`, clamping outside the range.
    pub fn remap(self, depth: f64) -> f64 {
        ((depth - self.near) / self.span()).clamp(0.0, 1.0)
    }

    /// Depth of the raw output's zero plane below the surface.
    pub fn midpoint_depth(self) -> f64 {
        self.near + self.midpoint * self.span()
    }

    /// Signed height of a scene-unit depth above the zero plane, floored at the far limit.
    ///
    /// Ranges over `[-(1 - midpoint) * span, midpoint * span]` for depths inside the range.
    pub fn signed_height(self, depth: f64) -> f64 {
        self.midpoint_depth() - depth.min(self.far)
    }
}

impl Default for DepthRange {
    fn default() -> Self {
        Self {
            near: DEFAULT_DEPTH_NEAR,
            far: 10.0,
            midpoint: 0.0,
        }
    }
}

fn default_surface_name() -> String {
    DEFAULT_SURFACE_NAME.to_string()
}

fn default_true() -> bool {
    true
}

/// Configuration for one capture run.
///
/// Created once per invocation and only read by the pipeline. [`CaptureConfig::validate`] runs
/// before any scene mutation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    /// Square output resolution in pixels.
    pub resolution: u32,
    /// Directory receiving `<surface>_<channel>.<ext>` files.
    pub output_dir: PathBuf,
    /// Requested channels. Iteration order is the fixed capture order.
    pub channels: BTreeSet<ChannelKind>,
    /// Depth remap limits.
    #[serde(default)]
    pub depth: DepthRange,
    /// Build a preview assembly after a successful capture.
    #[serde(default)]
    pub build_preview: bool,
    /// Name for newly created reference surfaces; also the file name prefix.
    #[serde(default = "default_surface_name")]
    pub surface_name: String,
    /// Attach the displacement stack to the preview when Depth succeeded.
    #[serde(default = "default_true")]
    pub displace_preview: bool,
    /// Also write raw scene-unit depth as `<surface>_Depth_Raw.exr`.
    #[serde(default)]
    pub write_depth_exr: bool,
    /// Write `<surface>_metadata.json` after the run.
    #[serde(default = "default_true")]
    pub write_metadata: bool,
    /// Let cleanup delete the files the run wrote.
    #[serde(default)]
    pub remove_files_on_cleanup: bool,
}

impl CaptureConfig {
    /// Config with default resolution (512), depth range and flags.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        channels: impl IntoIterator<Item = ChannelKind>,
    ) -> Self {
        Self {
            resolution: 512,
            output_dir: output_dir.into(),
            channels: channels.into_iter().collect(),
            depth: DepthRange::default(),
            build_preview: false,
            surface_name: default_surface_name(),
            displace_preview: true,
            write_depth_exr: false,
            write_metadata: true,
            remove_files_on_cleanup: false,
        }
    }

    /// Validate every field and make sure the output directory exists and is writable.
    ///
    /// Touches only the filesystem, never the scene: a missing output directory is created and a
    /// probe file is written and removed again.
    pub fn validate(&self) -> QuadgrabResult<()> {
        if self.resolution == 0 {
            return Err(QuadgrabError::configuration("resolution must be > 0"));
        }
        if self.resolution > MAX_RESOLUTION {
            return Err(QuadgrabError::configuration(format!(
                "resolution must be <= {MAX_RESOLUTION}, got {}",
                self.resolution
            )));
        }
        if self.channels.is_empty() {
            return Err(QuadgrabError::configuration(
                "at least one channel must be requested",
            ));
        }
        self.depth.validate()?;
        validate_file_stem(&self.surface_name)?;
        ensure_writable_dir(&self.output_dir)?;
        Ok(())
    }

    /// Deterministic output path for a channel image of `surface_name`.
    pub fn image_path(&self, surface_name: &str, kind: ChannelKind) -> PathBuf {
        self.output_dir
            .join(format!("{surface_name}_{}.png", kind.name()))
    }

    /// Output path of the optional raw depth EXR.
    pub fn raw_depth_path(&self, surface_name: &str) -> PathBuf {
        self.output_dir.join(format!("{surface_name}_Depth_Raw.exr"))
    }

    /// Output path of the capture metadata file.
    pub fn metadata_path(&self, surface_name: &str) -> PathBuf {
        self.output_dir.join(format!("{surface_name}_metadata.json"))
    }

    /// Parse and validate a JSON config.
    ///
    /// Validation creates the output directory if it is missing, like [`CaptureConfig::validate`].
    pub fn from_json_str(s: &str) -> QuadgrabResult<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| QuadgrabError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Options for [`crate::cleanup`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Delete registered output files as well as scene artifacts.
    pub remove_files: bool,
}

impl From<&CaptureConfig> for CleanupOptions {
    fn from(cfg: &CaptureConfig) -> Self {
        Self {
            remove_files: cfg.remove_files_on_cleanup,
        }
    }
}

/// Surface names become file name prefixes, so they must be a single path component.
pub(crate) fn validate_file_stem(name: &str) -> QuadgrabResult<()> {
    if name.trim().is_empty() {
        return Err(QuadgrabError::configuration("surface name must be non-empty"));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(QuadgrabError::configuration(format!(
            "surface name '{name}' must not contain path separators"
        )));
    }
    Ok(())
}

fn ensure_writable_dir(dir: &Path) -> QuadgrabResult<()> {
    if dir.as_os_str().is_empty() {
        return Err(QuadgrabError::configuration("output directory must be set"));
    }
    if dir.exists() && !dir.is_dir() {
        return Err(QuadgrabError::configuration(format!(
            "output path '{}' is not a directory",
            dir.display()
        )));
    }
    std::fs::create_dir_all(dir).map_err(|e| {
        QuadgrabError::configuration(format!(
            "output directory '{}' cannot be created: {e}",
            dir.display()
        ))
    })?;

    let probe = dir.join(".quadgrab_write_probe");
    std::fs::write(&probe, b"")
        .map_err(|e| {
            QuadgrabError::configuration(format!(
                "output directory '{}' is not writable: {e}",
                dir.display()
            ))
        })?;
    std::fs::remove_file(&probe).map_err(|e| {
        QuadgrabError::configuration(format!(
            "output directory '{}' does not allow removing files: {e}",
            dir.display()
        ))
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
