use std::ops::RangeInclusive;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, AsRefStr, EnumIter, Serialize, Deserialize)]
pub enum AmbientOcclusionMode {
    #[default]
    On,
    Off,
    /// Shades surfaces with the occlusion term only.
    Test,
}

bitflags! {
    /// Feature switches read by the shading stage from the volume uniform.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ShaderFeatures: u32 {
        const AMBIENT_OCCLUSION_ON   = 1 << 0;
        const AMBIENT_OCCLUSION_OFF  = 1 << 1;
        const AMBIENT_OCCLUSION_TEST = 1 << 2;
        const SHADOWS                = 1 << 3;
    }
}

impl From<AmbientOcclusionMode> for ShaderFeatures {
    fn from(mode: AmbientOcclusionMode) -> Self {
        match mode {
            AmbientOcclusionMode::On   => ShaderFeatures::AMBIENT_OCCLUSION_ON,
            AmbientOcclusionMode::Off  => ShaderFeatures::AMBIENT_OCCLUSION_OFF,
            AmbientOcclusionMode::Test => ShaderFeatures::AMBIENT_OCCLUSION_TEST,
        }
    }
}

/// Shading configuration of the volume, mirrored into the volume uniform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    smoothing: f32,
    pub ambient_occlusion: AmbientOcclusionMode,
    pub shadows: bool,
}

impl VolumeConfig {
    pub const SMOOTHING_RANGE: RangeInclusive<f32> = 0.0..=1.0;
    pub const DEFAULT_SMOOTHING: f32 = 0.05;

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = Self::clamp_smoothing(smoothing);
    }

    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.set_smoothing(smoothing);
        self
    }

    pub fn with_ambient_occlusion(mut self, mode: AmbientOcclusionMode) -> Self {
        self.ambient_occlusion = mode;
        self
    }

    pub fn with_shadows(mut self, shadows: bool) -> Self {
        self.shadows = shadows;
        self
    }

    /// Brings values coming from outside (e.g. deserialized) into valid ranges.
    pub fn normalized(self) -> Self {
        let smoothing = self.smoothing;
        self.with_smoothing(smoothing)
    }

    /// Feature switches for the current ambient occlusion mode and shadow toggle.
    pub fn features(&self) -> ShaderFeatures {
        let mut features = ShaderFeatures::from(self.ambient_occlusion);
        features.set(ShaderFeatures::SHADOWS, self.shadows);
        features
    }

    fn clamp_smoothing(smoothing: f32) -> f32 {
        if smoothing.is_nan() {
            return Self::DEFAULT_SMOOTHING;
        }
        smoothing.clamp(*Self::SMOOTHING_RANGE.start(), *Self::SMOOTHING_RANGE.end())
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            smoothing:         Self::DEFAULT_SMOOTHING,
            ambient_occlusion: AmbientOcclusionMode::default(),
            shadows:           true,
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn smoothing_is_clamped_into_unit_range() {
        let mut config = VolumeConfig::default();

        config.set_smoothing(1.5);
        assert_eq!(config.smoothing(), 1.0);
        config.set_smoothing(-0.5);
        assert_eq!(config.smoothing(), 0.0);
        config.set_smoothing(f32::NAN);
        assert_eq!(config.smoothing(), VolumeConfig::DEFAULT_SMOOTHING);
    }

    #[test]
    fn exactly_one_occlusion_feature_is_selected() {
        for mode in AmbientOcclusionMode::iter() {
            let features = VolumeConfig::default().with_ambient_occlusion(mode).with_shadows(false).features();
            assert_eq!(features.bits().count_ones(), 1, "{}", mode.as_ref());
            assert!(features.contains(ShaderFeatures::from(mode)));
        }
    }

    #[test]
    fn shadows_toggle_its_own_feature() {
        let config = VolumeConfig::default().with_ambient_occlusion(AmbientOcclusionMode::Test);

        assert_eq!(
            config.with_shadows(true).features(),
            ShaderFeatures::AMBIENT_OCCLUSION_TEST | ShaderFeatures::SHADOWS
        );
        assert_eq!(config.with_shadows(false).features(), ShaderFeatures::AMBIENT_OCCLUSION_TEST);
    }

    #[test]
    fn deserialized_config_is_normalized() {
        let config: VolumeConfig = serde_json::from_str(r#"{ "smoothing": 3.0, "shadows": false }"#).unwrap();
        let config = config.normalized();

        assert_eq!(config.smoothing(), 1.0);
        assert_eq!(config.ambient_occlusion, AmbientOcclusionMode::On);
        assert!(!config.shadows);
    }
}
