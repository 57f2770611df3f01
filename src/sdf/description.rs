use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{framework::{gpu::GpuBackend, math::Transform}, info, Result};

use super::{Primitive, PrimitiveId, PrimitiveKind, SdfVolume, VolumeConfig};

/// Serialized form of one primitive in a scene file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveDescription {
    pub kind:      PrimitiveKind,
    pub params:    glam::Vec3,
    #[serde(default = "default_color")]
    pub color:     glam::Vec4,
    #[serde(default)]
    pub transform: Transform,
    /// Disabled primitives are created but not registered.
    #[serde(default = "default_enabled")]
    pub enabled:   bool,
}

fn default_color() -> glam::Vec4 {
    Primitive::DEFAULT_COLOR
}

fn default_enabled() -> bool {
    true
}

impl PrimitiveDescription {
    pub fn to_primitive(&self) -> Primitive {
        Primitive::new(self.kind, self.params, self.color).with_transform(self.transform)
    }
}

impl From<&Primitive> for PrimitiveDescription {
    fn from(primitive: &Primitive) -> Self {
        Self {
            kind:      primitive.kind(),
            params:    primitive.params(),
            color:     primitive.color(),
            transform: *primitive.transform(),
            enabled:   true,
        }
    }
}

/// Volume configuration together with the primitives in registration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub config:     VolumeConfig,
    pub primitives: Vec<PrimitiveDescription>,
}

impl SceneDescription {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut scene: Self = serde_json::from_str(json)?;
        scene.config = scene.config.normalized();
        Ok(scene)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    #[profiling::function]
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read scene file {}", path.display()))?;
        let scene = Self::from_json(&json)
            .with_context(|| format!("Invalid scene file {}", path.display()))?;
        info!("Loaded scene {} with {} primitives", path.display(), scene.primitives.len());
        Ok(scene)
    }

    /// Snapshot of every primitive of a volume. Registered ones come first in slot order, so spawning the
    /// description again reproduces the slots, the rest follows disabled.
    pub fn capture<B: GpuBackend>(volume: &SdfVolume<B>) -> Self {
        let registered = volume.registry()
            .iter()
            .filter_map(|id| volume.primitive(id))
            .map(PrimitiveDescription::from);
        let unregistered = volume.primitives()
            .iter()
            .filter(|(id, _)| !volume.is_registered(*id))
            .map(|(_, primitive)| PrimitiveDescription {
                enabled: false,
                ..PrimitiveDescription::from(primitive)
            });
        Self {
            config:     *volume.config(),
            primitives: registered.chain(unregistered).collect(),
        }
    }

    /// Creates all primitives in the volume, enabled ones are registered in order of the description.
    /// Applies the configuration first, so that the rebuilds already carry it.
    #[profiling::function]
    pub fn spawn_into<B: GpuBackend>(&self, volume: &mut SdfVolume<B>) -> Result<Vec<PrimitiveId>> {
        volume.set_config(self.config)?;
        self.primitives.iter()
            .map(|description| -> Result<PrimitiveId> {
                let id = volume.insert(description.to_primitive());
                if description.enabled {
                    volume.register(id)?;
                }
                Ok(id)
            })
            .collect()
    }
}
