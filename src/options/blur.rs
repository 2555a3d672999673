use serde::{Deserialize, Serialize};

use crate::error::BlurResult;
use crate::gpu::backend::SamplerDesc;
use crate::util::color::{parse_color, Color};

/// Iteration and sampling parameters for one blur stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlurOptions {
    /// Iterations per direction.
    pub iterations: u32,
    /// First vertical iteration; earlier ones are skipped.
    pub start_vertical: u32,
    /// First horizontal iteration; earlier ones are skipped.
    pub start_horizontal: u32,
    /// Color each write target is cleared to before drawing, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_color: Option<Color>,
    /// Sampler used to read the previous iteration.
    pub sampler: SamplerOptions,
}

impl Default for BlurOptions {
    fn default() -> Self {
        Self {
            iterations: 2,
            start_vertical: 0,
            start_horizontal: 0,
            clear_color: None,
            sampler: SamplerOptions::default(),
        }
    }
}

impl BlurOptions {
    /// Clear color in wgpu form.
    #[must_use]
    pub fn wgpu_clear_color(&self) -> Option<wgpu::Color> {
        self.clear_color.map(Color::to_wgpu)
    }

    /// Set the clear color from text; empty text clears to transparent.
    ///
    /// # Errors
    ///
    /// Returns [`BlurError::ColorParse`](crate::error::BlurError::ColorParse)
    /// if `text` is not a color. The previous value is kept.
    pub fn set_clear_color(&mut self, text: &str) -> BlurResult<()> {
        self.clear_color = Some(parse_color(text)?);
        Ok(())
    }
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Bilinear.
    #[default]
    Linear,
    /// Point sampling.
    Nearest,
}

impl Filter {
    fn to_wgpu(self) -> wgpu::FilterMode {
        match self {
            Self::Linear => wgpu::FilterMode::Linear,
            Self::Nearest => wgpu::FilterMode::Nearest,
        }
    }
}

/// Behavior outside the [0, 1] texture coordinate range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Addressing {
    /// Repeat the edge texel.
    #[default]
    Clamp,
    /// Tile.
    Repeat,
    /// Tile with every other copy mirrored.
    Mirror,
}

impl Addressing {
    fn to_wgpu(self) -> wgpu::AddressMode {
        match self {
            Self::Clamp => wgpu::AddressMode::ClampToEdge,
            Self::Repeat => wgpu::AddressMode::Repeat,
            Self::Mirror => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

/// Sampler parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SamplerOptions {
    /// Magnification and minification filter.
    pub filter: Filter,
    /// Addressing on every axis.
    pub address_mode: Addressing,
}

impl SamplerOptions {
    /// Descriptor to register with a sampler registry.
    #[must_use]
    pub fn to_desc(&self) -> SamplerDesc {
        let filter = self.filter.to_wgpu();
        SamplerDesc {
            address_mode: [self.address_mode.to_wgpu(); 3],
            mag_filter: filter,
            min_filter: filter,
            ..SamplerDesc::LINEAR_CLAMP
        }
    }
}
