//! Dashboard configuration, stored as a JSON file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{DashboardError, DashboardResult};
use crate::surface::LogicalSize;
use crate::tables::KeywordStyle;
use crate::widgets::ChartSlot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Ratio of backing pixels to logical pixels. Unset means 1.
    pub device_pixel_ratio: Option<f64>,
    /// Size used by every chart slot without its own entry in `chart_sizes`.
    pub chart_size: LogicalSize,
    /// Per-slot overrides, keyed by slot name (`sentimentChart`, ...).
    pub chart_sizes: BTreeMap<String, LogicalSize>,
    pub keyword_style: KeywordStyle,
    /// When set, every keyword gets this hue instead of a random one.
    pub keyword_hue: Option<f64>,
    /// Languages shown before the rest are dropped from the pie.
    pub language_limit: usize,
    /// Characters of comment text shown in the detailed analysis table.
    pub comment_preview_chars: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            device_pixel_ratio: None,
            chart_size: LogicalSize::new(400.0, 300.0),
            chart_sizes: BTreeMap::new(),
            keyword_style: KeywordStyle::default(),
            keyword_hue: None,
            language_limit: 8,
            comment_preview_chars: 100,
        }
    }
}

impl DashboardConfig {
    /// Load a config file. Missing keys take their default values.
    pub fn load(path: &Path) -> DashboardResult<Self> {
        let body = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&body)?;
        config.validate()?;
        info!(path = %path.display(), "loaded dashboard config");
        Ok(config)
    }

    /// Write the default config, for users to edit.
    pub fn save_default(path: &Path) -> DashboardResult<()> {
        let body = serde_json::to_string_pretty(&Self::default())?;
        fs::write(path, body)?;
        Ok(())
    }

    pub fn size_for(&self, slot: ChartSlot) -> LogicalSize {
        self.chart_sizes.get(slot.name()).copied().unwrap_or(self.chart_size)
    }

    pub fn validate(&self) -> DashboardResult<()> {
        let sizes = std::iter::once(("chart_size", &self.chart_size))
            .chain(self.chart_sizes.iter().map(|(name, size)| (name.as_str(), size)));
        for (name, size) in sizes {
            let finite = size.width.is_finite() && size.height.is_finite();
            if !finite || size.width < 0.0 || size.height < 0.0 {
                return Err(DashboardError::InvalidInput(format!(
                    "{name}: chart size must be finite and non-negative"
                )));
            }
        }

        if let Some(unknown) = self
            .chart_sizes
            .keys()
            .find(|name| !ChartSlot::ALL.iter().any(|slot| slot.name() == name.as_str()))
        {
            return Err(DashboardError::InvalidInput(format!("unknown chart slot {unknown:?}")));
        }

        let style = &self.keyword_style;
        if style.min_px <= 0.0 || style.min_px > style.max_px {
            return Err(DashboardError::InvalidInput(format!(
                "keyword font sizes must satisfy 0 < min_px <= max_px, got {} and {}",
                style.min_px, style.max_px
            )));
        }

        if self.language_limit == 0 {
            return Err(DashboardError::InvalidInput("language_limit must be at least 1".into()));
        }

        Ok(())
    }
}
