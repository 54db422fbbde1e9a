//! Chart widget lifecycle.
//!
//! The [`WidgetRegistry`] owns one surface and at most one live widget per
//! chart slot. Replacing a chart always disposes the old widget first; the
//! registry never updates a widget in place.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::charts::ChartSpec;
use crate::draw;
use crate::error::{DashboardError, DashboardResult};
use crate::surface::{prepare_surface, DrawingContext, LogicalSize, Surface};

/// Mount points for charts. Names are the host page's element ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ChartSlot {
    #[serde(rename = "sentimentChart")]
    Sentiment,
    #[serde(rename = "emotionChart")]
    Emotion,
    #[serde(rename = "languageChart")]
    Language,
    #[serde(rename = "lengthChart")]
    Length,
    #[serde(rename = "queryChart")]
    Query,
    #[serde(rename = "questionSentimentChart")]
    QuestionSentiment,
}

impl ChartSlot {
    pub const ALL: [Self; 6] = [
        Self::Sentiment,
        Self::Emotion,
        Self::Language,
        Self::Length,
        Self::Query,
        Self::QuestionSentiment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Sentiment => "sentimentChart",
            Self::Emotion => "emotionChart",
            Self::Language => "languageChart",
            Self::Length => "lengthChart",
            Self::Query => "queryChart",
            Self::QuestionSentiment => "questionSentimentChart",
        }
    }
}

impl fmt::Display for ChartSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something that can turn a chart spec into a live widget and release it.
pub trait WidgetBackend {
    type Widget;

    fn construct(
        &mut self,
        slot: ChartSlot,
        spec: &ChartSpec,
        ctx: &DrawingContext,
    ) -> DashboardResult<Self::Widget>;

    /// Release the widget's drawing resources.
    fn dispose(&mut self, slot: ChartSlot, widget: Self::Widget);
}

/// A live chart bound to a slot.
#[derive(Debug)]
pub struct ChartInstance<W> {
    pub id: u64,
    pub slot: ChartSlot,
    pub spec: ChartSpec,
    pub context: DrawingContext,
    pub widget: W,
}

pub struct WidgetRegistry<B: WidgetBackend> {
    backend: B,
    device_pixel_ratio: Option<f64>,
    surfaces: BTreeMap<ChartSlot, Surface>,
    instances: BTreeMap<ChartSlot, ChartInstance<B::Widget>>,
    next_id: u64,
    created: u64,
    disposed: u64,
}

impl<B: WidgetBackend> WidgetRegistry<B> {
    /// Every slot starts with a surface of `default_size`.
    pub fn new(backend: B, default_size: LogicalSize, device_pixel_ratio: Option<f64>) -> Self {
        let surfaces = ChartSlot::ALL
            .iter()
            .map(|slot| (*slot, Surface::new(default_size)))
            .collect();
        Self {
            backend,
            device_pixel_ratio,
            surfaces,
            instances: BTreeMap::new(),
            next_id: 1,
            created: 0,
            disposed: 0,
        }
    }

    /// Resize the mount point of a slot. The live chart keeps its old size
    /// until the slot is rendered again.
    pub fn resize_surface(&mut self, slot: ChartSlot, size: LogicalSize) {
        self.surfaces
            .entry(slot)
            .and_modify(|s| s.resize(size))
            .or_insert_with(|| Surface::new(size));
    }

    pub fn surface(&self, slot: ChartSlot) -> Option<&Surface> {
        self.surfaces.get(&slot)
    }

    /// Replace whatever is in `slot` with a fresh widget built from `spec`.
    ///
    /// The previous widget is disposed before construction starts. If
    /// construction fails the slot is left empty.
    pub fn render(
        &mut self,
        slot: ChartSlot,
        spec: ChartSpec,
    ) -> DashboardResult<&ChartInstance<B::Widget>> {
        self.dispose_slot(slot);

        let surface = self
            .surfaces
            .entry(slot)
            .or_insert_with(|| Surface::new(LogicalSize::new(0.0, 0.0)));
        let context = prepare_surface(surface, self.device_pixel_ratio);

        let widget = self.backend.construct(slot, &spec, &context).map_err(|e| {
            warn!(slot = %slot, error = %e, "chart construction failed, slot left empty");
            e
        })?;

        let id = self.next_id;
        self.next_id += 1;
        self.created += 1;
        debug!(slot = %slot, id, backing = ?context.backing, "chart created");

        let instance = ChartInstance {
            id,
            slot,
            spec,
            context,
            widget,
        };
        Ok(self.instances.entry(slot).or_insert(instance))
    }

    /// Dispose every live widget.
    pub fn teardown(&mut self) {
        let slots: Vec<ChartSlot> = self.instances.keys().copied().collect();
        for slot in slots {
            self.dispose_slot(slot);
        }
    }

    pub fn get(&self, slot: ChartSlot) -> Option<&ChartInstance<B::Widget>> {
        self.instances.get(&slot)
    }

    /// Live instances in slot order.
    pub fn live(&self) -> impl Iterator<Item = &ChartInstance<B::Widget>> {
        self.instances.values()
    }

    pub fn live_count(&self) -> usize {
        self.instances.len()
    }

    pub fn created_count(&self) -> u64 {
        self.created
    }

    pub fn disposed_count(&self) -> u64 {
        self.disposed
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn dispose_slot(&mut self, slot: ChartSlot) {
        if let Some(previous) = self.instances.remove(&slot) {
            debug!(slot = %slot, id = previous.id, "disposing chart");
            self.backend.dispose(slot, previous.widget);
            self.disposed += 1;
        }
    }
}

impl<B: WidgetBackend> Drop for WidgetRegistry<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// A chart rendered to SVG markup.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgWidget {
    pub markup: String,
}

/// Renders widgets with plotters into in-memory SVG documents.
#[derive(Debug, Default)]
pub struct SvgWidgets {
    released_bytes: usize,
}

impl SvgWidgets {
    /// Total size of markup released by disposed widgets.
    pub fn released_bytes(&self) -> usize {
        self.released_bytes
    }
}

impl WidgetBackend for SvgWidgets {
    type Widget = SvgWidget;

    fn construct(
        &mut self,
        slot: ChartSlot,
        spec: &ChartSpec,
        ctx: &DrawingContext,
    ) -> DashboardResult<SvgWidget> {
        let markup = draw::render_svg(spec, ctx).map_err(|e| DashboardError::Render {
            slot: slot.name(),
            message: format!("{e:#}"),
        })?;
        Ok(SvgWidget { markup })
    }

    fn dispose(&mut self, _slot: ChartSlot, widget: SvgWidget) {
        self.released_bytes += widget.markup.len();
    }
}
