//! Render surfaces - where mapped chart data ends up

use crate::config::ChartConfig;
use crate::core::ChartData;
use anyhow::Result;

/// Imperative chart widget contract
///
/// A surface is initialised once, then receives `clear_all` followed by
/// `load` for every snapshot, and is destroyed when its view stops.
pub trait RenderSurface {
    fn init(&mut self, config: &ChartConfig) -> Result<()>;

    /// Drop everything previously loaded
    fn clear_all(&mut self) -> Result<()>;

    fn load(&mut self, chart: &ChartData) -> Result<()>;

    fn destroy(&mut self) -> Result<()>;
}

/// A call made against a [`MemorySurface`]
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Init,
    ClearAll,
    Load { nodes: usize, edges: usize },
    Destroy,
}

/// Headless surface that keeps the loaded chart and a call log
#[derive(Debug, Default)]
pub struct MemorySurface {
    calls: Vec<SurfaceCall>,
    chart: Option<ChartData>,
    config: Option<ChartConfig>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    /// Currently loaded chart, `None` after a clear
    pub fn chart(&self) -> Option<&ChartData> {
        self.chart.as_ref()
    }

    pub fn config(&self) -> Option<&ChartConfig> {
        self.config.as_ref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.calls.last() == Some(&SurfaceCall::Destroy)
    }
}

impl RenderSurface for MemorySurface {
    fn init(&mut self, config: &ChartConfig) -> Result<()> {
        self.config = Some(config.clone());
        self.calls.push(SurfaceCall::Init);
        Ok(())
    }

    fn clear_all(&mut self) -> Result<()> {
        self.chart = None;
        self.calls.push(SurfaceCall::ClearAll);
        Ok(())
    }

    fn load(&mut self, chart: &ChartData) -> Result<()> {
        self.calls.push(SurfaceCall::Load {
            nodes: chart.nodes.len(),
            edges: chart.edges.len(),
        });
        self.chart = Some(chart.clone());
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.chart = None;
        self.config = None;
        self.calls.push(SurfaceCall::Destroy);
        Ok(())
    }
}

impl<S: RenderSurface + ?Sized> RenderSurface for &mut S {
    fn init(&mut self, config: &ChartConfig) -> Result<()> {
        (**self).init(config)
    }

    fn clear_all(&mut self) -> Result<()> {
        (**self).clear_all()
    }

    fn load(&mut self, chart: &ChartData) -> Result<()> {
        (**self).load(chart)
    }

    fn destroy(&mut self) -> Result<()> {
        (**self).destroy()
    }
}
