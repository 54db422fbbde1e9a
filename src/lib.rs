//! Turns a comment analysis result into a dashboard of charts, tables, a
//! keyword cloud and summary panels.

pub mod aggregate;
pub mod analysis;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod draw;
pub mod error;
pub mod export;
pub mod palette;
pub mod panels;
pub mod surface;
pub mod tables;
pub mod widgets;

pub use analysis::AnalysisResult;
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, RenderReport};
pub use error::{DashboardError, DashboardResult};
