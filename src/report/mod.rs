//! Report generation modules.
//!
//! Terminal charts and tables, plus Markdown and JSON exports.

pub mod charts;
pub mod dashboard;
pub mod generator;
pub mod table;

pub use dashboard::{render_dashboard, DashboardState};
pub use generator::{generate_json_report, generate_markdown_report};
