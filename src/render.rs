pub mod json;
pub mod terminal;

use error_stack::Report;

use crate::error::RenderError;
use crate::pipeline::Dashboard;

/// Sink for a finished dashboard.
pub trait Renderer: Send + Sync {
    fn render(&self, dashboard: &Dashboard) -> Result<(), Report<RenderError>>;
}
