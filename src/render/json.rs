use std::fs;
use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};
use serde::Serialize;
use tracing::info;

use crate::error::RenderError;
use crate::pipeline::Dashboard;
use crate::render::Renderer;

pub const DASHBOARD_FILE: &str = "dashboard.json";
pub const ANNOTATIONS_FILE: &str = "annotations.json";

/// Sidebar notes export layout.
#[derive(Serialize)]
struct NotesExport<'a> {
    text_annotations: &'a [String],
}

/// Writes the dashboard (and any sidebar notes) as JSON under `output_dir`.
pub struct JsonFileRenderer {
    output_dir: PathBuf,
}

impl JsonFileRenderer {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    fn write_json<T: Serialize + ?Sized>(
        &self,
        file: &str,
        value: &T,
    ) -> Result<PathBuf, Report<RenderError>> {
        let path = self.output_dir.join(file);
        let body = serde_json::to_string_pretty(value).change_context(RenderError::Serialize)?;
        fs::write(&path, body)
            .change_context(RenderError::Write)
            .attach_with(|| format!("path: {}", path.display()))?;
        Ok(path)
    }
}

impl Renderer for JsonFileRenderer {
    fn render(&self, dashboard: &Dashboard) -> Result<(), Report<RenderError>> {
        fs::create_dir_all(&self.output_dir)
            .change_context(RenderError::CreateDir)
            .attach_with(|| format!("path: {}", self.output_dir.display()))?;

        let path = self.write_json(DASHBOARD_FILE, dashboard)?;
        info!(run_id = %dashboard.run_id, path = %path.display(), "dashboard written");

        let notes = &dashboard.annotations.text_annotations;
        if !notes.is_empty() {
            let path = self.write_json(
                ANNOTATIONS_FILE,
                &NotesExport {
                    text_annotations: notes,
                },
            )?;
            info!(notes = notes.len(), path = %path.display(), "annotations exported");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::annotation::AnnotationSet;
    use crate::config::ChartConfig;
    use crate::model::{EnrichedTable, PriceQuery};
    use crate::present::assemble;

    fn dashboard(annotations: AnnotationSet) -> Dashboard {
        Dashboard {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            query: PriceQuery {
                symbol: "ETH-USD".into(),
                start: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            },
            presentation: assemble(EnrichedTable::default(), &ChartConfig::default()),
            annotations,
        }
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("market-dashboard-{}", Uuid::new_v4()))
    }

    #[test]
    fn writes_dashboard_without_notes_file() {
        let dir = scratch_dir();
        JsonFileRenderer::new(&dir)
            .render(&dashboard(AnnotationSet::default()))
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join(DASHBOARD_FILE)).unwrap()).unwrap();
        assert_eq!(written["query"]["symbol"], "ETH-USD");
        assert!(!dir.join(ANNOTATIONS_FILE).exists());
    }

    #[test]
    fn exports_notes_in_sidebar_layout() {
        let dir = scratch_dir();
        let mut notes = AnnotationSet::default();
        notes.add_note("first");
        notes.add_note("second");
        JsonFileRenderer::new(&dir).render(&dashboard(notes)).unwrap();

        let exported: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join(ANNOTATIONS_FILE)).unwrap())
                .unwrap();
        assert_eq!(
            exported,
            serde_json::json!({"text_annotations": ["first", "second"]})
        );
    }
}
