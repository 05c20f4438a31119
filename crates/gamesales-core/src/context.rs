use chrono::{DateTime, Utc};
use tracing::{info, info_span, warn, Span};
use uuid::Uuid;

use crate::config::PipelineConfig;

/// State owned by a single pipeline run.
///
/// Created at run start and released when dropped, on success and failure
/// alike. Call [`ExecutionContext::finish`] once every output is written.
#[derive(Debug)]
pub struct ExecutionContext {
    config: PipelineConfig,
    run_id: Uuid,
    started_at: DateTime<Utc>,
    span: Span,
    completed: bool,
}

impl ExecutionContext {
    pub fn start(config: PipelineConfig) -> Self {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id);
        info!(
            parent: &span,
            input_dir = %config.input_dir.display(),
            output_dir = %config.output_dir.display(),
            "execution context opened"
        );

        Self {
            config,
            run_id,
            started_at: Utc::now(),
            span,
            completed: false,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn finish(mut self) {
        self.completed = true;
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        let elapsed_ms = (Utc::now() - self.started_at).num_milliseconds();
        if self.completed {
            info!(parent: &self.span, elapsed_ms, "execution context released");
        } else {
            warn!(
                parent: &self.span,
                elapsed_ms,
                "execution context released without completing the run"
            );
        }
    }
}
