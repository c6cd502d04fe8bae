//! Host-facing session: owns the current theme engine and runs inspection
//! passes over the editor's selections.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::HunterConfig;
use crate::engine::{EngineOptions, ThemeEngine};
use crate::error::{AppError, AppResult};
use crate::host::{ResourceLoader, ScopeProvider, SpecificityScorer};
use crate::matcher::MatchOptions;
use crate::notification::Notifier;
use crate::scheduler::{SchedulerTiming, TriggerScheduler, UiExecutor};

mod report;

pub use report::ScopeReport;

pub struct Session {
    config: HunterConfig,
    resources: Box<dyn ResourceLoader>,
    notifier: Arc<dyn Notifier>,
    engine: Option<ThemeEngine>,
}

impl Session {
    pub fn new(
        config: HunterConfig,
        resources: Box<dyn ResourceLoader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            resources,
            notifier,
            engine: None,
        }
    }

    pub fn config(&self) -> &HunterConfig {
        &self.config
    }

    pub fn engine(&self) -> Option<&ThemeEngine> {
        self.engine.as_ref()
    }

    /// Start a trigger scheduler using this session's timing and instant mode.
    pub fn spawn_scheduler(&self, executor: Arc<dyn UiExecutor>) -> AppResult<TriggerScheduler> {
        let mut scheduler = TriggerScheduler::new(
            SchedulerTiming::from(&self.config),
            self.config.instant_scoper,
            executor,
        );
        scheduler.start()?;
        info!(instant = self.config.instant_scoper, "trigger scheduler started");
        Ok(scheduler)
    }

    /// Replace the engine with one built from `scheme_file`. On failure the
    /// previous engine is dropped, so scheme features stay off until the next
    /// successful reload.
    pub fn reload_scheme(&mut self, scheme_file: &str) -> AppResult<()> {
        let options = EngineOptions {
            brightness_floor: self.config.brightness_floor,
        };
        match ThemeEngine::load(self.resources.as_ref(), scheme_file, options) {
            Ok(engine) => {
                self.engine = Some(engine);
                Ok(())
            }
            Err(err) => {
                self.engine = None;
                error!(scheme = scheme_file, %err, "color scheme failed to load");
                self.notifier
                    .notify(&format!("Theme parsing failed; scheme info disabled: {err}"));
                Err(err.into())
            }
        }
    }

    /// Resolve a single scope path against the loaded scheme.
    pub fn inspect_scope(
        &mut self,
        scorer: &dyn SpecificityScorer,
        scope: &str,
        options: MatchOptions,
    ) -> AppResult<ScopeReport> {
        let engine = self.engine.as_mut().ok_or(AppError::NoScheme)?;
        let style = engine.guess_color(scorer, scope, options)?;
        Ok(ScopeReport::new(scope.trim(), None).with_style(
            style,
            engine.scheme_file(),
            engine.overrides(),
        ))
    }

    /// Inspect the primary selection (or every selection with `multiselect`).
    pub fn run_pass(
        &mut self,
        provider: &dyn ScopeProvider,
        scorer: &dyn SpecificityScorer,
    ) -> Vec<ScopeReport> {
        let mut points = provider.selections();
        if !self.config.multiselect {
            points.truncate(1);
        }

        let mut scheme_info = self.config.show_color_scheme_info;
        let mut reports = Vec::with_capacity(points.len());
        for point in points {
            let at = match provider.scope_at(point) {
                Ok(at) => at,
                Err(err) => {
                    warn!(point, %err, "scope lookup failed");
                    continue;
                }
            };
            let mut report = ScopeReport::new(at.scope.trim(), Some(at.extent))
                .with_rows(at.rows.filter(|_| self.config.extent_line_char))
                .with_syntax_file(provider.syntax_file());

            if let Some(engine) = self.engine.as_mut().filter(|_| scheme_info) {
                match engine.guess_color(scorer, &at.scope, MatchOptions::default()) {
                    Ok(style) => {
                        report = report.with_style(style, engine.scheme_file(), engine.overrides());
                    }
                    Err(err) => {
                        error!(scope = %at.scope, %err, "evaluating theme failed; ignoring theme info");
                        self.notifier.notify("Evaluating theme failed! Ignoring theme related info.");
                        scheme_info = false;
                    }
                }
            }
            reports.push(report);
        }

        info!(reports = reports.len(), "inspection pass complete");
        reports
    }
}
