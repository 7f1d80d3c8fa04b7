//! Batch accumulation and flush triggering

use super::{
    app_info::AppInfoProvider,
    config::TargetConfig,
    context::ContextSource,
    error::{Result, TargetError},
    exporter::Exporter,
    filter::{MessageFilter, RecordFilter},
    formatter::{FormattedRecord, RecordFormatter},
    log_level::LogLevel,
    metrics::TargetMetrics,
    raw_record::RawRecord,
    redactor::Redactor,
    timestamp::TimestampFormat,
};
use serde_json::Value;
use std::sync::Arc;

/// Where a target is in its flush cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    Accumulating,
    /// The exporter is running; size-triggered flushing is suspended
    Flushing,
}

/// Suspends the export interval for the duration of one export
///
/// Dropping the guard restores the saved interval and returns the target
/// to `Accumulating`, whether the export returned, failed or panicked.
struct FlushGuard<'a> {
    interval: &'a mut usize,
    saved: usize,
    state: &'a mut FlushState,
}

impl<'a> FlushGuard<'a> {
    fn enter(interval: &'a mut usize, state: &'a mut FlushState) -> Self {
        let saved = std::mem::replace(interval, 0);
        *state = FlushState::Flushing;
        Self {
            interval,
            saved,
            state,
        }
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        *self.interval = self.saved;
        *self.state = FlushState::Accumulating;
    }
}

/// Formats log records as JSON lines and exports them in batches
///
/// Records are filtered, enriched and buffered by [`collect`](Self::collect).
/// A flush happens when the caller signals a final flush or when the batch
/// reaches the export interval. At flush time the global-context snapshot
/// is attached to every buffered record, each record is masked, and the
/// whole batch goes to the exporter in one call.
///
/// # Example
///
/// ```
/// use json_log_target::prelude::*;
/// use json_log_target::exporters::MemoryExporter;
///
/// let exporter = MemoryExporter::new();
/// let batches = exporter.handle();
///
/// let mut target = JsonTarget::builder()
///     .exporter(exporter)
///     .export_interval(2)
///     .mask_vars(["message.password"])
///     .build()
///     .unwrap();
///
/// target.collect(vec![RawRecord::now(r#"{"user":"ann","password":"x"}"#, LogLevel::Info, "auth")], false).unwrap();
/// assert!(batches.batches().is_empty());
///
/// target.collect(vec![RawRecord::now("second", LogLevel::Info, "auth")], false).unwrap();
/// let exported = batches.batches();
/// assert_eq!(exported.len(), 1);
/// assert_eq!(exported[0][0]["message"]["password"], "***");
/// ```
pub struct JsonTarget {
    formatter: RecordFormatter,
    redactor: Redactor,
    filter: Box<dyn RecordFilter>,
    exporter: Box<dyn Exporter>,
    context_source: Option<Box<dyn ContextSource>>,
    log_vars: Vec<String>,
    export_interval: usize,
    state: FlushState,
    batch: Vec<FormattedRecord>,
    metrics: Arc<TargetMetrics>,
}

impl JsonTarget {
    #[must_use]
    pub fn builder() -> TargetBuilder {
        TargetBuilder::new()
    }

    /// Filter, format and buffer `records`, then flush if a trigger is met
    ///
    /// A flush is triggered when the batch is non-empty and either
    /// `is_final` is set or the export interval is non-zero and reached.
    /// Exporter errors are returned as-is and leave the batch in place.
    pub fn collect(&mut self, records: Vec<RawRecord>, is_final: bool) -> Result<()> {
        let received = records.len();
        let accepted = self.filter.filter(records)?;

        self.metrics
            .record_filtered_out(received.saturating_sub(accepted.len()) as u64);
        self.metrics.record_collected(accepted.len() as u64);

        let formatter = &self.formatter;
        self.batch.extend(accepted.iter().map(|record| formatter.format(record)));

        if self.should_flush(is_final) {
            self.flush_batch()?;
        }
        Ok(())
    }

    /// Export everything buffered, regardless of the interval
    pub fn flush(&mut self) -> Result<()> {
        self.collect(Vec::new(), true)
    }

    fn should_flush(&self, is_final: bool) -> bool {
        let count = self.batch.len();
        count > 0 && (is_final || (self.export_interval > 0 && count >= self.export_interval))
    }

    fn flush_batch(&mut self) -> Result<()> {
        if self.formatter.include_context() {
            self.attach_context();
        }

        let Self {
            exporter,
            redactor,
            batch,
            export_interval,
            state,
            metrics,
            ..
        } = self;

        let guard = FlushGuard::enter(export_interval, state);
        let result = export_masked(exporter.as_mut(), redactor, batch);
        drop(guard);

        match result {
            Ok(()) => {
                log::debug!(
                    "exported {} records through '{}'",
                    batch.len(),
                    exporter.name()
                );
                metrics.record_exported(batch.len() as u64);
                batch.clear();
                Ok(())
            }
            Err(e) => {
                log::warn!(
                    "export through '{}' failed, keeping {} records: {}",
                    exporter.name(),
                    batch.len(),
                    e
                );
                metrics.record_export_failure();
                Err(e)
            }
        }
    }

    /// Give every buffered record the same snapshot of the global context
    ///
    /// An empty snapshot resets `context` to `null`, so records retried
    /// after a failed export never keep an older snapshot.
    fn attach_context(&mut self) {
        let context = match &self.context_source {
            Some(source) => {
                let snapshot = source.snapshot(&self.log_vars);
                if snapshot.is_empty() {
                    Value::Null
                } else {
                    Value::Object(snapshot)
                }
            }
            None => Value::Null,
        };

        for record in &mut self.batch {
            record.context = Some(context.clone());
        }
    }

    /// Records buffered and not yet exported
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn batch(&self) -> &[FormattedRecord] {
        &self.batch
    }

    pub fn state(&self) -> FlushState {
        self.state
    }

    pub fn export_interval(&self) -> usize {
        self.export_interval
    }

    pub fn set_export_interval(&mut self, interval: usize) {
        self.export_interval = interval;
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn metrics(&self) -> &TargetMetrics {
        &self.metrics
    }

    /// Shared handle to the metrics, usable after the target moves
    pub fn metrics_handle(&self) -> Arc<TargetMetrics> {
        Arc::clone(&self.metrics)
    }
}

fn export_masked(
    exporter: &mut dyn Exporter,
    redactor: &Redactor,
    batch: &[FormattedRecord],
) -> Result<()> {
    let records = batch
        .iter()
        .map(|record| {
            let mut value = record.to_value()?;
            redactor.mask(&mut value);
            Ok(value)
        })
        .collect::<Result<Vec<_>>>()?;

    exporter.export(&records)
}

impl Drop for JsonTarget {
    fn drop(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        if let Err(e) = self.flush() {
            log::error!(
                "target dropped with {} unexported records: {}",
                self.batch.len(),
                e
            );
        }
    }
}

impl std::fmt::Debug for JsonTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonTarget")
            .field("formatter", &self.formatter)
            .field("redactor", &self.redactor)
            .field("exporter", &self.exporter.name())
            .field("log_vars", &self.log_vars)
            .field("export_interval", &self.export_interval)
            .field("state", &self.state)
            .field("pending", &self.batch.len())
            .finish()
    }
}

/// Builder for constructing a JsonTarget with a fluent API
///
/// # Example
/// ```
/// use json_log_target::prelude::*;
/// use json_log_target::exporters::MemoryExporter;
///
/// let target = JsonTarget::builder()
///     .exporter(MemoryExporter::new())
///     .export_interval(100)
///     .categories(["app.*"])
///     .except(["app.health"])
///     .mask_vars(["message.password", "context.server.PASSWORD"])
///     .log_vars(["server", "!server.PASSWORD"])
///     .context_source(GlobalContext::new())
///     .build()
///     .unwrap();
///
/// assert_eq!(target.export_interval(), 100);
/// ```
pub struct TargetBuilder {
    config: TargetConfig,
    exporter: Option<Box<dyn Exporter>>,
    filter: Option<Box<dyn RecordFilter>>,
    app_info: Option<Arc<dyn AppInfoProvider>>,
    context_source: Option<Box<dyn ContextSource>>,
}

impl TargetBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::from_config(TargetConfig::default())
    }

    /// Start from a loaded configuration
    pub fn from_config(config: TargetConfig) -> Self {
        Self {
            config,
            exporter: None,
            filter: None,
            app_info: None,
            context_source: None,
        }
    }

    /// Set the destination of flushed batches (required)
    #[must_use = "builder methods return a new value"]
    pub fn exporter<E: Exporter + 'static>(mut self, exporter: E) -> Self {
        self.exporter = Some(Box::new(exporter));
        self
    }

    /// Replace the level/category filter built from the configuration
    #[must_use = "builder methods return a new value"]
    pub fn filter<F: RecordFilter + 'static>(mut self, filter: F) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Provide `ip`, `userId` and `sessionId` for each record
    #[must_use = "builder methods return a new value"]
    pub fn prefix<P: AppInfoProvider + 'static>(mut self, provider: P) -> Self {
        self.app_info = Some(Arc::new(provider));
        self
    }

    /// Source of the `context` snapshot taken at each flush
    #[must_use = "builder methods return a new value"]
    pub fn context_source<C: ContextSource + 'static>(mut self, source: C) -> Self {
        self.context_source = Some(Box::new(source));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn mask_vars<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.mask_vars = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn include_context(mut self, include: bool) -> Self {
        self.config.include_context = include;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn decode_message(mut self, decode: bool) -> Self {
        self.config.decode_message = decode;
        self
    }

    /// Flush automatically once this many records are buffered; `0` disables
    #[must_use = "builder methods return a new value"]
    pub fn export_interval(mut self, interval: usize) -> Self {
        self.config.export_interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn levels<I: IntoIterator<Item = LogLevel>>(mut self, levels: I) -> Self {
        self.config.levels = levels.into_iter().collect();
        self
    }

    /// Admit `level` and everything more severe
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.config.levels = LogLevel::ALL.into_iter().filter(|l| *l >= level).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn categories<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.categories = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn except<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.except = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn log_vars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.log_vars = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.config.timestamp_format = format;
        self
    }

    /// Validate the configuration and build the target
    ///
    /// # Errors
    ///
    /// Fails on a missing exporter, a malformed mask path, category pattern
    /// or timestamp layout.
    pub fn build(self) -> Result<JsonTarget> {
        let config = self.config;

        let exporter = self
            .exporter
            .ok_or_else(|| TargetError::config("JsonTarget", "no exporter configured"))?;
        let redactor = Redactor::from_paths(&config.mask_vars)?;
        config.timestamp_format.validate()?;

        let filter = match self.filter {
            Some(filter) => filter,
            None => Box::new(
                MessageFilter::new()
                    .with_levels(config.levels.iter().copied())
                    .with_categories(&config.categories)?
                    .with_except(&config.except)?,
            ),
        };

        let mut formatter = RecordFormatter::new()
            .with_decode_message(config.decode_message)
            .with_include_context(config.include_context)
            .with_timestamp_format(config.timestamp_format);
        if let Some(provider) = self.app_info {
            formatter = formatter.with_app_info(provider);
        }

        Ok(JsonTarget {
            formatter,
            redactor,
            filter,
            exporter,
            context_source: self.context_source,
            log_vars: config.log_vars,
            export_interval: config.export_interval,
            state: FlushState::Accumulating,
            batch: Vec::new(),
            metrics: Arc::new(TargetMetrics::new()),
        })
    }
}

impl Default for TargetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
