//! Analysis Pipeline
//!
//! Orchestrates one full run: enumerate the catalog, fan out per-container
//! sampling and inference under a bounded concurrency, reduce schemas into
//! relationship candidates, then score each candidate.
//!
//! Per-container sampling failures are recorded and skipped; only a failed
//! database enumeration aborts the run. A shared cancellation flag is
//! checked between store calls.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::inference::{InferenceOptions, SchemaInferrer, TypeClassifier};
use crate::relations::{ConfidenceCalculator, ConfidenceOptions, RelationshipDetector};
use crate::store::DocumentStore;
use crate::types::{
    AnalysisReport, ContainerFailure, ContainerRef, ContainerSchema, MapError, Relationship,
    Result,
};

// =============================================================================
// Cancellation
// =============================================================================

/// Clonable cancellation signal shared between the driver and the workers
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MapError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// Options
// =============================================================================

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Documents sampled per container
    pub sample_size: usize,
    /// Restrict to these databases; empty analyses everything
    pub databases: Vec<String>,
    /// Restrict to a single container name
    pub container: Option<String>,
    /// Run live referential-integrity validation
    pub validate: bool,
    /// Bound on simultaneous store calls
    pub concurrency: usize,
    /// Per-store-call timeout
    pub call_timeout: Duration,
    pub inference: InferenceOptions,
    /// Custom classifier patterns as (name, regex) pairs
    pub custom_patterns: Vec<(String, String)>,
    pub confidence: ConfidenceOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            sample_size: 100,
            databases: Vec::new(),
            container: None,
            validate: false,
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            call_timeout: Duration::from_secs(30),
            inference: InferenceOptions::default(),
            custom_patterns: Vec::new(),
            confidence: ConfidenceOptions::default(),
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

pub struct AnalysisPipeline {
    store: Arc<dyn DocumentStore>,
    options: PipelineOptions,
    cancel: CancelFlag,
}

impl AnalysisPipeline {
    pub fn new(store: Arc<dyn DocumentStore>, options: PipelineOptions) -> Self {
        Self::with_cancel(store, options, CancelFlag::new())
    }

    /// Share an externally owned cancellation flag, e.g. one wired to a
    /// Ctrl-C handler that outlives individual watch-mode runs
    pub fn with_cancel(
        store: Arc<dyn DocumentStore>,
        options: PipelineOptions,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            store,
            options,
            cancel,
        }
    }

    /// Handle for the driver to request cancellation
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub async fn run(&self) -> Result<AnalysisReport> {
        self.cancel.check()?;

        let databases = self.enumerate_databases().await?;
        let catalog: Vec<ContainerRef> = databases
            .iter()
            .flat_map(|db| db.container_refs())
            .collect();
        info!(
            "Analyzing {} containers across {} databases",
            catalog.len(),
            databases.len()
        );

        let (schemas, failures) = self.infer_schemas(&catalog).await?;
        self.cancel.check()?;

        let relationships = self.detect_relationships(&catalog, &schemas);
        let relationships = self.score_relationships(relationships, &schemas).await?;

        for failure in &failures {
            warn!(
                "Container {}/{} contributed no schema: {}",
                failure.database, failure.container, failure.message
            );
        }

        Ok(AnalysisReport {
            databases,
            schemas,
            relationships,
            timestamp: Utc::now(),
            sample_size: self.options.sample_size,
            failures,
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    async fn enumerate_databases(&self) -> Result<Vec<crate::types::DatabaseCatalog>> {
        let all = self
            .store
            .list_databases()
            .await
            .map_err(|e| MapError::Fatal(format!("cannot list databases: {}", e)))?;

        let selected: Vec<String> = if self.options.databases.is_empty() {
            all
        } else {
            all.into_iter()
                .filter(|db| self.options.databases.contains(db))
                .collect()
        };

        let mut catalogs = Vec::new();
        for database in selected {
            self.cancel.check()?;
            match self.store.list_containers(&database).await {
                Ok(containers) => {
                    let containers = match &self.options.container {
                        Some(only) => containers.into_iter().filter(|c| c == only).collect(),
                        None => containers,
                    };
                    catalogs.push(crate::types::DatabaseCatalog::new(database, containers));
                }
                Err(e) => {
                    warn!("Cannot list containers in {}: {}", database, e);
                }
            }
        }
        Ok(catalogs)
    }

    // =========================================================================
    // Sampling & Inference
    // =========================================================================

    async fn infer_schemas(
        &self,
        catalog: &[ContainerRef],
    ) -> Result<(BTreeMap<String, ContainerSchema>, Vec<ContainerFailure>)> {
        let classifier = TypeClassifier::with_patterns(
            self.options
                .custom_patterns
                .iter()
                .map(|(n, p)| (n.as_str(), p.as_str())),
        );
        let inferrer = Arc::new(SchemaInferrer::new(
            classifier,
            self.options.inference.clone(),
        ));

        let schemas: Arc<DashMap<String, ContainerSchema>> = Arc::new(DashMap::new());
        let mut failures = Vec::new();

        let mut stream = futures::stream::iter(catalog.iter().cloned())
            .map(|container| {
                let store = Arc::clone(&self.store);
                let inferrer = Arc::clone(&inferrer);
                let schemas = Arc::clone(&schemas);
                let cancel = self.cancel.clone();
                let sample_size = self.options.sample_size;
                let call_timeout = self.options.call_timeout;
                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let sampled = tokio::time::timeout(
                        call_timeout,
                        store.sample_documents(&container.database, &container.name, sample_size),
                    )
                    .await
                    .unwrap_or_else(|_| {
                        Err(MapError::timeout("sampleDocuments", call_timeout))
                    });

                    match sampled {
                        Ok(documents) => {
                            debug!(
                                "Sampled {} documents from {}",
                                documents.len(),
                                container
                            );
                            let schema = inferrer.infer(&documents);
                            schemas.insert(container.key(), schema);
                            None
                        }
                        Err(e) => Some(MapError::sampling(
                            container.database,
                            container.name,
                            e.to_string(),
                        )),
                    }
                }
            })
            .buffer_unordered(self.options.concurrency);

        while let Some(outcome) = stream.next().await {
            if let Some(MapError::Sampling {
                database,
                container,
                message,
            }) = outcome
            {
                failures.push(ContainerFailure {
                    database,
                    container,
                    message,
                });
            }
        }
        drop(stream);
        self.cancel.check()?;

        let schemas = Arc::try_unwrap(schemas)
            .map_err(|_| MapError::Fatal("schema map still shared after inference".to_string()))?
            .into_iter()
            .collect();
        Ok((schemas, failures))
    }

    // =========================================================================
    // Detection & Scoring
    // =========================================================================

    fn detect_relationships(
        &self,
        catalog: &[ContainerRef],
        schemas: &BTreeMap<String, ContainerSchema>,
    ) -> Vec<Relationship> {
        let detector = RelationshipDetector::new(catalog.to_vec());
        let mut relationships = Vec::new();
        for container in catalog {
            if let Some(schema) = schemas.get(&container.key()) {
                relationships.extend(detector.detect(container, schema));
            }
        }
        info!("Detected {} candidate relationships", relationships.len());
        relationships
    }

    async fn score_relationships(
        &self,
        relationships: Vec<Relationship>,
        schemas: &BTreeMap<String, ContainerSchema>,
    ) -> Result<Vec<Relationship>> {
        let calculator = if self.options.validate {
            ConfidenceCalculator::with_validator(
                self.options.confidence.clone(),
                Arc::clone(&self.store),
            )
        } else {
            ConfidenceCalculator::new(self.options.confidence.clone())
        };

        // `buffered` keeps the detector's stable emission order
        let scored: Vec<Relationship> = futures::stream::iter(relationships)
            .map(|mut relationship| {
                let calculator = &calculator;
                let cancel = self.cancel.clone();
                async move {
                    if cancel.is_cancelled() {
                        return relationship;
                    }
                    let confidence = calculator.analyze(&relationship, schemas).await;
                    relationship.confidence = Some(confidence);
                    relationship
                }
            })
            .buffered(self.options.concurrency)
            .collect()
            .await;

        self.cancel.check()?;
        Ok(scored)
    }
}

// =============================================================================
// Tests
// =============================================================================
