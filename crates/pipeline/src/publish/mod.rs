//! Change-aware, multi-destination publishing.
//!
//! An artifact is tracked under `"{route}:{format}"`. Its hash is compared to
//! the last hash published for that key; an unchanged artifact is skipped
//! entirely. A changed one is archived first and then fanned out to every
//! destination concurrently. Each destination fails on its own: a missing
//! token, a bad caption, a transport error or a timeout only cost that
//! destination its copy.
//!
//! The watermark advances only when at least one destination received the
//! artifact. If none did, the next run sees the same hash as new and tries
//! again.
//!
//! Publishers are created through a [`Connector`] and pooled per token for
//! the lifetime of a [`PublishSession`].

mod caption;
mod pool;
mod report;

pub use self::caption::{CaptionTemplate, CaptionValues};
pub use self::pool::PublisherPool;
pub use self::report::{Delivery, DeliveryOutcome, PublishOutcome, PublishReport};
use crate::build::{Artifact, ArtifactBuilder, route_sources};
use crate::error::{Error, ErrorKind, Result};
use crate::publisher::Connector;
use exn::ResultExt;
use futures::future::join_all;
use mergebot_config::{AppConfig, DestinationConfig, RouteConfig};
use mergebot_state::Repository;
use mergebot_storage::ArtifactStore;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::instrument;

/// Upper bound for a single delivery unless configured otherwise.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Identity under which the publish watermark of an artifact is kept.
pub fn tracking_key(route_name: &str, format: &str) -> String {
    format!("{route_name}:{format}")
}

/// Publishing configuration shared by every session.
#[derive(Clone)]
pub struct PublishPipeline {
    repo: Repository,
    artifacts: ArtifactStore,
    connector: Arc<dyn Connector>,
    default_token: Option<String>,
    timeout: Duration,
}

impl PublishPipeline {
    pub fn new(repo: Repository, artifacts: ArtifactStore, connector: Arc<dyn Connector>) -> Self {
        Self { repo, artifacts, connector, default_token: None, timeout: DEFAULT_DELIVERY_TIMEOUT }
    }

    /// Token for destinations that don't carry their own.
    pub fn with_default_token(mut self, token: impl Into<Option<String>>) -> Self {
        self.default_token = token.into().filter(|t| !t.is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Start a publish run. Publishers created during the run are dropped
    /// with the session.
    pub fn session(&self) -> PublishSession<'_> {
        PublishSession { pipeline: self, pool: PublisherPool::new(Arc::clone(&self.connector)) }
    }
}

/// Outcome of one format of a route.
#[derive(Debug)]
pub struct RoutePublish {
    pub route: String,
    pub format: String,
    /// `Ok(None)` when the route has no records of this format yet.
    pub result: Result<Option<PublishReport>>,
}

/// One publish run.
pub struct PublishSession<'a> {
    pipeline: &'a PublishPipeline,
    pool: PublisherPool,
}

impl PublishSession<'_> {
    /// Publishers created so far in this session.
    pub fn pool(&self) -> &PublisherPool {
        &self.pool
    }

    /// Publish `artifact` to `destinations` if it differs from what was last
    /// published under its tracking key.
    ///
    /// Per-destination failures are reported in the [`PublishReport`]. An
    /// `Err` means the artifact could not be archived, or the watermark could
    /// not be read or written; nothing is sent after an archive failure.
    #[instrument(skip_all, fields(route = %artifact.route_name, format = %artifact.format, hash = %artifact.hash))]
    pub async fn publish(&self, artifact: &Artifact, destinations: &[DestinationConfig]) -> Result<PublishReport> {
        let tracking_key = tracking_key(&artifact.route_name, &artifact.format);
        let repo = &self.pipeline.repo;

        let last = repo.get_last_published_hash(&tracking_key).await.or_raise(|| ErrorKind::State)?;
        if last.as_deref() == Some(artifact.hash.as_str()) {
            tracing::info!(tracking_key, "No change, skipping publish");
            return Ok(PublishReport {
                tracking_key,
                hash: artifact.hash.clone(),
                outcome: PublishOutcome::Unchanged,
                deliveries: Vec::new(),
            });
        }

        self.pipeline
            .artifacts
            .save(&artifact.route_name, &artifact.format, &artifact.hash, &artifact.extension, &artifact.bytes)
            .await
            .or_raise(|| ErrorKind::Archive(tracking_key.clone()))?;

        let filename = artifact.filename();
        let values = CaptionValues {
            timestamp: OffsetDateTime::now_utc(),
            hash: &artifact.hash,
            count: artifact.count,
            format: &artifact.format,
        };
        let deliveries =
            join_all(destinations.iter().map(|destination| self.deliver(artifact, &filename, &values, destination)))
                .await;

        let delivered = deliveries.iter().filter(|d| d.outcome.is_delivered()).count();
        let outcome = if delivered > 0 {
            repo.mark_published(&tracking_key, &artifact.hash).await.or_raise(|| ErrorKind::State)?;
            tracing::info!(tracking_key, delivered, attempted = deliveries.len(), "Published");
            PublishOutcome::Published { delivered, attempted: deliveries.len() }
        } else {
            tracing::warn!(tracking_key, attempted = deliveries.len(), "Nothing delivered, watermark unchanged");
            PublishOutcome::NothingDelivered
        };
        Ok(PublishReport { tracking_key, hash: artifact.hash.clone(), outcome, deliveries })
    }

    #[instrument(skip_all, fields(target_id = %destination.chat_id))]
    async fn deliver(
        &self,
        artifact: &Artifact,
        filename: &str,
        values: &CaptionValues<'_>,
        destination: &DestinationConfig,
    ) -> Delivery {
        let outcome = self.try_deliver(artifact, filename, values, destination).await;
        match &outcome {
            DeliveryOutcome::Delivered => tracing::debug!("Delivered"),
            DeliveryOutcome::CredentialMissing => tracing::error!("No token for destination"),
            DeliveryOutcome::InvalidCaption(reason) => tracing::error!(reason, "Invalid caption template"),
            DeliveryOutcome::Failed(reason) => tracing::error!(reason, "Delivery failed"),
            DeliveryOutcome::TimedOut => tracing::error!(timeout = ?self.pipeline.timeout, "Delivery timed out"),
        }
        Delivery { target_id: destination.chat_id.clone(), outcome }
    }

    async fn try_deliver(
        &self,
        artifact: &Artifact,
        filename: &str,
        values: &CaptionValues<'_>,
        destination: &DestinationConfig,
    ) -> DeliveryOutcome {
        let token = destination.token.as_deref().filter(|t| !t.is_empty()).or(self.pipeline.default_token.as_deref());
        let Some(token) = token else {
            return DeliveryOutcome::CredentialMissing;
        };

        let caption = destination
            .caption_template
            .parse::<CaptionTemplate>()
            .and_then(|template| template.render(values));
        let caption = match caption {
            Ok(caption) => caption,
            Err(e) => return DeliveryOutcome::InvalidCaption(e.deref().to_string()),
        };

        let publisher = match self.pool.get(token) {
            Ok(publisher) => publisher,
            Err(e) => return DeliveryOutcome::Failed(e.deref().to_string()),
        };
        let sending = publisher.publish(&destination.chat_id, &artifact.bytes, filename, &caption);
        match tokio::time::timeout(self.pipeline.timeout, sending).await {
            Ok(Ok(())) => DeliveryOutcome::Delivered,
            Ok(Err(e)) => DeliveryOutcome::Failed(e.deref().to_string()),
            Err(_elapsed) => DeliveryOutcome::TimedOut,
        }
    }

    /// Build and publish every format of `route`.
    ///
    /// Formats are independent: one failing to build or publish doesn't stop
    /// the others.
    #[instrument(skip_all, fields(route = %route.name))]
    pub async fn publish_route(
        &self,
        builder: &ArtifactBuilder,
        config: &AppConfig,
        route: &RouteConfig,
    ) -> Vec<RoutePublish> {
        let mut results = Vec::with_capacity(route.formats.len());
        for format in &route.formats {
            let sources = route_sources(config, route, format);
            let result = match builder.build(&route.name, format, &sources).await {
                Ok(Some(artifact)) => self.publish(&artifact, &route.destinations).await.map(Some),
                Ok(None) => Ok(None),
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                tracing::error!(format, error = ?e, "Could not publish format");
            }
            results.push(RoutePublish { route: route.name.clone(), format: format.clone(), result });
        }
        results
    }
}

impl RoutePublish {
    /// The error, if this format failed as a whole.
    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}
