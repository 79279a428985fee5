//! Ingest, transform, build and publish against real local storage and an
//! on-disk database.

use async_trait::async_trait;
use mergebot_config::DestinationConfig;
use mergebot_formats::FormatRegistry;
use mergebot_pipeline::publish::PublishOutcome;
use mergebot_pipeline::publisher::error::{ErrorKind as PublisherErrorKind, Result as PublisherResult};
use mergebot_pipeline::publisher::{Connector, Publisher};
use mergebot_pipeline::transform::FileResult;
use mergebot_pipeline::{ArtifactBuilder, PublishPipeline, TransformPipeline};
use mergebot_state::{Database, FileStatus, NewSeenFile, Repository};
use mergebot_storage::backend::LocalBackend;
use mergebot_storage::{ArtifactStore, RawStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Counts deliveries per target; can be switched to refuse everything.
#[derive(Default)]
struct CountingConnector {
    calls: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    down: AtomicBool,
}

struct CountingPublisher(Arc<CountingConnector>);

#[async_trait]
impl Publisher for CountingPublisher {
    async fn publish(&self, target_id: &str, _data: &[u8], _filename: &str, _caption: &str) -> PublisherResult<()> {
        self.0.attempts.fetch_add(1, Ordering::SeqCst);
        if self.0.down.load(Ordering::SeqCst) {
            exn::bail!(PublisherErrorKind::Transport);
        }
        self.0.calls.lock().unwrap().push(target_id.to_string());
        Ok(())
    }
}

struct SharedConnector(Arc<CountingConnector>);

impl Connector for SharedConnector {
    fn connect(&self, _token: &str) -> PublisherResult<Arc<dyn Publisher>> {
        Ok(Arc::new(CountingPublisher(Arc::clone(&self.0))))
    }
}

struct World {
    _dir: TempDir,
    raw: RawStore,
    repo: Repository,
    transform: TransformPipeline,
    builder: ArtifactBuilder,
    publish: PublishPipeline,
    connector: Arc<CountingConnector>,
}

async fn world() -> World {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::connect(dir.path().join("state.db")).await.unwrap();
    let repo = Repository::from(&db);
    let raw = RawStore::new(Arc::new(LocalBackend::new("raw", dir.path().join("raw")).unwrap()));
    let artifacts = ArtifactStore::new(Arc::new(LocalBackend::new("artifacts", dir.path().join("artifacts")).unwrap()));
    let registry = FormatRegistry::with_defaults();
    let connector = Arc::new(CountingConnector::default());

    World {
        transform: TransformPipeline::new(raw.clone(), repo.clone(), registry.clone()),
        builder: ArtifactBuilder::new(repo.clone(), registry),
        publish: PublishPipeline::new(repo.clone(), artifacts, Arc::new(SharedConnector(Arc::clone(&connector))))
            .with_default_token(Some("token".to_string())),
        _dir: dir,
        raw,
        repo,
        connector,
    }
}

impl World {
    async fn ingest(&self, external_id: &str, filename: &str, data: &[u8]) -> String {
        let raw_hash = self.raw.save(data).await.unwrap();
        let file = NewSeenFile {
            source_id: "channel".to_string(),
            external_id: external_id.to_string(),
            raw_hash: raw_hash.clone(),
            filename: filename.to_string(),
        };
        self.repo.register_file(&file).await.unwrap();
        raw_hash
    }

    fn calls(&self) -> Vec<String> {
        self.connector.calls.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn test_ingest_transform_publish() {
    let world = world().await;
    let sources = vec!["channel".to_string()];
    let destinations = [DestinationConfig::new("@first"), DestinationConfig::new("@second")];

    let raw_hash = world.ingest("1", "payload-A.npvt", b"payload-A").await;
    assert_eq!(world.repo.get_file(&raw_hash).await.unwrap().unwrap().status, FileStatus::Pending);

    let report = world.transform.run().await.unwrap();
    assert!(matches!(report.outcomes[0].result, FileResult::Processed { format: "npvt", .. }));
    assert_eq!(world.repo.get_file(&raw_hash).await.unwrap().unwrap().status, FileStatus::Processed);
    let records = world.repo.list_records("npvt", &sources).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].unique_hash, mergebot_formats::record_hash("npvt", b"payload-A"));

    let artifact = world.builder.build("free", "npvt", &sources).await.unwrap().unwrap();
    let report = world.publish.session().publish(&artifact, &destinations).await.unwrap();
    assert_eq!(report.outcome, PublishOutcome::Published { delivered: 2, attempted: 2 });
    let mut calls = world.calls();
    calls.sort();
    assert_eq!(calls, ["@first", "@second"]);
    assert_eq!(world.repo.get_last_published_hash("free:npvt").await.unwrap(), Some(artifact.hash.clone()));

    // Same artifact again: no calls at all.
    let rebuilt = world.builder.build("free", "npvt", &sources).await.unwrap().unwrap();
    assert_eq!(rebuilt.hash, artifact.hash);
    let report = world.publish.session().publish(&rebuilt, &destinations).await.unwrap();
    assert_eq!(report.outcome, PublishOutcome::Unchanged);
    assert_eq!(world.calls().len(), 2);
}

#[tokio::test]
async fn test_failed_publish_is_retried() {
    let world = world().await;
    let sources = vec!["channel".to_string()];
    let destinations = [DestinationConfig::new("@only")];
    world.ingest("1", "links.txt", b"vmess://abc\n").await;
    world.transform.run().await.unwrap();
    let artifact = world.builder.build("free", "uri", &sources).await.unwrap().unwrap();

    world.connector.down.store(true, Ordering::SeqCst);
    let report = world.publish.session().publish(&artifact, &destinations).await.unwrap();
    assert_eq!(report.outcome, PublishOutcome::NothingDelivered);
    assert_eq!(world.repo.get_last_published_hash("free:uri").await.unwrap(), None);

    world.connector.down.store(false, Ordering::SeqCst);
    let report = world.publish.session().publish(&artifact, &destinations).await.unwrap();
    assert_eq!(report.outcome, PublishOutcome::Published { delivered: 1, attempted: 1 });
    assert_eq!(world.connector.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(world.calls(), ["@only"]);
}

#[tokio::test]
async fn test_new_records_change_the_artifact() {
    let world = world().await;
    let sources = vec!["channel".to_string()];
    let destinations = [DestinationConfig::new("@only")];

    world.ingest("1", "links.txt", b"ss://one\n").await;
    world.transform.run().await.unwrap();
    let first = world.builder.build("free", "uri", &sources).await.unwrap().unwrap();
    world.publish.session().publish(&first, &destinations).await.unwrap();

    world.ingest("2", "links.txt", b"ss://one\nss://two\n").await;
    world.transform.run().await.unwrap();
    let second = world.builder.build("free", "uri", &sources).await.unwrap().unwrap();
    assert_ne!(first.hash, second.hash);
    assert_eq!(second.count, Some(2));

    let report = world.publish.session().publish(&second, &destinations).await.unwrap();
    assert!(report.is_published());
    assert_eq!(world.calls().len(), 2);
    assert_eq!(world.repo.get_last_published_hash("free:uri").await.unwrap(), Some(second.hash));
}
