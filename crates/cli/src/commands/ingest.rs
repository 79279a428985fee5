use crate::context::Context;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use mergebot_state::{NewSeenFile, Registration};
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    pub path: PathBuf,
    pub raw_hash: String,
    pub registration: Registration,
}

/// Save each file to the raw store and register it as pending.
#[instrument(skip(ctx, files), fields(files = files.len()))]
pub async fn run(ctx: &Context, source: &str, external_id: Option<&str>, files: &[PathBuf]) -> Result<Vec<Ingested>> {
    ctx.config.source(source).ok_or_raise(|| ErrorKind::UnknownSource(source.to_string()))?;
    if external_id.is_some() && files.len() > 1 {
        exn::bail!(ErrorKind::AmbiguousExternalId);
    }

    let mut ingested = Vec::with_capacity(files.len());
    for path in files {
        let data = tokio::fs::read(path).await.or_raise(|| ErrorKind::Input(path.clone()))?;
        let raw_hash = ctx.raw.save(&data).await.or_raise(|| ErrorKind::Storage)?;
        let file = NewSeenFile {
            source_id: source.to_string(),
            external_id: external_id.map_or_else(|| raw_hash.clone(), str::to_string),
            raw_hash: raw_hash.clone(),
            filename: file_name(path),
        };
        let registration = ctx.repo.register_file(&file).await.or_raise(|| ErrorKind::State)?;
        tracing::info!(path = %path.display(), raw_hash, ?registration, "Ingested");
        ingested.push(Ingested { path: path.clone(), raw_hash, registration });
    }
    Ok(ingested)
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
}
