//! Command implementations. Each returns what it did; [`execute`] prints it.

mod ingest;
mod publish;

use crate::args::Command;
use crate::context::Context;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use mergebot_pipeline::TransformPipeline;
use mergebot_pipeline::publish::{DeliveryOutcome, PublishOutcome, RoutePublish};
use mergebot_pipeline::transform::{FileResult, TransformReport};
use std::ops::Deref;

pub async fn execute(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Ingest { source, external_id, files } => {
            for item in ingest::run(ctx, &source, external_id.as_deref(), &files).await? {
                println!("{}  {}  {:?}", item.raw_hash, item.path.display(), item.registration);
            }
            Ok(())
        },
        Command::Transform => transform(ctx).await.map(|report| print_transform(&report)),
        Command::Publish { route } => {
            let results = publish::run(ctx, publish::telegram(ctx)?, route.as_deref()).await?;
            print_publish(&results)
        },
        Command::Run { route } => {
            print_transform(&transform(ctx).await?);
            let results = publish::run(ctx, publish::telegram(ctx)?, route.as_deref()).await?;
            print_publish(&results)
        },
        Command::Requeue { hash } => {
            let requeued = ctx.repo.requeue_failed(&hash).await.or_raise(|| ErrorKind::State)?;
            println!("{requeued} file(s) requeued");
            Ok(())
        },
        Command::Status => {
            let counts = ctx.repo.count_by_status().await.or_raise(|| ErrorKind::State)?;
            println!("pending    {}", counts.pending);
            println!("processed  {}", counts.processed);
            println!("failed     {}", counts.failed);
            Ok(())
        },
    }
}

async fn transform(ctx: &Context) -> Result<TransformReport> {
    TransformPipeline::new(ctx.raw.clone(), ctx.repo.clone(), ctx.registry.clone())
        .run()
        .await
        .or_raise(|| ErrorKind::Transform)
}

fn print_transform(report: &TransformReport) {
    for outcome in &report.outcomes {
        let status = match &outcome.result {
            FileResult::Processed { format, stats } => {
                format!("processed as {format}: {} new, {} duplicate", stats.inserted, stats.duplicates)
            },
            FileResult::Failed(reason) => format!("failed: {}", reason.message()),
            FileResult::Unrecorded(reason) => format!("failed, still pending: {}", reason.message()),
        };
        println!("{}  {}  {status}", outcome.raw_hash, outcome.filename);
    }
    println!(
        "{} processed, {} failed, {} new record(s)",
        report.processed(),
        report.failed() + report.unrecorded(),
        report.records_inserted()
    );
}

fn print_publish(results: &[RoutePublish]) -> Result<()> {
    let mut failures = 0;
    for item in results {
        let key = format!("{}:{}", item.route, item.format);
        match &item.result {
            Ok(None) => println!("{key}  no records"),
            Ok(Some(report)) => {
                match report.outcome {
                    PublishOutcome::Unchanged => println!("{key}  unchanged"),
                    PublishOutcome::Published { delivered, attempted } => {
                        println!("{key}  published {}  {delivered}/{attempted} delivered", &report.hash)
                    },
                    PublishOutcome::NothingDelivered => println!("{key}  nothing delivered, will retry"),
                }
                for delivery in &report.deliveries {
                    let outcome = match &delivery.outcome {
                        DeliveryOutcome::Delivered => "delivered".to_string(),
                        DeliveryOutcome::CredentialMissing => "no token".to_string(),
                        DeliveryOutcome::InvalidCaption(reason) => format!("invalid caption: {reason}"),
                        DeliveryOutcome::Failed(reason) => format!("failed: {reason}"),
                        DeliveryOutcome::TimedOut => "timed out".to_string(),
                    };
                    println!("    {}  {outcome}", delivery.target_id);
                }
            },
            Err(e) => {
                failures += 1;
                println!("{key}  error: {}", e.deref());
            },
        }
    }
    match failures {
        0 => Ok(()),
        n => exn::bail!(ErrorKind::Incomplete(n)),
    }
}
