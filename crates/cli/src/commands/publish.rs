use crate::context::Context;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use mergebot_config::RouteConfig;
use mergebot_pipeline::publish::RoutePublish;
use mergebot_pipeline::publisher::{Connector, TelegramConnector};
use mergebot_pipeline::{ArtifactBuilder, PublishPipeline};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// The routes to publish: one by name, or all of them.
pub fn select_routes<'a>(ctx: &'a Context, route: Option<&str>) -> Result<Vec<&'a RouteConfig>> {
    Ok(match route {
        Some(name) => vec![ctx.config.route(name).ok_or_raise(|| ErrorKind::UnknownRoute(name.to_string()))?],
        None => ctx.config.publishing.routes.iter().collect(),
    })
}

pub fn telegram(ctx: &Context) -> Result<Arc<dyn Connector>> {
    let timeout = Duration::from_secs(ctx.config.telegram.timeout_secs);
    let connector = TelegramConnector::new(&ctx.config.telegram.api_url, timeout).or_raise(|| ErrorKind::Publisher)?;
    Ok(Arc::new(connector))
}

/// Build and publish every format of the selected routes.
#[instrument(skip_all, fields(route = ?route))]
pub async fn run(ctx: &Context, connector: Arc<dyn Connector>, route: Option<&str>) -> Result<Vec<RoutePublish>> {
    let routes = select_routes(ctx, route)?;
    let pipeline = PublishPipeline::new(ctx.repo.clone(), ctx.artifacts.clone(), connector)
        .with_default_token(ctx.config.telegram.token.clone())
        .with_timeout(Duration::from_secs(ctx.config.telegram.timeout_secs));
    let builder = ArtifactBuilder::new(ctx.repo.clone(), ctx.registry.clone());

    let session = pipeline.session();
    let mut results = Vec::new();
    for route in routes {
        results.extend(session.publish_route(&builder, &ctx.config, route).await);
    }
    Ok(results)
}
