//! `render_mermaid` and `batch_render_mermaid` handlers.

use std::sync::Arc;

use merviz_core::{Error, Result};
use merviz_render::{BatchRequest, DeliveryMode, RenderOptions, RenderRequest};
use serde::Deserialize;
use serde_json::Value;

use crate::TRACING_TARGET_TOOLS;
use crate::service::McpService;
use crate::tools::{parse_args, to_payload};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RenderArgs {
    code: Option<String>,
    options: Option<RenderOptions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BatchArgs {
    requests: Option<Vec<RenderRequest>>,
    global_options: Option<RenderOptions>,
}

/// Renders a single diagram and resolves its delivery.
pub async fn render_mermaid(service: &Arc<McpService>, args: Value) -> Result<Value> {
    let args: RenderArgs = parse_args(args)?;
    let code = args
        .code
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| Error::invalid_input().with_message("missing required parameter: code"))?;
    let options = args.options.unwrap_or_default();

    let mut result = service.renderer().render(&code, &options).await;
    service.deliver(&mut result, &options).await;
    to_payload(&result)
}

/// Renders a batch of diagrams and resolves delivery per item.
pub async fn batch_render_mermaid(service: &Arc<McpService>, args: Value) -> Result<Value> {
    let args: BatchArgs = parse_args(args)?;
    let requests = args
        .requests
        .filter(|requests| !requests.is_empty())
        .ok_or_else(|| {
            Error::invalid_input().with_message("missing required parameter: requests")
        })?;
    let global = args.global_options.clone().unwrap_or_default();

    // bring the static server up front when any item wants local
    // delivery, so per-item resolution does not race the first start
    let wants_local = requests.iter().any(|request| {
        merged_options(request, &global)
            .resolve()
            .is_ok_and(|resolved| resolved.delivery == DeliveryMode::LocalServer)
    });
    if wants_local
        && let Err(e) = service.ensure_static_server().await
    {
        tracing::warn!(
            target: TRACING_TARGET_TOOLS,
            error = %e,
            "static server unavailable, local delivery will fail per item"
        );
    }

    let mut batch = service
        .renderer()
        .render_batch(BatchRequest {
            requests: requests.clone(),
            global_options: args.global_options,
        })
        .await;

    // results are in request order, so items and results zip one-to-one
    for (result, request) in batch.results.iter_mut().zip(&requests) {
        let options = merged_options(request, &global);
        service.deliver(result, &options).await;
    }

    to_payload(&batch)
}

fn merged_options(request: &RenderRequest, global: &RenderOptions) -> RenderOptions {
    request
        .options
        .as_ref()
        .map(|options| options.merged_over(global))
        .unwrap_or_else(|| global.clone())
}
