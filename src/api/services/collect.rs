//! 公开采集接口
//!
//! 无论请求体是否合法、存储是否可用，都返回 `{ok: true}`，不影响被统计的站点。

use actix_web::http::header::USER_AGENT;
use actix_web::{HttpRequest, HttpResponse, web};
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::services::{CollectRequest, IngestService, RequestContext};
use crate::utils::ip::extract_client_ip;

/// 采集请求体上限；超出的信号丢弃，仍然返回 ok
pub const MAX_COLLECT_BODY_BYTES: usize = 64 * 1024;

#[derive(Serialize)]
struct CollectAck {
    ok: bool,
}

fn ack() -> HttpResponse {
    HttpResponse::Ok().json(CollectAck { ok: true })
}

/// 读取请求体，超过 `cap` 或读取出错时返回 None
///
/// 不走 `web::Bytes` 提取器：它超限时直接返回 413，处理函数不会执行
async fn read_capped(mut payload: web::Payload, cap: usize) -> Option<web::BytesMut> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!("Collect body read failed: {}", e);
                return None;
            }
        };
        if body.len() + chunk.len() > cap {
            debug!("Dropping collect body larger than {} bytes", cap);
            return None;
        }
        body.extend_from_slice(&chunk);
    }
    Some(body)
}

/// POST /api/collect, /api/signal
///
/// 请求体按原始字节解析，兼容 sendBeacon 的 text/plain
pub async fn collect(
    req: HttpRequest,
    payload: web::Payload,
    ingest: web::Data<Arc<IngestService>>,
) -> HttpResponse {
    let Some(body) = read_capped(payload, MAX_COLLECT_BODY_BYTES).await else {
        return ack();
    };

    let raw = if body.iter().all(u8::is_ascii_whitespace) {
        CollectRequest::default()
    } else {
        match serde_json::from_slice::<CollectRequest>(&body) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Ignoring malformed collect body: {}", e);
                return ack();
            }
        }
    };

    let ctx = RequestContext {
        ip: extract_client_ip(&req),
        user_agent: req
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    };

    ingest.collect(raw, ctx).await;
    ack()
}

pub fn collect_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/collect", web::post().to(collect))
        .route("/signal", web::post().to(collect));
}
