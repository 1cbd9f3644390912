//! 前端静态资源与 SPA fallback
//!
//! 顺序：static_dir 下的文件 → static_dir/index.html → 内置占位页
//! `/admin`：static_dir/admin/index.html → static_dir/index.html → 存活页

use actix_web::http::Method;
use actix_web::{HttpRequest, HttpResponse, Result, web};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};

const PLACEHOLDER_HTML: &str = "<!doctype html><html><head><meta charset=\"utf-8\"><title>Beacon</title></head>\
<body><h1>Beacon</h1><p>Front-end assets are not built yet. Refresh in a few seconds.</p></body></html>";

const ADMIN_ONLINE_HTML: &str = "<!doctype html><html><head><meta charset=\"utf-8\"><title>Beacon admin</title></head>\
<body><h1>Beacon admin online</h1></body></html>";

/// 静态资源目录
#[derive(Clone, Debug)]
pub struct StaticAssets {
    root: PathBuf,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 将请求路径映射到 root 下；含 `..` 或绝对路径时返回 None
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = Path::new(request_path.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(resolved)
    }
}

pub struct FrontendService;

impl FrontendService {
    pub async fn handle_spa_fallback(
        req: HttpRequest,
        assets: web::Data<StaticAssets>,
    ) -> Result<HttpResponse> {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return Ok(HttpResponse::NotFound().finish());
        }
        let path = req.path();

        if let Some(file) = assets.resolve(path).filter(|p| p != &assets.root)
            && let Ok(content) = tokio::fs::read(&file).await
        {
            trace!("Serving static file {}", file.display());
            return Ok(HttpResponse::Ok()
                .content_type(Self::get_content_type(path))
                .body(content));
        }

        match tokio::fs::read(assets.root.join("index.html")).await {
            Ok(content) => {
                trace!("SPA fallback for {}", path);
                Ok(HttpResponse::Ok()
                    .content_type("text/html; charset=utf-8")
                    .body(content))
            }
            Err(e) => {
                debug!(
                    "index.html not available in {}: {}",
                    assets.root.display(),
                    e
                );
                Ok(HttpResponse::Ok()
                    .content_type("text/html; charset=utf-8")
                    .body(PLACEHOLDER_HTML))
            }
        }
    }

    /// GET /admin
    ///
    /// 前端构建过时与其它 SPA 路由一致，否则返回存活页而不是占位页
    pub async fn admin_page(assets: web::Data<StaticAssets>) -> HttpResponse {
        let candidates = [
            assets.root.join("admin").join("index.html"),
            assets.root.join("index.html"),
        ];
        for page in &candidates {
            if let Ok(content) = tokio::fs::read(page).await {
                trace!("Serving admin page from {}", page.display());
                return HttpResponse::Ok()
                    .content_type("text/html; charset=utf-8")
                    .body(content);
            }
        }

        debug!("Front-end not built in {}, serving admin stub", assets.root.display());
        HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(ADMIN_ONLINE_HTML)
    }

    fn get_content_type(path: &str) -> &'static str {
        match path.rsplit('.').next() {
            Some("html") => "text/html; charset=utf-8",
            Some("css") => "text/css",
            Some("js") | Some("mjs") => "application/javascript",
            Some("json") => "application/json",
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("svg") => "image/svg+xml",
            Some("ico") => "image/x-icon",
            Some("webp") => "image/webp",
            Some("glb") => "model/gltf-binary",
            Some("woff") => "font/woff",
            Some("woff2") => "font/woff2",
            Some("ttf") => "font/ttf",
            _ => "application/octet-stream",
        }
    }
}

/// 兜底路由，必须最后注册
pub fn frontend_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin", web::get().to(FrontendService::admin_page))
        .default_service(web::to(FrontendService::handle_spa_fallback));
}
