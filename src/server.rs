//! # HTTP JSON API
//!
//! 基于 hyper 1.x 的本地 HTTP 服务。每个连接在独立的 tokio 任务中处理，
//! 请求按 (方法, 路径段) 分发到 `commands` 层对应的处理函数。
//!
//! 响应统一为 JSON：
//! - 成功：处理函数返回的 `{ success: true, ... }`，状态码 200
//! - 失败：`{ success: false, error }`，状态码由 `AppError::status()` 决定
//!
//! 路由处理与监听循环分离：测试直接调用 [`handle`]，不需要打开端口。

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;

use crate::commands::{collection, preorders, series, tools};
use crate::error::{AppError, AppResult};
use crate::models::preorder::PreorderInput;
use crate::services::state::AppState;

/// 请求体大小上限（1 MB），超出视为非法请求
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// 启动 HTTP 服务，直到收到 Ctrl+C
///
/// 监听地址取自 `AppConfig::bind_addr`。停止监听后已建立的连接会在各自任务中自然结束。
pub async fn serve(state: Arc<AppState>) -> AppResult<()> {
    let listener = TcpListener::bind(&state.config().bind_addr).await?;
    log::info!("HTTP 服务已启动: http://{}", listener.local_addr()?);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    log::warn!("接受连接失败: {}", e);
                    continue;
                }
            },
            _ = &mut shutdown => {
                log::info!("收到 Ctrl+C，HTTP 服务停止监听");
                break;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(handle(&state, req).await) }
            });
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                log::debug!("连接 {} 异常结束: {}", peer, e);
            }
        });
    }

    Ok(())
}

/// 处理单个请求，总是返回一个 JSON 响应
pub async fn handle<B>(state: &AppState, req: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let method = parts.method;
    let path = parts.uri.path().to_string();
    let query = parts.uri.query().map(str::to_string);

    let result = match read_body(body).await {
        Ok(bytes) => dispatch(state, &method, &path, query.as_deref(), &bytes).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(body) => {
            log::debug!("{} {} -> 200", method, path);
            json_response(StatusCode::OK, &body)
        }
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                log::error!("{} {} -> {}: {}", method, path, status.as_u16(), e);
            } else {
                log::warn!("{} {} -> {}: {}", method, path, status.as_u16(), e);
            }
            json_response(status, &json!({ "success": false, "error": e.to_string() }))
        }
    }
}

async fn dispatch(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
    body: &[u8],
) -> AppResult<Value> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        // 收藏清单
        (&Method::GET, ["api", "data"]) => collection::get_data(state).await,
        (&Method::GET, ["api", "search"]) => {
            let q = query_param(query, "q")?.unwrap_or_default();
            collection::search(state, &q).await
        }
        (&Method::GET, ["api", "stats"]) => collection::get_stats(state).await,
        (&Method::GET, ["api", "analytics"]) => collection::get_analytics(state).await,
        (&Method::GET, ["api", "dropdown-options"]) => collection::dropdown_options(state).await,
        (&Method::POST, ["api", "add-model"]) => collection::add_model(state, parse_json(body)?).await,
        (&Method::PUT, ["api", "update-model"]) => {
            collection::update_model(state, parse_json(body)?).await
        }
        (&Method::DELETE, ["api", "delete-model"]) => {
            collection::delete_model(state, parse_json(body)?).await
        }
        (&Method::POST, ["api", "add-field"]) => collection::add_field(state, parse_json(body)?).await,

        // 系列分类
        (&Method::GET, ["api", "series"]) => series::list_series(state).await,
        (&Method::POST, ["api", "series"]) => series::add_series(state, parse_json(body)?).await,
        (&Method::POST, ["api", "series", "subseries"]) => {
            series::add_subseries(state, parse_json(body)?).await
        }
        (&Method::DELETE, ["api", "series", "subseries"]) => {
            series::remove_subseries(state, parse_json(body)?).await
        }
        (&Method::PUT, ["api", "series", "rename"]) => {
            series::rename_series(state, parse_json(body)?).await
        }
        (&Method::PUT, ["api", "series", "subseries", "rename"]) => {
            series::rename_subseries(state, parse_json(body)?).await
        }

        // 预订清单
        (&Method::GET, ["api", "preorders"]) => preorders::list_preorders(state).await,
        (&Method::GET, ["api", "preorders", "statistics"]) => {
            preorders::preorder_statistics(state, today()).await
        }
        (&Method::POST, ["api", "preorders"]) => {
            let input: PreorderInput = parse_json(body)?;
            preorders::add_preorder(state, input, today()).await
        }
        (&Method::PUT, ["api", "preorders", id]) => {
            let updates: Map<String, Value> = parse_json(body)?;
            preorders::update_preorder(state, parse_id(id)?, updates).await
        }
        (&Method::DELETE, ["api", "preorders", id]) => {
            preorders::delete_preorder(state, parse_id(id)?).await
        }

        // 维护工具
        (&Method::GET, ["api", "backups"]) => tools::list_backups(state).await,
        (&Method::POST, ["api", "backups", "restore"]) => {
            tools::restore_backup(state, parse_json(body)?).await
        }
        (&Method::POST, ["api", "convert-years"]) => tools::convert_years(state).await,

        _ => Err(AppError::not_found(format!("未知路由: {} {}", method, path))),
    }
}

async fn read_body<B>(body: B) -> AppResult<Bytes>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(body, MAX_BODY_BYTES)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| AppError::validation(format!("读取请求体失败: {}", e)))
}

/// 解析 JSON 请求体，格式错误或缺少必填字段视为校验错误（400）
fn parse_json<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    if body.is_empty() {
        return Err(AppError::validation("请求体不能为空"));
    }
    serde_json::from_slice(body).map_err(|e| AppError::validation(format!("请求体格式错误: {}", e)))
}

fn parse_id(segment: &str) -> AppResult<u64> {
    segment
        .parse()
        .map_err(|_| AppError::validation(format!("无效的编号: {}", segment)))
}

/// 从查询字符串中取出指定参数并解码（`+` 视为空格）
fn query_param(query: Option<&str>, key: &str) -> AppResult<Option<String>> {
    let Some(query) = query else {
        return Ok(None);
    };
    for pair in query.split('&') {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if name == key {
            let value = value.replace('+', " ");
            let decoded = urlencoding::decode(&value)
                .map_err(|e| AppError::validation(format!("查询参数解码失败: {}", e)))?;
            return Ok(Some(decoded.into_owned()));
        }
    }
    Ok(None)
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::AppConfig;

    async fn setup() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::load(AppConfig::with_data_dir(dir.path())).await.unwrap();
        (dir, state)
    }

    async fn call(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let bytes = body.map(|b| b.to_string()).unwrap_or_default();
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from(bytes)))
            .unwrap();
        let resp = handle(state, req).await;
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn add_search_and_delete_models() {
        let (_dir, state) = setup().await;
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/add-model",
            Some(json!({ "model_name": "Twin Mill", "series": "Mainlines", "subseries": "Mainlines" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["serial_number"], 1);

        let (status, body) = call(&state, Method::GET, "/api/search?q=twin+mill", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_found"], 1);
        assert_eq!(body["search_query"], "twin mill");

        let (_, body) = call(&state, Method::GET, "/api/search?q=%E2%82%B9", None).await;
        assert_eq!(body["search_query"], "₹");

        let (status, _) = call(
            &state,
            Method::DELETE,
            "/api/delete-model",
            Some(json!({ "serial_number": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&state, Method::GET, "/api/data", None).await;
        assert_eq!(body["total_records"], 0);
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let (_dir, state) = setup().await;

        let (status, body) = call(&state, Method::GET, "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/add-model")
            .body(Full::new(Bytes::from_static(b"{ broken")))
            .unwrap();
        assert_eq!(handle(&state, req).await.status(), StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/add-model",
            Some(json!({ "model_name": "Twin Mill", "series": "Premiums", "subseries": "Mainlines" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some());

        let (status, _) = call(
            &state,
            Method::PUT,
            "/api/update-model",
            Some(json!({ "serial_number": 3, "updates": { "Model Name": "x" } })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn preorder_routes_use_path_ids() {
        let (_dir, state) = setup().await;
        let (status, _) = call(
            &state,
            Method::POST,
            "/api/preorders",
            Some(json!({ "seller": "Toy Shop", "models": "Boulevard set", "eta": "2030-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &state,
            Method::PUT,
            "/api/preorders/1",
            Some(json!({ "Delivery Status": "Shipped" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&state, Method::GET, "/api/preorders", None).await;
        assert_eq!(body["data"][0]["Delivery Status"], "Shipped");

        let (status, _) = call(&state, Method::GET, "/api/preorders/statistics", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&state, Method::DELETE, "/api/preorders/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&state, Method::DELETE, "/api/preorders/1", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn series_and_tool_routes() {
        let (_dir, state) = setup().await;
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/series/subseries",
            Some(json!({ "main_series": "Premiums", "subseries": "Boulevard" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subseries_count"], 22);

        let (_, body) = call(&state, Method::GET, "/api/dropdown-options", None).await;
        assert_eq!(body["series"]["Premiums"][4], "Boulevard");

        let (status, _) = call(&state, Method::GET, "/api/backups", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(
            &state,
            Method::POST,
            "/api/backups/restore",
            Some(json!({ "table": "collection" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // 收藏清单尚未创建
        let (status, _) = call(&state, Method::POST, "/api/convert-years", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn query_param_decoding() {
        assert_eq!(query_param(Some("a=1&q=hot%20wheels"), "q").unwrap().as_deref(), Some("hot wheels"));
        assert_eq!(query_param(Some("q"), "q").unwrap().as_deref(), Some(""));
        assert_eq!(query_param(None, "q").unwrap(), None);
    }
}
