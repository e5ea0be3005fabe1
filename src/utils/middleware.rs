use crate::{error::AppError, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// 由上游认证网关解析出的当前用户
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}

/// 当前用户中间件
///
/// 本服务不做认证，只读取网关写入的用户 ID 请求头并原样使用；缺失或为空时返回 401。
pub async fn current_user_middleware(
    State(app_state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    let header_name = app_state.config.user_id_header.as_str();

    let user_id = request
        .headers()
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::unauthorized("Missing user identity"))?;

    debug!("Request to {} by user {}", request.uri().path(), user_id);
    request.extensions_mut().insert(CurrentUser { id: user_id });

    Ok(next.run(request).await)
}
