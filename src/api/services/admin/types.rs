use serde::{Deserialize, Serialize};

/// 错误响应信封 `{code, message, data}`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoginCredentials {
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct DashboardQuery {
    pub filter: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct DeleteLogsResponse {
    pub success: bool,
    pub message: String,
    pub deleted: u64,
}
