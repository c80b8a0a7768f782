use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: &'static str,
}

pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Hello file upload",
    })
}
