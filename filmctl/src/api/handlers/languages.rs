use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState,
    api::models::{languages::LanguageResponse, responses::DataResponse},
    db::handlers::Languages,
    errors::Error,
};

/// List languages
#[utoipa::path(
    get,
    path = "/languages",
    tag = "languages",
    responses(
        (status = 200, description = "All languages", body = DataResponse<Vec<LanguageResponse>>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_languages(State(state): State<AppState>) -> Result<Json<DataResponse<Vec<LanguageResponse>>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let languages = Languages::new(&mut conn).list().await?;

    Ok(Json(DataResponse::new(languages.into_iter().map(LanguageResponse::from).collect())))
}

/// Get a language by its code
#[utoipa::path(
    get,
    path = "/languages/{code}",
    tag = "languages",
    params(("code" = String, Path, description = "ISO 639-1 code, e.g. `en`")),
    responses(
        (status = 200, description = "Language", body = DataResponse<LanguageResponse>),
        (status = 404, description = "Language not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_language(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<DataResponse<LanguageResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let language = Languages::new(&mut conn)
        .get_by_code(code.trim())
        .await?
        .ok_or_else(|| Error::NotFound {
            message: format!("Language with code {code} not found."),
        })?;

    Ok(Json(DataResponse::new(LanguageResponse::from(language))))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::create_test_app;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_languages(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        let body: Value = server.get("/languages").await.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 3);

        let response = server.get("/languages/fr").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["code"], "fr");
        assert!(body["data"]["name"].is_string());

        let missing = server.get("/languages/xx").await;
        missing.assert_status(StatusCode::NOT_FOUND);
        missing.assert_json(&json!({"message": "Language with code xx not found."}));
    }
}
