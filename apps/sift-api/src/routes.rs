use axum::{
	Json, Router,
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sift_domain::{CriteriaError, EntityKind, FetchOptions};
use sift_service::{Error as ServiceError, SearchRequest, SearchResult};

use crate::state::AppState;

/// Request body of `POST /v1/search/{kind}`.
#[derive(Debug, Deserialize)]
pub struct SearchBody {
	pub user_id: i64,
	pub criteria: Value,
	#[serde(default)]
	pub fetch_options: FetchOptions,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search/{kind}", post(search))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Path(kind): Path<String>,
	Json(body): Json<SearchBody>,
) -> Result<Json<SearchResult>, ApiError> {
	let kind = kind.parse::<EntityKind>().map_err(ServiceError::InvalidCriteria)?;
	let request = SearchRequest {
		kind,
		user_id: body.user_id,
		criteria: body.criteria,
		fetch_options: body.fetch_options,
	};
	let response = state.service.search(request).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidCriteria(inner) => {
				let fields = match &inner {
					CriteriaError::Malformed { path, .. } => Some(vec![path.clone()]),
					_ => None,
				};

				ApiError::new(StatusCode::BAD_REQUEST, "INVALID_CRITERIA", inner.to_string(), fields)
			},
			ServiceError::InvalidRequest { message } =>
				ApiError::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Search failed in storage.");

				ApiError::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Search could not be completed.",
					None,
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
