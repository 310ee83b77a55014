use sift_domain::CriteriaError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid criteria: {0}")]
	InvalidCriteria(#[from] CriteriaError),
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sift_storage::Error> for Error {
	fn from(err: sift_storage::Error) -> Self {
		match err {
			sift_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			sift_storage::Error::InvalidArgument(message) => Self::Storage { message },
			sift_storage::Error::NotFound(message) => Self::Storage { message },
		}
	}
}
