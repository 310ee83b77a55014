use std::{
	collections::VecDeque,
	sync::{Arc, Mutex},
};

use sift_storage::{BoxFuture, SqlArg, SqlExecutor, SqlRow, SqlValue};

use crate::auth::{AuthorisationInformation, AuthorisationProvider};

type Response = Result<Vec<SqlRow>, String>;

/// Replays queued responses in order and records every statement it receives.
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
	responses: Mutex<VecDeque<Response>>,
	calls: Mutex<Vec<(String, Vec<SqlArg>)>>,
}
impl ScriptedExecutor {
	pub(crate) fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub(crate) fn push_ids(&self, ids: &[i64]) -> &Self {
		self.push_rows(ids.iter().map(|id| vec![SqlValue::Int(*id)]).collect())
	}

	pub(crate) fn push_rows(&self, rows: Vec<SqlRow>) -> &Self {
		self.responses.lock().expect("responses lock").push_back(Ok(rows));

		self
	}

	pub(crate) fn push_error(&self, message: &str) -> &Self {
		self.responses.lock().expect("responses lock").push_back(Err(message.to_string()));

		self
	}

	pub(crate) fn calls(&self) -> Vec<(String, Vec<SqlArg>)> {
		self.calls.lock().expect("calls lock").clone()
	}

	pub(crate) fn sql(&self) -> Vec<String> {
		self.calls().into_iter().map(|(sql, _)| sql).collect()
	}
}

impl SqlExecutor for ScriptedExecutor {
	fn execute<'a>(
		&'a self,
		sql: &'a str,
		args: &'a [SqlArg],
	) -> BoxFuture<'a, sift_storage::Result<Vec<SqlRow>>> {
		Box::pin(async move {
			self.calls.lock().expect("calls lock").push((sql.to_string(), args.to_vec()));

			match self.responses.lock().expect("responses lock").pop_front() {
				Some(Ok(rows)) => Ok(rows),
				Some(Err(message)) => Err(sift_storage::Error::InvalidArgument(message)),
				None => Err(sift_storage::Error::InvalidArgument(format!("Unexpected query: {sql}"))),
			}
		})
	}
}

pub(crate) struct StaticAuthorisation(pub(crate) AuthorisationInformation);

impl AuthorisationProvider for StaticAuthorisation {
	fn authorisation<'a>(
		&'a self,
		_user_id: i64,
	) -> BoxFuture<'a, crate::Result<AuthorisationInformation>> {
		Box::pin(async move { Ok(self.0.clone()) })
	}
}

pub(crate) struct FailingAuthorisation;

impl AuthorisationProvider for FailingAuthorisation {
	fn authorisation<'a>(
		&'a self,
		_user_id: i64,
	) -> BoxFuture<'a, crate::Result<AuthorisationInformation>> {
		Box::pin(async move {
			Err(crate::Error::Storage { message: "role lookup failed".to_string() })
		})
	}
}
