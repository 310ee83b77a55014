//! The SQL boundary used by the search engine.
//!
//! Search code never builds a driver query itself. It hands parameterized SQL plus bound
//! arguments to a [`SqlExecutor`] and reads back loosely typed rows.

use std::{future::Future, pin::Pin};

use sqlx::{
	Column, PgPool, Row, TypeInfo, ValueRef,
	postgres::{PgArguments, PgRow},
	query::Query,
};
use time::{Date, OffsetDateTime};

use crate::{Error, Result};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type SqlRow = Vec<SqlValue>;

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
	Text(String),
	TextArray(Vec<String>),
	BigInt(i64),
	BigIntArray(Vec<i64>),
	Double(f64),
	DoubleArray(Vec<f64>),
	Bool(bool),
	Date(Date),
	Timestamp(OffsetDateTime),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
	Null,
	Int(i64),
	Double(f64),
	Text(String),
	Bool(bool),
	Date(Date),
	Timestamp(OffsetDateTime),
}
impl SqlValue {
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Int(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Text(value) => Some(value.as_str()),
			_ => None,
		}
	}
}

pub trait SqlExecutor
where
	Self: Send + Sync,
{
	fn execute<'a>(
		&'a self,
		sql: &'a str,
		args: &'a [SqlArg],
	) -> BoxFuture<'a, Result<Vec<SqlRow>>>;
}

/// Runs a query whose first column is a bigint id and collects that column.
pub async fn fetch_ids(
	executor: &dyn SqlExecutor,
	sql: &str,
	args: &[SqlArg],
) -> Result<Vec<i64>> {
	let rows = executor.execute(sql, args).await?;

	rows.into_iter()
		.map(|row| {
			row.first().and_then(SqlValue::as_i64).ok_or_else(|| {
				Error::InvalidArgument("Expected a bigint id in the first column.".to_string())
			})
		})
		.collect()
}

#[derive(Clone)]
pub struct PgExecutor {
	pool: PgPool,
}
impl PgExecutor {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	async fn run(&self, sql: &str, args: &[SqlArg]) -> Result<Vec<SqlRow>> {
		let mut query = sqlx::query(sql);

		for arg in args {
			query = bind(query, arg);
		}

		let rows = query.fetch_all(&self.pool).await?;

		rows.iter().map(decode_row).collect()
	}
}

impl SqlExecutor for PgExecutor {
	fn execute<'a>(
		&'a self,
		sql: &'a str,
		args: &'a [SqlArg],
	) -> BoxFuture<'a, Result<Vec<SqlRow>>> {
		Box::pin(self.run(sql, args))
	}
}

fn bind<'q>(
	query: Query<'q, sqlx::Postgres, PgArguments>,
	arg: &SqlArg,
) -> Query<'q, sqlx::Postgres, PgArguments> {
	match arg {
		SqlArg::Text(value) => query.bind(value.clone()),
		SqlArg::TextArray(values) => query.bind(values.clone()),
		SqlArg::BigInt(value) => query.bind(*value),
		SqlArg::BigIntArray(values) => query.bind(values.clone()),
		SqlArg::Double(value) => query.bind(*value),
		SqlArg::DoubleArray(values) => query.bind(values.clone()),
		SqlArg::Bool(value) => query.bind(*value),
		SqlArg::Date(value) => query.bind(*value),
		SqlArg::Timestamp(value) => query.bind(*value),
	}
}

fn decode_row(row: &PgRow) -> Result<SqlRow> {
	let mut values = Vec::with_capacity(row.columns().len());

	for (index, column) in row.columns().iter().enumerate() {
		if row.try_get_raw(index)?.is_null() {
			values.push(SqlValue::Null);

			continue;
		}

		let value = match column.type_info().name() {
			"INT8" => SqlValue::Int(row.try_get::<i64, _>(index)?),
			"INT4" => SqlValue::Int(i64::from(row.try_get::<i32, _>(index)?)),
			"INT2" => SqlValue::Int(i64::from(row.try_get::<i16, _>(index)?)),
			"FLOAT8" => SqlValue::Double(row.try_get::<f64, _>(index)?),
			"FLOAT4" => SqlValue::Double(f64::from(row.try_get::<f32, _>(index)?)),
			"TEXT" | "VARCHAR" | "BPCHAR" | "NAME" =>
				SqlValue::Text(row.try_get::<String, _>(index)?),
			"BOOL" => SqlValue::Bool(row.try_get::<bool, _>(index)?),
			"DATE" => SqlValue::Date(row.try_get::<Date, _>(index)?),
			"TIMESTAMPTZ" => SqlValue::Timestamp(row.try_get::<OffsetDateTime, _>(index)?),
			other => {
				return Err(Error::InvalidArgument(format!(
					"Unsupported column type {other} for column {}.",
					column.name()
				)));
			},
		};

		values.push(value);
	}

	Ok(values)
}
