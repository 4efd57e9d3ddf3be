//! Partial-update statement builder
//!
//! Edit endpoints touch only the fields the caller supplied. Instead of
//! concatenating SQL per field, the models collect an ordered list of
//! `(column, value)` assignments in an [`UpdateSet`] and render it once into a
//! single parameterized statement:
//!
//! ```text
//! UPDATE users SET age = $1, gender = $2 WHERE id = $3 RETURNING <columns>
//! ```
//!
//! Column names come from a fixed set of `&'static str` owned by the models;
//! every caller-provided value is bound, never spliced into the SQL text.
//! The whole update is one statement and therefore all-or-nothing.

use crate::error::{StoreError, StoreResult};
use crate::patch::FieldPatch;
use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};

/// A value bound to one `SET` assignment
///
/// `None` binds a typed SQL `NULL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i32>),
    Date(Option<NaiveDate>),
}

/// Conversion of a field value into a bindable [`SqlValue`]
pub trait BindValue {
    fn into_sql(value: Option<Self>) -> SqlValue
    where
        Self: Sized;
}

impl BindValue for String {
    fn into_sql(value: Option<Self>) -> SqlValue {
        SqlValue::Text(value)
    }
}

impl BindValue for i32 {
    fn into_sql(value: Option<Self>) -> SqlValue {
        SqlValue::Int(value)
    }
}

impl BindValue for NaiveDate {
    fn into_sql(value: Option<Self>) -> SqlValue {
        SqlValue::Date(value)
    }
}

/// Ordered set of column assignments for one `UPDATE` statement
#[derive(Debug, Clone)]
pub struct UpdateSet {
    table: &'static str,
    assignments: Vec<(&'static str, SqlValue)>,
    touch: Option<&'static str>,
}

impl UpdateSet {
    /// Starts an empty update against `table`
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            touch: None,
        }
    }

    /// Sets `column = NOW()` whenever the statement is issued
    ///
    /// The timestamp does not count as a caller-supplied field, so an update
    /// with nothing else in it is still rejected as empty.
    pub fn touch(mut self, column: &'static str) -> Self {
        self.touch = Some(column);
        self
    }

    /// Records the assignment for one field patch
    ///
    /// `Unchanged` adds nothing, `Clear` binds NULL and `Set` binds the value.
    pub fn push<T: BindValue>(&mut self, column: &'static str, patch: FieldPatch<T>) {
        match patch {
            FieldPatch::Unchanged => {}
            FieldPatch::Clear => self.assignments.push((column, T::into_sql(None))),
            FieldPatch::Set(value) => self.assignments.push((column, T::into_sql(Some(value)))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Columns that will be assigned, in statement order
    pub fn columns(&self) -> Vec<&'static str> {
        self.assignments.iter().map(|(column, _)| *column).collect()
    }

    /// Renders `UPDATE <table> SET ... WHERE id = $n RETURNING <returning>`
    ///
    /// # Errors
    ///
    /// Returns a validation error when no field was supplied; no statement is
    /// produced in that case.
    pub fn into_query(
        self,
        id: i32,
        returning: &'static str,
    ) -> StoreResult<QueryBuilder<'static, Postgres>> {
        if self.assignments.is_empty() {
            return Err(StoreError::validation("body", "No fields to update"));
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE ");
        builder.push(self.table).push(" SET ");

        let mut separated = builder.separated(", ");
        for (column, value) in self.assignments {
            separated.push(column);
            separated.push_unseparated(" = ");
            match value {
                SqlValue::Text(v) => separated.push_bind_unseparated(v),
                SqlValue::Int(v) => separated.push_bind_unseparated(v),
                SqlValue::Date(v) => separated.push_bind_unseparated(v),
            };
        }
        if let Some(column) = self.touch {
            separated.push(column);
            separated.push_unseparated(" = NOW()");
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(returning);

        Ok(builder)
    }
}
