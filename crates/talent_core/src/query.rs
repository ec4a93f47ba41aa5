//! Declarative SQL statement builder.
//!
//! # Responsibility
//! - Describe select/insert/update/delete operations as plain values.
//! - Render one description into placeholder SQL plus ordered bind arguments.
//!
//! # Invariants
//! - Caller-supplied values never appear in statement text; they are bound.
//! - `args[i]` always corresponds to the `i`-th `?` placeholder in `sql`.
//! - Identifiers are validated because they cannot be bound.
//! - Rendering is a pure function of the description.

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Structural problem that prevents a statement from being rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    EmptyTable,
    InvalidIdentifier(String),
    /// Select or insert without any column.
    NoColumns,
    ColumnValueMismatch {
        columns: usize,
        values: usize,
    },
    /// Update without any `SET` assignment.
    NoAssignments,
    /// Insert statements cannot carry a `WHERE` clause.
    PredicateOnInsert,
    /// A builder step that does not belong to this kind of statement,
    /// e.g. `set` on a select.
    KindMismatch {
        op: &'static str,
        kind: &'static str,
    },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTable => write!(f, "malformed query: table name is empty"),
            Self::InvalidIdentifier(name) => {
                write!(f, "malformed query: invalid identifier `{name}`")
            }
            Self::NoColumns => write!(f, "malformed query: no columns given"),
            Self::ColumnValueMismatch { columns, values } => write!(
                f,
                "malformed query: {columns} columns but {values} values"
            ),
            Self::NoAssignments => write!(f, "malformed query: update has no assignments"),
            Self::PredicateOnInsert => write!(f, "malformed query: insert cannot have predicates"),
            Self::KindMismatch { op, kind } => {
                write!(f, "malformed query: `{op}` is not valid on {kind}")
            }
        }
    }
}

impl Error for QueryError {}

/// Equality condition `column = value`.
///
/// A `Value::Null` operand renders as `column IS NULL` without a bind argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub value: Value,
}

/// Operation-specific part of a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryKind {
    Select { columns: Vec<String> },
    Insert { columns: Vec<String>, values: Vec<Value> },
    Update { assignments: Vec<(String, Value)> },
    Delete,
}

impl QueryKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Delete => "delete",
        }
    }
}

/// Description of one SQL operation against a single table.
///
/// Builder steps that do not fit `kind` are remembered and reported by
/// [`Query::build`]; they are never dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub kind: QueryKind,
    pub table: String,
    pub predicates: Vec<Predicate>,
    misuse: Option<QueryError>,
}

/// Rendered statement ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Query {
    /// `SELECT columns FROM table`.
    pub fn select<I, S>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            QueryKind::Select {
                columns: columns.into_iter().map(Into::into).collect(),
            },
            table,
        )
    }

    /// `INSERT INTO table`; add columns with [`Query::value`] or
    /// [`Query::columns`] plus [`Query::values`].
    pub fn insert(table: impl Into<String>) -> Self {
        Self::with_kind(
            QueryKind::Insert {
                columns: Vec::new(),
                values: Vec::new(),
            },
            table,
        )
    }

    /// `UPDATE table`; add assignments with [`Query::set`].
    pub fn update(table: impl Into<String>) -> Self {
        Self::with_kind(
            QueryKind::Update {
                assignments: Vec::new(),
            },
            table,
        )
    }

    /// `DELETE FROM table`.
    pub fn delete(table: impl Into<String>) -> Self {
        Self::with_kind(QueryKind::Delete, table)
    }

    fn with_kind(kind: QueryKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            predicates: Vec::new(),
            misuse: None,
        }
    }

    fn reject(&mut self, op: &'static str) {
        if self.misuse.is_none() {
            self.misuse = Some(QueryError::KindMismatch {
                op,
                kind: self.kind.name(),
            });
        }
    }

    /// Appends insert columns. Values are matched up positionally at build time.
    pub fn columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match &mut self.kind {
            QueryKind::Insert { columns, .. } => {
                columns.extend(names.into_iter().map(Into::into));
            }
            _ => self.reject("columns"),
        }
        self
    }

    /// Appends insert values.
    pub fn values<I>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        match &mut self.kind {
            QueryKind::Insert { values, .. } => values.extend(items),
            _ => self.reject("values"),
        }
        self
    }

    /// Appends one insert column together with its value.
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        match &mut self.kind {
            QueryKind::Insert { columns, values } => {
                columns.push(column.into());
                values.push(value.into());
            }
            _ => self.reject("value"),
        }
        self
    }

    /// Appends one update assignment.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        match &mut self.kind {
            QueryKind::Update { assignments } => assignments.push((column.into(), value.into())),
            _ => self.reject("set"),
        }
        self
    }

    /// Appends an equality predicate, joined to earlier ones with `AND`.
    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Renders this description.
    ///
    /// # Errors
    /// Returns a [`QueryError`] when the description is structurally invalid.
    pub fn build(&self) -> Result<BuiltQuery, QueryError> {
        build(self)
    }
}

/// Renders `query` into placeholder SQL and ordered bind arguments.
///
/// # Errors
/// Returns a [`QueryError`] when a builder step did not fit the statement
/// kind, when the table or a column is not a plain identifier, when a select/insert has no columns, when insert columns and
/// values differ in count, when an update has no assignments, or when an
/// insert carries predicates.
pub fn build(query: &Query) -> Result<BuiltQuery, QueryError> {
    if let Some(misuse) = &query.misuse {
        return Err(misuse.clone());
    }
    if query.table.is_empty() {
        return Err(QueryError::EmptyTable);
    }
    check_identifier(&query.table)?;

    let mut args = Vec::new();
    let mut sql = match &query.kind {
        QueryKind::Select { columns } => {
            if columns.is_empty() {
                return Err(QueryError::NoColumns);
            }
            for column in columns {
                check_identifier(column)?;
            }
            format!("SELECT {} FROM {}", columns.join(", "), query.table)
        }
        QueryKind::Insert { columns, values } => {
            if !query.predicates.is_empty() {
                return Err(QueryError::PredicateOnInsert);
            }
            if columns.is_empty() {
                return Err(QueryError::NoColumns);
            }
            if columns.len() != values.len() {
                return Err(QueryError::ColumnValueMismatch {
                    columns: columns.len(),
                    values: values.len(),
                });
            }
            for column in columns {
                check_identifier(column)?;
            }
            args.extend(values.iter().cloned());
            let placeholders = vec!["?"; columns.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                query.table,
                columns.join(", "),
                placeholders
            )
        }
        QueryKind::Update { assignments } => {
            if assignments.is_empty() {
                return Err(QueryError::NoAssignments);
            }
            let mut sets = Vec::with_capacity(assignments.len());
            for (column, value) in assignments {
                check_identifier(column)?;
                sets.push(format!("{column} = ?"));
                args.push(value.clone());
            }
            format!("UPDATE {} SET {}", query.table, sets.join(", "))
        }
        QueryKind::Delete => format!("DELETE FROM {}", query.table),
    };

    if !query.predicates.is_empty() {
        let mut conditions = Vec::with_capacity(query.predicates.len());
        for predicate in &query.predicates {
            check_identifier(&predicate.column)?;
            if predicate.value == Value::Null {
                conditions.push(format!("{} IS NULL", predicate.column));
            } else {
                conditions.push(format!("{} = ?", predicate.column));
                args.push(predicate.value.clone());
            }
        }
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    Ok(BuiltQuery { sql, args })
}

fn check_identifier(name: &str) -> Result<(), QueryError> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier(name.to_string()))
    }
}
