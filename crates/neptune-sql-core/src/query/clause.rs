//! Structured clause storage for one query.

use std::fmt;

/// The verb of a query. Fixed when the query is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// `SELECT`
    Select,
    /// `INSERT`
    Insert,
    /// `UPDATE`
    Update,
    /// `DELETE`
    Delete,
}

const SELECT_CLAUSES: &[Clause] = &[
    Clause::Distinct,
    Clause::Fields,
    Clause::From,
    Clause::Join,
    Clause::Where,
    Clause::OrderBy,
    Clause::Limit,
    Clause::Offset,
];
const INSERT_CLAUSES: &[Clause] = &[Clause::Into, Clause::Fields];
const UPDATE_CLAUSES: &[Clause] = &[Clause::Tables, Clause::Fields, Clause::Where];
const DELETE_CLAUSES: &[Clause] = &[Clause::From, Clause::Where];

impl QueryKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// Clauses a formatter renders for this kind, in emission order.
    ///
    /// Anything else set on the query is kept but never formatted.
    #[must_use]
    pub const fn allowed_clauses(self) -> &'static [Clause] {
        match self {
            Self::Select => SELECT_CLAUSES,
            Self::Insert => INSERT_CLAUSES,
            Self::Update => UPDATE_CLAUSES,
            Self::Delete => DELETE_CLAUSES,
        }
    }

    /// Returns whether `clause` is rendered for this kind.
    #[must_use]
    pub fn allows(self, clause: Clause) -> bool {
        self.allowed_clauses().contains(&clause)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the clauses a query can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    /// `DISTINCT` flag.
    Distinct,
    /// Column list.
    Fields,
    /// Source tables of SELECT and DELETE.
    From,
    /// Single joined table.
    Join,
    /// Filter conditions.
    Where,
    /// Sort expressions.
    OrderBy,
    /// Row limit.
    Limit,
    /// Row offset.
    Offset,
    /// Target table of INSERT.
    Into,
    /// Target tables of UPDATE.
    Tables,
}

impl Clause {
    /// Returns the clause name as written in SQL.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distinct => "DISTINCT",
            Self::Fields => "FIELDS",
            Self::From => "FROM",
            Self::Join => "JOIN",
            Self::Where => "WHERE",
            Self::OrderBy => "ORDER BY",
            Self::Limit => "LIMIT",
            Self::Offset => "OFFSET",
            Self::Into => "INTO",
            Self::Tables => "TABLES",
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical operator joining a condition to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl Logic {
    /// Maps a stored operator onto AND/OR. Anything but `OR` is `AND`.
    #[must_use]
    pub fn coerce(logic: &str) -> Self {
        if logic.trim().eq_ignore_ascii_case("OR") {
            Self::Or
        } else {
            Self::And
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// One WHERE condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereEntry {
    /// Condition text, e.g. `age >` or `id IN (1,2)`.
    pub expression: String,
    /// Already quoted value, the `?` placeholder, or `None`.
    pub value: Option<String>,
    /// Uppercased operator joining this condition to the previous one.
    /// Ignored for the first condition.
    pub logic: String,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

impl OrderDirection {
    /// Parses a direction case-insensitively; anything but `DESC` is `ASC`.
    #[must_use]
    pub fn normalize(sort: &str) -> Self {
        if sort.trim().eq_ignore_ascii_case("DESC") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One ORDER BY expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    /// Expression to sort by.
    pub expression: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

/// The joined table of a SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEntry {
    /// Table, optionally followed by its `ON` condition.
    pub table: String,
    /// Join type such as `LEFT` or `INNER`; plain `JOIN` when absent.
    pub kind: Option<String>,
}

/// Every clause of a query. `None` means the clause was never set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clauses {
    /// `DISTINCT` flag.
    pub distinct: bool,
    /// Column list.
    pub fields: Option<Vec<String>>,
    /// Source tables.
    pub from: Option<Vec<String>>,
    /// Joined table.
    pub join: Option<JoinEntry>,
    /// Conditions, in emission order.
    pub conditions: Option<Vec<WhereEntry>>,
    /// Sort expressions, in emission order.
    pub order_by: Option<Vec<OrderEntry>>,
    /// Row limit.
    pub limit: Option<u64>,
    /// Row offset.
    pub offset: Option<u64>,
    /// INSERT target.
    pub into: Option<String>,
    /// UPDATE targets.
    pub tables: Option<Vec<String>>,
}

impl Clauses {
    /// Returns whether `clause` has been set.
    #[must_use]
    pub const fn is_set(&self, clause: Clause) -> bool {
        match clause {
            Clause::Distinct => self.distinct,
            Clause::Fields => self.fields.is_some(),
            Clause::From => self.from.is_some(),
            Clause::Join => self.join.is_some(),
            Clause::Where => self.conditions.is_some(),
            Clause::OrderBy => self.order_by.is_some(),
            Clause::Limit => self.limit.is_some(),
            Clause::Offset => self.offset.is_some(),
            Clause::Into => self.into.is_some(),
            Clause::Tables => self.tables.is_some(),
        }
    }

    /// Returns a copy keeping only the clauses `kind` renders.
    #[must_use]
    pub fn restricted_to(&self, kind: QueryKind) -> Self {
        let keep = |clause| kind.allows(clause);
        Self {
            distinct: keep(Clause::Distinct) && self.distinct,
            fields: self.fields.clone().filter(|_| keep(Clause::Fields)),
            from: self.from.clone().filter(|_| keep(Clause::From)),
            join: self.join.clone().filter(|_| keep(Clause::Join)),
            conditions: self.conditions.clone().filter(|_| keep(Clause::Where)),
            order_by: self.order_by.clone().filter(|_| keep(Clause::OrderBy)),
            limit: self.limit.filter(|_| keep(Clause::Limit)),
            offset: self.offset.filter(|_| keep(Clause::Offset)),
            into: self.into.clone().filter(|_| keep(Clause::Into)),
            tables: self.tables.clone().filter(|_| keep(Clause::Tables)),
        }
    }
}
