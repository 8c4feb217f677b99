//! SQL dialect enum
//!
//! The compiled SQL text is the only wire format relmap produces, so the
//! dialect decides how identifiers are quoted and how placeholders look.

/// SQL dialect for identifier quoting and placeholder rendering
///
/// # Examples
///
/// ```
/// use relmap_types::Dialect;
///
/// let dialect = Dialect::MySQL;
/// assert_eq!(dialect.quote("order"), "`order`");
/// assert_eq!(dialect.placeholder(3), "?");
///
/// let pg = Dialect::PostgreSQL;
/// assert_eq!(pg.quote("order"), "\"order\"");
/// assert_eq!(pg.placeholder(3), "$3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Dialect {
    /// MySQL - back-quoted identifiers, `?` positional placeholders
    #[default]
    MySQL,

    /// SQLite - double-quoted identifiers, `?` positional placeholders
    SQLite,

    /// PostgreSQL - double-quoted identifiers, `$1, $2, ...` placeholders
    PostgreSQL,
}

impl Dialect {
    /// Returns `true` if this dialect uses numbered placeholders (`$1, $2, ...`)
    #[inline]
    #[must_use]
    pub const fn uses_numbered_placeholders(&self) -> bool {
        matches!(self, Dialect::PostgreSQL)
    }

    /// The character used to delimit identifiers
    #[inline]
    #[must_use]
    pub const fn quote_char(&self) -> char {
        match self {
            Dialect::MySQL => '`',
            Dialect::SQLite | Dialect::PostgreSQL => '"',
        }
    }

    /// Quotes a single identifier, doubling any embedded quote character.
    #[must_use]
    pub fn quote(&self, ident: &str) -> String {
        let q = self.quote_char();
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(q);
        for c in ident.chars() {
            if c == q {
                out.push(q);
            }
            out.push(c);
        }
        out.push(q);
        out
    }

    /// Renders `qualifier.column` with both parts quoted.
    #[must_use]
    pub fn qualified(&self, qualifier: &str, column: &str) -> String {
        let mut out = self.quote(qualifier);
        out.push('.');
        out.push_str(&self.quote(column));
        out
    }

    /// Renders the placeholder for the 1-based bind position `n`.
    #[must_use]
    pub fn placeholder(&self, n: usize) -> String {
        if self.uses_numbered_placeholders() {
            format!("${n}")
        } else {
            "?".to_string()
        }
    }

    /// Parse a dialect from a string (case-insensitive)
    ///
    /// Supports common aliases:
    /// - MySQL: `"mysql"`, `"mariadb"`
    /// - SQLite: `"sqlite"`
    /// - PostgreSQL: `"postgresql"`, `"postgres"`, `"pg"`
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("mysql") || s.eq_ignore_ascii_case("mariadb") {
            Some(Dialect::MySQL)
        } else if s.eq_ignore_ascii_case("sqlite") {
            Some(Dialect::SQLite)
        } else if s.eq_ignore_ascii_case("postgresql")
            || s.eq_ignore_ascii_case("postgres")
            || s.eq_ignore_ascii_case("pg")
        {
            Some(Dialect::PostgreSQL)
        } else {
            None
        }
    }

    /// Get the dialect name as a lowercase string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySQL => "mysql",
            Dialect::SQLite => "sqlite",
            Dialect::PostgreSQL => "postgresql",
        }
    }
}

impl core::fmt::Display for Dialect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Dialect {
    type Err = DialectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::parse(s).ok_or(DialectParseError)
    }
}

/// Error returned when parsing an unknown dialect string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectParseError;

impl core::fmt::Display for DialectParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("unknown dialect")
    }
}

impl std::error::Error for DialectParseError {}
