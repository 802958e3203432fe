//! Statement classification and placeholder scanning.
//!
//! This is not a SQL parser. It looks at the first keyword to classify the
//! statement and walks the text once to list bind placeholders, skipping
//! string literals, quoted identifiers and comments.

/// Statement type determined from the leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementType {
    /// Unrecognised leading keyword.
    #[default]
    Unknown,
    /// SELECT or WITH query.
    Query,
    /// INSERT, UPDATE, DELETE, MERGE.
    Dml,
    /// CREATE, ALTER, DROP and friends.
    Ddl,
    /// Anonymous PL/SQL block or CALL.
    PlSql,
}

impl StatementType {
    /// Classify statement text by its first keyword.
    pub fn from_sql(sql: &str) -> Self {
        let first = sql
            .trim_start()
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match first.as_str() {
            "SELECT" | "WITH" => StatementType::Query,
            "INSERT" | "UPDATE" | "DELETE" | "MERGE" => StatementType::Dml,
            "CREATE" | "ALTER" | "DROP" | "GRANT" | "REVOKE" | "ANALYZE" | "AUDIT"
            | "COMMENT" | "TRUNCATE" | "RENAME" => StatementType::Ddl,
            "DECLARE" | "BEGIN" | "CALL" => StatementType::PlSql,
            _ => StatementType::Unknown,
        }
    }

    pub fn is_query(self) -> bool {
        self == StatementType::Query
    }
}

/// A bind placeholder found in statement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Label without the colon. Unquoted labels are upper-cased.
    pub name: String,
    /// Whether the label was written as `:"Name"`.
    pub quoted: bool,
}

impl Placeholder {
    /// Whether a caller-supplied bind name refers to this placeholder.
    ///
    /// A leading colon is ignored. Quoted labels compare exactly, all others
    /// ignore ASCII case.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.strip_prefix(':').unwrap_or(name);
        if self.quoted {
            let name = name
                .strip_prefix('"')
                .and_then(|n| n.strip_suffix('"'))
                .unwrap_or(name);
            self.name == name
        } else {
            self.name.eq_ignore_ascii_case(name)
        }
    }

    /// Whether the label is a positional number such as `1`.
    pub fn is_numeric(&self) -> bool {
        !self.quoted && self.name.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Scanned statement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    statement_type: StatementType,
    placeholders: Vec<Placeholder>,
}

impl Statement {
    /// Scan statement text.
    pub fn new(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let statement_type = StatementType::from_sql(&sql);
        let placeholders = match statement_type {
            StatementType::Ddl => Vec::new(),
            StatementType::PlSql => scan_placeholders(&sql, true),
            _ => scan_placeholders(&sql, false),
        };
        Self {
            sql,
            statement_type,
            placeholders,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn statement_type(&self) -> StatementType {
        self.statement_type
    }

    pub fn is_query(&self) -> bool {
        self.statement_type.is_query()
    }

    /// Placeholders in bind position order.
    ///
    /// A PL/SQL block binds a repeated label once, at its first appearance.
    /// Any other statement binds every occurrence at its own position, so
    /// `SELECT :a, :a FROM dual` has two placeholders named `A`.
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    /// Position of the first placeholder a bind name refers to.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.placeholders.iter().position(|p| p.matches(name))
    }

    /// Every position a bind name refers to.
    pub fn positions_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.placeholders
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.matches(name))
            .map(|(pos, _)| pos)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '#'
}

fn scan_placeholders(sql: &str, merge_repeated: bool) -> Vec<Placeholder> {
    let chars: Vec<char> = sql.chars().collect();
    let len = chars.len();
    let mut found: Vec<Placeholder> = Vec::new();
    let mut i = 0;

    while i < len {
        match chars[i] {
            '\'' | '"' => {
                let quote = chars[i];
                i += 1;
                while i < len && chars[i] != quote {
                    i += 1;
                }
                i += 1;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < len && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < len && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            ':' => {
                i += 1;
                let placeholder = match chars.get(i) {
                    Some('"') => {
                        let start = i + 1;
                        let mut end = start;
                        while end < len && chars[end] != '"' {
                            end += 1;
                        }
                        i = end + 1;
                        (end > start).then(|| Placeholder {
                            name: chars[start..end].iter().collect(),
                            quoted: true,
                        })
                    }
                    Some(c) if c.is_ascii_digit() => {
                        let start = i;
                        while i < len && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                        Some(Placeholder {
                            name: chars[start..i].iter().collect(),
                            quoted: false,
                        })
                    }
                    Some(c) if c.is_alphabetic() => {
                        let start = i;
                        while i < len && is_ident_char(chars[i]) {
                            i += 1;
                        }
                        Some(Placeholder {
                            name: chars[start..i].iter().collect::<String>().to_uppercase(),
                            quoted: false,
                        })
                    }
                    _ => None,
                };
                if let Some(p) = placeholder {
                    if !merge_repeated || !found.contains(&p) {
                        found.push(p);
                    }
                }
            }
            _ => i += 1,
        }
    }
    found
}
