//! Statement plans
//!
//! A plan is an ordered list of statements, each with optional fallbacks that
//! are tried in order when the primary fails (e.g. `ALTER TABLE .. ADD COLUMN`
//! falling back to a no-op when the column already exists).

/// What to do when a statement and all of its fallbacks fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log the failure and move on to the next statement
    #[default]
    ContinueOnError,
    /// Skip every remaining statement
    StopOnError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStatement {
    pub label: String,
    pub sql: String,
    pub fallbacks: Vec<String>,
}

impl PlannedStatement {
    pub fn new(label: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sql: sql.into(),
            fallbacks: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, sql: impl Into<String>) -> Self {
        self.fallbacks.push(sql.into());
        self
    }

    /// Primary first, then fallbacks
    pub fn attempts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.sql.as_str()).chain(self.fallbacks.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementPlan {
    pub statements: Vec<PlannedStatement>,
}

impl StatementPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// One statement per `;`-terminated chunk of a script, labelled by position
    pub fn from_sql(script: &str) -> Self {
        Self {
            statements: split_statements(script)
                .into_iter()
                .enumerate()
                .map(|(i, sql)| PlannedStatement::new(format!("statement {}", i + 1), sql))
                .collect(),
        }
    }

    pub fn push(mut self, statement: PlannedStatement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Quoted,
    DollarQuoted,
    Comment,
}

/// Split a SQL script into statements
///
/// `--` comments are dropped and the script is cut at each `;`. Semicolons
/// inside single-quoted strings and `$$` bodies do not split. Empty statements
/// are skipped; the trailing `;` is not kept.
///
/// # Examples
/// ```
/// use scout_analytics::migrate::split_statements;
///
/// let statements = split_statements("-- setup\nCREATE TABLE a (x INT);\n\nSELECT ';';");
/// assert_eq!(statements, vec!["CREATE TABLE a (x INT)", "SELECT ';'"]);
/// ```
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = ScanState::Code;
    let mut chars = script.chars().peekable();

    let mut finish = |current: &mut String| {
        let statement = current.trim();
        if !statement.is_empty() {
            statements.push(statement.to_string());
        }
        current.clear();
    };

    while let Some(c) = chars.next() {
        match state {
            ScanState::Comment => {
                if c == '\n' {
                    current.push('\n');
                    state = ScanState::Code;
                }
            }
            ScanState::Quoted => {
                current.push(c);
                if c == '\'' {
                    state = ScanState::Code;
                }
            }
            ScanState::DollarQuoted => {
                current.push(c);
                if c == '$' && chars.peek() == Some(&'$') {
                    chars.next();
                    current.push('$');
                    state = ScanState::Code;
                }
            }
            ScanState::Code => match c {
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = ScanState::Comment;
                }
                '\'' => {
                    current.push(c);
                    state = ScanState::Quoted;
                }
                '$' if chars.peek() == Some(&'$') => {
                    chars.next();
                    current.push_str("$$");
                    state = ScanState::DollarQuoted;
                }
                ';' => finish(&mut current),
                _ => current.push(c),
            },
        }
    }
    finish(&mut current);
    statements
}
