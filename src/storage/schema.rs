//! Database schema definitions for the SQLite document store

/// SQL to create the documents table.
/// `body` holds the document as JSON text; `id` is the store identifier.
pub const CREATE_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    body TEXT NOT NULL CHECK (json_valid(body))
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_DOCUMENTS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
