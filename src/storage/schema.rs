//! Database schema definitions

/// SQL to create the relationships table.
///
/// The `low_*`/`high_*` columns repeat the two endpoints in canonical order
/// (type tag, then id), so the unique constraint rejects a second row for the
/// same two endpoints in either layout.
pub const CREATE_RELATIONSHIPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS object_relationships (
    relationship_id INTEGER PRIMARY KEY AUTOINCREMENT,
    left_object_id INTEGER NOT NULL,
    left_object_type TEXT NOT NULL,
    right_object_type TEXT NOT NULL,
    right_object_id INTEGER NOT NULL,
    low_object_type TEXT NOT NULL,
    low_object_id INTEGER NOT NULL,
    high_object_type TEXT NOT NULL,
    high_object_id INTEGER NOT NULL,
    UNIQUE(low_object_type, low_object_id, high_object_type, high_object_id)
)
"#;

/// SQL to create the relationship metadata table
pub const CREATE_META_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS relationship_meta (
    meta_id INTEGER PRIMARY KEY AUTOINCREMENT,
    relationship_id INTEGER NOT NULL,
    meta_key TEXT NOT NULL,
    meta_value TEXT NOT NULL
)
"#;

/// SQL to create relationship indexes
pub const CREATE_RELATIONSHIP_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_relationships_left ON object_relationships(left_object_id, left_object_type, right_object_type)",
    "CREATE INDEX IF NOT EXISTS idx_relationships_right ON object_relationships(right_object_id, right_object_type, left_object_type)",
];

/// SQL to create metadata indexes
pub const CREATE_META_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_meta_owner_key ON relationship_meta(relationship_id, meta_key)",
];

/// Schema statements for the relationship store
pub fn relationship_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_RELATIONSHIPS_TABLE];
    stmts.extend(CREATE_RELATIONSHIP_INDEXES.iter().copied());
    stmts
}

/// Schema statements for the metadata store
pub fn meta_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_META_TABLE];
    stmts.extend(CREATE_META_INDEXES.iter().copied());
    stmts
}
