//! SQL query constants
//!
//! Contains all SQL used by the Postgres store.

/// Tables created when `DB_INIT_SCHEMA` is enabled
pub const CREATE_TABLES: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT UNIQUE,
        username TEXT UNIQUE,
        name TEXT,
        password TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id TEXT PRIMARY KEY,
        title TEXT,
        description TEXT,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS blogs (
        id TEXT PRIMARY KEY,
        title TEXT,
        description TEXT,
        content TEXT,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

pub const USER_COLUMNS: &str = "id, email, username, name, password, created_at, updated_at";
pub const CATEGORY_COLUMNS: &str = "id, title, description, user_id, created_at, updated_at";
pub const BLOG_COLUMNS: &str =
    "id, title, description, content, user_id, category_id, created_at, updated_at";

pub const LIST_USERS: &str = r#"
    SELECT id, email, username, name, password, created_at, updated_at
    FROM users
    ORDER BY created_at
"#;

pub const INSERT_USER: &str = r#"
    INSERT INTO users (id, email, username, name, password)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, email, username, name, password, created_at, updated_at
"#;

/// Absent fields keep their stored value
pub const UPDATE_USER: &str = r#"
    UPDATE users SET
        email = COALESCE($2, email),
        username = COALESCE($3, username),
        name = COALESCE($4, name),
        password = COALESCE($5, password),
        updated_at = NOW()
    WHERE id = $1
    RETURNING id, email, username, name, password, created_at, updated_at
"#;

pub const DELETE_USER: &str = r#"
    DELETE FROM users WHERE id = $1
    RETURNING id, email, username, name, password, created_at, updated_at
"#;

pub const LIST_CATEGORIES_FOR_USER: &str = r#"
    SELECT id, title, description, user_id, created_at, updated_at
    FROM categories
    WHERE user_id = $1
    ORDER BY created_at
"#;

pub const INSERT_CATEGORY: &str = r#"
    INSERT INTO categories (id, title, description, user_id)
    VALUES ($1, $2, $3, $4)
    RETURNING id, title, description, user_id, created_at, updated_at
"#;

pub const UPDATE_CATEGORY: &str = r#"
    UPDATE categories SET
        title = COALESCE($2, title),
        description = COALESCE($3, description),
        updated_at = NOW()
    WHERE id = $1
    RETURNING id, title, description, user_id, created_at, updated_at
"#;

pub const LIST_BLOGS_IN: &str = r#"
    SELECT id, title, description, content, user_id, category_id, created_at, updated_at
    FROM blogs
    WHERE user_id = $1 AND category_id = $2
    ORDER BY created_at
"#;

pub const INSERT_BLOG: &str = r#"
    INSERT INTO blogs (id, title, description, content, user_id, category_id)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, title, description, content, user_id, category_id, created_at, updated_at
"#;

pub const UPDATE_BLOG: &str = r#"
    UPDATE blogs SET
        title = COALESCE($2, title),
        description = COALESCE($3, description),
        content = COALESCE($4, content),
        updated_at = NOW()
    WHERE id = $1
    RETURNING id, title, description, content, user_id, category_id, created_at, updated_at
"#;

pub const DELETE_BLOG: &str = r#"
    DELETE FROM blogs WHERE id = $1
    RETURNING id, title, description, content, user_id, category_id, created_at, updated_at
"#;

/// Builder for single-row lookups keyed on one or more equality filters
pub struct SqlBuilder;

impl SqlBuilder {
    /// `SELECT <columns> FROM <table> WHERE a = $1 AND b = $2 ... LIMIT 1`
    pub fn select_one(table: &str, columns: &str, filters: &[&str]) -> String {
        let conditions: Vec<String> = filters
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ${}", column, i + 1))
            .collect();
        format!(
            "SELECT {} FROM {} WHERE {} ORDER BY created_at LIMIT 1",
            columns,
            table,
            conditions.join(" AND ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_one_numbers_placeholders() {
        let sql = SqlBuilder::select_one("blogs", "id", &["user_id", "category_id"]);
        assert_eq!(
            sql,
            "SELECT id FROM blogs WHERE user_id = $1 AND category_id = $2 ORDER BY created_at LIMIT 1"
        );
    }
}
