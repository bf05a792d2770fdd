//! Database module for SQLite persistence using SeaORM

pub mod entities;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::path::Path;

/// Initialize database connection and create tables
pub async fn init_database(db_path: &Path) -> Result<DatabaseConnection, DbErr> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    tracing::info!("Connecting to database: {}", db_url);

    let db = Database::connect(&db_url).await?;

    create_tables(&db).await?;

    Ok(db)
}

/// Current time as unix seconds
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

// Sibling positions (blocks per page, layers per zero-block) are indexed but
// not UNIQUE: gap-closing updates shift many rows in one
// statement and SQLite checks uniqueness row by row. The services enforce
// uniqueness where it is required.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_admin INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS access_tokens (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        token_hash TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL,
        expires_at INTEGER NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS idx_access_tokens_user ON access_tokens(user_id)"#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id)"#,
    r#"
    CREATE TABLE IF NOT EXISTS pages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        slug TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
        UNIQUE(project_id, slug)
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS idx_pages_project ON pages(project_id)"#,
    r#"
    CREATE TABLE IF NOT EXISTS block_templates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        category TEXT,
        default_settings TEXT NOT NULL DEFAULT '{}',
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS zero_base_elements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        type_name TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        icon TEXT NOT NULL,
        schema TEXT NOT NULL DEFAULT '{}',
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS blocks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        page_id INTEGER NOT NULL,
        block_template_id INTEGER,
        type TEXT NOT NULL CHECK (type IN ('template', 'zeroblock')),
        position INTEGER NOT NULL CHECK (position >= 0),
        settings TEXT NOT NULL DEFAULT '{}',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        FOREIGN KEY (page_id) REFERENCES pages(id) ON DELETE CASCADE,
        FOREIGN KEY (block_template_id) REFERENCES block_templates(id)
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS idx_blocks_page_position ON blocks(page_id, position)"#,
    r#"
    CREATE TABLE IF NOT EXISTS zero_blocks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        block_id INTEGER NOT NULL UNIQUE,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        FOREIGN KEY (block_id) REFERENCES blocks(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS zero_layers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        zero_block_id INTEGER NOT NULL,
        zero_base_element_id INTEGER NOT NULL,
        data TEXT NOT NULL DEFAULT '{}',
        position INTEGER NOT NULL CHECK (position >= 0),
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        FOREIGN KEY (zero_block_id) REFERENCES zero_blocks(id) ON DELETE CASCADE,
        FOREIGN KEY (zero_base_element_id) REFERENCES zero_base_elements(id)
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS idx_zero_layers_block_position ON zero_layers(zero_block_id, position)"#,
    r#"
    CREATE TABLE IF NOT EXISTS zero_block_responsive (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        zero_block_id INTEGER NOT NULL,
        width INTEGER NOT NULL CHECK (width > 0),
        height INTEGER,
        props TEXT NOT NULL DEFAULT '{}',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        FOREIGN KEY (zero_block_id) REFERENCES zero_blocks(id) ON DELETE CASCADE,
        UNIQUE(zero_block_id, width)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS zero_layer_responsive (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        zero_layer_id INTEGER NOT NULL,
        zero_block_responsive_id INTEGER NOT NULL,
        x INTEGER,
        y INTEGER,
        width INTEGER,
        height INTEGER,
        direction TEXT NOT NULL DEFAULT 'left' CHECK (direction IN ('left', 'right')),
        data TEXT NOT NULL DEFAULT '{}',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        FOREIGN KEY (zero_layer_id) REFERENCES zero_layers(id) ON DELETE CASCADE,
        FOREIGN KEY (zero_block_responsive_id) REFERENCES zero_block_responsive(id) ON DELETE CASCADE,
        UNIQUE(zero_layer_id, zero_block_responsive_id)
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS idx_zero_layer_responsive_layer ON zero_layer_responsive(zero_layer_id)"#,
];

/// Create all tables if they don't exist
async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    for sql in SCHEMA {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_string(),
        ))
        .await?;
    }

    tracing::info!("Database tables initialized");
    Ok(())
}

#[cfg(test)]
pub mod test_support {
    //! Fixtures shared by the service and handler tests.

    use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
    use tempfile::TempDir;

    use super::entities::{block_template, page, project, user, zero_base_element};
    use super::{init_database, unix_now};

    /// Fresh database in a temporary directory. Keep the `TempDir` alive for
    /// as long as the connection is used.
    pub async fn test_database() -> (TempDir, DatabaseConnection) {
        let temp_dir = TempDir::new().unwrap();
        let db = init_database(&temp_dir.path().join("test.db")).await.unwrap();
        (temp_dir, db)
    }

    pub async fn insert_user(db: &DatabaseConnection, username: &str, is_admin: bool) -> user::Model {
        user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(String::new()),
            is_admin: Set(is_admin),
            created_at: Set(unix_now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    pub async fn insert_project(db: &DatabaseConnection, owner_id: i32) -> project::Model {
        project::ActiveModel {
            owner_id: Set(owner_id),
            name: Set("Landing".to_string()),
            created_at: Set(unix_now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    pub async fn insert_page(db: &DatabaseConnection, project_id: i32, slug: &str) -> page::Model {
        let now = unix_now();
        page::ActiveModel {
            project_id: Set(project_id),
            title: Set(slug.to_string()),
            slug: Set(slug.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    pub async fn insert_template(db: &DatabaseConnection, name: &str) -> block_template::Model {
        block_template::ActiveModel {
            name: Set(name.to_string()),
            category: Set(None),
            default_settings: Set(serde_json::json!({})),
            created_at: Set(unix_now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    pub async fn insert_element(db: &DatabaseConnection, type_name: &str) -> zero_base_element::Model {
        zero_base_element::ActiveModel {
            type_name: Set(type_name.to_string()),
            display_name: Set(type_name.to_string()),
            icon: Set("square".to_string()),
            schema: Set(serde_json::json!({})),
            created_at: Set(unix_now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }
}
