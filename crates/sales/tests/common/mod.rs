#![allow(dead_code)]

use entity::customer_status;
use migration::{Migrator, MigratorTrait};
use sales::form::FormData;
use sales::repo::{create_status, StatusInput};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "PRAGMA foreign_keys = ON;",
    ))
    .await
    .unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// Three statuses inserted out of progress order.
pub async fn seed_statuses(db: &DatabaseConnection) -> Vec<customer_status::Model> {
    let mut rows = Vec::new();
    for (title, progress) in [("Переговоры", 50), ("Новый", 0), ("Отгрузка", 100)] {
        rows.push(create_status(db, StatusInput::new(title, progress)).await.unwrap());
    }
    rows
}

pub fn form(pairs: &[(&str, &str)]) -> FormData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn lead(inn: &str) -> FormData {
    form(&[
        ("inn", inn),
        ("name", "ООО Ромашка"),
        ("consumed_items", "Профнастил С8"),
        ("problematic", "Дорого"),
        ("note", "Связаться после выставки"),
    ])
}
