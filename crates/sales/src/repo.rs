//! Queries and administrative writes around statuses and decision makers.

use async_trait::async_trait;
use chrono::Utc;
use entity::{customer, customer_status, decision_maker};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::error::{FieldErrors, SalesError, SalesResult};
use crate::validators::{not_blank, validate_progress};

/// Pipeline stages seeded into an empty database.
pub const DEFAULT_STATUSES: &[(&str, i32)] = &[
    ("Новый лид", 0),
    ("Первичный контакт", 10),
    ("Выявление потребности", 25),
    ("Коммерческое предложение", 50),
    ("Переговоры", 75),
    ("Первая отгрузка", 100),
];

/// Read access to the pipeline statuses.
///
/// The form loader takes this instead of querying statuses itself, so the
/// default-status rule can be exercised without a database.
#[async_trait]
pub trait StatusQuery: Send + Sync {
    /// All statuses, lowest progress first.
    async fn ordered(&self) -> Result<Vec<customer_status::Model>, DbErr>;

    async fn first_by_progress(&self) -> Result<Option<customer_status::Model>, DbErr> {
        Ok(self.ordered().await?.into_iter().next())
    }

    async fn exists(&self, id: i64) -> Result<bool, DbErr> {
        Ok(self.ordered().await?.iter().any(|status| status.id == id))
    }
}

pub struct DbStatusQuery<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> DbStatusQuery<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C: ConnectionTrait> StatusQuery for DbStatusQuery<'_, C> {
    async fn ordered(&self) -> Result<Vec<customer_status::Model>, DbErr> {
        customer_status::Entity::find()
            .order_by_asc(customer_status::Column::Progress)
            .order_by_asc(customer_status::Column::Id)
            .all(self.conn)
            .await
    }

    async fn first_by_progress(&self) -> Result<Option<customer_status::Model>, DbErr> {
        customer_status::Entity::find()
            .order_by_asc(customer_status::Column::Progress)
            .order_by_asc(customer_status::Column::Id)
            .one(self.conn)
            .await
    }

    async fn exists(&self, id: i64) -> Result<bool, DbErr> {
        let found = customer_status::Entity::find_by_id(id)
            .count(self.conn)
            .await?;
        Ok(found > 0)
    }
}

#[derive(Clone, Debug, Validate)]
pub struct StatusInput {
    #[validate(
        custom(function = "not_blank"),
        length(max = 50, message = "Title must be at most 50 characters.")
    )]
    pub title: String,
    #[validate(custom(function = "validate_progress"))]
    pub progress: i32,
}

impl StatusInput {
    pub fn new(title: impl Into<String>, progress: i32) -> Self {
        Self {
            title: title.into(),
            progress,
        }
    }

    fn checked(mut self) -> SalesResult<Self> {
        self.title = self.title.trim().to_string();
        if let Err(raw) = self.validate() {
            let mut errors = FieldErrors::new();
            errors.extend_validation(&raw);
            return Err(SalesError::Validation(errors));
        }
        Ok(self)
    }
}

pub async fn list_statuses(db: &DatabaseConnection) -> SalesResult<Vec<customer_status::Model>> {
    Ok(DbStatusQuery::new(db).ordered().await?)
}

pub async fn create_status(
    db: &DatabaseConnection,
    input: StatusInput,
) -> SalesResult<customer_status::Model> {
    let input = input.checked()?;
    let model = customer_status::ActiveModel {
        title: Set(input.title),
        progress: Set(input.progress),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(status_id = model.id, progress = model.progress, "customer status created");
    Ok(model)
}

/// Administrative edit; allowed even while customers reference the status.
pub async fn update_status(
    db: &DatabaseConnection,
    id: i64,
    input: StatusInput,
) -> SalesResult<customer_status::Model> {
    let input = input.checked()?;
    let existing = customer_status::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(SalesError::NotFound("customer status"))?;
    let mut active: customer_status::ActiveModel = existing.into();
    active.title = Set(input.title);
    active.progress = Set(input.progress);
    let model = active.update(db).await?;
    info!(status_id = model.id, progress = model.progress, "customer status updated");
    Ok(model)
}

/// Deletes a status nobody points at. Referenced statuses are protected.
#[instrument(name = "sales.statuses.delete", skip(db))]
pub async fn delete_status(db: &DatabaseConnection, id: i64) -> SalesResult<()> {
    let txn = db.begin().await?;
    customer_status::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(SalesError::NotFound("customer status"))?;
    let customers = customer::Entity::find()
        .filter(customer::Column::StatusId.eq(id))
        .count(&txn)
        .await?;
    if customers > 0 {
        warn!(customers, "refusing to delete referenced customer status");
        return Err(SalesError::ReferentialIntegrity {
            status_id: id,
            customers,
        });
    }
    customer_status::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    info!("customer status deleted");
    Ok(())
}

/// Deletes a decision maker and clears the reference held by its customer.
///
/// Returns how many customers were unlinked.
#[instrument(name = "sales.decision_makers.delete", skip(db))]
pub async fn delete_decision_maker(db: &DatabaseConnection, id: i64) -> SalesResult<u64> {
    let txn = db.begin().await?;
    decision_maker::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(SalesError::NotFound("decision maker"))?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let unlinked = customer::Entity::update_many()
        .col_expr(customer::Column::DecisionMakerId, Expr::value(None::<i64>))
        .col_expr(customer::Column::UpdatedAt, Expr::value(now))
        .filter(customer::Column::DecisionMakerId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;
    decision_maker::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    info!(unlinked, "decision maker deleted");
    Ok(unlinked)
}

pub async fn find_customer(
    db: &DatabaseConnection,
    id: i32,
) -> SalesResult<(customer::Model, Option<decision_maker::Model>)> {
    customer::Entity::find_by_id(id)
        .find_also_related(decision_maker::Entity)
        .one(db)
        .await?
        .ok_or(SalesError::NotFound("customer"))
}

/// Inserts [`DEFAULT_STATUSES`] when no status exists yet.
///
/// Returns the number of rows inserted.
pub async fn seed_default_statuses(db: &DatabaseConnection) -> SalesResult<usize> {
    let existing = customer_status::Entity::find().count(db).await?;
    if existing > 0 {
        info!(existing, "customer statuses already present; skipping seed");
        return Ok(0);
    }
    let rows: Vec<customer_status::ActiveModel> = DEFAULT_STATUSES
        .iter()
        .map(|(title, progress)| customer_status::ActiveModel {
            title: Set((*title).to_string()),
            progress: Set(*progress),
            ..Default::default()
        })
        .collect();
    customer_status::Entity::insert_many(rows).exec(db).await?;
    info!(inserted = DEFAULT_STATUSES.len(), "default customer statuses seeded");
    Ok(DEFAULT_STATUSES.len())
}
