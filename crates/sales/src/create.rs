//! Create flow: render the empty form, accept a submission, persist it.
//!
//! A submission either ends in [`CreateOutcome::Created`] with a redirect
//! target, or in [`CreateOutcome::Invalid`] carrying the same form with the
//! submitted values and per-field errors. Nothing is written in the second
//! case.

use chrono::Utc;
use entity::{customer, decision_maker};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, SqlErr, TransactionTrait,
};
use tracing::{info, instrument};

use crate::error::{FieldError, FieldErrors, SalesError, SalesResult};
use crate::form::{
    assemble_customer_form, bind_submission, load_customer_form, CustomerFormView,
    CustomerSubmission, FormData,
};
use crate::repo::{find_customer, DbStatusQuery, StatusQuery};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedCustomer {
    pub customer: customer::Model,
    pub decision_maker: Option<decision_maker::Model>,
}

#[derive(Clone, Debug)]
pub enum CreateOutcome {
    Created {
        record: CreatedCustomer,
        redirect_to: String,
    },
    Invalid(CustomerFormView),
}

pub fn customer_url(id: i32) -> String {
    format!("/customers/{id}")
}

/// Renders the form, pre-filled when `customer_id` names a stored customer.
pub async fn render_customer_form(
    db: &DatabaseConnection,
    customer_id: Option<i32>,
) -> SalesResult<CustomerFormView> {
    let existing = match customer_id {
        Some(id) => Some(find_customer(db, id).await?),
        None => None,
    };
    let view = load_customer_form(
        &DbStatusQuery::new(db),
        existing
            .as_ref()
            .map(|(customer, maker)| (customer, maker.as_ref())),
    )
    .await?;
    Ok(view)
}

#[instrument(name = "sales.customers.submit", skip_all)]
pub async fn submit_customer_form(
    db: &DatabaseConnection,
    data: &FormData,
) -> SalesResult<CreateOutcome> {
    let query = DbStatusQuery::new(db);
    let statuses = query.ordered().await?;
    let default_status = query.first_by_progress().await?;
    let rerender = |errors: &FieldErrors| {
        CreateOutcome::Invalid(assemble_customer_form(
            &statuses,
            default_status.as_ref(),
            data,
            errors,
        ))
    };

    let submission = match bind_submission(data, &statuses, default_status.as_ref()) {
        Ok(submission) => submission,
        Err(errors) => {
            info!(fields = %errors, "customer form rejected");
            return Ok(rerender(&errors));
        }
    };

    match create_customer(db, submission).await {
        Ok(record) => Ok(CreateOutcome::Created {
            redirect_to: customer_url(record.customer.id),
            record,
        }),
        Err(SalesError::UniquenessConflict { inn }) => {
            info!(%inn, "customer form rejected: duplicate INN");
            let mut errors = FieldErrors::new();
            errors.add("inn", duplicate_inn());
            Ok(rerender(&errors))
        }
        Err(SalesError::Validation(errors)) => {
            info!(fields = %errors, "customer form rejected");
            Ok(rerender(&errors))
        }
        Err(other) => Err(other),
    }
}

fn duplicate_inn() -> FieldError {
    FieldError::conflict("Customer with this INN already exists.")
}

/// Persists a bound submission: decision maker first, then the customer
/// pointing at it, in one transaction.
///
/// A submission without a status gets the lowest-progress one.
#[instrument(name = "sales.customers.create", skip_all)]
pub async fn create_customer(
    db: &DatabaseConnection,
    mut submission: CustomerSubmission,
) -> SalesResult<CreatedCustomer> {
    let txn = db.begin().await?;
    let statuses = DbStatusQuery::new(&txn);
    if submission.customer.status.is_none() {
        submission.customer.status = statuses.first_by_progress().await?.map(|status| status.id);
    }
    submission.validate_fields().into_result()?;
    let CustomerSubmission {
        customer: fields,
        decision_maker: maker_fields,
    } = submission;

    let mut errors = FieldErrors::new();
    let Some(status_id) = fields.status else {
        errors.add("status", FieldError::required());
        return Err(SalesError::Validation(errors));
    };

    if !statuses.exists(status_id).await? {
        errors.add(
            "status",
            FieldError::format("Select a valid choice. That choice is not one of the available choices."),
        );
        return Err(SalesError::Validation(errors));
    }

    let duplicates = customer::Entity::find()
        .filter(customer::Column::Inn.eq(fields.inn.as_str()))
        .count(&txn)
        .await?;
    if duplicates > 0 {
        return Err(SalesError::UniquenessConflict { inn: fields.inn });
    }

    let maker = match maker_fields {
        Some(maker) => Some(
            decision_maker::ActiveModel {
                first_name: Set(maker.first_name),
                last_name: Set(maker.last_name),
                middle_name: Set(maker.middle_name),
                title: Set(maker.title),
                phone: Set(Some(maker.phone)),
                email: Set(maker.email),
                birthdate: Set(maker.birthdate),
                ..Default::default()
            }
            .insert(&txn)
            .await?,
        ),
        None => None,
    };

    let now: DateTimeWithTimeZone = Utc::now().into();
    let inn = fields.inn.clone();
    let customer = customer::ActiveModel {
        status_updated_at: Set(now),
        inn: Set(fields.inn),
        name: Set(fields.name),
        source: Set(fields.source),
        total_volume: Set(fields.total_volume),
        target_volume: Set(fields.target_volume),
        current_supplier: Set(fields.current_supplier),
        consumed_items: Set(fields.consumed_items),
        problematic: Set(fields.problematic),
        purchase_method: Set(fields.purchase_method),
        note: Set(fields.note),
        created_at: Set(now),
        updated_at: Set(now),
        status_id: Set(status_id),
        decision_maker_id: Set(maker.as_ref().map(|m| m.id)),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|err| unique_violation(err, inn))?;

    txn.commit().await?;
    info!(
        customer_id = customer.id,
        decision_maker_id = ?customer.decision_maker_id,
        "customer created"
    );
    Ok(CreatedCustomer {
        customer,
        decision_maker: maker,
    })
}

/// A concurrent insert can still trip the unique index after the pre-check.
fn unique_violation(err: DbErr, inn: String) -> SalesError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => SalesError::UniquenessConflict { inn },
        _ => SalesError::Db(err),
    }
}
