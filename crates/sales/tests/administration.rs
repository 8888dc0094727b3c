mod common;

use common::{form, lead, seed_statuses, setup_db};
use entity::{customer, customer_status, decision_maker};
use sales::create::{submit_customer_form, CreateOutcome};
use sales::error::{FieldErrorKind, SalesError};
use sales::form::FormData;
use sales::repo::{
    create_status, delete_decision_maker, delete_status, list_statuses, seed_default_statuses,
    update_status, StatusInput, DEFAULT_STATUSES,
};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait, PaginatorTrait, SqlErr,
};

async fn created(db: &DatabaseConnection, data: FormData) -> customer::Model {
    match submit_customer_form(db, &data).await.unwrap() {
        CreateOutcome::Created { record, .. } => record.customer,
        CreateOutcome::Invalid(view) => panic!("unexpected errors: {view:?}"),
    }
}

async fn insert_customer(
    db: &DatabaseConnection,
    inn: &str,
    status_id: i64,
    decision_maker_id: Option<i64>,
) -> Result<customer::Model, sea_orm::DbErr> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    customer::ActiveModel {
        status_id: Set(status_id),
        status_updated_at: Set(now),
        inn: Set(inn.to_string()),
        name: Set("ООО Ромашка".into()),
        consumed_items: Set("Профнастил".into()),
        problematic: Set("Цена".into()),
        note: Set("Перезвонить".into()),
        decision_maker_id: Set(decision_maker_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

async fn insert_decision_maker(db: &DatabaseConnection) -> decision_maker::Model {
    decision_maker::ActiveModel {
        last_name: Set(Some("Петров".into())),
        phone: Set(Some("+7 900 123-45-67".into())),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

#[tokio::test]
async fn statuses_are_listed_by_progress() {
    let db = setup_db().await;
    seed_statuses(&db).await;
    let progress: Vec<i32> = list_statuses(&db)
        .await
        .unwrap()
        .iter()
        .map(|s| s.progress)
        .collect();
    assert_eq!(progress, [0, 50, 100]);
}

#[tokio::test]
async fn status_input_is_validated() {
    let db = setup_db().await;
    let err = create_status(&db, StatusInput::new("  ", 101))
        .await
        .unwrap_err();
    let SalesError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert_eq!(errors.get("title")[0].kind, FieldErrorKind::Required);
    assert_eq!(errors.get("progress")[0].kind, FieldErrorKind::Format);
    assert_eq!(customer_status::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn referenced_status_cannot_be_deleted() {
    let db = setup_db().await;
    let statuses = seed_statuses(&db).await;
    let lowest = statuses.iter().min_by_key(|s| s.progress).unwrap().clone();
    created(&db, lead("7707083893")).await;

    let err = delete_status(&db, lowest.id).await.unwrap_err();
    assert!(matches!(
        err,
        SalesError::ReferentialIntegrity { status_id, customers: 1 } if status_id == lowest.id
    ));
    assert!(customer_status::Entity::find_by_id(lowest.id)
        .one(&db)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn unreferenced_status_can_be_deleted() {
    let db = setup_db().await;
    let statuses = seed_statuses(&db).await;
    let highest = statuses.iter().max_by_key(|s| s.progress).unwrap();
    created(&db, lead("7707083893")).await;

    delete_status(&db, highest.id).await.unwrap();
    assert_eq!(customer_status::Entity::find().count(&db).await.unwrap(), 2);
    assert!(matches!(
        delete_status(&db, highest.id).await.unwrap_err(),
        SalesError::NotFound(_)
    ));
}

#[tokio::test]
async fn referenced_status_can_still_be_edited() {
    let db = setup_db().await;
    let statuses = seed_statuses(&db).await;
    let lowest = statuses.iter().min_by_key(|s| s.progress).unwrap();
    let customer = created(&db, lead("7707083893")).await;

    let updated = update_status(&db, lowest.id, StatusInput::new("Холодный лид", 5))
        .await
        .unwrap();
    assert_eq!(updated.title, "Холодный лид");
    assert_eq!(updated.progress, 5);
    let reloaded = customer::Entity::find_by_id(customer.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status_id, lowest.id);
}

#[tokio::test]
async fn deleting_a_decision_maker_clears_the_reference() {
    let db = setup_db().await;
    seed_statuses(&db).await;
    let mut data = lead("7707083893");
    data.extend(form(&[("last_name", "Петров"), ("phone", "+7 900 123-45-67")]));
    let customer = created(&db, data).await;
    let maker_id = customer.decision_maker_id.unwrap();

    let unlinked = delete_decision_maker(&db, maker_id).await.unwrap();
    assert_eq!(unlinked, 1);
    let reloaded = customer::Entity::find_by_id(customer.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.decision_maker_id, None);
    assert_eq!(decision_maker::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(customer::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn deleting_an_unknown_decision_maker_is_not_found() {
    let db = setup_db().await;
    let err = delete_decision_maker(&db, 42).await.unwrap_err();
    assert!(matches!(err, SalesError::NotFound("decision maker")));
}

#[tokio::test]
async fn default_statuses_are_seeded_once() {
    let db = setup_db().await;
    assert_eq!(
        seed_default_statuses(&db).await.unwrap(),
        DEFAULT_STATUSES.len()
    );
    assert_eq!(seed_default_statuses(&db).await.unwrap(), 0);
    let statuses = list_statuses(&db).await.unwrap();
    assert_eq!(statuses.len(), DEFAULT_STATUSES.len());
    assert_eq!(statuses[0].progress, 0);
}

#[tokio::test]
async fn schema_restricts_deleting_a_referenced_status() {
    let db = setup_db().await;
    let statuses = seed_statuses(&db).await;
    let status = &statuses[0];
    insert_customer(&db, "7707083893", status.id, None)
        .await
        .unwrap();

    let result = customer_status::Entity::delete_by_id(status.id)
        .exec(&db)
        .await;
    assert!(result.is_err(), "delete of a referenced status succeeded");
    assert!(customer_status::Entity::find_by_id(status.id)
        .one(&db)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn schema_nulls_the_link_when_a_decision_maker_is_deleted() {
    let db = setup_db().await;
    let statuses = seed_statuses(&db).await;
    let maker = insert_decision_maker(&db).await;
    let customer = insert_customer(&db, "7707083893", statuses[0].id, Some(maker.id))
        .await
        .unwrap();

    let deleted = decision_maker::Entity::delete_by_id(maker.id)
        .exec(&db)
        .await
        .unwrap();
    assert_eq!(deleted.rows_affected, 1);
    let reloaded = customer::Entity::find_by_id(customer.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.decision_maker_id, None);
}

#[tokio::test]
async fn decision_maker_belongs_to_one_customer() {
    let db = setup_db().await;
    let statuses = seed_statuses(&db).await;
    let maker = insert_decision_maker(&db).await;
    insert_customer(&db, "7707083893", statuses[0].id, Some(maker.id))
        .await
        .unwrap();

    let err = insert_customer(&db, "500100732259", statuses[0].id, Some(maker.id))
        .await
        .unwrap_err();
    assert!(matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));
    assert_eq!(customer::Entity::find().count(&db).await.unwrap(), 1);
}
