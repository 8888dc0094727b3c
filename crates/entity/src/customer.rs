use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A lead or active account.
///
/// `status_id` is protected: a referenced status cannot be deleted.
/// `decision_maker_id` is cleared when its decision maker goes away.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "customer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub status_updated_at: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub inn: String,
    pub name: String,
    pub source: Option<Source>,
    /// Thousand m².
    pub total_volume: Option<i32>,
    /// Thousand m².
    pub target_volume: Option<i32>,
    pub current_supplier: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub consumed_items: String,
    #[sea_orm(column_type = "Text")]
    pub problematic: String,
    pub purchase_method: Option<PurchaseMethod>,
    #[sea_orm(column_type = "Text")]
    pub note: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(indexed)]
    pub status_id: i64,
    #[sea_orm(unique)]
    pub decision_maker_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer_status::Entity",
        from = "Column::StatusId",
        to = "super::customer_status::Column::Id",
        on_delete = "Restrict"
    )]
    Status,
    #[sea_orm(
        belongs_to = "super::decision_maker::Entity",
        from = "Column::DecisionMakerId",
        to = "super::decision_maker::Column::Id",
        on_delete = "SetNull"
    )]
    DecisionMaker,
}

impl Related<super::customer_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Status.def()
    }
}

impl Related<super::decision_maker::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DecisionMaker.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// How the lead was acquired.
#[derive(
    Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(15))")]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[sea_orm(string_value = "search")]
    Search,
    #[sea_orm(string_value = "exhibition")]
    Exhibition,
    #[sea_orm(string_value = "recommendation")]
    Recommendation,
    #[sea_orm(string_value = "website")]
    Website,
    #[sea_orm(string_value = "call")]
    Call,
}

impl Source {
    pub fn label(self) -> &'static str {
        match self {
            Source::Search => "Поиск",
            Source::Exhibition => "Выставка",
            Source::Recommendation => "Рекомендация",
            Source::Website => "Сайт",
            Source::Call => "Звонок",
        }
    }
}

#[derive(
    Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(15))")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseMethod {
    #[sea_orm(string_value = "tender")]
    Tender,
    #[sea_orm(string_value = "free")]
    Free,
    #[sea_orm(string_value = "demand")]
    Demand,
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
}

impl PurchaseMethod {
    pub fn label(self) -> &'static str {
        match self {
            PurchaseMethod::Tender => "Тендер",
            PurchaseMethod::Free => "Свободный",
            PurchaseMethod::Demand => "По потребности",
            PurchaseMethod::Quarterly => "Квартальный",
        }
    }
}
