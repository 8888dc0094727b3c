use std::str::FromStr;
use std::sync::Arc;

use async_graphql::{
    Context, EmptySubscription, Enum, Error, ErrorExtensions, InputObject, Object, Schema,
    SimpleObject, ID,
};
use chrono::{DateTime, NaiveDate, Utc};
use entity::{customer, customer_status, decision_maker, PurchaseMethod, Source};
use sales::form::{Choice, FormField, FormSection, SectionKey, Widget};
use sales::repo::{self, StatusInput};
use sales::{
    render_customer_form, submit_customer_form, CreateOutcome, CustomerFormView, FieldError,
    FieldErrorKind, FormData, SalesError,
};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::error::{sales_error, ApiError};

pub type SalesSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub struct AppSchema(pub SalesSchema);

pub fn build_schema(db: Arc<DatabaseConnection>) -> AppSchema {
    let schema = Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .finish();
    AppSchema(schema)
}

/// SDL of the schema; needs no database.
pub fn sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}

pub struct QueryRoot;
pub struct MutationRoot;

#[Object]
impl QueryRoot {
    async fn sales(&self) -> SalesQuery {
        SalesQuery
    }
}

#[Object]
impl MutationRoot {
    async fn sales(&self) -> SalesMutation {
        SalesMutation
    }
}

#[derive(Default)]
pub struct SalesQuery;

#[derive(Default)]
pub struct SalesMutation;

#[Object]
impl SalesQuery {
    /// The create form, or the edit form of `customerId` with its current
    /// values.
    async fn customer_form(
        &self,
        ctx: &Context<'_>,
        customer_id: Option<ID>,
    ) -> async_graphql::Result<CustomerFormNode> {
        let db = database(ctx)?;
        let customer_id = customer_id.as_ref().map(parse_id::<i32>).transpose()?;
        let view = render_customer_form(db.as_ref(), customer_id)
            .await
            .map_err(sales_error)?;
        Ok(view.into())
    }

    async fn customer_statuses(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<CustomerStatusNode>> {
        let db = database(ctx)?;
        let rows = repo::list_statuses(db.as_ref())
            .await
            .map_err(sales_error)?;
        Ok(rows.into_iter().map(CustomerStatusNode::from).collect())
    }

    async fn customer(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<Option<CustomerNode>> {
        let db = database(ctx)?;
        match repo::find_customer(db.as_ref(), parse_id(&id)?).await {
            Ok((model, maker)) => Ok(Some(CustomerNode::new(model, maker))),
            Err(SalesError::NotFound(_)) => Ok(None),
            Err(err) => Err(sales_error(err)),
        }
    }
}

#[Object]
impl SalesMutation {
    /// Submits the combined form. Invalid input comes back as the form with
    /// per-field errors rather than as a GraphQL error.
    async fn create_customer(
        &self,
        ctx: &Context<'_>,
        input: CustomerFormInput,
    ) -> async_graphql::Result<CreateCustomerPayload> {
        let db = database(ctx)?;
        let outcome = submit_customer_form(db.as_ref(), &input.into_form_data())
            .await
            .map_err(sales_error)?;
        Ok(match outcome {
            CreateOutcome::Created {
                record,
                redirect_to,
            } => CreateCustomerPayload {
                customer: Some(CustomerNode::new(record.customer, record.decision_maker)),
                redirect_to: Some(redirect_to),
                form: None,
            },
            CreateOutcome::Invalid(view) => CreateCustomerPayload {
                customer: None,
                redirect_to: None,
                form: Some(view.into()),
            },
        })
    }

    async fn create_customer_status(
        &self,
        ctx: &Context<'_>,
        input: CustomerStatusInput,
    ) -> async_graphql::Result<CustomerStatusNode> {
        let db = database(ctx)?;
        let model = repo::create_status(db.as_ref(), input.into())
            .await
            .map_err(sales_error)?;
        Ok(model.into())
    }

    async fn update_customer_status(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: CustomerStatusInput,
    ) -> async_graphql::Result<CustomerStatusNode> {
        let db = database(ctx)?;
        let model = repo::update_status(db.as_ref(), parse_id(&id)?, input.into())
            .await
            .map_err(sales_error)?;
        Ok(model.into())
    }

    async fn delete_customer_status(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<bool> {
        let db = database(ctx)?;
        repo::delete_status(db.as_ref(), parse_id(&id)?)
            .await
            .map_err(sales_error)?;
        Ok(true)
    }

    /// Deletes the decision maker and returns how many customers lost
    /// their link to it.
    async fn delete_decision_maker(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<i32> {
        let db = database(ctx)?;
        let unlinked = repo::delete_decision_maker(db.as_ref(), parse_id(&id)?)
            .await
            .map_err(sales_error)?;
        info!(unlinked, "decision maker removed via graphql");
        Ok(i32::try_from(unlinked).unwrap_or(i32::MAX))
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "CustomerSource")]
pub enum SourceKind {
    Search,
    Exhibition,
    Recommendation,
    Website,
    Call,
}

impl From<Source> for SourceKind {
    fn from(value: Source) -> Self {
        match value {
            Source::Search => SourceKind::Search,
            Source::Exhibition => SourceKind::Exhibition,
            Source::Recommendation => SourceKind::Recommendation,
            Source::Website => SourceKind::Website,
            Source::Call => SourceKind::Call,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "PurchaseMethod")]
pub enum PurchaseMethodKind {
    Tender,
    Free,
    Demand,
    Quarterly,
}

impl From<PurchaseMethod> for PurchaseMethodKind {
    fn from(value: PurchaseMethod) -> Self {
        match value {
            PurchaseMethod::Tender => PurchaseMethodKind::Tender,
            PurchaseMethod::Free => PurchaseMethodKind::Free,
            PurchaseMethod::Demand => PurchaseMethodKind::Demand,
            PurchaseMethod::Quarterly => PurchaseMethodKind::Quarterly,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "CustomerStatus")]
pub struct CustomerStatusNode {
    pub id: ID,
    pub title: String,
    pub progress: i32,
}

impl From<customer_status::Model> for CustomerStatusNode {
    fn from(model: customer_status::Model) -> Self {
        Self {
            id: ID::from(model.id.to_string()),
            title: model.title,
            progress: model.progress,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "DecisionMaker")]
pub struct DecisionMakerNode {
    pub id: ID,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birthdate: Option<NaiveDate>,
}

impl From<decision_maker::Model> for DecisionMakerNode {
    fn from(model: decision_maker::Model) -> Self {
        Self {
            id: ID::from(model.id.to_string()),
            first_name: model.first_name,
            last_name: model.last_name,
            middle_name: model.middle_name,
            title: model.title,
            phone: model.phone,
            email: model.email,
            birthdate: model.birthdate,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Customer")]
pub struct CustomerNode {
    pub id: ID,
    pub inn: String,
    pub name: String,
    pub source: Option<SourceKind>,
    pub total_volume: Option<i32>,
    pub target_volume: Option<i32>,
    pub current_supplier: Option<String>,
    pub consumed_items: String,
    pub problematic: String,
    pub purchase_method: Option<PurchaseMethodKind>,
    pub note: String,
    pub status_id: ID,
    pub decision_maker: Option<DecisionMakerNode>,
    pub status_updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomerNode {
    fn new(model: customer::Model, maker: Option<decision_maker::Model>) -> Self {
        Self {
            id: ID::from(model.id.to_string()),
            inn: model.inn,
            name: model.name,
            source: model.source.map(SourceKind::from),
            total_volume: model.total_volume,
            target_volume: model.target_volume,
            current_supplier: model.current_supplier,
            consumed_items: model.consumed_items,
            problematic: model.problematic,
            purchase_method: model.purchase_method.map(PurchaseMethodKind::from),
            note: model.note,
            status_id: ID::from(model.status_id.to_string()),
            decision_maker: maker.map(DecisionMakerNode::from),
            status_updated_at: model.status_updated_at.into(),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum FormWidget {
    Text,
    Textarea,
    Number,
    Email,
    Date,
    Select,
}

impl From<Widget> for FormWidget {
    fn from(value: Widget) -> Self {
        match value {
            Widget::Text => FormWidget::Text,
            Widget::Textarea => FormWidget::Textarea,
            Widget::Number => FormWidget::Number,
            Widget::Email => FormWidget::Email,
            Widget::Date => FormWidget::Date,
            Widget::Select => FormWidget::Select,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum FormSectionKey {
    Main,
    DecisionMaker,
    Shipment,
    Other,
}

impl From<SectionKey> for FormSectionKey {
    fn from(value: SectionKey) -> Self {
        match value {
            SectionKey::Main => FormSectionKey::Main,
            SectionKey::DecisionMaker => FormSectionKey::DecisionMaker,
            SectionKey::Shipment => FormSectionKey::Shipment,
            SectionKey::Other => FormSectionKey::Other,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
#[graphql(name = "FieldErrorKind")]
pub enum FieldErrorKindGql {
    Required,
    Format,
    Conflict,
}

impl From<FieldErrorKind> for FieldErrorKindGql {
    fn from(value: FieldErrorKind) -> Self {
        match value {
            FieldErrorKind::Required => FieldErrorKindGql::Required,
            FieldErrorKind::Format => FieldErrorKindGql::Format,
            FieldErrorKind::Conflict => FieldErrorKindGql::Conflict,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "FieldError")]
pub struct FieldErrorNode {
    pub kind: FieldErrorKindGql,
    pub message: String,
}

impl From<FieldError> for FieldErrorNode {
    fn from(value: FieldError) -> Self {
        Self {
            kind: value.kind.into(),
            message: value.message,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "FormChoice")]
pub struct ChoiceNode {
    pub value: String,
    pub label: String,
}

impl From<Choice> for ChoiceNode {
    fn from(value: Choice) -> Self {
        Self {
            value: value.value,
            label: value.label,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "FormField")]
pub struct FormFieldNode {
    pub name: String,
    pub label: String,
    pub widget: FormWidget,
    pub required: bool,
    pub max_length: Option<i32>,
    pub help_text: Option<String>,
    pub choices: Vec<ChoiceNode>,
    pub value: Option<String>,
    pub errors: Vec<FieldErrorNode>,
    pub class: String,
    pub placeholder: String,
}

impl From<FormField> for FormFieldNode {
    fn from(field: FormField) -> Self {
        Self {
            name: field.name.to_string(),
            label: field.label.to_string(),
            widget: field.widget.into(),
            required: field.required,
            max_length: field.max_length.and_then(|max| i32::try_from(max).ok()),
            help_text: field.help_text.map(str::to_string),
            choices: field.choices.into_iter().map(ChoiceNode::from).collect(),
            value: field.value,
            errors: field.errors.into_iter().map(FieldErrorNode::from).collect(),
            class: field.attrs.class.to_string(),
            placeholder: field.attrs.placeholder.to_string(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "FormSection")]
pub struct FormSectionNode {
    pub key: FormSectionKey,
    pub title: String,
    pub fields: Vec<FormFieldNode>,
}

impl From<FormSection> for FormSectionNode {
    fn from(section: FormSection) -> Self {
        Self {
            key: section.key.into(),
            title: section.title.to_string(),
            fields: section.fields.into_iter().map(FormFieldNode::from).collect(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "CustomerForm")]
pub struct CustomerFormNode {
    pub main: FormSectionNode,
    pub decision_maker: FormSectionNode,
    pub shipment: FormSectionNode,
    pub other: FormSectionNode,
    pub non_field_errors: Vec<String>,
    pub has_errors: bool,
}

impl From<CustomerFormView> for CustomerFormNode {
    fn from(view: CustomerFormView) -> Self {
        let has_errors = view.has_errors();
        Self {
            main: view.main.into(),
            decision_maker: view.decision_maker.into(),
            shipment: view.shipment.into(),
            other: view.other.into(),
            non_field_errors: view.non_field_errors,
            has_errors,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct CreateCustomerPayload {
    pub customer: Option<CustomerNode>,
    pub redirect_to: Option<String>,
    /// Present when the submission was rejected.
    pub form: Option<CustomerFormNode>,
}

/// Raw form values. Everything is text, exactly as a browser would post it.
#[derive(Clone, Debug, Default, InputObject)]
pub struct CustomerFormInput {
    pub status: Option<ID>,
    pub inn: Option<String>,
    pub name: Option<String>,
    pub source: Option<String>,
    pub total_volume: Option<String>,
    pub target_volume: Option<String>,
    pub current_supplier: Option<String>,
    pub consumed_items: Option<String>,
    pub problematic: Option<String>,
    pub purchase_method: Option<String>,
    pub note: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birthdate: Option<String>,
}

impl CustomerFormInput {
    fn into_form_data(self) -> FormData {
        [
            ("status", self.status.map(|id| id.to_string())),
            ("inn", self.inn),
            ("name", self.name),
            ("source", self.source),
            ("total_volume", self.total_volume),
            ("target_volume", self.target_volume),
            ("current_supplier", self.current_supplier),
            ("consumed_items", self.consumed_items),
            ("problematic", self.problematic),
            ("purchase_method", self.purchase_method),
            ("note", self.note),
            ("first_name", self.first_name),
            ("last_name", self.last_name),
            ("middle_name", self.middle_name),
            ("title", self.title),
            ("phone", self.phone),
            ("email", self.email),
            ("birthdate", self.birthdate),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name.to_string(), value)))
        .collect()
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct CustomerStatusInput {
    pub title: String,
    pub progress: i32,
}

impl From<CustomerStatusInput> for StatusInput {
    fn from(value: CustomerStatusInput) -> Self {
        StatusInput::new(value.title, value.progress)
    }
}

fn database(ctx: &Context<'_>) -> async_graphql::Result<Arc<DatabaseConnection>> {
    ctx.data::<Arc<DatabaseConnection>>()
        .cloned()
        .map_err(|_| ApiError::Internal("missing database connection").extend())
}

fn parse_id<T: FromStr>(id: &ID) -> Result<T, Error> {
    id.as_str()
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("invalid id {:?}", id.as_str())).extend())
}
