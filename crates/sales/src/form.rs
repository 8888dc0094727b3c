//! The combined customer / decision-maker form.
//!
//! Both entities contribute a field schema ([`CUSTOMER_FIELDS`],
//! [`DECISION_MAKER_FIELDS`]); [`assemble_customer_form`] lays them out into
//! the four named sections of [`CustomerFormView`]. Submitted data goes the
//! other way through [`bind_submission`], which yields a typed
//! [`CustomerSubmission`] or per-field errors.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use entity::{customer, customer_status, decision_maker, PurchaseMethod, Source};
use sea_orm::{ActiveEnum, DbErr, Iterable};
use serde::Serialize;
use validator::{Validate, ValidationError};

use crate::error::{FieldError, FieldErrors};
use crate::repo::StatusQuery;
use crate::validators::{not_blank, validate_inn};

/// Raw submitted values keyed by field name.
pub type FormData = BTreeMap<String, String>;

pub const WIDGET_CLASS: &str = "form-control";
const EMPTY_CHOICE_LABEL: &str = "---------";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    Text,
    Textarea,
    Number,
    Email,
    Date,
    Select,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub required: bool,
    pub max_length: Option<usize>,
    pub help_text: Option<&'static str>,
}

impl FieldDef {
    const fn new(name: &'static str, label: &'static str, widget: Widget) -> Self {
        Self {
            name,
            label,
            widget,
            required: false,
            max_length: None,
            help_text: None,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    const fn help(mut self, text: &'static str) -> Self {
        self.help_text = Some(text);
        self
    }
}

pub const CUSTOMER_FIELDS: &[FieldDef] = &[
    FieldDef::new("status", "Статус (Этап)", Widget::Select).required(),
    FieldDef::new("inn", "ИНН", Widget::Text).required().max_length(12),
    FieldDef::new("name", "Наименование", Widget::Text)
        .required()
        .max_length(200),
    FieldDef::new("source", "Способ привлечения", Widget::Select),
    FieldDef::new("total_volume", "Общий объем", Widget::Number).help("тыс. м2"),
    FieldDef::new("target_volume", "Целевой объем", Widget::Number).help("тыс. м2"),
    FieldDef::new("current_supplier", "Действующий поставщик", Widget::Text).max_length(200),
    FieldDef::new("consumed_items", "Потребляемая номенклатура", Widget::Textarea).required(),
    FieldDef::new("problematic", "Возражения/проблематика", Widget::Textarea).required(),
    FieldDef::new("purchase_method", "Способ закупки", Widget::Select),
    FieldDef::new("note", "Примечания", Widget::Textarea).required(),
];

pub const DECISION_MAKER_FIELDS: &[FieldDef] = &[
    FieldDef::new("first_name", "Имя", Widget::Text).max_length(70),
    FieldDef::new("last_name", "Фамилия", Widget::Text).max_length(70),
    FieldDef::new("middle_name", "Отчество", Widget::Text).max_length(70),
    FieldDef::new("title", "Должность", Widget::Text).max_length(100),
    FieldDef::new("phone", "Телефон", Widget::Text)
        .required()
        .max_length(50),
    FieldDef::new("email", "email", Widget::Email).max_length(254),
    FieldDef::new("birthdate", "Дата рождения", Widget::Date),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Main,
    DecisionMaker,
    Shipment,
    Other,
}

impl SectionKey {
    pub fn title(self) -> &'static str {
        match self {
            SectionKey::Main => "Основное",
            SectionKey::DecisionMaker => "ЛПР",
            SectionKey::Shipment => "Отгрузка",
            SectionKey::Other => "Прочее",
        }
    }

    /// Field names shown in this section, in display order.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            SectionKey::Main => &["status", "inn", "name"],
            SectionKey::DecisionMaker => &[
                "last_name",
                "first_name",
                "middle_name",
                "title",
                "phone",
                "email",
                "birthdate",
                "source",
            ],
            SectionKey::Shipment => &[
                "total_volume",
                "target_volume",
                "current_supplier",
                "consumed_items",
                "problematic",
                "purchase_method",
            ],
            SectionKey::Other => &["note"],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WidgetAttrs {
    pub class: &'static str,
    pub placeholder: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub required: bool,
    pub max_length: Option<usize>,
    pub help_text: Option<&'static str>,
    pub choices: Vec<Choice>,
    pub value: Option<String>,
    pub errors: Vec<FieldError>,
    pub attrs: WidgetAttrs,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormSection {
    pub key: SectionKey,
    pub title: &'static str,
    pub fields: Vec<FormField>,
}

/// Editable view of a customer together with its decision maker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerFormView {
    pub main: FormSection,
    pub decision_maker: FormSection,
    pub shipment: FormSection,
    pub other: FormSection,
    pub non_field_errors: Vec<String>,
}

impl CustomerFormView {
    pub fn sections(&self) -> [&FormSection; 4] {
        [&self.main, &self.decision_maker, &self.shipment, &self.other]
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.sections()
            .into_iter()
            .flat_map(|section| section.fields.iter())
            .find(|field| field.name == name)
    }

    pub fn has_errors(&self) -> bool {
        !self.non_field_errors.is_empty()
            || self
                .sections()
                .iter()
                .any(|section| section.fields.iter().any(|f| !f.errors.is_empty()))
    }
}

fn field_def(name: &str) -> Option<&'static FieldDef> {
    CUSTOMER_FIELDS
        .iter()
        .chain(DECISION_MAKER_FIELDS.iter())
        .find(|def| def.name == name)
}

fn choices_for(name: &str, statuses: &[customer_status::Model]) -> Vec<Choice> {
    match name {
        "status" => statuses
            .iter()
            .map(|status| Choice {
                value: status.id.to_string(),
                label: status.title.clone(),
            })
            .collect(),
        "source" => optional_choices(Source::iter().map(|s| (s.to_value(), s.label()))),
        "purchase_method" => {
            optional_choices(PurchaseMethod::iter().map(|m| (m.to_value(), m.label())))
        }
        _ => Vec::new(),
    }
}

fn optional_choices(values: impl Iterator<Item = (String, &'static str)>) -> Vec<Choice> {
    std::iter::once(Choice {
        value: String::new(),
        label: EMPTY_CHOICE_LABEL.to_string(),
    })
    .chain(values.map(|(value, label)| Choice {
        value,
        label: label.to_string(),
    }))
    .collect()
}

/// Lays the two field schemas out into sections.
///
/// `statuses` must already be ordered by progress; `default_status` fills the
/// status field when `initial` carries none. Pure: the same inputs always
/// yield the same view.
pub fn assemble_customer_form(
    statuses: &[customer_status::Model],
    default_status: Option<&customer_status::Model>,
    initial: &FormData,
    errors: &FieldErrors,
) -> CustomerFormView {
    let section = |key: SectionKey| FormSection {
        key,
        title: key.title(),
        fields: key
            .field_names()
            .iter()
            .filter_map(|name| field_def(name))
            .map(|def| {
                let value = initial.get(def.name).cloned().or_else(|| {
                    (def.name == "status")
                        .then(|| default_status.map(|s| s.id.to_string()))
                        .flatten()
                });
                FormField {
                    name: def.name,
                    label: def.label,
                    widget: def.widget,
                    required: def.required,
                    max_length: def.max_length,
                    help_text: def.help_text,
                    choices: choices_for(def.name, statuses),
                    value,
                    errors: errors.get(def.name).to_vec(),
                    attrs: WidgetAttrs {
                        class: WIDGET_CLASS,
                        placeholder: def.label,
                    },
                }
            })
            .collect(),
    };

    let non_field_errors = errors
        .iter()
        .filter(|(name, _)| field_def(name).is_none())
        .flat_map(|(_, list)| list.iter().map(|e| e.message.clone()))
        .collect();

    CustomerFormView {
        main: section(SectionKey::Main),
        decision_maker: section(SectionKey::DecisionMaker),
        shipment: section(SectionKey::Shipment),
        other: section(SectionKey::Other),
        non_field_errors,
    }
}

/// Loads statuses through `statuses` and assembles the form, pre-filled from
/// `existing` when editing a stored customer.
pub async fn load_customer_form<Q>(
    statuses: &Q,
    existing: Option<(&customer::Model, Option<&decision_maker::Model>)>,
) -> Result<CustomerFormView, DbErr>
where
    Q: StatusQuery + ?Sized,
{
    let ordered = statuses.ordered().await?;
    let default_status = statuses.first_by_progress().await?;
    let initial = existing
        .map(|(customer, maker)| customer_initial(customer, maker))
        .unwrap_or_default();
    Ok(assemble_customer_form(
        &ordered,
        default_status.as_ref(),
        &initial,
        &FieldErrors::new(),
    ))
}

/// Current values of a stored customer and its decision maker as form data.
pub fn customer_initial(
    customer: &customer::Model,
    maker: Option<&decision_maker::Model>,
) -> FormData {
    let mut data = FormData::new();
    let mut put = |name: &str, value: Option<String>| {
        if let Some(value) = value {
            data.insert(name.to_string(), value);
        }
    };
    put("status", Some(customer.status_id.to_string()));
    put("inn", Some(customer.inn.clone()));
    put("name", Some(customer.name.clone()));
    put("source", customer.source.map(|s| s.to_value()));
    put("total_volume", customer.total_volume.map(|v| v.to_string()));
    put("target_volume", customer.target_volume.map(|v| v.to_string()));
    put("current_supplier", customer.current_supplier.clone());
    put("consumed_items", Some(customer.consumed_items.clone()));
    put("problematic", Some(customer.problematic.clone()));
    put("purchase_method", customer.purchase_method.map(|m| m.to_value()));
    put("note", Some(customer.note.clone()));
    if let Some(maker) = maker {
        put("first_name", maker.first_name.clone());
        put("last_name", maker.last_name.clone());
        put("middle_name", maker.middle_name.clone());
        put("title", maker.title.clone());
        put("phone", maker.phone.clone());
        put("email", maker.email.clone());
        put(
            "birthdate",
            maker.birthdate.map(|d| d.format(DATE_FORMAT).to_string()),
        );
    }
    data
}

fn required_inn(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    validate_inn(value)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Validate)]
pub struct CustomerFields {
    #[validate(required(message = "This field is required."))]
    pub status: Option<i64>,
    #[validate(
        custom(function = "required_inn"),
        length(max = 12, message = "INN must be at most 12 characters.")
    )]
    pub inn: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Name must be at most 200 characters.")
    )]
    pub name: String,
    pub source: Option<Source>,
    pub total_volume: Option<i32>,
    pub target_volume: Option<i32>,
    #[validate(length(max = 200, message = "Supplier must be at most 200 characters."))]
    pub current_supplier: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub consumed_items: String,
    #[validate(custom(function = "not_blank"))]
    pub problematic: String,
    pub purchase_method: Option<PurchaseMethod>,
    #[validate(custom(function = "not_blank"))]
    pub note: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Validate)]
pub struct DecisionMakerFields {
    #[validate(length(max = 70, message = "First name must be at most 70 characters."))]
    pub first_name: Option<String>,
    #[validate(length(max = 70, message = "Last name must be at most 70 characters."))]
    pub last_name: Option<String>,
    #[validate(length(max = 70, message = "Middle name must be at most 70 characters."))]
    pub middle_name: Option<String>,
    #[validate(length(max = 100, message = "Title must be at most 100 characters."))]
    pub title: Option<String>,
    #[validate(
        custom(function = "not_blank"),
        length(max = 50, message = "Phone must be at most 50 characters.")
    )]
    pub phone: String,
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Email must be at most 254 characters.")
    )]
    pub email: Option<String>,
    pub birthdate: Option<NaiveDate>,
}

/// A bound, validated submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerSubmission {
    pub customer: CustomerFields,
    pub decision_maker: Option<DecisionMakerFields>,
}

impl CustomerSubmission {
    /// Runs the declarative field rules over both parts.
    pub fn validate_fields(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Err(raw) = self.customer.validate() {
            errors.extend_validation(&raw);
        }
        if let Some(maker) = &self.decision_maker {
            if let Err(raw) = maker.validate() {
                errors.extend_validation(&raw);
            }
        }
        errors
    }
}

struct Binder<'a> {
    data: &'a FormData,
    errors: FieldErrors,
}

impl<'a> Binder<'a> {
    fn text(&self, name: &str) -> Option<String> {
        self.data
            .get(name)
            .map(|raw| raw.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn int(&mut self, name: &str) -> Option<i32> {
        let raw = self.text(name)?;
        match raw.parse::<i32>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.errors
                    .add(name, FieldError::format("Enter a whole number."));
                None
            }
        }
    }

    fn date(&mut self, name: &str) -> Option<NaiveDate> {
        let raw = self.text(name)?;
        match NaiveDate::parse_from_str(&raw, DATE_FORMAT) {
            Ok(value) => Some(value),
            Err(_) => {
                self.errors.add(
                    name,
                    FieldError::format("Enter a valid date (YYYY-MM-DD)."),
                );
                None
            }
        }
    }

    fn choice<E>(&mut self, name: &str) -> Option<E>
    where
        E: ActiveEnum<Value = String>,
    {
        let raw = self.text(name)?;
        match E::try_from_value(&raw) {
            Ok(value) => Some(value),
            Err(_) => {
                self.errors.add(name, invalid_choice(&raw));
                None
            }
        }
    }

    fn status(
        &mut self,
        statuses: &[customer_status::Model],
        default_status: Option<&customer_status::Model>,
    ) -> Option<i64> {
        let Some(raw) = self.text("status") else {
            return default_status.map(|s| s.id);
        };
        let found = raw
            .parse::<i64>()
            .ok()
            .filter(|id| statuses.iter().any(|s| s.id == *id));
        if found.is_none() {
            self.errors.add("status", invalid_choice(&raw));
        }
        found
    }

    fn decision_maker_submitted(&self) -> bool {
        DECISION_MAKER_FIELDS
            .iter()
            .any(|def| self.text(def.name).is_some())
    }
}

fn invalid_choice(raw: &str) -> FieldError {
    FieldError::format(format!(
        "Select a valid choice. {raw} is not one of the available choices."
    ))
}

/// Parses and validates raw form data.
///
/// Values are trimmed first. A missing status falls back to
/// `default_status`. The decision maker is only bound, and its phone only
/// required, when at least one of its fields is filled in.
pub fn bind_submission(
    data: &FormData,
    statuses: &[customer_status::Model],
    default_status: Option<&customer_status::Model>,
) -> Result<CustomerSubmission, FieldErrors> {
    let mut binder = Binder {
        data,
        errors: FieldErrors::new(),
    };

    let customer = CustomerFields {
        status: binder.status(statuses, default_status),
        inn: binder.text("inn").unwrap_or_default(),
        name: binder.text("name").unwrap_or_default(),
        source: binder.choice::<Source>("source"),
        total_volume: binder.int("total_volume"),
        target_volume: binder.int("target_volume"),
        current_supplier: binder.text("current_supplier"),
        consumed_items: binder.text("consumed_items").unwrap_or_default(),
        problematic: binder.text("problematic").unwrap_or_default(),
        purchase_method: binder.choice::<PurchaseMethod>("purchase_method"),
        note: binder.text("note").unwrap_or_default(),
    };

    let decision_maker = if binder.decision_maker_submitted() {
        Some(DecisionMakerFields {
            first_name: binder.text("first_name"),
            last_name: binder.text("last_name"),
            middle_name: binder.text("middle_name"),
            title: binder.text("title"),
            phone: binder.text("phone").unwrap_or_default(),
            email: binder.text("email"),
            birthdate: binder.date("birthdate"),
        })
    } else {
        None
    };

    let submission = CustomerSubmission {
        customer,
        decision_maker,
    };
    let mut errors = binder.errors;
    errors.merge(submission.validate_fields());
    if errors.is_empty() {
        Ok(submission)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldErrorKind;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FixedStatuses(Vec<customer_status::Model>);

    #[async_trait]
    impl StatusQuery for FixedStatuses {
        async fn ordered(&self) -> Result<Vec<customer_status::Model>, DbErr> {
            let mut rows = self.0.clone();
            rows.sort_by_key(|s| (s.progress, s.id));
            Ok(rows)
        }
    }

    fn status(id: i64, title: &str, progress: i32) -> customer_status::Model {
        customer_status::Model {
            id,
            title: title.to_string(),
            progress,
        }
    }

    fn statuses() -> Vec<customer_status::Model> {
        vec![status(1, "Contact", 10), status(2, "New", 0), status(3, "Won", 100)]
    }

    fn valid_data() -> FormData {
        [
            ("status", "1"),
            ("inn", "7707083893"),
            ("name", "ООО Ромашка"),
            ("consumed_items", "Профнастил"),
            ("problematic", "Цена"),
            ("note", "Перезвонить в понедельник"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn names(section: &FormSection) -> Vec<&'static str> {
        section.fields.iter().map(|f| f.name).collect()
    }

    #[tokio::test]
    async fn empty_form_groups_fields_into_sections() {
        let view = load_customer_form(&FixedStatuses(statuses()), None)
            .await
            .unwrap();
        assert_eq!(names(&view.main), ["status", "inn", "name"]);
        assert_eq!(
            names(&view.decision_maker),
            [
                "last_name",
                "first_name",
                "middle_name",
                "title",
                "phone",
                "email",
                "birthdate",
                "source"
            ]
        );
        assert_eq!(
            names(&view.shipment),
            [
                "total_volume",
                "target_volume",
                "current_supplier",
                "consumed_items",
                "problematic",
                "purchase_method"
            ]
        );
        assert_eq!(names(&view.other), ["note"]);
        assert_eq!(view.decision_maker.title, "ЛПР");
        assert!(!view.has_errors());
    }

    #[test]
    fn every_schema_field_is_laid_out_once() {
        let view = assemble_customer_form(&[], None, &FormData::new(), &FieldErrors::new());
        let mut laid_out: Vec<&str> = view
            .sections()
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.name))
            .collect();
        let mut schema: Vec<&str> = CUSTOMER_FIELDS
            .iter()
            .chain(DECISION_MAKER_FIELDS)
            .map(|s| s.name)
            .collect();
        laid_out.sort_unstable();
        schema.sort_unstable();
        assert_eq!(laid_out, schema);
    }

    #[tokio::test]
    async fn default_status_is_lowest_progress() {
        let view = load_customer_form(&FixedStatuses(statuses()), None)
            .await
            .unwrap();
        let field = view.field("status").unwrap();
        assert_eq!(field.value.as_deref(), Some("2"));
        let order: Vec<&str> = field.choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(order, ["New", "Contact", "Won"]);
    }

    #[test]
    fn labels_double_as_placeholders() {
        let view = assemble_customer_form(&statuses(), None, &FormData::new(), &FieldErrors::new());
        for section in view.sections() {
            for field in &section.fields {
                assert_eq!(field.attrs.placeholder, field.label);
                assert_eq!(field.attrs.class, WIDGET_CLASS);
            }
        }
        assert_eq!(view.field("total_volume").unwrap().help_text, Some("тыс. м2"));
    }

    #[test]
    fn optional_selects_offer_an_empty_choice() {
        let view = assemble_customer_form(&statuses(), None, &FormData::new(), &FieldErrors::new());
        let source = view.field("source").unwrap();
        assert_eq!(source.choices[0].value, "");
        assert_eq!(source.choices.len(), 6);
        assert_eq!(source.choices[1].value, "search");
        assert_eq!(source.choices[1].label, "Поиск");
        let method = view.field("purchase_method").unwrap();
        assert_eq!(method.choices.len(), 5);
    }

    #[tokio::test]
    async fn editing_prefills_decision_maker_fields() {
        let now = Utc::now().into();
        let maker = decision_maker::Model {
            id: 7,
            first_name: Some("Иван".into()),
            last_name: Some("Петров".into()),
            middle_name: None,
            title: Some("Закупщик".into()),
            phone: Some("+7 900 000-00-00".into()),
            email: Some("ivan@example.ru".into()),
            birthdate: NaiveDate::from_ymd_opt(1980, 5, 17),
        };
        let customer = customer::Model {
            id: 1,
            status_updated_at: now,
            inn: "7707083893".into(),
            name: "ООО Ромашка".into(),
            source: Some(Source::Call),
            total_volume: Some(120),
            target_volume: None,
            current_supplier: None,
            consumed_items: "Профнастил".into(),
            problematic: "Цена".into(),
            purchase_method: Some(PurchaseMethod::Tender),
            note: "-".into(),
            created_at: now,
            updated_at: now,
            status_id: 3,
            decision_maker_id: Some(7),
        };
        let view = load_customer_form(&FixedStatuses(statuses()), Some((&customer, Some(&maker))))
            .await
            .unwrap();
        let value = |name: &str| view.field(name).unwrap().value.clone();
        assert_eq!(value("first_name").as_deref(), Some("Иван"));
        assert_eq!(value("phone").as_deref(), Some("+7 900 000-00-00"));
        assert_eq!(value("birthdate").as_deref(), Some("1980-05-17"));
        assert_eq!(value("middle_name"), None);
        assert_eq!(value("status").as_deref(), Some("3"));
        assert_eq!(value("source").as_deref(), Some("call"));
        assert_eq!(value("purchase_method").as_deref(), Some("tender"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let all = statuses();
        let a = assemble_customer_form(&all, all.first(), &valid_data(), &FieldErrors::new());
        let b = assemble_customer_form(&all, all.first(), &valid_data(), &FieldErrors::new());
        assert_eq!(a, b);
    }

    #[test]
    fn binds_a_minimal_submission_without_decision_maker() {
        let all = statuses();
        let submission = bind_submission(&valid_data(), &all, all.first()).unwrap();
        assert_eq!(submission.customer.status, Some(1));
        assert_eq!(submission.customer.name, "ООО Ромашка");
        assert!(submission.decision_maker.is_none());
    }

    #[test]
    fn missing_status_falls_back_to_default() {
        let all = statuses();
        let mut data = valid_data();
        data.remove("status");
        let submission = bind_submission(&data, &all, Some(&all[1])).unwrap();
        assert_eq!(submission.customer.status, Some(2));
    }

    #[test]
    fn missing_status_without_any_status_is_required() {
        let mut data = valid_data();
        data.remove("status");
        let errors = bind_submission(&data, &[], None).unwrap_err();
        assert_eq!(errors.get("status")[0].kind, FieldErrorKind::Required);
    }

    #[test]
    fn unknown_status_is_a_format_error() {
        let all = statuses();
        let mut data = valid_data();
        data.insert("status".into(), "42".into());
        let errors = bind_submission(&data, &all, all.first()).unwrap_err();
        assert_eq!(errors.get("status")[0].kind, FieldErrorKind::Format);
    }

    #[test]
    fn required_fields_are_reported_per_field() {
        let all = statuses();
        let data: FormData = [("name".to_string(), "   ".to_string())].into();
        let errors = bind_submission(&data, &all, all.first()).unwrap_err();
        for field in ["inn", "name", "consumed_items", "problematic", "note"] {
            assert_eq!(
                errors.get(field)[0].kind,
                FieldErrorKind::Required,
                "{field}"
            );
        }
        assert!(!errors.contains("status"));
        assert!(!errors.contains("phone"));
    }

    #[test]
    fn malformed_values_are_format_errors() {
        let all = statuses();
        let mut data = valid_data();
        data.insert("inn".into(), "1234567890".into());
        data.insert("total_volume".into(), "many".into());
        data.insert("source".into(), "radio".into());
        data.insert("purchase_method".into(), "tender".into());
        data.insert("phone".into(), "+7 900".into());
        data.insert("email".into(), "not-an-email".into());
        data.insert("birthdate".into(), "17.05.1980".into());
        let errors = bind_submission(&data, &all, all.first()).unwrap_err();
        for field in ["inn", "total_volume", "source", "email", "birthdate"] {
            assert_eq!(errors.get(field)[0].kind, FieldErrorKind::Format, "{field}");
        }
        assert!(!errors.contains("purchase_method"));
        assert!(!errors.contains("phone"));
    }

    #[test]
    fn decision_maker_requires_phone_once_started() {
        let all = statuses();
        let mut data = valid_data();
        data.insert("last_name".into(), "Петров".into());
        let errors = bind_submission(&data, &all, all.first()).unwrap_err();
        assert_eq!(errors.get("phone")[0].kind, FieldErrorKind::Required);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn overlong_names_are_rejected() {
        let all = statuses();
        let mut data = valid_data();
        data.insert("phone".into(), "+7 900 000-00-00".into());
        data.insert("first_name".into(), "я".repeat(71));
        let errors = bind_submission(&data, &all, all.first()).unwrap_err();
        assert!(errors.contains("first_name"));
    }

    #[test]
    fn errors_are_rendered_next_to_their_fields() {
        let all = statuses();
        let mut data = valid_data();
        data.insert("inn".into(), "123".into());
        let errors = bind_submission(&data, &all, all.first()).unwrap_err();
        let view = assemble_customer_form(&all, all.first(), &data, &errors);
        assert!(view.has_errors());
        let inn = view.field("inn").unwrap();
        assert_eq!(inn.value.as_deref(), Some("123"));
        assert_eq!(inn.errors.len(), 1);
        assert!(view.field("name").unwrap().errors.is_empty());
        assert_eq!(view.field("name").unwrap().value.as_deref(), Some("ООО Ромашка"));
    }
}
