//! Request and record shapes exchanged with the orders backend.
//!
//! Optional parts are `Option`s skipped when unset, so a request body only
//! carries what the operator actually filled in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use optica_core::{Amount, BenefitId, ClientId, DomainError, OrderId, ValueObject};

use crate::benefit::BenefitLedger;
use crate::form::OrderForm;
use crate::line::{OrderArticle, SubOrder};
use crate::prescription::PrescriptionRef;
use crate::state::OrderState;

/// Client data as typed into the order form; also the create-client body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetails {
    pub email: String,
    pub name: String,
    pub last_name: String,
    pub document: String,
    pub phone_number: String,
    pub address: String,
}

impl ClientDetails {
    /// Required fields with their user-facing labels.
    fn labelled_fields(&self) -> [(&'static str, &str); 6] {
        [
            ("Correo electrónico", self.email.as_str()),
            ("Nombre", self.name.as_str()),
            ("Apellido", self.last_name.as_str()),
            ("Documento", self.document.as_str()),
            ("Teléfono", self.phone_number.as_str()),
            ("Dirección", self.address.as_str()),
        ]
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name).trim().to_string()
    }
}

/// Stored client record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "_id")]
    pub id: ClientId,
    #[serde(flatten)]
    pub details: ClientDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Lab and frame details noted for the workshop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub shape: String,
    #[serde(default)]
    pub frame_type: String,
    #[serde(default)]
    pub caliber: String,
    #[serde(default)]
    pub bridge: String,
    #[serde(default)]
    pub major_diagonal: String,
    #[serde(default)]
    pub arc_height: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Billing {
    #[serde(default)]
    pub total: Amount,
    #[serde(default)]
    pub deposit: Amount,
    #[serde(default)]
    pub payment_type: String,
    #[serde(default)]
    pub cost: Amount,
    #[serde(default)]
    pub benefits: Vec<BenefitId>,
    #[serde(default)]
    pub balance: Amount,
    #[serde(default)]
    pub discount: Amount,
    #[serde(default)]
    pub payment_amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_type: Option<String>,
}

impl ValueObject for Billing {}

impl Billing {
    /// Billing block for the form's current figures.
    pub fn from_form(form: &OrderForm) -> Self {
        let pricing = form.pricing();
        let inputs = form.inputs();
        Self {
            total: pricing.total,
            deposit: inputs.deposit,
            payment_type: form.payment_type.clone().unwrap_or_default(),
            cost: pricing.cost,
            benefits: form.benefits().ids(),
            balance: pricing.balance,
            discount: inputs.discount,
            payment_amount: inputs.payment_amount,
            deposit_type: form.deposit_type.clone().filter(|d| !d.is_empty()),
        }
    }

    /// Resolve the applied benefit ids against the catalogue.
    pub fn ledger(&self, catalogue: &[crate::benefit::Benefit]) -> BenefitLedger {
        self.benefits
            .iter()
            .filter_map(|id| catalogue.iter().find(|b| &b.id == id).cloned())
            .collect()
    }
}

/// Body of a create or full update of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub client: ClientId,
    pub order_number: String,
    pub state: OrderState,
    pub billing: Billing,
    pub articles: Vec<OrderArticle>,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_orders: Option<Vec<SubOrder<PrescriptionRef>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<OrderDetails>,
}

impl OrderPayload {
    /// New order: always starts registered. Sub-orders and the doctor are
    /// only sent when lenses were sold.
    pub fn for_create(
        form: &OrderForm,
        client: ClientId,
        order_number: impl Into<String>,
        owner: impl Into<String>,
        sub_orders: Vec<SubOrder<PrescriptionRef>>,
    ) -> Self {
        let has_sub_orders = !sub_orders.is_empty();
        Self {
            client,
            order_number: order_number.into(),
            state: OrderState::Registered,
            billing: Billing::from_form(form),
            articles: form.articles().lines().to_vec(),
            owner: owner.into(),
            sub_orders: has_sub_orders.then_some(sub_orders),
            doctor: form
                .doctor
                .clone()
                .filter(|d| has_sub_orders && !d.is_empty()),
            details: form.details.clone(),
        }
    }

    /// Edit of a stored order: keeps its identity, state and owner and
    /// always sends the full sub-order list.
    pub fn for_update(
        form: &OrderForm,
        record: &OrderRecord,
        client: ClientId,
        sub_orders: Vec<SubOrder<PrescriptionRef>>,
    ) -> Self {
        Self {
            client,
            order_number: record.order_number.clone().unwrap_or_default(),
            state: record.state,
            billing: Billing::from_form(form),
            articles: form.articles().lines().to_vec(),
            owner: record.owner.clone().unwrap_or_default(),
            sub_orders: Some(sub_orders),
            doctor: None,
            details: form.details.clone().or_else(|| record.details.clone()),
        }
    }
}

/// Populated client embedded in an order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedClient {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ClientId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub document: String,
}

/// Order as returned by the backend.
///
/// Orders created before clients were stored separately carry `clientName`
/// and `document` directly instead of a `client`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<EmbeddedClient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    pub created_at: DateTime<Utc>,
    pub state: OrderState,
    #[serde(default)]
    pub billing: Billing,
    #[serde(default)]
    pub articles: Vec<OrderArticle>,
    #[serde(default)]
    pub sub_orders: Vec<SubOrder<PrescriptionRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<OrderDetails>,
}

/// Check the order can be submitted. Returns one error per problem, in
/// form order, so each can be reported to the operator.
pub fn validate_submission(client: &ClientDetails, form: &OrderForm) -> Vec<DomainError> {
    let mut problems: Vec<DomainError> = client
        .labelled_fields()
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| DomainError::empty_field(label))
        .collect();

    if form.payment_type.as_deref().is_none_or(|p| p.trim().is_empty()) {
        problems.push(DomainError::empty_field("Tipo de pago"));
    }
    if form.pricing().balance < Amount::ZERO {
        problems.push(DomainError::empty_field("Saldo"));
    }
    problems
}

/// Warning text for a submission problem.
pub fn submission_message(problem: &DomainError) -> String {
    match problem {
        DomainError::EmptyField(label) => format!("{label} no puede estar vacío"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::SaleKind;
    use crate::prescription::PrescriptionForm;
    use optica_core::{ArticleId, PrescriptionId};
    use optica_inventory::Article;
    use rust_decimal_macros::dec;

    fn client() -> ClientDetails {
        ClientDetails {
            email: "ana@correo.uy".to_string(),
            name: "Ana".to_string(),
            last_name: "Pérez".to_string(),
            document: "4.321.987-6".to_string(),
            phone_number: "099 123 456".to_string(),
            address: "Av. Italia 1234".to_string(),
        }
    }

    fn form_with_frame() -> OrderForm {
        let mut form = OrderForm::new();
        form.add_articles(
            SaleKind::Articles,
            &[Article::new(ArticleId::new("frame").unwrap(), "frame", dec!(3000), 1)],
            None,
            &PrescriptionForm::default(),
            "",
        )
        .unwrap();
        form.payment_type = Some("EFECTIVO".to_string());
        form
    }

    #[test]
    fn create_payload_omits_unset_optional_parts() {
        let form = form_with_frame();
        let payload = OrderPayload::for_create(
            &form,
            ClientId::new("c1").unwrap(),
            "A00042",
            "caja",
            Vec::new(),
        );

        let json = serde_json::to_value(&payload).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["state"], "REGISTERED");
        assert_eq!(obj["orderNumber"], "A00042");
        assert!(!obj.contains_key("subOrders"));
        assert!(!obj.contains_key("doctor"));
        assert!(!obj.contains_key("details"));
        assert!(!obj["billing"].as_object().unwrap().contains_key("depositType"));
        assert_eq!(obj["billing"]["cost"], 3000.0);
    }

    #[test]
    fn doctor_is_sent_only_with_sub_orders() {
        let mut form = form_with_frame();
        form.doctor = Some("Dra. Silva".to_string());
        form.deposit_type = Some("TARJETA".to_string());
        let sub_orders = vec![SubOrder {
            prescription: PrescriptionRef(PrescriptionId::new("p1").unwrap()),
            articles: Vec::new(),
        }];

        let payload = OrderPayload::for_create(
            &form,
            ClientId::new("c1").unwrap(),
            "A00042",
            "caja",
            sub_orders,
        );
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["doctor"], "Dra. Silva");
        assert_eq!(json["subOrders"][0]["prescription"], "p1");
        assert_eq!(json["billing"]["depositType"], "TARJETA");

        let without = OrderPayload::for_create(
            &form,
            ClientId::new("c1").unwrap(),
            "A00042",
            "caja",
            Vec::new(),
        );
        assert_eq!(without.doctor, None);
    }

    #[test]
    fn complete_submission_has_no_problems() {
        assert!(validate_submission(&client(), &form_with_frame()).is_empty());
    }

    #[test]
    fn empty_fields_are_reported_by_label() {
        let mut details = client();
        details.name = " ".to_string();
        details.address.clear();
        let mut form = form_with_frame();
        form.payment_type = None;

        let messages: Vec<String> = validate_submission(&details, &form)
            .iter()
            .map(submission_message)
            .collect();

        assert_eq!(
            messages,
            vec![
                "Nombre no puede estar vacío",
                "Dirección no puede estar vacío",
                "Tipo de pago no puede estar vacío",
            ]
        );
    }

    #[test]
    fn legacy_order_record_deserializes() {
        let json = r#"{
            "_id": "o1",
            "clientName": "Juan Gómez",
            "document": "1.234.567-8",
            "createdAt": "2024-03-01T12:00:00Z",
            "state": "FINISHED"
        }"#;

        let record: OrderRecord = serde_json::from_str(json).unwrap();

        assert!(record.client.is_none());
        assert_eq!(record.state, OrderState::Finished);
        assert!(record.articles.is_empty());
    }
}
