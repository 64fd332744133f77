//! In-memory collaborators.
//!
//! Backed by a `Mutex`, they record every call so tests can assert on what
//! the workflows asked of the backend, and can be told to fail a given
//! operation.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use optica_core::{ArticleId, ClientId, GatewayError, OrderId, PrescriptionId};
use optica_inventory::{Article, ArticlePage, ArticlePatch, ArticleQuery, InventoryGateway};
use optica_orders::{
    Benefit, Client, ClientDetails, CreatedPrescription, EmbeddedClient, OrderPayload, OrderRecord,
    OrderState, OrdersGateway, PrescriptionDraft, normalize_text,
};
use optica_toast::{Notifier, ToastKind, ToastRequest};

fn rejected(operation: &str) -> GatewayError {
    GatewayError::Rejected {
        status: 500,
        message: format!("{operation} failed"),
    }
}

/// A call received by [`InMemoryOrdersGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrdersCall {
    GetOrders,
    GetOrderById(OrderId),
    CreateOrder(OrderPayload),
    UpdateOrderState(OrderId, OrderState),
    UpdateOrderById(OrderId, OrderPayload),
    DeleteOrder(OrderId),
    GetBenefits,
    CreatePrescription(PrescriptionDraft),
    GetClient(String),
    CreateClient(ClientDetails),
}

impl OrdersCall {
    fn operation(&self) -> &'static str {
        match self {
            OrdersCall::GetOrders => "get_orders",
            OrdersCall::GetOrderById(_) => "get_order_by_id",
            OrdersCall::CreateOrder(_) => "create_order",
            OrdersCall::UpdateOrderState(..) => "update_order_state",
            OrdersCall::UpdateOrderById(..) => "update_order_by_id",
            OrdersCall::DeleteOrder(_) => "delete_order",
            OrdersCall::GetBenefits => "get_benefits",
            OrdersCall::CreatePrescription(_) => "create_prescription",
            OrdersCall::GetClient(_) => "get_client",
            OrdersCall::CreateClient(_) => "create_client",
        }
    }
}

#[derive(Debug, Default)]
struct OrdersData {
    orders: Vec<OrderRecord>,
    benefits: Vec<Benefit>,
    clients: Vec<Client>,
    prescriptions: Vec<(PrescriptionId, PrescriptionDraft)>,
    calls: Vec<OrdersCall>,
    failing: HashSet<&'static str>,
    failing_once: HashSet<&'static str>,
}

#[derive(Debug, Default)]
pub struct InMemoryOrdersGateway {
    data: Mutex<OrdersData>,
}

impl InMemoryOrdersGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(self, orders: Vec<OrderRecord>) -> Self {
        self.edit(|d| d.orders = orders);
        self
    }

    pub fn with_benefits(self, benefits: Vec<Benefit>) -> Self {
        self.edit(|d| d.benefits = benefits);
        self
    }

    pub fn with_clients(self, clients: Vec<Client>) -> Self {
        self.edit(|d| d.clients = clients);
        self
    }

    /// Make every later call of `operation` (e.g. `"delete_order"`) fail.
    pub fn fail_on(&self, operation: &'static str) {
        self.edit(|d| {
            d.failing.insert(operation);
        });
    }

    /// Make only the next call of `operation` fail.
    pub fn fail_once(&self, operation: &'static str) {
        self.edit(|d| {
            d.failing_once.insert(operation);
        });
    }

    pub fn calls(&self) -> Vec<OrdersCall> {
        self.read(|d| d.calls.clone())
    }

    pub fn orders(&self) -> Vec<OrderRecord> {
        self.read(|d| d.orders.clone())
    }

    pub fn clients(&self) -> Vec<Client> {
        self.read(|d| d.clients.clone())
    }

    pub fn prescriptions(&self) -> Vec<PrescriptionDraft> {
        self.read(|d| d.prescriptions.iter().map(|(_, p)| p.clone()).collect())
    }

    fn edit<R>(&self, f: impl FnOnce(&mut OrdersData) -> R) -> R {
        let mut guard = match self.data.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    fn read<R>(&self, f: impl FnOnce(&OrdersData) -> R) -> R {
        self.edit(|d| f(d))
    }

    /// Record `call`, then run `f` unless the operation was told to fail.
    fn handle<R>(
        &self,
        call: OrdersCall,
        f: impl FnOnce(&mut OrdersData) -> Result<R, GatewayError>,
    ) -> Result<R, GatewayError> {
        self.edit(|d| {
            let operation = call.operation();
            d.calls.push(call);
            if d.failing.contains(operation) || d.failing_once.remove(operation) {
                return Err(rejected(operation));
            }
            f(d)
        })
    }
}

#[async_trait]
impl OrdersGateway for InMemoryOrdersGateway {
    async fn get_orders(&self) -> Result<Vec<OrderRecord>, GatewayError> {
        self.handle(OrdersCall::GetOrders, |d| Ok(d.orders.clone()))
    }

    async fn get_order_by_id(&self, id: &OrderId) -> Result<OrderRecord, GatewayError> {
        self.handle(OrdersCall::GetOrderById(id.clone()), |d| {
            d.orders
                .iter()
                .find(|o| &o.id == id)
                .cloned()
                .ok_or_else(|| GatewayError::not_found(format!("order {id}")))
        })
    }

    async fn create_order(&self, payload: &OrderPayload) -> Result<OrderId, GatewayError> {
        self.handle(OrdersCall::CreateOrder(payload.clone()), |d| {
            let client = d
                .clients
                .iter()
                .find(|c| c.id == payload.client)
                .ok_or_else(|| GatewayError::not_found(format!("client {}", payload.client)))?;
            let id = OrderId::generate();
            d.orders.push(OrderRecord {
                id: id.clone(),
                order_number: Some(payload.order_number.clone()),
                client: Some(EmbeddedClient {
                    id: Some(client.id.clone()),
                    name: client.details.name.clone(),
                    last_name: client.details.last_name.clone(),
                    document: client.details.document.clone(),
                }),
                client_name: None,
                document: None,
                created_at: Utc::now(),
                state: payload.state,
                billing: payload.billing.clone(),
                articles: payload.articles.clone(),
                sub_orders: payload.sub_orders.clone().unwrap_or_default(),
                owner: Some(payload.owner.clone()),
                details: payload.details.clone(),
            });
            Ok(id)
        })
    }

    async fn update_order_state(&self, id: &OrderId, state: OrderState) -> Result<(), GatewayError> {
        self.handle(OrdersCall::UpdateOrderState(id.clone(), state), |d| {
            let order = d
                .orders
                .iter_mut()
                .find(|o| &o.id == id)
                .ok_or_else(|| GatewayError::not_found(format!("order {id}")))?;
            order.state = state;
            Ok(())
        })
    }

    async fn update_order_by_id(
        &self,
        id: &OrderId,
        payload: &OrderPayload,
    ) -> Result<(), GatewayError> {
        self.handle(OrdersCall::UpdateOrderById(id.clone(), payload.clone()), |d| {
            let order = d
                .orders
                .iter_mut()
                .find(|o| &o.id == id)
                .ok_or_else(|| GatewayError::not_found(format!("order {id}")))?;
            order.billing = payload.billing.clone();
            order.articles = payload.articles.clone();
            order.sub_orders = payload.sub_orders.clone().unwrap_or_default();
            order.details = payload.details.clone();
            Ok(())
        })
    }

    async fn delete_order(&self, id: &OrderId) -> Result<(), GatewayError> {
        self.handle(OrdersCall::DeleteOrder(id.clone()), |d| {
            let before = d.orders.len();
            d.orders.retain(|o| &o.id != id);
            if d.orders.len() == before {
                return Err(GatewayError::not_found(format!("order {id}")));
            }
            Ok(())
        })
    }

    async fn get_benefits(&self) -> Result<Vec<Benefit>, GatewayError> {
        self.handle(OrdersCall::GetBenefits, |d| Ok(d.benefits.clone()))
    }

    async fn create_prescription(
        &self,
        payload: &PrescriptionDraft,
    ) -> Result<CreatedPrescription, GatewayError> {
        self.handle(OrdersCall::CreatePrescription(payload.clone()), |d| {
            let id = PrescriptionId::generate();
            d.prescriptions.push((id.clone(), payload.clone()));
            Ok(CreatedPrescription { id })
        })
    }

    async fn get_client(&self, document: &str) -> Result<Option<Client>, GatewayError> {
        self.handle(OrdersCall::GetClient(document.to_string()), |d| {
            Ok(d.clients
                .iter()
                .find(|c| c.details.document == document)
                .cloned())
        })
    }

    async fn create_client(&self, details: &ClientDetails) -> Result<Client, GatewayError> {
        self.handle(OrdersCall::CreateClient(details.clone()), |d| {
            if d.clients.iter().any(|c| c.details.document == details.document) {
                return Err(GatewayError::Rejected {
                    status: 409,
                    message: format!("client {} already exists", details.document),
                });
            }
            let client = Client {
                id: ClientId::generate(),
                details: details.clone(),
                created_at: Some(Utc::now()),
            };
            d.clients.push(client.clone());
            Ok(client)
        })
    }
}

#[derive(Debug, Default)]
struct InventoryData {
    articles: Vec<Article>,
    patches: Vec<(ArticleId, ArticlePatch)>,
    failing: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryInventoryGateway {
    data: Mutex<InventoryData>,
}

impl InMemoryInventoryGateway {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            data: Mutex::new(InventoryData {
                articles,
                ..InventoryData::default()
            }),
        }
    }

    /// Make every later call fail.
    pub fn fail(&self) {
        self.edit(|d| d.failing = true);
    }

    pub fn article(&self, id: &ArticleId) -> Option<Article> {
        self.edit(|d| d.articles.iter().find(|a| &a.id == id).cloned())
    }

    /// Patches received, in call order.
    pub fn patches(&self) -> Vec<(ArticleId, ArticlePatch)> {
        self.edit(|d| d.patches.clone())
    }

    fn edit<R>(&self, f: impl FnOnce(&mut InventoryData) -> R) -> R {
        let mut guard = match self.data.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[async_trait]
impl InventoryGateway for InMemoryInventoryGateway {
    async fn get_articles(&self, query: &ArticleQuery) -> Result<ArticlePage, GatewayError> {
        self.edit(|d| {
            if d.failing {
                return Err(rejected("get_articles"));
            }
            let term = query.query.as_deref().map(normalize_text);
            let filters = query.filters.clone().unwrap_or_default();

            let matching: Vec<&Article> = d
                .articles
                .iter()
                .filter(|a| {
                    term.as_deref()
                        .is_none_or(|t| normalize_text(&a.name).contains(t))
                })
                .filter(|a| filters.article_type.is_none_or(|t| a.is_type(t)))
                .filter(|a| {
                    filters
                        .brand
                        .as_deref()
                        .is_none_or(|b| a.brand.as_deref() == Some(b))
                })
                .filter(|a| filters.lens_type.is_none_or(|t| a.lens_type == Some(t)))
                .filter(|a| filters.is_sunglasses.is_none_or(|s| a.is_sunglasses == s))
                .collect();

            let size = query.page_size.max(1) as usize;
            let start = (query.page.max(1) as usize - 1) * size;
            Ok(ArticlePage {
                total: matching.len() as u64,
                data: matching.into_iter().skip(start).take(size).cloned().collect(),
            })
        })
    }

    async fn update_article(
        &self,
        id: &ArticleId,
        patch: &ArticlePatch,
    ) -> Result<Article, GatewayError> {
        self.edit(|d| {
            d.patches.push((id.clone(), patch.clone()));
            if d.failing {
                return Err(rejected("update_article"));
            }
            let article = d
                .articles
                .iter_mut()
                .find(|a| &a.id == id)
                .ok_or_else(|| GatewayError::not_found(format!("article {id}")))?;
            patch.apply_to(article);
            Ok(article.clone())
        })
    }
}

/// Notifier that keeps every toast request instead of showing it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<ToastRequest>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<ToastRequest> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Messages of the toasts of `kind`, in order.
    pub fn messages(&self, kind: ToastKind) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn show_toast(&self, request: ToastRequest) {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push(request);
        }
    }
}
