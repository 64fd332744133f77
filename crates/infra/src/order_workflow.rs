//! Order submission and edit flows against the backend collaborators.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use futures::future::join_all;

use optica_auth::AuthzError;
use optica_core::{Amount, ClientId, OrderId};
use optica_events::{StateCell, Subscription, Teardown, TeardownToken};
use optica_inventory::{
    Article, ArticleFilters, ArticlePage, ArticleQuery, StockDecrement, plan_stock_decrements,
};
use optica_orders::{
    Benefit, Client, ClientDetails, LensSelection, OrderEvent, OrderForm, OrderFormError,
    OrderPayload, OrderRecord, PrescriptionForm, PrescriptionRef, Pricing, SaleKind, SubOrder,
    receipt_number, submission_message, validate_submission,
};

use crate::app_state::AppState;
use crate::debounce::Debouncer;

pub struct OrderWorkflow {
    app: Arc<AppState>,
    found_client: Arc<StateCell<Option<Client>>>,
    document_lookup: Debouncer<String>,
    teardown: Teardown,
}

impl std::fmt::Debug for OrderWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderWorkflow")
            .field("document_lookup", &self.document_lookup)
            .finish_non_exhaustive()
    }
}

impl OrderWorkflow {
    pub fn new(app: Arc<AppState>) -> Self {
        let teardown = Teardown::new();
        let found_client = Arc::new(StateCell::new(None));

        let orders = Arc::clone(&app.orders);
        let found = Arc::clone(&found_client);
        let document_lookup = Debouncer::new(
            app.config.document_debounce,
            teardown.token(),
            move |document: String| {
                if document.is_empty() {
                    if found.set(None).is_err() {
                        tracing::warn!("client lookup state poisoned");
                    }
                    return;
                }
                let orders = Arc::clone(&orders);
                let found = Arc::clone(&found);
                tokio::spawn(async move {
                    match orders.get_client(&document).await {
                        Ok(client) => {
                            if found.set(client).is_err() {
                                tracing::warn!("client lookup state poisoned");
                            }
                        }
                        Err(err) => tracing::warn!(%document, error = %err, "client lookup failed"),
                    }
                });
            },
        );

        Self {
            app,
            found_client,
            document_lookup,
            teardown,
        }
    }

    /// Look a client up by document right away.
    pub async fn lookup_client(&self, document: &str) -> anyhow::Result<Option<Client>> {
        self.app
            .orders
            .get_client(document.trim())
            .await
            .with_context(|| format!("looking up client {document}"))
    }

    /// Feed the document field; the client is looked up once typing pauses.
    /// A cleared field drops any pending lookup and forgets the found client.
    pub fn type_document(&self, document: &str) {
        self.document_lookup.push(document.trim().to_string());
    }

    /// Client found by the last debounced document lookup.
    pub fn found_client(&self) -> Option<Client> {
        self.found_client.get()
    }

    pub fn subscribe_found_client(&self, teardown: &TeardownToken) -> Subscription<Option<Client>> {
        self.found_client.subscribe_until(teardown)
    }

    /// Benefits the operator can apply.
    pub async fn load_benefits(&self) -> anyhow::Result<Vec<Benefit>> {
        let benefits = self.app.orders.get_benefits().await.context("loading benefits")?;
        Ok(benefits.into_iter().filter(|b| b.is_active).collect())
    }

    /// One page of the article picker.
    pub async fn browse_articles(
        &self,
        page: u32,
        query: &str,
        filters: Option<ArticleFilters>,
    ) -> anyhow::Result<ArticlePage> {
        let mut request = ArticleQuery::page(page, self.app.config.inventory_page_size).with_query(query);
        if let Some(filters) = filters {
            request = request.with_filters(filters);
        }
        self.app
            .inventory
            .get_articles(&request)
            .await
            .context("browsing articles")
    }

    /// Add the picker selection to the form.
    ///
    /// A rejected selection warns the operator and returns `None`.
    pub fn add_selection(
        &self,
        form: &mut OrderForm,
        sale: SaleKind,
        selected: &[Article],
        lens: Option<LensSelection>,
        prescription: &PrescriptionForm,
        document: &str,
    ) -> Option<Pricing> {
        self.warn_rejected(form.add_articles(sale, selected, lens, prescription, document))
    }

    /// Apply the chosen benefit at its catalogue value.
    pub fn apply_benefit(&self, form: &mut OrderForm, benefit: Option<Benefit>) -> Option<Pricing> {
        self.warn_rejected(form.add_benefit(benefit))
    }

    /// Apply the chosen benefit with an operator-entered discounted value.
    pub fn apply_benefit_with_value(
        &self,
        form: &mut OrderForm,
        benefit: Option<Benefit>,
        discounted_value: Amount,
    ) -> Option<Pricing> {
        self.warn_rejected(form.add_benefit_with_value(benefit, discounted_value))
    }

    /// Submit a new order with a fresh receipt number.
    ///
    /// Returns `Ok(None)` when the order was not sent because the form
    /// failed validation; the operator has already been warned.
    pub async fn submit(
        &self,
        form: &mut OrderForm,
        client: &ClientDetails,
    ) -> anyhow::Result<Option<OrderId>> {
        let order_number = receipt_number(&mut rand::thread_rng());
        self.submit_numbered(form, client, &order_number).await
    }

    /// Submit a new order under `order_number`.
    ///
    /// On success the form is reset. A failed stock update after the order
    /// was stored is logged and does not fail the submission.
    pub async fn submit_numbered(
        &self,
        form: &mut OrderForm,
        client: &ClientDetails,
        order_number: &str,
    ) -> anyhow::Result<Option<OrderId>> {
        if !self.validate(client, form) {
            return Ok(None);
        }
        let Some(owner) = self.owner() else {
            return Ok(None);
        };

        let decrements = match plan_stock_decrements(form.sold_articles()) {
            Ok(decrements) => decrements,
            Err(err) => {
                tracing::warn!(order_number, error = %err, "order oversells stock");
                self.app.notifier.error("Error al crear orden");
                return Err(err.into());
            }
        };

        let id = match self.create(form, client, order_number, owner).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(order_number, error = %format!("{err:#}"), "order creation failed");
                self.app.notifier.error("Error al crear orden");
                return Err(err);
            }
        };

        self.apply_stock(&decrements).await;

        tracing::info!(order_id = %id, order_number, "order created");
        self.app.publish(OrderEvent::OrderCreated {
            order_id: id.clone(),
            occurred_at: Utc::now(),
        });
        self.app.notifier.success("Orden creada con éxito");
        form.reset();

        Ok(Some(id))
    }

    /// Fetch a stored order and build the edit form for it.
    pub async fn load_for_edit(&self, id: &OrderId) -> anyhow::Result<(OrderRecord, OrderForm)> {
        let record = self
            .app
            .orders
            .get_order_by_id(id)
            .await
            .with_context(|| format!("loading order {id}"))?;
        let catalogue = self.app.orders.get_benefits().await.context("loading benefits")?;

        let mut form = OrderForm::for_edit(
            record.articles.clone(),
            record.sub_orders.clone(),
            record.billing.ledger(&catalogue),
            &record.billing,
        );
        form.details = record.details.clone();

        Ok((record, form))
    }

    /// Store the edited order. Stock is left untouched.
    ///
    /// Returns `Ok(false)` when validation failed.
    pub async fn update(
        &self,
        record: &OrderRecord,
        form: &OrderForm,
        client: &ClientDetails,
    ) -> anyhow::Result<bool> {
        if !self.validate(client, form) {
            return Ok(false);
        }

        match self.store_update(record, form, client).await {
            Ok(()) => {
                tracing::info!(order_id = %record.id, "order updated");
                self.app.publish(OrderEvent::OrderUpdated {
                    order_id: record.id.clone(),
                    occurred_at: Utc::now(),
                });
                self.app.notifier.success("Orden actualizada con éxito");
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(order_id = %record.id, error = %format!("{err:#}"), "order update failed");
                self.app.notifier.error("Error al actualizar orden");
                Err(err)
            }
        }
    }

    /// End pending lookups; called when the form goes away.
    pub fn teardown(&self) {
        self.document_lookup.cancel();
        self.teardown.fire();
    }

    fn warn_rejected(&self, result: Result<Pricing, OrderFormError>) -> Option<Pricing> {
        match result {
            Ok(pricing) => Some(pricing),
            Err(err) => {
                tracing::debug!(error = %err, "form change rejected");
                self.app.notifier.warning(&err.user_message());
                None
            }
        }
    }

    fn validate(&self, client: &ClientDetails, form: &OrderForm) -> bool {
        let problems = validate_submission(client, form);
        for problem in &problems {
            self.app.notifier.warning(&submission_message(problem));
        }
        if !problems.is_empty() {
            tracing::debug!(problems = problems.len(), "order submission rejected");
        }
        problems.is_empty()
    }

    fn owner(&self) -> Option<String> {
        match self.app.current_user() {
            Some(user) => Some(user.username),
            None => {
                self.app.notifier.warning(AuthzError::NotSignedIn.user_message());
                None
            }
        }
    }

    async fn create(
        &self,
        form: &OrderForm,
        client: &ClientDetails,
        order_number: &str,
        owner: String,
    ) -> anyhow::Result<OrderId> {
        let sub_orders = self.store_prescriptions(form.sub_orders()).await?;
        let client_id = self.resolve_client(client).await?;
        let payload = OrderPayload::for_create(form, client_id, order_number, owner, sub_orders);

        self.app
            .orders
            .create_order(&payload)
            .await
            .context("creating order")
    }

    async fn store_update(
        &self,
        record: &OrderRecord,
        form: &OrderForm,
        client: &ClientDetails,
    ) -> anyhow::Result<()> {
        let mut sub_orders = form.stored_sub_orders().to_vec();
        sub_orders.extend(self.store_prescriptions(form.sub_orders()).await?);

        let client_id = match record.client.as_ref().and_then(|c| c.id.clone()) {
            Some(id) => id,
            None => self.resolve_client(client).await?,
        };
        let payload = OrderPayload::for_update(form, record, client_id, sub_orders);

        self.app
            .orders
            .update_order_by_id(&record.id, &payload)
            .await
            .with_context(|| format!("updating order {}", record.id))
    }

    /// Store every sub-order prescription concurrently and swap the drafts
    /// for the returned ids.
    async fn store_prescriptions(
        &self,
        drafts: &[SubOrder],
    ) -> anyhow::Result<Vec<SubOrder<PrescriptionRef>>> {
        let created = join_all(
            drafts
                .iter()
                .map(|sub_order| self.app.orders.create_prescription(&sub_order.prescription)),
        )
        .await;

        drafts
            .iter()
            .zip(created)
            .map(|(sub_order, created)| {
                let created = created.context("storing prescription")?;
                Ok(sub_order.clone().with_prescription(PrescriptionRef(created.id)))
            })
            .collect()
    }

    async fn resolve_client(&self, details: &ClientDetails) -> anyhow::Result<ClientId> {
        if let Some(client) = self.lookup_client(&details.document).await? {
            return Ok(client.id);
        }
        let client = self
            .app
            .orders
            .create_client(details)
            .await
            .with_context(|| format!("creating client {}", details.document))?;
        tracing::info!(client_id = %client.id, "client created");
        Ok(client.id)
    }

    async fn apply_stock(&self, decrements: &[StockDecrement]) {
        let results = join_all(decrements.iter().map(|decrement| async move {
            let patch = decrement.patch();
            self.app
                .inventory
                .update_article(&decrement.article_id, &patch)
                .await
        }))
        .await;

        for (decrement, result) in decrements.iter().zip(results) {
            if let Err(err) = result {
                tracing::warn!(
                    article_id = %decrement.article_id,
                    remaining = decrement.remaining,
                    error = %err,
                    "stock not updated after sale"
                );
            }
        }
    }
}

impl Drop for OrderWorkflow {
    fn drop(&mut self) {
        self.teardown();
    }
}
