//! Orders collaborator contract.

use async_trait::async_trait;

use optica_core::{GatewayError, OrderId};

use crate::benefit::Benefit;
use crate::payload::{Client, ClientDetails, OrderPayload, OrderRecord};
use crate::prescription::{CreatedPrescription, PrescriptionDraft};
use crate::state::OrderState;

/// Backend order, client and prescription endpoints.
#[async_trait]
pub trait OrdersGateway: Send + Sync {
    async fn get_orders(&self) -> Result<Vec<OrderRecord>, GatewayError>;

    async fn get_order_by_id(&self, id: &OrderId) -> Result<OrderRecord, GatewayError>;

    /// Store a new order; returns its id.
    async fn create_order(&self, payload: &OrderPayload) -> Result<OrderId, GatewayError>;

    async fn update_order_state(&self, id: &OrderId, state: OrderState) -> Result<(), GatewayError>;

    async fn update_order_by_id(
        &self,
        id: &OrderId,
        payload: &OrderPayload,
    ) -> Result<(), GatewayError>;

    async fn delete_order(&self, id: &OrderId) -> Result<(), GatewayError>;

    async fn get_benefits(&self) -> Result<Vec<Benefit>, GatewayError>;

    async fn create_prescription(
        &self,
        payload: &PrescriptionDraft,
    ) -> Result<CreatedPrescription, GatewayError>;

    /// Look a client up by document; `None` when there is no such client.
    async fn get_client(&self, document: &str) -> Result<Option<Client>, GatewayError>;

    async fn create_client(&self, details: &ClientDetails) -> Result<Client, GatewayError>;
}
