//! Orders domain module.
//!
//! Order pricing (cost, benefits, total and balance), the order form that
//! keeps those figures current, the order board with its state transitions,
//! and the backend payloads and collaborator contract. Pure domain logic;
//! persistence and notifications are wired up in `optica-infra`.

pub mod benefit;
pub mod board;
pub mod card;
pub mod events;
pub mod form;
pub mod gateway;
pub mod line;
pub mod payload;
pub mod prescription;
pub mod pricing;
pub mod receipt;
pub mod state;

pub use benefit::{Benefit, BenefitError, BenefitLedger};
pub use board::{
    MoveOutcome, OrderBoard, SortOrder, Transition, delete_failure_message,
    delete_success_message,
};
pub use card::{OrderCard, elapsed_label, normalize_text};
pub use events::OrderEvent;
pub use form::{OrderForm, OrderFormError, SaleKind};
pub use gateway::OrdersGateway;
pub use line::{OrderArticle, OrderArticleList, SubOrder, clamp_to_stock, group_selection};
pub use payload::{
    Billing, Client, ClientDetails, EmbeddedClient, OrderDetails, OrderPayload, OrderRecord,
    submission_message, validate_submission,
};
pub use prescription::{
    Addition, CreatedPrescription, EyeData, EyePrescription, LensSelection, PrescriptionDraft,
    PrescriptionForm, PrescriptionRef,
};
pub use pricing::{Pricing, PricingInputs, recompute, update_cost};
pub use receipt::receipt_number;
pub use state::{Bucket, OrderState, is_notifiable_transition};
