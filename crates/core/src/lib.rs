//! `optica-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, amounts and the error model shared by every Optica crate.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, GatewayError};
pub use id::{ArticleId, BenefitId, ClientId, OrderId, PrescriptionId, UserId};
pub use money::{Amount, non_negative};
pub use value_object::ValueObject;
