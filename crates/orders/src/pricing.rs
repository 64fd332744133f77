//! Order pricing: cost from the lines, then total and balance.
//!
//! ```text
//! cost           = Σ price × quantity   (order lines + every sub-order line)
//! adjusted_total = cost − deposit − Σ active benefit discounts
//! total          = max(0, adjusted_total)
//! balance        = adjusted_total − payment_amount − discount
//! ```
//!
//! The balance is derived from the pre-floor `adjusted_total`, so a deposit
//! larger than the cost shows a zero total but a negative balance.

use serde::{Deserialize, Serialize};

use optica_core::{Amount, ValueObject};

use crate::benefit::BenefitLedger;
use crate::line::{OrderArticleList, SubOrder};

/// Operator-entered amounts that feed the recompute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInputs {
    pub cost: Amount,
    pub deposit: Amount,
    pub discount: Amount,
    pub payment_amount: Amount,
}

/// Derived order figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub cost: Amount,
    pub adjusted_total: Amount,
    pub total: Amount,
    pub balance: Amount,
}

impl ValueObject for PricingInputs {}
impl ValueObject for Pricing {}

/// Cost of every article in the order, including lens sub-orders.
pub fn update_cost<P>(articles: &OrderArticleList, sub_orders: &[SubOrder<P>]) -> Amount {
    articles.cost() + sub_orders.iter().map(SubOrder::cost).sum::<Amount>()
}

/// Derive total and balance. Pure; calling it again on the same inputs
/// yields the same figures.
pub fn recompute(inputs: &PricingInputs, benefits: &BenefitLedger) -> Pricing {
    let adjusted_total = inputs.cost - inputs.deposit - benefits.active_discount();
    Pricing {
        cost: inputs.cost,
        adjusted_total,
        total: adjusted_total.max(Amount::ZERO),
        balance: adjusted_total - inputs.payment_amount - inputs.discount,
    }
}
