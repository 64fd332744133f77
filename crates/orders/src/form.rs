//! Order being built or edited at the counter.
//!
//! Every mutation updates the cost when lines change, recomputes total and
//! balance once, and publishes exactly one [`Pricing`] snapshot.

use std::collections::HashSet;

use thiserror::Error;

use optica_core::{Amount, ArticleId, DomainError, non_negative};
use optica_events::{EventBus, InMemoryEventBus, Subscription, TeardownToken};
use optica_inventory::Article;

use crate::benefit::{Benefit, BenefitError, BenefitLedger};
use crate::line::{OrderArticle, OrderArticleList, SubOrder, clamp_to_stock, group_selection};
use crate::payload::{Billing, OrderDetails};
use crate::prescription::{LensSelection, PrescriptionDraft, PrescriptionForm, PrescriptionRef};
use crate::pricing::{Pricing, PricingInputs, recompute, update_cost};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderFormError {
    #[error("no article selected")]
    NoArticlesSelected,

    #[error("no lens type selected")]
    NoLensType,

    #[error(transparent)]
    Benefit(#[from] BenefitError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl OrderFormError {
    /// Warning shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            OrderFormError::NoArticlesSelected => {
                "Debes de seleccionar al menos un articulo".to_string()
            }
            OrderFormError::NoLensType => "Debes de seleccionar un tipo de lente".to_string(),
            OrderFormError::Benefit(err) => err.user_message(),
            OrderFormError::Domain(err) => err.to_string(),
        }
    }
}

/// What kind of sale the selected articles belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleKind {
    /// Prescription lenses; the selection becomes a sub-order.
    Lenses,
    /// Anything else; the selection merges into the order lines.
    Articles,
}

#[derive(Debug, Default)]
pub struct OrderForm {
    articles: OrderArticleList,
    sub_orders: Vec<SubOrder>,
    /// Sub-orders already stored with the order being edited.
    stored_sub_orders: Vec<SubOrder<PrescriptionRef>>,
    benefits: BenefitLedger,
    inputs: PricingInputs,
    pricing: Pricing,
    pub payment_type: Option<String>,
    pub deposit_type: Option<String>,
    pub doctor: Option<String>,
    pub details: Option<OrderDetails>,
    snapshots: InMemoryEventBus<Pricing>,
}

impl OrderForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form for editing a stored order.
    pub fn for_edit(
        articles: Vec<OrderArticle>,
        stored_sub_orders: Vec<SubOrder<PrescriptionRef>>,
        benefits: BenefitLedger,
        billing: &Billing,
    ) -> Self {
        let mut form = Self {
            articles: articles.into(),
            stored_sub_orders,
            benefits,
            inputs: PricingInputs {
                cost: Amount::ZERO,
                deposit: billing.deposit,
                discount: billing.discount,
                payment_amount: billing.payment_amount,
            },
            payment_type: Some(billing.payment_type.clone()).filter(|p| !p.is_empty()),
            deposit_type: billing.deposit_type.clone().filter(|d| !d.is_empty()),
            ..Self::default()
        };
        form.refresh(true);
        form
    }

    pub fn pricing(&self) -> Pricing {
        self.pricing
    }

    pub fn inputs(&self) -> PricingInputs {
        self.inputs
    }

    pub fn articles(&self) -> &OrderArticleList {
        &self.articles
    }

    pub fn sub_orders(&self) -> &[SubOrder] {
        &self.sub_orders
    }

    pub fn stored_sub_orders(&self) -> &[SubOrder<PrescriptionRef>] {
        &self.stored_sub_orders
    }

    pub fn benefits(&self) -> &BenefitLedger {
        &self.benefits
    }

    /// Observe pricing snapshots until `teardown` fires.
    pub fn subscribe_pricing(&self, teardown: &TeardownToken) -> Subscription<Pricing> {
        self.snapshots.subscribe_until(teardown)
    }

    pub fn set_deposit(&mut self, deposit: Amount) -> Result<Pricing, OrderFormError> {
        self.inputs.deposit = non_negative("deposit", deposit)?;
        Ok(self.refresh(false))
    }

    pub fn set_discount(&mut self, discount: Amount) -> Result<Pricing, OrderFormError> {
        self.inputs.discount = non_negative("discount", discount)?;
        Ok(self.refresh(false))
    }

    pub fn set_payment_amount(&mut self, amount: Amount) -> Result<Pricing, OrderFormError> {
        self.inputs.payment_amount = non_negative("paymentAmount", amount)?;
        Ok(self.refresh(false))
    }

    /// Add the picked articles (one entry per unit).
    ///
    /// Quantities are clamped so the order never holds more of an article
    /// than its stock; articles with nothing left to sell are skipped.
    pub fn add_articles(
        &mut self,
        sale: SaleKind,
        selected: &[Article],
        lens: Option<LensSelection>,
        prescription: &PrescriptionForm,
        document: &str,
    ) -> Result<Pricing, OrderFormError> {
        if selected.is_empty() {
            return Err(OrderFormError::NoArticlesSelected);
        }

        match sale {
            SaleKind::Articles => {
                for line in group_selection(selected) {
                    let quantity = self.available(&line.article, line.quantity);
                    self.articles.add(&line.article, quantity);
                }
            }
            SaleKind::Lenses => {
                let lens = lens.ok_or(OrderFormError::NoLensType)?;
                let draft = PrescriptionDraft::for_lens(lens, prescription, document)?;

                let mut articles = Vec::new();
                for line in group_selection(selected) {
                    let quantity = self.available(&line.article, line.quantity);
                    if quantity > 0 {
                        articles.push(OrderArticle::new(line.article, quantity));
                    }
                }
                if articles.is_empty() {
                    tracing::debug!("lens selection out of stock; sub-order not created");
                } else {
                    self.sub_orders.push(SubOrder {
                        prescription: draft,
                        articles,
                    });
                }
            }
        }

        Ok(self.refresh(true))
    }

    /// Remove the selected articles from the order lines and every sub-order.
    /// Sub-orders left without articles are dropped.
    pub fn remove_selected(&mut self, ids: &HashSet<ArticleId>) -> Pricing {
        self.articles.remove(ids);
        for sub_order in &mut self.sub_orders {
            sub_order.articles.retain(|line| !ids.contains(line.id()));
        }
        self.sub_orders.retain(|s| !s.articles.is_empty());
        for sub_order in &mut self.stored_sub_orders {
            sub_order.articles.retain(|line| !ids.contains(line.id()));
        }
        self.stored_sub_orders.retain(|s| !s.articles.is_empty());

        self.refresh(true)
    }

    pub fn add_benefit(&mut self, benefit: Option<Benefit>) -> Result<Pricing, OrderFormError> {
        self.benefits.add(benefit)?;
        tracing::debug!(benefits = self.benefits.len(), "benefit applied");
        Ok(self.refresh(false))
    }

    /// Apply a benefit with an operator-chosen discounted value.
    pub fn add_benefit_with_value(
        &mut self,
        benefit: Option<Benefit>,
        discounted_value: Amount,
    ) -> Result<Pricing, OrderFormError> {
        self.benefits.add_with_value(benefit, discounted_value)?;
        tracing::debug!(benefits = self.benefits.len(), "benefit applied with custom value");
        Ok(self.refresh(false))
    }

    pub fn remove_benefit(&mut self, name: &str) -> Pricing {
        if self.benefits.remove(name).is_some() {
            tracing::debug!(benefit = name, "benefit removed");
        }
        self.refresh(true)
    }

    /// Every sold article with its quantity, across lines and sub-orders.
    pub fn sold_articles(&self) -> impl Iterator<Item = (&Article, u32)> {
        self.articles
            .lines()
            .iter()
            .chain(self.sub_orders.iter().flat_map(|s| s.articles.iter()))
            .chain(self.stored_sub_orders.iter().flat_map(|s| s.articles.iter()))
            .map(|line| (&line.article, line.quantity))
    }

    /// Clear everything back to an empty order.
    pub fn reset(&mut self) -> Pricing {
        self.articles.clear();
        self.sub_orders.clear();
        self.stored_sub_orders.clear();
        self.benefits.clear();
        self.inputs = PricingInputs::default();
        self.payment_type = None;
        self.deposit_type = None;
        self.doctor = None;
        self.details = None;
        self.refresh(true)
    }

    fn committed(&self, id: &ArticleId) -> u32 {
        self.articles.quantity_of(id)
            + self.sub_orders.iter().map(|s| s.quantity_of(id)).sum::<u32>()
            + self.stored_sub_orders.iter().map(|s| s.quantity_of(id)).sum::<u32>()
    }

    fn available(&self, article: &Article, requested: u32) -> u32 {
        let quantity = clamp_to_stock(article.stock, self.committed(&article.id), requested);
        if quantity < requested {
            tracing::debug!(
                article_id = %article.id,
                requested,
                added = quantity,
                stock = article.stock,
                "quantity clamped to stock"
            );
        }
        quantity
    }

    fn refresh(&mut self, lines_changed: bool) -> Pricing {
        if lines_changed {
            self.inputs.cost = update_cost(&self.articles, &self.sub_orders)
                + self.stored_sub_orders.iter().map(SubOrder::cost).sum::<Amount>();
        }
        self.pricing = recompute(&self.inputs, &self.benefits);
        if self.snapshots.publish(self.pricing).is_err() {
            tracing::warn!("pricing bus lock poisoned; snapshot not published");
        }
        self.pricing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optica_core::BenefitId;
    use optica_events::Teardown;
    use rust_decimal_macros::dec;

    fn article(id: &str, price: Amount, stock: u32) -> Article {
        Article::new(ArticleId::new(id).unwrap(), id, price, stock)
    }

    fn benefit(name: &str, value: Amount) -> Benefit {
        Benefit {
            id: BenefitId::new(format!("b-{name}")).unwrap(),
            name: name.to_string(),
            discounted_value: value,
            is_active: true,
        }
    }

    fn add(form: &mut OrderForm, selected: &[Article]) -> Result<Pricing, OrderFormError> {
        form.add_articles(SaleKind::Articles, selected, None, &PrescriptionForm::default(), "")
    }

    #[test]
    fn each_mutation_publishes_one_snapshot() {
        let teardown = Teardown::new();
        let mut form = OrderForm::new();
        let sub = form.subscribe_pricing(&teardown.token());

        add(&mut form, &[article("frame", dec!(1000), 2)]).unwrap();
        form.set_deposit(dec!(200)).unwrap();
        form.add_benefit(Some(benefit("Convenio", dec!(100)))).unwrap();
        form.set_discount(dec!(50)).unwrap();
        form.set_payment_amount(dec!(300)).unwrap();

        let snapshots = sub.drain();
        assert_eq!(snapshots.len(), 5);
        let last = snapshots[4];
        assert_eq!(last.cost, dec!(1000));
        assert_eq!(last.total, dec!(700));
        assert_eq!(last.balance, dec!(350));
    }

    #[test]
    fn rejected_mutations_publish_nothing() {
        let teardown = Teardown::new();
        let mut form = OrderForm::new();
        form.add_benefit(Some(benefit("Convenio", dec!(100)))).unwrap();
        let sub = form.subscribe_pricing(&teardown.token());

        assert_eq!(add(&mut form, &[]), Err(OrderFormError::NoArticlesSelected));
        let dup = form.add_benefit(Some(benefit("Convenio", dec!(5)))).unwrap_err();
        assert_eq!(dup.user_message(), "Este beneficio ya esta aplicado");
        assert!(form.set_deposit(dec!(-1)).is_err());

        assert!(sub.drain().is_empty());
        assert_eq!(form.benefits().len(), 1);
    }

    #[test]
    fn increment_at_stock_is_a_no_op() {
        let frame = article("frame", dec!(300), 1);
        let mut form = OrderForm::new();

        add(&mut form, &[frame.clone()]).unwrap();
        let pricing = add(&mut form, &[frame.clone()]).unwrap();

        assert_eq!(form.articles().quantity_of(&frame.id), 1);
        assert_eq!(pricing.cost, dec!(300));
    }

    #[test]
    fn new_entry_is_clamped_to_stock() {
        let lens = article("lens", dec!(100), 2);
        let mut form = OrderForm::new();

        add(&mut form, &[lens.clone(), lens.clone(), lens.clone()]).unwrap();

        assert_eq!(form.articles().quantity_of(&lens.id), 2);
    }

    #[test]
    fn lens_sale_requires_a_lens_type() {
        let mut form = OrderForm::new();
        let err = form
            .add_articles(
                SaleKind::Lenses,
                &[article("lens", dec!(100), 4)],
                None,
                &PrescriptionForm::default(),
                "123",
            )
            .unwrap_err();

        assert_eq!(err.user_message(), "Debes de seleccionar un tipo de lente");
        assert!(form.sub_orders().is_empty());
    }

    #[test]
    fn lens_sale_creates_sub_order_counted_in_cost() {
        let lens = article("lens", dec!(1250), 4);
        let mut form = OrderForm::new();
        add(&mut form, &[article("frame", dec!(3000), 1)]).unwrap();

        let pricing = form
            .add_articles(
                SaleKind::Lenses,
                &[lens.clone(), lens.clone()],
                Some(LensSelection::MonofocalFar),
                &PrescriptionForm::default(),
                "4.321.987-6",
            )
            .unwrap();

        assert_eq!(form.sub_orders().len(), 1);
        assert_eq!(form.sub_orders()[0].prescription.document, "4.321.987-6");
        assert!(form.sub_orders()[0].prescription.far.is_some());
        assert_eq!(pricing.cost, dec!(5500));
    }

    #[test]
    fn sub_order_quantities_count_against_stock() {
        let lens = article("lens", dec!(100), 2);
        let mut form = OrderForm::new();
        add(&mut form, &[lens.clone()]).unwrap();

        form.add_articles(
            SaleKind::Lenses,
            &[lens.clone(), lens.clone()],
            Some(LensSelection::MonofocalNear),
            &PrescriptionForm::default(),
            "1",
        )
        .unwrap();

        assert_eq!(form.sub_orders()[0].articles[0].quantity, 1);
        let sold: u32 = form.sold_articles().map(|(_, q)| q).sum();
        assert_eq!(sold, 2);
    }

    #[test]
    fn remove_selected_drops_emptied_sub_orders() {
        let lens = article("lens", dec!(100), 4);
        let frame = article("frame", dec!(300), 1);
        let mut form = OrderForm::new();
        add(&mut form, &[frame.clone()]).unwrap();
        form.add_articles(
            SaleKind::Lenses,
            &[lens.clone()],
            Some(LensSelection::Bifocal),
            &PrescriptionForm::default(),
            "1",
        )
        .unwrap();

        let pricing = form.remove_selected(&HashSet::from([lens.id.clone()]));

        assert!(form.sub_orders().is_empty());
        assert_eq!(pricing.cost, dec!(300));
    }

    #[test]
    fn removing_a_benefit_restores_the_total() {
        let mut form = OrderForm::new();
        add(&mut form, &[article("frame", dec!(500), 1)]).unwrap();
        form.add_benefit_with_value(Some(benefit("Convenio", dec!(100))), dec!(150))
            .unwrap();
        assert_eq!(form.pricing().total, dec!(350));

        let pricing = form.remove_benefit("Convenio");
        assert_eq!(pricing.total, dec!(500));
    }
}
