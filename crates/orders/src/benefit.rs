//! Discount benefits applied to an order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use optica_core::{Amount, BenefitId, Entity, non_negative};

fn active() -> bool {
    true
}

/// Named discount from the benefit catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Benefit {
    #[serde(rename = "_id")]
    pub id: BenefitId,
    pub name: String,
    #[serde(default)]
    pub discounted_value: Amount,
    #[serde(default = "active")]
    pub is_active: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BenefitError {
    #[error("no benefit selected")]
    NotSelected,

    #[error("benefit '{name}' is already applied")]
    AlreadyApplied { name: String },

    #[error("discounted value must be non-negative (got {value})")]
    NegativeValue { value: Amount },
}

impl Entity for Benefit {
    type Id = BenefitId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl BenefitError {
    /// Warning shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            BenefitError::NotSelected => "Debes de seleccionar un beneficio".to_string(),
            BenefitError::AlreadyApplied { .. } => "Este beneficio ya esta aplicado".to_string(),
            BenefitError::NegativeValue { .. } => {
                "El valor del beneficio no puede ser negativo".to_string()
            }
        }
    }
}

/// Benefits applied to one order, unique by name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenefitLedger {
    entries: Vec<Benefit>,
}

impl BenefitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Benefit] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|b| b.name == name)
    }

    /// Apply a catalogue benefit as-is.
    pub fn add(&mut self, benefit: Option<Benefit>) -> Result<(), BenefitError> {
        let benefit = benefit.ok_or(BenefitError::NotSelected)?;
        self.push(benefit)
    }

    /// Apply a benefit with an operator-chosen discounted value.
    pub fn add_with_value(
        &mut self,
        benefit: Option<Benefit>,
        discounted_value: Amount,
    ) -> Result<(), BenefitError> {
        let mut benefit = benefit.ok_or(BenefitError::NotSelected)?;
        benefit.discounted_value = non_negative("discountedValue", discounted_value)
            .map_err(|_| BenefitError::NegativeValue {
                value: discounted_value,
            })?;
        self.push(benefit)
    }

    /// Remove the benefit named `name`, if applied.
    pub fn remove(&mut self, name: &str) -> Option<Benefit> {
        let index = self.entries.iter().position(|b| b.name == name)?;
        Some(self.entries.remove(index))
    }

    /// Sum of the discounted values of active benefits.
    pub fn active_discount(&self) -> Amount {
        self.entries
            .iter()
            .filter(|b| b.is_active)
            .map(|b| b.discounted_value)
            .sum()
    }

    pub fn ids(&self) -> Vec<BenefitId> {
        self.entries.iter().map(|b| b.id.clone()).collect()
    }

    /// Names joined for receipts ("Convenio + Promo").
    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .map(|b| b.name.as_str())
            .collect::<Vec<_>>()
            .join(" + ")
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn push(&mut self, benefit: Benefit) -> Result<(), BenefitError> {
        if self.contains(&benefit.name) {
            return Err(BenefitError::AlreadyApplied { name: benefit.name });
        }
        self.entries.push(benefit);
        Ok(())
    }
}

impl FromIterator<Benefit> for BenefitLedger {
    /// Rebuild from stored benefits; later duplicates by name are dropped.
    fn from_iter<I: IntoIterator<Item = Benefit>>(iter: I) -> Self {
        let mut ledger = Self::new();
        for benefit in iter {
            let _ = ledger.push(benefit);
        }
        ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn benefit(name: &str, value: Amount, is_active: bool) -> Benefit {
        Benefit {
            id: BenefitId::new(format!("b-{name}")).unwrap(),
            name: name.to_string(),
            discounted_value: value,
            is_active,
        }
    }

    #[test]
    fn distinct_benefits_keep_insertion_order() {
        let mut ledger = BenefitLedger::new();
        ledger.add(Some(benefit("Convenio", dec!(100), true))).unwrap();
        ledger.add(Some(benefit("Promo", dec!(50), true))).unwrap();

        let names: Vec<_> = ledger.entries().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Convenio", "Promo"]);
        assert_eq!(ledger.summary(), "Convenio + Promo");
    }

    #[test]
    fn duplicate_name_leaves_ledger_unchanged() {
        let mut ledger = BenefitLedger::new();
        ledger.add(Some(benefit("Convenio", dec!(100), true))).unwrap();
        let before = ledger.clone();

        let err = ledger.add(Some(benefit("Convenio", dec!(999), true))).unwrap_err();

        assert_eq!(ledger, before);
        assert_eq!(err.user_message(), "Este beneficio ya esta aplicado");
    }

    #[test]
    fn unset_benefit_is_a_warning() {
        let mut ledger = BenefitLedger::new();
        let err = ledger.add(None).unwrap_err();
        assert_eq!(err, BenefitError::NotSelected);
        assert_eq!(err.user_message(), "Debes de seleccionar un beneficio");
        assert!(ledger.is_empty());
    }

    #[test]
    fn override_value_replaces_catalogue_value() {
        let mut ledger = BenefitLedger::new();
        ledger
            .add_with_value(Some(benefit("Convenio", dec!(100), true)), dec!(80))
            .unwrap();
        assert_eq!(ledger.active_discount(), dec!(80));

        let err = ledger
            .add_with_value(Some(benefit("Promo", dec!(10), true)), dec!(-1))
            .unwrap_err();
        assert!(matches!(err, BenefitError::NegativeValue { .. }));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn only_active_benefits_discount() {
        let ledger: BenefitLedger = [
            benefit("Convenio", dec!(100), true),
            benefit("Vencido", dec!(40), false),
        ]
        .into_iter()
        .collect();

        assert_eq!(ledger.active_discount(), dec!(100));
    }

    #[test]
    fn remove_by_name() {
        let mut ledger = BenefitLedger::new();
        ledger.add(Some(benefit("Convenio", dec!(100), true))).unwrap();

        assert!(ledger.remove("Promo").is_none());
        assert_eq!(ledger.remove("Convenio").map(|b| b.name), Some("Convenio".to_string()));
        assert!(ledger.is_empty());
    }
}
