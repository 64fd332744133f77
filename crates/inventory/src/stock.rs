//! Stock bookkeeping after a sale.

use std::collections::BTreeMap;

use optica_core::{ArticleId, DomainError};

use crate::article::Article;
use crate::gateway::ArticlePatch;

/// Stock update owed to inventory for one sold article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    pub article_id: ArticleId,
    pub sold: u32,
    pub remaining: u32,
}

impl StockDecrement {
    pub fn patch(&self) -> ArticlePatch {
        ArticlePatch::stock(self.remaining)
    }
}

/// Compute the stock left for every article sold in an order.
///
/// `sold` lists `(article snapshot, quantity)` pairs across the order and all
/// of its sub-orders; the same article may appear more than once and its
/// quantities are summed. Selling more than the snapshot's stock violates the
/// clamp invariant enforced while building the order.
pub fn plan_stock_decrements<'a, I>(sold: I) -> Result<Vec<StockDecrement>, DomainError>
where
    I: IntoIterator<Item = (&'a Article, u32)>,
{
    let mut totals: BTreeMap<&ArticleId, (u32, u32)> = BTreeMap::new();
    for (article, quantity) in sold {
        let entry = totals.entry(&article.id).or_insert((article.stock, 0));
        entry.1 = entry.1.saturating_add(quantity);
    }

    totals
        .into_iter()
        .map(|(id, (stock, sold))| {
            let remaining = stock.checked_sub(sold).ok_or_else(|| {
                DomainError::invariant(format!(
                    "article {id} sold {sold} with only {stock} in stock"
                ))
            })?;
            Ok(StockDecrement {
                article_id: id.clone(),
                sold,
                remaining,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn article(id: &str, stock: u32) -> Article {
        Article::new(ArticleId::new(id).unwrap(), id, dec!(10), stock)
    }

    #[test]
    fn quantities_of_the_same_article_are_summed() {
        let lens = article("lens", 10);
        let frame = article("frame", 1);

        let plan = plan_stock_decrements([(&lens, 2), (&frame, 1), (&lens, 3)]).unwrap();

        assert_eq!(plan.len(), 2);
        let lens_plan = plan.iter().find(|d| d.article_id.as_str() == "lens").unwrap();
        assert_eq!(lens_plan.sold, 5);
        assert_eq!(lens_plan.remaining, 5);
        assert_eq!(lens_plan.patch(), ArticlePatch::stock(5));
    }

    #[test]
    fn overselling_is_an_invariant_violation() {
        let frame = article("frame", 1);
        let err = plan_stock_decrements([(&frame, 2)]).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }
}
