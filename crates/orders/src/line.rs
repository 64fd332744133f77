//! Order lines: the articles sold in an order and its prescription sub-orders.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use optica_core::{Amount, ArticleId};
use optica_inventory::Article;

use crate::prescription::PrescriptionDraft;

fn one() -> u32 {
    1
}

/// An article snapshot together with the quantity sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderArticle {
    pub article: Article,
    /// Older backend records omit the quantity; those lines count as one unit.
    #[serde(default = "one")]
    pub quantity: u32,
}

impl OrderArticle {
    pub fn new(article: Article, quantity: u32) -> Self {
        Self { article, quantity }
    }

    pub fn id(&self) -> &ArticleId {
        &self.article.id
    }

    pub fn line_cost(&self) -> Amount {
        self.article.price * Amount::from(self.quantity)
    }
}

/// Group a raw selection (one entry per picked unit) into order lines,
/// keeping the order in which articles were first picked.
pub fn group_selection(selected: &[Article]) -> Vec<OrderArticle> {
    let mut grouped: Vec<OrderArticle> = Vec::new();
    for article in selected {
        match grouped.iter_mut().find(|line| line.article.id == article.id) {
            Some(line) => line.quantity += 1,
            None => grouped.push(OrderArticle::new(article.clone(), 1)),
        }
    }
    grouped
}

/// Units of an article that can still be added without exceeding its stock.
///
/// `committed` is what the order already holds of that article.
pub fn clamp_to_stock(stock: u32, committed: u32, requested: u32) -> u32 {
    requested.min(stock.saturating_sub(committed))
}

/// Order-level article lines, unique by article id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderArticleList {
    lines: Vec<OrderArticle>,
}

impl OrderArticleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[OrderArticle] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, id: &ArticleId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.id() == id)
            .map(|line| line.quantity)
            .unwrap_or(0)
    }

    /// Add `quantity` units of `article`, growing the existing line if any.
    ///
    /// Callers clamp against stock first; a zero quantity is ignored so no
    /// empty line is ever stored.
    pub fn add(&mut self, article: &Article, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|line| line.article.id == article.id) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(OrderArticle::new(article.clone(), quantity)),
        }
    }

    /// Drop every line whose article is in `ids`. Returns how many were removed.
    pub fn remove(&mut self, ids: &HashSet<ArticleId>) -> usize {
        let before = self.lines.len();
        self.lines.retain(|line| !ids.contains(line.id()));
        before - self.lines.len()
    }

    pub fn cost(&self) -> Amount {
        self.lines.iter().map(OrderArticle::line_cost).sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl From<Vec<OrderArticle>> for OrderArticleList {
    /// Build from backend lines, merging duplicates.
    fn from(lines: Vec<OrderArticle>) -> Self {
        let mut list = Self::new();
        for line in lines {
            list.add(&line.article, line.quantity);
        }
        list
    }
}

/// Articles tied to one prescription.
///
/// Before submission the prescription is still a draft; the order payload
/// carries the id returned once it has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubOrder<P = PrescriptionDraft> {
    pub prescription: P,
    pub articles: Vec<OrderArticle>,
}

impl<P> SubOrder<P> {
    pub fn cost(&self) -> Amount {
        self.articles.iter().map(OrderArticle::line_cost).sum()
    }

    pub fn quantity_of(&self, id: &ArticleId) -> u32 {
        self.articles
            .iter()
            .filter(|line| line.id() == id)
            .map(|line| line.quantity)
            .sum()
    }

    /// Swap the prescription for another representation, keeping the articles.
    pub fn with_prescription<Q>(self, prescription: Q) -> SubOrder<Q> {
        SubOrder {
            prescription,
            articles: self.articles,
        }
    }
}
