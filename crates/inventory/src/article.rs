use serde::{Deserialize, Serialize};

use optica_core::{Amount, ArticleId, Entity};

/// Kind of sellable article.
///
/// Serialized with the backend's formatted type names ("Frame", "Lenses", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticleType {
    #[serde(rename = "Lenses")]
    Lens,
    #[serde(rename = "Service")]
    Service,
    #[serde(rename = "ContactLenses")]
    ContactLenses,
    #[serde(rename = "Frame")]
    Frame,
    #[serde(rename = "HearingAid")]
    HearingAid,
    #[serde(rename = "Accessory")]
    Accessory,
    #[serde(rename = "Treatment")]
    Treatment,
}

impl ArticleType {
    pub const ALL: [ArticleType; 7] = [
        ArticleType::Lens,
        ArticleType::Service,
        ArticleType::ContactLenses,
        ArticleType::Frame,
        ArticleType::HearingAid,
        ArticleType::Accessory,
        ArticleType::Treatment,
    ];

    /// Catalogue key ("LENS", "FRAME", ...).
    pub fn key(&self) -> &'static str {
        match self {
            ArticleType::Lens => "LENS",
            ArticleType::Service => "SERVICE",
            ArticleType::ContactLenses => "CONTACT_LENSES",
            ArticleType::Frame => "FRAME",
            ArticleType::HearingAid => "HEARING_AID",
            ArticleType::Accessory => "ACCESSORY",
            ArticleType::Treatment => "TREATMENT",
        }
    }

    /// Label shown to shop staff.
    pub fn display(&self) -> &'static str {
        match self {
            ArticleType::Lens => "Cristal",
            ArticleType::Service => "Servicio",
            ArticleType::ContactLenses => "Lentes de Contacto",
            ArticleType::Frame => "Armazón",
            ArticleType::HearingAid => "Audífono",
            ArticleType::Accessory => "Accesorio",
            ArticleType::Treatment => "Tratamiento",
        }
    }

    /// Path segment used by the inventory endpoints.
    pub fn url_key(&self) -> &'static str {
        match self {
            ArticleType::Lens => "lenses",
            ArticleType::Service => "service",
            ArticleType::ContactLenses => "contact-lenses",
            ArticleType::Frame => "frame",
            ArticleType::HearingAid => "hearing-aid",
            ArticleType::Accessory => "accessory",
            ArticleType::Treatment => "treatment",
        }
    }

    pub fn from_display(display: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.display() == display)
    }

    pub fn from_url_key(url_key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.url_key() == url_key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LensType {
    Monofocal,
    Bifocal,
    Multifocal,
}

/// Eye a lens is cut for: right (OD) or left (OI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LensPosition {
    #[serde(rename = "OD")]
    Right,
    #[serde(rename = "OI")]
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductOrigin {
    Laboratorio,
    Stock,
}

/// Snapshot of an inventory article.
///
/// Inventory owns the record; orders keep the snapshot they were built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: ArticleId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub article_type: Option<ArticleType>,
    #[serde(default)]
    pub price: Amount,
    #[serde(default)]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<String>,
    #[serde(default)]
    pub is_sunglasses: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_type: Option<LensType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_position: Option<LensPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_origin: Option<ProductOrigin>,
}

impl Article {
    /// Minimal article, mostly useful for fixtures.
    pub fn new(id: ArticleId, name: impl Into<String>, price: Amount, stock: u32) -> Self {
        Self {
            id,
            name: name.into(),
            article_type: None,
            price,
            stock,
            brand: None,
            model: None,
            style: None,
            currency: None,
            applies_to: None,
            is_sunglasses: false,
            lens_type: None,
            lens_position: None,
            product_origin: None,
        }
    }

    pub fn with_type(mut self, article_type: ArticleType) -> Self {
        self.article_type = Some(article_type);
        self
    }

    pub fn is_type(&self, article_type: ArticleType) -> bool {
        self.article_type == Some(article_type)
    }

    /// Whether the frame is one the client brought in ("TRAE"/"TRAJO"),
    /// which is sold without charging for the frame itself.
    pub fn is_client_frame(&self) -> bool {
        self.style
            .as_deref()
            .map(str::to_uppercase)
            .is_some_and(|s| s == "TRAE" || s == "TRAJO")
    }

    /// Lens description for one eye, e.g. "MONOFOCAL Orgánico 1.56".
    pub fn lens_label(&self) -> String {
        let lens_type = self
            .lens_type
            .and_then(|t| serde_json::to_value(t).ok())
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        format!("{lens_type} {}", self.name).trim().to_string()
    }
}

impl Entity for Article {
    type Id = ArticleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn deserializes_backend_article() {
        let json = r#"{
            "_id": "a1",
            "name": "Orgánico 1.56",
            "type": "Lenses",
            "price": 1250.5,
            "stock": 4,
            "lensType": "MONOFOCAL",
            "lensPosition": "OD",
            "productOrigin": "LABORATORIO",
            "isSunglasses": false
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();

        assert_eq!(article.id.as_str(), "a1");
        assert!(article.is_type(ArticleType::Lens));
        assert_eq!(article.price, dec!(1250.5));
        assert_eq!(article.stock, 4);
        assert_eq!(article.lens_position, Some(LensPosition::Right));
        assert_eq!(article.lens_label(), "MONOFOCAL Orgánico 1.56");
    }

    #[test]
    fn missing_price_defaults_to_zero() {
        let article: Article = serde_json::from_str(r#"{"_id": "x"}"#).unwrap();
        assert_eq!(article.price, dec!(0));
        assert_eq!(article.stock, 0);
    }

    #[test]
    fn type_lookups_round_trip_through_catalogue_labels() {
        assert_eq!(ArticleType::from_display("Armazón"), Some(ArticleType::Frame));
        assert_eq!(
            ArticleType::from_url_key("hearing-aid"),
            Some(ArticleType::HearingAid)
        );
        assert_eq!(ArticleType::from_url_key("nope"), None);
        assert_eq!(ArticleType::ContactLenses.key(), "CONTACT_LENSES");
    }

    #[test]
    fn client_frame_is_detected_case_insensitively() {
        let mut frame = Article::new(ArticleId::new("f").unwrap(), "-", dec!(0), 1)
            .with_type(ArticleType::Frame);
        frame.style = Some("trajo".to_string());
        assert!(frame.is_client_frame());

        frame.style = Some("Aviador".to_string());
        assert!(!frame.is_client_frame());
    }
}
