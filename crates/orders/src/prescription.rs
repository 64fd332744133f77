//! Eye prescriptions attached to lens sub-orders.

use serde::{Deserialize, Serialize};

use optica_core::{Amount, DomainError, PrescriptionId, ValueObject};

/// Measurements for one eye.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeData {
    #[serde(default)]
    pub spherical: Amount,
    #[serde(default)]
    pub cylindrical: Amount,
    #[serde(default)]
    pub axis: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pupil_height: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pupil_distance: Option<Amount>,
}

impl EyeData {
    pub const MAX_AXIS: u16 = 179;

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.axis > Self::MAX_AXIS {
            return Err(DomainError::out_of_range("axis", self.axis, 0, Self::MAX_AXIS));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EyePrescription {
    pub left_eye: EyeData,
    pub right_eye: EyeData,
}

impl ValueObject for EyeData {}
impl ValueObject for EyePrescription {}

impl EyePrescription {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.left_eye.validate()?;
        self.right_eye.validate()
    }

    /// Near vision derived from far vision: same measurements with the
    /// addition added to the spherical value of both eyes.
    pub fn with_addition(&self, addition: Addition) -> Self {
        let mut near = self.clone();
        near.left_eye.spherical += addition.value();
        near.right_eye.spherical += addition.value();
        near
    }
}

/// Near-vision addition, 0.00 to 8.00 dioptres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Amount", into = "Amount")]
pub struct Addition(Amount);

impl Addition {
    pub fn new(value: Amount) -> Result<Self, DomainError> {
        if value < Amount::ZERO || value > Amount::from(8) {
            return Err(DomainError::out_of_range("addition", value, 0, 8));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Amount {
        self.0
    }
}

impl TryFrom<Amount> for Addition {
    type Error = DomainError;

    fn try_from(value: Amount) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Addition> for Amount {
    fn from(value: Addition) -> Self {
        value.0
    }
}

/// Lens type picked for a lens sale; decides which vision data is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LensSelection {
    #[serde(rename = "MONOFOCAL_CERCA")]
    MonofocalNear,
    #[serde(rename = "MONOFOCAL_LEJOS")]
    MonofocalFar,
    #[serde(rename = "BIFOCAL")]
    Bifocal,
    #[serde(rename = "MULTIFOCAL")]
    Multifocal,
}

/// Prescription data being edited alongside an order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrescriptionForm {
    pub far: EyePrescription,
    pub addition: Addition,
    pub observations: String,
}

impl PrescriptionForm {
    pub fn near(&self) -> EyePrescription {
        self.far.with_addition(self.addition)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.far.validate()
    }
}

/// Prescription as sent to the backend when a lens sub-order is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDraft {
    pub document: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub near: Option<EyePrescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub far: Option<EyePrescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
}

impl PrescriptionDraft {
    /// Only the vision the selected lens corrects is included; other lens
    /// types carry neither.
    pub fn for_lens(
        selection: LensSelection,
        form: &PrescriptionForm,
        document: impl Into<String>,
    ) -> Result<Self, DomainError> {
        form.validate()?;
        let observation = form.observations.trim();
        Ok(Self {
            document: document.into(),
            near: (selection == LensSelection::MonofocalNear).then(|| form.near()),
            far: (selection == LensSelection::MonofocalFar).then(|| form.far.clone()),
            observation: (!observation.is_empty()).then(|| observation.to_string()),
        })
    }
}

/// Backend answer to storing a prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPrescription {
    #[serde(alias = "_id")]
    pub id: PrescriptionId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PrescriptionRefRepr {
    Id(PrescriptionId),
    Populated {
        #[serde(rename = "_id")]
        id: PrescriptionId,
    },
}

/// Reference to a stored prescription.
///
/// Serialized as the bare id; read back either as an id or as the populated
/// prescription document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PrescriptionRefRepr", into = "PrescriptionId")]
pub struct PrescriptionRef(pub PrescriptionId);

impl From<PrescriptionRefRepr> for PrescriptionRef {
    fn from(repr: PrescriptionRefRepr) -> Self {
        match repr {
            PrescriptionRefRepr::Id(id) | PrescriptionRefRepr::Populated { id } => Self(id),
        }
    }
}

impl From<PrescriptionRef> for PrescriptionId {
    fn from(value: PrescriptionRef) -> Self {
        value.0
    }
}

impl From<PrescriptionId> for PrescriptionRef {
    fn from(id: PrescriptionId) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn form() -> PrescriptionForm {
        PrescriptionForm {
            far: EyePrescription {
                left_eye: EyeData {
                    spherical: dec!(-1.25),
                    axis: 90,
                    ..EyeData::default()
                },
                right_eye: EyeData {
                    spherical: dec!(-1.00),
                    axis: 85,
                    ..EyeData::default()
                },
            },
            addition: Addition::new(dec!(2.00)).unwrap(),
            observations: "  ".to_string(),
        }
    }

    #[test]
    fn near_adds_addition_to_both_spherical_values() {
        let near = form().near();
        assert_eq!(near.left_eye.spherical, dec!(0.75));
        assert_eq!(near.right_eye.spherical, dec!(1.00));
        assert_eq!(near.left_eye.axis, 90);
    }

    #[test]
    fn addition_outside_range_is_rejected() {
        assert!(Addition::new(dec!(8.25)).is_err());
        assert!(Addition::new(dec!(-0.25)).is_err());
        assert!(Addition::new(dec!(8)).is_ok());
    }

    #[test]
    fn axis_above_179_is_rejected() {
        let mut form = form();
        form.far.right_eye.axis = 180;
        let err = PrescriptionDraft::for_lens(LensSelection::MonofocalFar, &form, "123").unwrap_err();
        assert!(matches!(err, DomainError::OutOfRange { .. }));
    }

    #[test]
    fn near_lens_sends_near_only() {
        let draft = PrescriptionDraft::for_lens(LensSelection::MonofocalNear, &form(), "4.321.987-6").unwrap();
        assert!(draft.near.is_some());
        assert!(draft.far.is_none());
        assert!(draft.observation.is_none());
    }

    #[test]
    fn stored_reference_reads_id_or_populated_document() {
        let bare: PrescriptionRef = serde_json::from_str("\"p1\"").unwrap();
        let populated: PrescriptionRef =
            serde_json::from_str(r#"{"_id": "p1", "document": "123"}"#).unwrap();

        assert_eq!(bare, populated);
        assert_eq!(serde_json::to_string(&populated).unwrap(), "\"p1\"");
    }

    #[test]
    fn far_lens_sends_far_only_and_other_lenses_neither() {
        let far = PrescriptionDraft::for_lens(LensSelection::MonofocalFar, &form(), "1").unwrap();
        assert!(far.near.is_none());
        assert_eq!(far.far, Some(form().far));

        let bifocal = PrescriptionDraft::for_lens(LensSelection::Bifocal, &form(), "1").unwrap();
        let json = serde_json::to_value(&bifocal).unwrap();
        assert_eq!(json, serde_json::json!({ "document": "1" }));
    }
}
