//! Canonical face parts and per-part override masks.
//!
//! The enhancement model understands 18 semantic face regions in a fixed
//! order. Callers may override the model's own region inference for any
//! subset of parts by supplying one mask per face for that part; absent
//! parts mean "use the model's inference". Overrides are always a freshly
//! constructed container per call: there is no shared default that could
//! leak state between invocations.

use crate::core::constants::FACE_PART_COUNT;
use crate::core::errors::RestoreError;
use image::GrayImage;

/// The canonical face parts, in the enhancement model's channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacePart {
    /// Facial skin.
    Skin,
    /// Hair.
    Hair,
    /// Left eyebrow.
    LeftBrow,
    /// Right eyebrow.
    RightBrow,
    /// Left eye.
    LeftEye,
    /// Right eye.
    RightEye,
    /// Eyeglasses.
    EyeGlasses,
    /// Left ear.
    LeftEar,
    /// Right ear.
    RightEar,
    /// Earring.
    EarRing,
    /// Nose.
    Nose,
    /// Mouth interior.
    Mouth,
    /// Upper lip.
    UpperLip,
    /// Lower lip.
    LowerLip,
    /// Neck.
    Neck,
    /// Necklace.
    NeckLace,
    /// Clothing.
    Cloth,
    /// Hat.
    Hat,
}

impl FacePart {
    /// All parts in canonical channel order.
    pub const ALL: [FacePart; FACE_PART_COUNT] = [
        FacePart::Skin,
        FacePart::Hair,
        FacePart::LeftBrow,
        FacePart::RightBrow,
        FacePart::LeftEye,
        FacePart::RightEye,
        FacePart::EyeGlasses,
        FacePart::LeftEar,
        FacePart::RightEar,
        FacePart::EarRing,
        FacePart::Nose,
        FacePart::Mouth,
        FacePart::UpperLip,
        FacePart::LowerLip,
        FacePart::Neck,
        FacePart::NeckLace,
        FacePart::Cloth,
        FacePart::Hat,
    ];

    /// The part's channel index in the canonical ordering.
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|p| *p == self)
            .unwrap_or_default()
    }

    /// The part's canonical name.
    pub fn name(self) -> &'static str {
        match self {
            FacePart::Skin => "skin",
            FacePart::Hair => "hair",
            FacePart::LeftBrow => "l_brow",
            FacePart::RightBrow => "r_brow",
            FacePart::LeftEye => "l_eye",
            FacePart::RightEye => "r_eye",
            FacePart::EyeGlasses => "eye_g",
            FacePart::LeftEar => "l_ear",
            FacePart::RightEar => "r_ear",
            FacePart::EarRing => "ear_r",
            FacePart::Nose => "nose",
            FacePart::Mouth => "mouth",
            FacePart::UpperLip => "u_lip",
            FacePart::LowerLip => "l_lip",
            FacePart::Neck => "neck",
            FacePart::NeckLace => "neck_l",
            FacePart::Cloth => "cloth",
            FacePart::Hat => "hat",
        }
    }
}

/// Optional per-part mask overrides for one enhancement invocation.
///
/// Always holds exactly one slot per canonical part. A present slot
/// carries one grayscale mask per face, aligned 1:1 with the flattened
/// face payload the overrides accompany; nonzero pixels mark the region.
/// The per-face alignment is validated by the enhancement stage, which
/// knows the face count.
#[derive(Debug, Clone, Default)]
pub struct PartOverrides {
    slots: Vec<Option<Vec<GrayImage>>>,
}

impl PartOverrides {
    /// Creates a fresh override set with every part absent.
    pub fn new() -> Self {
        Self {
            slots: (0..FACE_PART_COUNT).map(|_| None).collect(),
        }
    }

    /// Creates an override set from a raw slot list.
    ///
    /// # Errors
    ///
    /// Returns `RestoreError::InvalidInput` if the list does not hold
    /// exactly one slot per canonical part.
    pub fn from_slots(slots: Vec<Option<Vec<GrayImage>>>) -> Result<Self, RestoreError> {
        if slots.len() != FACE_PART_COUNT {
            return Err(RestoreError::invalid_input(format!(
                "part override list must hold {FACE_PART_COUNT} entries, got {}",
                slots.len()
            )));
        }
        Ok(Self { slots })
    }

    /// Sets the per-face masks for one part, returning `self` for
    /// chaining.
    pub fn with(mut self, part: FacePart, masks: Vec<GrayImage>) -> Self {
        self.set(part, masks);
        self
    }

    /// Sets the per-face masks for one part.
    pub fn set(&mut self, part: FacePart, masks: Vec<GrayImage>) {
        if self.slots.is_empty() {
            // Default-constructed value; bring it to full width first.
            self.slots = (0..FACE_PART_COUNT).map(|_| None).collect();
        }
        self.slots[part.index()] = Some(masks);
    }

    /// The per-face masks for one part, if overridden.
    pub fn get(&self, part: FacePart) -> Option<&[GrayImage]> {
        self.slots
            .get(part.index())
            .and_then(|s| s.as_deref())
    }

    /// Whether no part is overridden.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Iterates `(part, per-face masks)` over the overridden parts only.
    pub fn iter(&self) -> impl Iterator<Item = (FacePart, &[GrayImage])> {
        FacePart::ALL
            .iter()
            .zip(&self.slots)
            .filter_map(|(part, slot)| slot.as_deref().map(|masks| (*part, masks)))
    }

    /// Validates that every present slot carries exactly one mask per
    /// face.
    ///
    /// # Errors
    ///
    /// Returns `RestoreError::InvalidInput` naming the offending part.
    pub fn check_face_count(&self, face_count: usize) -> Result<(), RestoreError> {
        for (part, masks) in self.iter() {
            if masks.len() != face_count {
                return Err(RestoreError::invalid_input(format!(
                    "override for part '{}' holds {} masks but the batch has {face_count} faces",
                    part.name(),
                    masks.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ordering_is_stable() {
        assert_eq!(FacePart::Skin.index(), 0);
        assert_eq!(FacePart::Nose.index(), 10);
        assert_eq!(FacePart::Hat.index(), 17);
        assert_eq!(FacePart::ALL.len(), FACE_PART_COUNT);
    }

    #[test]
    fn fresh_overrides_are_all_absent() {
        let overrides = PartOverrides::new();
        assert!(overrides.is_empty());
        assert!(overrides.get(FacePart::Hair).is_none());
    }

    #[test]
    fn separate_calls_get_separate_containers() {
        // A mutation through one override set must never be visible
        // through another.
        let mut first = PartOverrides::new();
        let second = PartOverrides::new();
        first.set(FacePart::Nose, vec![GrayImage::new(4, 4)]);
        assert!(first.get(FacePart::Nose).is_some());
        assert!(second.get(FacePart::Nose).is_none());
    }

    #[test]
    fn raw_slot_list_is_length_checked() {
        assert!(PartOverrides::from_slots(vec![None; 17]).is_err());
        assert!(PartOverrides::from_slots(vec![None; 18]).is_ok());
    }

    #[test]
    fn iter_yields_only_overridden_parts() {
        let overrides = PartOverrides::new()
            .with(FacePart::LeftEye, vec![GrayImage::new(2, 2)])
            .with(FacePart::Hat, vec![GrayImage::new(2, 2)]);
        let parts: Vec<FacePart> = overrides.iter().map(|(p, _)| p).collect();
        assert_eq!(parts, vec![FacePart::LeftEye, FacePart::Hat]);
    }

    #[test]
    fn face_count_alignment_is_checked_per_part() {
        let overrides = PartOverrides::new()
            .with(FacePart::Skin, vec![GrayImage::new(2, 2); 3]);
        assert!(overrides.check_face_count(3).is_ok());
        assert!(overrides.check_face_count(2).is_err());
    }
}
