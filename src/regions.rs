//! Regions of interest
//!
//! A static set of rectangles in page pixel space, each bound to a field of
//! the side panel. The set is checked once when it is built: rectangles
//! must be non-empty, ids unique and interiors disjoint.

use std::collections::HashSet;

use crate::geometry::{PixelPoint, PixelRect};

/// What happens when a region is clicked
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionAction {
    /// Move input focus to the named field
    FocusField(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionOfInterest {
    pub id: String,
    pub top_left: PixelPoint,
    pub bottom_right: PixelPoint,
    pub action: RegionAction,
}

impl RegionOfInterest {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        top_left: PixelPoint,
        bottom_right: PixelPoint,
        action: RegionAction,
    ) -> Self {
        Self {
            id: id.into(),
            top_left,
            bottom_right,
            action,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_corners(self.top_left, self.bottom_right)
    }

    /// Field this region focuses
    #[must_use]
    pub fn field(&self) -> &str {
        match &self.action {
            RegionAction::FocusField(field) => field,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegionError {
    #[error("region '{id}' has no area: top-left must be above and left of bottom-right")]
    Degenerate { id: String },

    #[error("region id '{id}' is used more than once")]
    DuplicateId { id: String },

    #[error("regions '{first}' and '{second}' overlap")]
    Overlap { first: String, second: String },
}

/// Validated, non-overlapping region set
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionSet {
    regions: Vec<RegionOfInterest>,
}

impl RegionSet {
    pub fn new(regions: Vec<RegionOfInterest>) -> Result<Self, RegionError> {
        let mut seen = HashSet::new();
        for region in &regions {
            if region.bounds().is_empty()
                || region.top_left.x >= region.bottom_right.x
                || region.top_left.y >= region.bottom_right.y
            {
                return Err(RegionError::Degenerate {
                    id: region.id.clone(),
                });
            }
            if !seen.insert(region.id.as_str()) {
                return Err(RegionError::DuplicateId {
                    id: region.id.clone(),
                });
            }
        }

        for (i, first) in regions.iter().enumerate() {
            for second in &regions[i + 1..] {
                if first.bounds().overlaps(&second.bounds()) {
                    return Err(RegionError::Overlap {
                        first: first.id.clone(),
                        second: second.id.clone(),
                    });
                }
            }
        }

        Ok(Self { regions })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionOfInterest> {
        self.regions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Region under a page position
    #[must_use]
    pub fn hit(&self, x: f32, y: f32) -> Option<&RegionOfInterest> {
        self.regions.iter().find(|r| r.bounds().contains(x, y))
    }

    /// Region bound to `field`
    #[must_use]
    pub fn for_field(&self, field: &str) -> Option<&RegionOfInterest> {
        self.regions.iter().find(|r| r.field() == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: &str, x0: u32, y0: u32, x1: u32, y1: u32) -> RegionOfInterest {
        RegionOfInterest::new(
            id,
            PixelPoint::new(x0, y0),
            PixelPoint::new(x1, y1),
            RegionAction::FocusField(format!("{id}-field")),
        )
    }

    #[test]
    fn disjoint_regions_are_accepted() {
        let set = RegionSet::new(vec![
            region("a", 0, 0, 10, 10),
            region("b", 10, 0, 20, 10),
            region("c", 0, 10, 20, 20),
        ])
        .unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn overlapping_regions_are_rejected() {
        let err = RegionSet::new(vec![region("a", 0, 0, 10, 10), region("b", 5, 5, 15, 15)])
            .unwrap_err();
        assert_eq!(
            err,
            RegionError::Overlap {
                first: "a".into(),
                second: "b".into()
            }
        );
    }

    #[test]
    fn degenerate_and_duplicate_regions_are_rejected() {
        assert!(matches!(
            RegionSet::new(vec![region("flat", 0, 5, 10, 5)]),
            Err(RegionError::Degenerate { .. })
        ));
        assert!(matches!(
            RegionSet::new(vec![region("inverted", 10, 10, 0, 0)]),
            Err(RegionError::Degenerate { .. })
        ));
        assert!(matches!(
            RegionSet::new(vec![region("a", 0, 0, 5, 5), region("a", 5, 5, 9, 9)]),
            Err(RegionError::DuplicateId { .. })
        ));
    }

    #[test]
    fn hit_uses_page_coordinates() {
        let set = RegionSet::new(vec![region("a", 20, 20, 40, 30)]).unwrap();
        assert_eq!(set.hit(25.5, 29.9).map(|r| r.field()), Some("a-field"));
        assert!(set.hit(40.0, 25.0).is_none());
        assert_eq!(set.for_field("a-field").map(|r| r.id.as_str()), Some("a"));
    }
}
