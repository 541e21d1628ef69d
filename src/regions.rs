use crate::error::{ConfigError, Result};

/// Record keys written alongside the region readings
pub const RESERVED_KEYS: [&str; 2] = ["frame", "timeInSec"];

/// Output key holding the confidence of a region's reading
pub fn confidence_key(name: &str) -> String {
    format!("{}_confidence", name)
}

/// Axis-aligned rectangle in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Check whether the box fits entirely inside a frame of the given size
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        let right = self.x as u64 + self.width as u64;
        let bottom = self.y as u64 + self.height as u64;
        right <= frame_width as u64 && bottom <= frame_height as u64
    }
}

/// A named overlay field on the video frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub bbox: RegionBox,
}

impl Region {
    pub fn new<S: Into<String>>(name: S, bbox: RegionBox) -> Self {
        Self { name: name.into(), bbox }
    }
}

/// Fixed, ordered set of regions with one designated clock region
///
/// The order of the regions only decides the order of fields in the output.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<Region>,
    clock_index: usize,
}

impl RegionCatalog {
    /// Build a catalog, rejecting empty boxes, duplicate names and an unknown clock region
    ///
    /// Names that would collide with another output key (`frame`, `timeInSec`
    /// or another region's `<name>_confidence`) are rejected as well.
    pub fn new(regions: Vec<Region>, clock_region: &str) -> Result<Self> {
        for (i, region) in regions.iter().enumerate() {
            if region.name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: format!("regions[{}].name", i),
                    value: String::new(),
                }
                .into());
            }

            if region.bbox.width == 0 || region.bbox.height == 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("regions.{}", region.name),
                    value: format!("{}x{}", region.bbox.width, region.bbox.height),
                }
                .into());
            }

            if regions[..i].iter().any(|other| other.name == region.name) {
                return Err(ConfigError::InvalidValue {
                    key: "regions.name".to_string(),
                    value: format!("duplicate '{}'", region.name),
                }
                .into());
            }

            let collides = RESERVED_KEYS.contains(&region.name.as_str())
                || regions.iter().any(|other| confidence_key(&other.name) == region.name);
            if collides {
                return Err(ConfigError::InvalidValue {
                    key: "regions.name".to_string(),
                    value: format!("'{}' clashes with an output key", region.name),
                }
                .into());
            }
        }

        let clock_index = regions
            .iter()
            .position(|region| region.name == clock_region)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "regions.clock_region".to_string(),
                value: clock_region.to_string(),
            })?;

        Ok(Self { regions, clock_index })
    }

    /// All regions in catalog order
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn clock(&self) -> &Region {
        &self.regions[self.clock_index]
    }

    pub fn is_clock(&self, region: &Region) -> bool {
        region.name == self.clock().name
    }

    /// Non-clock regions in catalog order
    pub fn fields(&self) -> impl Iterator<Item = &Region> {
        let clock_index = self.clock_index;
        self.regions
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != clock_index)
            .map(|(_, region)| region)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_regions() -> Vec<Region> {
        vec![
            Region::new("timer", RegionBox::new(856, 946, 206, 39)),
            Region::new("ship_speed", RegionBox::new(1518, 912, 113, 29)),
            Region::new("ship_alt", RegionBox::new(1538, 948, 93, 26)),
        ]
    }

    #[test]
    fn test_catalog_ordering_and_clock() {
        let catalog = RegionCatalog::new(sample_regions(), "timer").unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.clock().name, "timer");

        let fields: Vec<&str> = catalog.fields().map(|r| r.name.as_str()).collect();
        assert_eq!(fields, vec!["ship_speed", "ship_alt"]);
    }

    #[test]
    fn test_zero_sized_region_rejected() {
        let mut regions = sample_regions();
        regions[1].bbox.width = 0;
        assert!(RegionCatalog::new(regions, "timer").is_err());
    }

    #[test]
    fn test_duplicate_and_unknown_clock_rejected() {
        let mut regions = sample_regions();
        regions.push(Region::new("ship_alt", RegionBox::new(0, 0, 10, 10)));
        assert!(RegionCatalog::new(regions, "timer").is_err());

        assert!(RegionCatalog::new(sample_regions(), "clock").is_err());
    }

    #[test]
    fn test_names_clashing_with_output_keys_rejected() {
        for name in ["frame", "timeInSec", "timer_confidence", "ship_speed_confidence"] {
            let mut regions = sample_regions();
            regions.push(Region::new(name, RegionBox::new(0, 0, 10, 10)));
            let err = RegionCatalog::new(regions, "timer").unwrap_err();
            assert_eq!(err.exit_code(), 1, "{}", name);
        }

        let mut regions = sample_regions();
        regions.push(Region::new("frame_rate", RegionBox::new(0, 0, 10, 10)));
        regions.push(Region::new("boost_confidence_level", RegionBox::new(0, 0, 10, 10)));
        assert!(RegionCatalog::new(regions, "timer").is_ok());
    }

    #[test]
    fn test_fits_within() {
        let bbox = RegionBox::new(1538, 948, 93, 26);
        assert!(bbox.fits_within(1920, 1080));
        assert!(!bbox.fits_within(1280, 720));
        assert!(RegionBox::new(0, 0, 10, 10).fits_within(10, 10));
    }
}
