use std::cmp::Ordering;
use std::f64::consts::PI;

/// A single catalog star. Angles are in radians.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Right ascension in [0, 2*pi).
    pub ra: f64,
    /// Declination.
    pub dec: f64,
    /// Apparent magnitude (lower = brighter).
    pub mag: f64,
    /// Optional designation, e.g. "Alcyone".
    pub name: Option<String>,
}

/// A star catalog ordered ascending by magnitude (brightest first).
///
/// Populating the catalog (csv, FITS, a generated fixture) is the caller's
/// job; the constructor enforces the brightness ordering no matter how the
/// entries arrive. A star's position in the catalog is its identifier
/// everywhere else in the crate, so catalogs are capped at `u32::MAX - 1`
/// entries (one value is reserved for the empty-cell sentinel).
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog, sorting the entries ascending by magnitude.
    ///
    /// The sort is stable, so equal-magnitude stars keep their input order.
    /// NaN magnitudes compare as equal to everything and stay where the
    /// sort leaves them.
    pub fn from_entries(mut entries: Vec<CatalogEntry>) -> Catalog {
        entries.sort_by(|a, b| a.mag.partial_cmp(&b.mag).unwrap_or(Ordering::Equal));
        Catalog { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The i-th brightest star.
    pub fn get(&self, i: usize) -> Option<&CatalogEntry> {
        self.entries.get(i)
    }

    /// (ra, dec) of the i-th brightest star as a planar point, the form
    /// the quad encoder consumes.
    pub fn position(&self, i: usize) -> [f64; 2] {
        let entry = &self.entries[i];
        [entry.ra, entry.dec]
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Resolve a star by name. Linear scan; returns the brightest match.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name.as_deref() == Some(name))
    }
}

/// Convert a right-ascension hour angle to radians (24h = 2*pi).
pub fn hours_to_radians(hours: f64) -> f64 {
    PI * hours / 12.0
}

/// Convert an (hours, minutes, seconds) right ascension to radians.
pub fn hms_to_radians(hours: f64, minutes: f64, seconds: f64) -> f64 {
    hours_to_radians(hours + minutes / 60.0 + seconds / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ra: f64, dec: f64, mag: f64) -> CatalogEntry {
        CatalogEntry {
            ra,
            dec,
            mag,
            name: None,
        }
    }

    #[test]
    fn from_entries_sorts_by_magnitude() {
        let catalog = Catalog::from_entries(vec![
            entry(0.1, 0.1, 4.5),
            entry(0.2, 0.2, 1.2),
            entry(0.3, 0.3, 3.0),
        ]);

        let mags: Vec<f64> = catalog.iter().map(|e| e.mag).collect();
        assert_eq!(mags, vec![1.2, 3.0, 4.5]);
    }

    #[test]
    fn equal_magnitudes_keep_input_order() {
        let catalog = Catalog::from_entries(vec![
            entry(0.1, 0.0, 2.0),
            entry(0.2, 0.0, 2.0),
            entry(0.3, 0.0, 1.0),
        ]);

        assert_eq!(catalog.position(0), [0.3, 0.0]);
        assert_eq!(catalog.position(1), [0.1, 0.0]);
        assert_eq!(catalog.position(2), [0.2, 0.0]);
    }

    #[test]
    fn find_by_name() {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry {
                ra: 1.0,
                dec: 0.4,
                mag: 2.9,
                name: Some("Alcyone".to_string()),
            },
            entry(0.5, 0.2, 0.5),
        ]);

        // The named star sorts after the brighter anonymous one.
        assert_eq!(catalog.find("Alcyone"), Some(1));
        assert_eq!(catalog.find("Maia"), None);
    }

    #[test]
    fn empty_catalog() {
        let catalog = Catalog::from_entries(Vec::new());
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
        assert!(catalog.get(0).is_none());
    }

    #[test]
    fn hour_angle_conversions() {
        assert!((hours_to_radians(12.0) - PI).abs() < 1e-15);
        assert!((hours_to_radians(24.0) - 2.0 * PI).abs() < 1e-15);
        assert!((hms_to_radians(1.0, 30.0, 0.0) - hours_to_radians(1.5)).abs() < 1e-15);
        assert!((hms_to_radians(0.0, 0.0, 36.0) - hours_to_radians(0.01)).abs() < 1e-15);
    }
}
