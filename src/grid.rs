//! Fixed-degree latitude/longitude grid

#[derive(thiserror::Error, Debug)]
pub enum GridError {
    #[error("grid spacing {0} does not divide 90 degree evenly")]
    BadDegree(f64),
}

/// A grid cell, identified by its integer indices from the south-west corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCell {
    pub ilat: i32,
    pub ilng: i32,
}

/// Spatial discretization of lat/lng coordinates
///
/// Cells are labeled by their lower edge: with the default 2.5 degree spacing,
/// a reading at (1.2, -0.3) falls in the (0, -2.5) cell.
#[derive(Debug, Clone, Copy)]
pub struct Grid {
    deg: f64,
}
impl Default for Grid {
    fn default() -> Self {
        Self { deg: 2.5 }
    }
}
impl Grid {
    pub fn new(deg: f64) -> Result<Self, GridError> {
        // compare against the rounded quotient, `fract` trips on spacings
        // like 0.1 whose quotient is off by one ulp
        let cells = 90. / deg;
        if !(deg > 0.) || (cells - cells.round()).abs() > 1e-9 {
            return Err(GridError::BadDegree(deg));
        }
        Ok(Self { deg })
    }
    pub fn deg(&self) -> f64 {
        self.deg
    }
    /// Cell containing the coordinate, `None` when missing or out of the
    /// lat [-90,90) / lng [-180,180) domain
    pub fn cell(&self, lat: Option<f64>, lng: Option<f64>) -> Option<GridCell> {
        let (lat, lng) = (lat?, lng?);
        if !(-90. ..90.).contains(&lat) || !(-180. ..180.).contains(&lng) {
            return None;
        }
        Some(GridCell {
            ilat: ((lat + 90.) / self.deg).floor() as i32,
            ilng: ((lng + 180.) / self.deg).floor() as i32,
        })
    }
    /// Lower-edge latitude of a cell [deg]
    pub fn lat(&self, cell: GridCell) -> f64 {
        -90. + cell.ilat as f64 * self.deg
    }
    /// Lower-edge longitude of a cell [deg]
    pub fn lng(&self, cell: GridCell) -> f64 {
        -180. + cell.ilng as f64 * self.deg
    }
    /// Cell whose lower edge is at the given coordinate
    pub fn cell_at(&self, lat: f64, lng: f64) -> Option<GridCell> {
        self.cell(Some(lat), Some(lng))
    }
    pub fn label(&self, cell: GridCell) -> String {
        format!("({}, {})", self.lat(cell), self.lng(cell))
    }
}
