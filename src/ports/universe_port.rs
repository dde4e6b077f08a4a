//! Default symbol-universe port.

use crate::domain::error::EdgeFinderError;

pub trait UniversePort {
    fn default_universe(&self) -> Result<Vec<String>, EdgeFinderError>;
}
