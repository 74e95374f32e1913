//! Price data access port trait.

use crate::domain::error::TradesigError;
use crate::domain::frame::PriceFrame;

pub trait DataPort {
    /// Load every row of `source` into a frame ordered by time.
    fn load_frame(&self, source: &str) -> Result<PriceFrame, TradesigError>;
}
