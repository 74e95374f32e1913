//! Signal report port trait.

use crate::domain::compiler::Signals;
use crate::domain::error::TradesigError;
use crate::domain::frame::PriceFrame;
use crate::domain::strategy::StrategyDefinition;

/// Port for writing evaluated signals.
pub trait ReportPort {
    fn write(
        &self,
        frame: &PriceFrame,
        signals: &Signals,
        strategy: &StrategyDefinition,
        output_path: &str,
    ) -> Result<(), TradesigError>;
}
