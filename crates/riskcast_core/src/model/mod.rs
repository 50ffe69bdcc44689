mod aligned;
mod results;
mod return_model;
mod series;

pub use aligned::AlignedReturnMatrix;
pub use results::{AnnualizedStats, SharpeRating, SimulationResult};
pub use return_model::ReturnModel;
pub use series::ReturnSeries;
