mod generate;
mod rate;
mod train;

pub use generate::GenerateArgs;
pub use rate::RateArgs;
pub use train::{TrainGeneratorArgs, TrainRaterArgs};
