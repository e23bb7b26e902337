pub mod model;

pub use model::{TransferDirection, TransferRecord};
