pub mod group;
pub mod table;

pub use group::{MarshalGroup, TargetStorage};
pub use table::MarshalTable;
