pub mod core;

// Re-export commonly used types
pub use crate::core::adapter::{Adapter, AdapterModel};
pub use crate::core::codec::{CodecRegistry, TextCodec};
pub use crate::core::errors::{MarshalError, MarshalResult};
pub use crate::core::runtime::SignalRuntime;
pub use crate::core::types::{
    MarshalDir, MarshalKind, MarshalType, ValueRef, Variable, VariableDecl,
};
