pub mod asset;
pub mod claim;
pub mod constants;
pub mod deposit;
pub mod error;
pub mod types;

pub use asset::*;
pub use claim::*;
pub use constants::*;
pub use deposit::*;
pub use error::{OracleError, StrongboxError, TransferError};
pub use types::*;
