//! Log records and transaction rollback / crash recovery through whole-block
//! shadow images.

pub mod error;
pub mod log_record;
pub mod recovery_manager;
pub mod update_record;

pub use error::RecoveryError;
pub use log_record::{LogRecord, COMMIT, ROLLBACK, START, UPDATE};
pub use recovery_manager::{RecoveryManager, SHADOW_SUFFIX};
pub use update_record::UpdateRecord;
