#![forbid(unsafe_code)]

pub mod question_bank;
pub mod repository;
pub mod response_log;
pub mod sqlite;

pub use question_bank::{QuestionBank, QuestionBankError};
pub use repository::{SessionHistoryRepository, SessionRow, Storage, StorageError, StoredSession};
pub use response_log::{JsonFileResponseLog, MemoryResponseLog, ResponseLog, ResponseLogError};
