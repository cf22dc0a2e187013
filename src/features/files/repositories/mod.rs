mod file_repository;
mod file_repository_pg;

pub use file_repository::FileRecordStore;
pub use file_repository_pg::PgFileRecordStore;
