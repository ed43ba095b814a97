pub mod file_log;
pub mod graphql_probe;
pub mod sqlite_repository;

pub use file_log::FileJobLog;
pub use graphql_probe::GraphqlHelloProbe;
pub use sqlite_repository::SqliteRepository;
