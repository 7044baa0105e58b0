// Postgres-backed template store
pub mod postgres;

pub use postgres::PostgresTemplateStore;
