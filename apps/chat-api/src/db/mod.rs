pub mod history;
pub mod pool;
pub mod schema;
