pub mod table;
pub mod store;
pub mod catalog;

pub use table::{ResultSet, Row, Table, Value};
pub use store::TableStore;
pub use catalog::Catalog;
