mod rest_type;
mod row_store;

pub use rest_type::{ChangesType, RowType};
pub use row_store::{ChangeStream, RowStoreClient};
