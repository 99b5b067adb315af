pub mod node_pool;
pub mod order_list;

pub use node_pool::{Entry, EntryHandle, NodePool};
pub use order_list::OrderList;
