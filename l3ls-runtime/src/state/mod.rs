mod learning_table;
pub use self::learning_table::*;

mod switch_registry;
pub use self::switch_registry::*;
