mod column;
mod column_set;
mod portable_type;
mod table_structure;

pub use column::*;
pub use column_set::*;
pub use portable_type::*;
pub use table_structure::*;
