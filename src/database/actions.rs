pub mod ingredients;
pub mod marks;
pub mod recipes;
pub mod shopping_list;
pub mod tags;
pub mod users;

pub use ingredients::*;
pub use marks::*;
pub use recipes::*;
pub use shopping_list::*;
pub use tags::*;
pub use users::*;
