pub mod model;
pub mod update;
pub mod view;

pub use model::*;
pub use update::*;
pub use view::*;
