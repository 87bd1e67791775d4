pub mod analysis;
pub mod company;
pub mod news;
pub mod price;

pub use analysis::*;
pub use company::*;
pub use news::*;
pub use price::*;
