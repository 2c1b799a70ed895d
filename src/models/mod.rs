pub mod cart;
pub mod contact;
pub mod payment;
pub mod product;
pub mod user;

pub use cart::*;
pub use contact::*;
pub use payment::*;
pub use product::*;
pub use user::*;
