pub mod adoption;
pub mod animal;
pub mod comment;
pub mod publication;
pub mod user;

pub use adoption::*;
pub use animal::*;
pub use comment::*;
pub use publication::*;
pub use user::*;
