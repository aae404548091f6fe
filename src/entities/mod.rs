pub mod property;
pub mod session;

pub use property::Entity as Property;
pub use session::Entity as Session;
