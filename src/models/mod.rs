// Persisted rows and request/response DTOs

pub mod coach;
pub mod customer;
pub mod diet;
pub mod library;
pub mod notification;
pub mod nutrition;
pub mod pagination;
pub mod training_plan;

pub use coach::*;
pub use customer::*;
pub use diet::*;
pub use library::*;
pub use notification::*;
pub use nutrition::*;
pub use pagination::*;
pub use training_plan::*;
