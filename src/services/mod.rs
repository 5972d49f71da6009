// Business logic services

pub mod coach_service;
pub mod customer_service;
pub mod diet_service;
pub mod library_service;
pub mod notification_service;
pub mod nutrition_service;
pub mod superset;
pub mod training_plan_service;

pub use coach_service::CoachService;
pub use customer_service::CustomerService;
pub use diet_service::DietService;
pub use library_service::LibraryService;
pub use notification_service::NotificationService;
pub use nutrition_service::NutritionService;
pub use training_plan_service::TrainingPlanService;
