pub mod depots;
pub mod jobs;
pub mod optimization;
pub mod route_plans;
pub mod shipments;
pub mod vehicles;
pub mod violations;
