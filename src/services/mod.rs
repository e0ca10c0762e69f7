pub mod clock;
pub mod distance;
pub mod filters;
pub mod metrics;
pub mod nearby;
pub mod open_now;
pub mod restaurants;
