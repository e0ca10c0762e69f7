pub mod feature;
pub mod operating_hour;
pub mod restaurant;
pub mod search;
