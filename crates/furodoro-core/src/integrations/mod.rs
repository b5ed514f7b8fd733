//! External services the timer talks to.

pub mod lifeup;

pub use lifeup::{
    category_error_placeholder, report_notice, Category, LifeUpClient, SelectorState,
    SessionReport, TaskItem, TaskListing,
};
