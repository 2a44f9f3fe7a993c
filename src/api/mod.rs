pub mod course;
pub mod health;
pub mod swagger;
pub mod user;
