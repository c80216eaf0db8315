pub mod accounts;
pub mod cart;
pub mod comments;
pub mod courses;
pub mod educators;
pub mod likes;
pub mod orders;
pub mod users;
