pub mod comment;
pub mod enums;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;
