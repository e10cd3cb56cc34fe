pub mod conversation;
pub mod skills;
