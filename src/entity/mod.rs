pub mod dish;
pub mod restaurant;
pub mod sub_menu;
pub mod user;
