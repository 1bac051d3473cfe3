pub mod input;
pub mod scroll;
pub mod url;
