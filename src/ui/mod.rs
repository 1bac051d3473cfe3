pub mod chat_loop;
pub mod picker;
pub mod renderer;
