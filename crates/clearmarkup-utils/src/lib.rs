pub mod string;
pub mod time;
