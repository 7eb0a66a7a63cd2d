pub use display::{window, Display};

mod display;
