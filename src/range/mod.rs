pub mod align;
pub mod codec;
