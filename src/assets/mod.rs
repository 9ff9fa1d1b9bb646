pub mod avatar;
pub mod color;
pub mod decode;
