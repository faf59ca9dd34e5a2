pub mod analysis;
pub mod bands;
pub mod decode;
pub mod normalize;
