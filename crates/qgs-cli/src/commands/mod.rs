pub mod canonicalize;
pub mod check;
pub mod normalize;
