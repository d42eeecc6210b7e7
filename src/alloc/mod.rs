pub mod arena;
pub mod ring;

pub use arena::Arena;
pub use ring::Ring;
