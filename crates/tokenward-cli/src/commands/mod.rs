pub mod access;
pub mod keygen;
pub mod token;
