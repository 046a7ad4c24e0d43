//! Two-wire bus controllers

pub mod bitbang;

#[cfg(test)]
mod wire;
