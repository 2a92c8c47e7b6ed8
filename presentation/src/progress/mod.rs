//! Progress reporting while a review runs

pub mod reporter;
