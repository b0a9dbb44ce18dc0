// Copyright (C) Pavel Grebnev 2024
// Distributed under the MIT License (license terms are at http://opensource.org/licenses/MIT).

//! Error types for the checked accessors of the containers.

/// Errors reported by the checked accessors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The key does not name a live value: it was erased, cleared, or belongs to another map.
    #[error("no value for key with index {index} and generation {generation}")]
    OutOfRange { index: usize, generation: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
