// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Represents errors that can occur in the stab-forest
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// An appended event preceded the previously appended event in
    /// lexicographic `(start, end)` order
    UnorderedAppend,

    /// A parallel join task panicked; the first observed failure is
    /// surfaced when the task runtime is joined
    TaskFailed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StabForestError: {self:?}")
    }
}

impl std::error::Error for Error {}

/// Stab-forest result
pub type Result<T> = std::result::Result<T, Error>;
