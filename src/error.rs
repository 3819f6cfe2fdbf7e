// Copyright 2024 the Pathmorph Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use core::fmt;

use kurbo::SvgParseError;

/// An error building a [`PathModel`](crate::PathModel) from path data.
#[derive(Debug)]
pub enum PathError {
    /// The path data could not be parsed.
    Parse(SvgParseError),
    /// The path data does not begin with a move command.
    MissingMoveTo,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Parse(err) => write!(f, "invalid path data: {err}"),
            PathError::MissingMoveTo => write!(f, "path data must begin with a move command"),
        }
    }
}

impl std::error::Error for PathError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PathError::Parse(err) => Some(err),
            PathError::MissingMoveTo => None,
        }
    }
}

impl From<SvgParseError> for PathError {
    fn from(err: SvgParseError) -> Self {
        PathError::Parse(err)
    }
}

/// An error morphing between two paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MorphError {
    /// The paths differ in sub-path count, command count, or command kinds.
    IncompatibleTopology,
}

impl fmt::Display for MorphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MorphError::IncompatibleTopology => {
                write!(f, "paths do not have matching topology")
            }
        }
    }
}

impl std::error::Error for MorphError {}
