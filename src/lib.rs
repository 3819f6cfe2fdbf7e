// Copyright 2024 the Pathmorph Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A reversible, non-destructive editing model for vector paths.
//!
//! A [`PathModel`] wraps a path made of move, line, quadratic, cubic, and
//! close commands. Points can be inserted ("split") and removed again
//! ("unsplit"), commands can change kind, sub-paths can be reversed, and
//! closed sub-paths can be rotated to start at a different point. None of
//! these edits destroys the imported commands, so [`PathModel::revert`]
//! always recovers the original path.
//!
//! Geometry and path data parsing come from [`kurbo`].
//!
//! # Examples
//!
//! ```
//! use pathmorph::PathModel;
//!
//! let path = PathModel::from_svg("M 0 0 L 10 0 L 10 10 Z").unwrap();
//! let split = path.split_in_half(0, 1);
//! assert_eq!(split.sub_paths()[0].len(), 5);
//! assert_eq!(split.revert().svg(), path.svg());
//! ```
//!
//! Finding the nearest point on a path and inserting a point there:
//!
//! ```
//! use kurbo::Point;
//! use pathmorph::PathModel;
//!
//! let path = PathModel::from_svg("M 0 0 L 10 0 L 10 10 Z").unwrap();
//! let hit = path.project(Point::new(4.0, 1.0)).unwrap();
//! assert!((hit.projection().distance - 1.0).abs() < 1e-9);
//! let split = hit.split();
//! assert_eq!(split.sub_paths()[0].commands()[1].end(), Point::new(4.0, 0.0));
//! ```
//!
//! # Features
//!
//! - `serde`: serialization of commands, mutations, identifiers, and
//!   projections.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod command;
mod edit;
mod error;
mod model;
mod morph;
mod mutation;
mod rebuild;
mod subpath;

pub use crate::command::{commands_from_elements, Command, CommandKind};
pub use crate::edit::SplitRequest;
pub use crate::error::{MorphError, PathError};
pub use crate::model::{CommandLocation, PathModel, DEFAULT_ACCURACY};
pub use crate::morph::PathProjection;
pub use crate::mutation::{CommandId, CommandMutation, Projection};
pub use crate::subpath::{decompose, SubPath};
