// Copyright 2024 the Pathmorph Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sub-paths and the decomposition of a flat command list into them.

use core::mem;

use kurbo::Point;

use crate::{Command, CommandKind};

/// Endpoints closer than this are treated as the same point.
const CLOSE_EPSILON: f64 = 1e-9;

/// A run of commands starting with exactly one move.
#[derive(Clone, Debug, PartialEq)]
pub struct SubPath {
    commands: Vec<Command>,
    closed: bool,
}

impl SubPath {
    /// Wrap `commands`, which must begin with a move.
    pub(crate) fn new(commands: Vec<Command>) -> Self {
        debug_assert!(
            commands
                .first()
                .is_some_and(|c| c.kind() == CommandKind::MoveTo),
            "a sub-path starts with a move"
        );
        let closed = is_closed(&commands);
        SubPath { commands, closed }
    }

    /// The commands of this sub-path, the leading move included.
    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of commands, the leading move included.
    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether this sub-path has no commands. Never true for a sub-path
    /// produced by [`decompose`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// A sub-path is closed if it ends with a close, or if its last point
    /// coincides with its first.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The destination of the leading move.
    pub fn start(&self) -> Point {
        self.commands.first().map_or(Point::ZERO, Command::end)
    }

    /// The end point of the last command.
    pub fn end(&self) -> Point {
        self.commands.last().map_or(Point::ZERO, Command::end)
    }
}

pub(crate) fn is_closed(commands: &[Command]) -> bool {
    match commands {
        [first, .., last] => {
            last.kind() == CommandKind::ClosePath
                || (last.end() - first.end()).hypot2() <= CLOSE_EPSILON * CLOSE_EPSILON
        }
        _ => false,
    }
}

/// Group a flat command list into sub-paths.
///
/// A move starts a new sub-path and a close ends the current one. Drawing
/// commands that follow a close without a move of their own get a synthetic
/// move to the most recent move's destination, so every sub-path is
/// self-contained.
///
/// A list that is empty, or that does not begin with a move, yields no
/// sub-paths.
pub fn decompose(commands: &[Command]) -> Vec<SubPath> {
    let Some(first) = commands.first() else {
        return Vec::new();
    };
    if first.kind() != CommandKind::MoveTo {
        log::warn!(
            "path data starts with {:?} instead of a move; ignoring {} commands",
            first.kind(),
            commands.len()
        );
        return Vec::new();
    }
    let mut sub_paths = Vec::new();
    let mut current: Vec<Command> = Vec::new();
    let mut last_move = first.end();
    let mut pen = first.start();
    for command in commands {
        match command.kind() {
            CommandKind::MoveTo => {
                if !current.is_empty() {
                    sub_paths.push(SubPath::new(mem::take(&mut current)));
                }
                last_move = command.end();
                current.push(command.clone());
            }
            kind => {
                if current.is_empty() {
                    log::trace!("synthesizing a move to {last_move:?} after a close");
                    current.push(Command::move_to(pen, last_move));
                }
                current.push(command.clone());
                if kind == CommandKind::ClosePath {
                    sub_paths.push(SubPath::new(mem::take(&mut current)));
                }
            }
        }
        pen = command.end();
    }
    if !current.is_empty() {
        sub_paths.push(SubPath::new(current));
    }
    sub_paths
}
