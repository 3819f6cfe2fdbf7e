// Copyright 2024 the Pathmorph Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immutable path model.

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use kurbo::{BezPath, Point};

use crate::rebuild::sub_path_commands;
use crate::subpath::decompose;
use crate::{commands_from_elements, Command, CommandId, CommandMutation, PathError, SubPath};

/// Accuracy used for arc length and nearest point queries unless
/// [`PathModel::with_accuracy`] says otherwise.
pub const DEFAULT_ACCURACY: f64 = 1e-6;

/// An editable vector path.
///
/// A `PathModel` is an immutable value. Every edit returns a new model and
/// leaves the receiver untouched, so an undo stack is simply a list of
/// models. Mutation state is shared between versions and copied on write.
///
/// Edits address commands by *logical* index: the position of the command as
/// currently displayed, after reversal and shifting, with `0` being the
/// sub-path's move.
#[derive(Clone, Debug)]
pub struct PathModel {
    sub_paths: Vec<SubPath>,
    pub(crate) mutations: Vec<Arc<Vec<CommandMutation>>>,
    pub(crate) shift_offsets: Vec<usize>,
    pub(crate) reversals: Vec<bool>,
    svg: String,
    pub(crate) accuracy: f64,
}

/// Everything a model is rebuilt from.
#[derive(Clone, Debug)]
pub(crate) struct EditState {
    pub(crate) mutations: Vec<Arc<Vec<CommandMutation>>>,
    pub(crate) shift_offsets: Vec<usize>,
    pub(crate) reversals: Vec<bool>,
}

/// Where a logical command index lands in a sub-path's mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandLocation {
    /// Index of the mutation within the sub-path.
    pub mutation: usize,
    /// Index of the live command within the mutation.
    pub offset: usize,
    /// Index of the live command in the sub-path's unreversed, unshifted
    /// command list.
    pub flat: usize,
}

impl PathModel {
    /// Build a model from a flat command list.
    ///
    /// A list that does not begin with a move produces an empty model.
    pub fn from_commands(commands: impl IntoIterator<Item = Command>) -> Self {
        let commands: Vec<Command> = commands.into_iter().collect();
        let mut ordinal = 0;
        let mutations: Vec<Arc<Vec<CommandMutation>>> = decompose(&commands)
            .into_iter()
            .map(|sub_path| {
                let mutations = sub_path
                    .commands()
                    .iter()
                    .map(|command| {
                        let mutation = CommandMutation::new(ordinal, command.clone());
                        ordinal += 1;
                        mutation
                    })
                    .collect();
                Arc::new(mutations)
            })
            .collect();
        let n = mutations.len();
        Self::build(
            EditState {
                mutations,
                shift_offsets: vec![0; n],
                reversals: vec![false; n],
            },
            DEFAULT_ACCURACY,
        )
    }

    /// Build a model from a `kurbo` path.
    pub fn from_bez_path(path: &BezPath) -> Self {
        Self::from_commands(commands_from_elements(path.elements().iter().copied()))
    }

    /// Parse SVG path data.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::MissingMoveTo`] if the data does not begin with a
    /// move, or [`PathError::Parse`] if it is not valid path data.
    pub fn from_svg(data: &str) -> Result<Self, PathError> {
        match data.trim_start().chars().next() {
            None => return Ok(Self::from_commands([])),
            Some('M' | 'm') => {}
            Some(_) => return Err(PathError::MissingMoveTo),
        }
        let path = BezPath::from_svg(data)?;
        Ok(Self::from_bez_path(&path))
    }

    /// Use `accuracy` for arc length and nearest point queries.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// The accuracy used for arc length and nearest point queries.
    #[inline]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// The displayed path as SVG path data.
    #[inline]
    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// The displayed sub-paths.
    #[inline]
    pub fn sub_paths(&self) -> &[SubPath] {
        &self.sub_paths
    }

    /// Number of sub-paths.
    #[inline]
    pub fn sub_path_count(&self) -> usize {
        self.sub_paths.len()
    }

    /// All displayed commands, sub-path by sub-path.
    pub fn commands(&self) -> impl Iterator<Item = &Command> + '_ {
        self.sub_paths.iter().flat_map(|s| s.commands())
    }

    /// The mutations of sub-path `sub_idx`, in original order.
    ///
    /// # Panics
    ///
    /// Panics if `sub_idx` is out of range.
    pub fn mutations(&self, sub_idx: usize) -> &[CommandMutation] {
        self.check_sub_path(sub_idx);
        &self.mutations[sub_idx]
    }

    /// Whether sub-path `sub_idx` is closed.
    ///
    /// # Panics
    ///
    /// Panics if `sub_idx` is out of range.
    pub fn is_closed(&self, sub_idx: usize) -> bool {
        self.check_sub_path(sub_idx);
        self.sub_paths[sub_idx].is_closed()
    }

    /// Whether sub-path `sub_idx` is displayed reversed.
    ///
    /// # Panics
    ///
    /// Panics if `sub_idx` is out of range.
    pub fn is_reversed(&self, sub_idx: usize) -> bool {
        self.check_sub_path(sub_idx);
        self.reversals[sub_idx]
    }

    /// The rotation applied to sub-path `sub_idx`, counted in original
    /// command order.
    ///
    /// # Panics
    ///
    /// Panics if `sub_idx` is out of range.
    pub fn shift_offset(&self, sub_idx: usize) -> usize {
        self.check_sub_path(sub_idx);
        self.shift_offsets[sub_idx]
    }

    /// Length of the path as reported to renderers: the length of the
    /// *first* sub-path only.
    ///
    /// Later sub-paths are ignored for compatibility with existing
    /// consumers. See [`PathModel::total_length_all`] for the full length.
    pub fn total_length(&self) -> f64 {
        self.mutations.first().map_or(0.0, |mutations| {
            mutations
                .iter()
                .map(|m| m.path_length(self.accuracy))
                .sum()
        })
    }

    /// Length of every sub-path combined.
    pub fn total_length_all(&self) -> f64 {
        self.mutations
            .iter()
            .flat_map(|mutations| mutations.iter())
            .map(|m| m.path_length(self.accuracy))
            .sum()
    }

    /// The displayed path as a `kurbo` path.
    pub fn to_bez_path(&self) -> BezPath {
        self.commands().map(Command::to_path_el).collect()
    }

    /// Identifier of the command displayed at `cmd_idx` of sub-path
    /// `sub_idx`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn identifier_at(&self, sub_idx: usize, cmd_idx: usize) -> CommandId {
        let loc = self.find_command_mutation(sub_idx, cmd_idx);
        self.mutations[sub_idx][loc.mutation].identifier_at(loc.offset)
    }

    /// Resolve a logical command index to the mutation holding it.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range. An out of range index is a
    /// caller bug, not a recoverable condition.
    pub fn find_command_mutation(&self, sub_idx: usize, cmd_idx: usize) -> CommandLocation {
        self.check_sub_path(sub_idx);
        let count = self.sub_paths[sub_idx].len();
        assert!(
            cmd_idx < count,
            "command index {cmd_idx} out of range for sub-path {sub_idx} with {count} commands"
        );
        let mut ix = cmd_idx;
        if self.reversals[sub_idx] && ix != 0 {
            ix = count - ix;
        }
        ix += self.shift_offsets[sub_idx];
        if ix >= count {
            ix -= count - 1;
        }
        let mut total = 0;
        for (mutation, m) in self.mutations[sub_idx].iter().enumerate() {
            if ix < total + m.len() {
                return CommandLocation {
                    mutation,
                    offset: ix - total,
                    flat: ix,
                };
            }
            total += m.len();
        }
        panic!("no mutation holds command {cmd_idx} of sub-path {sub_idx}");
    }

    /// The unreversed, unshifted index of a live command.
    pub(crate) fn flat_index(&self, sub_idx: usize, mutation: usize, offset: usize) -> usize {
        self.mutations[sub_idx][..mutation]
            .iter()
            .map(CommandMutation::len)
            .sum::<usize>()
            + offset
    }

    pub(crate) fn check_sub_path(&self, sub_idx: usize) {
        assert!(
            sub_idx < self.sub_paths.len(),
            "sub-path index {sub_idx} out of range for a path with {} sub-paths",
            self.sub_paths.len()
        );
    }

    /// The current edit state, ready to be partly overridden.
    pub(crate) fn state(&self) -> EditState {
        EditState {
            mutations: self.mutations.clone(),
            shift_offsets: self.shift_offsets.clone(),
            reversals: self.reversals.clone(),
        }
    }

    /// A new model from `state`, with this model's accuracy.
    pub(crate) fn rebuild(&self, state: EditState) -> Self {
        Self::build(state, self.accuracy)
    }

    fn build(state: EditState, accuracy: f64) -> Self {
        let mut sub_paths = Vec::with_capacity(state.mutations.len());
        let mut pen: Option<Point> = None;
        for ((mutations, &offset), &reversed) in state
            .mutations
            .iter()
            .zip(&state.shift_offsets)
            .zip(&state.reversals)
        {
            let mut commands = sub_path_commands(mutations, reversed, offset);
            // Moves originate where the previous sub-path ended.
            if let Some(first) = commands.first_mut() {
                let dest = first.end();
                *first = first.clone().with_endpoints(pen.unwrap_or(dest), dest);
            }
            pen = commands.last().map(Command::end);
            sub_paths.push(SubPath::new(commands));
        }
        let svg = sub_paths
            .iter()
            .flat_map(|s| s.commands())
            .map(Command::to_path_el)
            .collect::<BezPath>()
            .to_svg();
        log::trace!("rebuilt path {svg:?}");
        PathModel {
            sub_paths,
            mutations: state.mutations,
            shift_offsets: state.shift_offsets,
            reversals: state.reversals,
            svg,
            accuracy,
        }
    }
}

impl fmt::Display for PathModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.svg)
    }
}

impl FromStr for PathModel {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_svg(s)
    }
}

impl From<&BezPath> for PathModel {
    fn from(path: &BezPath) -> Self {
        Self::from_bez_path(path)
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{BezPath, Point};

    use super::{CommandLocation, PathModel};
    use crate::{CommandKind, PathError};

    fn triangle() -> PathModel {
        PathModel::from_svg("M 0 0 L 10 0 L 10 10 Z").unwrap()
    }

    #[test]
    fn parse_triangle() {
        let path = triangle();
        assert_eq!(path.sub_path_count(), 1);
        assert_eq!(path.sub_paths()[0].len(), 4);
        assert!(path.is_closed(0));
        assert_eq!(path.svg(), BezPath::from_svg("M0 0L10 0L10 10Z").unwrap().to_svg());
        assert_eq!(path.to_string(), path.svg());
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            PathModel::from_svg("L 1 1"),
            Err(PathError::MissingMoveTo)
        ));
        assert!(matches!(
            "M 0 0 L 1".parse::<PathModel>(),
            Err(PathError::Parse(_))
        ));
        assert_eq!(PathModel::from_svg("  ").unwrap().sub_path_count(), 0);
    }

    #[test]
    fn commands_without_move_give_an_empty_model() {
        let path = PathModel::from_commands([crate::Command::line_to((0.0, 0.0), (1.0, 0.0))]);
        assert_eq!(path.sub_path_count(), 0);
        assert_eq!(path.svg(), "");
        assert!(path.project(Point::ZERO).is_none());
    }

    #[test]
    fn length_counts_only_the_first_sub_path() {
        let path = PathModel::from_svg("M0 0 L3 4 M10 10 L20 10").unwrap();
        assert!((path.total_length() - 5.0).abs() < 1e-9);
        assert!((path.total_length_all() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn closing_line_counts_toward_length() {
        let path = triangle();
        let expected = 20.0 + 200f64.sqrt();
        assert!((path.total_length() - expected).abs() < 1e-6);
    }

    #[test]
    fn resolve_plain_indices() {
        let path = triangle();
        assert_eq!(
            path.find_command_mutation(0, 2),
            CommandLocation {
                mutation: 2,
                offset: 0,
                flat: 2
            }
        );
    }

    #[test]
    fn resolve_reversed_and_shifted_indices() {
        let path = triangle().reverse(0);
        assert_eq!(path.find_command_mutation(0, 0).mutation, 0);
        assert_eq!(path.find_command_mutation(0, 1).mutation, 3);
        assert_eq!(path.find_command_mutation(0, 3).mutation, 1);

        let path = triangle().shift_forward(0, 1);
        // The move now lands on the end of the first line.
        assert_eq!(path.find_command_mutation(0, 0).mutation, 1);
        assert_eq!(path.find_command_mutation(0, 1).mutation, 2);
        assert_eq!(path.find_command_mutation(0, 3).mutation, 1);
    }

    #[test]
    fn resolved_commands_match_the_display() {
        let path = PathModel::from_svg("M0 0 L4 0 L4 4 L0 4 Z")
            .unwrap()
            .split_in_half(0, 2)
            .reverse(0)
            .shift_forward(0, 2);
        let displayed = path.sub_paths()[0].commands();
        for (cmd_idx, command) in displayed.iter().enumerate().skip(1) {
            let loc = path.find_command_mutation(0, cmd_idx);
            let live = &path.mutations(0)[loc.mutation].live_commands()[loc.offset];
            // Displayed reversed, so endpoints swap.
            assert_eq!(command.start(), live.end(), "command {cmd_idx}");
            assert_eq!(command.end(), live.start(), "command {cmd_idx}");
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn resolve_out_of_range_panics() {
        triangle().find_command_mutation(0, 4);
    }

    #[test]
    fn moves_follow_the_previous_sub_path() {
        let path = PathModel::from_svg("M0 0 L5 0 M10 10 L20 10").unwrap().reverse(0);
        let second = &path.sub_paths()[1].commands()[0];
        assert_eq!(second.kind(), CommandKind::MoveTo);
        assert_eq!(second.start(), Point::ZERO);
        assert_eq!(path.sub_paths()[0].commands()[0].start(), Point::new(5.0, 0.0));
    }

    #[test]
    fn bez_path_round_trip() {
        let path = triangle();
        let again = PathModel::from(&path.to_bez_path());
        assert_eq!(again.svg(), path.svg());
    }
}
