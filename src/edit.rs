// Copyright 2024 the Pathmorph Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edits. Each one computes new mutation state and rebuilds the model.

use std::sync::Arc;

use kurbo::Affine;
use smallvec::SmallVec;

use crate::model::CommandLocation;
use crate::{Command, CommandKind, PathModel};

/// One request of a [`PathModel::split_batch`].
#[derive(Clone, Debug, PartialEq)]
pub struct SplitRequest {
    /// Sub-path index.
    pub sub_path: usize,
    /// Logical command index within the sub-path.
    pub command: usize,
    /// Positions along the command, each in `(0, 1)`.
    pub params: Vec<f64>,
}

impl SplitRequest {
    /// A request to split one command at `params`.
    pub fn new(sub_path: usize, command: usize, params: impl Into<Vec<f64>>) -> Self {
        SplitRequest {
            sub_path,
            command,
            params: params.into(),
        }
    }
}

impl PathModel {
    /// Toggle the direction of sub-path `sub_idx`.
    ///
    /// # Panics
    ///
    /// Panics if `sub_idx` is out of range.
    #[must_use]
    pub fn reverse(&self, sub_idx: usize) -> Self {
        self.check_sub_path(sub_idx);
        let mut state = self.state();
        state.reversals[sub_idx] = !state.reversals[sub_idx];
        log::debug!("reversing sub-path {sub_idx}");
        self.rebuild(state)
    }

    /// Move the start point of closed sub-path `sub_idx` forward by `n`
    /// commands, in the direction the sub-path is currently drawn.
    ///
    /// Open sub-paths are returned unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `sub_idx` is out of range.
    #[must_use]
    pub fn shift_forward(&self, sub_idx: usize, n: usize) -> Self {
        self.shift_by(sub_idx, n, true)
    }

    /// Move the start point of closed sub-path `sub_idx` back by `n`
    /// commands.
    ///
    /// Open sub-paths are returned unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `sub_idx` is out of range.
    #[must_use]
    pub fn shift_back(&self, sub_idx: usize, n: usize) -> Self {
        self.shift_by(sub_idx, n, false)
    }

    fn shift_by(&self, sub_idx: usize, n: usize, forward: bool) -> Self {
        self.check_sub_path(sub_idx);
        let sub_path = &self.sub_paths()[sub_idx];
        if sub_path.len() <= 1 || !sub_path.is_closed() {
            log::debug!("sub-path {sub_idx} is not closed; not shifting");
            return self.clone();
        }
        let period = sub_path.len() - 1;
        let step = n % period;
        // Offsets are stored in original order, so a reversed sub-path
        // moves the other way.
        let advance = forward != self.reversals[sub_idx];
        let current = self.shift_offsets[sub_idx];
        let offset = if advance {
            (current + step) % period
        } else {
            (current + period - step) % period
        };
        let mut state = self.state();
        state.shift_offsets[sub_idx] = offset;
        self.rebuild(state)
    }

    /// Split the command displayed at `cmd_idx` of sub-path `sub_idx` at
    /// each of `params`, positions along that command in `(0, 1)`.
    ///
    /// An empty `params` is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range, or if `cmd_idx` is `0`: a
    /// sub-path's move cannot be split.
    #[must_use]
    pub fn split(&self, sub_idx: usize, cmd_idx: usize, params: &[f64]) -> Self {
        if params.is_empty() {
            log::warn!("split of command {cmd_idx} in sub-path {sub_idx} has no parameters");
            return self.clone();
        }
        assert!(cmd_idx != 0, "the move of sub-path {sub_idx} cannot be split");
        let loc = self.find_command_mutation(sub_idx, cmd_idx);
        // A reversed command is traveled from its end.
        let params: SmallVec<[f64; 4]> = if self.reversals[sub_idx] {
            params.iter().map(|p| 1.0 - p).collect()
        } else {
            params.iter().copied().collect()
        };
        self.split_resolved(sub_idx, loc, &params)
    }

    /// Split the command displayed at `cmd_idx` of sub-path `sub_idx` in
    /// two.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`PathModel::split`].
    #[must_use]
    pub fn split_in_half(&self, sub_idx: usize, cmd_idx: usize) -> Self {
        self.split(sub_idx, cmd_idx, &[0.5])
    }

    /// Apply several splits, addressed by their logical indices in this
    /// model.
    ///
    /// Requests are applied from the highest `(sub_path, command)` down, so
    /// no split shifts the index of a request still waiting. Requests naming
    /// the same command are merged. The result does not depend on the order
    /// of `requests`.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`PathModel::split`].
    #[must_use]
    pub fn split_batch(&self, requests: &[SplitRequest]) -> Self {
        if requests.is_empty() {
            log::warn!("batch split has no requests");
            return self.clone();
        }
        let mut ordered = requests.to_vec();
        ordered.sort_by(|a, b| (b.sub_path, b.command).cmp(&(a.sub_path, a.command)));
        let mut merged: Vec<SplitRequest> = Vec::with_capacity(ordered.len());
        for request in ordered {
            match merged.last_mut() {
                Some(last) if (last.sub_path, last.command) == (request.sub_path, request.command) => {
                    last.params.extend(request.params);
                }
                _ => merged.push(request),
            }
        }
        merged.iter().fold(self.clone(), |model, request| {
            model.split(request.sub_path, request.command, &request.params)
        })
    }

    /// Split a resolved live command at `params`, positions along it in its
    /// original direction.
    pub(crate) fn split_resolved(&self, sub_idx: usize, loc: CommandLocation, params: &[f64]) -> Self {
        let mut state = self.state();
        let inserted = Arc::make_mut(&mut state.mutations[sub_idx])[loc.mutation]
            .split_at(loc.offset, params);
        if inserted == 0 {
            return self.clone();
        }
        // Keep the pivot on the same command.
        let pivot = &mut state.shift_offsets[sub_idx];
        if *pivot != 0 && loc.flat <= *pivot {
            *pivot += inserted;
        }
        log::debug!(
            "split command {} of sub-path {sub_idx} into {} commands",
            loc.flat,
            inserted + 1
        );
        self.rebuild(state)
    }

    /// Remove the split point at the end of the command displayed at
    /// `cmd_idx` of sub-path `sub_idx`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range, or if the command does not
    /// end at a split point.
    #[must_use]
    pub fn unsplit(&self, sub_idx: usize, cmd_idx: usize) -> Self {
        assert!(cmd_idx != 0, "the move of sub-path {sub_idx} is not a split point");
        let loc = self.find_command_mutation(sub_idx, cmd_idx);
        // A reversed command ends where the live command starts.
        let split_offset = if self.reversals[sub_idx] {
            assert!(
                loc.offset > 0,
                "command {cmd_idx} of sub-path {sub_idx} does not end at a split point"
            );
            loc.offset - 1
        } else {
            loc.offset
        };
        let mut state = self.state();
        Arc::make_mut(&mut state.mutations[sub_idx])[loc.mutation].unsplit_at(split_offset);

        let removed = loc.flat - loc.offset + split_offset;
        let period = self.sub_paths()[sub_idx].len() - 2;
        let pivot = &mut state.shift_offsets[sub_idx];
        if *pivot >= removed {
            *pivot -= 1;
        }
        if period > 0 {
            *pivot %= period;
        }
        log::debug!("unsplit command {removed} of sub-path {sub_idx}");
        self.rebuild(state)
    }

    /// Apply several unsplits, addressed by `(sub_path, command)` logical
    /// indices in this model, from the highest index down.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`PathModel::unsplit`].
    #[must_use]
    pub fn unsplit_batch(&self, requests: &[(usize, usize)]) -> Self {
        let mut ordered = requests.to_vec();
        ordered.sort_unstable_by(|a, b| b.cmp(a));
        ordered.dedup();
        ordered
            .into_iter()
            .fold(self.clone(), |model, (sub_idx, cmd_idx)| model.unsplit(sub_idx, cmd_idx))
    }

    /// Change the kind of the command displayed at `cmd_idx` of sub-path
    /// `sub_idx` to `kind`, one of line, quadratic, or cubic.
    ///
    /// Moves are never converted; such requests are no-ops.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[must_use]
    pub fn convert(&self, sub_idx: usize, cmd_idx: usize, kind: CommandKind) -> Self {
        let loc = self.find_command_mutation(sub_idx, cmd_idx);
        if cmd_idx == 0 {
            log::warn!("the move of sub-path {sub_idx} cannot be converted");
            return self.clone();
        }
        let mut state = self.state();
        let converted =
            Arc::make_mut(&mut state.mutations[sub_idx])[loc.mutation].convert_at(loc.offset, kind);
        if !converted {
            return self.clone();
        }
        self.rebuild(state)
    }

    /// Restore the original kind of every command of sub-path `sub_idx`,
    /// keeping splits.
    ///
    /// # Panics
    ///
    /// Panics if `sub_idx` is out of range.
    #[must_use]
    pub fn unconvert(&self, sub_idx: usize) -> Self {
        self.check_sub_path(sub_idx);
        let mut state = self.state();
        for mutation in Arc::make_mut(&mut state.mutations[sub_idx]).iter_mut().skip(1) {
            mutation.unconvert_all();
        }
        self.rebuild(state)
    }

    /// Discard every split, conversion, reversal, and shift, returning the
    /// path as it was imported.
    #[must_use]
    pub fn revert(&self) -> Self {
        let backing: Vec<Command> = self
            .mutations
            .iter()
            .flat_map(|mutations| mutations.iter())
            .map(|m| m.backing_command().clone())
            .collect();
        Self::from_commands(backing).with_accuracy(self.accuracy)
    }

    /// Apply an affine transform to the whole path, keeping its edit history.
    #[must_use]
    pub fn transform(&self, affine: Affine) -> Self {
        let mut state = self.state();
        for mutations in &mut state.mutations {
            *mutations = Arc::new(mutations.iter().map(|m| m.transformed(affine)).collect());
        }
        self.rebuild(state)
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Affine, Point};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    use super::SplitRequest;
    use crate::{CommandKind, PathModel};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn triangle() -> PathModel {
        PathModel::from_svg("M 0 0 L 10 0 L 10 10 Z").unwrap()
    }

    fn square() -> PathModel {
        PathModel::from_svg("M0 0 L10 0 L10 10 L0 10 Z").unwrap()
    }

    fn svg(data: &str) -> String {
        PathModel::from_svg(data).unwrap().svg().to_owned()
    }

    #[test]
    fn shift_forward_then_back() {
        let path = triangle();
        let shifted = path.shift_forward(0, 1);
        assert_ne!(shifted.svg(), path.svg());
        assert_eq!(shifted.svg(), svg("M10 0 L10 10 L0 0 L10 0"));
        assert_eq!(shifted.shift_back(0, 1).svg(), path.svg());
    }

    #[test]
    fn shift_cycle() {
        let path = square();
        let n = path.sub_paths()[0].len();
        let mut shifted = path.clone();
        for i in 1..n - 1 {
            shifted = shifted.shift_forward(0, 1);
            assert_ne!(shifted.svg(), path.svg(), "shift {i}");
        }
        shifted = shifted.shift_forward(0, 1);
        assert_eq!(shifted.svg(), path.svg());
        assert_eq!(shifted.shift_offset(0), 0);
    }

    #[test]
    fn shift_cycle_reversed_and_split() {
        let path = square().split_in_half(0, 2).reverse(0);
        let n = path.sub_paths()[0].len();
        assert_eq!(n, 6);
        let mut shifted = path.clone();
        for i in 1..n - 1 {
            shifted = shifted.shift_forward(0, 1);
            assert_ne!(shifted.svg(), path.svg(), "shift {i}");
        }
        shifted = shifted.shift_forward(0, 1);
        assert_eq!(shifted.svg(), path.svg());
        assert_eq!(shifted.shift_offset(0), 0);
        assert_eq!(
            shifted.sub_paths()[0].commands().iter().filter(|c| c.is_split()).count(),
            1
        );
    }

    #[test]
    fn shift_follows_the_displayed_direction() {
        let reversed = square().reverse(0);
        let shifted = reversed.shift_forward(0, 1);
        // Reversed square: 0,0 -> 0,10 -> 10,10 -> ...; one step forward
        // starts at 0,10.
        assert_eq!(shifted.sub_paths()[0].start(), Point::new(0.0, 10.0));
        assert_eq!(shifted.shift_back(0, 1).svg(), reversed.svg());
    }

    #[test]
    fn open_sub_paths_do_not_shift() {
        let path = PathModel::from_svg("M0 0 L1 0 L1 1").unwrap();
        assert_eq!(path.shift_forward(0, 1).svg(), path.svg());
        assert_eq!(path.shift_forward(0, 1).shift_offset(0), 0);
    }

    #[test]
    fn reverse_is_an_involution() {
        let path = PathModel::from_svg("M0 0 C1 2 3 2 4 0 Q6 -2 8 0 Z M20 20 L30 20").unwrap();
        let reversed = path.reverse(0);
        assert_ne!(reversed.svg(), path.svg());
        assert!(reversed.is_reversed(0));
        assert!(!reversed.is_reversed(1));
        assert_eq!(reversed.reverse(0).svg(), path.svg());
        assert_eq!(reversed.sub_paths()[0].start(), Point::ZERO);
    }

    #[test]
    fn reversing_a_path_that_returns_to_its_start() {
        // Start and end coincide without a close. The reversed path happens
        // to draw the same commands; only the flag changes.
        let path = PathModel::from_svg("M0 0 L10 0 L0 0").unwrap();
        let reversed = path.reverse(0);
        assert!(reversed.is_reversed(0));
        assert_eq!(reversed.svg(), path.svg());
    }

    #[test]
    fn split_then_unsplit() {
        let path = triangle();
        let split = path.split(0, 1, &[0.5]);
        assert_eq!(split.sub_paths()[0].len(), 5);
        assert_eq!(split.svg(), svg("M0 0 L5 0 L10 0 L10 10 Z"));
        assert!(split.sub_paths()[0].commands()[1].is_split());
        assert_eq!(split.unsplit(0, 1).svg(), path.svg());
    }

    #[test]
    fn split_then_unsplit_reversed() {
        let path = triangle().reverse(0);
        let split = path.split(0, 3, &[0.25]);
        assert_eq!(split.sub_paths()[0].len(), 5);
        // The new point sits a quarter of the way along the displayed line.
        assert_eq!(split.sub_paths()[0].commands()[3].end(), Point::new(7.5, 0.0));
        assert!(split.sub_paths()[0].commands()[3].is_split());
        assert_eq!(split.unsplit(0, 3).svg(), path.svg());
    }

    #[test]
    fn split_without_params_is_a_no_op() {
        init_logger();
        let path = triangle();
        assert_eq!(path.split(0, 1, &[]).svg(), path.svg());
        assert_eq!(path.split_batch(&[]).svg(), path.svg());
    }

    #[test]
    #[should_panic(expected = "cannot be split")]
    fn splitting_a_move_panics() {
        drop(triangle().split_in_half(0, 0));
    }

    #[test]
    fn split_keeps_the_pivot_on_its_command() {
        let shifted = square().shift_forward(0, 1);
        let split = shifted.split_in_half(0, 4);
        assert_eq!(split.shift_offset(0), 2);
        assert_eq!(split.svg(), svg("M10 0 L10 10 L0 10 L0 0 L5 0 L10 0"));
        let unsplit = split.unsplit(0, 4);
        assert_eq!(unsplit.shift_offset(0), 1);
        assert_eq!(unsplit.svg(), shifted.svg());
    }

    #[test]
    fn unsplit_of_the_pivot_wraps() {
        // Split the close and shift so the new point starts the sub-path.
        let path = triangle().split_in_half(0, 3);
        let shifted = path.shift_back(0, 1);
        assert_eq!(shifted.shift_offset(0), 3);
        assert_eq!(shifted.sub_paths()[0].start(), Point::new(5.0, 5.0));
        // The start point was removed; the previous original point takes
        // its place.
        let unsplit = shifted.unsplit(0, 4);
        assert_eq!(unsplit.shift_offset(0), 2);
        assert_eq!(unsplit.sub_paths()[0].start(), Point::new(10.0, 10.0));
        assert_eq!(unsplit.svg(), svg("M10 10 L0 0 L10 0 L10 10"));
        assert_eq!(unsplit.revert().svg(), triangle().svg());
    }

    #[test]
    fn unsplit_of_the_start_point_steps_back() {
        let shifted = triangle().split_in_half(0, 1).shift_forward(0, 1);
        assert_eq!(shifted.shift_offset(0), 1);
        assert_eq!(shifted.sub_paths()[0].start(), Point::new(5.0, 0.0));
        let unsplit = shifted.unsplit(0, 4);
        assert_eq!(unsplit.shift_offset(0), 0);
        assert_eq!(unsplit.sub_paths()[0].start(), Point::ZERO);
        assert_eq!(unsplit.svg(), triangle().svg());
    }

    #[test]
    #[should_panic(expected = "does not end at a split point")]
    fn unsplit_of_an_original_point_panics() {
        drop(triangle().unsplit(0, 2));
    }

    #[test]
    fn split_batch_ignores_request_order() {
        let path = PathModel::from_svg("M0 0 L8 0 L8 8 L0 8 Z M20 0 L30 0 L30 10 Z").unwrap();
        let mut requests = vec![
            SplitRequest::new(0, 1, [0.5]),
            SplitRequest::new(0, 3, [0.25, 0.75]),
            SplitRequest::new(0, 4, [0.5]),
            SplitRequest::new(1, 2, [0.5]),
            SplitRequest::new(1, 1, [0.5]),
        ];
        let expected = path.split_batch(&requests);
        assert_eq!(expected.sub_paths()[0].len(), 9);
        assert_eq!(expected.sub_paths()[1].len(), 6);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..8 {
            requests.shuffle(&mut rng);
            assert_eq!(path.split_batch(&requests).svg(), expected.svg());
        }
    }

    #[test]
    fn split_batch_merges_requests_for_one_command() {
        let path = triangle();
        let merged = path.split_batch(&[SplitRequest::new(0, 1, [0.5]), SplitRequest::new(0, 1, [0.25])]);
        assert_eq!(merged.svg(), path.split(0, 1, &[0.25, 0.5]).svg());
    }

    #[test]
    fn unsplit_batch_undoes_split_batch() {
        let path = square();
        let split = path.split_batch(&[SplitRequest::new(0, 1, [0.5]), SplitRequest::new(0, 2, [0.5])]);
        assert_eq!(split.sub_paths()[0].len(), 7);
        let unsplit = split.unsplit_batch(&[(0, 1), (0, 3), (0, 1)]);
        assert_eq!(unsplit.svg(), path.svg());
    }

    #[test]
    fn convert_and_unconvert() {
        let path = triangle();
        let converted = path.convert(0, 1, CommandKind::CurveTo);
        assert_eq!(converted.sub_paths()[0].commands()[1].kind(), CommandKind::CurveTo);
        assert_eq!(converted.sub_paths()[0].len(), 4);
        // Moves and unsupported targets are left alone.
        assert_eq!(path.convert(0, 0, CommandKind::LineTo).svg(), path.svg());
        assert_eq!(path.convert(0, 1, CommandKind::ClosePath).svg(), path.svg());
        assert_eq!(converted.unconvert(0).svg(), path.svg());
    }

    #[test]
    fn revert_restores_the_import() {
        init_logger();
        let path = PathModel::from_svg("M0 0 L10 0 L10 10 Z L5 -5 M20 20 Q25 10 30 20").unwrap();
        let edited = path
            .split_in_half(0, 1)
            .convert(0, 2, CommandKind::QuadTo)
            .reverse(0)
            .shift_forward(0, 2)
            .split(1, 1, &[0.3])
            .reverse(2)
            .split_in_half(2, 1)
            .unsplit(0, 1);
        assert_ne!(edited.svg(), path.svg());
        let reverted = edited.revert();
        assert_eq!(reverted.svg(), path.svg());
        assert_eq!(reverted.shift_offset(0), 0);
        assert!(!reverted.is_reversed(0));
        assert_eq!(reverted.identifier_at(1, 1), path.identifier_at(1, 1));
    }

    #[test]
    fn edits_leave_the_receiver_alone() {
        let path = triangle();
        let before = path.svg().to_owned();
        drop(path.split_in_half(0, 1).reverse(0).shift_forward(0, 1));
        assert_eq!(path.svg(), before);
        assert_eq!(path.mutations(0)[1].len(), 1);
    }

    #[test]
    fn identifiers_follow_their_commands() {
        let path = triangle().split_in_half(0, 1);
        let id = path.identifier_at(0, 2);
        let rotated = path.shift_forward(0, 1);
        assert_eq!(rotated.identifier_at(0, 1), id);
        assert_eq!(path.reverse(0).identifier_at(0, 3), id);
    }

    #[test]
    fn transform_keeps_history() {
        let path = triangle().split_in_half(0, 1).shift_forward(0, 1);
        let moved = path.transform(Affine::translate((100.0, 0.0)));
        assert_eq!(moved.shift_offset(0), path.shift_offset(0));
        assert_eq!(moved.sub_paths()[0].len(), 5);
        assert_eq!(moved.sub_paths()[0].start(), Point::new(105.0, 0.0));
        assert_eq!(
            moved.revert().svg(),
            PathModel::from_svg("M100 0 L110 0 L110 10 Z").unwrap().svg()
        );
    }
}
