// Copyright 2024 the Pathmorph Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The live, editable representation of one original command.

use kurbo::{Affine, ParamCurve, ParamCurveArclen, ParamCurveNearest, Point};
use smallvec::{smallvec, SmallVec};

use crate::{Command, CommandKind};

/// A stable identifier for a live command.
///
/// Identifiers are allocated per mutation, so they stay valid across edits,
/// across clones of a model, and across serialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandId {
    /// Position of the backing command in the imported command list.
    pub ordinal: usize,
    /// Sequence number within the mutation. The piece ending at the backing
    /// command's end point is always `0`.
    pub split: u32,
}

/// The point of a mutation nearest to a query point.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Projection {
    /// The nearest point on the live geometry.
    pub point: Point,
    /// Distance from the query point to `point`.
    pub distance: f64,
    /// Parameter of `point` along the backing command, in `[0, 1]`.
    pub t: f64,
}

/// One live command, described by where it ends along the backing command.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Piece {
    t: f64,
    id: u32,
    kind: CommandKind,
}

/// An original command together with the commands currently standing in
/// for it.
///
/// The backing command is never modified. Splits and conversions are
/// recorded as a sorted list of pieces over the backing command's parameter
/// range, and the live commands are regenerated from that list, so the
/// original can always be recovered.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandMutation {
    ordinal: usize,
    backing: Command,
    pieces: SmallVec<[Piece; 1]>,
    next_id: u32,
    live: SmallVec<[Command; 1]>,
}

impl CommandMutation {
    /// Wrap an original command. `ordinal` is its position in the imported
    /// command list and seeds the mutation's identifiers.
    pub fn new(ordinal: usize, backing: Command) -> Self {
        let backing = backing.with_split(false);
        CommandMutation {
            ordinal,
            pieces: smallvec![Piece {
                t: 1.0,
                id: 0,
                kind: backing.kind(),
            }],
            next_id: 1,
            live: smallvec![backing.clone()],
            backing,
        }
    }

    /// The original command.
    #[inline]
    pub fn backing_command(&self) -> &Command {
        &self.backing
    }

    /// The commands currently representing the backing command, in order.
    #[inline]
    pub fn live_commands(&self) -> &[Command] {
        &self.live
    }

    /// Number of live commands.
    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Always `false`; a mutation has at least one live command.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// The position of the backing command in the imported command list.
    #[inline]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Total arc length of the live commands.
    pub fn path_length(&self, accuracy: f64) -> f64 {
        self.live
            .iter()
            .filter_map(Command::to_seg)
            .map(|seg| seg.arclen(accuracy))
            .sum()
    }

    /// Identifier of the live command at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is out of range.
    pub fn identifier_at(&self, offset: usize) -> CommandId {
        self.check_offset(offset);
        CommandId {
            ordinal: self.ordinal,
            split: self.pieces[offset].id,
        }
    }

    /// Split the live command at `offset` at each of `params`.
    ///
    /// Parameters are positions along that live command; values outside the
    /// open interval `(0, 1)` are dropped. Returns the number of commands
    /// inserted.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is out of range.
    pub fn split_at(&mut self, offset: usize, params: &[f64]) -> usize {
        self.check_offset(offset);
        if self.backing.kind() == CommandKind::MoveTo {
            log::warn!("ignoring split of move command {}", self.ordinal);
            return 0;
        }
        let (t0, t1) = self.piece_range(offset);
        let mut ts: SmallVec<[f64; 4]> = params
            .iter()
            .copied()
            .filter(|&p| {
                let inside = p > 0.0 && p < 1.0;
                if !inside {
                    log::warn!("dropping split parameter {p} outside (0, 1)");
                }
                inside
            })
            .map(|p| t0 + p * (t1 - t0))
            .collect();
        ts.sort_by(f64::total_cmp);
        ts.dedup();
        // Pieces in front of a close are ordinary lines.
        let kind = match self.pieces[offset].kind {
            CommandKind::ClosePath => CommandKind::LineTo,
            kind => kind,
        };
        for (i, &t) in ts.iter().enumerate() {
            let id = self.next_id;
            self.next_id += 1;
            self.pieces.insert(offset + i, Piece { t, id, kind });
        }
        self.rebuild();
        ts.len()
    }

    /// Split the live command at `offset` into two halves.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is out of range.
    pub fn split_in_half_at(&mut self, offset: usize) -> usize {
        self.split_at(offset, &[0.5])
    }

    /// Locate backing parameter `t`: the offset of the live command that
    /// contains it, and the position of `t` along that command.
    pub fn piece_at_backing_t(&self, t: f64) -> (usize, f64) {
        let offset = self
            .pieces
            .iter()
            .position(|piece| t <= piece.t)
            .unwrap_or(self.pieces.len() - 1);
        let (t0, t1) = self.piece_range(offset);
        let local = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
        (offset, local)
    }

    /// Remove the split point at the end of the live command at `offset`,
    /// merging it with the following command. The merged command keeps the
    /// kind of the following one.
    ///
    /// # Panics
    ///
    /// Panics if the end of the command at `offset` is not a split point.
    pub fn unsplit_at(&mut self, offset: usize) {
        assert!(
            offset + 1 < self.pieces.len(),
            "command {offset} of mutation {} does not end at a split point",
            self.ordinal
        );
        self.pieces.remove(offset);
        self.rebuild();
    }

    /// Change the kind of the live command at `offset`. Returns `false`, and
    /// changes nothing, if the conversion is not supported.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is out of range.
    pub fn convert_at(&mut self, offset: usize, kind: CommandKind) -> bool {
        self.check_offset(offset);
        if self.backing.kind() == CommandKind::MoveTo || !kind.is_convertible() {
            log::warn!(
                "cannot convert a {:?} command into {kind:?}",
                self.backing.kind()
            );
            return false;
        }
        self.pieces[offset].kind = kind;
        self.rebuild();
        true
    }

    /// Restore every live command to the backing command's kind, keeping
    /// the splits.
    pub fn unconvert_all(&mut self) {
        let kind = self.backing.kind();
        let last = self.pieces.len() - 1;
        for (i, piece) in self.pieces.iter_mut().enumerate() {
            piece.kind = match kind {
                CommandKind::ClosePath if i != last => CommandKind::LineTo,
                kind => kind,
            };
        }
        self.rebuild();
    }

    /// The point of the live geometry nearest to `point`, or `None` for a
    /// move.
    ///
    /// Ties go to the earlier live command.
    pub fn project_point(&self, point: Point, accuracy: f64) -> Option<Projection> {
        let mut best: Option<(usize, f64, f64)> = None;
        for (offset, command) in self.live.iter().enumerate() {
            let Some(seg) = command.to_seg() else {
                continue;
            };
            let nearest = seg.nearest(point, accuracy);
            if best.map_or(true, |(_, _, d)| nearest.distance_sq < d) {
                best = Some((offset, nearest.t, nearest.distance_sq));
            }
        }
        best.and_then(|(offset, local, distance_sq)| {
            let seg = self.live[offset].to_seg()?;
            let (t0, t1) = self.piece_range(offset);
            Some(Projection {
                point: seg.eval(local),
                distance: distance_sq.sqrt(),
                t: t0 + local * (t1 - t0),
            })
        })
    }

    /// This mutation with an affine transform applied to the backing
    /// command. Splits, conversions and identifiers are kept.
    #[must_use]
    pub fn transformed(&self, affine: Affine) -> Self {
        let mut mutation = self.clone();
        mutation.backing = self.backing.transformed(affine);
        mutation.rebuild();
        mutation
    }

    /// A fresh mutation over the same backing command.
    #[must_use]
    pub fn reverted(&self) -> Self {
        Self::new(self.ordinal, self.backing.clone())
    }

    fn check_offset(&self, offset: usize) {
        assert!(
            offset < self.pieces.len(),
            "offset {offset} out of range for mutation {} with {} commands",
            self.ordinal,
            self.pieces.len()
        );
    }

    fn piece_range(&self, offset: usize) -> (f64, f64) {
        let t0 = match offset {
            0 => 0.0,
            _ => self.pieces[offset - 1].t,
        };
        (t0, self.pieces[offset].t)
    }

    /// Regenerate the live commands from the backing command and pieces.
    fn rebuild(&mut self) {
        let unchanged = self.pieces.len() == 1 && self.pieces[0].kind == self.backing.kind();
        let seg = match self.backing.to_seg() {
            Some(seg) if !unchanged => seg,
            _ => {
                self.live = smallvec![self.backing.clone()];
                return;
            }
        };
        let last = self.pieces.len() - 1;
        let mut t0 = 0.0;
        let mut start = self.backing.start();
        let mut live = SmallVec::with_capacity(self.pieces.len());
        for (i, piece) in self.pieces.iter().enumerate() {
            // Endpoints are shared exactly between neighbors.
            let end = if i == last {
                self.backing.end()
            } else {
                seg.eval(piece.t)
            };
            let command = Command::from_seg(seg.subsegment(t0..piece.t), piece.kind)
                .with_endpoints(start, end)
                .with_split(i != last);
            live.push(command);
            t0 = piece.t;
            start = end;
        }
        self.live = live;
    }
}
