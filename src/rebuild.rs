// Copyright 2024 the Pathmorph Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reconstruction of a sub-path's displayed commands from its mutations.
//!
//! Reversal and shifting are never stored as a reordering of the mutations.
//! They are applied here, each time a model is built, on top of the
//! mutations' live commands in their original order.

use crate::subpath::is_closed;
use crate::{Command, CommandMutation};

/// The displayed commands of one sub-path.
pub(crate) fn sub_path_commands(
    mutations: &[CommandMutation],
    reversed: bool,
    shift_offset: usize,
) -> Vec<Command> {
    let commands = maybe_reverse(mutations, reversed);
    maybe_shift(commands, shift_offset, reversed)
}

fn flatten(mutations: &[CommandMutation]) -> Vec<Command> {
    mutations
        .iter()
        .flat_map(|m| m.live_commands().iter().cloned())
        .collect()
}

fn maybe_reverse(mutations: &[CommandMutation], reversed: bool) -> Vec<Command> {
    let mut commands = flatten(mutations);
    if !reversed || commands.len() <= 1 {
        return commands;
    }

    // A split marker describes the end point of a command. Once the direction
    // flips, the seams at each mutation's two ends move to the neighboring
    // command, so the first and last live commands of each split mutation
    // swap their markers.
    let mut ix = mutations.first().map_or(0, CommandMutation::len);
    for mutation in mutations.iter().skip(1) {
        let n = mutation.len();
        if n > 1 {
            for i in [ix, ix + n - 1] {
                let is_split = commands[i].is_split();
                commands[i] = commands[i].clone().with_split(!is_split);
            }
        }
        ix += n;
    }

    // A close has no meaning in the other direction; draw it as a line.
    if let Some(last) = commands.pop() {
        commands.push(last.close_as_line());
    }

    let first = commands[0].clone();
    let mut out = Vec::with_capacity(commands.len());
    out.push(first.clone());
    out.extend(commands[1..].iter().rev().map(Command::reversed));
    let dest = out.get(1).map_or(first.end(), Command::start);
    out[0] = Command::move_to(first.start(), dest);
    out
}

fn maybe_shift(mut commands: Vec<Command>, shift_offset: usize, reversed: bool) -> Vec<Command> {
    if shift_offset == 0 || commands.len() <= 2 || !is_closed(&commands) {
        return commands;
    }
    let n = commands.len() - 1;
    let offset = shift_offset % n;
    if offset == 0 {
        return commands;
    }
    // The offset counts commands in the original direction; mirror it when
    // the sub-path is displayed reversed.
    let pivot = if reversed { n - offset } else { offset };
    log::trace!("rotating sub-path of {} commands by {pivot}", commands.len());

    if let Some(last) = commands.pop() {
        commands.push(last.close_as_line());
    }
    let mut body = commands.split_off(1);
    body.rotate_left(pivot);
    let origin = commands[0].start();
    let dest = body[n - 1].end();
    let mut out = Vec::with_capacity(n + 1);
    out.push(Command::move_to(origin, dest));
    out.extend(body);
    out
}
