// Copyright 2024 the Pathmorph Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw commands, the atoms of an editable path.

use arrayvec::ArrayVec;
use kurbo::{Affine, CubicBez, Line, ParamCurve, PathEl, PathSeg, Point, QuadBez};

/// The geometric type of a [`Command`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandKind {
    /// `M`: start a new sub-path.
    MoveTo,
    /// `L`: a straight line.
    LineTo,
    /// `Q`: a quadratic Bézier curve.
    QuadTo,
    /// `C`: a cubic Bézier curve.
    CurveTo,
    /// `Z`: a straight line back to the start of the sub-path.
    ClosePath,
}

impl CommandKind {
    /// The number of points a command of this kind stores, counting its
    /// start point.
    #[inline]
    pub const fn point_count(self) -> usize {
        match self {
            CommandKind::MoveTo | CommandKind::LineTo | CommandKind::ClosePath => 2,
            CommandKind::QuadTo => 3,
            CommandKind::CurveTo => 4,
        }
    }

    /// The letter used for this kind in SVG path data.
    #[inline]
    pub const fn svg_char(self) -> char {
        match self {
            CommandKind::MoveTo => 'M',
            CommandKind::LineTo => 'L',
            CommandKind::QuadTo => 'Q',
            CommandKind::CurveTo => 'C',
            CommandKind::ClosePath => 'Z',
        }
    }

    /// Whether a live command can be converted into this kind.
    #[inline]
    pub const fn is_convertible(self) -> bool {
        matches!(
            self,
            CommandKind::LineTo | CommandKind::QuadTo | CommandKind::CurveTo
        )
    }
}

/// A single draw instruction.
///
/// Points are stored with the start point first and the end point last, so
/// every command is self-contained:
///
/// | kind        | points                            |
/// |-------------|-----------------------------------|
/// | `MoveTo`    | `[origin, destination]`           |
/// | `LineTo`    | `[start, end]`                    |
/// | `QuadTo`    | `[start, ctrl, end]`              |
/// | `CurveTo`   | `[start, ctrl1, ctrl2, end]`      |
/// | `ClosePath` | `[start, sub-path start]`         |
///
/// The origin of a move is the pen position before the move, which is the
/// end of the previous sub-path (or the destination itself for the first
/// sub-path).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Command {
    kind: CommandKind,
    points: ArrayVec<Point, 4>,
    is_split: bool,
}

impl Command {
    /// Create a command from its kind and points.
    ///
    /// # Panics
    ///
    /// Panics if `points` does not hold exactly [`CommandKind::point_count`]
    /// points.
    pub fn new(kind: CommandKind, points: &[Point]) -> Self {
        assert_eq!(
            points.len(),
            kind.point_count(),
            "a {kind:?} command takes {} points",
            kind.point_count()
        );
        Command {
            kind,
            points: points.iter().copied().collect(),
            is_split: false,
        }
    }

    /// A move from `origin` to `dest`.
    pub fn move_to(origin: impl Into<Point>, dest: impl Into<Point>) -> Self {
        Self::new(CommandKind::MoveTo, &[origin.into(), dest.into()])
    }

    /// A straight line.
    pub fn line_to(start: impl Into<Point>, end: impl Into<Point>) -> Self {
        Self::new(CommandKind::LineTo, &[start.into(), end.into()])
    }

    /// A quadratic Bézier curve.
    pub fn quad_to(start: impl Into<Point>, ctrl: impl Into<Point>, end: impl Into<Point>) -> Self {
        Self::new(CommandKind::QuadTo, &[start.into(), ctrl.into(), end.into()])
    }

    /// A cubic Bézier curve.
    pub fn curve_to(
        start: impl Into<Point>,
        ctrl1: impl Into<Point>,
        ctrl2: impl Into<Point>,
        end: impl Into<Point>,
    ) -> Self {
        Self::new(
            CommandKind::CurveTo,
            &[start.into(), ctrl1.into(), ctrl2.into(), end.into()],
        )
    }

    /// A close from `start` back to the sub-path's first point.
    pub fn close_path(start: impl Into<Point>, sub_path_start: impl Into<Point>) -> Self {
        Self::new(CommandKind::ClosePath, &[start.into(), sub_path_start.into()])
    }

    /// The kind of this command.
    #[inline]
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// All points, start point first.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The start point (the origin, for a move).
    #[inline]
    pub fn start(&self) -> Point {
        self.points[0]
    }

    /// The end point (the destination, for a move).
    #[inline]
    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Whether the end point of this command was introduced by a split.
    #[inline]
    pub fn is_split(&self) -> bool {
        self.is_split
    }

    /// Return this command with the split marker set to `is_split`.
    #[must_use]
    pub fn with_split(mut self, is_split: bool) -> Self {
        self.is_split = is_split;
        self
    }

    /// Return this command with its first and last points replaced.
    #[must_use]
    pub fn with_endpoints(mut self, start: Point, end: Point) -> Self {
        let last = self.points.len() - 1;
        self.points[0] = start;
        self.points[last] = end;
        self
    }

    /// The same geometry traveled in the opposite direction.
    ///
    /// The split marker is carried over unchanged.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Command {
            kind: self.kind,
            points,
            is_split: self.is_split,
        }
    }

    /// Replace a close with an explicit line over the same points.
    ///
    /// Any other command is returned unchanged.
    #[must_use]
    pub(crate) fn close_as_line(self) -> Self {
        match self.kind {
            CommandKind::ClosePath => Command {
                kind: CommandKind::LineTo,
                ..self
            },
            _ => self,
        }
    }

    /// The drawn segment, or `None` for a move.
    ///
    /// A close is drawn as a line back to the sub-path start.
    pub fn to_seg(&self) -> Option<PathSeg> {
        let p = &self.points;
        match self.kind {
            CommandKind::MoveTo => None,
            CommandKind::LineTo | CommandKind::ClosePath => {
                Some(PathSeg::Line(Line::new(p[0], p[1])))
            }
            CommandKind::QuadTo => Some(PathSeg::Quad(QuadBez::new(p[0], p[1], p[2]))),
            CommandKind::CurveTo => Some(PathSeg::Cubic(CubicBez::new(p[0], p[1], p[2], p[3]))),
        }
    }

    /// Build a command of `kind` approximating `seg`.
    ///
    /// Converting to a line drops the control points. A cubic is reduced to
    /// a quadratic through the control point `(3(c1 + c2) - p0 - p3) / 4`.
    pub fn from_seg(seg: PathSeg, kind: CommandKind) -> Self {
        let (start, end) = (seg.start(), seg.end());
        match kind {
            CommandKind::MoveTo | CommandKind::LineTo | CommandKind::ClosePath => {
                Self::new(kind, &[start, end])
            }
            CommandKind::QuadTo => {
                let ctrl = match seg {
                    PathSeg::Line(line) => line.p0.midpoint(line.p1),
                    PathSeg::Quad(quad) => quad.p1,
                    PathSeg::Cubic(c) => {
                        let v = (c.p1.to_vec2() + c.p2.to_vec2()) * 3.0
                            - c.p0.to_vec2()
                            - c.p3.to_vec2();
                        (v * 0.25).to_point()
                    }
                };
                Self::quad_to(start, ctrl, end)
            }
            CommandKind::CurveTo => {
                let c = match seg {
                    PathSeg::Line(line) => CubicBez::new(
                        line.p0,
                        line.p0.lerp(line.p1, 1.0 / 3.0),
                        line.p0.lerp(line.p1, 2.0 / 3.0),
                        line.p1,
                    ),
                    PathSeg::Quad(quad) => quad.raise(),
                    PathSeg::Cubic(cubic) => cubic,
                };
                Self::curve_to(c.p0, c.p1, c.p2, c.p3)
            }
        }
    }

    /// This command's geometry re-expressed as `kind`, keeping the split
    /// marker.
    ///
    /// Moves are never converted, and nothing is converted into a move.
    #[must_use]
    pub fn converted(&self, kind: CommandKind) -> Self {
        if kind == self.kind || kind == CommandKind::MoveTo {
            return self.clone();
        }
        match self.to_seg() {
            Some(seg) => Self::from_seg(seg, kind)
                .with_endpoints(self.start(), self.end())
                .with_split(self.is_split),
            None => self.clone(),
        }
    }

    /// Pointwise linear interpolation toward `other`.
    ///
    /// Each coordinate is `(1 - t) * a + t * b`, so `t = 0` and `t = 1`
    /// reproduce the endpoints exactly. The kind and split marker come from
    /// `self`; the caller guarantees both commands have the same kind.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        debug_assert_eq!(self.kind, other.kind, "interpolated commands must match");
        let points = self
            .points
            .iter()
            .zip(&other.points)
            .map(|(a, b)| Point::new((1.0 - t) * a.x + t * b.x, (1.0 - t) * a.y + t * b.y))
            .collect();
        Command {
            kind: self.kind,
            points,
            is_split: self.is_split,
        }
    }

    /// Apply an affine transform to every point.
    #[must_use]
    pub fn transformed(&self, affine: Affine) -> Self {
        Command {
            kind: self.kind,
            points: self.points.iter().map(|&p| affine * p).collect(),
            is_split: self.is_split,
        }
    }

    /// The equivalent `kurbo` path element.
    pub fn to_path_el(&self) -> PathEl {
        let p = &self.points;
        match self.kind {
            CommandKind::MoveTo => PathEl::MoveTo(p[1]),
            CommandKind::LineTo => PathEl::LineTo(p[1]),
            CommandKind::QuadTo => PathEl::QuadTo(p[1], p[2]),
            CommandKind::CurveTo => PathEl::CurveTo(p[1], p[2], p[3]),
            CommandKind::ClosePath => PathEl::ClosePath,
        }
    }
}

/// Turn a stream of `kurbo` path elements into self-contained commands.
///
/// Start points are filled in from the running pen position. A stream that
/// does not begin with a move treats the origin as the initial pen position.
pub fn commands_from_elements(elements: impl IntoIterator<Item = PathEl>) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut pen: Option<Point> = None;
    let mut sub_path_start = Point::ZERO;
    for el in elements {
        let start = pen.unwrap_or(Point::ZERO);
        let command = match el {
            PathEl::MoveTo(p) => {
                sub_path_start = p;
                Command::move_to(pen.unwrap_or(p), p)
            }
            PathEl::LineTo(p) => Command::line_to(start, p),
            PathEl::QuadTo(p1, p2) => Command::quad_to(start, p1, p2),
            PathEl::CurveTo(p1, p2, p3) => Command::curve_to(start, p1, p2, p3),
            PathEl::ClosePath => Command::close_path(start, sub_path_start),
        };
        pen = Some(command.end());
        commands.push(command);
    }
    commands
}
