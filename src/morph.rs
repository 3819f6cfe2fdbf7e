// Copyright 2024 the Pathmorph Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Morphing between models and nearest point queries.

use kurbo::Point;

use crate::{Command, CommandLocation, MorphError, PathModel, Projection};

impl PathModel {
    /// Whether `other` has the same topology: as many sub-paths, each with
    /// as many commands, with matching kinds at every position.
    ///
    /// Coordinates are not compared.
    pub fn is_morphable_with(&self, other: &Self) -> bool {
        self.sub_paths().len() == other.sub_paths().len()
            && self
                .sub_paths()
                .iter()
                .zip(other.sub_paths())
                .all(|(a, b)| {
                    a.len() == b.len()
                        && a.commands()
                            .iter()
                            .zip(b.commands())
                            .all(|(ca, cb)| ca.kind() == cb.kind())
                })
    }

    /// Interpolate between `start` and `end`.
    ///
    /// Every point of the result is `(1 - fraction) * a + fraction * b` for
    /// the matching points of `start` and `end`. The result is a fresh model
    /// with no edit history and this model's accuracy.
    ///
    /// # Errors
    ///
    /// Returns [`MorphError::IncompatibleTopology`] unless this model,
    /// `start`, and `end` are all pairwise morphable.
    pub fn try_interpolate(
        &self,
        start: &Self,
        end: &Self,
        fraction: f64,
    ) -> Result<Self, MorphError> {
        let morphable = self.is_morphable_with(start)
            && self.is_morphable_with(end)
            && start.is_morphable_with(end);
        if !morphable {
            return Err(MorphError::IncompatibleTopology);
        }
        let commands: Vec<Command> = start
            .commands()
            .zip(end.commands())
            .map(|(a, b)| a.lerp(b, fraction))
            .collect();
        Ok(Self::from_commands(commands).with_accuracy(self.accuracy))
    }

    /// Like [`PathModel::try_interpolate`], but returns an unchanged copy of
    /// this model when the paths are not morphable.
    #[must_use]
    pub fn interpolate(&self, start: &Self, end: &Self, fraction: f64) -> Self {
        self.try_interpolate(start, end, fraction).unwrap_or_else(|err| {
            log::warn!("not interpolating: {err}");
            self.clone()
        })
    }

    /// The point of the path nearest to `point`, or `None` for a path with
    /// nothing to project onto.
    ///
    /// Mutations are visited in sub-path order, then in original command
    /// order. Ties go to the first one visited.
    pub fn project(&self, point: Point) -> Option<PathProjection<'_>> {
        let mut best: Option<PathProjection<'_>> = None;
        for (sub_path, mutations) in self.mutations.iter().enumerate() {
            for (mutation, m) in mutations.iter().enumerate() {
                let Some(projection) = m.project_point(point, self.accuracy) else {
                    continue;
                };
                if best
                    .as_ref()
                    .map_or(true, |b| projection.distance < b.projection.distance)
                {
                    best = Some(PathProjection {
                        model: self,
                        sub_path,
                        mutation,
                        projection,
                    });
                }
            }
        }
        best
    }
}

/// The result of [`PathModel::project`]: where the nearest point lies, and
/// how to split the path there.
#[derive(Clone, Copy, Debug)]
pub struct PathProjection<'a> {
    model: &'a PathModel,
    sub_path: usize,
    mutation: usize,
    projection: Projection,
}

impl PathProjection<'_> {
    /// Index of the sub-path holding the nearest point.
    #[inline]
    pub fn sub_path(&self) -> usize {
        self.sub_path
    }

    /// Index, within the sub-path, of the mutation holding the nearest point.
    #[inline]
    pub fn mutation(&self) -> usize {
        self.mutation
    }

    /// The nearest point, its distance, and its backing parameter.
    #[inline]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Split the path at the nearest point.
    ///
    /// Returns an unchanged copy of the model if the point is already an
    /// endpoint of a command.
    #[must_use]
    pub fn split(&self) -> PathModel {
        let model = self.model;
        let mutation = &model.mutations[self.sub_path][self.mutation];
        let (offset, t) = mutation.piece_at_backing_t(self.projection.t);
        let loc = CommandLocation {
            mutation: self.mutation,
            offset,
            flat: model.flat_index(self.sub_path, self.mutation, offset),
        };
        model.split_resolved(self.sub_path, loc, &[t])
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use crate::{CommandKind, MorphError, PathModel};

    fn triangle() -> PathModel {
        PathModel::from_svg("M 0 0 L 10 0 L 10 10 Z").unwrap()
    }

    #[test]
    fn morphability_is_symmetric() {
        let a = triangle();
        let b = PathModel::from_svg("M 5 5 L 20 5 L 20 30 Z").unwrap();
        let c = PathModel::from_svg("M 5 5 Q 10 0 20 5 L 20 30 Z").unwrap();
        assert!(a.is_morphable_with(&b));
        assert!(b.is_morphable_with(&a));
        assert!(!a.is_morphable_with(&c));
        assert!(!c.is_morphable_with(&a));
        assert!(!a.is_morphable_with(&a.split_in_half(0, 1)));
    }

    #[test]
    fn interpolation_endpoints_are_exact() {
        let a = PathModel::from_svg("M0.1 0.2 C1.3 2.7 3.3 2.9 4.1 0.3 Z").unwrap();
        let b = PathModel::from_svg("M7.7 -1.9 C0.01 5.5 9.25 -3.3 1.9 8.6 Z").unwrap();
        assert_eq!(a.interpolate(&a, &b, 0.0).svg(), a.svg());
        assert_eq!(a.interpolate(&a, &b, 1.0).svg(), b.svg());
    }

    #[test]
    fn interpolation_is_pointwise() {
        let a = triangle();
        let b = PathModel::from_svg("M 2 2 L 14 2 L 14 6 Z").unwrap();
        let mid = a.interpolate(&a, &b, 0.5);
        assert_eq!(mid.svg(), PathModel::from_svg("M1 1 L12 1 L12 8 Z").unwrap().svg());
    }

    #[test]
    fn interpolation_drops_history() {
        let a = triangle().shift_forward(0, 1);
        let b = a.transform(kurbo::Affine::translate((4.0, 0.0)));
        let mid = a.interpolate(&a, &b, 0.5);
        assert_eq!(mid.shift_offset(0), 0);
        assert_eq!(mid.sub_paths()[0].start(), Point::new(12.0, 0.0));
        assert_eq!(mid.revert().svg(), mid.svg());
    }

    #[test]
    fn incompatible_interpolation_falls_back() {
        let a = triangle();
        let b = PathModel::from_svg("M0 0 L1 1").unwrap();
        assert_eq!(
            a.try_interpolate(&a, &b, 0.5).unwrap_err(),
            MorphError::IncompatibleTopology
        );
        assert_eq!(a.interpolate(&a, &b, 0.5).svg(), a.svg());
        // All three must match, not just the receiver and `start`.
        let converted = a.convert(0, 1, CommandKind::QuadTo);
        assert!(a.try_interpolate(&a, &converted, 0.5).is_err());
    }

    #[test]
    fn project_onto_the_nearest_command() {
        let path = triangle();
        let hit = path.project(Point::new(5.0, 0.0)).unwrap();
        assert_eq!((hit.sub_path(), hit.mutation()), (0, 1));
        assert!((hit.projection().t - 0.5).abs() < 1e-9);
        assert!(hit.projection().distance < 1e-9);

        let split = hit.split();
        assert_eq!(split.sub_paths()[0].len(), 5);
        assert_eq!(split.shift_offset(0), 0);
        assert_eq!(split.sub_paths()[0].commands()[1].end(), Point::new(5.0, 0.0));
        // The receiver is unchanged.
        assert_eq!(path.sub_paths()[0].len(), 4);
    }

    #[test]
    fn project_prefers_the_earlier_command_on_ties() {
        // Equidistant from the first line and the closing line.
        let path = PathModel::from_svg("M0 0 L10 0 L10 10 L0 10 Z").unwrap();
        let hit = path.project(Point::new(5.0, 5.0)).unwrap();
        assert_eq!(hit.mutation(), 1);
    }

    #[test]
    fn projected_split_follows_shifted_and_split_paths() {
        let path = triangle().split_in_half(0, 1).shift_forward(0, 2);
        let hit = path.project(Point::new(7.5, 0.0)).unwrap();
        let split = hit.split();
        assert_eq!(split.sub_paths()[0].len(), 6);
        assert!(split
            .sub_paths()[0]
            .commands()
            .iter()
            .any(|c| c.end() == Point::new(7.5, 0.0) && c.is_split()));
        // Still starts at the same point.
        assert_eq!(split.sub_paths()[0].start(), path.sub_paths()[0].start());
    }

    #[test]
    fn projecting_onto_an_endpoint_changes_nothing() {
        let path = triangle();
        let hit = path.project(Point::new(10.0, 0.0)).unwrap();
        assert_eq!(hit.split().svg(), path.svg());
    }
}
