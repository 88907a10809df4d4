//! Polyline the enemies walk from spawn to exit.

use glam::Vec2;

/// Waypoint polyline with precomputed cumulative segment lengths.
#[derive(Clone, Debug)]
pub(crate) struct Path {
    waypoints: Vec<Vec2>,
    cumulative: Vec<f32>,
}

impl Path {
    /// Builds a path through the provided waypoints.
    pub(crate) fn new(waypoints: Vec<Vec2>) -> Self {
        let mut cumulative = Vec::with_capacity(waypoints.len());
        let mut travelled = 0.0;
        for (index, point) in waypoints.iter().enumerate() {
            if index > 0 {
                travelled += point.distance(waypoints[index - 1]);
            }
            cumulative.push(travelled);
        }
        Self {
            waypoints,
            cumulative,
        }
    }

    /// Total walking distance from the first to the last waypoint.
    pub(crate) fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Point reached after walking `distance` along the path.
    pub(crate) fn position_at(&self, distance: f32) -> Vec2 {
        match self.segment_at(distance) {
            Some((start, end, offset)) => start + (end - start).normalize_or_zero() * offset,
            None => self.waypoints.last().copied().unwrap_or(Vec2::ZERO),
        }
    }

    /// Unit heading of the segment containing `distance`; zero past the end.
    pub(crate) fn heading_at(&self, distance: f32) -> Vec2 {
        self.segment_at(distance)
            .map_or(Vec2::ZERO, |(start, end, _)| (end - start).normalize_or_zero())
    }

    /// Shortest distance between `point` and any segment of the path.
    pub(crate) fn distance_to(&self, point: Vec2) -> f32 {
        if self.waypoints.len() == 1 {
            return self.waypoints[0].distance(point);
        }
        self.waypoints
            .windows(2)
            .map(|pair| distance_to_segment(point, pair[0], pair[1]))
            .fold(f32::INFINITY, f32::min)
    }

    fn segment_at(&self, distance: f32) -> Option<(Vec2, Vec2, f32)> {
        let distance = distance.max(0.0);
        if distance >= self.length() {
            return None;
        }
        let index = self
            .cumulative
            .partition_point(|travelled| *travelled <= distance)
            .checked_sub(1)?;
        let start = *self.waypoints.get(index)?;
        let end = *self.waypoints.get(index + 1)?;
        Some((start, end, distance - self.cumulative[index]))
    }
}

fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}
