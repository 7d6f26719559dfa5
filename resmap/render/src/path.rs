//! Converts an edge's routed sections into one smooth curve.

use crate::engine::{EdgeSection, Point};

/// A drawing command for the renderer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    CubicTo { c1: Point, c2: Point, to: Point },
}

/// Renders the sections of one edge, translated by the edge's
/// parent-relative offset, as a single smooth cubic path.
///
/// Each section contributes its start point, all of its bend points (zero or
/// more), and its end point; consecutive waypoints are joined by cubics
/// whose control points sit a third of the way along the segment, which
/// degrades gracefully to a straight line when there are no bends.
pub fn smooth_path(offset: Point, sections: &[EdgeSection]) -> Vec<PathCommand> {
    let mut waypoints = Vec::new();
    for section in sections {
        let translate = |p: &Point| Point::new(p.x + offset.x, p.y + offset.y);
        let start = translate(&section.start);
        // Consecutive sections share their joint; drop the duplicate.
        if waypoints.last() != Some(&start) {
            waypoints.push(start);
        }
        waypoints.extend(section.bend_points.iter().map(translate));
        waypoints.push(translate(&section.end));
    }

    let Some(first) = waypoints.first() else {
        return Vec::new();
    };

    let mut commands = vec![PathCommand::MoveTo(*first)];
    for pair in waypoints.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let dx = (to.x - from.x) / 3.0;
        let dy = (to.y - from.y) / 3.0;
        commands.push(PathCommand::CubicTo {
            c1: Point::new(from.x + dx, from.y + dy),
            c2: Point::new(to.x - dx, to.y - dy),
            to,
        });
    }
    commands
}
