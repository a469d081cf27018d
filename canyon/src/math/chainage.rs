use bathydem::C;
use geo::geometry::{Coord, LineString};

/// Returns the point `distance` meters along `line`, measured from its
/// first vertex. Clamps to the endpoints, and returns `None` for
/// polylines with fewer than two vertices.
pub fn point_at(line: &LineString<C>, distance: C) -> Option<Coord<C>> {
    let first = *line.0.first()?;
    line.0.get(1)?;

    if distance <= 0.0 {
        return Some(first);
    }

    let mut walked = 0.0;
    for segment in line.lines() {
        let delta = segment.delta();
        let len = delta.x.hypot(delta.y);
        if walked + len >= distance && len > 0.0 {
            let f = (distance - walked) / len;
            return Some(Coord {
                x: segment.start.x + delta.x * f,
                y: segment.start.y + delta.y * f,
            });
        }
        walked += len;
    }

    line.0.last().copied()
}

/// Returns the unit direction of `line` at chainage `distance`,
/// estimated from the points `delta` meters up- and downstream
/// (clamped to the polyline ends). `None` when the chord between the
/// two points has zero length.
pub fn direction_at(line: &LineString<C>, distance: C, delta: C, total_len: C) -> Option<Coord<C>> {
    let d0 = (distance - delta).max(0.0);
    let d1 = (distance + delta).min(total_len);
    let p0 = point_at(line, d0)?;
    let p1 = point_at(line, d1)?;

    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let norm = dx.hypot(dy);
    if norm == 0.0 {
        return None;
    }
    Some(Coord {
        x: dx / norm,
        y: dy / norm,
    })
}
