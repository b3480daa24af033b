use glam::DVec2;

/// Even-odd containment test across every ring of a shape. A point inside
/// a hole is covered by two rings and so counts as outside.
pub fn point_in_rings(rings: &[Vec<DVec2>], p: DVec2) -> bool {
    let mut inside = false;
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        let mut j = ring.len() - 1;
        for i in 0..ring.len() {
            let (a, b) = (ring[i], ring[j]);
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
}

/// Axis-aligned bounds of a set of rings, `None` when there are no points
pub fn bounds(rings: &[Vec<DVec2>]) -> Option<(DVec2, DVec2)> {
    let mut points = rings.iter().flatten();
    let first = *points.next()?;
    Some(points.fold((first, first), |(min, max), &p| (min.min(p), max.max(p))))
}
