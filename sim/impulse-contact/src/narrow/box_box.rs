//! Oriented box against oriented box.
//!
//! The separating axis test covers 15 axes: three face normals per box and
//! the nine cross products of their edge directions. Contact candidates are
//! the vertices of each box found inside the other. When the winning axis is
//! a face normal, the incident face of the other box is also clipped against
//! the side planes of that reference face, which adds the points where the
//! two faces cross. Candidates are reduced to at most four.

use impulse_types::Pose;
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

use super::ground::box_corners;
use super::pair_convex::GEOM_EPSILON;
use crate::{Manifold, ManifoldPoint};

/// Slack allowed when testing a vertex for containment in the other box.
pub const CONTAINMENT_TOLERANCE: f64 = 1e-6;

/// Most contact points kept per box pair.
pub const MAX_MANIFOLD_POINTS: usize = 4;

/// Overlap margin a later axis must beat to replace an earlier one.
///
/// Faces of A win over faces of B, and faces win over edge axes, unless the
/// other axis is shallower by more than this. Edge axes built from nearly
/// parallel edges otherwise flip the reference face on float noise.
pub const FACE_AXIS_PREFERENCE: f64 = 1e-3;

/// Feature whose normal is the separating-axis result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatFeature {
    /// Face normal of box A, by local axis index.
    FaceA(usize),
    /// Face normal of box B, by local axis index.
    FaceB(usize),
    /// Cross product of an edge of A and an edge of B.
    Edge,
}

/// Axis of least overlap between two overlapping boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatAxis {
    /// Unit axis oriented from box A toward box B.
    pub normal: Vector3<f64>,
    /// Overlap of the two projections along the axis.
    pub overlap: f64,
    /// Feature the axis came from.
    pub feature: SatFeature,
}

/// A box in world space.
struct OrientedBox<'a> {
    half: &'a Vector3<f64>,
    center: Point3<f64>,
    axes: [Vector3<f64>; 3],
}

impl<'a> OrientedBox<'a> {
    fn new(half: &'a Vector3<f64>, pose: &Pose) -> Self {
        let m = pose.rotation_matrix();
        Self {
            half,
            center: pose.position,
            axes: [
                m.column(0).into_owned(),
                m.column(1).into_owned(),
                m.column(2).into_owned(),
            ],
        }
    }

    /// Half-extent of the box projected onto `axis`.
    fn projected_radius(&self, axis: &Vector3<f64>) -> f64 {
        self.half.x * axis.dot(&self.axes[0]).abs()
            + self.half.y * axis.dot(&self.axes[1]).abs()
            + self.half.z * axis.dot(&self.axes[2]).abs()
    }
}

fn keep_shallower(slot: &mut Option<SatAxis>, candidate: SatAxis) {
    if slot.map_or(true, |best| candidate.overlap < best.overlap) {
        *slot = Some(candidate);
    }
}

/// Run the separating axis test.
///
/// Returns `None` if any axis separates the boxes (touching counts as
/// separated). Near-zero cross products come from parallel edges and are
/// skipped. Otherwise returns the axis of least overlap, where a face of A
/// is only given up for a face of B or an edge axis that is shallower by
/// more than [`FACE_AXIS_PREFERENCE`].
#[must_use]
pub fn separating_axis_test(
    half_a: &Vector3<f64>,
    pose_a: &Pose,
    half_b: &Vector3<f64>,
    pose_b: &Pose,
) -> Option<SatAxis> {
    let box_a = OrientedBox::new(half_a, pose_a);
    let box_b = OrientedBox::new(half_b, pose_b);
    let center_diff = box_b.center - box_a.center;

    let test_axis = |axis: &Vector3<f64>, feature: SatFeature| -> Option<SatAxis> {
        let dist = axis.dot(&center_diff);
        let overlap = box_a.projected_radius(axis) + box_b.projected_radius(axis) - dist.abs();
        if overlap <= 0.0 {
            return None;
        }
        let normal = if dist < 0.0 { -axis } else { *axis };
        Some(SatAxis {
            normal,
            overlap,
            feature,
        })
    };

    let mut face_a = None;
    let mut face_b = None;
    let mut edge = None;
    for (i, axis) in box_a.axes.iter().enumerate() {
        keep_shallower(&mut face_a, test_axis(axis, SatFeature::FaceA(i))?);
    }
    for (i, axis) in box_b.axes.iter().enumerate() {
        keep_shallower(&mut face_b, test_axis(axis, SatFeature::FaceB(i))?);
    }
    for edge_a in &box_a.axes {
        for edge_b in &box_b.axes {
            let axis = edge_a.cross(edge_b);
            let len = axis.norm();
            if len < GEOM_EPSILON {
                continue;
            }
            keep_shallower(&mut edge, test_axis(&(axis / len), SatFeature::Edge)?);
        }
    }

    let mut best = face_a?;
    for candidate in [face_b, edge].into_iter().flatten() {
        if candidate.overlap < best.overlap - FACE_AXIS_PREFERENCE {
            best = candidate;
        }
    }
    Some(best)
}

fn contains(local: &Point3<f64>, half: &Vector3<f64>) -> bool {
    local.x.abs() <= half.x + CONTAINMENT_TOLERANCE
        && local.y.abs() <= half.y + CONTAINMENT_TOLERANCE
        && local.z.abs() <= half.z + CONTAINMENT_TOLERANCE
}

type Polygon = SmallVec<[Point3<f64>; 8]>;

/// Keep the part of a convex polygon where `plane_normal · p <= offset`.
fn clip_polygon(polygon: &Polygon, plane_normal: &Vector3<f64>, offset: f64) -> Polygon {
    let mut clipped = Polygon::new();
    for (i, p) in polygon.iter().enumerate() {
        let q = &polygon[(i + 1) % polygon.len()];
        let dp = plane_normal.dot(&p.coords) - offset;
        let dq = plane_normal.dot(&q.coords) - offset;
        if dp <= 0.0 {
            clipped.push(*p);
        }
        if (dp < 0.0 && dq > 0.0) || (dp > 0.0 && dq < 0.0) {
            clipped.push(p + (q - p) * (dp / (dp - dq)));
        }
    }
    clipped
}

/// Clip the incident face of `incident` against face `face` of `reference`.
///
/// `reference_normal` is the outward normal of the reference face. Points
/// below the reference face become contacts with `normal` and their depth
/// under that face.
fn face_contacts(
    reference: &OrientedBox<'_>,
    face: usize,
    reference_normal: &Vector3<f64>,
    incident: &OrientedBox<'_>,
    normal: &Vector3<f64>,
    out: &mut SmallVec<[ManifoldPoint; 24]>,
) {
    // Incident face: the one most anti-parallel to the reference normal.
    let mut j = 0;
    let mut best = -1.0;
    for (k, axis) in incident.axes.iter().enumerate() {
        let alignment = axis.dot(reference_normal).abs();
        if alignment > best {
            j = k;
            best = alignment;
        }
    }
    let side = if incident.axes[j].dot(reference_normal) > 0.0 {
        -1.0
    } else {
        1.0
    };
    let face_center = incident.center + incident.axes[j] * (side * incident.half[j]);
    let (u, v) = ((j + 1) % 3, (j + 2) % 3);
    let du = incident.axes[u] * incident.half[u];
    let dv = incident.axes[v] * incident.half[v];
    let mut polygon: Polygon = [
        face_center + du + dv,
        face_center - du + dv,
        face_center - du - dv,
        face_center + du - dv,
    ]
    .into_iter()
    .collect();

    for k in (0..3).filter(|&k| k != face) {
        let axis = reference.axes[k];
        let center = axis.dot(&reference.center.coords);
        polygon = clip_polygon(&polygon, &axis, center + reference.half[k]);
        polygon = clip_polygon(&polygon, &-axis, reference.half[k] - center);
        if polygon.is_empty() {
            return;
        }
    }

    let face_offset = reference_normal.dot(&reference.center.coords) + reference.half[face];
    for p in &polygon {
        let depth = face_offset - reference_normal.dot(&p.coords);
        // Unclipped incident corners are usually already in as vertices.
        let duplicate = out
            .iter()
            .any(|c| (c.point - p).norm() < CONTAINMENT_TOLERANCE);
        if depth >= 0.0 && !duplicate {
            out.push(ManifoldPoint::new(*p, *normal, depth));
        }
    }
}

/// Box A against box B. Normals point from A toward B.
#[must_use]
pub fn box_box(
    half_a: &Vector3<f64>,
    pose_a: &Pose,
    half_b: &Vector3<f64>,
    pose_b: &Pose,
) -> Manifold {
    let Some(sat) = separating_axis_test(half_a, pose_a, half_b, pose_b) else {
        return Manifold::new();
    };
    let n = sat.normal;
    let box_a = OrientedBox::new(half_a, pose_a);
    let box_b = OrientedBox::new(half_b, pose_b);
    // Face of B facing A, and face of A facing B, as offsets along n.
    let b_near = box_b.center.coords.dot(&n) - box_b.projected_radius(&n);
    let a_far = box_a.center.coords.dot(&n) + box_a.projected_radius(&n);

    let mut candidates: SmallVec<[ManifoldPoint; 24]> = SmallVec::new();
    for corner in &box_corners(half_a) {
        let world = pose_a.transform_point(corner);
        if contains(&pose_b.inverse_transform_point(&world), half_b) {
            let depth = world.coords.dot(&n) - b_near;
            candidates.push(ManifoldPoint::new(world, n, depth.max(0.0)));
        }
    }
    for corner in &box_corners(half_b) {
        let world = pose_b.transform_point(corner);
        if contains(&pose_a.inverse_transform_point(&world), half_a) {
            let depth = a_far - world.coords.dot(&n);
            candidates.push(ManifoldPoint::new(world, n, depth.max(0.0)));
        }
    }

    match sat.feature {
        SatFeature::FaceA(face) => {
            face_contacts(&box_a, face, &n, &box_b, &n, &mut candidates);
        }
        SatFeature::FaceB(face) => {
            face_contacts(&box_b, face, &-n, &box_a, &n, &mut candidates);
        }
        SatFeature::Edge => {}
    }

    if candidates.is_empty() {
        // Edge-edge crossings leave no vertex inside either box.
        let midpoint = Point3::from((pose_a.position.coords + pose_b.position.coords) * 0.5);
        let mut manifold = Manifold::new();
        manifold.push(ManifoldPoint::new(midpoint, n, sat.overlap));
        return manifold;
    }
    reduce_manifold(&candidates)
}

/// Index of the candidate maximizing `score`, skipping `taken`.
///
/// Ties go to the earliest candidate.
fn argmax(
    points: &[ManifoldPoint],
    taken: &[usize],
    score: impl Fn(&Point3<f64>) -> f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        if taken.contains(&i) {
            continue;
        }
        let s = score(&p.point);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best.map(|(i, _)| i)
}

/// Reduce a candidate set to at most four well-spread points.
///
/// Greedy farthest-point selection: farthest from the centroid, farthest from
/// that, farthest from the line through the two, farthest from the plane
/// through the three. When the candidates are coplanar the fourth point is
/// instead the one farthest from the first two on the side opposite the third.
#[must_use]
pub fn reduce_manifold(points: &[ManifoldPoint]) -> Manifold {
    if points.len() <= MAX_MANIFOLD_POINTS {
        return points.iter().copied().collect();
    }

    let centroid = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.point.coords)
        / points.len() as f64;
    let centroid = Point3::from(centroid);

    let mut taken: SmallVec<[usize; MAX_MANIFOLD_POINTS]> = SmallVec::new();
    let Some(i1) = argmax(points, &taken, |p| (p - centroid).norm_squared()) else {
        return Manifold::new();
    };
    taken.push(i1);
    let p1 = points[i1].point;

    if let Some(i2) = argmax(points, &taken, |p| (p - p1).norm_squared()) {
        taken.push(i2);
        let p2 = points[i2].point;
        let edge = p2 - p1;

        if let Some(i3) = argmax(points, &taken, |p| (p - p1).cross(&edge).norm_squared()) {
            taken.push(i3);
            let p3 = points[i3].point;
            let plane_normal = edge.cross(&(p3 - p1));

            let off_plane = argmax(points, &taken, |p| (p - p1).dot(&plane_normal).abs());
            let off_plane = off_plane.filter(|&i| {
                let len = plane_normal.norm();
                len > GEOM_EPSILON
                    && ((points[i].point - p1).dot(&plane_normal) / len).abs() > GEOM_EPSILON.sqrt()
            });
            let side = (p3 - p1).cross(&edge);
            let i4 = off_plane
                .or_else(|| argmax(points, &taken, |p| -((p - p1).cross(&edge)).dot(&side)));
            if let Some(i4) = i4 {
                taken.push(i4);
            }
        }
    }

    taken.iter().map(|&i| points[i]).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    fn unit_half() -> Vector3<f64> {
        Vector3::new(1.0, 1.0, 1.0)
    }

    #[test]
    fn test_known_overlap_along_x() {
        let manifold = box_box(
            &unit_half(),
            &Pose::identity(),
            &unit_half(),
            &Pose::from_xyz(1.5, 0.0, 0.0),
        );
        assert_eq!(manifold.len(), 4);
        for p in &manifold {
            assert_relative_eq!(p.normal, Vector3::x(), epsilon = 1e-12);
            assert_relative_eq!(p.penetration, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_separated_boxes() {
        let manifold = box_box(
            &unit_half(),
            &Pose::identity(),
            &unit_half(),
            &Pose::from_xyz(3.0, 0.0, 0.0),
        );
        assert!(manifold.is_empty());
    }

    #[test]
    fn test_touching_boxes_are_separated() {
        assert!(separating_axis_test(
            &unit_half(),
            &Pose::identity(),
            &unit_half(),
            &Pose::from_xyz(2.0, 0.0, 0.0),
        )
        .is_none());
    }

    #[test]
    fn test_normal_points_from_a_to_b() {
        let sat = separating_axis_test(
            &unit_half(),
            &Pose::from_xyz(0.0, 0.0, 1.8),
            &unit_half(),
            &Pose::identity(),
        )
        .unwrap();
        assert_relative_eq!(sat.normal, -Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(sat.overlap, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_stacked_box_gives_four_corners() {
        // Small box resting on a large one: its four bottom corners are inside.
        let manifold = box_box(
            &Vector3::new(2.0, 2.0, 0.5),
            &Pose::identity(),
            &Vector3::new(0.5, 0.5, 0.5),
            &Pose::from_xyz(0.0, 0.0, 0.99),
        );
        assert_eq!(manifold.len(), 4);
        for p in &manifold {
            assert_relative_eq!(p.normal, Vector3::z(), epsilon = 1e-12);
            assert_relative_eq!(p.penetration, 0.01, epsilon = 1e-9);
            assert_relative_eq!(p.point.z, 0.49, epsilon = 1e-9);
        }
        // One point per corner.
        let mut xs: Vec<_> = manifold
            .iter()
            .map(|p| (p.point.x.signum(), p.point.y.signum()))
            .collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        xs.dedup();
        assert_eq!(xs.len(), 4);
    }

    #[test]
    fn test_equal_cubes_stacked_give_four_points() {
        let half = Vector3::new(0.5, 0.5, 0.5);
        let manifold = box_box(&half, &Pose::identity(), &half, &Pose::from_xyz(0.0, 0.0, 0.99));
        assert_eq!(manifold.len(), 4);
        for p in &manifold {
            assert_relative_eq!(p.normal, Vector3::z(), epsilon = 1e-12);
            assert_relative_eq!(p.penetration, 0.01, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_offset_equal_cubes_clip_to_overlap() {
        // Shifted in x: the faces overlap over x in [-0.4, 0.5].
        let half = Vector3::new(0.5, 0.5, 0.5);
        let manifold = box_box(&half, &Pose::identity(), &half, &Pose::from_xyz(0.1, 0.0, 0.99));
        assert_eq!(manifold.len(), 4);
        for p in &manifold {
            assert_relative_eq!(p.normal, Vector3::z(), epsilon = 1e-12);
            assert_relative_eq!(p.penetration, 0.01, epsilon = 1e-9);
            assert!(p.point.x >= -0.4 - 1e-9 && p.point.x <= 0.5 + 1e-9);
        }
        let min_x = manifold.iter().map(|p| p.point.x).fold(f64::INFINITY, f64::min);
        assert_relative_eq!(min_x, -0.4, epsilon = 1e-9);
    }

    #[test]
    fn test_nearly_parallel_faces_keep_face_axis() {
        let half = Vector3::new(0.5, 0.5, 0.5);
        let pose_b = Pose::from_position_rotation(
            Point3::new(0.1, 0.0, 0.99),
            UnitQuaternion::from_euler_angles(1e-7, 1e-7, 0.0),
        );
        let sat = separating_axis_test(&half, &Pose::identity(), &half, &pose_b).unwrap();
        assert_eq!(sat.feature, SatFeature::FaceA(2));

        let manifold = box_box(&half, &Pose::identity(), &half, &pose_b);
        assert_eq!(manifold.len(), 4);
        for p in &manifold {
            assert_relative_eq!(p.normal, Vector3::z(), epsilon = 1e-12);
            assert_relative_eq!(p.penetration, 0.01, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_clip_polygon_cuts_square() {
        let square: Polygon = [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ]
        .into_iter()
        .collect();
        let clipped = clip_polygon(&square, &Vector3::x(), 0.5);
        assert_eq!(clipped.len(), 4);
        for p in &clipped {
            assert!(p.x <= 0.5 + 1e-12);
        }
        assert!(clip_polygon(&square, &Vector3::x(), -2.0).is_empty());
    }

    #[test]
    fn test_rotated_box_corner_into_face() {
        // B rotated so one edge pokes down into A's top face.
        let rotation = UnitQuaternion::from_euler_angles(std::f64::consts::FRAC_PI_4, 0.0, 0.0);
        let pose_b = Pose::from_position_rotation(Point3::new(0.0, 0.0, 2.3), rotation);
        let manifold = box_box(&unit_half(), &Pose::identity(), &unit_half(), &pose_b);

        // The leading edge's two ends, found once each.
        assert_eq!(manifold.len(), 2);
        let expected = 1.0 - (2.3 - std::f64::consts::SQRT_2);
        for p in &manifold {
            assert_relative_eq!(p.normal, Vector3::z(), epsilon = 1e-9);
            assert_relative_eq!(p.penetration, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_edge_edge_falls_back_to_midpoint() {
        // Two boxes crossed edge to edge: no vertex lies inside the other.
        let pose_a = Pose::from_position_rotation(
            Point3::origin(),
            UnitQuaternion::from_euler_angles(std::f64::consts::FRAC_PI_4, 0.0, 0.0),
        );
        let pose_b = Pose::from_position_rotation(
            Point3::new(0.0, 0.0, 2.0 * std::f64::consts::SQRT_2 - 0.1),
            UnitQuaternion::from_euler_angles(0.0, std::f64::consts::FRAC_PI_4, 0.0),
        );
        let manifold = box_box(&unit_half(), &pose_a, &unit_half(), &pose_b);

        assert_eq!(manifold.len(), 1);
        assert_relative_eq!(manifold[0].normal, Vector3::z(), epsilon = 1e-9);
        assert_relative_eq!(manifold[0].penetration, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_reduce_keeps_small_sets() {
        let points: Vec<_> = (0..3)
            .map(|i| ManifoldPoint::new(Point3::new(f64::from(i), 0.0, 0.0), Vector3::z(), 0.1))
            .collect();
        assert_eq!(reduce_manifold(&points).len(), 3);
    }

    #[test]
    fn test_reduce_coplanar_grid_picks_corners() {
        let mut points = Vec::new();
        for i in 0..3 {
            for j in 0..3 {
                points.push(ManifoldPoint::new(
                    Point3::new(f64::from(i) - 1.0, f64::from(j) - 1.0, 0.0),
                    Vector3::z(),
                    0.1,
                ));
            }
        }
        let reduced = reduce_manifold(&points);
        assert_eq!(reduced.len(), 4);
        for p in &reduced {
            assert_relative_eq!(p.point.x.abs(), 1.0);
            assert_relative_eq!(p.point.y.abs(), 1.0);
        }
    }
}
