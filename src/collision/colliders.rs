//! [`StaticColliders`], an exact [`CollisionQuery`] backend for walls and boxes, answered by
//! `parry3d`.

use bevy_math::prelude::*;
use parry3d::{
    math::{Isometry, Point, Real, Vector},
    na::{Quaternion, Translation3, Unit, UnitQuaternion},
    query::{self, PointQuery, Ray, RayCast, ShapeCastOptions, ShapeCastStatus},
    shape as pshape,
};

use super::{BoxSweep, CollisionMask, CollisionQuery, CollisionQueryError, Hit};

/// Geometry a [`Collider`] occupies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Everything behind an infinite plane. `normal` points out of the solid, and the plane holds
    /// every point `p` with `normal.dot(p) == offset`.
    HalfSpace {
        /// Outward facing plane normal.
        normal: Dir3,
        /// Signed distance of the plane from the origin along `normal`.
        offset: f32,
    },
    /// An axis aligned box.
    Cuboid {
        /// Center of the box.
        center: Vec3,
        /// Half size along each world axis.
        half_extents: Vec3,
    },
}

/// A solid shape that belongs to a set of layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    /// The occupied space.
    pub shape: Shape,
    /// Layers this collider is on. Queries only see colliders whose layers intersect their mask.
    pub layers: CollisionMask,
}

impl Collider {
    /// A wall whose surface passes through `point`, with `normal` pointing into free space.
    pub fn wall(point: Vec3, normal: Dir3) -> Self {
        Self {
            shape: Shape::HalfSpace {
                normal,
                offset: normal.dot(point),
            },
            layers: CollisionMask::ALL,
        }
    }

    /// An axis aligned box.
    pub fn cuboid(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            shape: Shape::Cuboid {
                center,
                half_extents: half_extents.abs(),
            },
            layers: CollisionMask::ALL,
        }
    }

    /// Put this collider on the given layers only.
    #[must_use]
    pub fn on_layers(self, layers: CollisionMask) -> Self {
        Self { layers, ..self }
    }

    /// Run `query` against the `parry3d` shape of this collider, placed in the world.
    fn with_parry_shape<R>(&self, query: impl FnOnce(&Isometry<Real>, &dyn pshape::Shape) -> R) -> R {
        match self.shape {
            Shape::HalfSpace { normal, offset } => query(
                &isometry(*normal * offset, Quat::IDENTITY),
                &pshape::HalfSpace::new(Unit::new_normalize(vector(*normal))),
            ),
            Shape::Cuboid {
                center,
                half_extents,
            } => query(
                &isometry(center, Quat::IDENTITY),
                &pshape::Cuboid::new(vector(half_extents)),
            ),
        }
    }

    fn ray_hit(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<Hit> {
        self.with_parry_shape(|pose, shape| {
            // Rays that start inside a solid don't see it.
            if shape.contains_point(pose, &point(origin)) {
                return None;
            }
            let ray = Ray::new(point(origin), vector(*direction));
            let distance = shape.cast_ray(pose, &ray, max_distance, true)?;
            Some(Hit {
                distance,
                point: origin + *direction * distance,
            })
        })
    }

    fn sweep_hit(
        &self,
        sweep: &BoxSweep,
        rectangle: &pshape::Cuboid,
    ) -> Result<Option<Hit>, CollisionQueryError> {
        let start = isometry(sweep.origin, sweep.orientation);
        let velocity = vector(*sweep.direction);
        self.with_parry_shape(|pose, shape| {
            let hit = query::cast_shapes(
                &start,
                &velocity,
                rectangle,
                pose,
                &Vector::zeros(),
                shape,
                ShapeCastOptions::with_max_time_of_impact(sweep.max_distance),
            )
            .map_err(|_| CollisionQueryError::Unavailable("unsupported sweep shapes".into()))?;

            Ok(hit
                // Sweeps that start overlapping a solid don't see it.
                .filter(|hit| !matches!(hit.status, ShapeCastStatus::PenetratingOrWithinTargetDist))
                .map(|hit| Hit {
                    distance: hit.time_of_impact,
                    point: from_point(pose.transform_point(&hit.witness2)),
                }))
        })
    }
}

fn vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

fn point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

fn from_point(p: Point<Real>) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

fn isometry(translation: Vec3, rotation: Quat) -> Isometry<Real> {
    Isometry::from_parts(
        Translation3::new(translation.x, translation.y, translation.z),
        UnitQuaternion::from_quaternion(Quaternion::new(rotation.w, rotation.x, rotation.y, rotation.z)),
    )
}

/// A fixed list of colliders, queried by brute force.
///
/// Good for tests, tools and blockout scenes. Games with a physics engine should implement
/// [`CollisionQuery`] on top of it instead.
#[derive(Debug, Clone, Default)]
pub struct StaticColliders {
    colliders: Vec<Collider>,
}

impl StaticColliders {
    /// An empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collider.
    #[must_use]
    pub fn with(mut self, collider: Collider) -> Self {
        self.push(collider);
        self
    }

    /// Add a collider.
    pub fn push(&mut self, collider: Collider) {
        self.colliders.push(collider);
    }

    /// The colliders in this scene.
    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    fn nearest(
        &self,
        mask: CollisionMask,
        hit: impl Fn(&Collider) -> Result<Option<Hit>, CollisionQueryError>,
    ) -> Result<Option<Hit>, CollisionQueryError> {
        let mut nearest: Option<Hit> = None;
        for collider in self.colliders.iter().filter(|collider| collider.layers.intersects(mask)) {
            if let Some(hit) = hit(collider)? {
                if nearest.map_or(true, |nearest| hit.distance < nearest.distance) {
                    nearest = Some(hit);
                }
            }
        }
        Ok(nearest)
    }
}

impl CollisionQuery for StaticColliders {
    fn sweep_box(
        &self,
        sweep: &BoxSweep,
        mask: CollisionMask,
    ) -> Result<Option<Hit>, CollisionQueryError> {
        let sweep = BoxSweep {
            orientation: sweep.orientation.normalize(),
            ..*sweep
        };
        let rectangle = pshape::Cuboid::new(vector(sweep.half_extents.abs()));
        self.nearest(mask, |collider| collider.sweep_hit(&sweep, &rectangle))
    }

    fn linecast(
        &self,
        from: Vec3,
        to: Vec3,
        mask: CollisionMask,
    ) -> Result<Option<Hit>, CollisionQueryError> {
        let Ok((direction, length)) = Dir3::new_and_length(to - from) else {
            return Ok(None);
        };
        self.raycast(from, direction, length, mask)
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Dir3,
        max_distance: f32,
        mask: CollisionMask,
    ) -> Result<Option<Hit>, CollisionQueryError> {
        self.nearest(mask, |collider| Ok(collider.ray_hit(origin, direction, max_distance)))
    }
}

impl FromIterator<Collider> for StaticColliders {
    fn from_iter<T: IntoIterator<Item = Collider>>(iter: T) -> Self {
        Self {
            colliders: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn ray_hits_wall_in_front() {
        let scene = StaticColliders::new().with(Collider::wall(Vec3::new(0.0, 0.0, 2.0), Dir3::NEG_Z));
        let hit = scene
            .raycast(Vec3::ZERO, Dir3::Z, 10.0, CollisionMask::ALL)
            .unwrap()
            .unwrap();
        assert!(approx(hit.distance, 2.0));
        assert!(approx(hit.point.z, 2.0));
    }

    #[test]
    fn ray_ignores_walls_behind_or_out_of_reach() {
        let scene = StaticColliders::new().with(Collider::wall(Vec3::new(0.0, 0.0, 2.0), Dir3::NEG_Z));
        assert_eq!(scene.raycast(Vec3::ZERO, Dir3::NEG_Z, 10.0, CollisionMask::ALL), Ok(None));
        assert_eq!(scene.raycast(Vec3::ZERO, Dir3::Z, 1.5, CollisionMask::ALL), Ok(None));
        // Starting inside the solid does not report it.
        assert_eq!(
            scene.raycast(Vec3::new(0.0, 0.0, 3.0), Dir3::Z, 10.0, CollisionMask::ALL),
            Ok(None)
        );
    }

    #[test]
    fn masks_filter_colliders() {
        let scene = StaticColliders::new().with(
            Collider::cuboid(Vec3::new(0.0, 0.0, 5.0), Vec3::ONE).on_layers(CollisionMask::layer(2)),
        );
        assert_eq!(scene.linecast(Vec3::ZERO, Vec3::Z * 10.0, CollisionMask::layer(1)), Ok(None));
        let hit = scene
            .linecast(Vec3::ZERO, Vec3::Z * 10.0, CollisionMask::layer(2))
            .unwrap()
            .unwrap();
        assert!(approx(hit.distance, 4.0));
    }

    #[test]
    fn linecast_stops_at_its_end_point() {
        let scene = StaticColliders::new().with(Collider::cuboid(Vec3::new(0.0, 0.0, 5.0), Vec3::ONE));
        assert_eq!(scene.linecast(Vec3::ZERO, Vec3::Z * 3.9, CollisionMask::ALL), Ok(None));
        assert!(scene
            .linecast(Vec3::ZERO, Vec3::Z * 4.1, CollisionMask::ALL)
            .unwrap()
            .is_some());
    }

    #[test]
    fn nearest_collider_wins() {
        let scene: StaticColliders = [
            Collider::cuboid(Vec3::new(0.0, 0.0, 8.0), Vec3::ONE),
            Collider::cuboid(Vec3::new(0.0, 0.0, 4.0), Vec3::splat(0.5)),
        ]
        .into_iter()
        .collect();
        let hit = scene
            .raycast(Vec3::ZERO, Dir3::Z, 20.0, CollisionMask::ALL)
            .unwrap()
            .unwrap();
        assert!(approx(hit.distance, 3.5));
    }

    #[test]
    fn box_sweep_catches_a_post_a_ray_would_miss() {
        // A thin post just off the center line.
        let scene = StaticColliders::new().with(Collider::cuboid(
            Vec3::new(0.4, 0.0, 3.0),
            Vec3::new(0.05, 5.0, 0.05),
        ));
        assert_eq!(scene.raycast(Vec3::ZERO, Dir3::Z, 10.0, CollisionMask::ALL), Ok(None));

        let sweep = BoxSweep {
            origin: Vec3::ZERO,
            half_extents: Vec3::new(0.5, 0.3, 0.0),
            direction: Dir3::Z,
            orientation: Quat::IDENTITY,
            max_distance: 10.0,
        };
        let hit = scene.sweep_box(&sweep, CollisionMask::ALL).unwrap().unwrap();
        assert!(approx(hit.distance, 2.95));
    }

    #[test]
    fn box_sweep_against_tilted_wall_uses_nearest_corner() {
        let normal = Dir3::new(Vec3::new(1.0, 0.0, -1.0)).unwrap();
        let scene = StaticColliders::new().with(Collider::wall(Vec3::new(0.0, 0.0, 4.0), normal));
        let sweep = BoxSweep {
            origin: Vec3::ZERO,
            half_extents: Vec3::new(0.5, 0.5, 0.0),
            direction: Dir3::Z,
            orientation: Quat::IDENTITY,
            max_distance: 10.0,
        };
        let hit = scene.sweep_box(&sweep, CollisionMask::ALL).unwrap().unwrap();
        // The left edge (x = -0.5) reaches the plane z = 4 + x first.
        assert!(approx(hit.distance, 3.5));
    }

    #[test]
    fn box_sweep_misses_when_out_of_reach() {
        let scene = StaticColliders::new().with(Collider::cuboid(Vec3::new(0.0, 0.0, 6.0), Vec3::ONE));
        let sweep = BoxSweep {
            origin: Vec3::ZERO,
            half_extents: Vec3::new(0.2, 0.2, 0.0),
            direction: Dir3::Z,
            orientation: Quat::IDENTITY,
            max_distance: 4.0,
        };
        assert_eq!(scene.sweep_box(&sweep, CollisionMask::ALL), Ok(None));
    }

    #[test]
    fn box_sweep_ignores_a_box_it_starts_inside() {
        let scene = StaticColliders::new()
            .with(Collider::cuboid(Vec3::ZERO, Vec3::ONE))
            .with(Collider::cuboid(Vec3::new(0.0, 0.0, 5.0), Vec3::ONE));
        let sweep = BoxSweep {
            origin: Vec3::ZERO,
            half_extents: Vec3::new(0.2, 0.2, 0.0),
            direction: Dir3::Z,
            orientation: Quat::IDENTITY,
            max_distance: 10.0,
        };
        let hit = scene.sweep_box(&sweep, CollisionMask::ALL).unwrap().unwrap();
        assert!(approx(hit.distance, 4.0));
        assert!(approx(hit.point.z, 4.0));
    }
}
