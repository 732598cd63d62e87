//! Batch applicator: sample, synthesize and apply per target, all or nothing.

use serde::Serialize;

use crate::geom::{BBox, BoundingFrame, FrameError, Point3, Transform};
use crate::host::ProgressSink;
use crate::scene::{EntityRef, Journal, ObjectId, RigidObject, Scene, SceneError};
use crate::signal::{Sampler, SignalError};
use crate::transform::{extrusion_distance, synthesize, Effect};

/// Point a synthesized transform acts about.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Pivot {
    /// Object transform origin; representative point for everything else.
    #[default]
    Origin,
    /// Centre of an object's bounds, centroid of a face.
    Centroid,
    Fixed(Point3),
}

/// Axes a synthesized transform is expressed in, for rigid objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplySpace {
    /// The object's own axes: `transform * T`.
    #[default]
    Local,
    /// World axes: `T * transform`.
    World,
}

#[derive(Debug, Clone)]
pub struct BatchPlan {
    /// Name shown with progress updates.
    pub label: String,
    pub targets: Vec<EntityRef>,
    pub frame: BoundingFrame,
    pub effect: Effect,
    /// Applied to every sampled value.
    pub multiplier: f64,
    pub pivot: Pivot,
    pub space: ApplySpace,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    /// Scalar applied to each target, in processing order.
    pub scalars: Vec<(EntityRef, f64)>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BatchError {
    #[error("nothing to process")]
    Empty,
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Signal(#[from] SignalError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("{target} (item {}): {source}", .index + 1)]
    Sample {
        index: usize,
        target: EntityRef,
        #[source]
        source: SignalError,
    },
    #[error("{target} has a singular transform; its local pivot is undefined")]
    SingularTransform { target: EntityRef },
    #[error("{target}: scalar {value} does not give a finite transform")]
    NonFiniteScalar { target: EntityRef, value: f64 },
    #[error("{target} cannot be {effect}")]
    UnsupportedEffect {
        target: EntityRef,
        effect: &'static str,
    },
}

/// Frame around the world bounds of `entities`.
pub fn frame_for(scene: &Scene, entities: &[EntityRef]) -> Result<BoundingFrame, BatchError> {
    let boxes = entities
        .iter()
        .map(|entity| scene.bounds(*entity))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(BoundingFrame::from_boxes(boxes)?)
}

/// Run `plan` against `scene`. On any failure every change made so far is
/// rolled back and the scene is left exactly as it was.
pub fn apply_batch(
    scene: &mut Scene,
    plan: &BatchPlan,
    sampler: &dyn Sampler,
    progress: &mut dyn ProgressSink,
) -> Result<BatchReport, BatchError> {
    if plan.targets.is_empty() {
        return Err(BatchError::Empty);
    }
    for target in &plan.targets {
        scene.check(*target)?;
    }
    sampler.prepare(&plan.frame)?;

    let mut journal = Journal::begin(scene);
    match run(scene, plan, sampler, progress, &mut journal) {
        Ok(report) => {
            log::debug!(
                "{}: applied {} item(s), {} journal entries",
                plan.label,
                report.processed,
                journal.len()
            );
            Ok(report)
        }
        Err(err) => {
            log::warn!("{}: rolling back {} change(s): {err}", plan.label, journal.len());
            scene.rollback(journal);
            Err(err)
        }
    }
}

fn run(
    scene: &mut Scene,
    plan: &BatchPlan,
    sampler: &dyn Sampler,
    progress: &mut dyn ProgressSink,
    journal: &mut Journal,
) -> Result<BatchReport, BatchError> {
    let mut scalars = Vec::with_capacity(plan.targets.len());
    for (index, target) in plan.targets.iter().copied().enumerate() {
        let point = scene.representative_point(target)?;
        let value = sampler
            .sample(point, &plan.frame)
            .map_err(|source| BatchError::Sample {
                index,
                target,
                source,
            })?;
        let scalar = value * plan.multiplier;
        if !scalar.is_finite() {
            return Err(BatchError::NonFiniteScalar {
                target,
                value: scalar,
            });
        }

        apply_one(scene, plan, target, scalar, journal)?;
        scalars.push((target, scalar));
        progress.progress(&plan.label, index + 1);
    }
    Ok(BatchReport {
        processed: scalars.len(),
        scalars,
    })
}

fn apply_one(
    scene: &mut Scene,
    plan: &BatchPlan,
    target: EntityRef,
    scalar: f64,
    journal: &mut Journal,
) -> Result<(), BatchError> {
    match (target, plan.effect) {
        (EntityRef::Object(id), Effect::Transform(kind)) => {
            let object = scene.object(id)?;
            let next = match plan.space {
                ApplySpace::Local => {
                    let pivot = local_pivot(object, plan.pivot)
                        .ok_or(BatchError::SingularTransform { target })?;
                    object.transform * synthesize(scalar, kind, pivot)
                }
                ApplySpace::World => {
                    let pivot = world_pivot(scene, target, plan.pivot)?;
                    synthesize(scalar, kind, pivot) * object.transform
                }
            };
            set_transform(scene, target, id, next, scalar, journal)
        }
        (EntityRef::Object(id), Effect::Displace(offset)) => {
            let next = Transform::translate(offset * scalar) * scene.object(id)?.transform;
            set_transform(scene, target, id, next, scalar, journal)
        }
        (EntityRef::Region(id), Effect::PushPull { min, max, create_faces }) => {
            let distance = extrusion_distance(min, max, scalar);
            if !distance.is_finite() {
                return Err(BatchError::NonFiniteScalar {
                    target,
                    value: scalar,
                });
            }
            scene.push_pull(id, distance, create_faces, journal)?;
            Ok(())
        }
        (_, Effect::PushPull { .. }) => Err(BatchError::UnsupportedEffect {
            target,
            effect: "pushed or pulled",
        }),
        (_, Effect::Transform(kind)) => {
            let pivot = world_pivot(scene, target, plan.pivot)?;
            let transform = synthesize(scalar, kind, pivot);
            move_points(scene, target, scalar, journal, |p| transform.apply_point(p))
        }
        (_, Effect::Displace(offset)) => {
            let step = offset * scalar;
            move_points(scene, target, scalar, journal, |p| p + step)
        }
    }
}

fn set_transform(
    scene: &mut Scene,
    target: EntityRef,
    id: ObjectId,
    next: Transform,
    scalar: f64,
    journal: &mut Journal,
) -> Result<(), BatchError> {
    if !next.is_finite() {
        return Err(BatchError::NonFiniteScalar {
            target,
            value: scalar,
        });
    }
    scene.set_object_transform(id, next, journal)?;
    Ok(())
}

fn move_points(
    scene: &mut Scene,
    target: EntityRef,
    scalar: f64,
    journal: &mut Journal,
    map: impl Fn(Point3) -> Point3,
) -> Result<(), BatchError> {
    for id in scene.constituent_points(target)? {
        let moved = map(scene.point(id)?);
        if !moved.is_finite() {
            return Err(BatchError::NonFiniteScalar {
                target,
                value: scalar,
            });
        }
        scene.move_point(id, moved, journal)?;
    }
    Ok(())
}

/// Pivot in the object's own coordinates, `None` when it would need the
/// inverse of a singular transform.
fn local_pivot(object: &RigidObject, pivot: Pivot) -> Option<Point3> {
    match pivot {
        Pivot::Origin => Some(Point3::ORIGIN),
        Pivot::Centroid => Some(object.local_bounds.map_or(Point3::ORIGIN, BBox::center)),
        Pivot::Fixed(point) => object
            .transform
            .inverse()
            .map(|inverse| inverse.apply_point(point)),
    }
}

fn world_pivot(scene: &Scene, target: EntityRef, pivot: Pivot) -> Result<Point3, BatchError> {
    Ok(match (pivot, target) {
        (Pivot::Fixed(point), _) => point,
        (Pivot::Origin, EntityRef::Object(id)) => scene.object(id)?.transform.origin(),
        (Pivot::Centroid, EntityRef::Object(id)) => scene.object(id)?.world_bounds().center(),
        (Pivot::Origin | Pivot::Centroid, _) => scene.representative_point(target)?,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::geom::{Axis, Tolerance, Vec3};
    use crate::host::NoProgress;
    use crate::transform::TransformKind;

    /// Returns `value` until call number `fail_at`, then fails.
    struct FailingSampler {
        value: f64,
        fail_at: usize,
        calls: Cell<usize>,
    }

    impl Sampler for FailingSampler {
        fn sample(&self, _point: Point3, _frame: &BoundingFrame) -> Result<f64, SignalError> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if call == self.fail_at {
                Err(SignalError::Frame(FrameError::DegenerateExtent { axis: Axis::Z }))
            } else {
                Ok(self.value)
            }
        }
    }

    struct Constant(f64);

    impl Sampler for Constant {
        fn sample(&self, _point: Point3, _frame: &BoundingFrame) -> Result<f64, SignalError> {
            Ok(self.0)
        }
    }

    fn row_of_objects(count: usize) -> (Scene, Vec<EntityRef>) {
        let mut scene = Scene::new();
        let targets = (0..count)
            .map(|i| {
                let at = Transform::translate(Vec3::new(i as f64 * 3.0, 0.0, 0.0));
                let bounds = BBox::new(Point3::ORIGIN, Point3::new(1.0, 1.0, 1.0));
                scene
                    .add_object(RigidObject::component("box", at).with_bounds(bounds))
                    .into()
            })
            .collect();
        (scene, targets)
    }

    fn plan(scene: &Scene, targets: Vec<EntityRef>, effect: Effect) -> BatchPlan {
        BatchPlan {
            label: "test".into(),
            frame: frame_for(scene, &targets).unwrap(),
            targets,
            effect,
            multiplier: 1.0,
            pivot: Pivot::Origin,
            space: ApplySpace::Local,
        }
    }

    #[test]
    fn failure_mid_batch_rolls_everything_back() {
        let (mut scene, targets) = row_of_objects(5);
        let before = scene.clone();
        let plan = plan(&scene, targets, Effect::Transform(TransformKind::UniformScale));
        let sampler = FailingSampler {
            value: 2.0,
            fail_at: 3,
            calls: Cell::new(0),
        };

        let err = apply_batch(&mut scene, &plan, &sampler, &mut NoProgress).unwrap_err();
        assert!(matches!(
            err,
            BatchError::Sample {
                index: 2,
                source: SignalError::Frame(FrameError::DegenerateExtent { .. }),
                ..
            }
        ));
        assert_eq!(scene, before);
    }

    #[test]
    fn local_scale_keeps_object_origin() {
        let (mut scene, targets) = row_of_objects(2);
        let plan = plan(&scene, targets, Effect::Transform(TransformKind::UniformScale));
        let report = apply_batch(&mut scene, &plan, &Constant(0.5), &mut NoProgress).unwrap();
        assert_eq!(report.processed, 2);

        let object = &scene.objects()[1];
        assert_eq!(object.transform.origin(), Point3::new(3.0, 0.0, 0.0));
        assert!((object.transform.axis_scale(Axis::X) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn world_space_with_fixed_pivot() {
        let (mut scene, targets) = row_of_objects(2);
        let mut plan = plan(&scene, targets, Effect::Transform(TransformKind::UniformScale));
        plan.space = ApplySpace::World;
        plan.pivot = Pivot::Fixed(Point3::ORIGIN);
        apply_batch(&mut scene, &plan, &Constant(2.0), &mut NoProgress).unwrap();
        assert_eq!(scene.objects()[1].transform.origin(), Point3::new(6.0, 0.0, 0.0));
    }

    /// Box 2x1x1 turned a quarter about Z and moved to x = 3; its centre
    /// sits at (2.5, 1, 0.5).
    fn turned_box() -> (Scene, EntityRef) {
        let mut scene = Scene::new();
        let at = Transform::translate(Vec3::new(3.0, 0.0, 0.0))
            * Transform::rotate(Axis::Z, std::f64::consts::FRAC_PI_2);
        let bounds = BBox::new(Point3::ORIGIN, Point3::new(2.0, 1.0, 1.0));
        let target = scene.add_object(RigidObject::group("box", at, bounds)).into();
        (scene, target)
    }

    #[test]
    fn centroid_pivot_in_local_axes() {
        let (mut scene, target) = turned_box();
        let mut plan = plan(&scene, vec![target], Effect::Transform(TransformKind::Scale(Axis::X)));
        plan.pivot = Pivot::Centroid;
        apply_batch(&mut scene, &plan, &Constant(2.0), &mut NoProgress).unwrap();

        let object = &scene.objects()[0];
        let tol = Tolerance::DEFAULT;
        assert!(tol.approx_eq_point3(object.world_bounds().center(), Point3::new(2.5, 1.0, 0.5)));
        // Stretched along its own x, which now points along world y.
        assert!(tol.approx_eq_point3(object.transform.origin(), Point3::new(3.0, -1.0, 0.0)));
        assert!(tol.approx_eq_f64(object.transform.axis_scale(Axis::X), 2.0));
    }

    #[test]
    fn centroid_pivot_in_world_axes() {
        let (mut scene, target) = turned_box();
        let mut plan = plan(&scene, vec![target], Effect::Transform(TransformKind::Scale(Axis::X)));
        plan.pivot = Pivot::Centroid;
        plan.space = ApplySpace::World;
        apply_batch(&mut scene, &plan, &Constant(2.0), &mut NoProgress).unwrap();

        let object = &scene.objects()[0];
        let tol = Tolerance::DEFAULT;
        assert!(tol.approx_eq_point3(object.world_bounds().center(), Point3::new(2.5, 1.0, 0.5)));
        assert!(tol.approx_eq_point3(object.transform.origin(), Point3::new(3.5, 0.0, 0.0)));
        // World x is the box's own y.
        assert!(tol.approx_eq_f64(object.transform.axis_scale(Axis::Y), 2.0));
        assert!(tol.approx_eq_f64(object.transform.axis_scale(Axis::X), 1.0));
    }

    #[test]
    fn singular_transform_cannot_take_a_fixed_local_pivot() {
        let mut scene = Scene::new();
        let flat = Transform::scale(Vec3::new(1.0, 1.0, 0.0));
        let target: EntityRef = scene.add_object(RigidObject::component("flat", flat)).into();
        let other: EntityRef = scene
            .add_object(RigidObject::component("box", Transform::translate(Vec3::ONE)))
            .into();
        let before = scene.clone();

        let mut plan = plan(&scene, vec![other, target], Effect::Transform(TransformKind::UniformScale));
        plan.pivot = Pivot::Fixed(Point3::ORIGIN);
        let err = apply_batch(&mut scene, &plan, &Constant(2.0), &mut NoProgress).unwrap_err();
        assert_eq!(err, BatchError::SingularTransform { target });
        assert_eq!(scene, before);
    }

    #[test]
    fn points_are_displaced_and_progress_reported() {
        let mut scene = Scene::new();
        let a = scene.add_point(Point3::ORIGIN);
        let b = scene.add_point(Point3::new(1.0, 1.0, 0.0));
        let targets = vec![EntityRef::Point(a), EntityRef::Point(b)];
        let plan = plan(&scene, targets, Effect::Displace(Vec3::new(0.0, 0.0, 4.0)));

        let mut seen = Vec::new();
        let mut sink = |_: &str, done: usize| seen.push(done);
        apply_batch(&mut scene, &plan, &Constant(0.5), &mut sink).unwrap();
        assert_eq!(seen, [1, 2]);
        assert!(Tolerance::DEFAULT.approx_eq_point3(
            scene.point(b).unwrap(),
            Point3::new(1.0, 1.0, 2.0)
        ));
    }

    #[test]
    fn push_pull_only_applies_to_faces() {
        let (mut scene, targets) = row_of_objects(1);
        let plan = plan(
            &scene,
            targets,
            Effect::PushPull {
                min: 0.0,
                max: 1.0,
                create_faces: false,
            },
        );
        assert!(matches!(
            apply_batch(&mut scene, &plan, &Constant(1.0), &mut NoProgress),
            Err(BatchError::UnsupportedEffect { .. })
        ));
    }

    #[test]
    fn non_finite_scalar_aborts() {
        let (mut scene, targets) = row_of_objects(2);
        let before = scene.clone();
        let mut plan = plan(&scene, targets, Effect::Transform(TransformKind::UniformScale));
        plan.multiplier = f64::INFINITY;
        assert!(matches!(
            apply_batch(&mut scene, &plan, &Constant(1.0), &mut NoProgress),
            Err(BatchError::NonFiniteScalar { .. })
        ));
        assert_eq!(scene, before);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let mut scene = Scene::new();
        let frame = BoundingFrame::from_points(&[Point3::ORIGIN]).unwrap();
        let plan = BatchPlan {
            label: "empty".into(),
            targets: Vec::new(),
            frame,
            effect: Effect::Transform(TransformKind::UniformScale),
            multiplier: 1.0,
            pivot: Pivot::Origin,
            space: ApplySpace::Local,
        };
        assert_eq!(
            apply_batch(&mut scene, &plan, &Constant(1.0), &mut NoProgress),
            Err(BatchError::Empty)
        );
    }
}
