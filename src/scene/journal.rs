//! Undo journal for one batch.

use super::{ObjectId, PointId, RegionId, Scene};
use crate::geom::{Point3, Transform};

/// Previous state of one mutated entity.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    ObjectTransform { object: ObjectId, previous: Transform },
    PointPosition { point: PointId, previous: Point3 },
    RegionVertices { region: RegionId, previous: Vec<PointId> },
}

/// Records every mutation made through the journaled [`Scene`] methods so
/// that the batch can be undone as a whole. Entities created while the
/// journal is open are removed again by truncating back to the marks taken
/// at [`Journal::begin`].
#[derive(Debug, Clone, PartialEq)]
pub struct Journal {
    entries: Vec<JournalEntry>,
    points_mark: usize,
    edges_mark: usize,
    regions_mark: usize,
}

impl Journal {
    #[must_use]
    pub fn begin(scene: &Scene) -> Self {
        Self {
            entries: Vec::new(),
            points_mark: scene.points.len(),
            edges_mark: scene.edges.len(),
            regions_mark: scene.regions.len(),
        }
    }

    pub(crate) fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Scene {
    /// Restore the state the scene had when `journal` was begun.
    pub fn rollback(&mut self, journal: Journal) {
        let Journal {
            entries,
            points_mark,
            edges_mark,
            regions_mark,
        } = journal;

        for entry in entries.into_iter().rev() {
            match entry {
                JournalEntry::ObjectTransform { object, previous } => {
                    if let Some(target) = self.objects.get_mut(object.0) {
                        target.transform = previous;
                    }
                }
                JournalEntry::PointPosition { point, previous } => {
                    if let Some(target) = self.points.get_mut(point.0) {
                        *target = previous;
                    }
                }
                JournalEntry::RegionVertices { region, previous } => {
                    if let Some(target) = self.regions.get_mut(region.0) {
                        target.vertices = previous;
                    }
                }
            }
        }

        self.regions.truncate(regions_mark);
        self.edges.truncate(edges_mark);
        self.points.truncate(points_mark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec3;
    use crate::scene::{ObjectKind, RigidObject};

    #[test]
    fn rollback_restores_moves_in_reverse() {
        let mut scene = Scene::new();
        let p = scene.add_point(Point3::ORIGIN);
        let before = scene.clone();

        let mut journal = Journal::begin(&scene);
        scene.move_point(p, Point3::new(1.0, 0.0, 0.0), &mut journal).unwrap();
        scene.move_point(p, Point3::new(2.0, 0.0, 0.0), &mut journal).unwrap();
        assert_eq!(journal.len(), 2);

        scene.rollback(journal);
        assert_eq!(scene, before);
    }

    #[test]
    fn rollback_removes_created_geometry() {
        let mut scene = Scene::new();
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let ids = square.map(|p| scene.add_point(p));
        let region = scene.add_region(ids.to_vec()).unwrap();
        let object = scene.add_object(RigidObject::component("box", Transform::identity()));
        let before = scene.clone();

        let mut journal = Journal::begin(&scene);
        scene.push_pull(region, 2.0, true, &mut journal).unwrap();
        scene
            .set_object_transform(object, Transform::translate(Vec3::X), &mut journal)
            .unwrap();
        assert!(scene.points().len() > before.points().len());

        scene.rollback(journal);
        assert_eq!(scene, before);
        assert_eq!(scene.object(object).unwrap().kind, ObjectKind::Component);
    }
}
