//! The model the tools operate on: rigid objects with their own transform,
//! and a shared point network from which edges and face regions are built.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::{BBox, Point3, Transform, Vec3};

mod journal;

pub use journal::{Journal, JournalEntry};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            #[must_use]
            pub const fn new(id: usize) -> Self {
                Self(id)
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self::new(value)
            }
        }
    };
}

entity_id!(
    /// Index into [`Scene::objects`].
    ObjectId
);
entity_id!(
    /// Index into [`Scene::regions`].
    RegionId
);
entity_id!(EdgeId);
entity_id!(PointId);

/// Handle to anything a batch can change.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    Object(ObjectId),
    Region(RegionId),
    Edge(EdgeId),
    Point(PointId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(id) => write!(f, "object #{}", id.0),
            Self::Region(id) => write!(f, "face #{}", id.0),
            Self::Edge(id) => write!(f, "edge #{}", id.0),
            Self::Point(id) => write!(f, "vertex #{}", id.0),
        }
    }
}

impl From<ObjectId> for EntityRef {
    fn from(id: ObjectId) -> Self {
        Self::Object(id)
    }
}

impl From<RegionId> for EntityRef {
    fn from(id: RegionId) -> Self {
        Self::Region(id)
    }
}

impl From<EdgeId> for EntityRef {
    fn from(id: EdgeId) -> Self {
        Self::Edge(id)
    }
}

impl From<PointId> for EntityRef {
    fn from(id: PointId) -> Self {
        Self::Point(id)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("{0} does not exist")]
    UnknownEntity(EntityRef),
    #[error("a face needs at least 3 vertices, got {count}")]
    TooFewVertices { count: usize },
    #[error("face #{} has no area", .region.0)]
    DegenerateRegion { region: RegionId },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Instance of a named definition; placed by its transform origin.
    #[default]
    Component,
    /// Anonymous collection; placed by the centre of its bounds.
    Group,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidObject {
    /// Definition name for components, group name otherwise.
    pub name: String,
    #[serde(default)]
    pub kind: ObjectKind,
    #[serde(default)]
    pub transform: Transform,
    /// Bounds in the object's own axes.
    #[serde(default)]
    pub local_bounds: Option<BBox>,
}

impl RigidObject {
    #[must_use]
    pub fn component(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Component,
            transform,
            local_bounds: None,
        }
    }

    #[must_use]
    pub fn group(name: impl Into<String>, transform: Transform, local_bounds: BBox) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Group,
            transform,
            local_bounds: Some(local_bounds),
        }
    }

    #[must_use]
    pub const fn with_bounds(mut self, local_bounds: BBox) -> Self {
        self.local_bounds = Some(local_bounds);
        self
    }

    #[must_use]
    pub fn world_bounds(&self) -> BBox {
        self.local_bounds.map_or_else(
            || BBox::from_point(self.transform.origin()),
            |bounds| bounds.transform(self.transform),
        )
    }

    #[must_use]
    pub fn representative_point(&self) -> Point3 {
        match self.kind {
            ObjectKind::Component => self.transform.origin(),
            ObjectKind::Group => self.world_bounds().center(),
        }
    }
}

/// Closed planar polygon over shared points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub vertices: Vec<PointId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub start: PointId,
    pub end: PointId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    points: Vec<Point3>,
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default)]
    regions: Vec<Region>,
    #[serde(default)]
    objects: Vec<RigidObject>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, position: Point3) -> PointId {
        self.points.push(position);
        PointId::new(self.points.len() - 1)
    }

    pub fn add_edge(&mut self, start: PointId, end: PointId) -> Result<EdgeId, SceneError> {
        self.point(start)?;
        self.point(end)?;
        self.edges.push(Edge { start, end });
        Ok(EdgeId::new(self.edges.len() - 1))
    }

    pub fn add_region(&mut self, vertices: Vec<PointId>) -> Result<RegionId, SceneError> {
        if vertices.len() < 3 {
            return Err(SceneError::TooFewVertices {
                count: vertices.len(),
            });
        }
        for id in &vertices {
            self.point(*id)?;
        }
        self.regions.push(Region { vertices });
        Ok(RegionId::new(self.regions.len() - 1))
    }

    pub fn add_object(&mut self, object: RigidObject) -> ObjectId {
        self.objects.push(object);
        ObjectId::new(self.objects.len() - 1)
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[must_use]
    pub fn objects(&self) -> &[RigidObject] {
        &self.objects
    }

    pub fn point(&self, id: PointId) -> Result<Point3, SceneError> {
        self.points
            .get(id.0)
            .copied()
            .ok_or(SceneError::UnknownEntity(EntityRef::Point(id)))
    }

    pub fn edge(&self, id: EdgeId) -> Result<Edge, SceneError> {
        self.edges
            .get(id.0)
            .copied()
            .ok_or(SceneError::UnknownEntity(EntityRef::Edge(id)))
    }

    pub fn region(&self, id: RegionId) -> Result<&Region, SceneError> {
        self.regions
            .get(id.0)
            .ok_or(SceneError::UnknownEntity(EntityRef::Region(id)))
    }

    pub fn object(&self, id: ObjectId) -> Result<&RigidObject, SceneError> {
        self.objects
            .get(id.0)
            .ok_or(SceneError::UnknownEntity(EntityRef::Object(id)))
    }

    /// Fails when `entity` does not exist.
    pub fn check(&self, entity: EntityRef) -> Result<(), SceneError> {
        match entity {
            EntityRef::Object(id) => self.object(id).map(|_| ()),
            EntityRef::Region(id) => self.region(id).map(|_| ()),
            EntityRef::Edge(id) => self.edge(id).map(|_| ()),
            EntityRef::Point(id) => self.point(id).map(|_| ()),
        }
    }

    fn region_positions(&self, id: RegionId) -> Result<Vec<Point3>, SceneError> {
        self.region(id)?
            .vertices
            .iter()
            .map(|vertex| self.point(*vertex))
            .collect()
    }

    /// Vertex average of a face.
    pub fn region_centroid(&self, id: RegionId) -> Result<Point3, SceneError> {
        let positions = self.region_positions(id)?;
        Point3::centroid(&positions).ok_or(SceneError::DegenerateRegion { region: id })
    }

    /// Unit normal by Newell's method; counter-clockwise winding faces +normal.
    pub fn region_normal(&self, id: RegionId) -> Result<Vec3, SceneError> {
        let positions = self.region_positions(id)?;
        let mut normal = Vec3::ZERO;
        for (i, current) in positions.iter().enumerate() {
            let next = positions[(i + 1) % positions.len()];
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
        }
        normal
            .normalized()
            .ok_or(SceneError::DegenerateRegion { region: id })
    }

    /// The point a signal is sampled at for `entity`.
    pub fn representative_point(&self, entity: EntityRef) -> Result<Point3, SceneError> {
        match entity {
            EntityRef::Object(id) => Ok(self.object(id)?.representative_point()),
            EntityRef::Region(id) => self.region_centroid(id),
            EntityRef::Edge(id) => {
                let edge = self.edge(id)?;
                let (a, b) = (self.point(edge.start)?, self.point(edge.end)?);
                Ok(a + (b - a) * 0.5)
            }
            EntityRef::Point(id) => self.point(id),
        }
    }

    /// World-space bounds of `entity`.
    pub fn bounds(&self, entity: EntityRef) -> Result<BBox, SceneError> {
        match entity {
            EntityRef::Object(id) => Ok(self.object(id)?.world_bounds()),
            EntityRef::Region(id) => {
                let positions = self.region_positions(id)?;
                BBox::from_points(&positions).ok_or(SceneError::DegenerateRegion { region: id })
            }
            EntityRef::Edge(id) => {
                let edge = self.edge(id)?;
                Ok(BBox::from_point(self.point(edge.start)?).expand_point(self.point(edge.end)?))
            }
            EntityRef::Point(id) => Ok(BBox::from_point(self.point(id)?)),
        }
    }

    /// Points moved when `entity` is displaced. Shared points are listed once.
    pub fn constituent_points(&self, entity: EntityRef) -> Result<Vec<PointId>, SceneError> {
        let ids = match entity {
            EntityRef::Object(_) => Vec::new(),
            EntityRef::Region(id) => self.region(id)?.vertices.clone(),
            EntityRef::Edge(id) => {
                let edge = self.edge(id)?;
                vec![edge.start, edge.end]
            }
            EntityRef::Point(id) => {
                self.point(id)?;
                vec![id]
            }
        };
        Ok(dedup_first_seen(ids))
    }

    /// Unique end points of `edges`, in first-seen order.
    pub fn edge_vertices(&self, edges: &[EdgeId]) -> Result<Vec<PointId>, SceneError> {
        let mut ids = Vec::with_capacity(edges.len() * 2);
        for id in edges {
            let edge = self.edge(*id)?;
            ids.push(edge.start);
            ids.push(edge.end);
        }
        Ok(dedup_first_seen(ids))
    }

    pub fn set_object_transform(
        &mut self,
        id: ObjectId,
        transform: Transform,
        journal: &mut Journal,
    ) -> Result<(), SceneError> {
        let object = self
            .objects
            .get_mut(id.0)
            .ok_or(SceneError::UnknownEntity(EntityRef::Object(id)))?;
        journal.record(JournalEntry::ObjectTransform {
            object: id,
            previous: object.transform,
        });
        object.transform = transform;
        Ok(())
    }

    pub fn move_point(
        &mut self,
        id: PointId,
        position: Point3,
        journal: &mut Journal,
    ) -> Result<(), SceneError> {
        let point = self
            .points
            .get_mut(id.0)
            .ok_or(SceneError::UnknownEntity(EntityRef::Point(id)))?;
        journal.record(JournalEntry::PointPosition {
            point: id,
            previous: *point,
        });
        *point = position;
        Ok(())
    }

    /// Extrude a face along its normal by `distance`.
    ///
    /// Without `create_faces` the face's own points move, dragging every
    /// face that shares them. With it, the face is lifted onto fresh points
    /// and a side quad plus connecting edges join each boundary segment to
    /// its lifted copy; the new side faces are returned.
    pub fn push_pull(
        &mut self,
        id: RegionId,
        distance: f64,
        create_faces: bool,
        journal: &mut Journal,
    ) -> Result<Vec<RegionId>, SceneError> {
        let normal = self.region_normal(id)?;
        if distance == 0.0 {
            return Ok(Vec::new());
        }
        let offset = normal * distance;
        let base = self.region(id)?.vertices.clone();

        if !create_faces {
            for vertex in dedup_first_seen(base) {
                let moved = self.point(vertex)? + offset;
                self.move_point(vertex, moved, journal)?;
            }
            return Ok(Vec::new());
        }

        let mut lifted = Vec::with_capacity(base.len());
        for vertex in &base {
            let position = self.point(*vertex)?;
            lifted.push(self.add_point(position + offset));
        }

        let mut sides = Vec::with_capacity(base.len());
        for i in 0..base.len() {
            let j = (i + 1) % base.len();
            self.add_edge(base[i], lifted[i])?;
            self.add_edge(lifted[i], lifted[j])?;
            sides.push(self.add_region(vec![base[i], base[j], lifted[j], lifted[i]])?);
        }

        let region = self
            .regions
            .get_mut(id.0)
            .ok_or(SceneError::UnknownEntity(EntityRef::Region(id)))?;
        journal.record(JournalEntry::RegionVertices {
            region: id,
            previous: std::mem::replace(&mut region.vertices, lifted),
        });
        Ok(sides)
    }
}

fn dedup_first_seen(ids: Vec<PointId>) -> Vec<PointId> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
