mod core;
mod frame;

pub use core::{Axis, BBox, Point3, Tolerance, Transform, Vec3};
pub use frame::{BoundingFrame, FrameError};
