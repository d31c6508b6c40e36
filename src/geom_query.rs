mod pick_query;
mod ray_picking;

pub use pick_query::{pick_all, pick_from_roots, PickQuery};
pub use ray_picking::{pick_all_from_ray, pick_roots_from_ray, RayPickQuery, RayPickResult};
