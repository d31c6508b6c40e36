pub mod camera;
pub mod candles;
pub mod common;
pub mod event;
pub mod geom_query;
pub mod hud;
pub mod input;
pub mod interact;
pub mod model;
pub mod operator;
pub mod renderer;
pub mod rig;
pub mod scene;
pub mod schedule;
mod shaders;
pub mod sparkle;
mod viewer;
pub mod winit_support;

pub use camera::Camera;
pub use candles::CandleSet;
pub use model::SceneConfig;
pub use scene::Scene;
pub use viewer::Viewer;
