pub mod event;
pub mod movement;
pub mod normalize;
pub mod scene;
pub mod turn;
pub mod world;
