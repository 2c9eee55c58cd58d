pub mod evaluator;
pub mod renderer;
pub mod surface;
pub mod svg;
