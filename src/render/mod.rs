mod graphics;

pub use graphics::IslandPainter;
