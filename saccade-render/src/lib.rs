pub mod figure;
pub mod render;

pub use figure::{Figure, Panel, PlotConfig, Series};
pub use render::{FigureRenderer, Scale, SkiaRenderer, panel_areas, save_png, segments};
