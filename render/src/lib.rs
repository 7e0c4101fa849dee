pub mod latex;
pub mod style;
pub mod template;

pub use latex::{RenderError, RenderOptions, render_all, render_element};
pub use style::{LatexStyle, MatrixEnvironment};
