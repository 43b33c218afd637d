pub mod canvas;
pub mod image;
pub mod pixel;

pub use canvas::Canvas;
pub use self::image::image::Image;
pub use pixel::RGBA;
