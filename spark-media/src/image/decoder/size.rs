use crate::Image;

impl Image {
    pub fn get_width(&self) -> u32 {
        self.inner.width()
    }

    pub fn get_height(&self) -> u32 {
        self.inner.height()
    }

    /// `(width, height)`
    pub fn get_size(&self) -> (u32, u32) {
        self.inner.dimensions()
    }
}
