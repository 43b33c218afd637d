#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RGBA(pub u8, pub u8, pub u8, pub u8);

impl RGBA {
    pub const TRANSPARENT: RGBA = RGBA(0, 0, 0, 0);

    pub fn to_array(self) -> [u8; 4] {
        [self.0, self.1, self.2, self.3]
    }
}

impl From<RGBA> for ::image::Rgba<u8> {
    fn from(value: RGBA) -> Self {
        ::image::Rgba(value.to_array())
    }
}

impl From<[u8; 4]> for RGBA {
    fn from(value: [u8; 4]) -> Self {
        RGBA(value[0], value[1], value[2], value[3])
    }
}
