use super::compositor::PixelAccumulator;

/// Output rows owned by one worker: a horizontal band of whole tiles.
#[derive(Debug)]
pub struct BandWriter<'a> {
    image: &'a mut [[f32; 4]],
    final_index: &'a mut [u32],
    width: u32,
    y_start: u32,
}

impl<'a> BandWriter<'a> {
    pub fn new(
        image: &'a mut [[f32; 4]],
        final_index: &'a mut [u32],
        width: u32,
        y_start: u32,
    ) -> Self {
        debug_assert_eq!(image.len(), final_index.len());
        Self {
            image,
            final_index,
            width,
            y_start,
        }
    }

    /// Writes one lane's result. Out-of-bounds lanes write nothing.
    pub fn write(&mut self, lane: &PixelAccumulator, background: [f32; 3]) -> bool {
        if !lane.inside {
            return false;
        }
        let [x, y] = lane.pixel;
        let idx = (y - self.y_start) as usize * self.width as usize + x as usize;
        self.final_index[idx] = lane.final_index;
        self.image[idx] = lane.resolve(background);
        true
    }
}
