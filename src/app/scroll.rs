/// Turns viewport measurements into the "near the bottom" signal that asks for the next page.
/// Units are whatever the view measures in (rows here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollProximity {
    reload_distance: usize,
}

impl ScrollProximity {
    pub fn new(reload_distance: usize) -> Self {
        Self { reload_distance }
    }

    /// True once the bottom edge of the viewport is within `reload_distance` of the content end.
    /// An empty list is never "near the bottom": the first page is requested by `start()`.
    pub fn is_near_bottom(&self, offset: usize, viewport: usize, content: usize) -> bool {
        if content == 0 {
            return false;
        }
        offset + viewport + self.reload_distance >= content
    }
}

/// Console viewport: a window of `height` rows over the rendered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub offset: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            offset: 0,
            height: height.max(1),
        }
    }

    /// Moves one screen down, never past the last row.
    pub fn scroll_down(&mut self, content: usize) {
        let max_offset = content.saturating_sub(self.height);
        self.offset = (self.offset + self.height).min(max_offset);
    }

    pub fn visible(&self, content: usize) -> std::ops::Range<usize> {
        let start = self.offset.min(content);
        let end = (self.offset + self.height).min(content);
        start..end
    }
}
