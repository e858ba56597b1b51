//! Frame statistics

use crate::render::DrawMode;

/// Counters reset at the start of every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Frames rendered so far (not reset)
    pub frame: u64,
    /// Draw calls issued
    pub calls: u64,
    /// Vertices submitted (count × instances)
    pub vertices: u64,
    /// Triangles drawn
    pub faces: u64,
    /// Line segments drawn
    pub lines: u64,
    /// Points drawn
    pub points: u64,
}

/// Resource counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryStats {
    /// Geometries known to the registry
    pub geometries: usize,
    /// Linked programs
    pub programs: usize,
}

/// Statistics exposed by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderInfo {
    /// Per-frame draw counters
    pub render: RenderStats,
    /// Resource counters
    pub memory: MemoryStats,
}

impl RenderInfo {
    /// Count a new frame and reset the draw counters
    pub fn begin_frame(&mut self) {
        self.render.frame += 1;
        self.render.calls = 0;
        self.render.vertices = 0;
        self.render.faces = 0;
        self.render.lines = 0;
        self.render.points = 0;
    }

    /// Account for one draw call
    pub fn record_draw(&mut self, mode: DrawMode, count: u32, instances: u32) {
        let count = u64::from(count);
        let instances = u64::from(instances.max(1));
        let stats = &mut self.render;
        stats.calls += 1;
        stats.vertices += count * instances;
        match mode {
            DrawMode::Triangles => stats.faces += instances * (count / 3),
            DrawMode::TriangleStrip | DrawMode::TriangleFan => {
                stats.faces += instances * count.saturating_sub(2);
            }
            DrawMode::Lines => stats.lines += instances * (count / 2),
            DrawMode::LineStrip => stats.lines += instances * count.saturating_sub(1),
            DrawMode::LineLoop => stats.lines += instances * count,
            DrawMode::Points => stats.points += instances * count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_draw_by_mode() {
        let mut info = RenderInfo::default();
        info.record_draw(DrawMode::Triangles, 36, 1);
        info.record_draw(DrawMode::Lines, 12, 1);
        info.record_draw(DrawMode::TriangleStrip, 6, 2);
        info.record_draw(DrawMode::Points, 5, 0);
        assert_eq!(info.render.calls, 4);
        assert_eq!(info.render.faces, 12 + 8);
        assert_eq!(info.render.lines, 6);
        assert_eq!(info.render.points, 5);
        assert_eq!(info.render.vertices, 36 + 12 + 12 + 5);
    }

    #[test]
    fn test_begin_frame_resets_counters() {
        let mut info = RenderInfo::default();
        info.record_draw(DrawMode::Triangles, 3, 1);
        info.begin_frame();
        assert_eq!(info.render.frame, 1);
        assert_eq!(info.render.calls, 0);
        assert_eq!(info.render.faces, 0);
    }
}
