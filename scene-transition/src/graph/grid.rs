//! # Grid 模块
//!
//! 瓦片网格状态。网格动作把节点切分为若干瓦片并逐块变换，
//! 网格本身是节点上的离屏资源，必须由 `StopGrid` 或过渡销毁显式释放。

use serde::{Deserialize, Serialize};

use crate::math::{Size, Vec2};

/// 网格尺寸（列 × 行）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub cols: u32,
    pub rows: u32,
}

impl GridSize {
    /// 单个方向上的瓦片数上限
    pub const MAX_TILES_PER_AXIS: u32 = 256;

    pub const fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    /// 固定行数，列数按视口宽高比取整
    ///
    /// 两个方向都限制在 `1..=MAX_TILES_PER_AXIS`。
    pub fn for_viewport(viewport: Size, rows: u32) -> Self {
        let max = Self::MAX_TILES_PER_AXIS;
        let rows = rows.clamp(1, max);
        let cols = (rows as f32 * viewport.aspect())
            .round()
            .clamp(1.0, max as f32) as u32;
        Self { cols, rows }
    }

    /// 瓦片总数
    pub fn tile_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// 单个瓦片
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub col: u32,
    pub row: u32,
    /// 相对原位置的偏移
    pub offset: Vec2,
    /// 以瓦片中心为锚点的缩放
    pub scale: f32,
    pub visible: bool,
}

impl Tile {
    fn new(col: u32, row: u32) -> Self {
        Self {
            col,
            row,
            offset: Vec2::zero(),
            scale: 1.0,
            visible: true,
        }
    }

    /// 恢复原状
    pub fn turn_on(&mut self) {
        self.offset = Vec2::zero();
        self.scale = 1.0;
        self.visible = true;
    }

    pub fn turn_off(&mut self) {
        self.visible = false;
    }
}

/// 瓦片网格
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    size: GridSize,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// 创建网格，瓦片按列优先排列
    pub fn new(size: GridSize) -> Self {
        let mut tiles = Vec::with_capacity(size.tile_count());
        for col in 0..size.cols {
            for row in 0..size.rows {
                tiles.push(Tile::new(col, row));
            }
        }
        Self { size, tiles }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    fn index(&self, col: u32, row: u32) -> Option<usize> {
        (col < self.size.cols && row < self.size.rows)
            .then(|| col as usize * self.size.rows as usize + row as usize)
    }

    pub fn tile(&self, col: u32, row: u32) -> Option<&Tile> {
        self.index(col, row).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, col: u32, row: u32) -> Option<&mut Tile> {
        self.index(col, row).map(move |i| &mut self.tiles[i])
    }

    /// 按线性下标访问（列优先）
    pub fn tile_at_mut(&mut self, index: usize) -> Option<&mut Tile> {
        self.tiles.get_mut(index)
    }

    /// 不可见瓦片数量
    pub fn hidden_count(&self) -> usize {
        self.tiles.iter().filter(|t| !t.visible).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_for_viewport() {
        // 16:9 → 12 * 1.777 = 21.33 → 21
        let size = GridSize::for_viewport(Size::new(1920.0, 1080.0), 12);
        assert_eq!(size, GridSize::new(21, 12));

        // 4:3 → 16
        let size = GridSize::for_viewport(Size::new(1024.0, 768.0), 12);
        assert_eq!(size, GridSize::new(16, 12));

        // 极窄视口至少 1 列
        let size = GridSize::for_viewport(Size::new(1.0, 1000.0), 12);
        assert_eq!(size.cols, 1);
    }

    #[test]
    fn test_grid_size_is_capped() {
        let max = GridSize::MAX_TILES_PER_AXIS;
        let size = GridSize::for_viewport(Size::new(1.0e9, 1.0), 12);
        assert_eq!(size, GridSize::new(max, 12));

        let size = GridSize::for_viewport(Size::new(f32::INFINITY, 720.0), u32::MAX);
        assert_eq!(size, GridSize::new(max, max));
        assert_eq!(size.tile_count(), (max * max) as usize);
    }

    #[test]
    fn test_tile_lookup() {
        let mut grid = TileGrid::new(GridSize::new(3, 2));
        assert_eq!(grid.tiles().len(), 6);
        assert!(grid.tile(3, 0).is_none());

        grid.tile_mut(2, 1).unwrap().turn_off();
        assert_eq!(grid.hidden_count(), 1);
        assert!(!grid.tile(2, 1).unwrap().visible);

        grid.tile_mut(2, 1).unwrap().turn_on();
        assert_eq!(grid.hidden_count(), 0);
    }
}
