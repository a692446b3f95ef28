//! # Grid 模块
//!
//! 瓦片网格效果：熄灭瓦片、分割列/行、按方向淡出瓦片。
//! 每个效果把归一化时间映射为网格上每块瓦片的状态。

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::graph::{GridSize, TileGrid};
use crate::math::{Size, Vec2};

/// 瓦片淡出方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileFadeDirection {
    /// 朝右上推进
    TopRight,
    /// 朝左下推进
    BottomLeft,
    Up,
    Down,
}

/// 网格效果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridEffect {
    /// 按随机顺序逐块熄灭
    TurnOffTiles { grid: GridSize, seed: u64 },
    /// 奇偶列朝相反方向纵向滑出
    SplitCols { cols: u32 },
    /// 奇偶行朝相反方向横向滑出
    SplitRows { rows: u32 },
    /// 按方向逐块缩小直至消失
    FadeOutTiles {
        grid: GridSize,
        direction: TileFadeDirection,
    },
}

impl GridEffect {
    /// 效果所需的网格尺寸
    pub fn grid_size(&self) -> GridSize {
        match *self {
            GridEffect::TurnOffTiles { grid, .. } | GridEffect::FadeOutTiles { grid, .. } => grid,
            GridEffect::SplitCols { cols } => GridSize::new(cols.max(1), 1),
            GridEffect::SplitRows { rows } => GridSize::new(1, rows.max(1)),
        }
    }

    /// 熄灭顺序（仅 `TurnOffTiles` 使用，其余为空）
    pub(crate) fn tile_order(&self) -> Vec<usize> {
        match *self {
            GridEffect::TurnOffTiles { grid, seed } => {
                let mut order: Vec<usize> = (0..grid.tile_count()).collect();
                let mut rng = StdRng::seed_from_u64(seed);
                order.shuffle(&mut rng);
                order
            }
            _ => Vec::new(),
        }
    }

    /// 把时间 `t` 应用到网格
    pub(crate) fn apply(&self, t: f32, grid: &mut TileGrid, viewport: Size, order: &[usize]) {
        match *self {
            GridEffect::TurnOffTiles { .. } => {
                let off = (t * order.len() as f32) as usize;
                for (i, &index) in order.iter().enumerate() {
                    if let Some(tile) = grid.tile_at_mut(index) {
                        if i < off {
                            tile.turn_off();
                        } else {
                            tile.turn_on();
                        }
                    }
                }
            }
            GridEffect::SplitCols { cols } => {
                for col in 0..cols.max(1) {
                    let direction = if col % 2 == 0 { -1.0 } else { 1.0 };
                    if let Some(tile) = grid.tile_mut(col, 0) {
                        tile.offset = Vec2::new(0.0, direction * viewport.height * t);
                    }
                }
            }
            GridEffect::SplitRows { rows } => {
                for row in 0..rows.max(1) {
                    let direction = if row % 2 == 0 { -1.0 } else { 1.0 };
                    if let Some(tile) = grid.tile_mut(0, row) {
                        tile.offset = Vec2::new(direction * viewport.width * t, 0.0);
                    }
                }
            }
            GridEffect::FadeOutTiles { grid: size, direction } => {
                for col in 0..size.cols {
                    for row in 0..size.rows {
                        let distance = fade_distance(direction, size, col, row, t);
                        let Some(tile) = grid.tile_mut(col, row) else {
                            continue;
                        };
                        if distance == 0.0 {
                            tile.turn_off();
                        } else if distance < 1.0 {
                            tile.visible = true;
                            tile.scale = distance;
                        } else {
                            tile.turn_on();
                        }
                    }
                }
            }
        }
    }
}

/// 瓦片的剩余比例：0 熄灭，1 以上完整显示
fn fade_distance(direction: TileFadeDirection, size: GridSize, col: u32, row: u32, t: f32) -> f32 {
    let (x, y) = (col as f32, row as f32);
    match direction {
        TileFadeDirection::TopRight => {
            let n = (size.cols as f32 + size.rows as f32) * t;
            if n == 0.0 {
                return 1.0;
            }
            ((x + y) / n).powi(6)
        }
        TileFadeDirection::BottomLeft => {
            let n = (size.cols as f32 + size.rows as f32) * (1.0 - t);
            if x + y == 0.0 {
                return 1.0;
            }
            (n / (x + y)).powi(6)
        }
        TileFadeDirection::Up => {
            let n = size.rows as f32 * t;
            if n == 0.0 {
                return 1.0;
            }
            (y / n).powi(6)
        }
        TileFadeDirection::Down => {
            let n = size.rows as f32 * (1.0 - t);
            if y == 0.0 {
                return 1.0;
            }
            (n / y).powi(6)
        }
    }
}
