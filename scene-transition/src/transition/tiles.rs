//! 瓦片类过渡：熄灭瓦片、分割、方向淡出
//!
//! 网格尺寸固定行数，列数按视口宽高比推算；网格在动作序列末尾由 `StopGrid` 释放。

use crate::action::{Action, EasingFunction, GridEffect, TileFadeDirection};
use crate::director::StageContext;
use crate::graph::GridSize;

use super::{SceneOrder, TransitionScenes, TransitionStyle};

/// 当前视口下的网格尺寸
fn viewport_grid(ctx: &StageContext<'_>) -> GridSize {
    GridSize::for_viewport(ctx.viewport, ctx.config.grid_rows)
}

/// 离场场景的瓦片按随机顺序熄灭
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnOffTiles {
    pub seed: u64,
}

impl TransitionStyle for TurnOffTiles {
    fn name(&self) -> &'static str {
        "turn_off_tiles"
    }

    fn scene_order(&self) -> SceneOrder {
        SceneOrder::OutgoingOnTop
    }

    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        let effect = GridEffect::TurnOffTiles {
            grid: viewport_grid(ctx),
            seed: self.seed,
        };
        let action = Action::sequence(vec![
            Action::grid(scenes.duration, effect),
            Action::call(scenes.finish_signal()),
            Action::StopGrid,
        ]);
        ctx.run_action(scenes.outgoing, action);
    }
}

/// 分割方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAxis {
    Cols,
    Rows,
}

/// 整个过渡分割成列或行滑开，中点换场后再合拢
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub axis: SplitAxis,
    pub segments: u32,
    pub ease_rate: f32,
}

impl Split {
    pub fn new(axis: SplitAxis) -> Self {
        Self {
            axis,
            segments: 3,
            ease_rate: 3.0,
        }
    }

    fn effect(&self) -> GridEffect {
        match self.axis {
            SplitAxis::Cols => GridEffect::SplitCols {
                cols: self.segments,
            },
            SplitAxis::Rows => GridEffect::SplitRows {
                rows: self.segments,
            },
        }
    }
}

impl TransitionStyle for Split {
    fn name(&self) -> &'static str {
        match self.axis {
            SplitAxis::Cols => "split_cols",
            SplitAxis::Rows => "split_rows",
        }
    }

    fn scene_order(&self) -> SceneOrder {
        SceneOrder::OutgoingOnTop
    }

    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        ctx.graph.set_visible(scenes.incoming, false);

        let split = Action::grid(scenes.duration / 2.0, self.effect());
        let action = Action::sequence(vec![
            Action::ease(
                EasingFunction::EaseInOut(self.ease_rate),
                Action::sequence(vec![
                    split.clone(),
                    Action::call(scenes.hide_out_show_in_signal()),
                    split.reverse(),
                ]),
            ),
            Action::call(scenes.finish_signal()),
            Action::StopGrid,
        ]);
        ctx.run_action(scenes.root, action);
    }
}

/// 离场场景的瓦片沿方向逐块缩小消失
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileFade {
    pub direction: TileFadeDirection,
}

impl TileFade {
    pub fn new(direction: TileFadeDirection) -> Self {
        Self { direction }
    }
}

impl TransitionStyle for TileFade {
    fn name(&self) -> &'static str {
        match self.direction {
            TileFadeDirection::TopRight => "fade_tr",
            TileFadeDirection::BottomLeft => "fade_bl",
            TileFadeDirection::Up => "fade_up",
            TileFadeDirection::Down => "fade_down",
        }
    }

    fn scene_order(&self) -> SceneOrder {
        SceneOrder::OutgoingOnTop
    }

    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        let effect = GridEffect::FadeOutTiles {
            grid: viewport_grid(ctx),
            direction: self.direction,
        };
        let action = Action::sequence(vec![
            Action::grid(scenes.duration, effect),
            Action::call(scenes.finish_signal()),
            Action::StopGrid,
        ]);
        ctx.run_action(scenes.outgoing, action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_effect() {
        let split = Split::new(SplitAxis::Rows);
        assert_eq!(split.effect(), GridEffect::SplitRows { rows: 3 });
        assert_eq!(split.effect().grid_size(), GridSize::new(1, 3));
        assert_eq!(split.name(), "split_rows");
    }

    #[test]
    fn test_tile_fade_names() {
        assert_eq!(TileFade::new(TileFadeDirection::TopRight).name(), "fade_tr");
        assert_eq!(TileFade::new(TileFadeDirection::Down).name(), "fade_down");
    }
}
