//! 移入与滑入过渡

use serde::{Deserialize, Serialize};

use crate::action::{Action, EasingFunction};
use crate::director::StageContext;
use crate::math::{Size, Vec2};

use super::{SceneOrder, TransitionScenes, TransitionStyle};

/// 入场场景进入的方向（从哪一侧进入）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    /// 单位方向：入场起点相对原点的方向
    fn direction(self) -> Vec2 {
        match self {
            Edge::Left => Vec2::new(-1.0, 0.0),
            Edge::Right => Vec2::new(1.0, 0.0),
            Edge::Top => Vec2::new(0.0, 1.0),
            Edge::Bottom => Vec2::new(0.0, -1.0),
        }
    }

    /// 起点偏移：沿该方向移出 `extent` 减去 `adjust`
    fn offset(self, viewport: Size, adjust: f32) -> Vec2 {
        let dir = self.direction();
        Vec2::new(
            dir.x * (viewport.width - adjust),
            dir.y * (viewport.height - adjust),
        )
    }
}

/// 入场场景从屏幕外移到原点，离场场景不动
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveIn {
    pub edge: Edge,
    pub ease_rate: f32,
}

impl MoveIn {
    pub fn new(edge: Edge) -> Self {
        Self {
            edge,
            ease_rate: 2.0,
        }
    }
}

impl TransitionStyle for MoveIn {
    fn name(&self) -> &'static str {
        match self.edge {
            Edge::Left => "move_in_l",
            Edge::Right => "move_in_r",
            Edge::Top => "move_in_t",
            Edge::Bottom => "move_in_b",
        }
    }

    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        if let Some(node) = ctx.graph.get_mut(scenes.incoming) {
            node.position = self.edge.offset(ctx.viewport, 0.0);
        }
        let action = Action::sequence(vec![
            Action::ease(
                EasingFunction::EaseOut(self.ease_rate),
                Action::move_to(scenes.duration, Vec2::zero()),
            ),
            Action::call(scenes.finish_signal()),
        ]);
        ctx.run_action(scenes.incoming, action);
    }
}

/// 两个场景同步平移，入场把离场推出屏幕
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideIn {
    pub edge: Edge,
    /// 位移修正，消除两张全屏图像之间的接缝
    pub adjust: f32,
    pub ease_rate: f32,
}

impl SlideIn {
    pub fn new(edge: Edge) -> Self {
        Self {
            edge,
            adjust: 0.5,
            ease_rate: 2.0,
        }
    }

    fn slide_action(&self, duration: f32, delta: Vec2) -> Action {
        Action::ease(
            EasingFunction::EaseOut(self.ease_rate),
            Action::move_by(duration, delta),
        )
    }
}

impl TransitionStyle for SlideIn {
    fn name(&self) -> &'static str {
        match self.edge {
            Edge::Left => "slide_in_l",
            Edge::Right => "slide_in_r",
            Edge::Top => "slide_in_t",
            Edge::Bottom => "slide_in_b",
        }
    }

    fn scene_order(&self) -> SceneOrder {
        match self.edge {
            Edge::Left | Edge::Top => SceneOrder::OutgoingOnTop,
            Edge::Right | Edge::Bottom => SceneOrder::IncomingOnTop,
        }
    }

    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        let start = self.edge.offset(ctx.viewport, self.adjust);
        if let Some(node) = ctx.graph.get_mut(scenes.incoming) {
            node.position = start;
        }

        let delta = -start;
        let in_action = self.slide_action(scenes.duration, delta);
        let out_action = Action::sequence(vec![
            self.slide_action(scenes.duration, delta),
            Action::call(scenes.finish_signal()),
        ]);

        ctx.run_action(scenes.incoming, in_action);
        ctx.run_action(scenes.outgoing, out_action);
    }
}
