//! 缩放类过渡：旋转缩放、跳跃缩放、收缩放大

use crate::action::{Action, EasingFunction};
use crate::director::StageContext;
use crate::graph::NodeId;
use crate::math::Vec2;

use super::{TransitionScenes, TransitionStyle};

fn set_scale_and_anchor(ctx: &mut StageContext<'_>, id: NodeId, scale: f32, anchor: Vec2) {
    if let Some(node) = ctx.graph.get_mut(id) {
        node.set_scale(scale);
        node.anchor = anchor;
    }
}

/// 离场旋转两周缩小，入场按相反过程放大
#[derive(Debug, Clone, Copy, Default)]
pub struct RotoZoom;

impl RotoZoom {
    /// 离场场景的动作
    pub fn outgoing_action(duration: f32) -> Action {
        let half = duration / 2.0;
        Action::sequence(vec![
            Action::spawn(vec![
                Action::scale_by(half, 0.001),
                Action::rotate_by(half, 360.0 * 2.0),
            ]),
            Action::delay(half),
        ])
    }
}

impl TransitionStyle for RotoZoom {
    fn name(&self) -> &'static str {
        "roto_zoom"
    }

    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        let center = Vec2::new(0.5, 0.5);
        set_scale_and_anchor(ctx, scenes.incoming, 0.001, center);
        set_scale_and_anchor(ctx, scenes.outgoing, 1.0, center);

        let rotozoom = Self::outgoing_action(scenes.duration);
        let incoming = Action::sequence(vec![
            rotozoom.reverse(),
            Action::call(scenes.finish_signal()),
        ]);

        ctx.run_action(scenes.outgoing, rotozoom);
        ctx.run_action(scenes.incoming, incoming);
    }
}

/// 离场缩小后跳出，入场跳入后放大
#[derive(Debug, Clone, Copy, Default)]
pub struct JumpZoom;

impl TransitionStyle for JumpZoom {
    fn name(&self) -> &'static str {
        "jump_zoom"
    }

    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        let width = ctx.viewport.width;
        let d = scenes.duration;
        let center = Vec2::new(0.5, 0.5);

        set_scale_and_anchor(ctx, scenes.incoming, 0.5, center);
        if let Some(node) = ctx.graph.get_mut(scenes.incoming) {
            node.position = Vec2::new(width, 0.0);
        }
        set_scale_and_anchor(ctx, scenes.outgoing, 1.0, center);

        let jump = Action::jump_by(d / 4.0, Vec2::new(-width, 0.0), width / 4.0, 2);
        let out_action = Action::sequence(vec![Action::scale_to(d / 4.0, 0.5), jump.clone()]);
        let in_action = Action::sequence(vec![
            Action::delay(d / 2.0),
            jump,
            Action::scale_to(d / 4.0, 1.0),
            Action::call(scenes.finish_signal()),
        ]);

        ctx.run_action(scenes.outgoing, out_action);
        ctx.run_action(scenes.incoming, in_action);
    }
}

/// 离场收缩，入场从极小放大
#[derive(Debug, Clone, Copy)]
pub struct ShrinkGrow {
    pub ease_rate: f32,
}

impl Default for ShrinkGrow {
    fn default() -> Self {
        Self { ease_rate: 2.0 }
    }
}

impl TransitionStyle for ShrinkGrow {
    fn name(&self) -> &'static str {
        "shrink_grow"
    }

    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        let d = scenes.duration;
        set_scale_and_anchor(ctx, scenes.incoming, 0.001, Vec2::new(2.0 / 3.0, 0.5));
        set_scale_and_anchor(ctx, scenes.outgoing, 1.0, Vec2::new(1.0 / 3.0, 0.5));

        let ease = EasingFunction::EaseOut(self.ease_rate);
        let in_action = Action::ease(ease, Action::scale_to(d, 1.0));
        let out_action = Action::sequence(vec![
            Action::ease(ease, Action::scale_to(d, 0.01)),
            Action::call(scenes.finish_signal()),
        ]);

        ctx.run_action(scenes.incoming, in_action);
        ctx.run_action(scenes.outgoing, out_action);
    }
}
