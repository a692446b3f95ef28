//! 颜色淡化过渡：纯色覆盖层淡入，中点换场，再淡出

use tracing::trace;

use crate::action::Action;
use crate::director::StageContext;
use crate::graph::NodeKind;
use crate::math::Color3;

use super::{TransitionScenes, TransitionStyle};

/// 覆盖层在过渡根节点下的 tag
pub const FADE_LAYER_TAG: i32 = 0x0FAD_EFAD;

/// 覆盖层的 z 序
const OVERLAY_Z: i32 = 2;

/// 颜色淡化
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub color: Color3,
}

impl Fade {
    pub fn new(color: Color3) -> Self {
        Self { color }
    }
}

impl TransitionStyle for Fade {
    fn name(&self) -> &'static str {
        "fade"
    }

    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        let layer = ctx.graph.create_node(NodeKind::ColorLayer { color: self.color });
        if let Some(node) = ctx.graph.get_mut(layer) {
            node.opacity = 0;
        }
        ctx.graph.set_visible(scenes.incoming, false);
        ctx.graph
            .add_child(scenes.root, layer, OVERLAY_Z, Some(FADE_LAYER_TAG));

        let half = scenes.duration / 2.0;
        let action = Action::sequence(vec![
            Action::fade_in(half),
            Action::call(scenes.hide_out_show_in_signal()),
            Action::fade_out(half),
            Action::call(scenes.finish_signal()),
        ]);
        ctx.run_action(layer, action);
    }

    fn on_exit(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        if let Some(layer) = ctx.graph.child_by_tag(scenes.root, FADE_LAYER_TAG) {
            trace!(layer = %layer, "Removing fade overlay");
            ctx.release_node(layer);
        }
    }
}
