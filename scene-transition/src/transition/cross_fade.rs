//! 交叉淡化过渡
//!
//! 入场时把两个场景各渲染进一张离屏图像：入场图像以加色混合作为底图，
//! 离场图像以 alpha 混合叠在上方并从 255 淡到 0。过渡期间两个场景本身不再绘制。

use tracing::warn;

use crate::action::Action;
use crate::director::StageContext;
use crate::graph::{NodeId, NodeKind};
use crate::render::{BlendMode, OffscreenPair};

use super::{FADE_LAYER_TAG, TransitionScenes, TransitionStyle};

const LAYER_Z: i32 = 2;

/// 交叉淡化
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CrossFade {
    pair: Option<OffscreenPair>,
    layer: Option<NodeId>,
}

impl CrossFade {
    pub fn new() -> Self {
        Self::default()
    }

    fn release_targets(&mut self, ctx: &mut StageContext<'_>) {
        if let Some(pair) = self.pair.take() {
            pair.release(ctx.compositor);
        }
    }
}

impl TransitionStyle for CrossFade {
    fn name(&self) -> &'static str {
        "cross_fade"
    }

    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        let pair = match OffscreenPair::capture(
            ctx.graph,
            ctx.compositor,
            ctx.viewport,
            scenes.incoming,
            scenes.outgoing,
        ) {
            Ok(pair) => pair,
            Err(e) => {
                // 退化为直接切换
                warn!(error = %e, "Cross fade render targets unavailable, cutting instead");
                ctx.run_action(
                    scenes.root,
                    Action::sequence(vec![
                        Action::call(scenes.hide_out_show_in_signal()),
                        Action::call(scenes.finish_signal()),
                    ]),
                );
                return;
            }
        };

        let layer = ctx.graph.create_node(NodeKind::Layer);
        let in_sprite = ctx.graph.create_node(NodeKind::Image {
            target: pair.incoming,
            blend: BlendMode::Additive,
        });
        let out_sprite = ctx.graph.create_node(NodeKind::Image {
            target: pair.outgoing,
            blend: BlendMode::Alpha,
        });
        ctx.graph.add_child(layer, in_sprite, 0, None);
        ctx.graph.add_child(layer, out_sprite, 1, None);
        ctx.graph
            .add_child(scenes.root, layer, LAYER_Z, Some(FADE_LAYER_TAG));

        let action = Action::sequence(vec![
            Action::fade_to(scenes.duration, 0),
            Action::call(scenes.hide_out_show_in_signal()),
            Action::call(scenes.finish_signal()),
        ]);
        ctx.run_action(out_sprite, action);

        self.pair = Some(pair);
        self.layer = Some(layer);
    }

    fn on_exit(&mut self, _scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        if let Some(layer) = self.layer.take() {
            ctx.release_node(layer);
        }
        self.release_targets(ctx);
    }

    fn release(&mut self, _scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        if let Some(layer) = self.layer.take() {
            ctx.release_node(layer);
        }
        self.release_targets(ctx);
    }

    fn draws_scenes(&self) -> bool {
        self.pair.is_none()
    }
}
