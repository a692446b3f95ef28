//! # 过渡风格集成测试
//!
//! 测试各风格的绘制顺序、位移曲线、网格与离屏资源。

use scene_transition::graph::GridSize;
use scene_transition::{
    Director, DrawContent, NodeId, StageConfig, TransitionKind, TransitionRequest,
};

const DT: f32 = 1.0 / 60.0;

struct Stage {
    director: Director,
    outgoing: NodeId,
    incoming: NodeId,
    root: NodeId,
}

impl Stage {
    /// 启动运行循环并让过渡进入舞台
    fn enter(config: StageConfig, request: TransitionRequest) -> Self {
        let mut director = Director::new(config);
        let outgoing = director.create_scene();
        director.run_with_scene(outgoing);
        director.tick(DT);

        let incoming = director.create_scene();
        let root = director.transition_to(&request, incoming).unwrap();
        director.tick(DT);
        Self {
            director,
            outgoing,
            incoming,
            root,
        }
    }

    fn label(&self, id: NodeId) -> String {
        if id == self.root {
            "root".to_string()
        } else if id == self.outgoing {
            "outgoing".to_string()
        } else if id == self.incoming {
            "incoming".to_string()
        } else {
            format!("node {}", id.value())
        }
    }

    /// 当前帧的节点绘制顺序
    fn paint_order(&self) -> Vec<String> {
        self.director
            .draw()
            .iter()
            .map(|c| self.label(c.node))
            .collect()
    }

    fn position(&self, id: NodeId) -> (f32, f32) {
        let node = self.director.graph().get(id).unwrap();
        (node.position.x, node.position.y)
    }
}

fn request(kind: TransitionKind) -> TransitionRequest {
    TransitionRequest::new(kind).with_duration(1.0)
}

/// 测试 SlideInL 离场在上，SlideInR 入场在上
#[test]
fn test_slide_paint_order() {
    let stage = Stage::enter(StageConfig::default(), request(TransitionKind::SlideInL));
    insta::assert_debug_snapshot!(stage.paint_order(), @r#"
    [
        "root",
        "incoming",
        "outgoing",
    ]
    "#);

    let stage = Stage::enter(StageConfig::default(), request(TransitionKind::SlideInR));
    insta::assert_debug_snapshot!(stage.paint_order(), @r#"
    [
        "root",
        "outgoing",
        "incoming",
    ]
    "#);
}

/// 测试颜色淡化的覆盖层画在两个场景之上，且入场场景在中点之前隐藏
#[test]
fn test_fade_overlay() {
    let mut stage = Stage::enter(StageConfig::default(), request(TransitionKind::Fade));
    insta::assert_debug_snapshot!(stage.paint_order(), @r#"
    [
        "root",
        "outgoing",
        "node 4",
    ]
    "#);

    for _ in 0..15 {
        stage.director.tick(DT);
    }
    let overlay = stage.director.draw().last().copied().unwrap();
    assert!(matches!(overlay.content, DrawContent::Color(_)));
    assert!(overlay.opacity > 100 && overlay.opacity < 160, "{}", overlay.opacity);

    // 中点之后离场隐藏，入场显示
    for _ in 0..20 {
        stage.director.tick(DT);
    }
    assert_eq!(
        stage.paint_order(),
        vec!["root".to_string(), "incoming".to_string(), "node 4".to_string()]
    );

    for _ in 0..26 {
        stage.director.tick(DT);
    }
    assert_eq!(stage.director.running_scene(), Some(stage.incoming));
    // 覆盖层随过渡释放
    assert!(!stage.director.graph().contains(overlay.node));
}

/// 测试 MoveInL 从 -w 出发，60 帧后到达原点，中间为缓出曲线
#[test]
fn test_move_in_curve() {
    let mut stage = Stage::enter(StageConfig::default(), request(TransitionKind::MoveInL));
    assert_eq!(stage.position(stage.incoming), (-1280.0, 0.0));
    assert_eq!(stage.position(stage.outgoing), (0.0, 0.0));

    let mut xs = Vec::new();
    for _ in 0..60 {
        stage.director.tick(DT);
        xs.push(stage.position(stage.incoming).0);
    }
    assert!(xs.windows(2).all(|w| w[0] <= w[1]));
    // 缓出：前半程走过的距离多于一半
    assert!(xs[29] > -640.0 + 100.0, "{}", xs[29]);
    assert!(xs[59].abs() < 1e-3);
    assert_eq!(stage.director.transition(stage.root).unwrap().finish_count(), 1);
}

/// 测试 SlideInT 在 800 高的视口中从 799.5 出发
#[test]
fn test_slide_in_top_offset() {
    let mut config = StageConfig::default();
    config.viewport.height = 800.0;
    let mut stage = Stage::enter(config, request(TransitionKind::SlideInT));
    assert_eq!(stage.position(stage.incoming), (0.0, 799.5));

    for _ in 0..59 {
        stage.director.tick(DT);
    }
    let (_, y_in) = stage.position(stage.incoming);
    let (_, y_out) = stage.position(stage.outgoing);
    assert!(y_in > 0.0 && y_in < 10.0, "{y_in}");
    // 两个场景同步移动
    assert!((y_out - (y_in - 799.5)).abs() < 1e-2, "{y_out}");

    stage.director.tick(DT);
    assert_eq!(stage.position(stage.incoming), (0.0, 0.0));
}

/// 测试 RotoZoom 入场从 0.001 放大回 1
#[test]
fn test_roto_zoom_mirror() {
    let mut stage = Stage::enter(StageConfig::default(), request(TransitionKind::RotoZoom));
    let scale = |stage: &Stage, id| stage.director.graph().get(id).unwrap().scale();
    assert!((scale(&stage, stage.incoming) - 0.001).abs() < 1e-6);

    // 前半程入场静止，离场旋转缩小
    for _ in 0..30 {
        stage.director.tick(DT);
    }
    assert!((scale(&stage, stage.incoming) - 0.001).abs() < 1e-4);
    assert!(scale(&stage, stage.outgoing) < 0.01);
    let rotation = stage.director.graph().get(stage.outgoing).unwrap().rotation;
    assert!((rotation - 720.0).abs() < 1.0, "{rotation}");

    for _ in 0..29 {
        stage.director.tick(DT);
    }
    let incoming = stage.director.graph().get(stage.incoming).unwrap();
    assert!(incoming.scale() > 0.5);
    assert!(incoming.rotation > -720.0 && incoming.rotation < 0.0);
}

/// 测试翻转在中点前隐藏入场、中点后隐藏离场
#[test]
fn test_flip_midpoint() {
    let mut stage = Stage::enter(StageConfig::default(), request(TransitionKind::FlipX));
    assert!(!stage.director.graph().get(stage.incoming).unwrap().visible);

    for _ in 0..10 {
        stage.director.tick(DT);
    }
    let outgoing = stage.director.graph().get(stage.outgoing).unwrap();
    assert!(!outgoing.camera.is_default());

    for _ in 0..25 {
        stage.director.tick(DT);
    }
    let graph = stage.director.graph();
    assert!(graph.get(stage.incoming).unwrap().visible);
    assert!(!graph.get(stage.outgoing).unwrap().visible);
}

/// 测试交叉淡化只绘制两张离屏图像，结束后归还目标
#[test]
fn test_cross_fade_targets() {
    let mut stage = Stage::enter(StageConfig::default(), request(TransitionKind::CrossFade));
    assert_eq!(stage.director.compositor().live_targets(), 2);

    let commands = stage.director.draw();
    let images: Vec<_> = commands
        .iter()
        .filter_map(|c| match c.content {
            DrawContent::Image { blend, .. } => Some((blend, c.opacity)),
            _ => None,
        })
        .collect();
    assert_eq!(images.len(), 2);
    assert!(
        commands
            .iter()
            .all(|c| c.node != stage.incoming && c.node != stage.outgoing)
    );

    for _ in 0..30 {
        stage.director.tick(DT);
    }
    let opacity = stage
        .director
        .draw()
        .iter()
        .filter(|c| matches!(c.content, DrawContent::Image { .. }))
        .last()
        .map(|c| c.opacity)
        .unwrap();
    assert!(opacity > 100 && opacity < 160, "{opacity}");

    for _ in 0..31 {
        stage.director.tick(DT);
    }
    assert_eq!(stage.director.running_scene(), Some(stage.incoming));
    assert_eq!(stage.director.compositor().live_targets(), 0);
}

/// 测试离屏目标分配失败时交叉淡化退化为直接切换
#[test]
fn test_cross_fade_without_targets() {
    let mut config = StageConfig::default();
    config.compositor.max_targets = 0;
    let mut stage = Stage::enter(config, request(TransitionKind::CrossFade));
    assert_eq!(stage.director.compositor().live_targets(), 0);
    // 退化后两个场景照常绘制
    assert_eq!(stage.paint_order(), vec!["root", "outgoing", "incoming"]);

    stage.director.tick(DT);
    let graph = stage.director.graph();
    assert!(graph.get(stage.incoming).unwrap().visible);
    assert!(!graph.get(stage.outgoing).unwrap().visible);

    stage.director.tick(DT);
    assert_eq!(stage.director.running_scene(), Some(stage.incoming));
}

/// 测试熄灭瓦片的网格尺寸随视口宽高比变化，结束后网格释放
#[test]
fn test_turn_off_tiles_grid() {
    let mut stage = Stage::enter(StageConfig::default(), request(TransitionKind::TurnOffTiles));
    stage.director.tick(DT);

    let grid = stage
        .director
        .graph()
        .get(stage.outgoing)
        .unwrap()
        .grid
        .clone()
        .unwrap();
    assert_eq!(grid.size(), GridSize::new(21, 12));

    for _ in 0..29 {
        stage.director.tick(DT);
    }
    let hidden = stage
        .director
        .graph()
        .get(stage.outgoing)
        .unwrap()
        .grid
        .as_ref()
        .unwrap()
        .hidden_count();
    assert!(hidden > 100 && hidden < 152, "{hidden}");

    for _ in 0..30 {
        stage.director.tick(DT);
    }
    assert!(stage.director.graph().get(stage.outgoing).unwrap().grid.is_none());
}

/// 测试分割过渡作用于整个过渡根节点
#[test]
fn test_split_on_root() {
    let mut stage = Stage::enter(StageConfig::default(), request(TransitionKind::SplitCols));
    assert!(!stage.director.graph().get(stage.incoming).unwrap().visible);

    stage.director.tick(DT);
    let root = stage.director.graph().get(stage.root).unwrap();
    assert_eq!(root.grid.as_ref().unwrap().size(), GridSize::new(3, 1));
    assert!(stage.director.draw()[0].tiled);

    for _ in 0..40 {
        stage.director.tick(DT);
    }
    assert!(stage.director.graph().get(stage.incoming).unwrap().visible);
    assert!(!stage.director.graph().get(stage.outgoing).unwrap().visible);
}

/// 测试方向淡出的瓦片从一角开始缩小
#[test]
fn test_fade_tiles_progress() {
    let mut stage = Stage::enter(StageConfig::default(), request(TransitionKind::FadeTr));
    for _ in 0..30 {
        stage.director.tick(DT);
    }
    let grid = stage
        .director
        .graph()
        .get(stage.outgoing)
        .unwrap()
        .grid
        .clone()
        .unwrap();
    let first = grid.tile(0, 0).unwrap();
    let last = grid.tile(grid.size().cols - 1, grid.size().rows - 1).unwrap();
    assert!(first.scale < last.scale || !first.visible);
}
