//! 过渡种类与数据驱动的创建请求

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::action::TileFadeDirection;
use crate::config::TransitionConfig;
use crate::error::TransitionError;
use crate::math::Color3;

use super::{
    CrossFade, Edge, Fade, Flip, FlipAxis, JumpZoom, MoveIn, RotoZoom, ShrinkGrow, SlideIn, Split,
    SplitAxis, TileFade, TransitionStyle, TurnOffTiles,
};

/// 翻转方向
///
/// 四个取值只对应两种旋转模式：`LeftOver` 与 `UpOver` 为第一种，
/// `RightOver` 与 `DownOver` 为第二种。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    LeftOver,
    RightOver,
    UpOver,
    DownOver,
}

impl Orientation {
    /// 是否为第一种模式
    pub fn is_primary(self) -> bool {
        matches!(self, Orientation::LeftOver | Orientation::UpOver)
    }
}

/// 全部过渡种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    RotoZoom,
    JumpZoom,
    MoveInL,
    MoveInR,
    MoveInT,
    MoveInB,
    SlideInL,
    SlideInR,
    SlideInT,
    SlideInB,
    ShrinkGrow,
    FlipX,
    FlipY,
    FlipAngular,
    ZoomFlipX,
    ZoomFlipY,
    ZoomFlipAngular,
    Fade,
    CrossFade,
    TurnOffTiles,
    SplitCols,
    SplitRows,
    FadeTr,
    FadeBl,
    FadeUp,
    FadeDown,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 26] = [
        TransitionKind::RotoZoom,
        TransitionKind::JumpZoom,
        TransitionKind::MoveInL,
        TransitionKind::MoveInR,
        TransitionKind::MoveInT,
        TransitionKind::MoveInB,
        TransitionKind::SlideInL,
        TransitionKind::SlideInR,
        TransitionKind::SlideInT,
        TransitionKind::SlideInB,
        TransitionKind::ShrinkGrow,
        TransitionKind::FlipX,
        TransitionKind::FlipY,
        TransitionKind::FlipAngular,
        TransitionKind::ZoomFlipX,
        TransitionKind::ZoomFlipY,
        TransitionKind::ZoomFlipAngular,
        TransitionKind::Fade,
        TransitionKind::CrossFade,
        TransitionKind::TurnOffTiles,
        TransitionKind::SplitCols,
        TransitionKind::SplitRows,
        TransitionKind::FadeTr,
        TransitionKind::FadeBl,
        TransitionKind::FadeUp,
        TransitionKind::FadeDown,
    ];

    /// 规范名称（小写下划线）
    pub fn name(self) -> &'static str {
        match self {
            TransitionKind::RotoZoom => "roto_zoom",
            TransitionKind::JumpZoom => "jump_zoom",
            TransitionKind::MoveInL => "move_in_l",
            TransitionKind::MoveInR => "move_in_r",
            TransitionKind::MoveInT => "move_in_t",
            TransitionKind::MoveInB => "move_in_b",
            TransitionKind::SlideInL => "slide_in_l",
            TransitionKind::SlideInR => "slide_in_r",
            TransitionKind::SlideInT => "slide_in_t",
            TransitionKind::SlideInB => "slide_in_b",
            TransitionKind::ShrinkGrow => "shrink_grow",
            TransitionKind::FlipX => "flip_x",
            TransitionKind::FlipY => "flip_y",
            TransitionKind::FlipAngular => "flip_angular",
            TransitionKind::ZoomFlipX => "zoom_flip_x",
            TransitionKind::ZoomFlipY => "zoom_flip_y",
            TransitionKind::ZoomFlipAngular => "zoom_flip_angular",
            TransitionKind::Fade => "fade",
            TransitionKind::CrossFade => "cross_fade",
            TransitionKind::TurnOffTiles => "turn_off_tiles",
            TransitionKind::SplitCols => "split_cols",
            TransitionKind::SplitRows => "split_rows",
            TransitionKind::FadeTr => "fade_tr",
            TransitionKind::FadeBl => "fade_bl",
            TransitionKind::FadeUp => "fade_up",
            TransitionKind::FadeDown => "fade_down",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransitionKind {
    type Err = TransitionError;

    /// 忽略大小写、下划线与连字符：`"SlideInL"`、`"slide_in_l"`、`"slide-in-l"` 等价
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalize = |name: &str| -> String {
            name.chars()
                .filter(|c| *c != '_' && *c != '-')
                .flat_map(char::to_lowercase)
                .collect()
        };
        let wanted = normalize(s.trim());
        TransitionKind::ALL
            .into_iter()
            .find(|kind| normalize(kind.name()) == wanted)
            .ok_or_else(|| TransitionError::UnknownTransition {
                name: s.to_string(),
            })
    }
}

/// 过渡创建请求
///
/// 未填写的字段取 `TransitionConfig` 或该种类的默认值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub kind: TransitionKind,
    #[serde(default)]
    pub duration: Option<f32>,
    /// 仅翻转类过渡使用
    #[serde(default)]
    pub orientation: Option<Orientation>,
    /// 仅颜色淡化使用
    #[serde(default)]
    pub color: Option<Color3>,
}

impl TransitionRequest {
    pub fn new(kind: TransitionKind) -> Self {
        Self {
            kind,
            duration: None,
            orientation: None,
            color: None,
        }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_color(mut self, color: Color3) -> Self {
        self.color = Some(color);
        self
    }

    /// 构建风格
    pub fn build_style(&self, config: &TransitionConfig) -> Box<dyn TransitionStyle> {
        let move_in = |edge| {
            Box::new(MoveIn {
                edge,
                ease_rate: config.move_ease_rate,
            }) as Box<dyn TransitionStyle>
        };
        let slide_in = |edge| {
            Box::new(SlideIn {
                edge,
                adjust: config.slide_adjust,
                ease_rate: config.move_ease_rate,
            }) as Box<dyn TransitionStyle>
        };
        let split = |axis| {
            Box::new(Split {
                axis,
                segments: config.split_segments,
                ease_rate: config.split_ease_rate,
            }) as Box<dyn TransitionStyle>
        };

        let flip = |axis, zoom| {
            let orientation = self
                .orientation
                .unwrap_or_else(|| Flip::default_orientation(axis));
            Box::new(Flip {
                axis,
                orientation,
                zoom,
            }) as Box<dyn TransitionStyle>
        };

        match self.kind {
            TransitionKind::RotoZoom => Box::new(RotoZoom),
            TransitionKind::JumpZoom => Box::new(JumpZoom),
            TransitionKind::MoveInL => move_in(Edge::Left),
            TransitionKind::MoveInR => move_in(Edge::Right),
            TransitionKind::MoveInT => move_in(Edge::Top),
            TransitionKind::MoveInB => move_in(Edge::Bottom),
            TransitionKind::SlideInL => slide_in(Edge::Left),
            TransitionKind::SlideInR => slide_in(Edge::Right),
            TransitionKind::SlideInT => slide_in(Edge::Top),
            TransitionKind::SlideInB => slide_in(Edge::Bottom),
            TransitionKind::ShrinkGrow => Box::new(ShrinkGrow {
                ease_rate: config.move_ease_rate,
            }),
            TransitionKind::Fade => Box::new(Fade::new(self.color.unwrap_or(config.fade_color))),
            TransitionKind::CrossFade => Box::new(CrossFade::new()),
            TransitionKind::TurnOffTiles => Box::new(TurnOffTiles {
                seed: config.tile_seed,
            }),
            TransitionKind::SplitCols => split(SplitAxis::Cols),
            TransitionKind::SplitRows => split(SplitAxis::Rows),
            TransitionKind::FadeTr => Box::new(TileFade::new(TileFadeDirection::TopRight)),
            TransitionKind::FadeBl => Box::new(TileFade::new(TileFadeDirection::BottomLeft)),
            TransitionKind::FadeUp => Box::new(TileFade::new(TileFadeDirection::Up)),
            TransitionKind::FadeDown => Box::new(TileFade::new(TileFadeDirection::Down)),
            TransitionKind::FlipX => flip(FlipAxis::X, false),
            TransitionKind::FlipY => flip(FlipAxis::Y, false),
            TransitionKind::FlipAngular => flip(FlipAxis::Angular, false),
            TransitionKind::ZoomFlipX => flip(FlipAxis::X, true),
            TransitionKind::ZoomFlipY => flip(FlipAxis::Y, true),
            TransitionKind::ZoomFlipAngular => flip(FlipAxis::Angular, true),
        }
    }
}
