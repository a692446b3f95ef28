//! # Config 模块
//!
//! 舞台配置：视口、过渡参数与合成器预算。
//!
//! ## 配置优先级
//!
//! 1. 调用方显式传入的值（如 `TransitionRequest::duration`）
//! 2. 配置文件（JSON）
//! 3. 默认值

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::graph::GridSize;
use crate::math::{Color3, Size};

/// 舞台配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// 视口
    #[serde(default)]
    pub viewport: ViewportConfig,

    /// 过渡参数
    #[serde(default)]
    pub transitions: TransitionConfig,

    /// 合成器配置
    #[serde(default)]
    pub compositor: CompositorConfig,
}

/// 视口配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: f32,

    #[serde(default = "default_viewport_height")]
    pub height: f32,
}

/// 过渡参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// 未指定时长时使用的默认值（秒）
    #[serde(default = "default_duration")]
    pub default_duration: f32,

    /// 瓦片类过渡的网格行数，列数按视口宽高比推算
    #[serde(default = "default_grid_rows")]
    pub grid_rows: u32,

    /// 滑入过渡的位移修正（像素），消除相邻场景之间的接缝
    #[serde(default = "default_slide_adjust")]
    pub slide_adjust: f32,

    /// 移入/滑入/缩放过渡的缓出指数
    #[serde(default = "default_move_ease_rate")]
    pub move_ease_rate: f32,

    /// 分割过渡的列数/行数
    #[serde(default = "default_split_segments")]
    pub split_segments: u32,

    /// 分割过渡的缓入缓出指数
    #[serde(default = "default_split_ease_rate")]
    pub split_ease_rate: f32,

    /// 颜色淡化过渡的默认颜色
    #[serde(default = "default_fade_color")]
    pub fade_color: Color3,

    /// 熄灭瓦片的随机种子
    #[serde(default)]
    pub tile_seed: u64,
}

/// 合成器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositorConfig {
    /// 同时存活的离屏目标上限
    #[serde(default = "default_max_targets")]
    pub max_targets: usize,
}

// 默认值函数
fn default_viewport_width() -> f32 {
    1280.0
}

fn default_viewport_height() -> f32 {
    720.0
}

fn default_duration() -> f32 {
    1.0
}

fn default_grid_rows() -> u32 {
    12
}

fn default_slide_adjust() -> f32 {
    0.5
}

fn default_move_ease_rate() -> f32 {
    2.0
}

fn default_split_segments() -> u32 {
    3
}

fn default_split_ease_rate() -> f32 {
    3.0
}

fn default_fade_color() -> Color3 {
    Color3::BLACK
}

fn default_max_targets() -> usize {
    8
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            transitions: TransitionConfig::default(),
            compositor: CompositorConfig::default(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            default_duration: default_duration(),
            grid_rows: default_grid_rows(),
            slide_adjust: default_slide_adjust(),
            move_ease_rate: default_move_ease_rate(),
            split_segments: default_split_segments(),
            split_ease_rate: default_split_ease_rate(),
            fade_color: default_fade_color(),
            tile_seed: 0,
        }
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            max_targets: default_max_targets(),
        }
    }
}

impl ViewportConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl StageConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在、解析失败或验证失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Self::default();
        }

        let result = fs::read_to_string(path)
            .map_err(ConfigError::from)
            .and_then(|content| Self::from_json_str(&content));
        match result {
            Ok(config) => {
                debug!(path = %path.display(), "Config loaded");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// 从 JSON 字符串解析并验证
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let viewport = self.viewport.size();
        if viewport.is_empty() || !viewport.width.is_finite() || !viewport.height.is_finite() {
            return Err(ConfigError::Validation("视口宽高必须为有限正数".to_string()));
        }

        let t = &self.transitions;
        if t.default_duration < 0.0 || t.default_duration.is_nan() {
            return Err(ConfigError::Validation(
                "default_duration 不能为负数".to_string(),
            ));
        }
        let max = GridSize::MAX_TILES_PER_AXIS;
        if t.grid_rows == 0 || t.grid_rows > max {
            return Err(ConfigError::Validation(format!(
                "grid_rows 必须在 1 到 {max} 之间"
            )));
        }
        if t.split_segments == 0 || t.split_segments > max {
            return Err(ConfigError::Validation(format!(
                "split_segments 必须在 1 到 {max} 之间"
            )));
        }
        let cols = t.grid_rows as f32 * viewport.aspect();
        if cols.round() > max as f32 {
            return Err(ConfigError::Validation(format!(
                "视口宽高比过大：{} 行时需要 {cols:.0} 列，上限 {max}",
                t.grid_rows
            )));
        }
        if t.move_ease_rate <= 0.0 || t.split_ease_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "缓动指数必须为正数".to_string(),
            ));
        }

        Ok(())
    }
}
