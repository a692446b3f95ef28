//! # Easing 模块
//!
//! 按指数 `rate` 参数化的缓入/缓出，
//! 过渡的位移与分割动作都依赖这组曲线。

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EasingFunction {
    /// 线性（匀速）
    #[default]
    Linear,
    /// `t^rate`
    EaseIn(f32),
    /// `t^(1/rate)`
    EaseOut(f32),
    /// 前半 `(2t)^rate / 2`，后半对称
    EaseInOut(f32),
}

impl EasingFunction {
    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)
    ///
    /// # 返回
    /// - 缓动后的进度值
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match *self {
            EasingFunction::Linear => t,
            EasingFunction::EaseIn(rate) => t.powf(rate),
            EasingFunction::EaseOut(rate) => t.powf(1.0 / rate),
            EasingFunction::EaseInOut(rate) => ease_in_out_rate(t, rate),
        }
    }

    /// 反向播放时使用的曲线
    ///
    /// 缓入与缓出取倒数指数，缓入缓出保持不变。
    pub fn reversed(&self) -> Self {
        match *self {
            EasingFunction::EaseIn(rate) => EasingFunction::EaseIn(1.0 / rate),
            EasingFunction::EaseOut(rate) => EasingFunction::EaseOut(1.0 / rate),
            other => other,
        }
    }
}

fn ease_in_out_rate(t: f32, rate: f32) -> f32 {
    let t = t * 2.0;
    if t < 1.0 {
        0.5 * t.powf(rate)
    } else {
        1.0 - 0.5 * (2.0 - t).powf(rate)
    }
}
